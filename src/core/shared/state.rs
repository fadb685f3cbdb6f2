use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::storage::Store;
use crate::security::jwt::{JwtConfig, JwtManager};
use crate::security::password::PasswordHasher2;

/// Shared by every request handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
    pub hasher: Arc<PasswordHasher2>,
}

impl AppState {
    pub fn new(
        store: Store,
        config: AppConfig,
        jwt: JwtManager,
        hasher: PasswordHasher2,
    ) -> Self {
        Self {
            store,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            hasher: Arc::new(hasher),
        }
    }

    /// Builds the token manager from the `auth` section. Without a configured
    /// secret a random one is generated, so tokens do not survive a restart.
    pub fn jwt_from_config(config: &AppConfig) -> anyhow::Result<JwtManager> {
        let jwt_config = JwtConfig {
            access_token_expiry_minutes: config.auth.token_expiry_minutes,
            ..JwtConfig::default()
        };
        match &config.auth.jwt_secret {
            Some(secret) => JwtManager::new(jwt_config, secret),
            None => {
                log::warn!("auth.jwt_secret not set; using a generated secret");
                let secret = format!(
                    "{}{}",
                    uuid::Uuid::new_v4().simple(),
                    uuid::Uuid::new_v4().simple()
                );
                JwtManager::new(jwt_config, &secret)
            }
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
