use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::security::jwt::MAX_TOKEN_EXPIRY_MINUTES;

pub const DEFAULT_CONFIG_FILE: &str = "projectserver.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// No URL selects the in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    pub token_expiry_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_minutes: 24 * 60,
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file if it exists, then `APP_*` variables
    /// (`APP_SERVER__PORT=9000`), then the bare `DATABASE_URL` and
    /// `JWT_SECRET` variables.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.jwt_secret".into()))
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::from_figment(Self::figment(DEFAULT_CONFIG_FILE))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be at least 1");
        }
        if self.auth.token_expiry_minutes <= 0 {
            anyhow::bail!("auth.token_expiry_minutes must be positive");
        }
        if self.auth.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES {
            anyhow::bail!(
                "auth.token_expiry_minutes must not exceed {MAX_TOKEN_EXPIRY_MINUTES} (one year)"
            );
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < 32 {
                anyhow::bail!("auth.jwt_secret must be at least 32 characters");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::file("does-not-exist.toml")),
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.url.is_none());
        assert!(config.database.run_migrations);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[database]\nurl = \"postgres://app@localhost/projects\"\nmax_connections = 4\n\n[auth]\ntoken_expiry_minutes = 15"
        )
        .unwrap();

        let config = AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::file(file.path())),
        )
        .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://app@localhost/projects")
        );
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.auth.token_expiry_minutes, 15);
        assert_eq!(config.listen_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\njwt_secret = \"short\"").unwrap();

        let result = AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::file(file.path())),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_huge_token_expiry_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\ntoken_expiry_minutes = 9223372036854775807").unwrap();

        let err = AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::file(file.path())),
        )
        .unwrap_err();
        assert!(err.to_string().contains("token_expiry_minutes"));
    }
}
