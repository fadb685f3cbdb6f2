use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Browser access rules for the API. Requests authenticate with bearer
/// tokens, so credentials (cookies) are never allowed.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "Accept".to_string(),
            ],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self
    }

    pub fn build(self) -> CorsLayer {
        let mut cors = CorsLayer::new();

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {o}");
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            cors = cors.allow_origin(Any);
        } else {
            info!("CORS restricted to {} origins", origins.len());
            cors = cors.allow_origin(AllowOrigin::list(origins));
        }

        let headers: Vec<header::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        cors.allow_methods(self.allowed_methods)
            .allow_headers(headers)
            .max_age(std::time::Duration::from_secs(self.max_age_secs))
    }
}

pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    CorsConfig::default().with_origins(origins.to_vec()).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_origins_drops_blanks() {
        let config = CorsConfig::default().with_origins(vec![
            " http://localhost:3000 ".to_string(),
            "".to_string(),
        ]);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_default_allows_bearer_header() {
        let config = CorsConfig::default();
        assert!(config.allowed_headers.iter().any(|h| h == "Authorization"));
        assert!(config.allowed_methods.contains(&Method::DELETE));
    }
}
