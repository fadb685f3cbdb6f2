pub mod access;
pub mod auth;
pub mod cors;
pub mod jwt;
pub mod password;

pub use access::{has_project_access, is_owner};
pub use auth::AuthenticatedUser;
pub use cors::{create_cors_layer, CorsConfig};
pub use jwt::{extract_bearer_token, JwtConfig, JwtManager};
pub use password::{Argon2Config, PasswordHasher2};
