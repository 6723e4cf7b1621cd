// Authentication: token service, request identity and the auth endpoints

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod routes;

pub use config::AuthConfig;
pub use jwt::JwtService;
pub use middleware::{AuthState, AuthUser, FromRef};
pub use routes::routes;
