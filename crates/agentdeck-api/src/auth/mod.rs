// Authentication module
// Decision: HS256 JWTs issued by /auth/login; no refresh tokens or API keys

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod routes;

pub use config::{AuthConfig, AuthMode};
pub use middleware::{AuthState, Requester};
pub use routes::routes;
