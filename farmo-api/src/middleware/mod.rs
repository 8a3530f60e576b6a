pub mod auth;

pub use auth::{customer_auth_middleware, provider_auth_middleware, CustomerClaims, ProviderClaims};
