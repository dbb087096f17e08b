//! HTTP middleware stack for the store.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. CORS (API only, when origins are configured)
//! 6. Rate limiting (governor), rewritten into JSON errors
//!
//! Authentication is not a layer: handlers opt in with the
//! [`RequireAuth`], [`RequireAdmin`] and [`OptionalAuth`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth};
pub use rate_limit::{
    ClientIpKeyExtractor, api_rate_limiter, auth_rate_limiter, json_rate_limit_response,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
