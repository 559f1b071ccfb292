//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Legacy redirects (KV lookup, feature-flagged)
//! 5. Session layer (tower-sessions with in-memory store, cart ID only)
//! 6. Customer session guard (`/account` routes only)
//! 7. Rate limiting (governor, login routes only)

pub mod customer;
pub mod rate_limit;
pub mod redirects;
pub mod request_id;
pub mod session;

pub use customer::{CustomerToken, ensure_logged_in};
pub use rate_limit::auth_rate_limiter;
pub use redirects::redirect_middleware;
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
