//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (one span per request)
//! 3. Request ID (propagate or generate `x-request-id`)
//! 4. Security headers (JSON-only CSP, frame denial)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rate limiting (governor, added in the binary only)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use rate_limit::{api_rate_limiter, checkout_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
