//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (one span per request)
//! 3. Request ID (propagate or generate `x-request-id`)
//! 4. Security headers (no framing, no caching)
//!
//! Authentication is not a layer: protected handlers take the
//! [`RequireAdminAuth`] extractor, which reads the `authToken` cookie.

pub mod auth;
pub mod client_ip;
pub mod request_id;
pub mod security_headers;

pub use auth::{AUTH_COOKIE, RequireAdminAuth, auth_cookie, auth_token, expired_auth_cookie};
pub use client_ip::ClientIp;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
