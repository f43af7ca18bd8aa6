//! Client address extractor used to key the login throttle.
//!
//! The socket peer is the client unless the peer is a configured trusted
//! proxy. Only then are forwarding headers read, since anyone can send them.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::state::AppState;

/// Single-value headers set by the edge proxy, most specific first.
const PROXY_CLIENT_HEADERS: [&str; 3] = ["cf-connecting-ip", "fly-client-ip", "x-real-ip"];

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Best-known client address, or `"unknown"` so every unidentified caller
/// shares one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip = resolve(&parts.headers, peer, &state.config().auth.trusted_proxies);
        Ok(Self(ip.map_or_else(|| "unknown".to_owned(), |ip| ip.to_string())))
    }
}

/// Pick the client address for a request from `peer`.
///
/// For a trusted peer the proxy's own client headers win; failing those, the
/// right-most `x-forwarded-for` hop that is not itself a trusted proxy.
fn resolve(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> Option<IpAddr> {
    let peer = peer?;
    if !trusted.contains(&peer) {
        return Some(peer);
    }

    let single = PROXY_CLIENT_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    });

    single
        .or_else(|| {
            headers
                .get_all(FORWARDED_FOR)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|v| v.split(','))
                .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
                .rev()
                .find(|hop| !trusted.contains(hop))
        })
        .or(Some(peer))
}
