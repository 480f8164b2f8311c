//! Client IP address extraction.
//!
//! The socket peer address (`ConnectInfo`) identifies the client by default.
//! Behind a reverse proxy, proxy headers can be trusted instead:
//! `CF-Connecting-IP` (Cloudflare), `X-Real-IP`, `X-Forwarded-For`.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use http::Request;

/// Header priority for IP extraction (highest to lowest).
const IP_HEADERS: &[&str] = &[
    "cf-connecting-ip", // Cloudflare
    "x-real-ip",        // Nginx
    "x-forwarded-for",  // Standard proxy header (first IP in chain)
];

/// Client IP address extracted from request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    /// Extract client IP from the request.
    ///
    /// Proxy headers are consulted only when `trust_proxy_headers` is set;
    /// otherwise they are client-controlled and ignored.
    #[must_use]
    pub fn from_request<T>(req: &Request<T>, trust_proxy_headers: bool) -> Self {
        let from_headers = trust_proxy_headers
            .then(|| ip_from_headers(req))
            .flatten();
        Self(from_headers.or_else(|| peer_ip(req)))
    }

    /// Get the IP address if available.
    #[inline]
    #[must_use]
    pub const fn ip(&self) -> Option<IpAddr> {
        self.0
    }
}

impl std::fmt::Display for ClientIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(ip) => write!(f, "{ip}"),
            None => f.write_str("unknown"),
        }
    }
}

fn ip_from_headers<T>(req: &Request<T>) -> Option<IpAddr> {
    IP_HEADERS.iter().find_map(|header| {
        req.headers()
            .get(*header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .and_then(|ip_str| ip_str.parse::<IpAddr>().ok())
    })
}

/// Socket peer address, set by `into_make_service_with_connect_info`.
fn peer_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_peer(builder: http::request::Builder, peer: &str) -> Request<()> {
        let mut req = builder.body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    }

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn uses_peer_address_by_default() {
        let req = with_peer(
            Request::builder().header("x-forwarded-for", "203.0.113.195"),
            "192.0.2.10:51000",
        );
        assert_eq!(ClientIp::from_request(&req, false).ip(), ip("192.0.2.10"));
    }

    #[test]
    fn trusted_x_forwarded_for_chain_uses_first_hop() {
        let req = with_peer(
            Request::builder().header(
                "x-forwarded-for",
                "203.0.113.195, 70.41.3.18, 150.172.238.178",
            ),
            "10.0.0.1:443",
        );
        assert_eq!(ClientIp::from_request(&req, true).ip(), ip("203.0.113.195"));
    }

    #[test]
    fn trusted_headers_prefer_cloudflare() {
        let req = Request::builder()
            .header("cf-connecting-ip", "198.51.100.1")
            .header("x-forwarded-for", "203.0.113.1")
            .header("x-real-ip", "192.0.2.1")
            .body(())
            .unwrap();
        assert_eq!(ClientIp::from_request(&req, true).ip(), ip("198.51.100.1"));
    }

    #[test]
    fn trusted_x_real_ip() {
        let req = Request::builder()
            .header("x-real-ip", "192.0.2.1")
            .body(())
            .unwrap();
        assert_eq!(ClientIp::from_request(&req, true).ip(), ip("192.0.2.1"));
    }

    #[test]
    fn invalid_header_falls_back_to_peer() {
        let req = with_peer(
            Request::builder().header("x-forwarded-for", "not-an-ip"),
            "[2001:db8::1]:8080",
        );
        assert_eq!(ClientIp::from_request(&req, true).ip(), ip("2001:db8::1"));
    }

    #[test]
    fn returns_none_without_any_source() {
        let req = Request::builder().body(()).unwrap();
        let client = ClientIp::from_request(&req, true);
        assert!(client.ip().is_none());
        assert_eq!(client.to_string(), "unknown");
    }
}
