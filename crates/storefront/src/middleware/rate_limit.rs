//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for signup/signin (~10/min)
//! - `api_rate_limiter`: relaxed limits for the rest of the API (~100/min)
//!
//! Rejections are rewritten into the API's JSON error body by
//! [`json_rate_limit_response`].

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Client IP key extractor.
///
/// Keys on the peer address. When the peer is one of the configured trusted
/// proxies, `X-Forwarded-For` is walked from the rightmost hop and the first
/// address that is not itself a trusted proxy wins; `X-Real-IP` is used when
/// no `X-Forwarded-For` is present. Requests without connect info are
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct ClientIpKeyExtractor {
    trusted_proxies: Arc<[IpAddr]>,
}

impl ClientIpKeyExtractor {
    /// Extractor honouring forwarding headers from `trusted_proxies` only.
    #[must_use]
    pub fn new(trusted_proxies: &[IpAddr]) -> Self {
        Self {
            trusted_proxies: trusted_proxies.into(),
        }
    }

    fn is_trusted(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.contains(&ip)
    }

    /// Resolve the client address for a connection from `peer`.
    fn client_ip(&self, peer: IpAddr, headers: &HeaderMap) -> IpAddr {
        if !self.is_trusted(peer) {
            return peer;
        }

        let hops: Vec<&str> = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .collect();

        if hops.is_empty() {
            return headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
                .unwrap_or(peer);
        }

        for hop in hops.iter().rev() {
            // Anything left of an unparseable hop was not written by our proxies.
            let Ok(ip) = hop.parse::<IpAddr>() else {
                return peer;
            };
            if !self.is_trusted(ip) {
                return ip;
            }
        }
        peer
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &axum::http::Request<T>) -> Result<Self::Key, GovernorError> {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| self.client_ip(addr.ip(), req.headers()))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(key_extractor: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for the general API: ~100 requests per minute per IP.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter(key_extractor: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Replace the governor's plain-text `429` with the JSON error body,
/// keeping `Retry-After`.
pub async fn json_rate_limit_response(request: Request, next: axum::middleware::Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let retry_after = response.headers().get(RETRY_AFTER).cloned();
    let mut rewritten = AppError::RateLimited.into_response();
    if let Some(value) = retry_after {
        rewritten.headers_mut().insert(RETRY_AFTER, value);
    }
    rewritten
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const PEER: &str = "198.51.100.2";
    const PROXY: &str = "10.0.0.1";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarding_headers() {
        let extractor = ClientIpKeyExtractor::default();
        let mut headers = forwarded("203.0.113.7");
        headers.insert(X_REAL_IP, HeaderValue::from_static("203.0.113.8"));
        assert_eq!(extractor.client_ip(ip(PEER), &headers), ip(PEER));
    }

    #[test]
    fn test_trusted_proxy_uses_rightmost_untrusted_hop() {
        let extractor = ClientIpKeyExtractor::new(&[ip(PROXY), ip("10.0.0.2")]);
        // Leftmost hop is whatever the client claimed; the proxies appended the rest.
        let headers = forwarded("1.2.3.4, 203.0.113.7, 10.0.0.2");
        assert_eq!(extractor.client_ip(ip(PROXY), &headers), ip("203.0.113.7"));
    }

    #[test]
    fn test_trusted_proxy_with_garbage_hop_falls_back_to_peer() {
        let extractor = ClientIpKeyExtractor::new(&[ip(PROXY)]);
        let headers = forwarded("203.0.113.7, not-an-ip");
        assert_eq!(extractor.client_ip(ip(PROXY), &headers), ip(PROXY));
    }

    #[test]
    fn test_trusted_proxy_falls_back_to_real_ip() {
        let extractor = ClientIpKeyExtractor::new(&[ip(PROXY)]);
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("203.0.113.9"));
        assert_eq!(extractor.client_ip(ip(PROXY), &headers), ip("203.0.113.9"));
        assert_eq!(extractor.client_ip(ip(PROXY), &HeaderMap::new()), ip(PROXY));
    }
}
