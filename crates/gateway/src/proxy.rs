//! Forwarding of verified requests to the upstream service.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

use meshguard_auth::{AuthError, AuthResult};

use crate::app::errors::json_error;
use crate::state::GatewayState;

// Connection-scoped headers never forwarded in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Largest request body the gateway buffers before forwarding.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

// Client address hints downstream services read; only the edge may set them.
const CLIENT_ADDRESS_HEADERS: [&str; 4] = [
    X_FORWARDED_FOR,
    "x-real-ip",
    "proxy-client-ip",
    "wl-proxy-client-ip",
];

#[derive(Debug)]
pub struct Upstream {
    base: url::Url,
    client: reqwest::Client,
}

impl Upstream {
    pub fn new(base: url::Url, timeout: Duration) -> AuthResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::config(format!("failed to build upstream client: {e}")))?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &url::Url {
        &self.base
    }

    /// Upstream URL for an inbound path and query.
    pub fn target(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path_and_query)
    }
}

/// Fallback handler: forward the (already filtered) request upstream.
pub async fn forward(State(state): State<GatewayState>, req: Request) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = state.upstream.target(path_and_query);

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    set_forwarded_for(&mut headers, peer);

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = parts.uri.path(), error = %e, "request body rejected");
            return json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "request body too large",
            );
        }
    };

    let upstream = state
        .upstream
        .client
        .request(parts.method.clone(), target.as_str())
        .headers(headers)
        .body(body)
        .send()
        .await;

    match upstream {
        Ok(res) => into_response(res),
        Err(e) => {
            tracing::error!(method = %parts.method, path = parts.uri.path(), error = %e, "upstream request failed");
            let (status, code) = if e.is_timeout() {
                (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT")
            } else {
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY")
            };
            json_error(status, code, "upstream service unavailable")
        }
    }
}

fn into_response(res: reqwest::Response) -> Response {
    let status = res.status();
    let mut headers = res.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(res.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Replace whatever address hints the client sent with the socket peer.
fn set_forwarded_for(headers: &mut HeaderMap, peer: Option<IpAddr>) {
    for name in CLIENT_ADDRESS_HEADERS {
        headers.remove(name);
    }
    if let Some(ip) = peer {
        if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_joins_base_and_path() {
        let up = Upstream::new(
            url::Url::parse("http://svc:8081/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(up.target("/api/me?x=1"), "http://svc:8081/api/me?x=1");
    }

    #[test]
    fn client_address_hints_are_replaced_by_the_peer() {
        let mut h = HeaderMap::new();
        h.insert(X_FORWARDED_FOR, HeaderValue::from_static("6.6.6.6, 10.0.0.1"));
        h.insert("x-real-ip", HeaderValue::from_static("6.6.6.6"));
        set_forwarded_for(&mut h, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(h[X_FORWARDED_FOR], "10.0.0.2");
        assert!(h.get("x-real-ip").is_none());

        set_forwarded_for(&mut h, None);
        assert!(h.get(X_FORWARDED_FOR).is_none());
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut h = HeaderMap::new();
        h.insert(header::CONNECTION, HeaderValue::from_static("close"));
        h.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        h.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        strip_hop_by_hop(&mut h);
        assert_eq!(h.len(), 1);
    }
}
