//! Best-effort client address for audit fields.

use std::net::IpAddr;

use axum::http::HeaderMap;

/// Proxy headers consulted in order before the socket peer.
const CANDIDATES: [&str; 4] = [
    "x-forwarded-for",
    "x-real-ip",
    "proxy-client-ip",
    "wl-proxy-client-ip",
];

/// First usable address from the proxy headers, else the socket peer.
///
/// Blank and `unknown` values are skipped. For comma separated lists the first
/// entry (the original client) is used.
pub fn resolve(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
    CANDIDATES
        .iter()
        .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .find_map(usable)
        .or_else(|| peer.map(|ip| ip.to_string()))
}

fn usable(raw: &str) -> Option<String> {
    let first = raw.split(',').next().unwrap_or_default().trim();
    if first.is_empty() || first.eq_ignore_ascii_case("unknown") {
        None
    } else {
        Some(first.to_string())
    }
}
