//! Where a request may carry its token.

use axum::http::{header, HeaderMap, Uri};

use meshguard_core::propagation::{BEARER_PREFIX, TOKEN_HEADER, TOKEN_QUERY_PARAM};

/// Which location a token was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Bearer,
    Header,
    Query,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Bearer => "authorization",
            TokenSource::Header => "x-token",
            TokenSource::Query => "query",
        }
    }
}

/// Find a token: `Authorization: Bearer` first, then `X-Token`, then `?token=`.
///
/// Blank values are skipped so a later source can still supply the token.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<(String, TokenSource)> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some((token.to_string(), TokenSource::Bearer));
    }

    let custom = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = custom {
        return Some((token.to_string(), TokenSource::Header));
    }

    uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, value)| key == TOKEN_QUERY_PARAM && !value.trim().is_empty())
            .map(|(_, value)| (value.trim().to_string(), TokenSource::Query))
    })
}
