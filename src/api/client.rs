//! Client Address Extractor
//!
//! Resolves the caller's address for request logs, preferring the
//! configured forwarded header over the socket peer address.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

use super::handlers::AppState;

/// Address of the client that issued the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    /// Resolves the client address from request parts.
    ///
    /// Uses the first address in `forwarded_header` when present, then the
    /// peer address, then `unknown`.
    pub fn resolve(parts: &Parts, forwarded_header: &str) -> Self {
        let forwarded = parts
            .headers
            .get(forwarded_header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let addr = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(peer)| peer.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        ClientAddr(addr)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(parts, &state.forwarded_header))
    }
}
