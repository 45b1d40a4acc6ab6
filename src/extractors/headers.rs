//! Inbound headers as (name, value) pairs, repeated names kept.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header pairs in arrival order. Values that are not visible ASCII are skipped.
#[derive(Clone, Debug, Default)]
pub struct RequestHeaders(pub Vec<(String, String)>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestHeaders
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.trim().to_string()))
            })
            .collect();
        Ok(RequestHeaders(pairs))
    }
}
