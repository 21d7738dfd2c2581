//! Inbound header extraction and validation.
//!
//! Every dataset route needs a user access token and a collection ID. Both are opaque: they
//! are checked for presence only and forwarded upstream untouched.

use axum::{
    extract::FromRequestParts,
    http::{header::IF_MATCH, request::Parts, HeaderMap},
};
use std::convert::Infallible;

use crate::clients::{
    RequestContext, COLLECTION_ID_HEADER, FLORENCE_TOKEN_HEADER, REQUEST_ID_HEADER,
};

/// A required header was missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("no user access token header set")]
    MissingAccessToken,
    #[error("no collection ID header set")]
    MissingCollectionId,
}

/// Check that both identity values are present. The access token is checked first.
pub fn check_headers(access_token: &str, collection_id: &str) -> Result<(), HeaderError> {
    if access_token.is_empty() {
        return Err(HeaderError::MissingAccessToken);
    }
    if collection_id.is_empty() {
        return Err(HeaderError::MissingCollectionId);
    }
    Ok(())
}

/// Raw identity headers of an inbound request. Extraction never fails.
#[derive(Debug, Clone, Default)]
pub struct InboundHeaders {
    pub access_token: String,
    pub collection_id: String,
    pub if_match: Option<String>,
    pub request_id: String,
}

impl InboundHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = header_value(headers, REQUEST_ID_HEADER)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Self {
            access_token: header_value(headers, FLORENCE_TOKEN_HEADER).unwrap_or_default(),
            collection_id: header_value(headers, COLLECTION_ID_HEADER).unwrap_or_default(),
            if_match: header_value(headers, IF_MATCH.as_str()).filter(|v| !v.is_empty()),
            request_id,
        }
    }

    /// Validate the identity headers and turn them into an upstream request context.
    pub fn require(&self) -> Result<RequestContext, HeaderError> {
        check_headers(&self.access_token, &self.collection_id)?;
        Ok(RequestContext {
            access_token: self.access_token.clone(),
            collection_id: self.collection_id.clone(),
            request_id: self.request_id.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for InboundHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}
