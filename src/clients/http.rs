//! Shared request plumbing for the upstream clients.

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use super::{
    RequestContext, UpstreamError, COLLECTION_ID_HEADER, FLORENCE_TOKEN_HEADER, REQUEST_ID_HEADER,
};

/// Base URL, HTTP client and service credentials for one upstream.
#[derive(Clone)]
pub(crate) struct UpstreamHttp {
    service: &'static str,
    base_url: Url,
    http: reqwest::Client,
    service_auth_token: Option<String>,
}

impl UpstreamHttp {
    pub fn new(
        service: &'static str,
        base_url: &str,
        http: reqwest::Client,
        service_auth_token: Option<String>,
    ) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl {
            service,
            message: format!("{}: {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl {
                service,
                message: format!("{} cannot be used as a base url", base_url),
            });
        }

        Ok(Self {
            service,
            base_url,
            http,
            service_auth_token,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Append percent-encoded path segments to the base URL.
    pub fn url(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl {
                    service: self.service,
                    message: format!("{} cannot be used as a base url", self.base_url),
                })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Start a request carrying the caller's identity headers.
    pub fn request(&self, method: Method, url: Url, ctx: &RequestContext) -> RequestBuilder {
        let mut builder = self.http.request(method, url);

        if !ctx.access_token.is_empty() {
            builder = builder.header(FLORENCE_TOKEN_HEADER, &ctx.access_token);
        }
        if !ctx.collection_id.is_empty() {
            builder = builder.header(COLLECTION_ID_HEADER, &ctx.collection_id);
        }
        if !ctx.request_id.is_empty() {
            builder = builder.header(REQUEST_ID_HEADER, &ctx.request_id);
        }
        if let Some(token) = self.service_auth_token.as_deref() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        builder
    }

    /// Send the request and turn any non-2xx answer into `UpstreamError::Status`.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, UpstreamError> {
        let resp = builder
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: self.service,
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: self.service,
                status,
                url: resp.url().to_string(),
            });
        }

        Ok(resp)
    }

    /// Decode a successful response body as JSON.
    pub async fn json<T: DeserializeOwned>(&self, resp: Response) -> Result<T, UpstreamError> {
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: self.service,
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|source| UpstreamError::Decode {
            service: self.service,
            source,
        })
    }

    /// Probe the upstream's `/health` endpoint.
    pub async fn check_health(&self) -> Result<(), UpstreamError> {
        let url = self.url(&["health"])?;
        self.send(self.http.get(url)).await.map(|_| ())
    }
}
