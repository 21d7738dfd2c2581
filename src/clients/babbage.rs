//! Topics service (Babbage) client.

use async_trait::async_trait;
use reqwest::Method;

use super::http::UpstreamHttp;
use super::{RequestContext, TopicsApi, UpstreamError};
use crate::models::TopicsResult;

const SERVICE: &str = "babbage";

#[derive(Clone)]
pub struct BabbageClient {
    upstream: UpstreamHttp,
}

impl BabbageClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Result<Self, UpstreamError> {
        Ok(Self {
            upstream: UpstreamHttp::new(SERVICE, base_url, http, None)?,
        })
    }

    pub fn service(&self) -> &'static str {
        self.upstream.service()
    }

    pub async fn check_health(&self) -> Result<(), UpstreamError> {
        self.upstream.check_health().await
    }
}

#[async_trait]
impl TopicsApi for BabbageClient {
    async fn get_topics(&self, ctx: &RequestContext) -> Result<TopicsResult, UpstreamError> {
        let url = self.upstream.url(&["allmethodologies", "data"])?;
        let resp = self
            .upstream
            .send(self.upstream.request(Method::GET, url, ctx))
            .await?;
        self.upstream.json(resp).await
    }
}
