//! Collection service (Zebedee) client.

use async_trait::async_trait;
use reqwest::Method;

use super::http::UpstreamHttp;
use super::{CollectionApi, RequestContext, UpstreamError};
use crate::models::{Collection, CollectionStateUpdate};

const SERVICE: &str = "zebedee";

#[derive(Clone)]
pub struct ZebedeeClient {
    upstream: UpstreamHttp,
}

impl ZebedeeClient {
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

    async fn put_state(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        state: &str,
    ) -> Result<(), UpstreamError> {
        let url = self.upstream.url(segments)?;
        let body = CollectionStateUpdate {
            state: state.to_string(),
        };
        let builder = self.upstream.request(Method::PUT, url, ctx).json(&body);

        self.upstream.send(builder).await.map(|_| ())
    }
}

#[async_trait]
impl CollectionApi for ZebedeeClient {
    async fn get_collection(
        &self,
        ctx: &RequestContext,
        collection_id: &str,
    ) -> Result<Collection, UpstreamError> {
        let url = self.upstream.url(&["collectionDetails", collection_id])?;
        let resp = self
            .upstream
            .send(self.upstream.request(Method::GET, url, ctx))
            .await?;
        self.upstream.json(resp).await
    }

    async fn put_dataset_in_collection(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        state: &str,
    ) -> Result<(), UpstreamError> {
        let segments = ["collections", ctx.collection_id.as_str(), "datasets", dataset_id];
        self.put_state(ctx, &segments, state).await
    }

    async fn put_version_in_collection(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        state: &str,
    ) -> Result<(), UpstreamError> {
        let segments = [
            "collections",
            ctx.collection_id.as_str(),
            "datasets",
            dataset_id,
            "editions",
            edition,
            "versions",
            version,
        ];
        self.put_state(ctx, &segments, state).await
    }
}
