//! Dataset API client.

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_MATCH};
use reqwest::Method;

use super::batch::fetch_in_batches;
use super::http::UpstreamHttp;
use super::{DatasetApi, RequestContext, UpstreamError};
use crate::models::{Dataset, Edition, EditableMetadata, Page, Patch, Version};

const SERVICE: &str = "dataset-api";

#[derive(Clone)]
pub struct DatasetClient {
    upstream: UpstreamHttp,
}

impl DatasetClient {
    pub fn new(
        base_url: &str,
        http: reqwest::Client,
        service_auth_token: Option<String>,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            upstream: UpstreamHttp::new(SERVICE, base_url, http, service_auth_token)?,
        })
    }

    pub fn service(&self) -> &'static str {
        self.upstream.service()
    }

    pub async fn check_health(&self) -> Result<(), UpstreamError> {
        self.upstream.check_health().await
    }

    async fn get_datasets_page(
        &self,
        ctx: &RequestContext,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Dataset>, UpstreamError> {
        let url = self.upstream.url(&["datasets"])?;
        let builder = self
            .upstream
            .request(Method::GET, url, ctx)
            .query(&[("offset", offset), ("limit", limit)]);
        let resp = self.upstream.send(builder).await?;
        self.upstream.json(resp).await
    }

    async fn get_versions_page(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Version>, UpstreamError> {
        let url = self
            .upstream
            .url(&["datasets", dataset_id, "editions", edition, "versions"])?;
        let builder = self
            .upstream
            .request(Method::GET, url, ctx)
            .query(&[("offset", offset), ("limit", limit)]);
        let resp = self.upstream.send(builder).await?;
        self.upstream.json(resp).await
    }
}

#[async_trait]
impl DatasetApi for DatasetClient {
    async fn get_datasets_in_batches(
        &self,
        ctx: &RequestContext,
        batch_size: usize,
        max_workers: usize,
    ) -> Result<Vec<Dataset>, UpstreamError> {
        let client = self.clone();
        let ctx = ctx.clone();
        fetch_in_batches(SERVICE, batch_size, max_workers, move |offset, limit| {
            let client = client.clone();
            let ctx = ctx.clone();
            async move { client.get_datasets_page(&ctx, offset, limit).await }
        })
        .await
    }

    async fn get_dataset_current_and_next(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
    ) -> Result<Dataset, UpstreamError> {
        let url = self.upstream.url(&["datasets", dataset_id])?;
        let resp = self
            .upstream
            .send(self.upstream.request(Method::GET, url, ctx))
            .await?;
        self.upstream.json(resp).await
    }

    async fn get_editions(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
    ) -> Result<Vec<Edition>, UpstreamError> {
        let url = self.upstream.url(&["datasets", dataset_id, "editions"])?;
        let resp = self
            .upstream
            .send(self.upstream.request(Method::GET, url, ctx))
            .await?;
        let page: Page<Edition> = self.upstream.json(resp).await?;
        Ok(page.items)
    }

    async fn get_edition(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
    ) -> Result<Edition, UpstreamError> {
        let url = self
            .upstream
            .url(&["datasets", dataset_id, "editions", edition])?;
        let resp = self
            .upstream
            .send(self.upstream.request(Method::GET, url, ctx))
            .await?;
        self.upstream.json(resp).await
    }

    async fn get_versions_in_batches(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        batch_size: usize,
        max_workers: usize,
    ) -> Result<Vec<Version>, UpstreamError> {
        let client = self.clone();
        let ctx = ctx.clone();
        let dataset_id = dataset_id.to_string();
        let edition = edition.to_string();
        fetch_in_batches(SERVICE, batch_size, max_workers, move |offset, limit| {
            let client = client.clone();
            let ctx = ctx.clone();
            let dataset_id = dataset_id.clone();
            let edition = edition.clone();
            async move {
                client
                    .get_versions_page(&ctx, &dataset_id, &edition, offset, limit)
                    .await
            }
        })
        .await
    }

    async fn get_version(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
    ) -> Result<(Version, String), UpstreamError> {
        let url = self.upstream.url(&[
            "datasets", dataset_id, "editions", edition, "versions", version,
        ])?;
        let resp = self
            .upstream
            .send(self.upstream.request(Method::GET, url, ctx))
            .await?;

        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let version = self.upstream.json(resp).await?;

        Ok((version, etag))
    }

    async fn put_metadata(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        metadata: &EditableMetadata,
        if_match: &str,
    ) -> Result<(), UpstreamError> {
        let url = self.upstream.url(&[
            "datasets", dataset_id, "editions", edition, "versions", version, "metadata",
        ])?;
        let mut builder = self
            .upstream
            .request(Method::PUT, url, ctx)
            .json(metadata);
        if !if_match.is_empty() {
            builder = builder.header(IF_MATCH, if_match);
        }

        self.upstream.send(builder).await.map(|_| ())
    }

    async fn patch_dataset(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        patches: &[Patch],
    ) -> Result<(), UpstreamError> {
        let url = self.upstream.url(&["datasets", dataset_id])?;
        let builder = self
            .upstream
            .request(Method::PATCH, url, ctx)
            .json(patches);

        self.upstream.send(builder).await.map(|_| ())
    }

    async fn patch_version(
        &self,
        ctx: &RequestContext,
        dataset_id: &str,
        edition: &str,
        version: &str,
        patches: &[Patch],
        if_match: &str,
    ) -> Result<(), UpstreamError> {
        let url = self.upstream.url(&[
            "datasets", dataset_id, "editions", edition, "versions", version,
        ])?;
        let mut builder = self
            .upstream
            .request(Method::PATCH, url, ctx)
            .json(patches);
        if !if_match.is_empty() {
            builder = builder.header(IF_MATCH, if_match);
        }

        self.upstream.send(builder).await.map(|_| ())
    }
}
