use std::{future::Future, sync::Arc};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use url::Url;

use crate::{
    error::{MpdError, MpdResult},
    util::http::HttpClient,
};

#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects, relative references resolve against it.
    pub url: Url,
    pub body: Bytes,
}

/// Retrieves manifests, xlink fragments and clock sources.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = MpdResult<FetchResponse>> + Send;

    /// `Date` header of a `HEAD` request.
    fn fetch_date(&self, url: &Url) -> impl Future<Output = MpdResult<DateTime<Utc>>> + Send;
}

impl<F> Fetcher for Arc<F>
where
    F: Fetcher,
{
    fn fetch(&self, url: &Url) -> impl Future<Output = MpdResult<FetchResponse>> + Send {
        self.as_ref().fetch(url)
    }

    fn fetch_date(&self, url: &Url) -> impl Future<Output = MpdResult<DateTime<Utc>>> + Send {
        self.as_ref().fetch_date(url)
    }
}

#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> MpdResult<FetchResponse> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(MpdError::HttpError(response.status()));
        }

        let url = response.url().clone();
        let body = response.bytes().await?;
        Ok(FetchResponse { url, body })
    }

    async fn fetch_date(&self, url: &Url) -> MpdResult<DateTime<Utc>> {
        let response = self.client.head(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(MpdError::HttpError(response.status()));
        }

        let date = response
            .headers()
            .get(reqwest::header::DATE)
            .ok_or_else(|| MpdError::DateTimeParsing("Missing Date header".to_string()))?
            .to_str()
            .map_err(|_| MpdError::DateTimeParsing("Invalid Date header string".to_string()))?;
        Ok(DateTime::parse_from_rfc2822(date)?.with_timezone(&Utc))
    }
}
