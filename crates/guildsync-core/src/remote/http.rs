//! HTTP source for the static collection files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use super::{RemoteError, RemoteSource};
use crate::models::{Collection, CollectionName};

/// Fetches `<base_url>/<name>.json`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a client with no request timeout. A hung request stalls only its own read.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
        })
    }

    pub fn resource_url(&self, name: CollectionName) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name.file_name())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch(&self, name: CollectionName) -> Result<Collection, RemoteError> {
        let url = self.resource_url(name);
        debug!(url = %url, "Fetching collection");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;

        Ok(Collection::from_json(name, &text)?)
    }
}
