//! HTTP client for the status page summary endpoint

use crate::errors::{DashboardError, Result};
use crate::pipeline::normalize;
use crate::status::{Snapshot, SummaryDocument};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Anything that can produce a fresh snapshot.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot>;
}

#[derive(Debug, Clone)]
pub struct StatusClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl StatusClient {
    pub fn new(url: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("atlas-status/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DashboardError::Http)?;

        Ok(Self {
            client,
            url,
            timeout: http_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self) -> Result<Response> {
        debug!("Requesting status summary from {}", self.url);

        timeout(self.timeout, self.client.get(&self.url).send())
            .await
            .map_err(|_| DashboardError::Timeout)?
            .map_err(DashboardError::from)
    }

    async fn decode(&self, response: Response) -> Result<SummaryDocument> {
        let status = response.status();
        if !status.is_success() {
            warn!("Status endpoint {} answered {}", self.url, status);
            return Err(DashboardError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StatusSource for StatusClient {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let started = std::time::Instant::now();
        let response = self.request().await?;
        let document = self.decode(response).await?;
        let snapshot = normalize(document);

        info!(
            "Fetched status summary: {} services, {} incidents in {}ms",
            snapshot.services.len(),
            snapshot.incidents.len(),
            started.elapsed().as_millis()
        );

        Ok(snapshot)
    }
}
