//! Carrier HTTP client for the remote tracking endpoint
//!
//! Request shape: `GET <url>?trackingNumber=<id>` with the `DHL-API-Key`
//! header. One pooled client is built at startup with a bounded timeout;
//! non-2xx responses surface as errors to the caller (the entity absorbs
//! them).

use crate::domain::types::{TrackingId, TrackingResponse};
use crate::infra::config::Config;
use anyhow::Context;
use std::time::Duration;

/// Credential header expected by the carrier API
const API_KEY_HEADER: &str = "DHL-API-Key";

pub struct CarrierClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl CarrierClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_endpoint(
            config.api_url().to_string(),
            config.api_key().to_string(),
            Duration::from_secs(config.api_timeout_secs()),
        )
    }

    pub fn with_endpoint(
        endpoint: String,
        api_key: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build carrier HTTP client")?;

        Ok(Self { http, endpoint, api_key })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the current shipment list for one tracking identifier
    pub async fn track(&self, id: &TrackingId) -> anyhow::Result<TrackingResponse> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("trackingNumber", id.as_str())])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .with_context(|| format!("tracking request for {} failed", id))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("tracking request for {} rejected", id))?;

        response
            .json::<TrackingResponse>()
            .await
            .with_context(|| format!("invalid tracking response for {}", id))
    }
}
