//! HTTP client for systemd-journal-gatewayd

use std::io;

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, RANGE};
use tokio_util::io::StreamReader;
use tracing::debug;

use journalscope_logs::{JournalLogReader, LineFormatter};
use journalscope_types::JOURNAL_EXPORT_MIME;

use crate::request::EntriesRequest;

/// Address the gateway listens on by default
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:19531";

/// Response body of an entries request, readable as a byte source
pub type EntriesBody = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

/// Journal gateway client wrapper
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `request` and return the response body in journal export format
    ///
    /// The connection stays open until the returned body is dropped.
    pub async fn open(&self, request: &EntriesRequest) -> Result<EntriesBody> {
        let url = format!("{}{}", self.base_url, request.get_path());
        let range = request.get_range().map(|r| r.to_header());

        let mut builder = self.http.get(&url).header(ACCEPT, JOURNAL_EXPORT_MIME);
        if !request.get_params().is_empty() {
            builder = builder.query(request.get_params());
        }
        if let Some(range) = &range {
            builder = builder.header(RANGE, range);
        }
        if let Some(timeout) = request.get_timeout() {
            builder = builder.timeout(timeout);
        }

        debug!(
            url = %url,
            range = ?range,
            params = request.get_params().len(),
            "requesting journal entries"
        );

        let response = builder
            .send()
            .await
            .context(format!("Failed to reach journal gateway at {}", url))?
            .error_for_status()
            .context(format!("Journal gateway rejected request for {}", url))?;

        let body = response.bytes_stream().map_err(io::Error::other).boxed();
        Ok(StreamReader::new(body))
    }

    /// Send `request` and read the response as formatted log lines
    pub async fn logs(
        &self,
        request: &EntriesRequest,
        formatter: impl Into<LineFormatter>,
    ) -> Result<JournalLogReader<EntriesBody>> {
        let body = self.open(request).await?;
        Ok(JournalLogReader::new(body, formatter))
    }
}
