//! HTTP audit sink: POSTs each row as a flat JSON object.

use std::time::Duration;

use async_trait::async_trait;
use kesonia_core::AuditRecord;
use tracing::{debug, info};

use crate::{AuditSink, SinkError};

pub struct HttpAuditSink {
    client: reqwest::Client,
    url: String,
}

impl HttpAuditSink {
    /// Sink posting to `url`, giving up on any request after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let url = url.into();
        info!(url = %url, timeout_secs = timeout.as_secs_f64(), "audit sink configured");
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn submit(&self, record: &AuditRecord) -> Result<(), SinkError> {
        debug!(url = %self.url, status = record.status.as_str(), "submitting audit row");
        let resp = self.client.post(&self.url).json(record).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
