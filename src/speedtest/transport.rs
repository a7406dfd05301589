use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::time::Duration;

use crate::error::ProbeError;

/// Response body of a probe download, reduced to what the measurement needs.
pub struct BodyStream {
    /// Size announced by the server. `None` when absent or zero.
    pub content_length: Option<u64>,
    /// Length of each chunk as it arrives.
    pub chunks: BoxStream<'static, Result<usize, ProbeError>>,
}

#[async_trait]
pub trait ProbeTransport: Send + Sync + 'static {
    /// Metadata-only request. Resolves once response headers arrive.
    async fn head(&self, url: &str) -> Result<(), ProbeError>;

    /// Full-body request. Resolves once response headers arrive; the body is
    /// read through the returned stream.
    async fn get(&self, url: &str) -> Result<BodyStream, ProbeError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    read_timeout: Duration,
}

impl HttpTransport {
    /// `read_timeout` bounds the silence between two reads, not the whole
    /// transfer, so a slow link that keeps delivering is never cut off.
    pub fn new(read_timeout: Duration, connect_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .read_timeout(read_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|source| ProbeError::Client { source })?;
        Ok(Self {
            client,
            read_timeout,
        })
    }

    fn request_error(&self, method: &'static str, url: &str, source: reqwest::Error) -> ProbeError {
        if source.is_timeout() {
            return timeout_error("waiting for the response", url, self.read_timeout);
        }
        ProbeError::Request {
            method,
            url: url.to_string(),
            source,
        }
    }
}

fn timeout_error(stage: &'static str, url: &str, idle: Duration) -> ProbeError {
    ProbeError::Timeout {
        stage,
        url: url.to_string(),
        idle_secs: idle.as_secs(),
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn head(&self, url: &str) -> Result<(), ProbeError> {
        self.client
            .head(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|source| self.request_error("HEAD", url, source))?;
        Ok(())
    }

    async fn get(&self, url: &str) -> Result<BodyStream, ProbeError> {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|source| self.request_error("GET", url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_length = response.content_length().filter(|len| *len > 0);
        let body_url = url.to_string();
        let idle = self.read_timeout;
        let chunks = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map(|bytes| bytes.len()).map_err(|source| {
                    if source.is_timeout() {
                        timeout_error("reading the response body", &body_url, idle)
                    } else {
                        ProbeError::Body { source }
                    }
                })
            })
            .boxed();

        Ok(BodyStream {
            content_length,
            chunks,
        })
    }
}
