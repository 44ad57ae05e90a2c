//! Swarmia Export API client.
//!
//! Issues authenticated GET requests and hands back the response body
//! untouched. Reports come back as CSV; nothing here parses them.

use std::future::Future;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::{Config, Credential};
use crate::error::{ReportError, ReportResult};
use crate::params::QueryParams;

/// Upper bound for a single API request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter carrying the credential.
const TOKEN_PARAM: &str = "token";

/// Anything able to fetch a report body.
///
/// The dispatcher only talks to this trait, so tests can swap the
/// network for an in-memory implementation.
pub trait ReportClient: Send + Sync + 'static {
    fn call(
        &self,
        path: &str,
        query: &QueryParams,
    ) -> impl Future<Output = ReportResult<String>> + Send;
}

/// Long-lived HTTP client, shared by every tool call.
#[derive(Debug)]
pub struct SwarmiaClient {
    client: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl SwarmiaClient {
    pub fn new(config: Config) -> ReportResult<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Like [`SwarmiaClient::new`] with a custom per-request timeout.
    pub fn with_timeout(config: Config, timeout: Duration) -> ReportResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            credential: config.credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Release the connection pool.
    pub fn close(self) {
        info!("Closing Swarmia API client");
        drop(self.client);
    }
}

impl ReportClient for SwarmiaClient {
    async fn call(&self, path: &str, query: &QueryParams) -> ReportResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        // reqwest errors embed the full URL; strip it so the token never
        // ends up in a log line or a tool result.
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[(TOKEN_PARAM, self.credential.expose())])
            .send()
            .await
            .map_err(|e| ReportError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    let e = e.without_url();
                    warn!("Failed to read error body: {}", e);
                    format!("<unreadable response body: {}>", e)
                }
            };
            error!("HTTP error {}: {}", status.as_u16(), body);
            return Err(ReportError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| ReportError::Transport(e.without_url()))
    }
}
