//! HTTP client for the remote table API.
//!
//! Issues `GET {base}/api/now/table/{table}` list queries and
//! `GET {base}/api/now/table/{table}/{id}` point lookups. Every request asks
//! for both raw and display values of reference fields, which is why
//! callers must go through [`crate::reference`] to read them.
//!
//! Transient failures (transport errors, HTTP 429 and 5xx) are retried with
//! exponential backoff up to the configured number of attempts.

use crate::config::InstanceConfig;
use crate::error::{Error, Result};
use crate::query::{Record, RecordQuery};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Path prefix of the table API.
const TABLE_API_PATH: &str = "api/now/table";

/// Delay before the first retry; doubled for each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct ListResponse {
    result: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct SingleResponse {
    result: Record,
}

/// Client for the table API of a single instance.
#[derive(Clone)]
pub struct TableApiClient {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for TableApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableApiClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl TableApiClient {
    /// Build a client from instance configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the URL is empty and `Error::Http` if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(config: &InstanceConfig) -> Result<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("instance url must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            max_retries: config.max_retries,
            retry_delay: RETRY_BASE_DELAY,
        })
    }

    /// Override the initial retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// The normalized base URL of the instance.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{TABLE_API_PATH}/{table}", self.base_url)
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/{TABLE_API_PATH}/{table}/{id}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }

    /// Send a request, retrying transient failures.
    ///
    /// Returns the first non-retryable response, or the last one once the
    /// retry budget is spent.
    async fn send(&self, table: &str, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let outcome = self.authorize(build()).send().await;
            let retry = match &outcome {
                Ok(response) => is_retryable(response.status()),
                Err(e) => e.is_timeout() || e.is_connect(),
            };

            if !retry || attempt >= self.max_retries {
                return outcome.map_err(Error::from);
            }

            let delay = self.retry_delay.saturating_mul(2u32.saturating_pow(attempt));
            attempt += 1;
            warn!(
                table,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying table API request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Whether a response status is worth retrying.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn failure(table: &str, response: Response) -> Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Error::remote(table, format!("HTTP {status}: {body}"))
}

#[async_trait]
impl RecordQuery for TableApiClient {
    async fn query(
        &self,
        table: &str,
        filter: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<Record>> {
        let url = self.table_url(table);
        let params = [
            ("sysparm_query", filter.to_string()),
            ("sysparm_fields", fields.join(",")),
            ("sysparm_limit", limit.to_string()),
            ("sysparm_display_value", "all".to_string()),
        ];
        debug!(table, filter, limit, "Table API query");

        let response = self
            .send(table, || self.client.get(&url).query(&params))
            .await?;
        if !response.status().is_success() {
            return Err(failure(table, response).await);
        }

        let body: ListResponse = response.json().await?;
        Ok(body.result)
    }

    async fn get(&self, table: &str, id: &str, fields: &[&str]) -> Result<Option<Record>> {
        let url = self.record_url(table, id);
        let params = [
            ("sysparm_fields", fields.join(",")),
            ("sysparm_display_value", "all".to_string()),
        ];
        debug!(table, id, "Table API get");

        let response = self
            .send(table, || self.client.get(&url).query(&params))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure(table, response).await);
        }

        let body: SingleResponse = response.json().await?;
        Ok(Some(body.result))
    }
}
