//! JSON-over-HTTP backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Backend, BackendError, BackendResult};
use crate::drafts::{BlockReport, CeasedProfits, LegalDefense, WorkHistory};

/// Backend reached over HTTP.
///
/// Endpoints (all `POST`, JSON bodies in camelCase):
/// - `/block-reports`
/// - `/work-histories`
/// - `/ceased-profits` -> [`CeasedProfits`]
/// - `/legal-defenses` -> [`LegalDefense`]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CeasedProfitsRequest {
    total_blocked_days: u32,
    avg_daily_earnings: f64,
    monthly_expenses: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LegalDefenseRequest<'a> {
    block_type: &'a str,
    context: &'a str,
}

impl HttpBackend {
    /// Create a backend for `base_url` with no request timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Create a backend whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> BackendResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Backend request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected(format!("{} {}", status, body.trim())));
        }

        Ok(response)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> BackendResult<T> {
        self.post(path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit_block_report(&self, report: &BlockReport) -> BackendResult<()> {
        self.post("/block-reports", report).await.map(|_| ())
    }

    async fn submit_work_history(&self, history: &WorkHistory) -> BackendResult<()> {
        self.post("/work-histories", history).await.map(|_| ())
    }

    async fn compute_ceased_profits(
        &self,
        blocked_days: u32,
        avg_daily_earnings: f64,
        monthly_expenses: f64,
    ) -> BackendResult<CeasedProfits> {
        let request = CeasedProfitsRequest {
            total_blocked_days: blocked_days,
            avg_daily_earnings,
            monthly_expenses,
        };
        self.post_json("/ceased-profits", &request).await
    }

    async fn generate_legal_defense(
        &self,
        block_type: &str,
        context: &str,
    ) -> BackendResult<LegalDefense> {
        self.post_json("/legal-defenses", &LegalDefenseRequest { block_type, context }).await
    }
}
