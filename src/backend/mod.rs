//! Remote backend collaborator.
//!
//! The wizard talks to the backend through the [`Backend`] trait: it accepts
//! block reports and work histories, computes ceased profits, and returns
//! legal defense text. Two implementations are provided:
//!
//! - [`LocalBackend`] - in-process computation and templated legal text
//! - [`HttpBackend`] - JSON over HTTP (requires the `remote` feature)

mod local;

#[cfg(feature = "remote")]
mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::drafts::{BlockReport, CeasedProfits, LegalDefense, WorkHistory};

pub use local::{compute_ceased_profits, LocalBackend, DAYS_PER_MONTH};

#[cfg(feature = "remote")]
pub use http::HttpBackend;

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors returned by backend calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The request did not reach the backend or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with something we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Request/response interface of the remote backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Record a block report.
    async fn submit_block_report(&self, report: &BlockReport) -> BackendResult<()>;

    /// Record a work history.
    async fn submit_work_history(&self, history: &WorkHistory) -> BackendResult<()>;

    /// Compute the financial loss over `blocked_days`.
    async fn compute_ceased_profits(
        &self,
        blocked_days: u32,
        avg_daily_earnings: f64,
        monthly_expenses: f64,
    ) -> BackendResult<CeasedProfits>;

    /// Generate a legal defense for `block_type` given a free-text context.
    async fn generate_legal_defense(
        &self,
        block_type: &str,
        context: &str,
    ) -> BackendResult<LegalDefense>;
}
