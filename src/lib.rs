#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::float_cmp)]

//! # Defense Hub
//!
//! Guided workflow for gig-economy drivers whose platform account was blocked.
//!
//! A five-step wizard collects the block report and work history, computes
//! ceased profits over the block period, generates a legal defense and hands
//! the finished case to a document exporter. In-progress work is auto-saved
//! as drafts so it survives restarts.
//!
//! ## Features
//!
//! - **Drafts**: Upsert-by-id draft persistence over a pluggable storage medium
//! - **Wizard**: Validated, linear step transitions with a resumable draft
//! - **Backends**: In-process computation or a JSON-over-HTTP service
//! - **Export**: Printable HTML defense documents
//!
//! ## Quick Start
//!
//! ```bash
//! # Start or resume a case
//! defensehub wizard
//!
//! # Inspect saved drafts
//! defensehub drafts list
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod backend;
pub mod core;
pub mod drafts;
pub mod export;
pub mod wizard;

// Re-export commonly used types
pub use backend::{Backend, BackendError, LocalBackend};
pub use core::Config;
pub use drafts::{Draft, DraftId, DraftManager, DraftStore};
pub use export::{CaseRecord, DocumentExporter, HtmlExporter};
pub use wizard::{WizardController, WizardError, WizardHost, WizardStep};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "defensehub";
