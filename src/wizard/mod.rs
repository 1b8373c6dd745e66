//! Five-step defense wizard.
//!
//! The [`WizardController`] owns the in-progress case and moves it through
//! block report, work history, review, defense generation and defense
//! editing. Every forward transition is gated on local validation and a
//! successful backend call, and is followed by an auto-save through the
//! [`DraftManager`](crate::drafts::DraftManager).

mod controller;
mod error;
mod host;
mod step;
mod validation;

pub use controller::{blocked_days, build_defense_context, WizardController, WizardState};
pub use error::{WizardError, WizardResult};
pub use host::{Clock, FixedClock, Notice, RecordingHost, SystemClock, WizardHost};
pub use step::WizardStep;
pub use validation::{
    digits, validate_block_report, validate_cpf, validate_phone, validate_work_history,
    FieldErrors,
};
