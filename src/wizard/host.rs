//! Capabilities the wizard borrows from its host.
//!
//! The controller never talks to a terminal or window directly. It asks the
//! host to confirm yes/no questions and to show transient notices, and it
//! reads the current time from a [`Clock`].

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    /// Message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Info(m) | Self::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Host-provided interaction.
pub trait WizardHost: Send + Sync {
    /// Ask a yes/no question.
    fn confirm(&self, prompt: &str) -> bool;

    /// Show a transient notice.
    fn notify(&self, notice: Notice);
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Set the current time.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Host that answers every confirmation the same way and records notices.
#[derive(Debug)]
pub struct RecordingHost {
    answer: bool,
    prompts: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingHost {
    /// Create a host that answers `answer` to every confirmation.
    pub fn new(answer: bool) -> Self {
        Self { answer, prompts: Mutex::new(Vec::new()), notices: Mutex::new(Vec::new()) }
    }

    /// Confirmation prompts asked so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Notices shown so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Most recent notice.
    pub fn last_notice(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl WizardHost for RecordingHost {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        self.answer
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), start + Duration::days(2));
    }

    #[test]
    fn test_recording_host() {
        let host = RecordingHost::new(false);
        assert!(!host.confirm("Continuar?"));
        host.notify(Notice::Error("falhou".to_string()));

        assert_eq!(host.prompts(), vec!["Continuar?".to_string()]);
        assert!(host.last_notice().unwrap().is_error());
        assert_eq!(host.last_notice().unwrap().message(), "falhou");
    }
}
