//! "Saved N minutes ago" feedback driven by draft events.

use std::sync::mpsc::Receiver;

use chrono::{DateTime, Duration, Utc};

use super::manager::DraftEvent;

/// Tracks the most recent save for display.
#[derive(Debug, Clone, Default)]
pub struct SaveIndicator {
    last_saved: Option<DateTime<Utc>>,
}

impl SaveIndicator {
    /// Create an indicator with no save recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn observe(&mut self, event: &DraftEvent) {
        if let DraftEvent::Saved { at, .. } = event {
            self.last_saved = Some(*at);
        }
    }

    /// Apply every event waiting on `rx` without blocking.
    pub fn drain(&mut self, rx: &Receiver<DraftEvent>) {
        for event in rx.try_iter() {
            self.observe(&event);
        }
    }

    /// Time of the most recent save seen.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Whether the last save happened within the past minute.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.last_saved.is_some_and(|at| now - at < Duration::minutes(1))
    }

    /// Label such as `Salvo há 3 minutos`, or `None` before any save.
    pub fn label(&self, now: DateTime<Utc>) -> Option<String> {
        self.last_saved.map(|at| format!("Salvo {}", time_ago(now - at)))
    }
}

/// Relative time in Portuguese, at minute resolution.
pub fn time_ago(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        "agora mesmo".to_string()
    } else if minutes == 1 {
        "há 1 minuto".to_string()
    } else if minutes < 60 {
        format!("há {} minutos", minutes)
    } else {
        let hours = minutes / 60;
        if hours == 1 {
            "há 1 hora".to_string()
        } else {
            format!("há {} horas", hours)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drafts::model::DraftId;

    #[test]
    fn test_time_ago() {
        assert_eq!(time_ago(Duration::seconds(20)), "agora mesmo");
        assert_eq!(time_ago(Duration::seconds(90)), "há 1 minuto");
        assert_eq!(time_ago(Duration::minutes(12)), "há 12 minutos");
        assert_eq!(time_ago(Duration::minutes(61)), "há 1 hora");
        assert_eq!(time_ago(Duration::hours(5)), "há 5 horas");
    }

    #[test]
    fn test_indicator_tracks_saves_only() {
        let mut indicator = SaveIndicator::new();
        let now = Utc::now();
        assert!(indicator.label(now).is_none());

        indicator.observe(&DraftEvent::Saved { id: DraftId::Current, at: now });
        indicator.observe(&DraftEvent::Cleared);

        assert_eq!(indicator.last_saved(), Some(now));
        assert!(indicator.is_recent(now + Duration::seconds(30)));
        assert!(!indicator.is_recent(now + Duration::minutes(2)));
        assert_eq!(indicator.label(now + Duration::minutes(3)).unwrap(), "Salvo há 3 minutos");
    }

    #[test]
    fn test_drain_from_channel() {
        let (tx, rx) = std::sync::mpsc::channel();
        let at = Utc::now();
        tx.send(DraftEvent::Saved { id: DraftId::Current, at }).unwrap();

        let mut indicator = SaveIndicator::new();
        indicator.drain(&rx);
        assert_eq!(indicator.last_saved(), Some(at));
    }
}
