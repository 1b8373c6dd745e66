//! Draft data model.
//!
//! A [`Draft`] is a snapshot of wizard progress. Nested records keep the
//! camelCase field names of the stored blob so older collections still load.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reserved id of the in-progress draft.
pub const CURRENT_DRAFT_ID: &str = "current";

/// Total number of wizard steps a draft can record.
pub const TOTAL_STEPS: u8 = 5;

/// Identifier of a stored draft.
///
/// Exactly one value, [`DraftId::Current`], denotes the in-progress draft.
/// Every other id names an archived snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DraftId {
    /// The single in-progress draft
    Current,
    /// A named snapshot
    Named(String),
}

impl DraftId {
    /// Create a fresh snapshot id.
    pub fn new_named() -> Self {
        Self::Named(uuid::Uuid::new_v4().to_string())
    }

    /// Whether this is the reserved in-progress id.
    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }

    /// String form as stored.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Current => CURRENT_DRAFT_ID,
            Self::Named(name) => name,
        }
    }
}

impl From<String> for DraftId {
    fn from(value: String) -> Self {
        if value == CURRENT_DRAFT_ID {
            Self::Current
        } else {
            Self::Named(value)
        }
    }
}

impl From<&str> for DraftId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DraftId> for String {
    fn from(id: DraftId) -> Self {
        match id {
            DraftId::Current => CURRENT_DRAFT_ID.to_string(),
            DraftId::Named(name) => name,
        }
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident record describing a driver's account suspension.
///
/// Every field defaults to empty so partially filled records deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockReport {
    /// Report id (`block-<millis>`)
    pub id: String,
    /// Platform that blocked the driver (Uber, 99, iFood, ...)
    pub platform: String,
    /// Reason given by the platform
    pub block_reason: String,
    /// Driver's full name
    pub driver_name: String,
    /// National ID (CPF), formatted or bare digits
    pub cpf: String,
    /// Phone number, formatted or bare digits
    pub phone: String,
    /// Block date as `YYYY-MM-DD`
    pub block_date: String,
    /// Free-text context
    pub additional_context: String,
}

impl BlockReport {
    /// Build a report id from a point in time.
    pub fn make_id(at: DateTime<Utc>) -> String {
        format!("block-{}", at.timestamp_millis())
    }

    /// Parse the block date, if it is a valid `YYYY-MM-DD` date.
    pub fn parsed_block_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.block_date.trim(), "%Y-%m-%d").ok()
    }
}

/// Self-reported earnings and recurring monthly expenses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkHistory {
    /// Months active on the platform
    pub active_months: u32,
    /// Average daily earnings
    pub daily_avg_earnings: f64,
    /// Average weekly earnings
    pub weekly_avg_earnings: f64,
    /// Monthly vehicle financing installment
    pub monthly_vehicle_financing: f64,
    /// Monthly insurance
    pub monthly_insurance: f64,
    /// Monthly fuel
    pub monthly_fuel: f64,
    /// Monthly maintenance
    pub monthly_maintenance: f64,
}

impl WorkHistory {
    /// Sum of the four monthly expense fields.
    pub fn total_monthly_expenses(&self) -> f64 {
        self.monthly_vehicle_financing
            + self.monthly_insurance
            + self.monthly_fuel
            + self.monthly_maintenance
    }
}

/// Computed financial loss over the block period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CeasedProfits {
    pub total_lost_earnings: f64,
    pub total_expenses_during_block: f64,
    pub net_lost_profits: f64,
    pub avg_daily_earnings: f64,
    pub total_blocked_days: u32,
}

/// Generated legal defense document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegalDefense {
    pub block_type: String,
    pub structured_document: String,
    pub arguments: Vec<String>,
    pub applicable_laws: Vec<String>,
    pub suggested_next_steps: Vec<String>,
}

/// Category of block the defense argues against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    ArbitraryDismissal,
    FalseAccusation,
    SystemError,
    Discrimination,
    Retaliation,
}

impl BlockType {
    /// All block types, in display order.
    pub const ALL: [Self; 5] = [
        Self::ArbitraryDismissal,
        Self::FalseAccusation,
        Self::SystemError,
        Self::Discrimination,
        Self::Retaliation,
    ];

    /// Wire name sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArbitraryDismissal => "arbitraryDismissal",
            Self::FalseAccusation => "falseAccusation",
            Self::SystemError => "systemError",
            Self::Discrimination => "discrimination",
            Self::Retaliation => "retaliation",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ArbitraryDismissal => "Desligamento arbitrário",
            Self::FalseAccusation => "Acusação falsa",
            Self::SystemError => "Erro do sistema",
            Self::Discrimination => "Discriminação",
            Self::Retaliation => "Retaliação",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', '_'], "").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == normalized)
            .ok_or_else(|| format!("Unknown block type: {}", s))
    }
}

/// A persisted snapshot of in-progress wizard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Draft id
    pub id: DraftId,
    /// Time of last save
    pub timestamp: DateTime<Utc>,
    /// Block report, possibly partial
    #[serde(default)]
    pub block_report: Option<BlockReport>,
    /// Work history, possibly partial
    #[serde(default)]
    pub work_history: Option<WorkHistory>,
    /// Ceased-profits result, set once step 2 completes
    #[serde(default)]
    pub ceased_profits: Option<CeasedProfits>,
    /// Edited legal defense text
    #[serde(default)]
    pub legal_defense: Option<String>,
    /// Full generated defense, kept so a resumed draft can still export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_defense: Option<LegalDefense>,
    /// Wizard step (1..=5) at save time
    pub step: u8,
}

impl Draft {
    /// Create an empty draft at step 1.
    pub fn new(id: DraftId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            block_report: None,
            work_history: None,
            ceased_profits: None,
            legal_defense: None,
            generated_defense: None,
            step: 1,
        }
    }

    /// Set the block report.
    pub fn with_block_report(mut self, report: BlockReport) -> Self {
        self.block_report = Some(report);
        self
    }

    /// Set the work history.
    pub fn with_work_history(mut self, history: WorkHistory) -> Self {
        self.work_history = Some(history);
        self
    }

    /// Set the step.
    pub fn with_step(mut self, step: u8) -> Self {
        self.step = step;
        self
    }

    /// Short progress label, e.g. `3/5 completo`.
    pub fn progress_text(&self) -> String {
        format!("{}/{} completo", self.step, TOTAL_STEPS)
    }

    /// Display title used in listings.
    pub fn title(&self) -> String {
        match &self.block_report {
            Some(report) if !report.driver_name.is_empty() => {
                format!("{} - {}", report.driver_name, report.platform)
            }
            _ => "Rascunho sem nome".to_string(),
        }
    }
}
