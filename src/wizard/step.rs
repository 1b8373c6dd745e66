//! Wizard steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::drafts::TOTAL_STEPS;

/// The five linear wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    BlockReport,
    WorkHistory,
    Review,
    DefenseGeneration,
    DefenseEditing,
}

impl WizardStep {
    /// All steps in order.
    pub const ALL: [Self; 5] = [
        Self::BlockReport,
        Self::WorkHistory,
        Self::Review,
        Self::DefenseGeneration,
        Self::DefenseEditing,
    ];

    /// 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::BlockReport => 1,
            Self::WorkHistory => 2,
            Self::Review => 3,
            Self::DefenseGeneration => 4,
            Self::DefenseEditing => 5,
        }
    }

    /// Step for a 1-based number.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Following step, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Step label shown in the progress header.
    pub fn label(self) -> &'static str {
        match self {
            Self::BlockReport => "Dados do Bloqueio",
            Self::WorkHistory => "Histórico de Trabalho",
            Self::Review => "Revisão",
            Self::DefenseGeneration => "Defesa Jurídica",
            Self::DefenseEditing => "Edição Final",
        }
    }

    /// Progress header, e.g. `Passo 2 de 5`.
    pub fn progress_text(self) -> String {
        format!("Passo {} de {}", self.number(), TOTAL_STEPS)
    }

    /// Whether the review step may jump back to this step for editing.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::BlockReport | Self::WorkHistory)
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::BlockReport
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}
