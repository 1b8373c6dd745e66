//! Step wizard controller.
//!
//! Drives the linear five-step workflow:
//!
//! ```text
//! BlockReport(1) -> WorkHistory(2) -> Review(3) -> DefenseGeneration(4) -> DefenseEditing(5)
//! ```
//!
//! Each forward transition happens only after its remote call succeeds and is
//! followed by an auto-save of the in-progress draft. Review can jump back to
//! steps 1 and 2 without discarding collected data. Export from step 5 is a
//! side effect and leaves the step unchanged.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use super::error::{WizardError, WizardResult};
use super::host::{Clock, Notice, SystemClock, WizardHost};
use super::step::WizardStep;
use super::validation::{validate_block_report, validate_work_history};
use crate::backend::{Backend, BackendError};
use crate::drafts::{
    BlockReport, BlockType, CeasedProfits, Draft, DraftId, DraftManager, LegalDefense, WorkHistory,
};
use crate::export::format::format_brl;
use crate::export::{CaseRecord, DocumentExporter, ExportedDocument};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole days between the start of `block_date` (UTC) and `now`, rounded up.
///
/// The distance is absolute, so a block date in the future still counts days.
pub fn blocked_days(block_date: NaiveDate, now: DateTime<Utc>) -> u32 {
    let start = block_date.and_time(chrono::NaiveTime::MIN).and_utc();
    let elapsed = (now - start).num_milliseconds().abs();
    let days = (elapsed + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Context string sent along with a defense generation request.
pub fn build_defense_context(
    report: &BlockReport,
    history: &WorkHistory,
    profits: &CeasedProfits,
    details: &str,
) -> String {
    let or_none = |s: &str| if s.trim().is_empty() { "Nenhum".to_string() } else { s.trim().to_string() };

    format!(
        "Plataforma: {}\n\
         Motivo alegado: {}\n\
         Nome do motorista: {}\n\
         CPF: {}\n\
         Telefone: {}\n\
         Data do bloqueio: {}\n\
         Tempo de atividade: {} meses\n\
         Ganho médio diário: {}\n\
         Lucros cessantes: {}\n\
         Dias bloqueado: {}\n\
         Contexto adicional: {}\n\
         Detalhes adicionais: {}",
        report.platform,
        report.block_reason,
        report.driver_name,
        report.cpf,
        report.phone,
        report.block_date,
        history.active_months,
        format_brl(history.daily_avg_earnings),
        format_brl(profits.net_lost_profits),
        profits.total_blocked_days,
        or_none(&report.additional_context),
        or_none(details),
    )
}

/// In-memory wizard state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardState {
    /// Current step
    pub step: WizardStep,
    /// Step 1 data
    pub block_report: Option<BlockReport>,
    /// Step 2 data
    pub work_history: Option<WorkHistory>,
    /// Result of the step 2 computation
    pub ceased_profits: Option<CeasedProfits>,
    /// Defense returned by step 4
    pub legal_defense: Option<LegalDefense>,
    /// Editable defense text, seeded from the generated document
    pub defense_text: Option<String>,
    /// Step whose remote call is in flight
    pub pending: Option<WizardStep>,
}

impl WizardState {
    /// Snapshot as the in-progress draft.
    pub fn to_draft(&self, at: DateTime<Utc>) -> Draft {
        Draft {
            id: DraftId::Current,
            timestamp: at,
            block_report: self.block_report.clone(),
            work_history: self.work_history.clone(),
            ceased_profits: self.ceased_profits.clone(),
            legal_defense: self.defense_text.clone(),
            generated_defense: self.legal_defense.clone(),
            step: self.step.number(),
        }
    }

    /// Restore from a draft.
    ///
    /// The step is clamped back to the furthest step the draft's data
    /// supports, so a resumed wizard never sits at a step whose inputs are
    /// missing.
    pub fn from_draft(draft: &Draft) -> Self {
        let mut step = WizardStep::from_number(draft.step).unwrap_or_default();

        if draft.block_report.is_none() {
            step = WizardStep::BlockReport;
        } else if step >= WizardStep::Review
            && (draft.work_history.is_none() || draft.ceased_profits.is_none())
        {
            step = WizardStep::WorkHistory;
        } else if step == WizardStep::DefenseEditing && draft.generated_defense.is_none() {
            step = WizardStep::DefenseGeneration;
        }

        let defense_text = draft
            .legal_defense
            .clone()
            .or_else(|| draft.generated_defense.as_ref().map(|d| d.structured_document.clone()));

        Self {
            step,
            block_report: draft.block_report.clone(),
            work_history: draft.work_history.clone(),
            ceased_profits: draft.ceased_profits.clone(),
            legal_defense: draft.generated_defense.clone(),
            defense_text,
            pending: None,
        }
    }
}

/// Clears the pending flag when a submission ends, including on cancellation.
struct PendingGuard<'a> {
    state: &'a Mutex<WizardState>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().pending = None;
    }
}

/// Controller for the five-step defense wizard.
pub struct WizardController {
    backend: Arc<dyn Backend>,
    drafts: Arc<DraftManager>,
    host: Arc<dyn WizardHost>,
    clock: Arc<dyn Clock>,
    state: Mutex<WizardState>,
}

impl WizardController {
    /// Create a controller at step 1 using the system clock.
    pub fn new(
        backend: Arc<dyn Backend>,
        drafts: Arc<DraftManager>,
        host: Arc<dyn WizardHost>,
    ) -> Self {
        Self {
            backend,
            drafts,
            host,
            clock: Arc::new(SystemClock),
            state: Mutex::new(WizardState::default()),
        }
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WizardState {
        self.state.lock().clone()
    }

    /// Current step.
    pub fn step(&self) -> WizardStep {
        self.state.lock().step
    }

    /// Whether a remote call is in flight.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Draft manager used for auto-save.
    pub fn drafts(&self) -> &DraftManager {
        &self.drafts
    }

    /// Offer to restore the stored in-progress draft.
    ///
    /// Asks the host for confirmation first. Returns whether a draft was
    /// restored.
    pub fn resume(&self) -> bool {
        if self.is_pending() {
            return false;
        }

        let Some(draft) = self.drafts.load_current() else {
            return false;
        };

        let prompt = format!(
            "Encontramos um rascunho salvo ({}). Deseja continuar de onde parou?",
            draft.progress_text()
        );
        if !self.host.confirm(&prompt) {
            tracing::debug!("Draft resume declined");
            return false;
        }

        let restored = WizardState::from_draft(&draft);
        tracing::info!(step = restored.step.number(), "Resumed draft");
        *self.state.lock() = restored;
        self.host.notify(Notice::Info("Rascunho restaurado.".to_string()));
        true
    }

    /// Step 1 -> 2: validate and submit the block report.
    pub async fn submit_block_report(&self, mut report: BlockReport) -> WizardResult<()> {
        let _pending = self.begin(WizardStep::BlockReport, "submit the block report")?;
        validate_block_report(&report).map_err(WizardError::Validation)?;

        if report.id.trim().is_empty() {
            report.id = BlockReport::make_id(self.clock.now());
        }

        if let Err(e) = self.backend.submit_block_report(&report).await {
            return Err(self.remote_failure("Erro ao enviar o relatório de bloqueio", e));
        }

        {
            let mut state = self.state.lock();
            state.block_report = Some(report);
            state.step = WizardStep::WorkHistory;
        }

        self.host.notify(Notice::Success("Relatório de bloqueio salvo com sucesso!".to_string()));
        self.auto_save();
        Ok(())
    }

    /// Step 2 -> 3: submit the work history and compute ceased profits.
    pub async fn submit_work_history(&self, history: WorkHistory) -> WizardResult<()> {
        let _pending = self.begin(WizardStep::WorkHistory, "submit the work history")?;
        validate_work_history(&history).map_err(WizardError::Validation)?;

        let block_date = {
            let state = self.state.lock();
            state
                .block_report
                .as_ref()
                .and_then(BlockReport::parsed_block_date)
                .ok_or(WizardError::MissingData("block report"))?
        };

        let days = blocked_days(block_date, self.clock.now());
        let monthly_expenses = history.total_monthly_expenses();

        if let Err(e) = self.backend.submit_work_history(&history).await {
            return Err(self.remote_failure("Erro ao enviar o histórico de trabalho", e));
        }

        let profits = match self
            .backend
            .compute_ceased_profits(days, history.daily_avg_earnings, monthly_expenses)
            .await
        {
            Ok(profits) => profits,
            Err(e) => return Err(self.remote_failure("Erro ao calcular os lucros cessantes", e)),
        };

        tracing::debug!(
            blocked_days = days,
            monthly_expenses,
            net_lost_profits = profits.net_lost_profits,
            "Ceased profits computed"
        );

        {
            let mut state = self.state.lock();
            state.work_history = Some(history);
            state.ceased_profits = Some(profits);
            state.step = WizardStep::Review;
        }

        self.host.notify(Notice::Success("Cálculo concluído com sucesso!".to_string()));
        self.auto_save();
        Ok(())
    }

    /// Step 3 -> 4: confirm the reviewed data.
    pub fn confirm_review(&self) -> WizardResult<()> {
        {
            let mut state = self.state.lock();
            if let Some(step) = state.pending {
                return Err(WizardError::SubmissionPending(step));
            }
            if state.step != WizardStep::Review {
                return Err(WizardError::InvalidTransition { from: state.step, action: "confirm the review" });
            }
            state.step = WizardStep::DefenseGeneration;
        }

        self.auto_save();
        Ok(())
    }

    /// From review, go back to step 1 or 2 keeping all collected data.
    pub fn edit_step(&self, target: WizardStep) -> WizardResult<()> {
        let mut state = self.state.lock();
        if let Some(step) = state.pending {
            return Err(WizardError::SubmissionPending(step));
        }
        if state.step != WizardStep::Review || !target.is_editable() {
            return Err(WizardError::InvalidTransition { from: state.step, action: "go back to edit" });
        }

        tracing::debug!(target = target.number(), "Editing earlier step");
        state.step = target;
        Ok(())
    }

    /// Step 4 -> 5: generate the legal defense.
    pub async fn generate_defense(&self, block_type: BlockType, details: &str) -> WizardResult<()> {
        let _pending = self.begin(WizardStep::DefenseGeneration, "generate the defense")?;

        let context = {
            let state = self.state.lock();
            let report = state.block_report.as_ref().ok_or(WizardError::MissingData("block report"))?;
            let history = state.work_history.as_ref().ok_or(WizardError::MissingData("work history"))?;
            let profits =
                state.ceased_profits.as_ref().ok_or(WizardError::MissingData("ceased profits"))?;
            build_defense_context(report, history, profits, details)
        };

        let defense = match self.backend.generate_legal_defense(block_type.as_str(), &context).await {
            Ok(defense) => defense,
            Err(e) => return Err(self.remote_failure("Erro ao gerar defesa jurídica", e)),
        };

        {
            let mut state = self.state.lock();
            state.defense_text = Some(defense.structured_document.clone());
            state.legal_defense = Some(defense);
            state.step = WizardStep::DefenseEditing;
        }

        self.host.notify(Notice::Success("Defesa jurídica gerada com sucesso!".to_string()));
        self.auto_save();
        Ok(())
    }

    /// Replace the editable defense text (step 5).
    pub fn update_defense_text(&self, text: impl Into<String>) -> WizardResult<()> {
        {
            let mut state = self.state.lock();
            if state.step != WizardStep::DefenseEditing {
                return Err(WizardError::InvalidTransition { from: state.step, action: "edit the defense" });
            }
            state.defense_text = Some(text.into());
        }

        self.auto_save();
        Ok(())
    }

    /// Restore the generated defense text, discarding edits (step 5).
    pub fn reset_defense_text(&self) -> WizardResult<()> {
        let original = {
            let state = self.state.lock();
            if state.step != WizardStep::DefenseEditing {
                return Err(WizardError::InvalidTransition { from: state.step, action: "reset the defense" });
            }
            state
                .legal_defense
                .as_ref()
                .map(|d| d.structured_document.clone())
                .ok_or(WizardError::MissingData("generated defense"))?
        };

        self.update_defense_text(original)
    }

    /// Whether the defense text differs from the generated document.
    pub fn defense_has_changes(&self) -> bool {
        let state = self.state.lock();
        match (&state.legal_defense, &state.defense_text) {
            (Some(defense), Some(text)) => defense.structured_document != *text,
            _ => false,
        }
    }

    /// The complete case, available once the wizard reaches step 5.
    pub fn case_record(&self) -> WizardResult<CaseRecord> {
        let state = self.state.lock();
        if state.step != WizardStep::DefenseEditing {
            return Err(WizardError::InvalidTransition { from: state.step, action: "export" });
        }

        let legal_defense =
            state.legal_defense.clone().ok_or(WizardError::MissingData("generated defense"))?;
        let defense_text =
            state.defense_text.clone().unwrap_or_else(|| legal_defense.structured_document.clone());

        Ok(CaseRecord {
            block_report: state.block_report.clone().ok_or(WizardError::MissingData("block report"))?,
            work_history: state.work_history.clone().ok_or(WizardError::MissingData("work history"))?,
            ceased_profits: state
                .ceased_profits
                .clone()
                .ok_or(WizardError::MissingData("ceased profits"))?,
            legal_defense,
            defense_text,
        })
    }

    /// Hand the finished case to `exporter`. Does not change the step.
    pub fn export(&self, exporter: &dyn DocumentExporter) -> WizardResult<ExportedDocument> {
        let record = self.case_record()?;

        match exporter.export(&record, self.clock.now()) {
            Ok(document) => {
                self.host.notify(Notice::Success("Documento exportado com sucesso!".to_string()));
                Ok(document)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                self.host.notify(Notice::Error("Erro ao exportar documento.".to_string()));
                Err(WizardError::Export(e.to_string()))
            }
        }
    }

    /// Start over at step 1 with no data.
    ///
    /// The stored in-progress draft is archived as a named snapshot first.
    pub fn new_report(&self) -> WizardResult<()> {
        if let Some(step) = self.state.lock().pending {
            return Err(WizardError::SubmissionPending(step));
        }

        match self.drafts.archive_current() {
            Ok(Some(id)) => tracing::info!(draft_id = %id, "Previous report archived"),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to archive previous report");
                self.host.notify(Notice::Error("Erro ao salvar. Tente novamente.".to_string()));
            }
        }

        *self.state.lock() = WizardState::default();
        Ok(())
    }

    fn begin(&self, expected: WizardStep, action: &'static str) -> WizardResult<PendingGuard<'_>> {
        let mut state = self.state.lock();
        if let Some(step) = state.pending {
            return Err(WizardError::SubmissionPending(step));
        }
        if state.step != expected {
            return Err(WizardError::InvalidTransition { from: state.step, action });
        }

        state.pending = Some(expected);
        Ok(PendingGuard { state: &self.state })
    }

    fn remote_failure(&self, message: &str, error: BackendError) -> WizardError {
        tracing::warn!(backend = self.backend.name(), error = %error, "{}", message);
        self.host.notify(Notice::Error(format!("{}: {}", message, error)));
        WizardError::Remote(error)
    }

    /// Persist the in-progress draft. Failures are reported, never raised.
    fn auto_save(&self) {
        let draft = self.state.lock().to_draft(self.clock.now());

        if let Err(e) = self.drafts.save(&draft) {
            tracing::warn!(error = %e, step = draft.step, "Auto-save failed");
            self.host.notify(Notice::Error("Erro ao salvar. Tente novamente.".to_string()));
        }
    }
}
