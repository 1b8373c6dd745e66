//! Wizard Integration Tests
//!
//! Drives the five-step wizard against the in-process backend and in-memory
//! draft storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use defensehub::backend::{Backend, BackendError, BackendResult, LocalBackend};
use defensehub::drafts::{
    BlockReport, BlockType, CeasedProfits, Draft, DraftId, DraftManager, DraftStore,
    LegalDefense, MemoryStorage, WorkHistory,
};
use defensehub::export::HtmlExporter;
use defensehub::wizard::{
    FixedClock, Notice, RecordingHost, WizardController, WizardError, WizardStep,
};

// ============================================================================
// Fixtures
// ============================================================================

struct Harness {
    backend: Arc<LocalBackend>,
    drafts: Arc<DraftManager>,
    host: Arc<RecordingHost>,
    controller: Arc<WizardController>,
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap()))
}

fn harness_with(drafts: DraftManager, confirm: bool) -> Harness {
    let backend = Arc::new(LocalBackend::new());
    let drafts = Arc::new(drafts);
    let host = Arc::new(RecordingHost::new(confirm));
    let controller = Arc::new(
        WizardController::new(backend.clone(), drafts.clone(), host.clone()).with_clock(clock()),
    );
    Harness { backend, drafts, host, controller }
}

fn harness() -> Harness {
    harness_with(DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::new()))), true)
}

fn report() -> BlockReport {
    BlockReport {
        platform: "Uber".to_string(),
        block_reason: "Cancelamentos excessivos".to_string(),
        driver_name: "Ana Silva".to_string(),
        cpf: "111.444.777-35".to_string(),
        phone: "(11) 98765-4321".to_string(),
        block_date: "2024-01-01".to_string(),
        ..Default::default()
    }
}

fn history() -> WorkHistory {
    WorkHistory {
        active_months: 14,
        daily_avg_earnings: 150.0,
        weekly_avg_earnings: 900.0,
        monthly_vehicle_financing: 1000.0,
        monthly_insurance: 250.0,
        monthly_fuel: 300.0,
        monthly_maintenance: 200.0,
    }
}

async fn advance_to_review(h: &Harness) {
    h.controller.submit_block_report(report()).await.unwrap();
    h.controller.submit_work_history(history()).await.unwrap();
}

async fn advance_to_editing(h: &Harness) {
    advance_to_review(h).await;
    h.controller.confirm_review().unwrap();
    h.controller.generate_defense(BlockType::ArbitraryDismissal, "").await.unwrap();
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_full_workflow() {
    let h = harness();

    h.controller.submit_block_report(report()).await.unwrap();
    assert_eq!(h.controller.step(), WizardStep::WorkHistory);

    let saved = h.drafts.load_current().unwrap();
    assert_eq!(saved.step, 2);
    assert_eq!(saved.block_report.as_ref().unwrap().driver_name, "Ana Silva");
    assert!(saved.block_report.as_ref().unwrap().id.starts_with("block-"));

    h.controller.submit_work_history(history()).await.unwrap();
    assert_eq!(h.controller.step(), WizardStep::Review);
    assert_eq!(
        h.host.last_notice(),
        Some(Notice::Success("Cálculo concluído com sucesso!".to_string()))
    );

    let profits = h.controller.state().ceased_profits.unwrap();
    assert_eq!(profits.total_blocked_days, 10);
    assert!((profits.avg_daily_earnings - 150.0).abs() < f64::EPSILON);
    assert!((profits.total_lost_earnings - 1500.0).abs() < 1e-9);
    assert!((profits.total_expenses_during_block - 1750.0 / 30.0 * 10.0).abs() < 1e-9);
    assert!((profits.net_lost_profits - (1500.0 - 1750.0 / 30.0 * 10.0)).abs() < 1e-9);
    assert_eq!(h.drafts.load_current().unwrap().step, 3);

    h.controller.confirm_review().unwrap();
    assert_eq!(h.controller.step(), WizardStep::DefenseGeneration);
    assert_eq!(h.drafts.load_current().unwrap().step, 4);

    h.controller.generate_defense(BlockType::FalseAccusation, "Tenho provas").await.unwrap();
    assert_eq!(h.controller.step(), WizardStep::DefenseEditing);

    let state = h.controller.state();
    let defense = state.legal_defense.unwrap();
    assert_eq!(defense.block_type, "falseAccusation");
    assert_eq!(state.defense_text.as_deref(), Some(defense.structured_document.as_str()));

    let saved = h.drafts.load_current().unwrap();
    assert_eq!(saved.step, 5);
    assert_eq!(saved.legal_defense.as_deref(), Some(defense.structured_document.as_str()));

    // Export is a side effect only
    let dir = tempfile::TempDir::new().unwrap();
    let doc = h.controller.export(&HtmlExporter::new(dir.path())).unwrap();
    assert_eq!(doc.title, "Defesa_Administrativa_Ana_Silva_2024-01-11");
    assert!(doc.location.unwrap().exists());
    assert_eq!(h.controller.step(), WizardStep::DefenseEditing);
}

#[tokio::test]
async fn test_backend_received_each_submission_once() {
    let h = harness();
    advance_to_editing(&h).await;

    assert_eq!(h.backend.block_reports().len(), 1);
    assert_eq!(h.backend.work_histories().len(), 1);
    assert_eq!(h.backend.calculations().len(), 1);
    assert_eq!(h.backend.defenses().len(), 1);
}

// ============================================================================
// Validation and failures
// ============================================================================

#[tokio::test]
async fn test_invalid_report_stays_on_step_one() {
    let h = harness();
    let mut bad = report();
    bad.cpf = "123.456.789-00".to_string();
    bad.phone = "1234".to_string();

    let err = h.controller.submit_block_report(bad).await.unwrap_err();
    let fields = err.field_errors().unwrap();
    assert!(fields.has("cpf"));
    assert!(fields.has("phone"));

    assert_eq!(h.controller.step(), WizardStep::BlockReport);
    assert!(h.backend.block_reports().is_empty());
    assert!(h.drafts.list().is_empty());
}

#[tokio::test]
async fn test_zero_daily_earnings_is_rejected() {
    let h = harness();
    h.controller.submit_block_report(report()).await.unwrap();

    let err = h
        .controller
        .submit_work_history(WorkHistory { daily_avg_earnings: 0.0, ..history() })
        .await
        .unwrap_err();
    assert!(err.field_errors().unwrap().has("dailyAvgEarnings"));
    assert_eq!(h.controller.step(), WizardStep::WorkHistory);
}

struct FailingBackend;

#[async_trait]
impl Backend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn submit_block_report(&self, _report: &BlockReport) -> BackendResult<()> {
        Err(BackendError::Transport("connection refused".to_string()))
    }

    async fn submit_work_history(&self, _history: &WorkHistory) -> BackendResult<()> {
        Err(BackendError::Transport("connection refused".to_string()))
    }

    async fn compute_ceased_profits(
        &self,
        _days: u32,
        _earnings: f64,
        _expenses: f64,
    ) -> BackendResult<CeasedProfits> {
        Err(BackendError::Transport("connection refused".to_string()))
    }

    async fn generate_legal_defense(&self, _kind: &str, _context: &str) -> BackendResult<LegalDefense> {
        Err(BackendError::Transport("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_remote_failure_keeps_step_and_notifies() {
    let drafts = Arc::new(DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::new()))));
    let host = Arc::new(RecordingHost::new(true));
    let controller = WizardController::new(Arc::new(FailingBackend), drafts.clone(), host.clone());

    let err = controller.submit_block_report(report()).await.unwrap_err();
    assert!(matches!(err, WizardError::Remote(BackendError::Transport(_))));
    assert_eq!(controller.step(), WizardStep::BlockReport);
    assert!(controller.state().block_report.is_none());
    assert!(!controller.is_pending());
    assert!(host.last_notice().unwrap().is_error());
    assert!(drafts.list().is_empty());
}

#[tokio::test]
async fn test_auto_save_failure_does_not_block_progress() {
    let storage = Arc::new(MemoryStorage::with_quota(16));
    let h = harness_with(DraftManager::new(DraftStore::new(storage)), true);

    h.controller.submit_block_report(report()).await.unwrap();

    assert_eq!(h.controller.step(), WizardStep::WorkHistory);
    assert_eq!(
        h.host.last_notice(),
        Some(Notice::Error("Erro ao salvar. Tente novamente.".to_string()))
    );
}

// ============================================================================
// Transitions
// ============================================================================

#[tokio::test]
async fn test_out_of_order_actions_are_rejected() {
    let h = harness();

    let err = h.controller.submit_work_history(history()).await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { from: WizardStep::BlockReport, .. }));
    assert!(h.controller.confirm_review().is_err());
    assert!(h.controller.edit_step(WizardStep::BlockReport).is_err());
    assert!(h.controller.generate_defense(BlockType::SystemError, "").await.is_err());
    assert!(h.controller.update_defense_text("x").is_err());
    assert!(h.controller.export(&HtmlExporter::new("unused")).is_err());
    assert_eq!(h.controller.step(), WizardStep::BlockReport);
}

#[tokio::test]
async fn test_review_can_go_back_without_losing_data() {
    let h = harness();
    advance_to_review(&h).await;

    h.controller.edit_step(WizardStep::BlockReport).unwrap();
    let state = h.controller.state();
    assert_eq!(state.step, WizardStep::BlockReport);
    assert!(state.work_history.is_some());
    assert!(state.ceased_profits.is_some());

    // Resubmitting moves forward again, to step 2
    let mut edited = report();
    edited.block_date = "2024-01-06".to_string();
    h.controller.submit_block_report(edited).await.unwrap();
    assert_eq!(h.controller.step(), WizardStep::WorkHistory);

    h.controller.submit_work_history(history()).await.unwrap();
    assert_eq!(h.controller.state().ceased_profits.unwrap().total_blocked_days, 5);

    assert!(h.controller.edit_step(WizardStep::Review).is_err());
}

#[tokio::test]
async fn test_defense_editing() {
    let h = harness();
    advance_to_editing(&h).await;
    assert!(!h.controller.defense_has_changes());

    h.controller.update_defense_text("Texto revisado").unwrap();
    assert!(h.controller.defense_has_changes());
    assert_eq!(h.drafts.load_current().unwrap().legal_defense.as_deref(), Some("Texto revisado"));

    h.controller.reset_defense_text().unwrap();
    assert!(!h.controller.defense_has_changes());
}

#[tokio::test]
async fn test_new_report_archives_and_resets() {
    let h = harness();
    advance_to_review(&h).await;

    h.controller.new_report().unwrap();

    let state = h.controller.state();
    assert_eq!(state.step, WizardStep::BlockReport);
    assert!(state.block_report.is_none());
    assert!(state.work_history.is_none());
    assert!(state.ceased_profits.is_none());
    assert!(state.legal_defense.is_none());

    let drafts = h.drafts.list();
    assert_eq!(drafts.len(), 1);
    assert!(!drafts[0].id.is_current());
    assert_eq!(drafts[0].step, 3);
    assert!(h.drafts.load_current().is_none());
}

// ============================================================================
// Resume
// ============================================================================

fn stored_review_draft() -> DraftManager {
    let drafts = DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::new())));
    let mut draft = Draft::new(DraftId::Current, Utc::now())
        .with_block_report(report())
        .with_work_history(history())
        .with_step(3);
    draft.ceased_profits = Some(CeasedProfits { total_blocked_days: 10, ..Default::default() });
    drafts.save(&draft).unwrap();
    drafts
}

#[tokio::test]
async fn test_resume_restores_confirmed_draft() {
    let h = harness_with(stored_review_draft(), true);

    assert!(h.controller.resume());
    assert_eq!(h.controller.step(), WizardStep::Review);
    assert_eq!(h.controller.state().work_history, Some(history()));
    assert!(h.host.prompts()[0].contains("3/5 completo"));

    h.controller.confirm_review().unwrap();
    assert_eq!(h.controller.step(), WizardStep::DefenseGeneration);
}

#[tokio::test]
async fn test_resume_declined_starts_fresh() {
    let h = harness_with(stored_review_draft(), false);

    assert!(!h.controller.resume());
    assert_eq!(h.controller.step(), WizardStep::BlockReport);
    assert_eq!(h.host.prompts().len(), 1);
    // The stored draft is untouched
    assert_eq!(h.drafts.load_current().unwrap().step, 3);
}

#[tokio::test]
async fn test_resume_without_draft_does_not_prompt() {
    let h = harness();
    assert!(!h.controller.resume());
    assert!(h.host.prompts().is_empty());
}

// ============================================================================
// Pending guard
// ============================================================================

/// Backend whose block report submission waits until released.
struct GatedBackend {
    inner: LocalBackend,
    gate: Notify,
}

#[async_trait]
impl Backend for GatedBackend {
    fn name(&self) -> &str {
        "gated"
    }

    async fn submit_block_report(&self, report: &BlockReport) -> BackendResult<()> {
        self.gate.notified().await;
        self.inner.submit_block_report(report).await
    }

    async fn submit_work_history(&self, history: &WorkHistory) -> BackendResult<()> {
        self.inner.submit_work_history(history).await
    }

    async fn compute_ceased_profits(&self, d: u32, e: f64, m: f64) -> BackendResult<CeasedProfits> {
        self.inner.compute_ceased_profits(d, e, m).await
    }

    async fn generate_legal_defense(&self, t: &str, c: &str) -> BackendResult<LegalDefense> {
        self.inner.generate_legal_defense(t, c).await
    }
}

#[tokio::test]
async fn test_double_submission_is_rejected_while_pending() {
    let backend = Arc::new(GatedBackend { inner: LocalBackend::new(), gate: Notify::new() });
    let drafts = Arc::new(DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::new()))));
    let controller = Arc::new(WizardController::new(
        backend.clone(),
        drafts,
        Arc::new(RecordingHost::new(true)),
    ));

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit_block_report(report()).await }
    });

    while !controller.is_pending() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let err = controller.submit_block_report(report()).await.unwrap_err();
    assert!(matches!(err, WizardError::SubmissionPending(WizardStep::BlockReport)));

    backend.gate.notify_one();
    first.await.unwrap().unwrap();

    assert!(!controller.is_pending());
    assert_eq!(controller.step(), WizardStep::WorkHistory);
    assert_eq!(backend.inner.block_reports().len(), 1);
}

#[tokio::test]
async fn test_cancelled_submission_clears_pending() {
    let backend = Arc::new(GatedBackend { inner: LocalBackend::new(), gate: Notify::new() });
    let drafts = Arc::new(DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::new()))));
    let controller = WizardController::new(backend, drafts, Arc::new(RecordingHost::new(true)));

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), controller.submit_block_report(report())).await;
    assert!(timed_out.is_err());

    assert!(!controller.is_pending());
    assert_eq!(controller.step(), WizardStep::BlockReport);
}
