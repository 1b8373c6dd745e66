//! In-process backend.
//!
//! Keeps submitted records in memory, computes ceased profits locally and
//! renders legal defense text from fixed templates.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Backend, BackendError, BackendResult};
use crate::drafts::{BlockReport, BlockType, CeasedProfits, LegalDefense, WorkHistory};

/// Days a monthly expense is spread over.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Compute ceased profits for a block period.
///
/// Net loss is `(daily earnings - monthly expenses / 30) * days`, floored at zero.
pub fn compute_ceased_profits(
    blocked_days: u32,
    avg_daily_earnings: f64,
    monthly_expenses: f64,
) -> CeasedProfits {
    let days = f64::from(blocked_days);
    let total_lost_earnings = avg_daily_earnings * days;
    let total_expenses_during_block = monthly_expenses / DAYS_PER_MONTH * days;

    CeasedProfits {
        total_lost_earnings,
        total_expenses_during_block,
        net_lost_profits: (total_lost_earnings - total_expenses_during_block).max(0.0),
        avg_daily_earnings,
        total_blocked_days: blocked_days,
    }
}

/// Backend that runs entirely in process.
#[derive(Debug, Default)]
pub struct LocalBackend {
    block_reports: Mutex<Vec<BlockReport>>,
    work_histories: Mutex<Vec<WorkHistory>>,
    calculations: Mutex<Vec<CeasedProfits>>,
    defenses: Mutex<Vec<LegalDefense>>,
}

impl LocalBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block reports received so far.
    pub fn block_reports(&self) -> Vec<BlockReport> {
        self.block_reports.lock().clone()
    }

    /// Work histories received so far.
    pub fn work_histories(&self) -> Vec<WorkHistory> {
        self.work_histories.lock().clone()
    }

    /// Ceased-profits calculations performed so far.
    pub fn calculations(&self) -> Vec<CeasedProfits> {
        self.calculations.lock().clone()
    }

    /// Defenses generated so far.
    pub fn defenses(&self) -> Vec<LegalDefense> {
        self.defenses.lock().clone()
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn submit_block_report(&self, report: &BlockReport) -> BackendResult<()> {
        if report.driver_name.trim().is_empty() || report.platform.trim().is_empty() {
            return Err(BackendError::Rejected("block report is incomplete".to_string()));
        }

        self.block_reports.lock().push(report.clone());
        tracing::debug!(report_id = %report.id, "Stored block report");
        Ok(())
    }

    async fn submit_work_history(&self, history: &WorkHistory) -> BackendResult<()> {
        self.work_histories.lock().push(history.clone());
        Ok(())
    }

    async fn compute_ceased_profits(
        &self,
        blocked_days: u32,
        avg_daily_earnings: f64,
        monthly_expenses: f64,
    ) -> BackendResult<CeasedProfits> {
        if !avg_daily_earnings.is_finite() || avg_daily_earnings < 0.0 {
            return Err(BackendError::Rejected("average daily earnings must be non-negative".to_string()));
        }
        if !monthly_expenses.is_finite() || monthly_expenses < 0.0 {
            return Err(BackendError::Rejected("monthly expenses must be non-negative".to_string()));
        }

        let result = compute_ceased_profits(blocked_days, avg_daily_earnings, monthly_expenses);
        self.calculations.lock().push(result.clone());
        Ok(result)
    }

    async fn generate_legal_defense(
        &self,
        block_type: &str,
        context: &str,
    ) -> BackendResult<LegalDefense> {
        let kind: BlockType = block_type.parse().map_err(BackendError::Rejected)?;
        let defense = render_defense(kind, context);

        self.defenses.lock().push(defense.clone());
        tracing::debug!(block_type = %kind, "Generated legal defense");
        Ok(defense)
    }
}

const COMMON_LAWS: [&str; 4] = [
    "Constituição Federal, art. 5º, LIV e LV - devido processo legal, contraditório e ampla defesa",
    "Código Civil (Lei 10.406/2002), arts. 186, 402 e 927 - reparação de danos e lucros cessantes",
    "Código de Defesa do Consumidor (Lei 8.078/1990), arts. 6º, III e 51, IV - informação adequada e vedação a cláusulas abusivas",
    "Marco Civil da Internet (Lei 12.965/2014), art. 7º - direitos do usuário de aplicações de internet",
];

const COMMON_ARGUMENTS: [&str; 3] = [
    "O bloqueio foi aplicado sem notificação prévia e sem oportunidade de defesa, em afronta ao contraditório.",
    "A plataforma não apresentou provas concretas que sustentem o motivo alegado.",
    "O motorista sofreu prejuízo econômico direto durante o período de bloqueio, configurando lucros cessantes.",
];

const NEXT_STEPS: [&str; 4] = [
    "Enviar esta defesa pelo canal oficial de suporte da plataforma e guardar o protocolo.",
    "Reunir provas: prints do aplicativo, histórico de corridas, avaliações e comprovantes de ganhos.",
    "Registrar reclamação no Procon ou em consumidor.gov.br caso não haja resposta em 10 dias.",
    "Procurar um advogado ou a Defensoria Pública para avaliar ação judicial de reparação.",
];

fn specific_argument(kind: BlockType) -> &'static str {
    match kind {
        BlockType::ArbitraryDismissal => {
            "O desligamento ocorreu de forma unilateral e sem justificativa, caracterizando rescisão arbitrária."
        }
        BlockType::FalseAccusation => {
            "A acusação que motivou o bloqueio é infundada e o motorista nega os fatos imputados."
        }
        BlockType::SystemError => {
            "O bloqueio decorre de falha técnica ou decisão automatizada, cuja revisão humana é direito do titular."
        }
        BlockType::Discrimination => {
            "O tratamento dispensado ao motorista é discriminatório e viola o princípio da igualdade."
        }
        BlockType::Retaliation => {
            "O bloqueio ocorreu em retaliação a reclamações ou manifestações legítimas do motorista."
        }
    }
}

fn specific_law(kind: BlockType) -> Option<&'static str> {
    match kind {
        BlockType::SystemError => Some(
            "Lei Geral de Proteção de Dados (Lei 13.709/2018), art. 20 - revisão de decisões automatizadas",
        ),
        BlockType::Discrimination => {
            Some("Constituição Federal, art. 3º, IV e art. 5º, caput - vedação à discriminação")
        }
        BlockType::FalseAccusation => {
            Some("Código Civil (Lei 10.406/2002), art. 953 - reparação por ofensa à honra")
        }
        BlockType::ArbitraryDismissal | BlockType::Retaliation => None,
    }
}

fn render_defense(kind: BlockType, context: &str) -> LegalDefense {
    let mut arguments: Vec<String> = vec![specific_argument(kind).to_string()];
    arguments.extend(COMMON_ARGUMENTS.iter().map(|s| (*s).to_string()));

    let mut applicable_laws: Vec<String> = COMMON_LAWS.iter().map(|s| (*s).to_string()).collect();
    if let Some(law) = specific_law(kind) {
        applicable_laws.push(law.to_string());
    }

    let suggested_next_steps: Vec<String> = NEXT_STEPS.iter().map(|s| (*s).to_string()).collect();

    let mut doc = String::new();
    doc.push_str("DEFESA ADMINISTRATIVA CONTRA BLOQUEIO DE CONTA\n\n");
    doc.push_str(&format!("Tipo de bloqueio: {}\n\n", kind.label()));
    doc.push_str("I - DOS FATOS\n\n");
    doc.push_str(context.trim());
    doc.push_str("\n\nII - DO DIREITO\n\n");
    for (idx, argument) in arguments.iter().enumerate() {
        doc.push_str(&format!("{}. {}\n", idx + 1, argument));
    }
    doc.push_str("\nFundamentação legal:\n");
    for law in &applicable_laws {
        doc.push_str(&format!("- {}\n", law));
    }
    doc.push_str("\nIII - DOS PEDIDOS\n\n");
    doc.push_str("a) a imediata reativação da conta do motorista;\n");
    doc.push_str("b) a apresentação das provas que fundamentaram o bloqueio;\n");
    doc.push_str("c) o ressarcimento dos lucros cessantes apurados durante o período de bloqueio.\n\n");
    doc.push_str("Nestes termos, pede deferimento.");

    LegalDefense {
        block_type: kind.as_str().to_string(),
        structured_document: doc,
        arguments,
        applicable_laws,
        suggested_next_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_ceased_profits() {
        let result = compute_ceased_profits(10, 150.0, 1750.0);

        assert_eq!(result.total_blocked_days, 10);
        assert!((result.total_lost_earnings - 1500.0).abs() < 1e-9);
        assert!((result.total_expenses_during_block - 583.333_333_333).abs() < 1e-6);
        assert!((result.net_lost_profits - 916.666_666_667).abs() < 1e-6);
        assert!((result.avg_daily_earnings - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_net_loss_floors_at_zero() {
        let result = compute_ceased_profits(5, 10.0, 3000.0);
        assert!(result.net_lost_profits.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_rejects_negative_inputs() {
        let backend = LocalBackend::new();
        let err = backend.compute_ceased_profits(3, -1.0, 0.0).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
        assert!(backend.calculations().is_empty());
    }

    #[tokio::test]
    async fn test_generate_defense_per_block_type() {
        let backend = LocalBackend::new();
        let defense =
            backend.generate_legal_defense("systemError", "Plataforma: Uber").await.unwrap();

        assert_eq!(defense.block_type, "systemError");
        assert!(defense.structured_document.contains("Plataforma: Uber"));
        assert!(defense.applicable_laws.iter().any(|l| l.contains("13.709")));
        assert_eq!(defense.arguments.len(), 4);
        assert_eq!(defense.suggested_next_steps.len(), 4);
        assert_eq!(backend.defenses().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_block_type_is_rejected() {
        let backend = LocalBackend::new();
        let err = backend.generate_legal_defense("banana", "").await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_incomplete_block_report_is_rejected() {
        let backend = LocalBackend::new();
        let err = backend.submit_block_report(&BlockReport::default()).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
        assert!(backend.block_reports().is_empty());
    }
}
