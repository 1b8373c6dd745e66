//! Printable HTML rendering of a finished case.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::format::{format_active_time, format_brl, format_date_long};
use super::{CaseRecord, DocumentExporter, ExportError, ExportedDocument};

const STYLE: &str = r"
  @media print { @page { margin: 20mm; size: A4; } body { padding: 0; } .page-break { page-break-before: always; } }
  body { font-family: 'Times New Roman', Times, serif; line-height: 1.5; color: #000; max-width: 210mm; margin: 0 auto; padding: 20px; }
  h1 { font-size: 20px; text-align: center; text-transform: uppercase; border-bottom: 2px solid #000; padding-bottom: 10px; }
  h2 { font-size: 16px; margin-top: 25px; text-transform: uppercase; }
  h3 { font-size: 14px; margin-top: 15px; }
  .meta { font-size: 11px; color: #666; text-align: center; }
  .section { margin-bottom: 25px; page-break-inside: avoid; }
  .info-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 15px; }
  .info-label { font-size: 11px; color: #666; text-transform: uppercase; }
  .info-value { font-size: 13px; font-weight: 600; }
  .calculation-table { width: 100%; border-collapse: collapse; margin: 15px 0; }
  .calculation-table td { padding: 10px; border-bottom: 1px solid #ddd; }
  .calculation-table td:last-child { text-align: right; font-weight: 600; }
  .calculation-table tr.total td { border-top: 2px solid #000; border-bottom: 2px solid #000; font-size: 16px; font-weight: bold; }
  .legal-text { text-align: justify; white-space: pre-wrap; font-size: 12px; line-height: 1.6; }
  .signature-line { border-top: 1px solid #000; margin-top: 60px; padding-top: 5px; text-align: center; font-size: 12px; }
  .footer { margin-top: 30px; padding-top: 15px; border-top: 1px solid #ddd; font-size: 10px; color: #999; text-align: center; }
";

/// Writes each case as a standalone HTML file that prints itself on open.
#[derive(Debug, Clone)]
pub struct HtmlExporter {
    output_dir: PathBuf,
}

impl HtmlExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl DocumentExporter for HtmlExporter {
    fn export(
        &self,
        record: &CaseRecord,
        generated_at: DateTime<Utc>,
    ) -> Result<ExportedDocument, ExportError> {
        let title = document_title(record, generated_at);
        let html = render_html(record, generated_at);

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.html", title));
        fs::write(&path, html)?;

        tracing::info!(path = %path.display(), "Exported defense document");
        Ok(ExportedDocument { title, location: Some(path) })
    }
}

/// File-friendly title: `Defesa_Administrativa_<Driver_Name>_<YYYY-MM-DD>`.
pub fn document_title(record: &CaseRecord, generated_at: DateTime<Utc>) -> String {
    let name: String = record
        .block_report
        .driver_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    format!("Defesa_Administrativa_{}_{}", name, generated_at.format("%Y-%m-%d"))
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn info_item(label: &str, value: &str) -> String {
    format!(
        "<div class=\"info-item\"><div class=\"info-label\">{}</div><div class=\"info-value\">{}</div></div>\n",
        label,
        escape_html(value)
    )
}

fn table_row(label: &str, value: &str, class: Option<&str>) -> String {
    let class = class.map(|c| format!(" class=\"{}\"", c)).unwrap_or_default();
    format!("<tr{}><td>{}</td><td>{}</td></tr>\n", class, label, escape_html(value))
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("<p><strong>{}.</strong> {}</p>\n", idx + 1, escape_html(item)))
        .collect()
}

/// Render the full printable document.
pub fn render_html(record: &CaseRecord, generated_at: DateTime<Utc>) -> String {
    let report = &record.block_report;
    let history = &record.work_history;
    let profits = &record.ceased_profits;
    let defense = &record.legal_defense;

    let date_str = format_date_long(generated_at.date_naive());
    let block_date_str =
        report.parsed_block_date().map_or_else(|| report.block_date.clone(), format_date_long);

    let mut body = String::new();

    body.push_str("<div class=\"header\">\n<h1>Defesa Administrativa - Bloqueio Indevido</h1>\n");
    body.push_str(&format!("<div class=\"meta\">Documento gerado em {}</div>\n</div>\n", date_str));

    body.push_str("<div class=\"section\">\n<h2>1. Dados do Motorista e Bloqueio</h2>\n<div class=\"info-grid\">\n");
    body.push_str(&info_item("Nome Completo", &report.driver_name));
    body.push_str(&info_item("CPF", &report.cpf));
    body.push_str(&info_item("Telefone", &report.phone));
    body.push_str(&info_item("Plataforma", &report.platform));
    body.push_str(&info_item("Data do Bloqueio", &block_date_str));
    body.push_str(&info_item("Motivo Alegado", &report.block_reason));
    body.push_str("</div>\n");
    if !report.additional_context.trim().is_empty() {
        body.push_str(&info_item("Contexto Adicional", &report.additional_context));
    }
    body.push_str("</div>\n");

    body.push_str("<div class=\"section\">\n<h2>2. Histórico de Trabalho</h2>\n<div class=\"info-grid\">\n");
    body.push_str(&info_item("Tempo de Atividade", &format_active_time(history.active_months)));
    body.push_str(&info_item("Ganho Médio Diário", &format_brl(history.daily_avg_earnings)));
    body.push_str(&info_item("Ganho Médio Semanal", &format_brl(history.weekly_avg_earnings)));
    body.push_str(&info_item("Despesas Mensais Totais", &format_brl(history.total_monthly_expenses())));
    body.push_str("</div>\n<h3>Detalhamento das Despesas Mensais</h3>\n<table class=\"calculation-table\">\n");
    body.push_str(&table_row("Financiamento do Veículo", &format_brl(history.monthly_vehicle_financing), None));
    body.push_str(&table_row("Seguro", &format_brl(history.monthly_insurance), None));
    body.push_str(&table_row("Combustível", &format_brl(history.monthly_fuel), None));
    body.push_str(&table_row("Manutenção", &format_brl(history.monthly_maintenance), None));
    body.push_str("</table>\n</div>\n");

    body.push_str("<div class=\"section page-break\">\n<h2>3. Cálculo de Lucros Cessantes</h2>\n<table class=\"calculation-table\">\n");
    body.push_str(&table_row("Dias Bloqueado", &format!("{} dias", profits.total_blocked_days), None));
    body.push_str(&table_row("Ganho Médio Diário", &format_brl(profits.avg_daily_earnings), None));
    body.push_str(&table_row("Total de Ganhos Perdidos (Bruto)", &format_brl(profits.total_lost_earnings), None));
    body.push_str(&table_row(
        "Despesas Durante o Período de Bloqueio",
        &format_brl(profits.total_expenses_during_block),
        None,
    ));
    body.push_str(&table_row("Lucros Cessantes Líquidos", &format_brl(profits.net_lost_profits), Some("total")));
    body.push_str("</table>\n<p class=\"meta\"><strong>Fórmula aplicada:</strong> (Ganho médio diário - Despesas diárias) × Dias bloqueado</p>\n</div>\n");

    body.push_str("<div class=\"section page-break\">\n<h2>4. Fundamentação Jurídica</h2>\n");
    body.push_str(&format!("<h3>Tipo de Bloqueio: {}</h3>\n", escape_html(&defense.block_type)));
    body.push_str(&format!("<div class=\"legal-text\">{}</div>\n", escape_html(&record.defense_text)));
    body.push_str("<h3>Leis Aplicáveis</h3>\n");
    body.push_str(&numbered(&defense.applicable_laws));
    body.push_str("<h3>Próximos Passos Recomendados</h3>\n");
    body.push_str(&numbered(&defense.suggested_next_steps));
    body.push_str("</div>\n");

    body.push_str("<div class=\"section signature-section page-break\">\n<h2>5. Assinatura</h2>\n");
    for (value, caption) in
        [(report.driver_name.as_str(), "Nome Completo"), (report.cpf.as_str(), "CPF"), (date_str.as_str(), "Data")]
    {
        body.push_str(&format!(
            "<div class=\"signature-line\">{}</div>\n<p class=\"meta\">{}</p>\n",
            escape_html(value),
            caption
        ));
    }
    body.push_str("</div>\n");

    body.push_str("<div class=\"footer\">Documento gerado pelo Assistente Jurídico para Motoristas de Aplicativo<br>\n");
    body.push_str("Este documento foi gerado automaticamente e deve ser revisado por um advogado antes do envio oficial.</div>\n");

    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}<script>window.onload = function() {{ window.print(); }};</script>\n</body>\n</html>\n",
        escape_html(&document_title(record, generated_at)),
        STYLE,
        body
    )
}
