//! pt-BR formatting helpers for documents and form input.

use chrono::{Datelike, NaiveDate};

use crate::wizard::digits;

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Format an amount in reais, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, frac)
}

/// Parse a currency amount typed by the user.
///
/// Accepts `1.234,56`, `R$ 1.234,56`, `1234.56` and `150`. When a comma is
/// present it is the decimal separator and dots are thousands separators.
/// Unparsable input yields `0.0`.
pub fn parse_currency_input(input: &str) -> f64 {
    let cleaned: String =
        input.chars().filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-')).collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let normalized =
        if cleaned.contains(',') { cleaned.replace('.', "").replace(',', ".") } else { cleaned };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Progressive CPF mask: `000.000.000-00`.
pub fn format_cpf(value: &str) -> String {
    let n = digits(value);
    let n = &n[..n.len().min(11)];

    match n.len() {
        0..=3 => n.to_string(),
        4..=6 => format!("{}.{}", &n[..3], &n[3..]),
        7..=9 => format!("{}.{}.{}", &n[..3], &n[3..6], &n[6..]),
        _ => format!("{}.{}.{}-{}", &n[..3], &n[3..6], &n[6..9], &n[9..]),
    }
}

/// Progressive phone mask: `(00) 00000-0000`.
pub fn format_phone(value: &str) -> String {
    let n = digits(value);
    let n = &n[..n.len().min(11)];

    match n.len() {
        0..=2 => n.to_string(),
        3..=7 => format!("({}) {}", &n[..2], &n[2..]),
        _ => format!("({}) {}-{}", &n[..2], &n[2..7], &n[7..]),
    }
}

/// Describe a number of active months, e.g. `2 anos e 3 meses`.
pub fn format_active_time(months: u32) -> String {
    let years = months / 12;
    let rest = months % 12;

    let month_part = format!("{} {}", rest, if rest == 1 { "mês" } else { "meses" });
    let year_part = format!("{} {}", years, if years == 1 { "ano" } else { "anos" });

    match (years, rest) {
        (0, _) => month_part,
        (_, 0) => year_part,
        _ => format!("{} e {}", year_part, month_part),
    }
}

/// Long date, e.g. `01 de janeiro de 2024`.
pub fn format_date_long(date: NaiveDate) -> String {
    format!("{:02} de {} de {}", date.day(), MONTHS[date.month0() as usize], date.year())
}
