//! Client-side validation of wizard forms.
//!
//! Every check here runs before a remote call is made. CPF and phone have
//! structure of their own and get dedicated validators.

use std::collections::BTreeMap;
use std::fmt;

use crate::drafts::{BlockReport, WorkHistory};

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Whether `field` has an error.
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Keep only ASCII digits.
pub fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Validate a CPF (Brazilian national ID), formatted or bare.
///
/// Requires 11 digits, rejects sequences of one repeated digit, and checks
/// both mod-11 check digits.
pub fn validate_cpf(cpf: &str) -> bool {
    let nums: Vec<u32> = digits(cpf).chars().filter_map(|c| c.to_digit(10)).collect();

    if nums.len() != 11 {
        return false;
    }
    if nums.iter().all(|&d| d == nums[0]) {
        return false;
    }

    check_digit(&nums[..9]) == nums[9] && check_digit(&nums[..10]) == nums[10]
}

/// Mod-11 check digit over `prefix`, weighted from `len + 1` down to 2.
fn check_digit(prefix: &[u32]) -> u32 {
    let top = prefix.len() as u32 + 1;
    let sum: u32 = prefix.iter().enumerate().map(|(i, d)| d * (top - i as u32)).sum();
    let digit = 11 - (sum % 11);
    if digit >= 10 {
        0
    } else {
        digit
    }
}

/// Validate a Brazilian phone number: 10 or 11 digits once formatting is stripped.
pub fn validate_phone(phone: &str) -> bool {
    matches!(digits(phone).len(), 10 | 11)
}

/// Validate step 1 input.
pub fn validate_block_report(report: &BlockReport) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if report.platform.trim().is_empty() {
        errors.add("platform", "Selecione a plataforma");
    }
    if report.block_reason.trim().is_empty() {
        errors.add("blockReason", "Informe o motivo do bloqueio");
    }
    if report.driver_name.trim().is_empty() {
        errors.add("driverName", "Informe seu nome");
    }

    if report.cpf.trim().is_empty() {
        errors.add("cpf", "Informe seu CPF");
    } else if !validate_cpf(&report.cpf) {
        errors.add("cpf", "Por favor, insira um CPF válido");
    }

    if report.phone.trim().is_empty() {
        errors.add("phone", "Informe seu telefone");
    } else if !validate_phone(&report.phone) {
        errors.add("phone", "Por favor, insira um telefone válido");
    }

    if report.block_date.trim().is_empty() {
        errors.add("blockDate", "Informe a data do bloqueio");
    } else if report.parsed_block_date().is_none() {
        errors.add("blockDate", "Data do bloqueio inválida (use AAAA-MM-DD)");
    }

    errors.into_result()
}

/// Validate step 2 input.
pub fn validate_work_history(history: &WorkHistory) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if !history.daily_avg_earnings.is_finite() || history.daily_avg_earnings <= 0.0 {
        errors.add("dailyAvgEarnings", "Informe seu ganho médio diário");
    }

    let amounts = [
        ("weeklyAvgEarnings", history.weekly_avg_earnings),
        ("monthlyVehicleFinancing", history.monthly_vehicle_financing),
        ("monthlyInsurance", history.monthly_insurance),
        ("monthlyFuel", history.monthly_fuel),
        ("monthlyMaintenance", history.monthly_maintenance),
    ];
    for (field, value) in amounts {
        if !value.is_finite() || value < 0.0 {
            errors.add(field, "O valor não pode ser negativo");
        }
    }

    errors.into_result()
}
