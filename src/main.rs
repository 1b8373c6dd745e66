//! Defense Hub - guided defense builder for blocked gig-economy drivers.
//!
//! Walks a driver through reporting a block, computing ceased profits and
//! producing a printable legal defense, auto-saving drafts along the way.

#![allow(clippy::single_match_else)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use defensehub::drafts::{time_ago, BlockReport, BlockType, DraftId, SaveIndicator, WorkHistory};
use defensehub::export::format::{
    format_active_time, format_brl, format_cpf, format_phone, parse_currency_input,
};
use defensehub::export::CaseRecord;
use defensehub::wizard::{digits, validate_cpf, validate_phone, Notice, WizardState};
use defensehub::{Config, DocumentExporter, WizardController, WizardError, WizardHost, WizardStep};

/// Build a legal defense after a platform account block
#[derive(Parser)]
#[command(name = "defensehub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding saved drafts
    #[arg(long, global = true, env = "DEFENSEHUB_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume the defense wizard (default)
    Wizard {
        /// Archive any saved draft and start a new report
        #[arg(short, long)]
        new: bool,
    },

    /// Manage saved drafts
    Drafts {
        /// Drafts operation
        #[command(subcommand)]
        operation: DraftsOperation,
    },

    /// Export a finished draft as a printable HTML document
    Export {
        /// Draft id (defaults to the in-progress draft)
        #[arg(default_value = "current")]
        id: String,

        /// Output directory (overrides the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a CPF or phone number
    Validate {
        /// Validation operation
        #[command(subcommand)]
        operation: ValidateOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum DraftsOperation {
    /// List saved drafts, newest first
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show one draft as JSON
    Show {
        /// Draft id
        id: String,
    },

    /// Delete one draft
    Delete {
        /// Draft id
        id: String,
    },

    /// Delete every draft
    Clear {
        /// Don't ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ValidateOperation {
    /// Check a CPF's check digits
    Cpf {
        /// CPF, formatted or bare digits
        value: String,
    },

    /// Check a phone number's length
    Phone {
        /// Phone number, formatted or bare digits
        value: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let mut config = Config::load()?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.to_string_lossy().into_owned());
    }

    match cli.command {
        None => cmd_wizard(&config, false)?,
        Some(Commands::Wizard { new }) => cmd_wizard(&config, new)?,
        Some(Commands::Drafts { operation }) => cmd_drafts(&config, operation)?,
        Some(Commands::Export { id, output }) => cmd_export(&config, &id, output)?,
        Some(Commands::Validate { operation }) => cmd_validate(operation)?,
        Some(Commands::Config { path }) => cmd_config(&config, path)?,
        Some(Commands::Completions { shell }) => cmd_completions(shell),
    }

    Ok(())
}

/// Host that talks to the terminal.
struct TerminalHost;

impl WizardHost for TerminalHost {
    fn confirm(&self, prompt: &str) -> bool {
        match read_line(&format!("{} [s/N] ", prompt)) {
            Ok(Some(answer)) => matches!(answer.to_lowercase().as_str(), "s" | "sim" | "y" | "yes"),
            _ => false,
        }
    }

    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(msg) => println!("✓ {}", msg),
            Notice::Info(msg) => println!("{}", msg),
            Notice::Error(msg) => eprintln!("✗ {}", msg),
        }
    }
}

/// Prompt and read one trimmed line. `None` at end of input.
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Prompt for a field, keeping `current` when the answer is empty.
fn ask(label: &str, current: &str) -> Result<Option<String>> {
    let prompt =
        if current.is_empty() { format!("{}: ", label) } else { format!("{} [{}]: ", label, current) };

    Ok(read_line(&prompt)?.map(|answer| if answer.is_empty() { current.to_string() } else { answer }))
}

/// Apply a display mask only when the input fits it, so overlong numbers
/// reach validation untouched.
fn mask_document(value: &str, mask: fn(&str) -> String) -> String {
    if digits(value).len() <= 11 {
        mask(value)
    } else {
        value.trim().to_string()
    }
}

fn input_closed() {
    eprintln!("Entrada encerrada. Os dados deste passo não foram enviados.");
}

fn ask_amount(label: &str, current: f64) -> Result<Option<f64>> {
    let shown = if current > 0.0 { format_brl(current) } else { String::new() };
    Ok(ask(label, &shown)?.map(|answer| parse_currency_input(&answer)))
}

/// Run the interactive wizard.
fn cmd_wizard(config: &Config, fresh: bool) -> Result<()> {
    let drafts = Arc::new(config.build_drafts());
    let events = drafts.subscribe();
    let mut indicator = SaveIndicator::new();

    let controller =
        WizardController::new(config.build_backend()?, Arc::clone(&drafts), Arc::new(TerminalHost));
    let exporter = config.build_exporter();
    let rt = tokio::runtime::Runtime::new()?;

    if fresh {
        controller.new_report()?;
    } else {
        controller.resume();
    }

    loop {
        let step = controller.step();
        println!("\n== {} - {} ==", step.progress_text(), step.label());

        let outcome = match step {
            WizardStep::BlockReport => {
                let Some(report) = prompt_block_report(&controller.state())? else { break };
                rt.block_on(controller.submit_block_report(report))
            }
            WizardStep::WorkHistory => {
                let Some(history) = prompt_work_history(&controller.state())? else { break };
                rt.block_on(controller.submit_work_history(history))
            }
            WizardStep::Review => {
                print_review(&controller.state());
                let Some(choice) =
                    read_line("[c] confirmar, [1] editar bloqueio, [2] editar histórico, [q] sair: ")?
                else {
                    break;
                };
                match choice.as_str() {
                    "1" => controller.edit_step(WizardStep::BlockReport),
                    "2" => controller.edit_step(WizardStep::WorkHistory),
                    "q" => break,
                    _ => controller.confirm_review(),
                }
            }
            WizardStep::DefenseGeneration => {
                let Some((block_type, details)) = prompt_block_type()? else { break };
                rt.block_on(controller.generate_defense(block_type, &details))
            }
            WizardStep::DefenseEditing => {
                let state = controller.state();
                println!("{}", state.defense_text.as_deref().unwrap_or_default());
                if controller.defense_has_changes() {
                    println!("(texto editado)");
                }

                let Some(choice) = read_line(
                    "[e] exportar, [t] editar texto, [r] restaurar original, [n] novo relatório, [q] sair: ",
                )?
                else {
                    break;
                };
                match choice.as_str() {
                    "e" => controller.export(&exporter).map(|doc| {
                        if let Some(path) = doc.location {
                            println!("{}", path.display());
                        }
                    }),
                    "t" => match read_block()? {
                        Some(text) => controller.update_defense_text(text),
                        None => break,
                    },
                    "r" => controller.reset_defense_text(),
                    "n" => controller.new_report(),
                    "q" => break,
                    _ => Ok(()),
                }
            }
        };

        match outcome {
            Ok(()) => {}
            Err(WizardError::Validation(errors)) => {
                for (field, message) in errors.iter() {
                    eprintln!("  {}: {}", field, message);
                }
            }
            // Already reported through the host; the step is unchanged
            Err(WizardError::Remote(_) | WizardError::Export(_)) => {}
            Err(e) => return Err(e.into()),
        }

        indicator.drain(&events);
        if let Some(label) = indicator.label(Utc::now()) {
            tracing::debug!("{}", label);
        }
    }

    indicator.drain(&events);
    if let Some(label) = indicator.label(Utc::now()) {
        println!("{}", label);
    }
    Ok(())
}

fn prompt_block_report(state: &WizardState) -> Result<Option<BlockReport>> {
    let mut report = state.block_report.clone().unwrap_or_default();

    macro_rules! field {
        ($label:expr, $field:ident) => {
            match ask($label, &report.$field)? {
                Some(value) => report.$field = value,
                None => {
                    input_closed();
                    return Ok(None);
                }
            }
        };
    }

    field!("Plataforma", platform);
    field!("Motivo do bloqueio", block_reason);
    field!("Nome completo", driver_name);
    field!("CPF", cpf);
    report.cpf = mask_document(&report.cpf, format_cpf);
    field!("Telefone", phone);
    report.phone = mask_document(&report.phone, format_phone);
    field!("Data do bloqueio (AAAA-MM-DD)", block_date);
    field!("Contexto adicional", additional_context);

    Ok(Some(report))
}

fn prompt_work_history(state: &WizardState) -> Result<Option<WorkHistory>> {
    let mut history = state.work_history.clone().unwrap_or_default();

    let months = if history.active_months > 0 { history.active_months.to_string() } else { String::new() };
    let Some(months) = ask("Meses de atividade", &months)? else {
        input_closed();
        return Ok(None);
    };
    history.active_months = months.parse().unwrap_or(0);

    macro_rules! amount {
        ($label:expr, $field:ident) => {
            match ask_amount($label, history.$field)? {
                Some(value) => history.$field = value,
                None => {
                    input_closed();
                    return Ok(None);
                }
            }
        };
    }

    amount!("Ganho médio diário", daily_avg_earnings);
    amount!("Ganho médio semanal", weekly_avg_earnings);
    amount!("Financiamento do veículo (mensal)", monthly_vehicle_financing);
    amount!("Seguro (mensal)", monthly_insurance);
    amount!("Combustível (mensal)", monthly_fuel);
    amount!("Manutenção (mensal)", monthly_maintenance);

    Ok(Some(history))
}

fn prompt_block_type() -> Result<Option<(BlockType, String)>> {
    for (i, block_type) in BlockType::ALL.iter().enumerate() {
        println!("  [{}] {}", i + 1, block_type.label());
    }

    let Some(choice) = read_line("Tipo de bloqueio: ")? else { return Ok(None) };
    let block_type = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| BlockType::ALL.get(i).copied())
        .or_else(|| choice.parse().ok())
        .unwrap_or(BlockType::ALL[0]);

    let Some(details) = read_line("Detalhes adicionais (opcional): ")? else {
        input_closed();
        return Ok(None);
    };
    Ok(Some((block_type, details)))
}

/// Read lines until a lone `.` or end of input.
fn read_block() -> Result<Option<String>> {
    println!("Digite o novo texto. Termine com uma linha contendo apenas '.'");

    let mut lines = Vec::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim() == "." {
            return Ok(Some(lines.join("\n")));
        }
        lines.push(line);
    }

    Ok(if lines.is_empty() { None } else { Some(lines.join("\n")) })
}

fn print_review(state: &WizardState) {
    if let Some(report) = &state.block_report {
        println!("Motorista: {} ({})", report.driver_name, report.cpf);
        println!("Plataforma: {} - {}", report.platform, report.block_reason);
        println!("Data do bloqueio: {}", report.block_date);
    }
    if let Some(history) = &state.work_history {
        println!("Tempo de atividade: {}", format_active_time(history.active_months));
        println!("Ganho médio diário: {}", format_brl(history.daily_avg_earnings));
        println!("Despesas mensais: {}", format_brl(history.total_monthly_expenses()));
    }
    if let Some(profits) = &state.ceased_profits {
        println!("Dias bloqueado: {}", profits.total_blocked_days);
        println!("Ganhos perdidos: {}", format_brl(profits.total_lost_earnings));
        println!("Despesas no período: {}", format_brl(profits.total_expenses_during_block));
        println!("Lucros cessantes: {}", format_brl(profits.net_lost_profits));
    }
}

/// Handle draft commands.
fn cmd_drafts(config: &Config, operation: DraftsOperation) -> Result<()> {
    let drafts = config.build_drafts();

    match operation {
        DraftsOperation::List { format } => {
            let list = drafts.store().try_read_all()?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&list)?),
                _ => {
                    let now = Utc::now();
                    for draft in &list {
                        println!(
                            "{}  {}  {}  {}",
                            draft.id,
                            draft.title(),
                            draft.progress_text(),
                            time_ago(now - draft.timestamp)
                        );
                    }
                    println!("\nTotal: {} drafts", list.len());
                }
            }
        }
        DraftsOperation::Show { id } => {
            let id = DraftId::from(id);
            let draft =
                drafts.load(&id).ok_or_else(|| anyhow::anyhow!("Draft '{}' not found", id))?;
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        DraftsOperation::Delete { id } => {
            drafts.delete(&DraftId::from(id))?;
        }
        DraftsOperation::Clear { yes } => {
            if !yes && !TerminalHost.confirm("Apagar todos os rascunhos?") {
                println!("Cancelled");
                return Ok(());
            }
            drafts.clear_all()?;
        }
    }

    Ok(())
}

/// Export a saved draft.
fn cmd_export(config: &Config, id: &str, output: Option<PathBuf>) -> Result<()> {
    let drafts = config.build_drafts();
    let id = DraftId::from(id);
    let draft = drafts.load(&id).ok_or_else(|| anyhow::anyhow!("Draft '{}' not found", id))?;

    let record = CaseRecord::from_draft(&draft).ok_or_else(|| {
        anyhow::anyhow!("Draft '{}' has no generated defense yet ({})", id, draft.progress_text())
    })?;

    let mut exporter = config.build_exporter();
    if let Some(dir) = output {
        exporter = defensehub::HtmlExporter::new(dir);
    }

    let document = exporter.export(&record, Utc::now())?;
    match document.location {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", document.title),
    }

    Ok(())
}

/// Handle validation commands.
fn cmd_validate(operation: ValidateOperation) -> Result<()> {
    let (kind, formatted, valid) = match operation {
        ValidateOperation::Cpf { value } => {
            ("CPF", mask_document(&value, format_cpf), validate_cpf(&value))
        }
        ValidateOperation::Phone { value } => {
            ("Phone", mask_document(&value, format_phone), validate_phone(&value))
        }
    };

    if valid {
        println!("{} {} is valid", kind, formatted);
        Ok(())
    } else {
        anyhow::bail!("{} {} is invalid", kind, formatted)
    }
}

/// Show configuration.
fn cmd_config(config: &Config, show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_path() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let toml = toml::to_string_pretty(config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "defensehub", &mut io::stdout());
}
