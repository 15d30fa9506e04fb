//! FAIRLINE — NBA spread model with pre-bet data validation.
//!
//! Entry point. Loads configuration, initialises structured logging, and
//! dispatches to the requested audit mode. Exit status is 0 when the run
//! produced no FAIL-severity checks and 1 otherwise, so the interactive
//! predictor can be chained after a clean run (it is advisory only and is
//! never hard-blocked from running).

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use fairline::collect::{refresh_feeds, CommandCollector};
use fairline::config::{AppConfig, BankrollConfig};
use fairline::ledger;
use fairline::postmortem::{self, HistoricalAuditor, LedgerVerdict};
use fairline::preflight::{self, AuditMode, Auditor};

const BANNER: &str = r#"
  _____ _    ___ ____  _     ___ _   _ _____
 |  ___/ \  |_ _|  _ \| |   |_ _| \ | | ____|
 | |_ / _ \  | || |_) | |    | ||  \| |  _|
 |  _/ ___ \ | ||  _ <| |___ | || |\  | |___
 |_|/_/   \_\___|_| \_\_____|___|_| \_|_____|

  Fair lines, audited feeds, honest stakes
  v0.1.0
"#;

#[derive(Parser)]
#[command(name = "fairline", about = "NBA spread model with pre-bet data validation")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Full audit: every section, stamps the ledger on pass (default).
    Full,
    /// Data freshness and structure only.
    Quick,
    /// Full audit, then re-fetch failing feeds and re-validate.
    Fix,
    /// Migrate all historical wager ledgers to the canonical schema.
    Backfill,
    /// Re-validate recorded wagers against the known formulas.
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let cfg = AppConfig::load(&cli.config)?;

    init_logging();
    println!("{BANNER}");

    let now = Local::now().naive_local();
    let today = now.date();
    info!(
        data_dir = %cfg.data.dir.display(),
        stale_hours = cfg.data.stale_hours,
        "FAIRLINE starting"
    );

    let exit_code = match cli.command.unwrap_or(Command::Full) {
        Command::Full => run_audit(&cfg, AuditMode::Full, today, now)?,
        Command::Quick => run_audit(&cfg, AuditMode::Quick, today, now)?,
        Command::Fix => run_fix(&cfg, today, now).await?,
        Command::Backfill => run_backfill(&cfg, today)?,
        Command::History => run_history(&cfg)?,
    };

    std::process::exit(exit_code);
}

/// Run one audit, print the report, persist the status slot, and stamp the
/// current ledger on a pass.
fn run_audit(
    cfg: &AppConfig,
    mode: AuditMode,
    today: chrono::NaiveDate,
    now: chrono::NaiveDateTime,
) -> Result<i32> {
    let report = Auditor::new(cfg, today, now).run(mode);
    print!("{}", preflight::render(&report));

    let status = preflight::complete_audit(&report, &cfg.data.dir, today)?;
    if status.passed {
        info!(summary = %status.summary, "Audit status recorded");
    } else {
        warn!(summary = %status.summary, "Audit failed - fix feeds before betting");
    }
    Ok(if report.passed() { 0 } else { 1 })
}

/// Fix mode: audit, delegate re-fetches for the failing feeds to the
/// configured collectors, then re-validate. Collector failures are
/// tolerated; the first report is never lost.
async fn run_fix(
    cfg: &AppConfig,
    today: chrono::NaiveDate,
    now: chrono::NaiveDateTime,
) -> Result<i32> {
    let report = Auditor::new(cfg, today, now).run(AuditMode::Full);
    print!("{}", preflight::render(&report));

    let failing = preflight::failing_feeds(&report);
    if failing.is_empty() {
        println!("\n  No failing feeds - nothing to fix.");
        preflight::complete_audit(&report, &cfg.data.dir, today)?;
        return Ok(if report.passed() { 0 } else { 1 });
    }

    println!("\n  🔧 Fix mode: re-fetching {} failing feed(s)...", failing.len());
    let collector = CommandCollector::new(cfg.collectors.clone());
    let refreshed = refresh_feeds(&collector, &failing).await;
    println!(
        "  Refreshed {}/{} feed(s). Re-validating...",
        refreshed.len(),
        failing.len()
    );

    let now = Local::now().naive_local();
    let report = Auditor::new(cfg, today, now).run(AuditMode::Full);
    print!("{}", preflight::render(&report));
    preflight::complete_audit(&report, &cfg.data.dir, today)?;
    Ok(if report.passed() { 0 } else { 1 })
}

fn run_backfill(cfg: &AppConfig, today: chrono::NaiveDate) -> Result<i32> {
    println!("  LEDGER BACKFILL - migrating historical wager ledgers\n");
    let summary = ledger::backfill_ledgers(&cfg.data.dir, today)?;
    println!(
        "  Done: {} file(s) updated ({} row(s) noted), {} already handled.",
        summary.files_updated, summary.rows_noted, summary.files_skipped
    );
    Ok(0)
}

fn run_history(cfg: &AppConfig) -> Result<i32> {
    let edge_cap = BankrollConfig::edge_cap_or_default(&cfg.data.dir);
    let auditor = HistoricalAuditor::new(edge_cap);
    let report = auditor.audit_all(&cfg.data.dir)?;
    print!("{}", postmortem::render(&report));
    Ok(match report.verdict() {
        LedgerVerdict::Error => 1,
        _ => 0,
    })
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fairline=info"));

    if std::env::var("FAIRLINE_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
