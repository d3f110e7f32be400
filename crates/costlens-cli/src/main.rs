//! Costlens CLI - per-method cost estimates for Java code

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use costlens_core::{
    host, CostLedger, CostlensConfig, DocumentId, Event, InferAnalyzer, NoticeLevel, RecordId,
    Session,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "costlens")]
#[command(about = "Costlens - Per-method cost estimates for Java code")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "costlens.json")]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the editor protocol on stdin and stdout
    Serve,
    /// Analyze one Java file and print its method costs
    Analyze {
        /// Java source file
        file: PathBuf,
        /// Print the overview panel HTML instead of a table
        #[arg(long)]
        html: bool,
    },
    /// Show the cost history of a method (`<document>:<method>`)
    History {
        /// Method id
        method_id: String,
    },
    /// Manage the names exempt from significance checks
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
    /// Remove cached costs and analyzer output
    Clean,
}

#[derive(Subcommand)]
enum WhitelistAction {
    /// Exempt a method name
    Add { name: String },
    /// Remove an exemption
    Remove { name: String },
    /// List exempt names
    List,
}

/// Logs go to stderr; stdout carries the protocol and command output.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let config = CostlensConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Analyze { file, html } => analyze(config, &file, html).await,
        Commands::History { method_id } => history(&config, &method_id),
        Commands::Whitelist { action } => whitelist(&config, action),
        Commands::Clean => clean(config),
    }
}

fn open_session(config: CostlensConfig) -> anyhow::Result<Session> {
    let analyzer = Arc::new(InferAnalyzer::new(config.analyzer.binary.clone()));
    let session = Session::new(config, analyzer).context("Failed to open the cost ledger")?;
    Ok(session)
}

fn open_ledger(config: &CostlensConfig) -> anyhow::Result<CostLedger> {
    CostLedger::new(&config.ledger.db_path, config.ledger.history_limit)
        .with_context(|| format!("Failed to open ledger {}", config.ledger.db_path.display()))
}

async fn serve(config: CostlensConfig) -> anyhow::Result<()> {
    info!("Starting costlens host");
    let session = open_session(config)?;
    host::serve_stdio(session).await?;
    Ok(())
}

async fn analyze(config: CostlensConfig, file: &Path, html: bool) -> anyhow::Result<()> {
    let path = std::fs::canonicalize(file)
        .with_context(|| format!("Cannot resolve {}", file.display()))?;
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let hide_constructors = config.display.hide_constructors;

    let mut session = open_session(config)?;
    session.document_activated(DocumentId::from(path.as_path()), text);

    let outcome = session.enable_for_file()?;
    print_notices(&outcome.events);
    if let Some(pending) = outcome.analysis {
        let analyzer = session.analyzer();
        let job = pending.job().clone();
        let result = tokio::task::spawn_blocking(move || analyzer.run(&job)).await?;
        let outcome = session.complete_analysis(pending, result);
        print_notices(&outcome.events);
    }

    if !session.mode().is_enabled() {
        session.shutdown()?;
        bail!("Cost analysis of {} failed", path.display());
    }

    if html {
        for event in session.open_overview(None)?.events {
            if let Event::Panel { html, .. } = event {
                println!("{}", html);
            }
        }
    } else {
        for record in session.store().current() {
            if hide_constructors && record.is_initializer() {
                continue;
            }
            println!(
                "{:>5}  {:<24} {} -- {}",
                record.location.lnum,
                record.method_name,
                record.exec_cost.polynomial,
                record.exec_cost.big_o
            );
        }
    }

    session.shutdown()?;
    Ok(())
}

fn history(config: &CostlensConfig, method_id: &str) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let id = RecordId::from_key(method_id);

    let Some(entries) = ledger.history(&id) else {
        bail!("No cost history for {}", id);
    };
    for (i, record) in entries.iter().enumerate() {
        let marker = if i == 0 { " (most recent)" } else { "" };
        println!(
            "{}{}\n  execution: {} -- {}\n  allocation: {} -- {}",
            record.timestamp.as_deref().unwrap_or("unknown time"),
            marker,
            record.exec_cost.polynomial,
            record.exec_cost.big_o,
            record.alloc_cost.polynomial,
            record.alloc_cost.big_o
        );
    }
    Ok(())
}

fn whitelist(config: &CostlensConfig, action: WhitelistAction) -> anyhow::Result<()> {
    let mut ledger = open_ledger(config)?;

    match action {
        WhitelistAction::Add { name } => {
            if ledger.add_to_whitelist(&name)? {
                println!("Added '{}'", name.trim());
            } else {
                println!("'{}' is already whitelisted", name.trim());
            }
        }
        WhitelistAction::Remove { name } => {
            if ledger.remove_from_whitelist(&name)? {
                println!("Removed '{}'", name.trim());
            } else {
                println!("'{}' is not whitelisted", name.trim());
            }
        }
        WhitelistAction::List => {
            for name in ledger.whitelist().iter() {
                println!("{}", name);
            }
        }
    }

    ledger.flush()?;
    Ok(())
}

fn clean(config: CostlensConfig) -> anyhow::Result<()> {
    let mut session = open_session(config)?;
    let outcome = session.clean_output()?;
    print_notices(&outcome.events);
    session.shutdown()?;
    Ok(())
}

fn print_notices(events: &[Event]) {
    for event in events {
        if let Event::Notice { level, message } = event {
            let label = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            eprintln!("{}: {}", label, message);
        }
    }
}
