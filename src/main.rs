use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use beanjournal::{EntryFilter, Journal, JournalConfig, Pagination};
use beanjournal_core::{Date, DirectiveKind};

#[derive(Parser)]
#[command(name = "beanjournal", version, about = "Query and edit a plain-text ledger journal")]
struct Cli {
    /// Path to the primary journal file.
    #[arg(long, env = "BEANJOURNAL_FILE")]
    file: PathBuf,

    /// Disable pre-write backup copies.
    #[arg(long)]
    no_backups: bool,

    /// Backups retained per file, oldest deleted first (0 = unlimited).
    #[arg(long, default_value_t = 10)]
    max_backups: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the ledger and report any parse errors.
    Validate,

    /// Print summary statistics as JSON.
    Stats,

    /// List entries as JSON.
    List {
        /// Entry kinds to include (repeatable); defaults to
        /// transaction, balance, pad, note.
        #[arg(long)]
        kind: Vec<String>,

        /// Case-insensitive account substring.
        #[arg(long)]
        account: Option<String>,

        /// Case-insensitive payee substring (transactions only).
        #[arg(long)]
        payee: Option<String>,

        /// Exact tag, case-insensitive (transactions only).
        #[arg(long)]
        tag: Option<String>,

        /// Free-text search.
        #[arg(long)]
        search: Option<String>,

        /// Inclusive start date (YYYY-MM-DD).
        #[arg(long)]
        from: Option<String>,

        /// Inclusive end date (YYYY-MM-DD).
        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a commodity declaration as JSON.
    ShowCommodity { symbol: String },

    /// Set metadata on a commodity declaration, declaring it if needed.
    UpdateCommodity {
        symbol: String,

        /// KEY=VALUE metadata pairs.
        #[arg(required = true)]
        pairs: Vec<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = JournalConfig {
        create_backups: !cli.no_backups,
        max_backups: cli.max_backups,
    };
    let journal = Journal::open(&cli.file, config)
        .with_context(|| format!("opening {}", cli.file.display()))?;

    match cli.command {
        Command::Validate => {
            let snapshot = journal.snapshot();
            println!(
                "{}: {} entries, {} errors",
                journal.path().display(),
                snapshot.directives.len(),
                snapshot.errors.len()
            );
            for error in &snapshot.errors {
                eprintln!("{}", error);
            }
            if !snapshot.errors.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&journal.statistics())?);
        }
        Command::List {
            kind,
            account,
            payee,
            tag,
            search,
            from,
            to,
            offset,
            limit,
        } => {
            let kinds = if kind.is_empty() {
                None
            } else {
                Some(
                    kind.iter()
                        .map(|k| {
                            DirectiveKind::from_str(k)
                                .map_err(|_| anyhow!("unknown entry kind '{}'", k))
                        })
                        .collect::<anyhow::Result<Vec<_>>>()?,
                )
            };
            let filter = EntryFilter::builder()
                .date_from(
                    from.as_deref()
                        .map(Date::from_str)
                        .transpose()
                        .context("invalid --from date")?,
                )
                .date_to(
                    to.as_deref()
                        .map(Date::from_str)
                        .transpose()
                        .context("invalid --to date")?,
                )
                .kinds(kinds)
                .account(account)
                .payee(payee)
                .tag(tag)
                .search(search)
                .build();
            let page = journal.entries(&filter, Pagination { offset, limit });
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::ShowCommodity { symbol } => match journal.commodity(&symbol) {
            Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
            None => bail!("no declaration for commodity '{}'", symbol),
        },
        Command::UpdateCommodity { symbol, pairs } => {
            let mut updates = BTreeMap::new();
            for pair in &pairs {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", pair))?;
                updates.insert(key.to_string(), value.to_string());
            }
            let receipt = journal.update_commodity_metadata(&symbol, &updates)?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
