use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::application::{LedgerStore, LoadReport, NewTransaction, SaveOutcome, parse_amount};
use crate::domain::{EntryId, EntryKind, category_breakdown, format_cents, format_currency};
use crate::storage::{BlobStore, MemoryStore, SqliteStore};

/// Tally - Personal Ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Track income, expenses and monthly dues from the command line")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "tally.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an income or expense
    Add {
        /// What the money was for
        description: String,

        /// Amount (e.g., "50.00" or "50")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Transaction type: income, expense
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Category (e.g., "groceries", "salary")
        #[arg(short, long)]
        category: Option<String>,

        /// Date of the transaction (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a transaction
    Remove {
        /// Transaction ID
        id: EntryId,
    },

    /// List transactions in the order they were recorded
    List,

    /// Monthly dues management commands
    #[command(subcommand)]
    Due(DueCommands),

    /// Show or set the monthly income
    Income {
        /// New monthly income (omit to show the current one)
        #[arg(allow_hyphen_values = true)]
        amount: Option<String>,
    },

    /// Show balance, totals and what is left after dues
    Summary,

    /// Break totals down by category
    Report {
        /// Transaction type: income, expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, dues, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (default: csv, json for full)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Delete every transaction and due and reset the monthly income
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum DueCommands {
    /// Add a monthly due
    Add {
        /// Due name (e.g., "Rent")
        name: String,

        /// Monthly amount
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Delete a due
    Remove {
        /// Due ID
        id: EntryId,
    },

    /// List all dues
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.verbose);

        match SqliteStore::open(&self.database).await {
            Ok(store) => {
                let (mut ledger, report) = LedgerStore::load(store).await;
                print_load_report(&report);
                let result = run_command(&mut ledger, self.command).await;
                ledger.store().close().await;
                result
            }
            Err(e) => {
                // Keep going for this session only
                warn!(database = %self.database, error = %e, "Database unavailable");
                eprintln!(
                    "Warning: could not open {}, changes will not be kept",
                    self.database
                );
                let (mut ledger, _) = LedgerStore::load(MemoryStore::unavailable()).await;
                run_command(&mut ledger, self.command).await
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so exports on stdout stay clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_command<S: BlobStore>(ledger: &mut LedgerStore<S>, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            description,
            amount,
            kind,
            category,
            date,
        } => {
            let input = NewTransaction::parse(
                &description,
                &amount,
                &kind,
                category.as_deref().unwrap_or(""),
                date.as_deref().unwrap_or(""),
            )?;
            let tx = ledger.add_transaction(input).await?;
            println!(
                "Recorded {} {} ({})",
                tx.kind,
                format_currency(tx.amount_cents),
                tx.description
            );
            println!("ID: {}", tx.id);
            warn_if_unsaved(ledger.last_save());
        }

        Commands::Remove { id } => match ledger.remove_transaction(id).await {
            Some(tx) => {
                println!("Removed transaction {} ({})", tx.id, tx.description);
                warn_if_unsaved(ledger.last_save());
            }
            None => println!("No transaction with ID {}", id),
        },

        Commands::List => run_list_command(ledger),

        Commands::Due(due_cmd) => run_due_command(ledger, due_cmd).await?,

        Commands::Income { amount } => match amount {
            Some(raw) => {
                let amount = parse_amount(&raw)?;
                let cents = ledger.set_monthly_income(amount).await?;
                println!("Monthly income set to {}", format_currency(cents));
                warn_if_unsaved(ledger.last_save());
            }
            None => println!("Monthly income: {}", format_currency(ledger.monthly_income())),
        },

        Commands::Summary => run_summary_command(ledger),

        Commands::Report { kind } => {
            let kind = EntryKind::parse(&kind)
                .with_context(|| format!("Invalid type '{}'. Use income or expense", kind))?;
            run_report_command(ledger, kind);
        }

        Commands::Export {
            export_type,
            output,
            format,
        } => run_export_command(ledger, &export_type, output.as_deref(), format.as_deref())?,

        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset without --yes");
            }
            let outcome = ledger.clear().await;
            println!("Ledger reset.");
            warn_if_unsaved(&outcome);
        }
    }
    Ok(())
}

fn print_load_report(report: &LoadReport) {
    if report.is_clean() {
        return;
    }
    eprintln!("Warning: some stored data could not be read and was reset:");
    for (key, status) in [
        ("transactions", report.transactions),
        ("monthly income", report.monthly_income),
        ("dues", report.dues),
    ] {
        if status.fell_back() {
            eprintln!("  {}: {:?}", key, status);
        }
    }
    if report.dropped_records > 0 {
        eprintln!("  {} invalid record(s) discarded", report.dropped_records);
    }
}

fn warn_if_unsaved(outcome: &SaveOutcome) {
    for failure in &outcome.failures {
        eprintln!(
            "Warning: could not save {}: {}",
            failure.key, failure.reason
        );
    }
}

fn run_list_command<S: BlobStore>(ledger: &LedgerStore<S>) {
    let transactions = ledger.transactions();
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<15} {:<12} {:<8} {:<15} {:>12} DESCRIPTION",
        "ID", "DATE", "TYPE", "CATEGORY", "AMOUNT"
    );
    println!("{}", "-".repeat(80));

    for tx in transactions {
        let date = tx.date.map(|d| d.to_string()).unwrap_or_default();
        println!(
            "{:<15} {:<12} {:<8} {:<15} {:>12} {}",
            tx.id,
            date,
            tx.kind,
            truncate(tx.category.as_deref().unwrap_or(""), 15),
            format_currency(tx.signed_cents()),
            truncate(&tx.description, 30)
        );
    }
}

async fn run_due_command<S: BlobStore>(
    ledger: &mut LedgerStore<S>,
    cmd: DueCommands,
) -> Result<()> {
    match cmd {
        DueCommands::Add { name, amount } => {
            let amount = parse_amount(&amount)?;
            let due = ledger.add_due(&name, amount).await?;
            println!(
                "Added due '{}': {} per month",
                due.name,
                format_currency(due.amount_cents)
            );
            println!("ID: {}", due.id);
            warn_if_unsaved(ledger.last_save());
        }

        DueCommands::Remove { id } => match ledger.remove_due(id).await {
            Some(due) => {
                println!("Removed due '{}'", due.name);
                warn_if_unsaved(ledger.last_save());
            }
            None => println!("No due with ID {}", id),
        },

        DueCommands::List => {
            let dues = ledger.dues();
            if dues.is_empty() {
                println!("No dues found.");
            } else {
                println!("{:<15} {:<25} {:>12}", "ID", "NAME", "AMOUNT");
                println!("{}", "-".repeat(54));
                for due in dues {
                    println!(
                        "{:<15} {:<25} {:>12}",
                        due.id,
                        truncate(&due.name, 25),
                        format_currency(due.amount_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_summary_command<S: BlobStore>(ledger: &LedgerStore<S>) {
    let summary = ledger.summary();

    println!("{:<22} {:>12}", "Monthly income:", format_currency(summary.monthly_income));
    println!("{:<22} {:>12}", "Total income:", format_currency(summary.total_income));
    println!("{:<22} {:>12}", "Total expenses:", format_currency(summary.total_expenses));
    println!("{:<22} {:>12}", "Total dues:", format_currency(summary.total_dues));
    println!(
        "{:<22} {:>12}",
        "Remaining after dues:",
        format_currency(summary.remaining_after_dues)
    );
    println!("{}", "-".repeat(35));
    println!("{:<22} {:>12}", "Balance:", format_currency(summary.balance));
}

fn run_report_command<S: BlobStore>(ledger: &LedgerStore<S>, kind: EntryKind) {
    let breakdown = category_breakdown(ledger.state(), kind);
    if breakdown.is_empty() {
        println!("No {} transactions found.", kind);
        return;
    }

    println!(
        "{:<20} {:>12} {:>6} {:>12} {:>7}",
        "CATEGORY", "TOTAL", "COUNT", "AVERAGE", "SHARE"
    );
    println!("{}", "-".repeat(61));
    for row in &breakdown {
        println!(
            "{:<20} {:>12} {:>6} {:>12} {:>6.1}%",
            truncate(&row.category, 20),
            format_cents(row.total),
            row.count,
            format_cents(row.average),
            row.percentage
        );
    }
}

fn run_export_command<S: BlobStore>(
    ledger: &LedgerStore<S>,
    export_type: &str,
    output: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(ledger.state());

    let json = match (export_type, format) {
        ("full", None | Some("json")) => true,
        ("full", Some(other)) => {
            anyhow::bail!("Full export is only available as json, not '{}'", other)
        }
        (_, None | Some("csv")) => false,
        (_, Some("json")) => true,
        (_, Some(other)) => anyhow::bail!("Invalid format '{}'. Valid formats: csv, json", other),
    };

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = if json {
                exporter.export_transactions_json(writer)?
            } else {
                exporter.export_transactions_csv(writer)?
            };
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "dues" => {
            let count = if json {
                exporter.export_dues_json(writer)?
            } else {
                exporter.export_dues_csv(writer)?
            };
            if output.is_some() {
                eprintln!("Exported {} dues", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} transactions, {} dues",
                    snapshot.transactions.len(),
                    snapshot.dues.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: transactions, dues, full",
                export_type
            );
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
