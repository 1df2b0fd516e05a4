use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{ExpenseService, GroupSession};
use crate::config::Config;
use crate::domain::{
    BalanceStatus, Expense, ExpenseFilter, ExpenseId, NewExpense, SortKey, format_cents,
    format_units, parse_cents, total_cents,
};
use crate::io::{ExportFormat, Exporter};
use crate::logging::init_tracing;

/// Groupsplit - shared expense tracker
#[derive(Parser)]
#[command(name = "groupsplit")]
#[command(about = "Track shared expenses and split them between group members by percentage")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "groupsplit.db")]
    pub database: String,

    /// Config file path (JSON)
    #[arg(short, long, default_value = "groupsplit.json")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database and seed the share mapping from config
    Init,

    #[command(flatten)]
    Session(SessionCommands),
}

/// Commands that run against an initialized database.
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Record an expense
    Add {
        /// Amount spent (e.g., "50.00" or "50")
        amount: String,

        /// What the money was spent on
        #[arg(short, long)]
        description: String,

        /// Member who paid
        #[arg(short, long)]
        paid_by: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses
    List {
        /// Only show expenses paid by this member
        #[arg(short, long)]
        paid_by: Option<String>,

        /// Sort order: date, amount, recent
        #[arg(short, long, default_value = "date")]
        sort: String,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
    },

    /// Show what each member owes or gets back
    Balances,

    /// Report expenses whose payer is no longer a member
    Check,

    /// Share mapping commands
    #[command(subcommand)]
    Shares(ShareCommands),

    /// Export selected expenses
    Export {
        /// Output format: csv, message, link
        format: String,

        /// Expense ID to include (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,

        /// Include every expense in the current view
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// With --all, only include expenses paid by this member
        #[arg(short, long)]
        paid_by: Option<String>,

        /// Sort order: date, amount, recent
        #[arg(short, long, default_value = "date")]
        sort: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ShareCommands {
    /// Show the active share mapping
    Show,

    /// Edit the share mapping. All changes are applied together or not at all.
    Set {
        /// Member shares as NAME=FRACTION or NAME=PERCENT% (e.g., "Alice=0.3", "Bob=40%")
        assignments: Vec<String>,

        /// Remove a member (repeatable)
        #[arg(long)]
        remove: Vec<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);
        let config = Config::load(&self.config)?;

        match self.command {
            Commands::Init => run_init_command(&self.database, &config).await,
            Commands::Session(command) => {
                run_session_command(command, &self.database, &config).await
            }
        }
    }
}

async fn run_init_command(database: &str, config: &Config) -> Result<()> {
    let service = ExpenseService::init(database, config.members.clone()).await?;
    let shares = service.shares().await?;
    println!("Database initialized: {}", database);
    print_shares(shares.members());
    Ok(())
}

async fn run_session_command(
    command: SessionCommands,
    database: &str,
    config: &Config,
) -> Result<()> {
    let service = ExpenseService::connect(database, config.members.clone()).await?;
    let mut session = GroupSession::load(service).await?;
    let exporter = Exporter::new(&config.currency_symbol);

    match command {
        SessionCommands::Add {
            amount,
            description,
            paid_by,
            date,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let expense_date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now().date_naive(),
            };

            let expense = session
                .add_expense(NewExpense::new(description, amount_cents, paid_by, expense_date))
                .await?;
            println!(
                "Recorded expense: {}{} paid by {} ({})",
                config.currency_symbol,
                format_cents(expense.amount_cents),
                expense.paid_by,
                expense.id
            );
            warn_if_stale(&session);
        }

        SessionCommands::List { paid_by, sort } => {
            apply_view(&mut session, paid_by, &sort)?;
            print_expenses(&session.view(), &config.currency_symbol);
        }

        SessionCommands::Delete { id } => {
            let id = parse_id(&id)?;
            let expense = session.service().get_expense(id).await?;
            session.delete_expense(id).await?;
            println!(
                "Deleted expense: {} {}{} ({})",
                expense.description,
                config.currency_symbol,
                format_cents(expense.amount_cents),
                expense.id
            );
            warn_if_stale(&session);
        }

        SessionCommands::Balances => {
            run_balances_command(&session, &config.currency_symbol);
        }

        SessionCommands::Check => {
            let orphans = session.service().orphaned_payers().await?;
            if orphans.is_empty() {
                println!("All expenses are paid by current members.");
            } else {
                println!("Expenses paid by people outside the share mapping:");
                for orphan in orphans {
                    println!("  - {} ({} expense(s))", orphan.name, orphan.expense_count);
                }
            }
        }

        SessionCommands::Shares(ShareCommands::Show) => {
            print_shares(session.shares().members());
        }

        SessionCommands::Shares(ShareCommands::Set {
            assignments,
            remove,
        }) => {
            run_shares_set_command(&mut session, &assignments, &remove).await?;
        }

        SessionCommands::Export {
            format,
            ids,
            all,
            paid_by,
            sort,
            output,
        } => {
            let format = ExportFormat::from_str(&format).ok_or_else(|| {
                anyhow::anyhow!("Invalid export format '{}'. Use csv, message, or link", format)
            })?;
            apply_view(&mut session, paid_by, &sort)?;

            let selection = if all {
                session.view()
            } else {
                let ids = ids
                    .iter()
                    .map(|id| parse_id(id))
                    .collect::<Result<Vec<ExpenseId>>>()?;
                session.select(&ids)?
            };

            let rendered = exporter.render(format, &selection)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "Exported {} expense(s) as {} to {}",
                        selection.len(),
                        format.as_str(),
                        path.display()
                    );
                }
                None => println!("{}", rendered),
            }
        }
    }

    Ok(())
}

fn apply_view(session: &mut GroupSession, paid_by: Option<String>, sort: &str) -> Result<()> {
    let sort = SortKey::from_str(sort)
        .ok_or_else(|| anyhow::anyhow!("Invalid sort '{}'. Use date, amount, or recent", sort))?;
    session.set_sort(sort);
    session.set_filter(
        paid_by
            .as_deref()
            .map(ExpenseFilter::from_selector)
            .unwrap_or_default(),
    );
    Ok(())
}

fn warn_if_stale(session: &GroupSession) {
    if session.is_stale() {
        eprintln!("Warning: the change was saved but the expense list could not be reloaded.");
    }
}

fn run_balances_command(session: &GroupSession, currency: &str) {
    let settlement = session.settlement();

    println!(
        "{:<20} {:>6} {:>14}  {}",
        "MEMBER", "SHARE", "AMOUNT", "STATUS"
    );
    println!("{}", "-".repeat(52));
    for entry in &settlement.balances {
        let status = entry.status();
        let amount = match status {
            BalanceStatus::Settled => format_units(0.0),
            _ => format_units(entry.balance.abs()),
        };
        let share = session
            .shares()
            .members()
            .iter()
            .find(|m| m.name == entry.name)
            .map(|m| m.percent_label())
            .unwrap_or_default();
        println!(
            "{:<20} {:>6} {:>14}  {}",
            truncate(&entry.name, 20),
            share,
            format!("{}{}", currency, amount),
            status.label()
        );
    }
    println!("{}", "-".repeat(52));
    println!(
        "Total spent: {}{}",
        currency,
        format_cents(settlement.total_cents)
    );

    if !settlement.orphaned.is_empty() {
        println!();
        println!(
            "Warning: {} expense(s) paid by non-members are not credited. Run `groupsplit check`.",
            settlement.orphaned.len()
        );
    }
}

async fn run_shares_set_command(
    session: &mut GroupSession,
    assignments: &[String],
    remove: &[String],
) -> Result<()> {
    if assignments.is_empty() && remove.is_empty() {
        bail!("Nothing to change. Pass NAME=SHARE assignments or --remove NAME");
    }

    let parsed = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>>>()?;

    let remove: Vec<&str> = remove.iter().map(|name| name.trim()).collect();
    if let Some(unknown) = remove.iter().find(|name| !session.shares().contains(name)) {
        bail!("Unknown member: {}", unknown);
    }

    let draft = session.begin_share_edit();
    for name in &remove {
        draft.remove_member(name);
    }
    for (name, share) in &parsed {
        draft.set_share(name, *share);
    }

    if let Err(err) = session.commit_share_edit().await {
        session.cancel_share_edit();
        return Err(err.into());
    }

    println!("Share mapping updated.");
    print_shares(session.shares().members());
    Ok(())
}

fn print_shares(members: &[crate::domain::Member]) {
    println!("{:<20} {:>6}", "MEMBER", "SHARE");
    println!("{}", "-".repeat(27));
    for member in members {
        println!(
            "{:<20} {:>6}",
            truncate(&member.name, 20),
            member.percent_label()
        );
    }
}

fn print_expenses(expenses: &[&Expense], currency: &str) {
    if expenses.is_empty() {
        println!("No expenses yet.");
        return;
    }

    println!(
        "{:<36}  {:<10}  {:>12}  {:<16}  {}",
        "ID", "DATE", "AMOUNT", "PAID BY", "DESCRIPTION"
    );
    println!("{}", "-".repeat(100));
    for expense in expenses {
        println!(
            "{:<36}  {:<10}  {:>12}  {:<16}  {}",
            expense.id,
            expense.expense_date.format("%Y-%m-%d"),
            format!("{}{}", currency, format_cents(expense.amount_cents)),
            truncate(&expense.paid_by, 16),
            truncate(&expense.description, 30)
        );
    }
    println!("{}", "-".repeat(100));
    println!(
        "Total: {}{} ({} expense(s))",
        currency,
        format_cents(total_cents(expenses.iter().copied())),
        expenses.len()
    );
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_id(id: &str) -> Result<ExpenseId> {
    Uuid::parse_str(id).context("Invalid expense ID format (expected UUID)")
}

/// Parse "NAME=0.3" or "NAME=30%" into a member name and fraction.
fn parse_assignment(input: &str) -> Result<(String, f64)> {
    let (name, value) = input
        .rsplit_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid share '{}'. Use NAME=0.3 or NAME=30%", input))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid share '{}': missing member name", input);
    }

    let value = value.trim();
    let share = match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().map(|p| p / 100.0),
        None => value.parse::<f64>(),
    }
    .with_context(|| format!("Invalid share value in '{}'", input))?;

    Ok((name.to_string(), share))
}
