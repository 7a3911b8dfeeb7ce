//! Per-user expense commands: import, export, report

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, ValueEnum};

use expensectl_core::csv::{import_file, to_csv};
use expensectl_core::currency::format_currency;
use expensectl_core::models::ExpenseStatus;
use expensectl_core::reports::{summarize, ExpenseFilter, Period, Summary};
use expensectl_server::db::ExpenseRepo;

use super::{connect, find_user, DbArgs};

/// Filters shared by export and report
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Substring of title or description (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Only this status (logged, pending, cleared, reimbursable)
    #[arg(long)]
    pub status: Option<ExpenseStatus>,

    /// Only this category
    #[arg(long)]
    pub category: Option<String>,

    /// Earliest date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl From<FilterArgs> for ExpenseFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            search: args.search,
            status: args.status,
            category: args.category,
            from: args.from,
            to: args.to,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Email of the expense owner
    #[arg(long)]
    pub user: String,

    /// CSV file with a title,category,amount,currency,date[,description] header
    pub file: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum PeriodArg {
    #[default]
    All,
    CurrentMonth,
    LastMonth,
    CurrentYear,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::All => Period::All,
            PeriodArg::CurrentMonth => Period::CurrentMonth,
            PeriodArg::LastMonth => Period::LastMonth,
            PeriodArg::CurrentYear => Period::CurrentYear,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Email of the expense owner
    #[arg(long)]
    pub user: String,

    /// Write to this file (a directory gets the period's default filename)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Preset date window
    #[arg(long, value_enum, default_value_t = PeriodArg::All)]
    pub period: PeriodArg,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Email of the expense owner
    #[arg(long)]
    pub user: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_import(args: ImportArgs) -> Result<()> {
    let drafts = import_file(&args.file)
        .with_context(|| format!("Nothing imported from {}", args.file.display()))?;

    let pool = connect(&args.db).await?;
    let user = find_user(&pool, &args.user).await?;
    let created = ExpenseRepo::new(&pool).create_many(user.id, &drafts).await?;

    println!("Imported {} expenses for {}", created.len(), user.email);
    Ok(())
}

pub async fn run_export(args: ExportArgs) -> Result<()> {
    let today = Utc::now().date_naive();
    let period = Period::from(args.period);
    let mut filter = ExpenseFilter::from(args.filter);
    period.restrict(&mut filter, today);

    let pool = connect(&args.db).await?;
    let user = find_user(&pool, &args.user).await?;
    let expenses = ExpenseRepo::new(&pool).list_all(user.id, &filter).await?;
    let csv = to_csv(&expenses);

    match args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(period.filename(today))
            } else {
                path
            };
            fs::write(&path, format!("{csv}\n"))
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Exported {} expenses to {}", expenses.len(), path.display());
        }
        None => println!("{csv}"),
    }
    Ok(())
}

pub async fn run_report(args: ReportArgs) -> Result<()> {
    let pool = connect(&args.db).await?;
    let user = find_user(&pool, &args.user).await?;
    let expenses = ExpenseRepo::new(&pool)
        .list_all(user.id, &ExpenseFilter::default())
        .await?;

    let filter = ExpenseFilter::from(args.filter);
    let summary = summarize(&expenses, &filter, Utc::now().date_naive());

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        ReportFormat::Text => print!("{}", render_text(&summary)),
    }
    Ok(())
}

fn render_text(summary: &Summary) -> String {
    let stats = &summary.stats;
    let mut out = String::new();

    out.push_str(&format!("Transactions:    {}\n", stats.total_transactions));
    out.push_str(&format!("Total:           {}\n", stats.total_amount));
    out.push_str(&format!("Average:         {}\n", stats.average_amount));
    out.push_str(&format!("Top category:    {}\n", stats.top_category));
    out.push_str(&format!("Monthly growth:  {:+.1}%\n", stats.monthly_growth));

    if !summary.totals_by_currency.is_empty() {
        out.push_str("\nBy currency:\n");
        for slice in &summary.by_currency {
            out.push_str(&format!(
                "  {:<6} {:>14}  ({} expenses)\n",
                slice.currency,
                format_currency(slice.amount, &slice.currency),
                slice.count
            ));
        }
    }

    if !summary.by_category.is_empty() {
        out.push_str("\nBy category:\n");
        for slice in &summary.by_category {
            out.push_str(&format!(
                "  {:<20} {:>14}  ({} expenses)\n",
                slice.category,
                format_currency(slice.amount, &slice.currency),
                slice.count
            ));
        }
    }

    out
}
