//! expensectl CLI - personal expense tracking
//!
//! This is the main entry point for the expensectl command-line tool, which provides:
//! - The JSON HTTP API server (`serve`)
//! - Database setup and account management (`migrate`, `user`)
//! - CSV import/export and spending reports for a user
//! - Kanban board bootstrap (`board init`)
//! - Offline CSV helpers (`csv template`, `csv validate`)

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "expensectl",
    author,
    version,
    about = "Track expenses, import and export CSV, and run the expense API",
    long_about = "Record expenses per user in SQLite, summarize spending by category and \
                  currency, and follow each expense through a Kanban workflow."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::DbArgs),
    /// Manage user accounts (create, list)
    User(commands::user::UserArgs),
    /// Import expenses for a user from a CSV file
    Import(commands::expenses::ImportArgs),
    /// Export a user's expenses as CSV
    Export(commands::expenses::ExportArgs),
    /// Summarize a user's spending
    Report(commands::expenses::ReportArgs),
    /// Kanban board operations
    Board(commands::board::BoardArgs),
    /// CSV helpers that need no database (template, validate)
    Csv(commands::csv::CsvArgs),
    /// Manage expensectl configuration (init, path, show)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::User(args) => commands::run_user(args).await?,
        Commands::Import(args) => commands::run_import(args).await?,
        Commands::Export(args) => commands::run_export(args).await?,
        Commands::Report(args) => commands::run_report(args).await?,
        Commands::Board(args) => commands::run_board(args).await?,
        Commands::Csv(args) => commands::run_csv(args)?,
        Commands::Config(args) => config::run_config(args)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
