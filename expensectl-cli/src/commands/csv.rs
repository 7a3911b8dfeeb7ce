//! Offline CSV helpers

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use expensectl_core::csv::{read_csv_file, template, CsvError};
use expensectl_core::CoreError;

#[derive(Parser, Debug)]
pub struct CsvArgs {
    #[command(subcommand)]
    pub command: CsvCommands,
}

#[derive(Subcommand, Debug)]
pub enum CsvCommands {
    /// Print an import template (header plus one sample row)
    Template(TemplateArgs),
    /// Check a CSV file without importing it
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// CSV file to check
    pub file: PathBuf,
}

pub fn run_csv(args: CsvArgs) -> Result<()> {
    match args.command {
        CsvCommands::Template(args) => run_template(args),
        CsvCommands::Validate(args) => run_validate(args),
    }
}

fn run_template(args: TemplateArgs) -> Result<()> {
    let text = template();
    match args.output {
        Some(path) => {
            fs::write(&path, format!("{text}\n"))
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote template to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    match read_csv_file(&args.file) {
        Ok(rows) => {
            println!("{}: {} rows valid", args.file.display(), rows.len());
            Ok(())
        }
        Err(CoreError::Csv(e @ CsvError::Rows(_))) => {
            for message in e.messages() {
                eprintln!("{message}");
            }
            bail!("{} failed validation with {} error(s)", args.file.display(), e.messages().len())
        }
        Err(e @ CoreError::Csv(_)) => {
            Err(e).with_context(|| format!("{} is not an expense CSV", args.file.display()))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", args.file)),
    }
}
