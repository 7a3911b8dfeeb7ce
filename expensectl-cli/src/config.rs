use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use expensectl_core::ExpenseConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init(InitArgs),
    /// Show config file path
    Path,
    /// Show the effective configuration (file, environment and defaults)
    Show,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = ExpenseConfig::config_path();

    if config_path.exists() && !args.force {
        bail!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        );
    }

    ExpenseConfig::default()
        .save_to(&config_path)
        .context("Failed to write default config")?;

    println!("Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Run: expensectl migrate");
    println!("  3. Run: expensectl user create --email you@example.com --name You");

    Ok(())
}

fn run_path() -> Result<()> {
    let path = ExpenseConfig::config_path();
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist yet; run `expensectl config init`)");
    }
    Ok(())
}

fn run_show() -> Result<()> {
    let config = ExpenseConfig::load()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    print!("{rendered}");
    Ok(())
}
