//! Kanban board commands

use anyhow::Result;
use clap::{Parser, Subcommand};

use expensectl_server::db::BoardRepo;

use super::{connect, find_user, DbArgs};

#[derive(Parser, Debug)]
pub struct BoardArgs {
    #[command(subcommand)]
    pub command: BoardCommands,
}

#[derive(Subcommand, Debug)]
pub enum BoardCommands {
    /// Create the "Expense Tracker" board with the default workflow columns
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Email of the board owner
    #[arg(long)]
    pub user: String,

    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_board(args: BoardArgs) -> Result<()> {
    match args.command {
        BoardCommands::Init(args) => run_init(args).await,
    }
}

async fn run_init(args: InitArgs) -> Result<()> {
    let pool = connect(&args.db).await?;
    let user = find_user(&pool, &args.user).await?;

    let board = BoardRepo::new(&pool).initialize_default(user.id).await?;
    println!("Created board '{}' ({})", board.board.name, board.board.id);
    for column in &board.columns {
        println!("  {}. {}", column.column.order + 1, column.column.name);
    }
    Ok(())
}
