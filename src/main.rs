use clap::{Parser, Subcommand};
use tracing::info;

mod commands;
mod shutdown;
mod startup;

#[derive(Parser)]
#[command(name = "lifedesk", version, about = "Calendar sync, task scheduling and a personal journal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one synchronization pass against the external calendar
    Sync,
    /// Keep synchronizing in the background until interrupted
    Watch,
    /// Show free time for a day
    Free {
        /// Day to inspect (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Task management and scheduling
    Task {
        #[command(subcommand)]
        action: commands::tasks::TaskAction,
    },
    /// Idea notebook
    Idea {
        #[command(subcommand)]
        action: commands::journal::IdeaAction,
    },
    /// Expense tracking
    Expense {
        #[command(subcommand)]
        action: commands::journal::ExpenseAction,
    },
    /// Calendar credential management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config().await?;

    if matches!(cli.command, Commands::Watch) {
        info!("Starting lifedesk in watch mode");
        return startup::run_watch(config).await;
    }

    let ctx = startup::command_context(config).await?;
    let result = match cli.command {
        Commands::Sync => commands::calendar::sync(&ctx).await,
        Commands::Free { date } => commands::calendar::free(&ctx, date.as_deref()).await,
        Commands::Task { action } => commands::tasks::run(&ctx, action).await,
        Commands::Idea { action } => commands::journal::run_idea(&ctx, action).await,
        Commands::Expense { action } => commands::journal::run_expense(&ctx, action).await,
        Commands::Auth { action } => commands::auth::run(&ctx, action).await,
        Commands::Watch => Ok(()),
    };

    ctx.close().await;
    result.map_err(Into::into)
}
