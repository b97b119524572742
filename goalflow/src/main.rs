// goalflow - goal hierarchy and carry-over engine
// Command-line entry point for maintenance tasks against a local database

use anyhow::Context;
use clap::{Parser, Subcommand};
use goalflow::app::AppState;
use goalflow::period::Period;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "goalflow", version, about = "Goal hierarchy and carry-over engine")]
struct Cli {
    /// Directory holding settings.json and the database
    #[arg(long, env = "GOALFLOW_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview, or with --commit perform, pulling open goals into a quarter
    Pull {
        user: String,
        /// Destination quarter, e.g. 2025-Q2
        to: Period,
        /// Source quarter; defaults to the one before `to`
        #[arg(long)]
        from: Option<Period>,
        #[arg(long)]
        commit: bool,
    },
    /// Print a quarter's goal tree with the state of one week
    Tree {
        user: String,
        period: Period,
        week: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goalflow=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting goalflow {}", env!("CARGO_PKG_VERSION"));

    let state = AppState::initialize(cli.data_dir)
        .await
        .context("failed to open goalflow data directory")?;

    match cli.command {
        Commands::Pull {
            user,
            to,
            from,
            commit,
        } => {
            let from = from.unwrap_or_else(|| to.previous());

            let report = state
                .migration_service
                .preview_or_commit(&user, from, to, !commit)
                .await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Tree { user, period, week } => {
            let tree = state
                .goals_service
                .get_goal_tree(&user, period, week)
                .await?;

            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
    }

    Ok(())
}
