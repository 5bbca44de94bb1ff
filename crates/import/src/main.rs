//! `tsu-import` -- loads game configuration sources into PostgreSQL.
//!
//! Each subcommand runs one or more import steps against a single database
//! connection and prints a run summary when it finishes.
//!
//! # Environment variables
//!
//! | Variable      | Required      | Default     | Description                 |
//! |---------------|---------------|-------------|-----------------------------|
//! | `DB_HOST`     | `--env prod`  | `localhost` | Database host               |
//! | `DB_PORT`     | no            | `5432`      | Database port               |
//! | `DB_NAME`     | no            | `tsu_db`    | Database name               |
//! | `DB_USER`     | no            | `tsu_user`  | Database user               |
//! | `DB_PASSWORD` | `--env prod`  | (empty)     | Database password           |
//! | `RUST_LOG`    | no            | see below   | Log filter                  |
//!
//! # Exit codes
//!
//! `0` when the run completed (per-record failures included), `1` on a fatal
//! error, `130` when interrupted with Ctrl-C.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsu_core::policy::WritePolicy;
use tsu_db::{DbEnv, DbProfile, PgStore};
use tsu_pipeline::{ImportError, Importer, Plan};

/// Default monsters source.
const DEFAULT_MONSTERS_FILE: &str = "configs/game/monsters/monsters.json";
/// Default directory of the equipment sources.
const DEFAULT_EQUIPMENT_DIR: &str = "configs/game/equipment";
/// Default configuration workbook.
const DEFAULT_WORKBOOK: &str = "configs/game/游戏配置表_v2.0.0.xlsx";

/// Exit code for an interrupted run (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "tsu-import", version, about = "Game configuration importer")]
struct Cli {
    /// Connection profile: `local` uses fixed developer credentials, `prod`
    /// reads `DB_*` environment variables
    #[arg(long, global = true, default_value = "local")]
    env: DbEnv,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    /// Import monsters with their skill, drop and tag links
    Monsters {
        /// Monsters JSON file
        #[arg(long, default_value = DEFAULT_MONSTERS_FILE)]
        config: PathBuf,
        /// `incremental` or `truncate`
        #[arg(long, default_value = "incremental")]
        mode: WritePolicy,
    },
    /// Import items, equipment slots, drop pools, world drops and sets
    Equipment {
        /// Directory holding the equipment JSON files
        #[arg(long, default_value = DEFAULT_EQUIPMENT_DIR)]
        config_dir: PathBuf,
        /// `incremental` or `truncate`
        #[arg(long, default_value = "truncate")]
        mode: WritePolicy,
    },
    /// Import the sheets of the configuration workbook
    Workbook {
        /// Workbook file (.xlsx)
        #[arg(long, default_value = DEFAULT_WORKBOOK)]
        file: PathBuf,
        /// Only import these sheets (sheet or category names); repeatable
        #[arg(long = "sheet")]
        sheets: Vec<String>,
        /// `incremental` or `truncate`
        #[arg(long, default_value = "truncate")]
        mode: WritePolicy,
    },
}

impl Command {
    fn plan(&self) -> anyhow::Result<(Plan, WritePolicy)> {
        Ok(match self {
            Self::Monsters { config, mode } => (Plan::Monsters { file: config.clone() }, *mode),
            Self::Equipment { config_dir, mode } => (
                Plan::Equipment {
                    dir: config_dir.clone(),
                },
                *mode,
            ),
            Self::Workbook { file, sheets, mode } => (Plan::workbook(file, sheets)?, *mode),
        })
    }
}

enum RunOutcome {
    Finished(Result<(), ImportError>),
    Interrupted,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tsu_import=info,tsu_pipeline=info,tsu_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Import failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (plan, policy) = cli.command.plan()?;

    // --- Database ---
    let profile = DbProfile::for_env(cli.env)?;
    let store = PgStore::connect(&profile).await?;

    tracing::info!(env = %cli.env, %policy, ?plan, "Starting import");

    // --- Run ---
    let mut importer = Importer::new(store, policy);
    let outcome = tokio::select! {
        result = importer.run(&plan) => RunOutcome::Finished(result),
        _ = tokio::signal::ctrl_c() => RunOutcome::Interrupted,
    };

    let (code, interrupted) = match outcome {
        RunOutcome::Finished(Ok(())) => (ExitCode::SUCCESS, false),
        RunOutcome::Finished(Err(e)) => {
            tracing::error!(error = %e, "Import aborted");
            importer.abort().await;
            (ExitCode::FAILURE, false)
        }
        RunOutcome::Interrupted => {
            tracing::warn!("Interrupted, stopping import");
            importer.abort().await;
            (ExitCode::from(EXIT_INTERRUPTED), true)
        }
    };

    // --- Report ---
    let (store, summary) = importer.finish(interrupted);
    println!("{summary}");

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Closing the connection failed");
    }
    Ok(code)
}
