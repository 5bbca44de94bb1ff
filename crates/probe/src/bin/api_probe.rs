//! `api-probe` -- exercises the admin API and reports per-endpoint results.
//!
//! Exits `0` only when login succeeded and no probe failed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsu_probe::config::{DEFAULT_PASSWORD, DEFAULT_URL, DEFAULT_USERNAME};
use tsu_probe::{report, Harness, ProbeConfig};

#[derive(Parser, Debug)]
#[command(name = "api-probe", version, about = "Admin API probe harness")]
struct Cli {
    /// API base address
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,
    /// Login identifier
    #[arg(long, default_value = DEFAULT_USERNAME)]
    username: String,
    /// Login password
    #[arg(long, default_value = DEFAULT_PASSWORD)]
    password: String,
    /// Directory the `test_results_<ts>` report directory is created in
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tsu_probe=info,api_probe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Probe run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = ProbeConfig::new(&cli.url, cli.username, cli.password, cli.output_dir)?;
    let output_dir = config.output_dir.clone();

    let run = Harness::new(config)?.run().await;

    println!("{}", report::render_console(&run));
    let path = report::write_json(&run, &output_dir)?;
    println!("JSON report: {}", path.display());

    Ok(run.success())
}
