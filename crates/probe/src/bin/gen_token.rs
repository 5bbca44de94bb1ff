//! `gen-token` -- prints a signed test token for the game API.
//!
//! Without a subject the identifier of `--username` is looked up in
//! `auth.users` using the selected database profile.
//!
//! # Environment variables
//!
//! | Variable        | Required | Default            | Description        |
//! |-----------------|----------|--------------------|--------------------|
//! | `JWT_SECRET`    | no       | development secret | HMAC signing key   |
//! | `JWT_ALGORITHM` | no       | `HS256`            | HS256/HS384/HS512  |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsu_core::credential::{
    generate_token, CredentialConfig, DEFAULT_EMAIL, DEFAULT_USERNAME, TOKEN_LIFETIME_MINS,
};
use tsu_db::users::UserRepo;
use tsu_db::{DbEnv, DbProfile, PgStore};

const RULE: &str = "============================================================";

#[derive(Parser, Debug)]
#[command(name = "gen-token", version, about = "Generate a signed test token")]
struct Cli {
    /// Subject identifier; looked up by username when omitted
    subject: Option<String>,
    #[arg(long, default_value = DEFAULT_USERNAME)]
    username: String,
    #[arg(long, default_value = DEFAULT_EMAIL)]
    email: String,
    /// Database profile for the subject lookup
    #[arg(long, default_value = "local")]
    env: DbEnv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gen_token=info,tsu_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = CredentialConfig::from_env()?;
    if config.dev_secret {
        tracing::warn!("JWT_SECRET is not set, signing with the development secret");
    }

    let subject = match cli.subject {
        Some(subject) => subject,
        None => lookup_subject(cli.env, &cli.username).await?,
    };

    let token = generate_token(&subject, &cli.username, &cli.email, &config)?;

    println!("{RULE}");
    println!("Generated token:");
    println!("{RULE}");
    println!("{token}");
    println!("{RULE}");
    println!("User ID:    {subject}");
    println!("Expires in: {TOKEN_LIFETIME_MINS} minutes");
    println!("Authorization: Bearer {token}");
    println!("{RULE}");
    Ok(())
}

async fn lookup_subject(env: DbEnv, username: &str) -> anyhow::Result<String> {
    tracing::info!(%env, username, "Looking up subject identifier");
    let profile = DbProfile::for_env(env)?;
    let mut store = PgStore::connect(&profile).await?;
    let found = UserRepo::find_id_by_username(store.connection(), username).await;
    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Closing the connection failed");
    }
    match found? {
        Some(id) => {
            tracing::info!(user_id = %id, "Found user");
            Ok(id)
        }
        None => anyhow::bail!("user `{username}` not found in auth.users"),
    }
}
