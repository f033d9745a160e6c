//! Shelfmark service entrypoint

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfmark::auth::JwtValidator;
use shelfmark::config::Args;
use shelfmark::db::Database;
use shelfmark::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present; real environment wins
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    if let Err(msg) = args.validate() {
        anyhow::bail!("Invalid configuration: {}", msg);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode = args.dev_mode,
        "Starting Shelfmark"
    );

    let db = match args.mongodb_uri.as_deref() {
        Some(uri) => Database::connect(uri, &args.mongodb_db).await?,
        None => Database::memory(),
    };

    let jwt = match args.jwt_secret.clone() {
        Some(secret) => JwtValidator::new(secret, args.jwt_expiry_seconds)?,
        None => JwtValidator::new_dev(),
    };

    let state = Arc::new(AppState::new(args, Arc::new(db), jwt));
    server::run(state).await?;

    Ok(())
}
