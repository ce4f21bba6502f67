//! Main entry point for the FunShop backend.
//!
//! This file loads the configuration, sets up logging and the database,
//! seeds the bootstrap administrator and serves the Axum application until
//! Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use funshop::config::Config;
use funshop::database::Database;
use funshop::state::{build_mailer, AppState};
use funshop::{app, auth};

#[derive(Debug, Parser)]
#[command(name = "funshop", version, about = "FunShop storefront server")]
struct Args {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = Database::open(&config.database.path)?;
    tracing::info!(path = %config.database.path.display(), "database ready");

    if let (Some(email), Some(password)) = (&config.admin.email, &config.admin.password) {
        auth::service::ensure_admin(&db, email, password).await?;
    }

    let mailer = build_mailer(&config)?;
    tracing::info!(transport = mailer.name(), "mail transport ready");

    let addr = config.bind_addr()?;
    let state = AppState::new(db, mailer, config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("FunShop listening on http://{addr}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
