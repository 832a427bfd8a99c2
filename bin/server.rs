// Healthcare Dashboard - Web Server
// REST API with Axum over the SQLite record store

use anyhow::{Context, Result};
use clap::Parser;
use healthcare_dashboard::config::ServerArgs;
use healthcare_dashboard::logging::{init_logging, LoggingConfig};
use healthcare_dashboard::server::{router, AppState};
use healthcare_dashboard::session::SessionGate;
use healthcare_dashboard::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    init_logging(&LoggingConfig::new(args.store.log_format))?;

    let store = SqliteStore::open(&args.store.db, args.store.duplicate_policy)
        .with_context(|| format!("failed to open database {}", args.store.db.display()))?;
    let gate = SessionGate::new(args.admin_token.clone());
    if !gate.is_enabled() {
        tracing::warn!("no admin token configured; API is open to anyone who can reach it");
    }

    let app = router(AppState::new(store, gate));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    tracing::info!(
        bind = %args.bind,
        db = %args.store.db.display(),
        policy = ?args.store.duplicate_policy,
        "healthcare server listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
