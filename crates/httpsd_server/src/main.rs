//! httpsd - Prometheus HTTP service discovery server.
//!
//! Serves `GET /{file}.json` discovery documents from a SQLite-backed
//! entity store, with a JSON admin API for managing the configuration.
//!
//! Usage:
//!     httpsd --bind 127.0.0.1:9080 --database /var/lib/httpsd/httpsd.sqlite3

use clap::Parser;
use httpsd_db::SdDb;
use httpsd_server::{http, ServerArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "httpsd_server=info,httpsd_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = ServerArgs::parse();

    tracing::info!("Starting httpsd");
    tracing::info!("  Bind: {}", args.bind);
    tracing::info!("  Database: {}", args.database.display());

    let db = SdDb::open(&args.database).await?;
    let app = http::router(db);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "Discovery endpoint ready");
    axum::serve(listener, app).await?;

    Ok(())
}
