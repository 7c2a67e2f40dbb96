//! httpsd server library
//!
//! Serves Prometheus-compatible HTTP service discovery documents from the
//! entity store, plus a small JSON admin API for managing files, targets,
//! labels and records.

pub mod discovery;
pub mod http;

pub use discovery::{generate, DiscoveryError};

#[derive(clap::Parser, Debug)]
#[command(
    name = "httpsd",
    about = "Prometheus HTTP service discovery server"
)]
pub struct ServerArgs {
    /// HTTP bind address
    #[arg(long, default_value = "127.0.0.1:9080")]
    pub bind: String,

    /// SQLite database path
    #[arg(long, default_value = "httpsd.sqlite3")]
    pub database: std::path::PathBuf,
}
