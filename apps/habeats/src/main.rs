//! # Habeats - Gating and Cache Service
//!
//! The main binary for the Habeats subscription gate.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for access checks and cache administration
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/habeats (THE BINARY)         │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌──────────────┐                │
//! │              │ habeats-core │                │
//! │              │ (THE LOGIC)  │                │
//! │              └──────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! habeats server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! habeats access --tier free --feature groceryList
//! habeats plan --tier free --count 1
//! habeats cache sweep
//! ```

use clap::Parser;
use habeats::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // HABEATS_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("HABEATS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "habeats=info,habeats_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Habeats startup banner.
fn print_banner() {
    println!(
        r#"
  _           _                _
 | |__   __ _| |__   ___  __ _| |_ ___
 | '_ \ / _` | '_ \ / _ \/ _` | __/ __|
 | | | | (_| | |_) |  __/ (_| | |_\__ \
 |_| |_|\__,_|_.__/ \___|\__,_|\__|___/

  Subscription Gate v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
