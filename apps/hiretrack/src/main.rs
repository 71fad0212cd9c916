//! # hiretrack - Interview Tracking Server
//!
//! The main binary for hiretrack.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for administration (users, workflows, stages)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/hiretrack (THE BINARY)           │
//! │                                                      │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────┐  │
//! │  │   CLI       │    │   HTTP API  │    │ Config  │  │
//! │  │  (clap)     │    │   (axum)    │    │ (toml)  │  │
//! │  └──────┬──────┘    └──────┬──────┘    └────┬────┘  │
//! │         └──────────────────┼────────────────┘       │
//! │                            ▼                        │
//! │                  ┌──────────────────┐               │
//! │                  │  hiretrack-core  │               │
//! │                  │   (THE LOGIC)    │               │
//! │                  └──────────────────┘               │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! hiretrack server --host 0.0.0.0 --port 8080
//!
//! # Administration
//! hiretrack user add --name "Ada" --email ada@example.com --role admin
//! hiretrack workflow create --name Engineering --stage Screen --stage Onsite --default
//! hiretrack stages --position 3
//! ```

use clap::Parser;
use hiretrack::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // HIRETRACK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("HIRETRACK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hiretrack=info,hiretrack_core=info,tower_http=debug".into());

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

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  hiretrack v{}
  Interview tracking server
"#,
        env!("CARGO_PKG_VERSION")
    );
}
