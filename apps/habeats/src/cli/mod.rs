//! # Habeats CLI Module
//!
//! This module implements the CLI interface for Habeats.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `tiers` - List subscription tiers
//! - `features` - List gateable features
//! - `access` - Check feature access for a tier
//! - `plan` - Check whether another plan may be generated
//! - `streak` - Check whether to show the streak upsell
//! - `cache` - Inspect and administer the persistent cache

mod commands;

use crate::config::HabeatsConfig;
use clap::{Parser, Subcommand};
use habeats_core::HabeatsError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Habeats - subscription gating and cache service
///
/// Evaluates tier/feature access for the Habeats nutrition tracker and
/// administers its expiring key/value cache.
#[derive(Parser, Debug)]
#[command(name = "habeats")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the cache database (overrides `cache.path`)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// List subscription tiers
    Tiers,

    /// List gateable features and their required tier
    Features,

    /// Check feature access for a tier
    Access {
        /// Subscription tier (free, plus, premium)
        #[arg(short, long, default_value = "free")]
        tier: String,

        /// Feature key, e.g. groceryList
        #[arg(short, long)]
        feature: String,
    },

    /// Check whether another meal plan may be generated
    Plan {
        /// Subscription tier (free, plus, premium)
        #[arg(short, long, default_value = "free")]
        tier: String,

        /// Number of plans the user already has
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,
    },

    /// Check whether to show the streak upgrade prompt
    Streak {
        /// Subscription tier (free, plus, premium)
        #[arg(short, long, default_value = "free")]
        tier: String,

        /// Current streak in days
        #[arg(short, long)]
        streak: u32,

        /// The prompt was already shown
        #[arg(long)]
        seen: bool,
    },

    /// Inspect and administer the cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Read an entry
    Get {
        #[arg(short, long)]
        key: String,

        /// Storage key prefix (defaults to the configured one)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Write an entry
    Set {
        #[arg(short, long)]
        key: String,

        /// JSON payload
        #[arg(short, long)]
        data: String,

        /// Lifetime in milliseconds
        #[arg(long)]
        ttl_ms: Option<u64>,

        #[arg(long)]
        prefix: Option<String>,
    },

    /// Remove an entry
    Remove {
        #[arg(short, long)]
        key: String,

        #[arg(long)]
        prefix: Option<String>,
    },

    /// Show the age of an entry
    Age {
        #[arg(short, long)]
        key: String,

        #[arg(long)]
        prefix: Option<String>,
    },

    /// Remove expired and unreadable entries
    Sweep,

    /// Remove every cache entry
    Clear,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file, then environment, then `--database`.
pub fn load_config(cli: &Cli) -> Result<HabeatsConfig, HabeatsError> {
    let mut config = HabeatsConfig::load(cli.config.as_deref())?.with_env_overrides()?;
    if let Some(database) = &cli.database {
        config.cache.path = database.clone();
    }
    if cli.verbose {
        tracing::info!(?config, "Resolved configuration");
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HabeatsError> {
    let config = load_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&config, &host, port).await,
        Some(Commands::Tiers) => cmd_tiers(json_mode),
        Some(Commands::Features) => cmd_features(json_mode),
        Some(Commands::Access { tier, feature }) => {
            cmd_access(&config, json_mode, &tier, &feature)
        }
        Some(Commands::Plan { tier, count }) => cmd_plan(&config, json_mode, &tier, count),
        Some(Commands::Streak { tier, streak, seen }) => {
            cmd_streak(&config, json_mode, &tier, streak, seen)
        }
        Some(Commands::Cache { action }) => cmd_cache(&config, json_mode, action),
        None => {
            // No subcommand - show the catalog by default
            cmd_tiers(json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
