//! # hiretrack CLI Module
//!
//! This module implements the CLI interface for hiretrack.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create the database (and optionally the first admin)
//! - `status` - Show record counts and the default workflow
//! - `compact` - Compact the database file
//! - `user add|list|token` - Manage accounts and API tokens
//! - `workflow list|create|default` - Manage hiring workflows
//! - `stages --position <ID> | --workflow <ID>` - Show ordered stages
//!
//! The CLI works on the database file directly and acts as the local
//! operator, which the policy treats as the bootstrap ADMIN.

mod commands;

use crate::config::{AppConfig, Backend};
use clap::{Args, Parser, Subcommand};
use hiretrack_core::{HireError, Role};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// hiretrack - interview tracking server
///
/// Candidates, positions, interviews and feedback, organised by hiring
/// workflows with ordered stages.
#[derive(Parser, Debug)]
#[command(name = "hiretrack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

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
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database, optionally with a first ADMIN user
    Init {
        /// Name of the first admin
        #[arg(long, requires = "admin_email")]
        admin_name: Option<String>,

        /// Email of the first admin
        #[arg(long, requires = "admin_name")]
        admin_email: Option<String>,
    },

    /// Show record counts and the default workflow
    Status,

    /// Compact the database file
    Compact,

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage workflows
    #[command(subcommand)]
    Workflow(WorkflowCommand),

    /// Show the ordered stages of a position or a workflow
    Stages(StagesArgs),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user and print its API token
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// ADMIN, MANAGER, INTERVIEWER or USER
        #[arg(short, long, default_value = "USER")]
        role: Role,
    },

    /// List users
    List,

    /// Rotate a user's API token and print the new one
    Token {
        /// User id
        id: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// List workflows with their stages
    List,

    /// Create a workflow
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Stage names, in order (repeatable)
        #[arg(short, long = "stage")]
        stages: Vec<String>,

        /// Make this the default workflow
        #[arg(long)]
        default: bool,
    },

    /// Make a workflow the default
    Default {
        /// Workflow id
        id: u64,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct StagesArgs {
    /// Resolve through a position (own workflow, else the default)
    #[arg(short, long)]
    pub position: Option<u64>,

    /// List a workflow's stages directly
    #[arg(short, long)]
    pub workflow: Option<u64>,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file and environment, then CLI overrides.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig, HireError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    if let Some(backend) = cli.backend {
        config.database.backend = backend;
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HireError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init {
            admin_name,
            admin_email,
        }) => cmd_init(&config, json_mode, admin_name.zip(admin_email)),
        Some(Commands::Status) | None => cmd_status(&config, json_mode),
        Some(Commands::Compact) => cmd_compact(&config),
        Some(Commands::User(command)) => cmd_user(&config, json_mode, command),
        Some(Commands::Workflow(command)) => cmd_workflow(&config, json_mode, command),
        Some(Commands::Stages(args)) => cmd_stages(&config, json_mode, &args),
    }
}

// =============================================================================
// TESTS
// =============================================================================
