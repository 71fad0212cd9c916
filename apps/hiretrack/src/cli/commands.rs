//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{StagesArgs, UserCommand, WorkflowCommand};
use crate::api;
use crate::config::{AppConfig, Backend};
use hiretrack_core::{
    Action, Actor, HireError, PositionId, Resource, Role, Stage, StageInput, User, UserId,
    UserInput, WorkflowDetail, WorkflowId, WorkflowInput, authorize, log_and_default,
};
use serde::Serialize;

/// The local operator. Whoever can open the database file administers it.
const OPERATOR: Actor = Actor::bootstrap_admin();

fn operator_may(action: Action, resource: Resource) -> Result<(), HireError> {
    authorize(Some(&OPERATOR), action, resource).map(|_| ())
}

fn print_json(value: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), HireError> {
    let store = config.open_store()?;
    let settings = config.api_settings();

    println!("hiretrack server starting...");
    println!();
    println!("Configuration:");
    println!("  Address:    {}", config.bind_address());
    println!("  Backend:    {}", config.database.backend);
    println!("  Database:   {:?}", config.database.path);
    println!(
        "  Rate limit: {}",
        match settings.rate_limit {
            0 => "disabled".to_string(),
            rps => format!("{} req/s", rps),
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /health                     - Health check");
    println!("  GET  /api/workflows              - List workflows");
    println!("  POST /api/workflows/{{id}}/stages  - Create or reorder stages");
    println!("  GET  /api/positions/{{id}}/stages  - Resolved stages of a position");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    if config.database.backend == Backend::Memory {
        tracing::warn!("Memory backend: all data is lost when the server stops");
    }

    api::run_server(&config.bind_address(), store, settings).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedUser<'a> {
    #[serde(flatten)]
    user: &'a User,
    api_token: &'a str,
}

/// Create the database and, when asked, the first ADMIN.
pub fn cmd_init(
    config: &AppConfig,
    json_mode: bool,
    admin: Option<(String, String)>,
) -> Result<(), HireError> {
    let store = config.open_store()?;
    tracing::info!(path = ?config.database.path, "Database initialized");

    let Some((name, email)) = admin else {
        if !json_mode {
            println!("Database ready at {:?}", config.database.path);
        }
        return Ok(());
    };

    operator_may(Action::Create, Resource::User)?;
    let (user, token) = store.create_user(UserInput {
        name,
        email,
        role: Role::Admin,
    })?;

    if json_mode {
        print_json(&CreatedUser {
            user: &user,
            api_token: &token,
        });
    } else {
        println!("Database ready at {:?}", config.database.path);
        println!("Admin user #{} <{}> created.", user.id, user.email);
        println!("API token (shown once): {}", token);
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts and the default workflow.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), HireError> {
    let store = config.open_store()?;
    let counts = log_and_default(store.status(), "status counts");
    let default = log_and_default(store.default_workflow(), "default workflow");

    if json_mode {
        let output = serde_json::json!({
            "database": config.database.path.to_string_lossy(),
            "backend": config.database.backend.to_string(),
            "counts": counts,
            "defaultWorkflow": default.as_ref().map(|d| &d.workflow),
        });
        print_json(&output);
        return Ok(());
    }

    println!("hiretrack Status");
    println!("================");
    println!("Database: {:?}", config.database.path);
    println!("Backend:  {}", config.database.backend);
    println!();
    println!("Workflows:  {}", counts.workflows);
    println!("Stages:     {}", counts.stages);
    println!("Positions:  {}", counts.positions);
    println!("Candidates: {}", counts.candidates);
    println!("Interviews: {}", counts.interviews);
    println!("Feedback:   {}", counts.feedback);
    println!("Users:      {}", counts.users);
    println!();
    match default {
        Some(detail) => println!(
            "Default workflow: #{} {} ({} stages)",
            detail.workflow.id,
            detail.workflow.name,
            detail.stages.len()
        ),
        None => println!("Default workflow: none"),
    }
    Ok(())
}

// =============================================================================
// COMPACT COMMAND
// =============================================================================

pub fn cmd_compact(config: &AppConfig) -> Result<(), HireError> {
    if config.database.backend == Backend::Memory {
        println!("Nothing to compact for the memory backend");
        return Ok(());
    }
    let mut store = config.open_store()?;
    let compacted = store.compact()?;
    tracing::info!(compacted, "Compaction finished");
    println!(
        "{}",
        if compacted {
            "Database compacted"
        } else {
            "Database already compact"
        }
    );
    Ok(())
}

// =============================================================================
// USER COMMANDS
// =============================================================================

pub fn cmd_user(config: &AppConfig, json_mode: bool, command: UserCommand) -> Result<(), HireError> {
    let store = config.open_store()?;

    match command {
        UserCommand::Add { name, email, role } => {
            operator_may(Action::Create, Resource::User)?;
            let (user, token) = store.create_user(UserInput { name, email, role })?;
            if json_mode {
                print_json(&CreatedUser {
                    user: &user,
                    api_token: &token,
                });
            } else {
                println!("User #{} {} <{}> [{}]", user.id, user.name, user.email, user.role);
                println!("API token (shown once): {}", token);
            }
        }
        UserCommand::List => {
            operator_may(Action::Read, Resource::User)?;
            let users = store.list_users()?;
            if json_mode {
                print_json(&users);
            } else if users.is_empty() {
                println!("No users");
            } else {
                for user in &users {
                    println!(
                        "#{:<4} {:<12} {} <{}>",
                        user.id.0,
                        user.role.as_str(),
                        user.name,
                        user.email
                    );
                }
            }
        }
        UserCommand::Token { id } => {
            operator_may(Action::Update, Resource::User)?;
            let token = store.rotate_token(UserId(id))?;
            if json_mode {
                print_json(&serde_json::json!({ "id": id, "apiToken": token }));
            } else {
                println!("New API token for user #{}: {}", id, token);
            }
        }
    }
    Ok(())
}

// =============================================================================
// WORKFLOW COMMANDS
// =============================================================================

fn print_workflow(detail: &WorkflowDetail) {
    let marker = if detail.workflow.is_default {
        " (default)"
    } else {
        ""
    };
    println!("#{} {}{}", detail.workflow.id, detail.workflow.name, marker);
    print_stages(&detail.stages, "  ");
}

fn print_stages(stages: &[Stage], indent: &str) {
    if stages.is_empty() {
        println!("{}(no stages)", indent);
    }
    for stage in stages {
        println!("{}{}. {} [#{}]", indent, stage.order, stage.name, stage.id);
    }
}

pub fn cmd_workflow(
    config: &AppConfig,
    json_mode: bool,
    command: WorkflowCommand,
) -> Result<(), HireError> {
    let store = config.open_store()?;

    match command {
        WorkflowCommand::List => {
            operator_may(Action::Read, Resource::Workflow)?;
            let workflows = log_and_default(store.list_workflows(), "workflow list");
            if json_mode {
                print_json(&workflows);
            } else if workflows.is_empty() {
                println!("No workflows");
            } else {
                workflows.iter().for_each(print_workflow);
            }
        }
        WorkflowCommand::Create {
            name,
            description,
            stages,
            default,
        } => {
            operator_may(Action::Create, Resource::Workflow)?;
            let detail = store.create_workflow(WorkflowInput {
                name,
                description,
                is_default: default,
                stages: stages.into_iter().map(StageInput::new).collect(),
            })?;
            if json_mode {
                print_json(&detail);
            } else {
                print_workflow(&detail);
            }
        }
        WorkflowCommand::Default { id } => {
            operator_may(Action::Update, Resource::Workflow)?;
            let workflow = store.set_default(WorkflowId(id))?;
            if json_mode {
                print_json(&workflow);
            } else {
                println!("#{} {} is now the default workflow", workflow.id, workflow.name);
            }
        }
    }
    Ok(())
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

pub fn cmd_stages(config: &AppConfig, json_mode: bool, args: &StagesArgs) -> Result<(), HireError> {
    operator_may(Action::Read, Resource::Stage)?;
    let store = config.open_store()?;

    let stages = match (args.position, args.workflow) {
        (Some(position), _) => store.resolve_stages(PositionId(position))?,
        (None, Some(workflow)) => store.list_stages(WorkflowId(workflow))?,
        (None, None) => return Err(HireError::invalid("stages", "pass --position or --workflow")),
    };

    if json_mode {
        print_json(&stages);
    } else {
        print_stages(&stages, "");
    }
    Ok(())
}
