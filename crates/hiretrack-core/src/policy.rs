//! # Authorization Policy
//!
//! One table answers every "may this role do that?" question.
//! Handlers and CLI commands call [`authorize`] before touching the store;
//! no role check lives anywhere else.

use crate::{HireError, Role, User, UserId};
use std::fmt;

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// What the caller wants to do it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Workflow,
    Stage,
    Position,
    Candidate,
    Interview,
    Feedback,
    Note,
    User,
    Settings,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Workflow => "workflows",
            Self::Stage => "stages",
            Self::Position => "positions",
            Self::Candidate => "candidates",
            Self::Interview => "interviews",
            Self::Feedback => "feedback",
            Self::Note => "notes",
            Self::User => "users",
            Self::Settings => "settings",
        };
        f.write_str(name)
    }
}

/// An authenticated caller.
///
/// `user_id` is `None` only for the bootstrap admin configured on the server,
/// which has no user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub role: Role,
}

impl Actor {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            role: user.role,
        }
    }

    pub const fn bootstrap_admin() -> Self {
        Self {
            user_id: None,
            role: Role::Admin,
        }
    }
}

/// The role/action/resource matrix.
#[must_use]
pub const fn allows(role: Role, action: Action, resource: Resource) -> bool {
    use Action::{Create, Delete, Read, Update};
    use Role::{Admin, Interviewer, Manager};

    match (resource, action) {
        (Resource::Workflow | Resource::Stage, Read) => true,
        (Resource::Workflow | Resource::Stage, _) => matches!(role, Admin),

        (Resource::Position | Resource::Candidate, Read) => true,
        (Resource::Position | Resource::Candidate, Create | Update) => {
            matches!(role, Admin | Manager)
        }
        (Resource::Position | Resource::Candidate, Delete) => matches!(role, Admin),

        (Resource::Interview, Read) => true,
        (Resource::Interview, _) => matches!(role, Admin | Manager),

        (Resource::Feedback, Read | Create) => matches!(role, Admin | Manager | Interviewer),
        (Resource::Feedback, Update | Delete) => matches!(role, Admin | Manager),

        (Resource::Note, Read) => true,
        (Resource::Note, Create) => matches!(role, Admin | Manager | Interviewer),
        (Resource::Note, Update | Delete) => matches!(role, Admin | Manager),

        (Resource::User, Read) => matches!(role, Admin | Manager),
        (Resource::User, _) => matches!(role, Admin),

        (Resource::Settings, Read) => true,
        (Resource::Settings, Update) => matches!(role, Admin),
        (Resource::Settings, Create | Delete) => false,
    }
}

/// Check an optional caller against the matrix.
///
/// # Errors
///
/// - `Unauthenticated` when there is no caller
/// - `Forbidden` when the caller's role is not allowed
pub fn authorize(actor: Option<&Actor>, action: Action, resource: Resource) -> Result<Actor, HireError> {
    let actor = actor.copied().ok_or(HireError::Unauthenticated)?;
    if allows(actor.role, action, resource) {
        Ok(actor)
    } else {
        Err(HireError::Forbidden(format!(
            "role {} may not {} {}",
            actor.role, action, resource
        )))
    }
}
