//! # Users
//!
//! Accounts, roles and API tokens.
//!
//! Tokens are opaque random strings kept in their own table, so a `User`
//! record can be returned anywhere without leaking credentials.

use crate::input::clean;
use crate::interviews::remove_interviewer;
use crate::storage::{
    Bytes, FEEDBACK, INTERVIEWS, NOTES, Record, Store, USER_TOKENS, USERS, next_id, put, require,
    scan,
};
use crate::{Feedback, HireError, Note, User, UserId, UserInput, UserUpdate};
use chrono::Utc;
use redb::ReadableTable;
use uuid::Uuid;

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Reject an email already used by another account (case-insensitive).
fn check_unique_email(
    users: &impl ReadableTable<u64, Bytes>,
    email: &str,
    except: Option<UserId>,
) -> Result<(), HireError> {
    let taken = scan::<User>(users)?
        .iter()
        .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email));
    if taken {
        Err(HireError::invalid("email", "is already in use"))
    } else {
        Ok(())
    }
}

impl Store {
    /// Create a user and issue its first API token.
    ///
    /// The token is returned exactly once; store it on the caller's side.
    pub fn create_user(&self, input: UserInput) -> Result<(User, String), HireError> {
        input.validate()?;
        let email = clean(&input.email);

        let (user, token) = self.write(|txn| {
            let mut users = txn.open_table(USERS)?;
            check_unique_email(&users, &email, None)?;

            let user = User {
                id: UserId(next_id(txn, User::KIND)?),
                name: clean(&input.name),
                email: email.clone(),
                role: input.role,
                created_at: Utc::now(),
            };
            put(&mut users, &user)?;

            let token = new_token();
            let mut tokens = txn.open_table(USER_TOKENS)?;
            tokens.insert(user.id.0, token.as_str())?;
            Ok((user, token))
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok((user, token))
    }

    pub fn get_user(&self, id: UserId) -> Result<User, HireError> {
        self.read(|txn| require(&txn.open_table(USERS)?, id.0))
    }

    /// Every user, sorted by name then id.
    pub fn list_users(&self) -> Result<Vec<User>, HireError> {
        let mut users: Vec<User> = self.read(|txn| scan(&txn.open_table(USERS)?))?;
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    pub fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, HireError> {
        update.validate()?;

        let user = self.write(|txn| {
            let mut users = txn.open_table(USERS)?;
            let mut user: User = require(&users, id.0)?;

            if let Some(email) = &update.email {
                let email = clean(email);
                check_unique_email(&users, &email, Some(id))?;
                user.email = email;
            }
            if let Some(name) = &update.name {
                user.name = clean(name);
            }
            if let Some(role) = update.role {
                user.role = role;
            }
            put(&mut users, &user)?;
            Ok(user)
        })?;

        tracing::info!(user_id = %id, role = %user.role, "User updated");
        Ok(user)
    }

    /// Delete a user.
    ///
    /// The user leaves every interviewer list; feedback and notes it wrote
    /// are kept without an author.
    pub fn delete_user(&self, id: UserId) -> Result<(), HireError> {
        self.write(|txn| {
            let mut users = txn.open_table(USERS)?;
            require::<User>(&users, id.0)?;
            users.remove(id.0)?;
            let mut tokens = txn.open_table(USER_TOKENS)?;
            tokens.remove(id.0)?;

            let now = Utc::now();
            remove_interviewer(&mut txn.open_table(INTERVIEWS)?, id, now)?;

            let mut feedback = txn.open_table(FEEDBACK)?;
            for mut entry in scan::<Feedback>(&feedback)? {
                if entry.author_id == Some(id) {
                    entry.author_id = None;
                    put(&mut feedback, &entry)?;
                }
            }

            let mut notes = txn.open_table(NOTES)?;
            for mut note in scan::<Note>(&notes)? {
                if note.author_id == Some(id) {
                    note.author_id = None;
                    put(&mut notes, &note)?;
                }
            }
            Ok(())
        })?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Replace a user's API token. The old token stops working immediately.
    pub fn rotate_token(&self, id: UserId) -> Result<String, HireError> {
        let token = self.write(|txn| {
            require::<User>(&txn.open_table(USERS)?, id.0)?;
            let token = new_token();
            let mut tokens = txn.open_table(USER_TOKENS)?;
            tokens.insert(id.0, token.as_str())?;
            Ok(token)
        })?;
        tracing::info!(user_id = %id, "API token rotated");
        Ok(token)
    }

    /// Every user paired with its current API token.
    ///
    /// Used by the server to authenticate bearer tokens.
    pub fn user_credentials(&self) -> Result<Vec<(User, String)>, HireError> {
        self.read(|txn| {
            let users = txn.open_table(USERS)?;
            let tokens = txn.open_table(USER_TOKENS)?;
            let mut credentials = Vec::new();
            for user in scan::<User>(&users)? {
                if let Some(token) = tokens.get(user.id.0)? {
                    let token = token.value().to_string();
                    credentials.push((user, token));
                }
            }
            Ok(credentials)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CandidateInput, FeedbackInput, InterviewInput, NoteInput, PositionInput,
        Recommendation, Role,
    };

    fn input(name: &str, email: &str, role: Role) -> UserInput {
        UserInput {
            name: name.to_string(),
            email: email.to_string(),
            role,
        }
    }

    #[test]
    fn create_issues_a_token() {
        let store = Store::in_memory().expect("store");
        let (user, token) = store
            .create_user(input("Ada", "ada@example.com", Role::Manager))
            .expect("create");
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let credentials = store.user_credentials().expect("credentials");
        assert_eq!(credentials, vec![(user, token)]);
    }

    #[test]
    fn duplicate_email_rejected() {
        let store = Store::in_memory().expect("store");
        store
            .create_user(input("Ada", "ada@example.com", Role::Admin))
            .expect("first");
        let err = store
            .create_user(input("Ada Two", "ADA@example.com", Role::User))
            .expect_err("duplicate");
        assert!(matches!(err, HireError::Validation(_)));
    }

    #[test]
    fn rotate_replaces_token() {
        let store = Store::in_memory().expect("store");
        let (user, old) = store
            .create_user(input("Ada", "ada@example.com", Role::Admin))
            .expect("create");
        let new = store.rotate_token(user.id).expect("rotate");
        assert_ne!(old, new);
        assert_eq!(store.user_credentials().expect("credentials")[0].1, new);
    }

    #[test]
    fn update_role_and_keep_own_email() {
        let store = Store::in_memory().expect("store");
        let (user, _) = store
            .create_user(input("Ada", "ada@example.com", Role::User))
            .expect("create");
        let updated = store
            .update_user(
                user.id,
                UserUpdate {
                    email: Some("ada@example.com".to_string()),
                    role: Some(Role::Interviewer),
                    ..UserUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.role, Role::Interviewer);
    }

    #[test]
    fn delete_detaches_authored_records() {
        let store = Store::in_memory().expect("store");
        let (user, _) = store
            .create_user(input("Linus", "linus@example.com", Role::Interviewer))
            .expect("user");
        let position = store
            .create_position(PositionInput::new("SRE"))
            .expect("position");
        let candidate = store
            .create_candidate(CandidateInput::new("Ada", "ada@example.com"))
            .expect("candidate");
        let interview = store
            .create_interview(InterviewInput {
                candidate_id: candidate.id,
                position_id: position.id,
                stage_id: None,
                scheduled_at: Utc::now(),
                duration_minutes: None,
                location: None,
                interviewer_ids: vec![user.id],
            })
            .expect("interview");
        let feedback = store
            .submit_feedback(
                interview.id,
                Some(user.id),
                FeedbackInput {
                    recommendation: Recommendation::StrongHire,
                    rating: 5,
                    comments: None,
                    skills: vec![],
                },
            )
            .expect("feedback");
        store
            .add_note(
                candidate.id,
                Some(user.id),
                NoteInput {
                    content: "Ping recruiter".to_string(),
                },
            )
            .expect("note");

        store.delete_user(user.id).expect("delete");

        assert!(store.get_interview(interview.id).expect("interview").interviewer_ids.is_empty());
        assert_eq!(
            store.get_feedback(feedback.feedback.id).expect("feedback").feedback.author_id,
            None
        );
        assert_eq!(store.list_notes(candidate.id).expect("notes")[0].author_id, None);
        assert!(store.user_credentials().expect("credentials").is_empty());
    }
}
