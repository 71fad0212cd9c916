//! # Limits
//!
//! Hardcoded bounds enforced by input validation.
//!
//! These are compiled into the binary and are immutable at runtime.
//! Everything a caller can send is bounded by one of them.

/// Maximum length (in characters) of names and titles.
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum length (in characters) of descriptions and comments.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum length (in characters) of a candidate note.
pub const MAX_NOTE_LENGTH: usize = 10_000;

/// Maximum number of stages a single workflow may hold.
pub const MAX_STAGES_PER_WORKFLOW: usize = 50;

/// Maximum number of interviewers assigned to one interview.
pub const MAX_INTERVIEWERS: usize = 10;

/// Maximum number of skill assessments attached to one feedback entry.
pub const MAX_SKILLS_PER_FEEDBACK: usize = 25;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// Shortest interview slot, in minutes.
pub const MIN_INTERVIEW_MINUTES: u32 = 15;

/// Longest interview slot, in minutes.
pub const MAX_INTERVIEW_MINUTES: u32 = 480;

/// Interview length used until Settings say otherwise.
pub const DEFAULT_INTERVIEW_MINUTES: u32 = 60;
