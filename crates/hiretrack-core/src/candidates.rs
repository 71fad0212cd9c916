//! # Candidates & Notes
//!
//! Deleting a candidate removes its notes and its interviews (with their
//! feedback) in one transaction.

use crate::input::{clean, clean_opt};
use crate::interviews::delete_interviews_where;
use crate::storage::{
    CANDIDATES, NOTES, POSITIONS, Record, Store, next_id, put, require, require_ref, scan,
};
use crate::{
    Candidate, CandidateId, CandidateInput, CandidateUpdate, HireError, Note, NoteId, NoteInput,
    Position, PositionId, UserId,
};
use chrono::Utc;
use redb::WriteTransaction;

fn check_position(txn: &WriteTransaction, id: Option<PositionId>) -> Result<(), HireError> {
    if let Some(id) = id {
        require_ref::<Position>(&txn.open_table(POSITIONS)?, id.0, "positionId")?;
    }
    Ok(())
}

impl Store {
    pub fn create_candidate(&self, input: CandidateInput) -> Result<Candidate, HireError> {
        input.validate()?;

        let candidate = self.write(|txn| {
            check_position(txn, input.position_id)?;
            let now = Utc::now();
            let candidate = Candidate {
                id: CandidateId(next_id(txn, Candidate::KIND)?),
                name: clean(&input.name),
                email: clean(&input.email),
                phone: clean_opt(input.phone.as_deref()),
                resume_url: clean_opt(input.resume_url.as_deref()),
                position_id: input.position_id,
                status: input.status.unwrap_or_default(),
                created_at: now,
                updated_at: now,
            };
            put(&mut txn.open_table(CANDIDATES)?, &candidate)?;
            Ok(candidate)
        })?;

        tracing::info!(candidate_id = %candidate.id, "Candidate created");
        Ok(candidate)
    }

    pub fn get_candidate(&self, id: CandidateId) -> Result<Candidate, HireError> {
        self.read(|txn| require(&txn.open_table(CANDIDATES)?, id.0))
    }

    /// Every candidate, newest first.
    pub fn list_candidates(&self) -> Result<Vec<Candidate>, HireError> {
        let mut candidates: Vec<Candidate> =
            self.read(|txn| scan(&txn.open_table(CANDIDATES)?))?;
        candidates.reverse();
        Ok(candidates)
    }

    pub fn update_candidate(
        &self,
        id: CandidateId,
        update: CandidateUpdate,
    ) -> Result<Candidate, HireError> {
        update.validate()?;

        self.write(|txn| {
            let mut candidates = txn.open_table(CANDIDATES)?;
            let mut candidate: Candidate = require(&candidates, id.0)?;

            if let Some(position_id) = update.position_id {
                check_position(txn, position_id)?;
                candidate.position_id = position_id;
            }
            if let Some(name) = &update.name {
                candidate.name = clean(name);
            }
            if let Some(email) = &update.email {
                candidate.email = clean(email);
            }
            if let Some(phone) = &update.phone {
                candidate.phone = clean_opt(phone.as_deref());
            }
            if let Some(resume_url) = &update.resume_url {
                candidate.resume_url = clean_opt(resume_url.as_deref());
            }
            if let Some(status) = update.status {
                candidate.status = status;
            }
            candidate.updated_at = Utc::now();
            put(&mut candidates, &candidate)?;
            Ok(candidate)
        })
    }

    /// Delete a candidate with its notes, interviews and feedback.
    pub fn delete_candidate(&self, id: CandidateId) -> Result<(), HireError> {
        let (notes, interviews) = self.write(|txn| {
            let mut candidates = txn.open_table(CANDIDATES)?;
            require::<Candidate>(&candidates, id.0)?;
            candidates.remove(id.0)?;

            let mut notes = txn.open_table(NOTES)?;
            let mut removed = 0usize;
            for note in scan::<Note>(&notes)? {
                if note.candidate_id == id {
                    notes.remove(note.id.0)?;
                    removed += 1;
                }
            }

            let interviews = delete_interviews_where(txn, |i| i.candidate_id == id)?;
            Ok((removed, interviews))
        })?;

        tracing::info!(candidate_id = %id, notes, interviews, "Candidate deleted");
        Ok(())
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    pub fn add_note(
        &self,
        candidate_id: CandidateId,
        author_id: Option<UserId>,
        input: NoteInput,
    ) -> Result<Note, HireError> {
        input.validate()?;

        self.write(|txn| {
            require::<Candidate>(&txn.open_table(CANDIDATES)?, candidate_id.0)?;
            let note = Note {
                id: NoteId(next_id(txn, Note::KIND)?),
                candidate_id,
                author_id,
                content: clean(&input.content),
                created_at: Utc::now(),
            };
            put(&mut txn.open_table(NOTES)?, &note)?;
            Ok(note)
        })
    }

    /// Notes on a candidate, oldest first.
    pub fn list_notes(&self, candidate_id: CandidateId) -> Result<Vec<Note>, HireError> {
        self.read(|txn| {
            require::<Candidate>(&txn.open_table(CANDIDATES)?, candidate_id.0)?;
            Ok(scan::<Note>(&txn.open_table(NOTES)?)?
                .into_iter()
                .filter(|n| n.candidate_id == candidate_id)
                .collect())
        })
    }

    pub fn delete_note(&self, id: NoteId) -> Result<(), HireError> {
        self.write(|txn| {
            let mut notes = txn.open_table(NOTES)?;
            require::<Note>(&notes, id.0)?;
            notes.remove(id.0)?;
            Ok(())
        })
    }
}
