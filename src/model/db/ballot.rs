use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// One position's selection within a ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    /// The position name.
    pub position: String,
    /// The selected candidate IDs; exactly one for single-select positions.
    pub candidate_ids: Vec<u32>,
}

/// Core ballot data, as stored in the database.
///
/// A ballot is immutable once created, and created at most once per voter;
/// the unique index on `voter_id` backs up the `has_voted` guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotCore {
    /// The voter who cast this ballot.
    pub voter_id: Id,
    /// Denormalised copy of the voter's identifier.
    pub matric_number: String,
    /// At most one entry per position.
    pub votes: Vec<VoteEntry>,
    pub submitted_at: DateTime<Utc>,
}

impl BallotCore {
    pub fn new(
        voter_id: Id,
        matric_number: String,
        votes: Vec<VoteEntry>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            voter_id,
            matric_number,
            votes,
            submitted_at,
        }
    }

    /// The selection this ballot made for the given position, if any.
    pub fn entry_for(&self, position: &str) -> Option<&VoteEntry> {
        self.votes.iter().find(|entry| entry.position == position)
    }
}

/// A ballot without a database ID.
pub type NewBallot = BallotCore;

/// A ballot from the database, with its unique database ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub ballot: BallotCore,
}

impl Deref for Ballot {
    type Target = BallotCore;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}
