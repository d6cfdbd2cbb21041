use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core data of a candidate, attached to exactly one position by name.
///
/// `candidate_id` is the externally-visible numeric ID, allocated from the
/// global atomic counter; it is unique across all positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub candidate_id: u32,
    pub name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub image: String,
    /// The name of the position this candidate stands for.
    pub position: String,
}

impl CandidateCore {
    pub fn new(candidate_id: u32, name: String, position: String) -> Self {
        Self {
            candidate_id,
            name: name.trim().to_string(),
            nickname: String::new(),
            department: String::new(),
            level: String::new(),
            image: String::new(),
            position: position.trim().to_string(),
        }
    }
}

/// A candidate without a database ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique database ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}
