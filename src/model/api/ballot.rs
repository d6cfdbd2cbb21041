use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::db::{
    ballot::{Ballot, VoteEntry},
    candidate::CandidateCore,
    position::PositionCore,
};

/// A selection for one position: a bare candidate ID or a list of them.
/// Single-select clients send the bare form; both are accepted for either
/// kind of position, with arity enforced during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    One(u32),
    Many(Vec<u32>),
}

impl Selection {
    fn candidate_ids(&self) -> Vec<u32> {
        match self {
            Self::One(id) => vec![*id],
            Self::Many(ids) => ids.clone(),
        }
    }
}

/// A request to cast a ballot: the voter's complete position -> candidate(s)
/// selection set. The map form guarantees at most one entry per position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastBallotRequest {
    pub votes: HashMap<String, Selection>,
}

/// Ways a ballot can fail shape validation, each a distinct signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallotFault {
    #[error("Ballot is missing a selection for position '{0}'")]
    IncompleteBallot(String),
    #[error("Position '{0}' does not exist or is not open for voting")]
    UnknownPosition(String),
    #[error("Candidate {candidate_id} does not stand for position '{position}'")]
    InvalidCandidate { position: String, candidate_id: u32 },
    #[error("Candidate {candidate_id} selected more than once for position '{position}'")]
    DuplicateCandidate { position: String, candidate_id: u32 },
    #[error("Position '{position}' requires exactly one selection, got {chosen}")]
    SingleSelectArity { position: String, chosen: usize },
    #[error("Position '{position}' requires at least one selection")]
    EmptySelection { position: String },
}

impl CastBallotRequest {
    /// Validate the ballot shape against the registry and convert it into
    /// storable vote entries, ordered by position name.
    ///
    /// Every active position with at least one candidate must be present;
    /// every selected candidate must stand for its position; single-select
    /// positions take exactly one candidate and multi-select ones at least
    /// one, without repeats. An uncontested position cannot be voted on and
    /// is not required, so it never blocks the rest of the ballot.
    pub fn into_vote_entries(
        self,
        positions: &[PositionCore],
        candidates: &[CandidateCore],
    ) -> Result<Vec<VoteEntry>, BallotFault> {
        let mut active: Vec<_> = positions.iter().filter(|p| p.active).collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));

        // Reject entries for positions that are not open for voting.
        for name in self.votes.keys() {
            if !active.iter().any(|p| &p.name == name) {
                return Err(BallotFault::UnknownPosition(name.clone()));
            }
        }

        let mut entries = Vec::with_capacity(active.len());
        for position in active {
            let standing: Vec<_> = candidates
                .iter()
                .filter(|c| c.position == position.name)
                .collect();
            let selection = match self.votes.get(&position.name) {
                Some(selection) => selection,
                None if standing.is_empty() => continue,
                None => return Err(BallotFault::IncompleteBallot(position.name.clone())),
            };
            let candidate_ids = selection.candidate_ids();

            if candidate_ids.is_empty() {
                return Err(BallotFault::EmptySelection {
                    position: position.name.clone(),
                });
            }
            if !position.allow_multiple && candidate_ids.len() != 1 {
                return Err(BallotFault::SingleSelectArity {
                    position: position.name.clone(),
                    chosen: candidate_ids.len(),
                });
            }

            let mut seen = HashSet::new();
            for &candidate_id in &candidate_ids {
                if !standing.iter().any(|c| c.candidate_id == candidate_id) {
                    return Err(BallotFault::InvalidCandidate {
                        position: position.name.clone(),
                        candidate_id,
                    });
                }
                if !seen.insert(candidate_id) {
                    return Err(BallotFault::DuplicateCandidate {
                        position: position.name.clone(),
                        candidate_id,
                    });
                }
            }

            entries.push(VoteEntry {
                position: position.name.clone(),
                candidate_ids,
            });
        }

        Ok(entries)
    }
}

/// The response to a successfully cast ballot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastBallotResponse {
    pub submitted_at: DateTime<Utc>,
}

/// One stored vote entry, as served to the admin review page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntryView {
    pub position: String,
    pub candidate_ids: Vec<u32>,
}

/// A stored ballot, as served to the admin review page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotView {
    pub matric_number: String,
    pub votes: Vec<VoteEntryView>,
    pub submitted_at: DateTime<Utc>,
}

impl From<Ballot> for BallotView {
    fn from(ballot: Ballot) -> Self {
        Self {
            matric_number: ballot.ballot.matric_number,
            votes: ballot
                .ballot
                .votes
                .into_iter()
                .map(|entry| VoteEntryView {
                    position: entry.position,
                    candidate_ids: entry.candidate_ids,
                })
                .collect(),
            submitted_at: ballot.ballot.submitted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Vec<PositionCore>, Vec<CandidateCore>) {
        let positions = vec![
            PositionCore::example_single(),    // "Secretary"
            PositionCore::example_multiple(),  // "Senate Representative"
        ];
        let candidates = vec![
            CandidateCore::example(1, "Ada", "Secretary"),
            CandidateCore::example(2, "Bola", "Secretary"),
            CandidateCore::example(3, "Chidi", "Senate Representative"),
            CandidateCore::example(4, "Dayo", "Senate Representative"),
        ];
        (positions, candidates)
    }

    fn request(votes: &[(&str, Selection)]) -> CastBallotRequest {
        CastBallotRequest {
            votes: votes
                .iter()
                .map(|(position, selection)| (position.to_string(), selection.clone()))
                .collect(),
        }
    }

    #[test]
    fn valid_ballot_converts_in_position_order() {
        let (positions, candidates) = registry();
        let entries = request(&[
            ("Senate Representative", Selection::Many(vec![3, 4])),
            ("Secretary", Selection::One(1)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].position, "Secretary");
        assert_eq!(entries[0].candidate_ids, vec![1]);
        assert_eq!(entries[1].position, "Senate Representative");
        assert_eq!(entries[1].candidate_ids, vec![3, 4]);
    }

    #[test]
    fn bare_and_listed_single_selections_are_equivalent() {
        let (positions, candidates) = registry();
        let bare = request(&[
            ("Secretary", Selection::One(2)),
            ("Senate Representative", Selection::One(3)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap();
        let listed = request(&[
            ("Secretary", Selection::Many(vec![2])),
            ("Senate Representative", Selection::Many(vec![3])),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap();
        assert_eq!(bare, listed);
    }

    #[test]
    fn missing_active_position_is_incomplete() {
        let (positions, candidates) = registry();
        let err = request(&[("Secretary", Selection::One(1))])
            .into_vote_entries(&positions, &candidates)
            .unwrap_err();
        assert_eq!(
            err,
            BallotFault::IncompleteBallot("Senate Representative".to_string())
        );
    }

    #[test]
    fn inactive_positions_are_not_required_and_not_accepted() {
        let (mut positions, candidates) = registry();
        positions[1].active = false;

        // Not required.
        let entries = request(&[("Secretary", Selection::One(1))])
            .into_vote_entries(&positions, &candidates)
            .unwrap();
        assert_eq!(entries.len(), 1);

        // Not accepted.
        let err = request(&[
            ("Secretary", Selection::One(1)),
            ("Senate Representative", Selection::One(3)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap_err();
        assert_eq!(
            err,
            BallotFault::UnknownPosition("Senate Representative".to_string())
        );
    }

    #[test]
    fn uncontested_positions_are_not_required() {
        let (mut positions, candidates) = registry();
        positions.push(PositionCore::new("Treasurer".to_string(), false));

        // A position nobody stands for does not block the ballot.
        let entries = request(&[
            ("Secretary", Selection::One(1)),
            ("Senate Representative", Selection::One(3)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap();
        assert_eq!(entries.len(), 2);

        // An explicit entry for it still cannot name a valid candidate.
        let err = request(&[
            ("Secretary", Selection::One(1)),
            ("Senate Representative", Selection::One(3)),
            ("Treasurer", Selection::One(9)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap_err();
        assert_eq!(
            err,
            BallotFault::InvalidCandidate {
                position: "Treasurer".to_string(),
                candidate_id: 9,
            }
        );
    }

    #[test]
    fn candidate_must_stand_for_the_position() {
        let (positions, candidates) = registry();
        let err = request(&[
            ("Secretary", Selection::One(3)), // Chidi stands for Senate Rep.
            ("Senate Representative", Selection::One(4)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap_err();
        assert_eq!(
            err,
            BallotFault::InvalidCandidate {
                position: "Secretary".to_string(),
                candidate_id: 3,
            }
        );
    }

    #[test]
    fn single_select_takes_exactly_one() {
        let (positions, candidates) = registry();
        let err = request(&[
            ("Secretary", Selection::Many(vec![1, 2])),
            ("Senate Representative", Selection::One(3)),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap_err();
        assert_eq!(
            err,
            BallotFault::SingleSelectArity {
                position: "Secretary".to_string(),
                chosen: 2,
            }
        );
    }

    #[test]
    fn empty_and_duplicate_selections_are_rejected() {
        let (positions, candidates) = registry();
        let err = request(&[
            ("Secretary", Selection::One(1)),
            ("Senate Representative", Selection::Many(vec![])),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap_err();
        assert_eq!(
            err,
            BallotFault::EmptySelection {
                position: "Senate Representative".to_string(),
            }
        );

        let (positions, candidates) = registry();
        let err = request(&[
            ("Secretary", Selection::One(1)),
            ("Senate Representative", Selection::Many(vec![3, 3])),
        ])
        .into_vote_entries(&positions, &candidates)
        .unwrap_err();
        assert_eq!(
            err,
            BallotFault::DuplicateCandidate {
                position: "Senate Representative".to_string(),
                candidate_id: 3,
            }
        );
    }

    #[test]
    fn selection_accepts_both_json_forms() {
        let bare: Selection = rocket::serde::json::serde_json::from_str("7").unwrap();
        assert_eq!(bare, Selection::One(7));
        let listed: Selection = rocket::serde::json::serde_json::from_str("[7, 8]").unwrap();
        assert_eq!(listed, Selection::Many(vec![7, 8]));
    }
}
