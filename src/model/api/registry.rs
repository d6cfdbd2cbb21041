//! Request/response DTOs for the position/candidate registry.

use serde::{Deserialize, Serialize};

use crate::model::db::{
    candidate::CandidateCore,
    position::{NewPosition, PositionCore},
};

/// A request to create a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSpec {
    pub position: String,
    #[serde(default)]
    pub allow_multiple: bool,
}

impl From<PositionSpec> for NewPosition {
    fn from(spec: PositionSpec) -> Self {
        NewPosition::new(spec.position, spec.allow_multiple)
    }
}

/// The externally-visible view of a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub position: String,
    pub allow_multiple: bool,
    pub active: bool,
}

impl From<PositionCore> for PositionView {
    fn from(position: PositionCore) -> Self {
        Self {
            position: position.name,
            allow_multiple: position.allow_multiple,
            active: position.active,
        }
    }
}

/// A request to create a candidate for an existing position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub image: String,
}

impl CandidateSpec {
    /// Build the candidate with its allocated numeric ID.
    pub fn into_candidate(self, candidate_id: u32) -> CandidateCore {
        CandidateCore {
            nickname: self.nickname,
            department: self.department,
            level: self.level,
            image: self.image,
            ..CandidateCore::new(candidate_id, self.name, self.position)
        }
    }
}

/// The externally-visible view of a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    pub id: u32,
    pub name: String,
    pub nickname: String,
    pub department: String,
    pub level: String,
    pub image: String,
    pub position: String,
}

impl From<CandidateCore> for CandidateView {
    fn from(candidate: CandidateCore) -> Self {
        Self {
            id: candidate.candidate_id,
            name: candidate.name,
            nickname: candidate.nickname,
            department: candidate.department,
            level: candidate.level,
            image: candidate.image,
            position: candidate.position,
        }
    }
}

/// A position together with its candidates, as served to the ballot UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCandidates {
    pub position: String,
    pub allow_multiple: bool,
    pub candidates: Vec<CandidateView>,
}

impl PositionCandidates {
    /// Group candidates under their active positions, positions ordered by
    /// name and candidates by ID.
    pub fn group(positions: &[PositionCore], candidates: &[CandidateCore]) -> Vec<Self> {
        let mut positions: Vec<_> = positions.iter().filter(|p| p.active).collect();
        positions.sort_by(|a, b| a.name.cmp(&b.name));
        let mut candidates: Vec<_> = candidates.iter().collect();
        candidates.sort_by_key(|c| c.candidate_id);

        positions
            .into_iter()
            .map(|position| Self {
                position: position.name.clone(),
                allow_multiple: position.allow_multiple,
                candidates: candidates
                    .iter()
                    .filter(|c| c.position == position.name)
                    .map(|c| CandidateView::from((*c).clone()))
                    .collect(),
            })
            .collect()
    }
}
