use serde::{Deserialize, Serialize};

use crate::model::db::voter::{NewVoter, Voter};

/// A voter login request; registers the voter on first login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterLoginRequest {
    pub matric_number: String,
    pub full_name: String,
    pub department: String,
}

impl VoterLoginRequest {
    /// Field validation: the matric number must be 6 to 15 characters of
    /// letters, digits, and slashes (e.g. "FS/19/0123"), and the name and
    /// department non-empty after trimming.
    pub fn is_valid(&self) -> bool {
        let matric = self.matric_number.trim();
        (6..=15).contains(&matric.len())
            && matric
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '/')
            && !self.full_name.trim().is_empty()
            && !self.department.trim().is_empty()
    }
}

impl From<VoterLoginRequest> for NewVoter {
    fn from(req: VoterLoginRequest) -> Self {
        NewVoter::new(req.matric_number, req.full_name, req.department)
    }
}

/// The externally-visible view of a voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterView {
    pub id: String,
    pub matric_number: String,
    pub full_name: String,
    pub department: String,
    pub has_voted: bool,
}

impl From<Voter> for VoterView {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id.to_string(),
            matric_number: voter.voter.matric_number,
            full_name: voter.voter.full_name,
            department: voter.voter.department,
            has_voted: voter.voter.has_voted,
        }
    }
}
