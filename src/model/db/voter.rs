use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core voter data, as stored in the database.
///
/// A voter record is created at first login. `has_voted` transitions
/// false -> true exactly once, via the conditional update in the ballot
/// submission service, and is never reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// The voter's unique identifier, stored lowercase.
    pub matric_number: String,
    pub full_name: String,
    pub department: String,
    pub has_voted: bool,
}

impl VoterCore {
    /// Create a new voter who has not yet voted.
    pub fn new(matric_number: String, full_name: String, department: String) -> Self {
        Self {
            // Matric numbers are case-insensitive; normalise on the way in.
            matric_number: matric_number.trim().to_lowercase(),
            full_name: full_name.trim().to_string(),
            department: department.trim().to_string(),
            has_voted: false,
        }
    }

    /// True if `other` claims this voter's matric number with different
    /// personal details. A repeat login must match the registered record;
    /// anything else is someone trying to log in as an existing voter.
    pub fn conflicts_with(&self, other: &VoterCore) -> bool {
        !self.full_name.eq_ignore_ascii_case(&other.full_name)
            || !self.department.eq_ignore_ascii_case(&other.department)
    }

    /// Mark this voter as having voted. Mirrors the conditional update used
    /// at submission: the claim succeeds iff `has_voted` was false.
    pub fn claim_vote(&mut self) -> VoteClaim {
        if self.has_voted {
            VoteClaim::AlreadyVoted
        } else {
            self.has_voted = true;
            VoteClaim::Accepted
        }
    }
}

/// The outcome of claiming a voter's single ballot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteClaim {
    Accepted,
    AlreadyVoted,
}

impl VoteClaim {
    /// Interpret the write result of the compare-and-swap update that sets
    /// `has_voted` from false to true. Exactly one of any set of concurrent
    /// submissions for the same voter observes a modified document; every
    /// other one must be rejected.
    pub fn from_modified_count(modified_count: u64) -> Self {
        if modified_count == 1 {
            Self::Accepted
        } else {
            Self::AlreadyVoted
        }
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterCore {
        pub fn example() -> Self {
            Self::new(
                "FS/19/0123".to_string(),
                "Amina Bello".to_string(),
                "Biochemistry".to_string(),
            )
        }
    }

    impl Voter {
        pub fn example() -> Self {
            Self {
                id: Id::new(),
                voter: VoterCore::example(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matric_number_is_normalised() {
        let voter = VoterCore::new(
            "  FS/19/0123 ".to_string(),
            "Amina Bello ".to_string(),
            " Biochemistry".to_string(),
        );
        assert_eq!(voter.matric_number, "fs/19/0123");
        assert_eq!(voter.full_name, "Amina Bello");
        assert_eq!(voter.department, "Biochemistry");
        assert!(!voter.has_voted);
    }

    #[test]
    fn repeat_login_conflicts_iff_details_differ() {
        let registered = VoterCore::example();

        // Same details modulo case and whitespace.
        let same = VoterCore::new(
            "fs/19/0123".to_string(),
            " amina bello".to_string(),
            "BIOCHEMISTRY".to_string(),
        );
        assert!(!registered.conflicts_with(&same));

        let wrong_name = VoterCore::new(
            "fs/19/0123".to_string(),
            "Bola Ade".to_string(),
            "Biochemistry".to_string(),
        );
        assert!(registered.conflicts_with(&wrong_name));

        let wrong_department = VoterCore::new(
            "fs/19/0123".to_string(),
            "Amina Bello".to_string(),
            "Microbiology".to_string(),
        );
        assert!(registered.conflicts_with(&wrong_department));
    }

    #[test]
    fn vote_claim_succeeds_exactly_once() {
        let mut voter = VoterCore::example();
        assert_eq!(voter.claim_vote(), VoteClaim::Accepted);
        assert!(voter.has_voted);
        // A duplicate submission finds the slot taken.
        assert_eq!(voter.claim_vote(), VoteClaim::AlreadyVoted);
        assert!(voter.has_voted);
    }

    #[test]
    fn unmodified_conditional_update_means_already_voted() {
        // The `has_voted: false` filter matched and flipped the flag.
        assert_eq!(VoteClaim::from_modified_count(1), VoteClaim::Accepted);
        // The filter matched nothing: a concurrent submission won the race.
        assert_eq!(VoteClaim::from_modified_count(0), VoteClaim::AlreadyVoted);
    }
}
