//! The tally/results engine.
//!
//! Results are recomputed from the stored ballots on every read; with a
//! bounded electorate there is no need for a persisted aggregate. The
//! computation is a pure single pass per position over a read snapshot,
//! so recomputing over an unchanged ballot set is idempotent up to
//! `last_updated`.

use std::collections::HashMap;

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::db::{
    ballot::BallotCore,
    candidate::CandidateCore,
    position::PositionCore,
    voter::Voter,
};

/// One candidate's standing within a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub id: u32,
    pub name: String,
    pub nickname: String,
    pub department: String,
    pub level: String,
    pub votes: u64,
    /// Share of the position's ballots, to one decimal place; 0 when the
    /// position received no ballots.
    pub percentage: f64,
}

/// The ranked results for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResult {
    pub position: String,
    pub allow_multiple: bool,
    /// The number of ballots containing an entry for this position; each
    /// ballot counts once however many candidates it selected.
    pub total_votes: u64,
    /// Candidates ranked by descending vote count; ties retain candidate-ID
    /// order (the sort is stable over candidates loaded in ID order).
    pub candidates: Vec<CandidateResult>,
    /// The top-ranked candidate, or `None` for a position without candidates.
    pub winner: Option<CandidateResult>,
}

/// Aggregate statistics across the whole election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_voters: u64,
    pub total_candidates: u64,
    pub total_positions: u64,
    /// Ballots per department of the casting voter.
    pub department_stats: HashMap<String, u64>,
    /// Ballots per hour-of-day of submission, keyed `"H:00"` in the tallying
    /// process's local timezone.
    pub hourly_votes: HashMap<String, u64>,
}

/// A timestamped snapshot of the full election results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSnapshot {
    pub positions: Vec<PositionResult>,
    pub statistics: Statistics,
    pub last_updated: DateTime<Utc>,
}

impl ResultsSnapshot {
    /// Compute the results snapshot from a consistent read of the stores.
    ///
    /// Active positions are tallied in name order. Selections for candidates
    /// that no longer exist are ignored rather than failing the tally, since
    /// admins may delete candidates after ballots referencing them were cast.
    pub fn compute(
        positions: &[PositionCore],
        candidates: &[CandidateCore],
        ballots: &[BallotCore],
        voters: &[Voter],
        now: DateTime<Utc>,
    ) -> Self {
        let mut active: Vec<_> = positions.iter().filter(|p| p.active).collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));

        let position_results = active.iter().map(|position| {
            // Candidates in ID order; stable sorting below then makes the
            // tie-break deterministic (ascending candidate ID).
            let mut standing: Vec<_> = candidates
                .iter()
                .filter(|c| c.position == position.name)
                .collect();
            standing.sort_by_key(|c| c.candidate_id);

            let mut counts: HashMap<u32, u64> =
                standing.iter().map(|c| (c.candidate_id, 0)).collect();
            let mut total_votes = 0u64;
            for ballot in ballots {
                if let Some(entry) = ballot.entry_for(&position.name) {
                    // Once per ballot, regardless of selection size.
                    total_votes += 1;
                    for candidate_id in &entry.candidate_ids {
                        if let Some(count) = counts.get_mut(candidate_id) {
                            *count += 1;
                        }
                    }
                }
            }

            let mut ranked: Vec<CandidateResult> = standing
                .iter()
                .map(|candidate| {
                    let votes = counts[&candidate.candidate_id];
                    CandidateResult {
                        id: candidate.candidate_id,
                        name: candidate.name.clone(),
                        nickname: candidate.nickname.clone(),
                        department: candidate.department.clone(),
                        level: candidate.level.clone(),
                        votes,
                        percentage: percentage(votes, total_votes),
                    }
                })
                .collect();
            ranked.sort_by(|a, b| b.votes.cmp(&a.votes));

            PositionResult {
                position: position.name.clone(),
                allow_multiple: position.allow_multiple,
                total_votes,
                winner: ranked.first().cloned(),
                candidates: ranked,
            }
        });
        let position_results: Vec<_> = position_results.collect();

        // Each voter casts at most one ballot, so the ballot count is the
        // number of distinct voters who voted.
        let departments: HashMap<_, _> = voters
            .iter()
            .map(|voter| (voter.id, voter.department.clone()))
            .collect();
        let mut department_stats: HashMap<String, u64> = HashMap::new();
        let mut hourly_votes: HashMap<String, u64> = HashMap::new();
        for ballot in ballots {
            if let Some(department) = departments.get(&ballot.voter_id) {
                *department_stats.entry(department.clone()).or_default() += 1;
            }
            let hour = ballot.submitted_at.with_timezone(&Local).hour();
            *hourly_votes.entry(format!("{hour}:00")).or_default() += 1;
        }

        Self {
            positions: position_results,
            statistics: Statistics {
                total_voters: ballots.len() as u64,
                total_candidates: candidates.len() as u64,
                total_positions: active.len() as u64,
                department_stats,
                hourly_votes,
            },
            last_updated: now,
        }
    }
}

/// Vote share to one decimal place; 0 when there are no ballots.
fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let share = votes as f64 / total as f64 * 100.0;
    (share * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use log4rs_test_utils::test_logging::init_logging_once_for;

    use super::*;
    use crate::model::db::voter::VoterCore;

    fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 17, 10, 15, 0).unwrap()
    }

    fn secretary_registry() -> (Vec<PositionCore>, Vec<CandidateCore>) {
        (
            vec![PositionCore::example_single()],
            vec![
                CandidateCore::example(1, "Ada", "Secretary"),
                CandidateCore::example(2, "Bola", "Secretary"),
            ],
        )
    }

    #[test]
    fn secretary_three_to_one() {
        init_logging_once_for(["facvote_backend"], None, None);
        let (positions, candidates) = secretary_registry();
        let ballots = vec![
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
            BallotCore::example(&[("Secretary", &[2])], submitted_at()),
        ];

        let snapshot =
            ResultsSnapshot::compute(&positions, &candidates, &ballots, &[], Utc::now());
        let secretary = &snapshot.positions[0];
        assert_eq!(secretary.total_votes, 4);
        assert_eq!(secretary.candidates[0].id, 1);
        assert_eq!(secretary.candidates[0].votes, 3);
        assert_eq!(secretary.candidates[0].percentage, 75.0);
        assert_eq!(secretary.candidates[1].id, 2);
        assert_eq!(secretary.candidates[1].votes, 1);
        assert_eq!(secretary.candidates[1].percentage, 25.0);
        assert_eq!(secretary.winner.as_ref().unwrap().name, "Ada");
        assert_eq!(snapshot.statistics.total_voters, 4);
    }

    #[test]
    fn multi_select_counts_ballot_once_and_each_candidate() {
        let positions = vec![PositionCore::example_multiple()];
        let candidates = vec![
            CandidateCore::example(3, "Chidi", "Senate Representative"),
            CandidateCore::example(4, "Dayo", "Senate Representative"),
            CandidateCore::example(5, "Efe", "Senate Representative"),
        ];
        let ballots = vec![
            BallotCore::example(&[("Senate Representative", &[3, 4])], submitted_at()),
            BallotCore::example(&[("Senate Representative", &[4])], submitted_at()),
        ];

        let snapshot =
            ResultsSnapshot::compute(&positions, &candidates, &ballots, &[], Utc::now());
        let senate = &snapshot.positions[0];
        assert_eq!(senate.total_votes, 2);
        let votes: HashMap<u32, u64> =
            senate.candidates.iter().map(|c| (c.id, c.votes)).collect();
        assert_eq!(votes[&3], 1);
        assert_eq!(votes[&4], 2);
        assert_eq!(votes[&5], 0);
        // Percentages are of ballots, not of selections: 50% + 100% + 0%.
        assert_eq!(senate.winner.as_ref().unwrap().id, 4);
    }

    #[test]
    fn ties_rank_by_candidate_id() {
        let (positions, candidates) = secretary_registry();
        let ballots = vec![
            BallotCore::example(&[("Secretary", &[2])], submitted_at()),
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
        ];
        let snapshot =
            ResultsSnapshot::compute(&positions, &candidates, &ballots, &[], Utc::now());
        let ranked: Vec<u32> = snapshot.positions[0]
            .candidates
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ranked, vec![1, 2]);
        assert_eq!(snapshot.positions[0].winner.as_ref().unwrap().id, 1);
    }

    #[test]
    fn zero_candidates_means_no_winner() {
        let positions = vec![PositionCore::example_single()];
        let snapshot = ResultsSnapshot::compute(&positions, &[], &[], &[], Utc::now());
        assert!(snapshot.positions[0].candidates.is_empty());
        assert!(snapshot.positions[0].winner.is_none());
    }

    #[test]
    fn zero_ballots_means_zero_totals_and_percentages() {
        let (positions, candidates) = secretary_registry();
        let snapshot = ResultsSnapshot::compute(&positions, &candidates, &[], &[], Utc::now());
        let secretary = &snapshot.positions[0];
        assert_eq!(secretary.total_votes, 0);
        assert!(secretary.candidates.iter().all(|c| c.percentage == 0.0));
        assert!(secretary.winner.is_some());
    }

    #[test]
    fn single_select_percentages_sum_to_hundred() {
        let (positions, candidates) = secretary_registry();
        let ballots = vec![
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
            BallotCore::example(&[("Secretary", &[2])], submitted_at()),
        ];
        let snapshot =
            ResultsSnapshot::compute(&positions, &candidates, &ballots, &[], Utc::now());
        let sum: f64 = snapshot.positions[0]
            .candidates
            .iter()
            .map(|c| c.percentage)
            .sum();
        assert!((sum - 100.0).abs() < 0.2, "sum was {sum}");
    }

    #[test]
    fn inactive_positions_are_excluded() {
        let (mut positions, candidates) = secretary_registry();
        positions[0].active = false;
        let snapshot = ResultsSnapshot::compute(&positions, &candidates, &[], &[], Utc::now());
        assert!(snapshot.positions.is_empty());
        assert_eq!(snapshot.statistics.total_positions, 0);
    }

    #[test]
    fn recomputation_is_idempotent_up_to_timestamp() {
        let (positions, candidates) = secretary_registry();
        let ballots = vec![
            BallotCore::example(&[("Secretary", &[1])], submitted_at()),
            BallotCore::example(&[("Secretary", &[2])], submitted_at()),
        ];
        let now = Utc::now();
        let first = ResultsSnapshot::compute(&positions, &candidates, &ballots, &[], now);
        let second = ResultsSnapshot::compute(&positions, &candidates, &ballots, &[], now);
        assert_eq!(first, second);
    }

    #[test]
    fn department_and_hourly_histograms() {
        let (positions, candidates) = secretary_registry();
        let voter_a = Voter {
            id: crate::model::mongodb::Id::new(),
            voter: VoterCore::new("a/1".into(), "A".into(), "Biochemistry".into()),
        };
        let voter_b = Voter {
            id: crate::model::mongodb::Id::new(),
            voter: VoterCore::new("b/2".into(), "B".into(), "Microbiology".into()),
        };
        let voter_c = Voter {
            id: crate::model::mongodb::Id::new(),
            voter: VoterCore::new("c/3".into(), "C".into(), "Biochemistry".into()),
        };

        let first_hour = submitted_at();
        let second_hour = submitted_at() + Duration::hours(1);
        let ballots = vec![
            BallotCore::new(voter_a.id, "a/1".into(), vec![], first_hour),
            BallotCore::new(voter_b.id, "b/2".into(), vec![], first_hour),
            BallotCore::new(voter_c.id, "c/3".into(), vec![], second_hour),
        ];
        let voters = vec![voter_a, voter_b, voter_c];

        let snapshot =
            ResultsSnapshot::compute(&positions, &candidates, &ballots, &voters, Utc::now());
        let stats = &snapshot.statistics;
        assert_eq!(stats.department_stats["Biochemistry"], 2);
        assert_eq!(stats.department_stats["Microbiology"], 1);

        // Hour keys follow the process-local timezone, matching the
        // submission timestamps converted the same way.
        let first_key = format!("{}:00", first_hour.with_timezone(&Local).hour());
        let second_key = format!("{}:00", second_hour.with_timezone(&Local).hour());
        assert_eq!(stats.hourly_votes[&first_key], 2);
        assert_eq!(stats.hourly_votes[&second_key], 1);
        assert_eq!(stats.hourly_votes.values().sum::<u64>(), 3);
    }
}
