//! The session eligibility state machine.
//!
//! A voter session moves through `AwaitingWindow -> Voting -> Submitted`,
//! with `Expired` reachable from either of the first two as soon as any
//! expiry condition holds. The decision is a pure function of a window
//! configuration snapshot, the session's login timestamp and the current
//! wall clock; clients re-evaluate it on a fixed tick and the server
//! re-derives it authoritatively at submission time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::window::WindowConfig;

/// Why a session may no longer vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpiryReason {
    /// The admin has switched voting off.
    VotingDisabled,
    /// The voting window has ended.
    WindowEnded,
    /// The login session outlived the configured duration.
    LoginTimeout,
}

/// The eligibility of a voter session.
///
/// `LoggedOut` has no representation here: a request without a valid session
/// token never reaches eligibility evaluation. `Submitted` is attached by the
/// caller once the voter's ballot is known to exist, since it depends on the
/// voter record rather than on the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Eligibility {
    /// The window has not opened yet.
    #[serde(rename_all = "camelCase")]
    AwaitingWindow { opens_at: DateTime<Utc> },
    /// Ballot casting is currently permitted; `closes_at` is the earlier of
    /// the window end and the login deadline.
    #[serde(rename_all = "camelCase")]
    Voting { closes_at: DateTime<Utc> },
    /// The voter has cast their ballot. Terminal.
    Submitted,
    /// The session is over; re-authentication is required. Terminal for the
    /// session, but `has_voted` is untouched, so a fresh login may still
    /// succeed while a window remains.
    Expired { reason: ExpiryReason },
}

impl Eligibility {
    /// Evaluate eligibility from a window snapshot, the login timestamp and
    /// the current time.
    ///
    /// When several expiry conditions hold at once, the reported reason is
    /// the earliest-applicable one: the admin switch dominates, and between
    /// the login deadline and the window end, whichever fell first wins.
    pub fn evaluate(window: &WindowConfig, login_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if !window.voting_active {
            return Self::Expired {
                reason: ExpiryReason::VotingDisabled,
            };
        }

        let login_deadline = login_at + Duration::minutes(window.login_duration_minutes.into());
        let window_over = now > window.voting_end_time;
        let login_over = now > login_deadline;
        match (window_over, login_over) {
            (true, true) => Self::Expired {
                reason: if login_deadline < window.voting_end_time {
                    ExpiryReason::LoginTimeout
                } else {
                    ExpiryReason::WindowEnded
                },
            },
            (true, false) => Self::Expired {
                reason: ExpiryReason::WindowEnded,
            },
            (false, true) => Self::Expired {
                reason: ExpiryReason::LoginTimeout,
            },
            (false, false) => {
                if now < window.voting_start_time {
                    Self::AwaitingWindow {
                        opens_at: window.voting_start_time,
                    }
                } else {
                    Self::Voting {
                        closes_at: window.voting_end_time.min(login_deadline),
                    }
                }
            }
        }
    }

    /// Does this state permit casting a ballot right now?
    pub fn permits_casting(&self) -> bool {
        matches!(self, Self::Voting { .. })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn window_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 17, 6, 0, 0).unwrap()
    }

    /// Active window, login at the window start.
    fn active_window() -> WindowConfig {
        WindowConfig::example_active(window_start())
    }

    #[test]
    fn voting_iff_active_within_window_and_session() {
        let window = active_window();
        let login_at = window_start() + Duration::minutes(10);

        // All three conditions hold.
        let now = login_at + Duration::minutes(5);
        assert!(Eligibility::evaluate(&window, login_at, now).permits_casting());

        // Admin switch off.
        let disabled = WindowConfig {
            voting_active: false,
            ..window.clone()
        };
        assert_eq!(
            Eligibility::evaluate(&disabled, login_at, now),
            Eligibility::Expired {
                reason: ExpiryReason::VotingDisabled
            }
        );

        // Before the window.
        let early = window_start() - Duration::minutes(1);
        assert_eq!(
            Eligibility::evaluate(&window, early, early),
            Eligibility::AwaitingWindow {
                opens_at: window_start()
            }
        );

        // After the window (login fresh enough).
        let late_login = window.voting_end_time - Duration::minutes(5);
        let late = window.voting_end_time + Duration::minutes(1);
        assert_eq!(
            Eligibility::evaluate(&window, late_login, late),
            Eligibility::Expired {
                reason: ExpiryReason::WindowEnded
            }
        );
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let window = active_window();
        let login_at = window_start();
        assert!(Eligibility::evaluate(&window, login_at, window.voting_start_time)
            .permits_casting());
        let end_login = window.voting_end_time - Duration::minutes(1);
        assert!(
            Eligibility::evaluate(&window, end_login, window.voting_end_time).permits_casting()
        );
    }

    #[test]
    fn login_timeout_expires_session_before_window_end() {
        // Window of 2h, login duration 35min, login at T+10min:
        // T+44min is still within the session, T+46min is not.
        let window = active_window();
        let login_at = window_start() + Duration::minutes(10);

        let at_44 = window_start() + Duration::minutes(44);
        assert_eq!(
            Eligibility::evaluate(&window, login_at, at_44),
            Eligibility::Voting {
                closes_at: login_at + Duration::minutes(35)
            }
        );

        let at_46 = window_start() + Duration::minutes(46);
        assert!(at_46 < window.voting_end_time);
        assert_eq!(
            Eligibility::evaluate(&window, login_at, at_46),
            Eligibility::Expired {
                reason: ExpiryReason::LoginTimeout
            }
        );
    }

    #[test]
    fn simultaneous_expiry_reports_earliest_deadline() {
        let window = active_window();

        // Login deadline fell before the window end.
        let login_at = window_start();
        let now = window.voting_end_time + Duration::minutes(1);
        assert_eq!(
            Eligibility::evaluate(&window, login_at, now),
            Eligibility::Expired {
                reason: ExpiryReason::LoginTimeout
            }
        );

        // Window end fell before the login deadline.
        let login_at = window.voting_end_time - Duration::minutes(1);
        assert_eq!(
            Eligibility::evaluate(&window, login_at, now),
            Eligibility::Expired {
                reason: ExpiryReason::WindowEnded
            }
        );
    }

    #[test]
    fn login_timeout_applies_even_before_window_opens() {
        let window = active_window();
        let login_at = window_start() - Duration::hours(2);
        let now = window_start() - Duration::minutes(30);
        assert_eq!(
            Eligibility::evaluate(&window, login_at, now),
            Eligibility::Expired {
                reason: ExpiryReason::LoginTimeout
            }
        );
    }

    #[test]
    fn voting_closes_at_earlier_of_window_end_and_login_deadline() {
        let window = active_window();

        // Fresh login near the end of the window: window end caps the session.
        let login_at = window.voting_end_time - Duration::minutes(5);
        match Eligibility::evaluate(&window, login_at, login_at) {
            Eligibility::Voting { closes_at } => assert_eq!(closes_at, window.voting_end_time),
            other => panic!("expected Voting, got {other:?}"),
        }

        // Early login: the login deadline caps the session.
        let login_at = window_start();
        match Eligibility::evaluate(&window, login_at, login_at) {
            Eligibility::Voting { closes_at } => {
                assert_eq!(closes_at, login_at + Duration::minutes(35))
            }
            other => panic!("expected Voting, got {other:?}"),
        }
    }
}
