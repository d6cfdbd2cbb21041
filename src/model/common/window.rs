use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The admin-controlled voting window configuration.
///
/// This is a single global document, mutable by admins at any time (including
/// mid-session). Voter sessions treat a loaded copy as an immutable snapshot
/// and re-fetch on a polling interval, so each eligibility decision is a pure
/// function of (snapshot, login timestamp, wall clock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// When the voting window opens.
    pub voting_start_time: DateTime<Utc>,
    /// When the voting window closes.
    pub voting_end_time: DateTime<Utc>,
    /// How long a voter login session lasts, in minutes.
    pub login_duration_minutes: u32,
    /// The global admin switch: no voting while this is off.
    pub voting_active: bool,
}

impl WindowConfig {
    /// The default configuration for the day containing `now`:
    /// 06:00 to 20:00, 35-minute login sessions, voting inactive.
    pub fn default_for(now: DateTime<Utc>) -> Self {
        let day = now.date_naive();
        // Unwraps are safe: the literals are valid times.
        let start = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(20, 0, 0).unwrap();
        Self {
            voting_start_time: Utc.from_utc_datetime(&day.and_time(start)),
            voting_end_time: Utc.from_utc_datetime(&day.and_time(end)),
            login_duration_minutes: 35,
            voting_active: false,
        }
    }
}

/// A partial update to the window configuration; absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WindowConfigUpdate {
    pub voting_start_time: Option<DateTime<Utc>>,
    pub voting_end_time: Option<DateTime<Utc>>,
    pub login_duration_minutes: Option<u32>,
    pub voting_active: Option<bool>,
}

impl WindowConfig {
    /// Apply a partial update, returning the new configuration.
    pub fn updated(&self, update: WindowConfigUpdate) -> Self {
        Self {
            voting_start_time: update.voting_start_time.unwrap_or(self.voting_start_time),
            voting_end_time: update.voting_end_time.unwrap_or(self.voting_end_time),
            login_duration_minutes: update
                .login_duration_minutes
                .unwrap_or(self.login_duration_minutes),
            voting_active: update.voting_active.unwrap_or(self.voting_active),
        }
    }
}
