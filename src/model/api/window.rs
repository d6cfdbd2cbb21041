use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::window::WindowConfig;

/// The externally-visible view of the window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub voting_start_time: DateTime<Utc>,
    pub voting_end_time: DateTime<Utc>,
    pub login_duration_minutes: u32,
    pub voting_active: bool,
}

impl From<WindowConfig> for WindowView {
    fn from(config: WindowConfig) -> Self {
        Self {
            voting_start_time: config.voting_start_time,
            voting_end_time: config.voting_end_time,
            login_duration_minutes: config.login_duration_minutes,
            voting_active: config.voting_active,
        }
    }
}
