use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core data of an electable position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCore {
    /// The position name; unique among positions.
    pub name: String,
    /// Whether a ballot may select more than one candidate for this position.
    pub allow_multiple: bool,
    /// Inactive positions are hidden from ballots and results.
    pub active: bool,
}

impl PositionCore {
    pub fn new(name: String, allow_multiple: bool) -> Self {
        Self {
            name: name.trim().to_string(),
            allow_multiple,
            active: true,
        }
    }
}

/// A position without an ID.
pub type NewPosition = PositionCore;

/// A position from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub position: PositionCore,
}

impl Deref for Position {
    type Target = PositionCore;

    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl DerefMut for Position {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.position
    }
}
