use chrono::Utc;
use mongodb::{bson::doc, options::ReplaceOptions};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::common::window::WindowConfig;
use crate::model::mongodb::{Coll, Id};

/// The singleton voting window configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(flatten)]
    pub config: WindowConfig,
}

impl WindowDocument {
    /// Load the current window configuration, creating and persisting the
    /// default (06:00-20:00 today, 35-minute logins, inactive) if absent.
    pub async fn load_or_create(windows: &Coll<WindowDocument>) -> Result<WindowConfig> {
        if let Some(existing) = windows.find_one(None, None).await? {
            return Ok(existing.config);
        }
        let config = WindowConfig::default_for(Utc::now());
        let document = WindowDocument {
            id: None,
            config: config.clone(),
        };
        windows.insert_one(document, None).await?;
        Ok(config)
    }

    /// Replace the singleton with the given configuration, inserting it if
    /// no configuration exists yet.
    pub async fn upsert(windows: &Coll<WindowDocument>, config: &WindowConfig) -> Result<()> {
        let document = WindowDocument {
            id: None,
            config: config.clone(),
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        windows.replace_one(doc! {}, document, options).await?;
        Ok(())
    }
}
