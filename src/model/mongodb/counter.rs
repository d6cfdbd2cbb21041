use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::{Coll, Id};

use super::errors::is_duplicate_key_error;

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: Id,
    pub next: u32,
}

impl Counter {
    /// Create a new `Counter` starting at the given value, optionally specifying the ID to use.
    pub fn new(id: impl Into<Option<Id>>, start: u32) -> Self {
        let id = id.into().unwrap_or_else(Id::new);
        Self { id, next: start }
    }

    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: Id) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(id.as_doc(), update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {}", id),
                )
            })?;
        Ok(counter.next)
    }
}

/// The well-known ID of the global candidate ID counter.
///
/// Candidate IDs are allocated from a single sequence rather than by scanning
/// for the current maximum, which would race under concurrent creation.
pub fn candidate_id_counter_id() -> Id {
    Id::from_bytes(*b"candidateid!")
}

/// Ensure the global candidate ID counter exists, starting at 1.
///
/// This operation is idempotent: a concurrent launch losing the insert race
/// is fine, since the counter is then known to exist.
pub async fn ensure_candidate_id_counter_exists(counters: &Coll<Counter>) -> Result<()> {
    let counter = Counter::new(candidate_id_counter_id(), 1);
    match counters.insert_one(counter, None).await {
        Ok(_) => Ok(()),
        Err(err) if is_duplicate_key_error(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
