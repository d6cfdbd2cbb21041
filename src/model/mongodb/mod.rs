mod bson;
mod collection;
mod counter;
mod errors;

pub use bson::Id;
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{candidate_id_counter_id, ensure_candidate_id_counter_exists, Counter};
pub use errors::is_duplicate_key_error;
