//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way: snake_case
//! field names, IDs and datetimes in MongoDB's own formats.

pub mod admin;
pub mod ballot;
pub mod candidate;
pub mod position;
pub mod voter;
pub mod window;
