//! API-compatible types: request payloads and externally-visible views,
//! serialised with camelCase field names.

pub mod admin;
pub mod ballot;
pub mod registry;
pub mod results;
pub mod voter;
pub mod window;
