//! The mongodb crate doesn't provide error code constants; this module fills
//! in the gaps we need.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a duplicate key write error.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    if let ErrorKind::Write(WriteFailure::WriteError(ref e)) = *err.kind {
        return e.code == DUPLICATE_KEY;
    }
    false
}
