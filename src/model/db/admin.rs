use std::ops::{Deref, DerefMut};

use argon2::Config as Argon2Config;
use mongodb::error::Error as DbError;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::api::admin::AdminCredentials;
use crate::model::mongodb::{Coll, Id};
use crate::Config;

/// Core admin user data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub username: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create an AdminCore is via
        // From<AdminCredentials>, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

impl From<AdminCredentials> for AdminCore {
    /// Convert [`AdminCredentials`] to a new [`AdminCore`] by hashing the password.
    fn from(cred: AdminCredentials) -> Self {
        // 16 bytes of salt is the recommendation for argon2.
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(cred.password.as_bytes(), &salt, &Argon2Config::default())
                .unwrap(); // Safe because the default `Config` is valid.
        Self {
            username: cred.username,
            password_hash,
        }
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Ensure at least one admin exists, bootstrapping the default admin from the
/// application config on first launch.
pub async fn ensure_admin_exists(
    admins: &Coll<NewAdmin>,
    config: &Config,
) -> Result<(), DbError> {
    let count = admins.count_documents(None, None).await?;
    if count == 0 {
        info!(
            "No admins found, creating default admin '{}'",
            config.default_admin_username()
        );
        let admin: NewAdmin = AdminCredentials {
            username: config.default_admin_username().to_string(),
            password: config.default_admin_password().to_string(),
        }
        .into();
        admins.insert_one(admin, None).await?;
    }
    Ok(())
}
