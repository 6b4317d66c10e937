//! User accounts: creation with unique usernames and password checks.
//!
//! Records live under `user:<username>` and hold the bcrypt hash string of the
//! user's password.

use tracing::{info, warn};

use crate::error::StoreError;
use crate::kv::KvStore;

pub use bcrypt::DEFAULT_COST;

/// Lowest bcrypt cost the hasher accepts. Tests hash with it to stay fast.
pub const MIN_COST: u32 = 4;

/// Longest password that can be hashed without truncation.
///
/// bcrypt only reads 72 bytes including a trailing NUL. Longer passwords are
/// rejected instead of silently sharing a hash with their 71-byte prefix.
pub const MAX_PASSWORD_BYTES: usize = 71;

fn user_key(username: &str) -> String {
    format!("user:{username}")
}

/// Creates and authenticates users.
#[derive(Clone)]
pub struct CredentialStore {
    kv: KvStore,
    cost: u32,
}

impl CredentialStore {
    /// Creates a store that hashes with bcrypt's default cost.
    pub fn new(kv: KvStore) -> Self {
        Self::with_cost(kv, DEFAULT_COST)
    }

    /// Creates a store that hashes with the given bcrypt cost.
    ///
    /// Costs below bcrypt's minimum are raised to the minimum.
    pub fn with_cost(kv: KvStore, cost: u32) -> Self {
        Self {
            kv,
            cost: cost.max(MIN_COST),
        }
    }

    /// Creates a new user with a freshly salted password hash.
    ///
    /// The existence check and the write happen in one write transaction, so
    /// of two concurrent sign-ups for the same name exactly one succeeds.
    ///
    /// # Errors
    ///
    /// * [`StoreError::UserExists`] if the username is taken
    /// * [`StoreError::Hashing`] if the password could not be hashed, including
    ///   passwords longer than [`MAX_PASSWORD_BYTES`]
    /// * [`StoreError::StorageIo`] on any storage failure
    #[tracing::instrument(skip(self, password))]
    pub fn create_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let hashed = bcrypt::non_truncating_hash(password, self.cost)?;
        let key = user_key(username);

        self.kv.update(|txn| {
            if txn.contains(&key)? {
                return Err(StoreError::UserExists);
            }
            txn.put(&key, hashed.as_bytes())
        })?;

        info!("user created");
        Ok(())
    }

    /// Checks `password` against the stored hash for `username`.
    ///
    /// Returns the canonical username on success. An unknown user and a wrong
    /// password produce the same [`StoreError::InvalidCredential`].
    #[tracing::instrument(skip(self, password))]
    pub fn authenticate_user(&self, username: &str, password: &str) -> Result<String, StoreError> {
        let Some(stored) = self.kv.get(&user_key(username))? else {
            return Err(StoreError::InvalidCredential);
        };

        let Ok(hash) = std::str::from_utf8(&stored) else {
            warn!("stored password hash is not valid UTF-8");
            return Err(StoreError::InvalidCredential);
        };

        match bcrypt::non_truncating_verify(password, hash) {
            Ok(true) => {
                info!("user authenticated");
                Ok(username.to_string())
            }
            Ok(false) => Err(StoreError::InvalidCredential),
            Err(err) => {
                warn!("stored password hash could not be checked: {err}");
                Err(StoreError::InvalidCredential)
            }
        }
    }
}
