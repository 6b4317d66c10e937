use thiserror::Error;

/// Errors returned by the credential and task stores.
///
/// `InvalidCredential` deliberately covers both an unknown username and a
/// wrong password so callers cannot tell the two apart.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record for the requested username already exists.
    #[error("user already exists")]
    UserExists,
    /// Unknown user or wrong password.
    #[error("invalid username or password")]
    InvalidCredential,
    /// Any failure reported by the storage engine.
    #[error("storage failure")]
    StorageIo(#[from] rusqlite::Error),
    /// The storage directory could not be prepared.
    #[error("failed to prepare storage directory")]
    Io(#[from] std::io::Error),
    /// A persisted record could not be encoded or decoded.
    #[error("malformed persisted record")]
    Serialization(#[from] serde_json::Error),
    /// The password could not be hashed.
    #[error("could not hash password")]
    Hashing(#[from] bcrypt::BcryptError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credential_message_does_not_name_the_cause() {
        let message = StoreError::InvalidCredential.to_string();

        assert_eq!(message, "invalid username or password");
    }

    #[test]
    fn storage_errors_keep_their_source() {
        use std::error::Error as _;

        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);

        assert!(matches!(err, StoreError::StorageIo(_)));
        assert!(err.source().is_some());
    }
}
