//! Credential requests run off the UI loop.
//!
//! Hashing is deliberately slow, so sign-in and sign-up run on tokio's
//! blocking pool. The loop only ever sees the single [`AuthOutcome`] message
//! sent back over the channel.

use std::fmt::{Debug, Formatter};

use kanban_core::CredentialStore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

/// A validated credential form waiting to be checked against the store.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub mode: AuthMode,
    pub username: String,
    pub password: String,
}

impl Debug for AuthRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("mode", &self.mode)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { username: String },
    Failure { message: String },
}

/// Runs the request against the credential store and reports the result.
#[tracing::instrument(skip(credentials))]
pub fn run_auth(credentials: &CredentialStore, request: AuthRequest) -> AuthOutcome {
    let result = match request.mode {
        AuthMode::SignIn => credentials.authenticate_user(&request.username, &request.password),
        AuthMode::SignUp => credentials
            .create_user(&request.username, &request.password)
            .map(|()| request.username.clone()),
    };

    match result {
        Ok(username) => {
            info!("credentials accepted");
            AuthOutcome::Success { username }
        }
        Err(err) => {
            warn!("credentials rejected: {err}");
            AuthOutcome::Failure {
                message: err.to_string(),
            }
        }
    }
}

/// Runs the request on the blocking pool and sends the outcome to `results`.
pub fn spawn_auth(
    credentials: CredentialStore,
    request: AuthRequest,
    results: UnboundedSender<AuthOutcome>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let outcome = run_auth(&credentials, request);
        if results.send(outcome).is_err() {
            warn!("auth result dropped, UI loop has exited");
        }
    })
}
