//! Admin authentication. The desk only needs sign-in, session lookup and
//! sign-out; whoever backs them is behind [`AuthProvider`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("auth provider failure: {reason}")]
    Provider { reason: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct AuthSession {
    pub token: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

pub trait AuthProvider {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    fn get_session(&self, token: &str) -> Option<AuthSession>;
    fn sign_out(&mut self, token: &str);
}

/// Fixed set of operator accounts for tests and local runs.
///
/// Passwords are kept as unsalted SHA-256 digests, which is not fit for real
/// credentials; production deployments plug a hosted provider in behind
/// [`AuthProvider`].
#[derive(Debug, Default)]
pub struct InMemoryAuth {
    users: HashMap<String, [u8; 32]>,
    sessions: HashMap<String, AuthSession>,
}

impl InMemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        self.users
            .insert(normalize_email(email), password_digest(password));
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl AuthProvider for InMemoryAuth {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        match self.users.get(&email) {
            Some(digest) if digests_match(digest, &password_digest(password)) => {
                let session = AuthSession {
                    token: Uuid::new_v4().simple().to_string(),
                    email,
                    signed_in_at: Utc::now(),
                };
                self.sessions.insert(session.token.clone(), session.clone());
                Ok(session)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    fn get_session(&self, token: &str) -> Option<AuthSession> {
        self.sessions.get(token).cloned()
    }

    fn sign_out(&mut self, token: &str) {
        self.sessions.remove(token);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

/// Compares every byte regardless of where the first difference is.
fn digests_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
