//! Credentials handed to the relay by its caller.
//!
//! The relay treats the secret as opaque. Issuing and storing keys is not its
//! job; a [`CredentialProvider`] supplies one per session.

use std::fmt;

use zeroize::Zeroize;

use super::base::{RealtimeError, RealtimeResult};

/// Secret plus optional system instructions for one relay session.
#[derive(Clone)]
pub struct Credential {
    secret: String,
    instructions: Option<String>,
}

impl Credential {
    /// Build a credential, rejecting an absent or blank secret.
    pub fn new(secret: impl Into<String>, instructions: Option<String>) -> RealtimeResult<Self> {
        let mut secret = secret.into();
        if secret.trim().is_empty() {
            secret.zeroize();
            return Err(RealtimeError::MissingCredential);
        }

        Ok(Self {
            secret,
            instructions: instructions.filter(|i| !i.trim().is_empty()),
        })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Value for a bearer `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.secret)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"<redacted>")
            .field("instructions", &self.instructions)
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Source of credentials for new relay sessions.
pub trait CredentialProvider: Send + Sync {
    /// Produce the credential for one session.
    ///
    /// Fails with [`RealtimeError::MissingCredential`] when no secret is
    /// available. Callers surface that error and do not retry.
    fn credential(&self, instructions: Option<String>) -> RealtimeResult<Credential>;
}

/// Provider backed by a key loaded from server configuration.
pub struct ConfigCredentialProvider {
    api_key: Option<String>,
}

impl ConfigCredentialProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }
}

impl CredentialProvider for ConfigCredentialProvider {
    fn credential(&self, instructions: Option<String>) -> RealtimeResult<Credential> {
        let secret = self
            .api_key
            .as_deref()
            .ok_or(RealtimeError::MissingCredential)?;
        Credential::new(secret, instructions)
    }
}

impl Drop for ConfigCredentialProvider {
    fn drop(&mut self) {
        if let Some(ref mut key) = self.api_key {
            key.zeroize();
        }
    }
}
