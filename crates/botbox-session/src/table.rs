//! One-time secret→id authentication table.
//!
//! Built once per match from the list of agent ids, handed to the
//! client manager, and consumed as agents connect. Each secret
//! authenticates exactly one connection; a second attempt with the same
//! secret is rejected, and an unrecognized secret is rejected without
//! affecting any other agent's registration — validation must complete
//! before a connection is ever counted as registered, not after.

use std::collections::HashMap;

use crate::{Secret, SessionError};

/// Maps each agent id to its issued secret, and authenticates incoming
/// connections against that mapping.
pub struct SecretTable {
    /// Secret → agent id, removed once consumed so a secret can never
    /// authenticate a second connection.
    pending: HashMap<String, String>,
}

impl SecretTable {
    /// Issues one fresh secret per id. Returns the id→secret mapping so
    /// the caller can inject each secret into its matching container's
    /// environment.
    pub fn issue(
        ids: &[String],
    ) -> Result<(Self, HashMap<String, Secret>), SessionError> {
        let mut pending = HashMap::with_capacity(ids.len());
        let mut issued = HashMap::with_capacity(ids.len());

        for id in ids {
            let secret = Secret::generate()?;
            pending.insert(secret.as_str().to_string(), id.clone());
            issued.insert(id.clone(), secret);
        }

        Ok((Self { pending }, issued))
    }

    /// Builds a table from already-issued id/secret pairs, the shape a
    /// game server process receives them in (`BOTBOX_IDS`/`BOTBOX_SECRETS`
    /// environment variables) rather than generating its own.
    pub fn from_pairs(ids: &[String], secrets: &[String]) -> Self {
        let pending = secrets
            .iter()
            .cloned()
            .zip(ids.iter().cloned())
            .collect();
        Self { pending }
    }

    /// Validates a secret and consumes it, returning the agent id it
    /// was issued for.
    ///
    /// # Errors
    /// [`SessionError::InvalidSecret`] if the secret is missing or was
    /// already consumed by an earlier connection.
    pub fn authenticate(&mut self, secret: &str) -> Result<String, SessionError> {
        self.pending
            .remove(secret)
            .ok_or_else(|| SessionError::InvalidSecret)
    }

    /// Number of secrets that have not yet been consumed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
