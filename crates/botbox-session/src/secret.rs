//! Per-agent match secrets.
//!
//! A [`Secret`] is issued once per client per match and carried to that
//! client's container as an environment variable (`BOTBOX_SECRET`). The
//! agent presents it back as the `Authorization` header on its websocket
//! upgrade; the client manager uses it to find out which agent id just
//! connected, without trusting anything the connection itself claims.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::TryRngCore;
use std::fmt;

use crate::SessionError;

/// Number of random bytes backing a secret. 64 bytes (512 bits) is
/// comfortably beyond what a match's lifetime makes guessable.
const SECRET_BYTES: usize = 64;

/// A URL-safe, base64-encoded random token identifying one agent for
/// the duration of one match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Secret(String);

impl Secret {
    /// Generates a new secret from the OS random number generator.
    pub fn generate() -> Result<Self, SessionError> {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().try_fill_bytes(&mut bytes).map_err(|e| {
            SessionError::EntropyUnavailable(e.to_string())
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Returns the secret's wire representation (the `Authorization`
    /// header value / `BOTBOX_SECRET` environment value).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<redacted>)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
