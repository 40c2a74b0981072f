use std::fmt;
use std::fs::read_to_string;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::Deserialize;

use crate::config::Config;
use crate::error::SessionError;

/// Bearer token plus its expiry, handed explicitly to whatever talks to Graph.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct SessionContext {
    pub access_token: String,
    pub expires_on: DateTime<Utc>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("access_token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

impl SessionContext {
    pub fn new(access_token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_on,
        }
    }

    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Duration {
        self.expires_on - now
    }

    /// Zero or negative remaining lifetime counts as expired.
    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.access_token.trim().is_empty() {
            return Err(SessionError::Missing);
        }
        if self.remaining_lifetime(now) <= Duration::zero() {
            return Err(SessionError::Expired {
                expired_at: self.expires_on,
            });
        }
        Ok(())
    }

    /// Environment first (`GRAPH_ACCESS_TOKEN` + `GRAPH_TOKEN_EXPIRES_ON`),
    /// then the token cache file named by the config.
    pub fn load(config: &Config) -> Result<Option<Self>, SessionError> {
        if let Some(session) = Self::from_lookup(|key| std::env::var(key).ok())? {
            info!("Using access token from environment");
            return Ok(Some(session));
        }
        match config.token_file_path() {
            Some(path) => Self::read_token_file(&path),
            None => Ok(None),
        }
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Option<Self>, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(token) = lookup("GRAPH_ACCESS_TOKEN") else {
            return Ok(None);
        };
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        let expires_on = lookup("GRAPH_TOKEN_EXPIRES_ON").ok_or_else(|| {
            SessionError::Invalid("GRAPH_TOKEN_EXPIRES_ON must accompany GRAPH_ACCESS_TOKEN".into())
        })?;
        let expires_on = DateTime::parse_from_rfc3339(expires_on.trim())
            .map_err(|e| SessionError::Invalid(format!("GRAPH_TOKEN_EXPIRES_ON: {e}")))?
            .with_timezone(&Utc);
        Ok(Some(Self::new(token, expires_on)))
    }

    pub fn read_token_file(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            debug!("No token cache at {}", path.display());
            return Ok(None);
        }
        let content = read_to_string(path)
            .map_err(|e| SessionError::Invalid(format!("{}: {e}", path.display())))?;
        let mut session = serde_json::from_str::<SessionContext>(&content)
            .map_err(|e| SessionError::Invalid(format!("{}: {e}", path.display())))?;
        session.access_token = session.access_token.trim().to_string();
        if session.access_token.is_empty() {
            return Ok(None);
        }
        info!("Loaded access token from {}", path.display());
        Ok(Some(session))
    }
}

/// Precondition gate for every remote call.
pub(crate) fn require_active(
    session: Option<&SessionContext>,
    now: DateTime<Utc>,
) -> Result<&SessionContext, SessionError> {
    let session = session.ok_or(SessionError::Missing)?;
    session.ensure_active(now)?;
    Ok(session)
}
