use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use converter_core::SessionUser;
use converter_engine::{write_atomic, PersistError};
use converter_logging::{converter_info, converter_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SESSION_FILENAME: &str = "session.ron";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("failed to serialize session: {0}")]
    Serialize(String),
    #[error("failed to write session: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to remove session file {path:?}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// External authentication collaborator consumed by the session guard.
pub trait AuthProvider {
    fn current_user(&self) -> Option<SessionUser>;
    fn sign_in(&self, username: &str) -> Result<SessionUser, SessionError>;
    fn sign_out(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    username: String,
    signed_in_utc: String,
}

/// Local stand-in for the auth provider: one RON file holding the signed-in user.
pub struct FileSessionStore {
    dir: PathBuf,
    ttl: Duration,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf, ttl_hours: u32) -> Self {
        Self {
            dir,
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILENAME)
    }

    fn load(&self) -> Option<PersistedSession> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                converter_warn!("Failed to read session from {:?}: {}", path, err);
                return None;
            }
        };
        match ron::from_str(&content) {
            Ok(session) => Some(session),
            Err(err) => {
                converter_warn!("Failed to parse session from {:?}: {}", path, err);
                None
            }
        }
    }

    fn current_user_at(&self, now: DateTime<Utc>) -> Option<SessionUser> {
        let session = self.load()?;
        let signed_in = match DateTime::parse_from_rfc3339(&session.signed_in_utc) {
            Ok(at) => at.with_timezone(&Utc),
            Err(err) => {
                converter_warn!("Ignoring session with bad timestamp: {}", err);
                return None;
            }
        };
        if now.signed_duration_since(signed_in) > self.ttl {
            converter_info!("Session for {} expired", session.username);
            return None;
        }
        Some(SessionUser {
            username: session.username,
            signed_in_utc: session.signed_in_utc,
        })
    }

    fn write(&self, session: &PersistedSession) -> Result<(), SessionError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(session, pretty)
            .map_err(|err| SessionError::Serialize(err.to_string()))?;
        write_atomic(&self.dir, SESSION_FILENAME, &content)?;
        Ok(())
    }
}

impl AuthProvider for FileSessionStore {
    fn current_user(&self) -> Option<SessionUser> {
        self.current_user_at(Utc::now())
    }

    fn sign_in(&self, username: &str) -> Result<SessionUser, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        let session = PersistedSession {
            username: username.to_string(),
            signed_in_utc: Utc::now().to_rfc3339(),
        };
        self.write(&session)?;
        converter_info!("Signed in as {}", session.username);
        Ok(SessionUser {
            username: session.username,
            signed_in_utc: session.signed_in_utc,
        })
    }

    fn sign_out(&self) -> Result<(), SessionError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                converter_info!("Signed out; removed {:?}", path);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Remove { path, source }),
        }
    }
}
