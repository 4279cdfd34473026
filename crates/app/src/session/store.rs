use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use snafu::{ResultExt, Snafu, ensure};
use tnai_storage::{KeyValueStore, KvWrite, StorageError};

use super::model::{RememberMarker, UserSession};

pub const REMEMBER_KEY: &str = "tnai_remember_user";
pub const SESSION_KEY: &str = "tnai_user_session";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("failed to read `{key}` on `{stage}`: {source}"))]
    ReadEntry {
        stage: &'static str,
        key: &'static str,
        source: StorageError,
    },
    #[snafu(display("failed to write session records on `{stage}`: {source}"))]
    WriteEntries {
        stage: &'static str,
        source: StorageError,
    },
    #[snafu(display("stored `{key}` is malformed on `{stage}`: {source}"))]
    MalformedEntry {
        stage: &'static str,
        key: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to encode session records on `{stage}`: {source}"))]
    EncodeEntry {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display(
        "session from {last_login_at} is older than {validity_days} days on `{stage}`"
    ))]
    Expired {
        stage: &'static str,
        last_login_at: DateTime<Utc>,
        validity_days: i64,
    },
}

/// Persists the signed-in identity across restarts.
///
/// The remember marker and the session blob live under separate keys, but every
/// write touching both goes through one `apply_batch`.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    validity_days: i64,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, validity_days: i64) -> Self {
        Self {
            storage,
            validity_days,
        }
    }

    pub fn validity_days(&self) -> i64 {
        self.validity_days
    }

    pub fn restore(&self) -> Option<UserSession> {
        self.restore_at(Utc::now())
    }

    /// Returns the stored session when both records exist and the last login is
    /// inside the validity window. Failures are logged and read as "no session".
    pub fn restore_at(&self, now: DateTime<Utc>) -> Option<UserSession> {
        match self.try_restore(now) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!(error = %error, "discarding stored session");
                if matches!(
                    error,
                    SessionError::Expired { .. } | SessionError::MalformedEntry { key: SESSION_KEY, .. }
                ) && let Err(error) = self.storage.delete(SESSION_KEY)
                {
                    tracing::warn!(error = %error, "failed to remove discarded session");
                }
                None
            }
        }
    }

    fn try_restore(&self, now: DateTime<Utc>) -> Result<Option<UserSession>, SessionError> {
        let Some(raw_marker) = self.read(REMEMBER_KEY, "restore-read-marker")? else {
            return Ok(None);
        };
        let Some(raw_session) = self.read(SESSION_KEY, "restore-read-session")? else {
            return Ok(None);
        };

        let _: RememberMarker = serde_json::from_str(&raw_marker).context(MalformedEntrySnafu {
            stage: "restore-parse-marker",
            key: REMEMBER_KEY,
        })?;
        let session: UserSession =
            serde_json::from_str(&raw_session).context(MalformedEntrySnafu {
                stage: "restore-parse-session",
                key: SESSION_KEY,
            })?;

        ensure!(
            now.signed_duration_since(session.last_login_at) <= Duration::days(self.validity_days),
            ExpiredSnafu {
                stage: "restore-check-window",
                last_login_at: session.last_login_at,
                validity_days: self.validity_days,
            }
        );

        tracing::info!(user_id = %session.id, "restored stored session");
        Ok(Some(session))
    }

    /// Stores the session and its remember marker together. Sessions without the
    /// remember flag are not written; returns whether anything was stored.
    pub fn persist(&self, session: &UserSession) -> Result<bool, SessionError> {
        if !session.remember_flag() {
            tracing::debug!(user_id = %session.id, "remember flag unset, session not persisted");
            return Ok(false);
        }

        let marker = RememberMarker {
            email: session.email.clone(),
            remember_me: true,
        };
        let marker = serde_json::to_string(&marker).context(EncodeEntrySnafu {
            stage: "persist-encode-marker",
        })?;
        let blob = serde_json::to_string(session).context(EncodeEntrySnafu {
            stage: "persist-encode-session",
        })?;

        self.storage
            .apply_batch(vec![
                KvWrite::put(REMEMBER_KEY, marker),
                KvWrite::put(SESSION_KEY, blob),
            ])
            .context(WriteEntriesSnafu {
                stage: "persist-apply-batch",
            })?;

        tracing::info!(user_id = %session.id, "session persisted");
        Ok(true)
    }

    /// Removes the session blob. The remember marker survives only when it records
    /// a durable remember-me choice.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut writes = vec![KvWrite::delete(SESSION_KEY)];

        let keep_marker = match self.read(REMEMBER_KEY, "clear-read-marker")? {
            Some(raw) => match serde_json::from_str::<RememberMarker>(&raw) {
                Ok(marker) => marker.remember_me,
                Err(error) => {
                    tracing::warn!(error = %error, "dropping malformed remember marker");
                    false
                }
            },
            None => true,
        };
        if !keep_marker {
            writes.push(KvWrite::delete(REMEMBER_KEY));
        }

        self.storage.apply_batch(writes).context(WriteEntriesSnafu {
            stage: "clear-apply-batch",
        })
    }

    /// The remembered marker, if one parses, for prefilling the login form.
    pub fn remembered_user(&self) -> Option<RememberMarker> {
        let raw = match self.read(REMEMBER_KEY, "remembered-user-read") {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(error = %error, "failed to read remember marker");
                return None;
            }
        };

        serde_json::from_str(&raw)
            .inspect_err(|error| tracing::warn!(error = %error, "malformed remember marker"))
            .ok()
    }

    pub fn remembered_email(&self) -> Option<String> {
        self.remembered_user()
            .filter(|marker| marker.remember_me)
            .map(|marker| marker.email)
    }

    fn read(&self, key: &'static str, stage: &'static str) -> Result<Option<String>, SessionError> {
        self.storage.get(key).context(ReadEntrySnafu { stage, key })
    }
}
