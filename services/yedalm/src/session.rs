//! Admin sessions
//!
//! Logging in with the stored password yields an [`AdminSession`]. The
//! [`SessionRegistry`] keeps one [`AdminConsole`] per live session token;
//! logging out drops it. Sessions idle for longer than the registry's idle
//! timeout are dropped, and when the registry is full the least recently
//! used session makes room for a new one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use serde_json::json;
use tokio::sync::RwLock;

use crate::admin::AdminConsole;
use crate::entity::AdminSettings;
use crate::store::{Query, RemoteStore, Table};
use crate::YedalmError;

/// Capability proving the password check passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    token: String,
    created_at: SystemTime,
}

impl AdminSession {
    fn new() -> Self {
        Self {
            token: uuid::Uuid::new_v4().to_string(),
            created_at: SystemTime::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

/// Password check against the `admin_settings` row
pub struct AdminGate {
    settings: Table<AdminSettings>,
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate").finish_non_exhaustive()
    }
}

impl AdminGate {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            settings: Table::new(store),
        }
    }

    /// Compare `password` with the stored value.
    ///
    /// An unreadable settings row counts as a failed login.
    pub async fn login(&self, password: &str) -> crate::Result<AdminSession> {
        let settings = match self.settings.single(&Query::new()).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Failed to fetch admin settings: {}", e);
                return Err(YedalmError::Unauthorized);
            }
        };

        if settings.password_hash != password {
            tracing::warn!("Admin login rejected");
            return Err(YedalmError::Unauthorized);
        }

        let session = AdminSession::new();
        tracing::info!("Admin logged in");
        Ok(session)
    }

    pub async fn change_password(&self, _session: &AdminSession, new: &str) -> crate::Result<()> {
        if new.trim().is_empty() {
            return Err(YedalmError::Site("password must not be empty".to_string()));
        }
        self.settings
            .update(1, &json!({ "password_hash": new }))
            .await?;
        tracing::info!("Admin password changed");
        Ok(())
    }
}

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 16;

struct SessionEntry {
    session: AdminSession,
    console: Arc<AdminConsole>,
    last_seen: Instant,
}

/// Live sessions by token
pub struct SessionRegistry {
    store: Arc<dyn RemoteStore>,
    idle_timeout: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_limits(store, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }

    /// Registry dropping sessions idle longer than `idle_timeout` and
    /// holding at most `max_sessions` (at least one)
    pub fn with_limits(
        store: Arc<dyn RemoteStore>,
        idle_timeout: Duration,
        max_sessions: usize,
    ) -> Self {
        Self {
            store,
            idle_timeout,
            max_sessions: max_sessions.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session and load its console
    pub async fn open(&self, session: AdminSession) -> Arc<AdminConsole> {
        let console = Arc::new(AdminConsole::new(Arc::clone(&self.store)));
        console.load().await;

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_timeout);
        if sessions.len() < before {
            tracing::info!("Dropped {} idle admin session(s)", before - sessions.len());
        }
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(token, _)| token.clone());
            match oldest {
                Some(token) => {
                    sessions.remove(&token);
                    tracing::warn!("Session limit reached, dropped least recently used session");
                }
                None => break,
            }
        }
        sessions.insert(
            session.token.clone(),
            SessionEntry {
                session,
                console: Arc::clone(&console),
                last_seen: now,
            },
        );
        console
    }

    /// Session and console for a token; touching a session keeps it alive
    pub async fn lookup(&self, token: &str) -> crate::Result<(AdminSession, Arc<AdminConsole>)> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let idle = sessions
            .get(token)
            .map(|entry| now.duration_since(entry.last_seen))
            .ok_or(YedalmError::Unauthorized)?;
        if idle >= self.idle_timeout {
            sessions.remove(token);
            tracing::info!("Admin session expired");
            return Err(YedalmError::Unauthorized);
        }
        let entry = sessions.get_mut(token).ok_or(YedalmError::Unauthorized)?;
        entry.last_seen = now;
        Ok((entry.session.clone(), Arc::clone(&entry.console)))
    }

    /// Destroy a session; returns false if the token was not live
    pub async fn close(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            tracing::info!("Admin logged out");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
