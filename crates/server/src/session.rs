//! Session management
//!
//! Sessions only carry identity and language. The chat transcript lives in
//! the conversation store, keyed by session id.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use postal_assistant_agent::ChatHandler;

use crate::ServerError;

/// A chat session
pub struct Session {
    pub id: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            language: language.into(),
            created_at: Utc::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.idle_for() > ttl
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    /// Expired sessions dropped by `create` whose transcripts are not yet cleared
    evicted: Mutex<Vec<String>>,
    max_sessions: usize,
    session_ttl: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize, session_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            evicted: Mutex::new(Vec::new()),
            max_sessions,
            session_ttl,
            cleanup_interval: (session_ttl / 12).max(Duration::from_secs(1)),
        }
    }

    pub fn create(&self, language: &str) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            let expired = self.remove_expired(&mut sessions);
            self.evicted.lock().extend(expired);
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::SessionLimit);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone(), language));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, language, "Created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Look up and touch a session
    pub fn activate(&self, id: &str) -> Result<Arc<Session>, ServerError> {
        let session = self
            .get(id)
            .ok_or_else(|| ServerError::SessionNotFound(id.to_string()))?;
        session.touch();
        Ok(session)
    }

    /// Returns whether the session existed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drop expired sessions, returning their ids
    ///
    /// Includes sessions already evicted by `create` since the last call.
    pub fn cleanup_expired(&self) -> Vec<String> {
        let mut expired = std::mem::take(&mut *self.evicted.lock());
        let mut sessions = self.sessions.write();
        expired.extend(self.remove_expired(&mut sessions));
        expired
    }

    /// Drop expired sessions and clear their transcripts, returning how many were dropped
    pub async fn purge_expired(&self, chat: &ChatHandler) -> usize {
        let expired = self.cleanup_expired();
        for id in &expired {
            if let Err(e) = chat.reset(id).await {
                tracing::warn!(session_id = %id, error = %e, "Failed to clear expired transcript");
            }
        }
        expired.len()
    }

    fn remove_expired(&self, sessions: &mut HashMap<String, Arc<Session>>) -> Vec<String> {
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(self.session_ttl))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            sessions.remove(id);
            tracing::info!(session_id = %id, "Expired session");
        }
        expired
    }

    /// Periodically drop expired sessions and clear their transcripts
    ///
    /// Send `true` on the returned channel to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>, chat: Arc<ChatHandler>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let removed = manager.purge_expired(&chat).await;
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}
