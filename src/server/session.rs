//! Login sessions: opaque bearer tokens mapped to usernames.
//!
//! Sessions are request context for the dispatcher only; the core receives
//! the resolved [`Principal`] as a parameter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::core::diary::Principal;

/// Opaque session token handed to the client after login.
pub type SessionToken = String;

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    last_used: Instant,
}

/// In-memory session registry with idle expiry.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionToken, SessionEntry>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Start a session for `username`; returns its token.
    pub async fn create(&self, username: &str) -> SessionToken {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;
        self.prune_expired(&mut sessions);
        sessions.insert(
            token.clone(),
            SessionEntry {
                username: username.to_string(),
                last_used: Instant::now(),
            },
        );
        log::debug!("Session created for '{}' ({} active)", username, sessions.len());
        token
    }

    /// Resolve a token, refreshing its idle timer. Expired tokens are dropped.
    pub async fn resolve(&self, token: &str) -> Option<Principal> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(token)?;

        if entry.last_used.elapsed() > self.ttl {
            let username = entry.username.clone();
            sessions.remove(token);
            log::info!("Session for '{}' expired", username);
            return None;
        }

        entry.last_used = Instant::now();
        Some(Principal::new(entry.username.clone()))
    }

    /// End a session. Returns whether the token was live.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Point every session of `old` at `new` after a username change.
    pub async fn rebind(&self, old: &str, new: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for entry in sessions.values_mut().filter(|entry| entry.username == old) {
            entry.username = new.to_string();
            count += 1;
        }
        count
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn prune_expired(&self, sessions: &mut HashMap<SessionToken, SessionEntry>) {
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.last_used.elapsed() <= ttl);
    }
}
