//! Admin session gate.
//!
//! The authenticated flag lives in client-local storage (cookies over HTTP).
//! It gates navigation only: any client can set the flag itself.

use std::{collections::HashMap, fmt};

use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

pub const SESSION_KEY: &str = "isAuthenticated";
const SESSION_VALUE: &str = "true";
const EVENT_CAPACITY: usize = 16;

/// Key-value storage owned by a single client.
pub trait ClientStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// Process-local storage used where no client transport is involved.
#[derive(Debug, Default, Clone)]
pub struct MemoryClientStorage {
    entries: HashMap<String, String>,
}

impl ClientStorage for MemoryClientStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        if self.username.is_empty() || self.password.is_empty() {
            return false;
        }
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).unwrap_u8() == 1
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Single accessor for the session flag with login/logout notifications.
#[derive(Debug)]
pub struct SessionGate {
    credentials: Credentials,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionGate {
    pub fn new(credentials: Credentials) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            credentials,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_authenticated(&self, storage: &impl ClientStorage) -> bool {
        storage.get(SESSION_KEY).as_deref() == Some(SESSION_VALUE)
    }

    pub fn login(
        &self,
        storage: &mut impl ClientStorage,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        if !self.credentials.matches(username, password) {
            metrics::counter!("folio_login_total", "outcome" => "rejected").increment(1);
            return Err(LoginError::InvalidCredentials);
        }

        storage.set(SESSION_KEY, SESSION_VALUE);
        metrics::counter!("folio_login_total", "outcome" => "accepted").increment(1);
        self.notify(SessionEvent::LoggedIn);
        Ok(())
    }

    pub fn logout(&self, storage: &mut impl ClientStorage) {
        storage.remove(SESSION_KEY);
        self.notify(SessionEvent::LoggedOut);
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Log session transitions until the gate is dropped.
pub async fn log_session_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => info!(target = "application::session::log_session_events", ?event, "session changed"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                info!(target = "application::session::log_session_events", skipped, "session events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
