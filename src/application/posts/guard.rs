use std::{fmt, sync::Arc};

use dashmap::DashMap;
use uuid::Uuid;

/// Identifier minted for each rendered form; keys the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormToken(Uuid);

impl FormToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl Default for FormToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FormToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tracks form submissions that are currently being processed.
#[derive(Default, Clone)]
pub struct SubmissionGuard {
    tokens: Arc<DashMap<FormToken, ()>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, token: FormToken) -> Option<SubmissionPermit> {
        use dashmap::mapref::entry::Entry;

        match self.tokens.entry(token) {
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(SubmissionPermit {
                    token,
                    tokens: Arc::clone(&self.tokens),
                })
            }
            Entry::Occupied(_) => None,
        }
    }

    pub fn is_in_flight(&self, token: FormToken) -> bool {
        self.tokens.contains_key(&token)
    }
}

/// Releases its token when dropped.
pub struct SubmissionPermit {
    token: FormToken,
    tokens: Arc<DashMap<FormToken, ()>>,
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.tokens.remove(&self.token);
    }
}
