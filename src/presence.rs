//! Presence tracker: who is connected right now.
//!
//! Entries are keyed by user id, so one user with several open connections
//! counts once. The set is rebuilt from every `sync` roster and cleared when
//! the local feed disconnects; it has no source of truth of its own.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// One connected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub user_id: String,
    pub email: String,
    /// Milliseconds since the Unix epoch.
    pub last_seen_ms: i64,
}

impl PresenceEntry {
    #[must_use]
    pub fn new(identity: &Identity, last_seen_ms: i64) -> Self {
        Self { user_id: identity.user_id.clone(), email: identity.email.clone(), last_seen_ms }
    }
}

impl From<frames::PresencePayload> for PresenceEntry {
    fn from(payload: frames::PresencePayload) -> Self {
        Self { user_id: payload.user_id, email: payload.email, last_seen_ms: payload.seen_at }
    }
}

impl From<&PresenceEntry> for frames::PresencePayload {
    fn from(entry: &PresenceEntry) -> Self {
        Self { user_id: entry.user_id.clone(), email: entry.email.clone(), seen_at: entry.last_seen_ms }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    entries: HashMap<String, PresenceEntry>,
}

impl PresenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or refresh a user. Returns `true` when the user was not known.
    pub fn mark_online(&mut self, entry: PresenceEntry) -> bool {
        match self.entries.get_mut(&entry.user_id) {
            Some(existing) => {
                existing.email = entry.email;
                existing.last_seen_ms = existing.last_seen_ms.max(entry.last_seen_ms);
                false
            }
            None => {
                self.entries.insert(entry.user_id.clone(), entry);
                true
            }
        }
    }

    /// Remove a user. Returns `true` when the user was known.
    pub fn mark_offline(&mut self, user_id: &str) -> bool {
        self.entries.remove(user_id).is_some()
    }

    /// Replace the whole set with a roster snapshot. Duplicate ids collapse to
    /// one entry carrying the latest `last_seen_ms`.
    pub fn replace_all(&mut self, roster: impl IntoIterator<Item = PresenceEntry>) {
        self.entries.clear();
        for entry in roster {
            self.mark_online(entry);
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Entries sorted by user id.
    #[must_use]
    pub fn list(&self) -> Vec<PresenceEntry> {
        let mut out: Vec<PresenceEntry> = self.entries.values().cloned().collect();
        out.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        out
    }

    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.entries.contains_key(user_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
