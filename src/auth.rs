//! Caller identity handed to the engine by the authentication collaborator.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sign-in itself happens elsewhere. The engine only needs to know *who* is
//! signed in right now: the submitter gates edits on it and the feed uses it
//! to announce presence. [`AuthState`] is the writer side, [`Session`] the
//! cheap read handle given to engine components.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Opaque user id plus display email.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), email: email.into() }
    }
}

/// Holder of the currently signed-in identity.
#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<Option<Identity>>,
}

impl AuthState {
    /// Start signed out.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        let (tx, _rx) = watch::channel(Some(identity));
        Self { tx }
    }

    pub fn sign_in(&self, identity: Identity) {
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Read handle that follows later sign-in / sign-out calls.
    #[must_use]
    pub fn session(&self) -> Session {
        Session { rx: self.tx.subscribe() }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of [`AuthState`].
#[derive(Clone, Debug)]
pub struct Session {
    rx: watch::Receiver<Option<Identity>>,
}

impl Session {
    /// A session that is never signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx }
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.rx.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }
}
