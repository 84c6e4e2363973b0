//! Session Store boundary.
//!
//! Rule logic never talks to a store. Clients read a snapshot, compute the
//! next one locally and write back only the changed fields. Writes land in
//! arrival order and the last writer wins per field.

use std::sync::Arc;

use crate::game::{GameCode, Session, SessionPatch};

pub mod memory;

pub use memory::MemoryStore;

pub type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no session with code {0}")]
    NotFound(GameCode),
    #[error("a session with code {0} already exists")]
    DuplicateCode(GameCode),
    #[error("session store lock poisoned")]
    Poisoned,
    #[error("malformed session document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait SessionStore: Send + Sync {
    /// Stores the initial snapshot. Fails if the code is taken.
    fn create_session(&self, session: Session) -> Result<Session, StoreError>;

    fn get_session(&self, code: &GameCode) -> Result<Option<Session>, StoreError>;

    /// Merges `patch` into the stored document, stamps `version` and
    /// `last_updated`, notifies subscribers and returns the merged snapshot.
    fn apply_patch(&self, code: &GameCode, patch: SessionPatch) -> Result<Session, StoreError>;

    fn subscribe(&self, code: &GameCode, listener: Listener) -> Result<Subscription, StoreError>;
}

/// Live subscription; dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
