//! Client-side adapter between the state machine and a [`SessionStore`].
//!
//! Each action is a read-apply-write cycle: read the latest snapshot, compute
//! the next one locally, write back only the fields that changed. There is no
//! compare-and-swap, so two clients acting on the same stale snapshot race
//! and the later write wins per field.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::game::{GameAction, GameCode, GameConfig, GameError, Session, SessionPatch, StepOutcome};
use crate::notify::{LogNotifier, Notifier, NotifyError};
use crate::store::{Listener, SessionStore, StoreError, Subscription};
use crate::types::GameStatus;

/// Fresh codes tried before giving up on creation.
const MAX_CODE_ATTEMPTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("this client holds no seat in the game")]
    NotSeated,
    #[error("this client sits in seat {expected}, not {actual}")]
    WrongSeat { expected: usize, actual: usize },
    #[error("could not find a free game code")]
    CodeExhausted,
}

pub struct GameClient {
    store: Arc<dyn SessionStore>,
    client_id: String,
    name: String,
    notifier: Option<Arc<dyn Notifier>>,
}

impl GameClient {
    pub fn new(store: Arc<dyn SessionStore>, name: impl Into<String>) -> Self {
        Self::with_client_id(store, Uuid::new_v4().to_string(), name)
    }

    pub fn with_client_id(
        store: Arc<dyn SessionStore>,
        client_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            client_id: client_id.into(),
            name: name.into(),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a lobby under a fresh code with this client as host.
    pub fn create_game(&self, config: GameConfig, rng: &mut impl Rng) -> Result<Session, ClientError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = GameCode::generate(rng);
            let session = Session::create(code, &self.client_id, &self.name, config.clone(), rng);
            match self.store.create_session(session) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::DuplicateCode(code)) => debug!(%code, "game code taken, retrying"),
                Err(err) => return Err(err.into()),
            }
        }
        Err(ClientError::CodeExhausted)
    }

    pub fn join_game(&self, code: &GameCode) -> Result<(Session, usize), ClientError> {
        let before = self.snapshot(code)?;
        let mut after = before.clone();
        let seat = after.join(&self.client_id, &self.name)?;
        let stored = self.write(code, &before, &after)?;
        Ok((stored, seat))
    }

    pub fn start_game(&self, code: &GameCode) -> Result<Session, ClientError> {
        let before = self.snapshot(code)?;
        let mut after = before.clone();
        after.start(&self.client_id)?;
        self.write(code, &before, &after)
    }

    pub fn snapshot(&self, code: &GameCode) -> Result<Session, ClientError> {
        self.store
            .get_session(code)?
            .ok_or_else(|| StoreError::NotFound(code.clone()).into())
    }

    pub fn seat(&self, session: &Session) -> Option<usize> {
        session.seat_of(&self.client_id)
    }

    /// Applies `action` to the latest snapshot and writes the changed fields.
    ///
    /// A rejected action writes nothing. The returned session is the merged
    /// document as stored.
    pub fn act(
        &self,
        code: &GameCode,
        action: &GameAction,
        rng: &mut impl Rng,
    ) -> Result<StepOutcome, ClientError> {
        let before = self.snapshot(code)?;
        let seat = self.seat(&before).ok_or(ClientError::NotSeated)?;
        if action.seat != seat {
            return Err(ClientError::WrongSeat {
                expected: seat,
                actual: action.seat,
            });
        }
        let outcome = before.apply(action, rng)?;
        let session = self.write(code, &before, &outcome.session)?;
        Ok(StepOutcome {
            session,
            events: outcome.events,
        })
    }

    pub fn subscribe(&self, code: &GameCode, listener: Listener) -> Result<Subscription, ClientError> {
        Ok(self.store.subscribe(code, listener)?)
    }

    /// Notifies this client's notifier each time a snapshot hands it the move.
    ///
    /// Falls back to [`LogNotifier`]. Notifier failures are logged and dropped.
    pub fn watch_turns(&self, code: &GameCode) -> Result<Subscription, ClientError> {
        let notifier: Arc<dyn Notifier> = self
            .notifier
            .clone()
            .unwrap_or_else(|| Arc::new(LogNotifier));
        if !notifier.request_permission() {
            return Err(NotifyError::PermissionDenied.into());
        }
        let current = self.snapshot(code)?;
        let seat = self.seat(&current).ok_or(ClientError::NotSeated)?;
        let was_mine = AtomicBool::new(is_turn_of(&current, seat));

        let code = code.clone();
        let listener: Listener = Arc::new(move |session: &Session| {
            let mine = is_turn_of(session, seat);
            if mine && !was_mine.swap(true, Ordering::SeqCst) {
                if let Err(err) = notifier.notify_my_turn(&code, seat) {
                    warn!(%code, seat, %err, "turn notification failed");
                }
            } else if !mine {
                was_mine.store(false, Ordering::SeqCst);
            }
        });
        self.subscribe(&current.code, listener)
    }

    fn write(&self, code: &GameCode, before: &Session, after: &Session) -> Result<Session, ClientError> {
        let patch = SessionPatch::diff(before, after);
        if patch.is_empty() {
            return Ok(before.clone());
        }
        debug!(%code, client = %self.client_id, fields = ?patch.changed_fields(), "writing patch");
        Ok(self.store.apply_patch(code, patch)?)
    }
}

fn is_turn_of(session: &Session, seat: usize) -> bool {
    session.status == GameStatus::Playing && session.actors().contains(&seat)
}
