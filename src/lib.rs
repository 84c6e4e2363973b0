#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod client;
pub mod coords;
pub mod game;
pub mod notify;
pub mod players;
pub mod sim;
pub mod store;
pub mod types;

pub use board::{Board, HexId};
pub use client::{ClientError, GameClient};
pub use coords::{EdgeId, VertexId};
pub use game::{GameAction, GameCode, GameConfig, GameError, GameEvent, Session, SessionPatch};
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use store::{MemoryStore, SessionStore, StoreError, Subscription};
pub use types::{ActionPrompt, ActionType, GameStatus, Resource};
