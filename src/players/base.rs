use crate::game::{GameAction, Session};

pub trait BasePlayer {
    /// Picks one of `actions` for the seat this player controls.
    fn decide(&mut self, session: &Session, actions: &[GameAction]) -> Option<GameAction>;
}
