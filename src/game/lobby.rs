//! Session creation and the pre-game lobby.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::info;

use crate::board::{Board, HexId};
use crate::game::config::GameConfig;
use crate::game::deck::shuffled_development_deck;
use crate::game::players::Player;
use crate::game::session::{GameCode, Session};
use crate::game::state::GameError;
use crate::types::{DevelopmentCard, GameStatus};

impl Session {
    /// New lobby with a shuffled board and deck. The host takes seat 0.
    pub fn create(
        code: GameCode,
        host_id: impl Into<String>,
        host_name: impl Into<String>,
        config: GameConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let (board, robber_hex) = Board::generate(rng);
        let dev_deck = shuffled_development_deck(rng);
        Self::new(code, host_id, host_name, config, board, robber_hex, dev_deck)
    }

    pub fn new(
        code: GameCode,
        host_id: impl Into<String>,
        host_name: impl Into<String>,
        config: GameConfig,
        board: Board,
        robber_hex: HexId,
        dev_deck: Vec<DevelopmentCard>,
    ) -> Self {
        let host_id = host_id.into();
        let host = Player::new(0, host_name, host_id.clone());
        let mut session = Self {
            code,
            config,
            host_id,
            players: vec![host],
            current_player: 0,
            status: GameStatus::Lobby,
            board,
            buildings: BTreeMap::new(),
            roads: BTreeMap::new(),
            dice: None,
            logs: Vec::new(),
            setup_phase: false,
            setup_step: 0,
            first_seat: 0,
            robber_hex,
            dev_deck,
            longest_road_holder: None,
            largest_army_holder: None,
            winner: None,
            initial_rolls: BTreeMap::new(),
            roll_off: Vec::new(),
            pending_discards: BTreeMap::new(),
            robber_move_pending: false,
            steal_candidates: Vec::new(),
            has_rolled: false,
            has_played_dev_card: false,
            free_roads: 0,
            version: 0,
            last_updated: 0,
        };
        let line = format!("{} created the game", session.display_name(0));
        session.push_log(line);
        session
    }

    pub fn seat_of(&self, client_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.client_id == client_id)
    }

    /// Seats a new client. A client that already holds a seat gets it back.
    pub fn join(
        &mut self,
        client_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<usize, GameError> {
        let client_id = client_id.into();
        if let Some(seat) = self.seat_of(&client_id) {
            return Ok(seat);
        }
        if self.status != GameStatus::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::TableFull);
        }
        let seat = self.players.len();
        self.players.push(Player::new(seat, name, client_id));
        let line = format!("{} joined", self.display_name(seat));
        self.push_log(line);
        Ok(seat)
    }

    /// Closes the lobby and opens the order roll.
    pub fn start(&mut self, client_id: &str) -> Result<(), GameError> {
        if self.status != GameStatus::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if client_id != self.host_id {
            return Err(GameError::NotHost);
        }
        if self.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers(self.config.min_players));
        }
        self.status = GameStatus::Starting;
        info!(code = %self.code, players = self.players.len(), "game started");
        self.push_log("Roll for turn order");
        Ok(())
    }
}
