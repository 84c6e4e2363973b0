//! The shared session document and its field-level patch.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, HexId, best_trade_rate};
use crate::game::config::GameConfig;
use crate::game::placement::{Buildings, Roads};
use crate::game::players::Player;
use crate::game::setup::SetupOrder;
use crate::types::{ActionPrompt, DevelopmentCard, GameStatus, Resource};

const CODE_LEN: usize = 4;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Four uppercase alphanumeric characters identifying a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GameCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameCodeError {
    #[error("game code {0:?} must be four letters or digits")]
    Malformed(String),
    #[error("join link {0:?} carries no game code")]
    MissingCode(String),
}

impl GameCode {
    pub fn generate(rng: &mut impl Rng) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shareable link that lands a new player in this session's lobby.
    pub fn join_link(&self, base_url: &str) -> String {
        format!("{base_url}?game={}", self.0)
    }

    pub fn from_join_link(link: &str) -> Result<Self, GameCodeError> {
        let query = link
            .split_once('?')
            .map(|(_, query)| query)
            .ok_or_else(|| GameCodeError::MissingCode(link.to_string()))?;
        let code = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "game")
            .map(|(_, value)| value)
            .ok_or_else(|| GameCodeError::MissingCode(link.to_string()))?;
        code.parse()
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GameCode {
    type Err = GameCodeError;

    /// Codes are case-insensitive on input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(GameCodeError::Malformed(s.to_string()));
        }
        Ok(Self(code))
    }
}

impl From<GameCode> for String {
    fn from(value: GameCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for GameCode {
    type Error = GameCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One game, as every client sees it.
///
/// All rule logic reads and writes this aggregate; the store only ever sees
/// whole snapshots or a [`SessionPatch`] of changed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub code: GameCode,
    pub config: GameConfig,
    pub host_id: String,
    /// Index is the seat.
    pub players: Vec<Player>,
    pub current_player: usize,
    pub status: GameStatus,
    pub board: Board,
    pub buildings: Buildings,
    pub roads: Roads,
    pub dice: Option<(u8, u8)>,
    /// Most recent first, at most `config.log_capacity` entries.
    pub logs: Vec<String>,
    pub setup_phase: bool,
    pub setup_step: usize,
    /// Seat that won the order roll and opens setup.
    pub first_seat: usize,
    pub robber_hex: HexId,
    /// Remaining cards; drawn from the end.
    pub dev_deck: Vec<DevelopmentCard>,
    pub longest_road_holder: Option<usize>,
    pub largest_army_holder: Option<usize>,
    pub winner: Option<usize>,
    pub initial_rolls: BTreeMap<usize, u8>,
    /// Seats tied for the highest order roll, re-rolling among themselves.
    pub roll_off: Vec<usize>,
    /// Seat -> number of cards still owed after a 7.
    pub pending_discards: BTreeMap<usize, u32>,
    pub robber_move_pending: bool,
    pub steal_candidates: Vec<usize>,
    pub has_rolled: bool,
    pub has_played_dev_card: bool,
    pub free_roads: u8,
    pub version: u64,
    /// Milliseconds since the epoch, stamped by the store.
    pub last_updated: i64,
}

impl Session {
    pub fn player(&self, seat: usize) -> Option<&Player> {
        self.players.get(seat)
    }

    pub fn setup_order(&self) -> SetupOrder {
        SetupOrder::new(self.players.len().max(1), self.first_seat)
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::Won
    }

    /// What the session is waiting for right now.
    pub fn prompt(&self) -> ActionPrompt {
        match self.status {
            GameStatus::Lobby => ActionPrompt::WaitForPlayers,
            GameStatus::Starting => ActionPrompt::RollForOrder,
            GameStatus::Won => ActionPrompt::GameOver,
            GameStatus::Playing if self.setup_phase => {
                if self.setup_step % 2 == 0 {
                    ActionPrompt::BuildInitialSettlement
                } else {
                    ActionPrompt::BuildInitialRoad
                }
            }
            GameStatus::Playing => {
                if !self.pending_discards.is_empty() {
                    ActionPrompt::Discard
                } else if self.robber_move_pending {
                    ActionPrompt::MoveRobber
                } else if !self.steal_candidates.is_empty() {
                    ActionPrompt::ChooseVictim
                } else if !self.has_rolled {
                    ActionPrompt::Roll
                } else {
                    ActionPrompt::PlayTurn
                }
            }
        }
    }

    /// Seats allowed to act under the current prompt.
    pub fn actors(&self) -> Vec<usize> {
        match self.prompt() {
            ActionPrompt::WaitForPlayers | ActionPrompt::GameOver => Vec::new(),
            ActionPrompt::RollForOrder => self
                .order_contenders()
                .into_iter()
                .filter(|seat| !self.initial_rolls.contains_key(seat))
                .collect(),
            ActionPrompt::BuildInitialSettlement | ActionPrompt::BuildInitialRoad => self
                .setup_order()
                .seat_for_step(self.setup_step)
                .into_iter()
                .collect(),
            ActionPrompt::Discard => self.pending_discards.keys().copied().collect(),
            _ => vec![self.current_player],
        }
    }

    /// Seats whose roll decides the first seat in the current round.
    pub fn order_contenders(&self) -> Vec<usize> {
        if self.roll_off.is_empty() {
            (0..self.players.len()).collect()
        } else {
            self.roll_off.clone()
        }
    }

    /// Bank rate for `seat` giving `resource`, after harbors.
    pub fn trade_rate(&self, seat: usize, resource: Resource) -> u8 {
        best_trade_rate(resource, |vertex| {
            self.buildings
                .get(&vertex)
                .is_some_and(|building| building.owner == seat)
        })
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.insert(0, line.into());
        self.logs.truncate(self.config.log_capacity);
    }

    pub fn display_name(&self, seat: usize) -> String {
        self.player(seat)
            .map(Player::display_name)
            .unwrap_or_else(|| format!("Player {}", seat + 1))
    }
}

/// A key that is on the wire is a change, even when its value is `null`.
/// Absent keys fall back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

macro_rules! session_patch {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// Changed top-level fields of a [`Session`]. Absent fields are left
        /// alone on merge, so concurrent writers win per field.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct SessionPatch {
            $(
                #[serde(
                    default,
                    deserialize_with = "present",
                    skip_serializing_if = "Option::is_none"
                )]
                pub $field: Option<$ty>,
            )*
        }

        impl SessionPatch {
            /// Fields of `after` that differ from `before`.
            pub fn diff(before: &Session, after: &Session) -> Self {
                Self {
                    $($field: (before.$field != after.$field).then(|| after.$field.clone()),)*
                }
            }

            pub fn merge_into(self, session: &mut Session) {
                $(
                    if let Some(value) = self.$field {
                        session.$field = value;
                    }
                )*
            }

            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }

            pub fn changed_fields(&self) -> Vec<&'static str> {
                let mut fields = Vec::new();
                $(
                    if self.$field.is_some() {
                        fields.push(stringify!($field));
                    }
                )*
                fields
            }
        }
    };
}

// `code` is immutable; `version` and `last_updated` belong to the store.
session_patch! {
    config: GameConfig,
    host_id: String,
    players: Vec<Player>,
    current_player: usize,
    status: GameStatus,
    board: Board,
    buildings: Buildings,
    roads: Roads,
    dice: Option<(u8, u8)>,
    logs: Vec<String>,
    setup_phase: bool,
    setup_step: usize,
    first_seat: usize,
    robber_hex: HexId,
    dev_deck: Vec<DevelopmentCard>,
    longest_road_holder: Option<usize>,
    largest_army_holder: Option<usize>,
    winner: Option<usize>,
    initial_rolls: BTreeMap<usize, u8>,
    roll_off: Vec<usize>,
    pending_discards: BTreeMap<usize, u32>,
    robber_move_pending: bool,
    steal_candidates: Vec<usize>,
    has_rolled: bool,
    has_played_dev_card: bool,
    free_roads: u8,
}

impl Session {
    /// Applies `patch` and returns the merged document.
    pub fn merged(mut self, patch: SessionPatch) -> Self {
        patch.merge_into(&mut self);
        self
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::coords::Axial;
    use crate::coords::VertexId;
    use crate::game::placement::Building;

    fn session() -> Session {
        let mut rng = StdRng::seed_from_u64(3);
        Session::create(
            "ABCD".parse().unwrap(),
            "host",
            "Ana",
            GameConfig::default(),
            &mut rng,
        )
    }

    #[test]
    fn generated_codes_are_four_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let code = GameCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), 4);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
            assert_eq!(code.as_str().parse::<GameCode>().unwrap(), code);
        }
    }

    #[test]
    fn codes_parse_case_insensitively() {
        assert_eq!("ab1c".parse::<GameCode>().unwrap().as_str(), "AB1C");
        assert!("ABC".parse::<GameCode>().is_err());
        assert!("AB-C".parse::<GameCode>().is_err());
    }

    #[test]
    fn join_link_round_trips() {
        let code: GameCode = "Q7ZX".parse().unwrap();
        let link = code.join_link("https://play.example/lobby");
        assert_eq!(link, "https://play.example/lobby?game=Q7ZX");
        assert_eq!(GameCode::from_join_link(&link).unwrap(), code);
        assert_eq!(
            GameCode::from_join_link("https://x/?lang=en&game=q7zx").unwrap(),
            code
        );
        assert!(matches!(
            GameCode::from_join_link("https://x/"),
            Err(GameCodeError::MissingCode(_))
        ));
    }

    #[test]
    fn log_is_most_recent_first_and_capped() {
        let mut session = session();
        session.logs.clear();
        for idx in 0..12 {
            session.push_log(format!("entry {idx}"));
        }
        assert_eq!(session.logs.len(), 8);
        assert_eq!(session.logs[0], "entry 11");
        assert_eq!(session.logs[7], "entry 4");
    }

    #[test]
    fn diff_carries_only_changed_fields() {
        let before = session();
        let mut after = before.clone();
        after.has_rolled = true;
        after.dice = Some((3, 4));
        let patch = SessionPatch::diff(&before, &after);
        assert_eq!(patch.changed_fields(), vec!["dice", "has_rolled"]);
        assert_eq!(before.clone().merged(patch), after);
        assert!(SessionPatch::diff(&before, &before).is_empty());
    }

    #[test]
    fn concurrent_patches_win_per_field() {
        let base = session();
        let mut first = base.clone();
        first.has_rolled = true;
        let mut second = base.clone();
        second.free_roads = 2;
        let merged = base
            .clone()
            .merged(SessionPatch::diff(&base, &first))
            .merged(SessionPatch::diff(&base, &second));
        assert!(merged.has_rolled);
        assert_eq!(merged.free_roads, 2);
    }

    #[test]
    fn patch_serializes_without_absent_fields() {
        let patch = SessionPatch {
            current_player: Some(1),
            ..SessionPatch::default()
        };
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"current_player":1}"#
        );
    }

    #[test]
    fn cleared_optional_fields_survive_the_wire() {
        let mut before = session();
        before.longest_road_holder = Some(0);
        before.dice = Some((2, 5));
        let mut after = before.clone();
        after.longest_road_holder = None;
        after.dice = None;

        let json = serde_json::to_string(&SessionPatch::diff(&before, &after)).unwrap();
        assert_eq!(json, r#"{"dice":null,"longest_road_holder":null}"#);
        let decoded: SessionPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.changed_fields(), vec!["dice", "longest_road_holder"]);
        let merged = before.merged(decoded);
        assert_eq!(merged.longest_road_holder, None);
        assert_eq!(merged.dice, None);

        let untouched: SessionPatch = serde_json::from_str(r#"{"has_rolled":true}"#).unwrap();
        assert_eq!(untouched.changed_fields(), vec!["has_rolled"]);
        assert!(serde_json::from_str::<SessionPatch>(r#"{"has_rolled":null}"#).is_err());
    }

    #[test]
    fn trade_rate_uses_owned_harbors() {
        let mut session = session();
        assert_eq!(session.trade_rate(0, Resource::Wheat), 4);
        // Top-left corner of the first hex is a generic harbor.
        let harbor_corner = VertexId::corner(Axial::new(0, -2), 4);
        session.buildings.insert(harbor_corner, Building::settlement(0));
        assert_eq!(session.trade_rate(0, Resource::Wheat), 3);
        assert_eq!(session.trade_rate(1, Resource::Wheat), 4);
    }

    #[test]
    fn session_survives_a_json_round_trip() {
        let mut session = session();
        session.buildings.insert(
            VertexId::corner(Axial::new(0, 0), 0),
            Building::settlement(0),
        );
        session.pending_discards.insert(0, 4);
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
