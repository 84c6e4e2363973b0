use serde::{Deserialize, Serialize};

use crate::game::resources::{ResourceBundle, ResourceError};
use crate::types::DevelopmentCard;

pub const MAX_ROADS: u8 = 15;
pub const MAX_SETTLEMENTS: u8 = 5;
pub const MAX_CITIES: u8 = 4;

/// Unbuilt pieces a player still holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub settlements: u8,
    pub roads: u8,
    pub cities: u8,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            settlements: MAX_SETTLEMENTS,
            roads: MAX_ROADS,
            cities: MAX_CITIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub seat: usize,
    pub name: String,
    /// Opaque identity of the client that owns this seat.
    pub client_id: String,
    pub resources: ResourceBundle,
    pub inventory: Inventory,
    /// Cards that may be played.
    pub dev_cards: Vec<DevelopmentCard>,
    /// Cards bought during the current turn; playable from the next one.
    pub fresh_dev_cards: Vec<DevelopmentCard>,
    pub knights_played: u8,
    pub longest_road: u8,
    pub victory_points: u8,
}

impl Player {
    pub fn new(seat: usize, name: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            seat,
            name: name.into(),
            client_id: client_id.into(),
            resources: ResourceBundle::zero(),
            inventory: Inventory::default(),
            dev_cards: Vec::new(),
            fresh_dev_cards: Vec::new(),
            knights_played: 0,
            longest_road: 0,
            victory_points: 0,
        }
    }

    pub fn resource_count(&self) -> u32 {
        self.resources.total()
    }

    pub fn pay(&mut self, cost: &ResourceBundle) -> Result<(), ResourceError> {
        self.resources.subtract_bundle(cost)
    }

    pub fn receive(&mut self, bundle: &ResourceBundle) {
        self.resources.add_bundle(bundle);
    }

    /// A bought card waits in the fresh pile. A victory point card scores at once.
    pub fn add_dev_card(&mut self, card: DevelopmentCard) {
        self.fresh_dev_cards.push(card);
        if card == DevelopmentCard::VictoryPoint {
            self.victory_points += 1;
        }
    }

    pub fn mature_dev_cards(&mut self) {
        self.dev_cards.append(&mut self.fresh_dev_cards);
    }

    pub fn holds_playable(&self, card: DevelopmentCard) -> bool {
        card != DevelopmentCard::VictoryPoint && self.dev_cards.contains(&card)
    }

    pub fn consume_dev_card(&mut self, card: DevelopmentCard) -> bool {
        if let Some(pos) = self.dev_cards.iter().position(|c| *c == card) {
            self.dev_cards.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Player {}", self.seat + 1)
        } else {
            self.name.clone()
        }
    }
}
