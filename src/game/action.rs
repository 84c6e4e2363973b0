use serde::{Deserialize, Serialize};

use crate::board::HexId;
use crate::coords::{EdgeId, VertexId};
use crate::game::resources::ResourceBundle;
use crate::types::{ActionType, Resource};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameAction {
    pub seat: usize,
    pub action_type: ActionType,
    pub payload: ActionPayload,
}

impl GameAction {
    pub fn new(seat: usize, action_type: ActionType) -> Self {
        Self {
            seat,
            action_type,
            payload: ActionPayload::None,
        }
    }

    pub fn with_payload(mut self, payload: ActionPayload) -> Self {
        self.payload = payload;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionPayload {
    #[default]
    None,
    Vertex(VertexId),
    Edge(EdgeId),
    /// Fixed dice for a production roll; omitted rolls are drawn from the rng.
    Dice(u8, u8),
    /// Fixed die for the order roll.
    Die(u8),
    Resources(ResourceBundle),
    Resource(Resource),
    ResourcePair(Resource, Resource),
    MaritimeTrade {
        give: Resource,
        receive: Resource,
    },
    Hex(HexId),
    Seat(usize),
}
