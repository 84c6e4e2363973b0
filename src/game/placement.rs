//! Legality checks for settlements, roads and cities.
//!
//! Each check is pure and reports the first rule the candidate breaks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::TOPOLOGY;
use crate::coords::{EdgeId, VertexId};
use crate::game::players::Player;
use crate::game::resources::{COST_CITY, COST_ROAD, COST_SETTLEMENT};
use crate::types::BuildingKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub owner: usize,
    pub kind: BuildingKind,
}

impl Building {
    pub const fn settlement(owner: usize) -> Self {
        Self {
            owner,
            kind: BuildingKind::Settlement,
        }
    }

    /// Cards produced by an adjacent hex.
    pub const fn yield_multiplier(&self) -> u8 {
        match self.kind {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

pub type Buildings = BTreeMap<VertexId, Building>;
pub type Roads = BTreeMap<EdgeId, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("vertex {0} is not on the board")]
    UnknownVertex(VertexId),
    #[error("edge {0} is not on the board")]
    UnknownEdge(EdgeId),
    #[error("there is already a building there")]
    VertexOccupied,
    #[error("there is already a road there")]
    EdgeOccupied,
    #[error("no settlements left to place")]
    OutOfSettlements,
    #[error("no roads left to place")]
    OutOfRoads,
    #[error("no cities left to place")]
    OutOfCities,
    #[error("too close to another building")]
    TooCloseToBuilding,
    #[error("must connect to one of your roads")]
    NotConnectedToRoad,
    #[error("must connect to your road network")]
    NotConnectedToNetwork,
    #[error("only your own settlements can become cities")]
    NotOwnSettlement,
    #[error("not enough resources")]
    InsufficientResources,
}

pub fn can_build_settlement(
    buildings: &Buildings,
    roads: &Roads,
    player: &Player,
    vertex: VertexId,
    setup: bool,
) -> Result<(), PlacementError> {
    if !TOPOLOGY.contains_vertex(vertex) {
        return Err(PlacementError::UnknownVertex(vertex));
    }
    if buildings.contains_key(&vertex) {
        return Err(PlacementError::VertexOccupied);
    }
    if player.inventory.settlements == 0 {
        return Err(PlacementError::OutOfSettlements);
    }
    if buildings.keys().any(|other| vertex.within_one_edge(*other)) {
        return Err(PlacementError::TooCloseToBuilding);
    }
    if !setup {
        let connected = roads
            .iter()
            .any(|(edge, owner)| *owner == player.seat && edge.touches(vertex));
        if !connected {
            return Err(PlacementError::NotConnectedToRoad);
        }
        if !player.resources.can_afford(&COST_SETTLEMENT) {
            return Err(PlacementError::InsufficientResources);
        }
    }
    Ok(())
}

/// `free` skips the cost, as setup does; the piece is still consumed.
pub fn can_build_road(
    buildings: &Buildings,
    roads: &Roads,
    player: &Player,
    edge: EdgeId,
    setup: bool,
    free: bool,
) -> Result<(), PlacementError> {
    if !TOPOLOGY.contains_edge(edge) {
        return Err(PlacementError::UnknownEdge(edge));
    }
    if roads.contains_key(&edge) {
        return Err(PlacementError::EdgeOccupied);
    }
    if player.inventory.roads == 0 {
        return Err(PlacementError::OutOfRoads);
    }
    let (a, b) = edge.endpoints();
    let owns_building = [a, b].iter().any(|vertex| {
        buildings
            .get(vertex)
            .is_some_and(|building| building.owner == player.seat)
    });
    let extends_road = roads
        .iter()
        .any(|(other, owner)| *owner == player.seat && other.shares_endpoint(edge));
    if !owns_building && !extends_road {
        return Err(PlacementError::NotConnectedToNetwork);
    }
    if !setup && !free && !player.resources.can_afford(&COST_ROAD) {
        return Err(PlacementError::InsufficientResources);
    }
    Ok(())
}

pub fn can_build_city(
    buildings: &Buildings,
    player: &Player,
    vertex: VertexId,
) -> Result<(), PlacementError> {
    match buildings.get(&vertex) {
        Some(building) if building.owner == player.seat && building.kind == BuildingKind::Settlement => {}
        _ => return Err(PlacementError::NotOwnSettlement),
    }
    if player.inventory.cities == 0 {
        return Err(PlacementError::OutOfCities);
    }
    if !player.resources.can_afford(&COST_CITY) {
        return Err(PlacementError::InsufficientResources);
    }
    Ok(())
}
