use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::coords::{Axial, STANDARD_LAYOUT, VertexId};
use crate::types::{Resource, Terrain};

pub mod harbor;
pub mod topology;

pub use harbor::{HARBORS, Harbor, HarborKind, best_trade_rate};
pub use topology::{TOPOLOGY, Topology};

pub type HexId = u8;

/// Terrain multiset of the standard board: 4 forest, 3 hills, 4 pasture,
/// 4 fields, 3 mountains and a single desert.
pub const STANDARD_TERRAINS: [Terrain; 19] = [
    Terrain::Forest,
    Terrain::Forest,
    Terrain::Forest,
    Terrain::Forest,
    Terrain::Hills,
    Terrain::Hills,
    Terrain::Hills,
    Terrain::Pasture,
    Terrain::Pasture,
    Terrain::Pasture,
    Terrain::Pasture,
    Terrain::Fields,
    Terrain::Fields,
    Terrain::Fields,
    Terrain::Fields,
    Terrain::Mountains,
    Terrain::Mountains,
    Terrain::Mountains,
    Terrain::Desert,
];

/// Production tokens: 2..=12 without 7, with 2 and 12 once and the rest twice.
pub const STANDARD_NUMBERS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    pub id: HexId,
    pub coord: Axial,
    pub terrain: Terrain,
    pub number: Option<u8>,
}

impl Hex {
    pub fn resource(&self) -> Option<Resource> {
        self.terrain.resource()
    }

    pub fn corners(&self) -> [VertexId; 6] {
        self.coord.corners()
    }
}

/// Fixed layouts used instead of shuffling, e.g. to replay a known board.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardOverrides<'a> {
    pub terrains: Option<&'a [Terrain]>,
    pub numbers: Option<&'a [u8]>,
}

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("expected {expected} terrains, got {actual}")]
    TerrainCount { expected: usize, actual: usize },
    #[error("board must contain exactly one desert, found {0}")]
    DesertCount(usize),
    #[error("expected {expected} number tokens, got {actual}")]
    NumberCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub hexes: Vec<Hex>,
}

impl Board {
    /// Shuffles terrains and number tokens. Returns the board and the id of
    /// the desert, where the robber starts.
    pub fn generate(rng: &mut impl rand::Rng) -> (Self, HexId) {
        let mut terrains = STANDARD_TERRAINS;
        terrains.shuffle(rng);
        let mut numbers = STANDARD_NUMBERS;
        numbers.shuffle(rng);
        Self::assemble(&terrains, &numbers)
    }

    pub fn generate_with(
        overrides: BoardOverrides<'_>,
        rng: &mut impl rand::Rng,
    ) -> Result<(Self, HexId), BoardError> {
        let mut terrains = overrides
            .terrains
            .map(|slice| slice.to_vec())
            .unwrap_or_else(|| STANDARD_TERRAINS.to_vec());
        if overrides.terrains.is_none() {
            terrains.shuffle(rng);
        }
        let mut numbers = overrides
            .numbers
            .map(|slice| slice.to_vec())
            .unwrap_or_else(|| STANDARD_NUMBERS.to_vec());
        if overrides.numbers.is_none() {
            numbers.shuffle(rng);
        }

        if terrains.len() != STANDARD_LAYOUT.len() {
            return Err(BoardError::TerrainCount {
                expected: STANDARD_LAYOUT.len(),
                actual: terrains.len(),
            });
        }
        let deserts = terrains.iter().filter(|t| **t == Terrain::Desert).count();
        if deserts != 1 {
            return Err(BoardError::DesertCount(deserts));
        }
        if numbers.len() != STANDARD_LAYOUT.len() - 1 {
            return Err(BoardError::NumberCount {
                expected: STANDARD_LAYOUT.len() - 1,
                actual: numbers.len(),
            });
        }
        Ok(Self::assemble(&terrains, &numbers))
    }

    /// Tokens go to non-desert hexes in order; the desert gets none.
    fn assemble(terrains: &[Terrain], numbers: &[u8]) -> (Self, HexId) {
        let mut tokens = numbers.iter().copied();
        let mut desert = 0;
        let hexes = STANDARD_LAYOUT
            .iter()
            .zip(terrains.iter().copied())
            .enumerate()
            .map(|(idx, (coord, terrain))| {
                let id = idx as HexId;
                let number = if terrain == Terrain::Desert {
                    desert = id;
                    None
                } else {
                    tokens.next()
                };
                Hex {
                    id,
                    coord: *coord,
                    terrain,
                    number,
                }
            })
            .collect();
        (Self { hexes }, desert)
    }

    pub fn hex(&self, id: HexId) -> Option<&Hex> {
        self.hexes.get(id as usize)
    }

    /// Hexes that have `vertex` as one of their corners.
    pub fn hexes_at(&self, vertex: VertexId) -> impl Iterator<Item = &Hex> + '_ {
        TOPOLOGY
            .hexes_at(vertex)
            .iter()
            .filter_map(move |id| self.hex(*id))
    }

    pub fn hexes_with_number(&self, number: u8) -> impl Iterator<Item = &Hex> + '_ {
        self.hexes
            .iter()
            .filter(move |hex| hex.number == Some(number))
    }
}
