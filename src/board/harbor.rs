use serde::{Deserialize, Serialize};

use crate::coords::{Axial, VertexId};
use crate::types::Resource;

pub const BASE_TRADE_RATE: u8 = 4;
pub const GENERIC_HARBOR_RATE: u8 = 3;
pub const SPECIFIC_HARBOR_RATE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarborKind {
    /// 3:1 on any resource.
    Generic,
    /// 2:1 on one resource only.
    Specific(Resource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Harbor {
    pub hex: Axial,
    pub corners: [u8; 2],
    pub kind: HarborKind,
}

impl Harbor {
    pub fn vertices(&self) -> [VertexId; 2] {
        [
            VertexId::corner(self.hex, self.corners[0]),
            VertexId::corner(self.hex, self.corners[1]),
        ]
    }

    /// Rate this harbor offers when giving `resource`, if it applies.
    pub fn rate_for(&self, resource: Resource) -> Option<u8> {
        match self.kind {
            HarborKind::Generic => Some(GENERIC_HARBOR_RATE),
            HarborKind::Specific(kind) if kind == resource => Some(SPECIFIC_HARBOR_RATE),
            HarborKind::Specific(_) => None,
        }
    }
}

pub const HARBORS: [Harbor; 9] = [
    Harbor {
        hex: Axial::new(0, -2),
        corners: [4, 5],
        kind: HarborKind::Generic,
    },
    Harbor {
        hex: Axial::new(1, -2),
        corners: [5, 0],
        kind: HarborKind::Specific(Resource::Wheat),
    },
    Harbor {
        hex: Axial::new(2, -1),
        corners: [5, 0],
        kind: HarborKind::Specific(Resource::Ore),
    },
    Harbor {
        hex: Axial::new(2, 0),
        corners: [0, 1],
        kind: HarborKind::Generic,
    },
    Harbor {
        hex: Axial::new(1, 1),
        corners: [1, 2],
        kind: HarborKind::Specific(Resource::Sheep),
    },
    Harbor {
        hex: Axial::new(0, 2),
        corners: [1, 2],
        kind: HarborKind::Generic,
    },
    Harbor {
        hex: Axial::new(-1, 2),
        corners: [2, 3],
        kind: HarborKind::Specific(Resource::Brick),
    },
    Harbor {
        hex: Axial::new(-2, 1),
        corners: [3, 4],
        kind: HarborKind::Generic,
    },
    Harbor {
        hex: Axial::new(-1, -1),
        corners: [4, 5],
        kind: HarborKind::Specific(Resource::Wood),
    },
];

/// Best bank rate for giving `resource` when the trader holds buildings on
/// the vertices `owns` accepts. Generic and specific harbors are checked
/// independently and the lowest rate wins.
pub fn best_trade_rate(resource: Resource, owns: impl Fn(VertexId) -> bool) -> u8 {
    HARBORS
        .iter()
        .filter(|harbor| harbor.vertices().into_iter().any(&owns))
        .filter_map(|harbor| harbor.rate_for(resource))
        .fold(BASE_TRADE_RATE, u8::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::TOPOLOGY;

    #[test]
    fn harbor_vertices_are_on_the_coast() {
        for harbor in HARBORS {
            for vertex in harbor.vertices() {
                assert!(TOPOLOGY.contains_vertex(vertex));
                assert!(TOPOLOGY.hexes_at(vertex).len() < 3, "{vertex} is inland");
            }
        }
    }

    #[test]
    fn rate_defaults_to_four() {
        assert_eq!(best_trade_rate(Resource::Ore, |_| false), 4);
    }

    #[test]
    fn generic_and_specific_rates_combine() {
        let generic = HARBORS[0].vertices()[0];
        let wheat = HARBORS[1].vertices()[1];
        let owns = |v: VertexId| v == generic || v == wheat;
        assert_eq!(best_trade_rate(Resource::Wheat, owns), 2);
        assert_eq!(best_trade_rate(Resource::Ore, owns), 3);
    }

    #[test]
    fn specific_harbor_does_not_help_other_resources() {
        let ore = HARBORS[2].vertices()[0];
        assert_eq!(best_trade_rate(Resource::Wood, |v| v == ore), 4);
        assert_eq!(best_trade_rate(Resource::Ore, |v| v == ore), 2);
    }
}
