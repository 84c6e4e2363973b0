//! Hex and vertex geometry.
//!
//! Hexes are pointy-top and addressed by axial `(q, r)` coordinates. Corner `i`
//! of a hex sits at angle `60 * i - 30` degrees from its centre (screen
//! coordinates, y grows downwards), so corner 2 is the bottom tip and corner 5
//! the top tip.
//!
//! Vertices are placed on an exact integer lattice instead of pixel positions:
//! x is measured in units of `sqrt(3) / 2` hex sizes and y in units of half a
//! hex size. Every client derives the same identifier for a shared corner no
//! matter which of the (up to three) touching hexes it starts from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Axial {
    pub q: i32,
    pub r: i32,
}

impl Axial {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Centre of the hex on the vertex lattice.
    pub const fn center(self) -> LatticePoint {
        LatticePoint {
            x: 2 * self.q + self.r,
            y: 3 * self.r,
        }
    }

    pub fn corners(self) -> [VertexId; 6] {
        std::array::from_fn(|corner| vertex_id(vertex_position(self, corner as u8)))
    }
}

/// The 19 land hexes of the standard board, row by row from the top.
/// A hex's id is its index in this table.
pub const STANDARD_LAYOUT: [Axial; 19] = [
    Axial::new(0, -2),
    Axial::new(1, -2),
    Axial::new(2, -2),
    Axial::new(-1, -1),
    Axial::new(0, -1),
    Axial::new(1, -1),
    Axial::new(2, -1),
    Axial::new(-2, 0),
    Axial::new(-1, 0),
    Axial::new(0, 0),
    Axial::new(1, 0),
    Axial::new(2, 0),
    Axial::new(-2, 1),
    Axial::new(-1, 1),
    Axial::new(0, 1),
    Axial::new(1, 1),
    Axial::new(-2, 2),
    Axial::new(-1, 2),
    Axial::new(0, 2),
];

const CORNER_DX: [i32; 6] = [1, 1, 0, -1, -1, 0];
const CORNER_DY: [i32; 6] = [-1, 1, 2, 1, -1, -2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LatticePoint {
    pub x: i32,
    pub y: i32,
}

/// Position of `corner` (0..=5) of `hex`. Corners wrap modulo 6.
pub fn vertex_position(hex: Axial, corner: u8) -> LatticePoint {
    let idx = (corner % 6) as usize;
    let center = hex.center();
    LatticePoint {
        x: center.x + CORNER_DX[idx],
        y: center.y + CORNER_DY[idx],
    }
}

pub fn vertex_id(point: LatticePoint) -> VertexId {
    VertexId {
        x: point.x,
        y: point.y,
    }
}

pub fn edge_id(a: VertexId, b: VertexId) -> EdgeId {
    EdgeId::new(a, b)
}

/// Stable vertex identifier, rendered on the wire as `"x,y"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VertexId {
    x: i32,
    y: i32,
}

impl VertexId {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn corner(hex: Axial, corner: u8) -> Self {
        vertex_id(vertex_position(hex, corner))
    }

    /// Squared Euclidean distance in units of a quarter hex edge squared.
    pub const fn scaled_distance_sq(self, other: VertexId) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        3 * dx * dx + dy * dy
    }

    /// True when `other` is this vertex or lies one edge length away or closer.
    pub const fn within_one_edge(self, other: VertexId) -> bool {
        self.scaled_distance_sq(other) <= 4
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordParseError {
    #[error("malformed vertex id {0:?}")]
    Vertex(String),
    #[error("malformed edge id {0:?}")]
    Edge(String),
}

impl FromStr for VertexId {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordParseError::Vertex(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(malformed)?;
        let x = x.trim().parse().map_err(|_| malformed())?;
        let y = y.trim().parse().map_err(|_| malformed())?;
        Ok(VertexId { x, y })
    }
}

impl From<VertexId> for String {
    fn from(value: VertexId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for VertexId {
    type Error = CoordParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Order-independent edge identifier, rendered as `"a|b"` with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EdgeId {
    a: VertexId,
    b: VertexId,
}

impl EdgeId {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }

    pub const fn endpoints(self) -> (VertexId, VertexId) {
        (self.a, self.b)
    }

    pub fn touches(self, vertex: VertexId) -> bool {
        self.a == vertex || self.b == vertex
    }

    pub fn shares_endpoint(self, other: EdgeId) -> bool {
        other.touches(self.a) || other.touches(self.b)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.a, self.b)
    }
}

impl FromStr for EdgeId {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once('|')
            .ok_or_else(|| CoordParseError::Edge(s.to_string()))?;
        let a = a.parse().map_err(|_| CoordParseError::Edge(s.to_string()))?;
        let b = b.parse().map_err(|_| CoordParseError::Edge(s.to_string()))?;
        Ok(EdgeId::new(a, b))
    }
}

impl From<EdgeId> for String {
    fn from(value: EdgeId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EdgeId {
    type Error = CoordParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_tip_is_shared_by_the_two_hexes_below() {
        let hex = Axial::new(1, -1);
        let bottom = VertexId::corner(hex, 2);
        assert_eq!(bottom, VertexId::corner(Axial::new(1, 0), 4));
        assert_eq!(bottom, VertexId::corner(Axial::new(0, 0), 0));
        assert_eq!(bottom.to_string(), VertexId::corner(Axial::new(0, 0), 0).to_string());
    }

    #[test]
    fn top_tip_is_shared_by_the_two_hexes_above() {
        let hex = Axial::new(0, 1);
        let top = VertexId::corner(hex, 5);
        assert_eq!(top, VertexId::corner(Axial::new(0, 0), 1));
        assert_eq!(top, VertexId::corner(Axial::new(1, 0), 3));
    }

    #[test]
    fn side_corners_match_horizontal_neighbour() {
        let left = Axial::new(-1, 0);
        let right = Axial::new(0, 0);
        assert_eq!(VertexId::corner(left, 0), VertexId::corner(right, 4));
        assert_eq!(VertexId::corner(left, 1), VertexId::corner(right, 3));
    }

    #[test]
    fn adjacent_corners_are_one_edge_apart() {
        let hex = Axial::new(0, 0);
        let corners = hex.corners();
        for i in 0..6 {
            let a = corners[i];
            let b = corners[(i + 1) % 6];
            assert_eq!(a.scaled_distance_sq(b), 4);
            assert!(a.within_one_edge(b));
        }
        // Two corners apart is sqrt(3) edges away.
        assert_eq!(corners[0].scaled_distance_sq(corners[2]), 12);
        assert!(!corners[0].within_one_edge(corners[2]));
    }

    #[test]
    fn edge_id_is_order_independent() {
        let a = VertexId::new(1, -1);
        let b = VertexId::new(1, 1);
        assert_eq!(EdgeId::new(a, b), EdgeId::new(b, a));
        assert_eq!(EdgeId::new(b, a).to_string(), "1,-1|1,1");
    }

    #[test]
    fn ids_parse_from_wire_form() {
        let edge: EdgeId = "1,1|1,-1".parse().unwrap();
        assert_eq!(edge, EdgeId::new(VertexId::new(1, 1), VertexId::new(1, -1)));
        assert!("1;1".parse::<VertexId>().is_err());
        assert!("1,1".parse::<EdgeId>().is_err());
    }
}
