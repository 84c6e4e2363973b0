use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use smallvec::SmallVec;

use crate::board::HexId;
use crate::coords::{EdgeId, STANDARD_LAYOUT, VertexId};

/// Vertex and edge adjacency of the standard board. Independent of the
/// shuffled terrain, so it is computed once and shared.
#[derive(Debug, Clone)]
pub struct Topology {
    pub vertices: BTreeSet<VertexId>,
    pub edges: BTreeSet<EdgeId>,
    vertex_hexes: HashMap<VertexId, SmallVec<[HexId; 3]>>,
    vertex_edges: HashMap<VertexId, SmallVec<[EdgeId; 3]>>,
}

pub static TOPOLOGY: Lazy<Topology> = Lazy::new(Topology::standard);

impl Topology {
    fn standard() -> Self {
        let mut vertices = BTreeSet::new();
        let mut edges = BTreeSet::new();
        let mut vertex_hexes: HashMap<VertexId, SmallVec<[HexId; 3]>> = HashMap::new();

        for (idx, coord) in STANDARD_LAYOUT.iter().enumerate() {
            let corners = coord.corners();
            for (i, corner) in corners.iter().enumerate() {
                vertices.insert(*corner);
                vertex_hexes.entry(*corner).or_default().push(idx as HexId);
                edges.insert(EdgeId::new(*corner, corners[(i + 1) % corners.len()]));
            }
        }

        let mut vertex_edges: HashMap<VertexId, SmallVec<[EdgeId; 3]>> = HashMap::new();
        for edge in &edges {
            let (a, b) = edge.endpoints();
            vertex_edges.entry(a).or_default().push(*edge);
            vertex_edges.entry(b).or_default().push(*edge);
        }

        Self {
            vertices,
            edges,
            vertex_hexes,
            vertex_edges,
        }
    }

    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    pub fn hexes_at(&self, vertex: VertexId) -> &[HexId] {
        self.vertex_hexes
            .get(&vertex)
            .map(|hexes| hexes.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges_at(&self, vertex: VertexId) -> &[EdgeId] {
        self.vertex_edges
            .get(&vertex)
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Axial;

    #[test]
    fn standard_board_has_54_vertices_and_72_edges() {
        assert_eq!(TOPOLOGY.vertices.len(), 54);
        assert_eq!(TOPOLOGY.edges.len(), 72);
    }

    #[test]
    fn centre_hex_corners_touch_three_hexes() {
        for corner in Axial::new(0, 0).corners() {
            assert_eq!(TOPOLOGY.hexes_at(corner).len(), 3);
            assert_eq!(TOPOLOGY.edges_at(corner).len(), 3);
        }
    }

    #[test]
    fn coastal_tip_touches_one_hex() {
        let top = crate::coords::VertexId::corner(Axial::new(0, -2), 5);
        assert_eq!(TOPOLOGY.hexes_at(top), &[0]);
        assert_eq!(TOPOLOGY.edges_at(top).len(), 2);
    }

    #[test]
    fn every_edge_joins_adjacent_vertices() {
        for edge in &TOPOLOGY.edges {
            let (a, b) = edge.endpoints();
            assert_eq!(a.scaled_distance_sq(b), 4);
        }
    }
}
