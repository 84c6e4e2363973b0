use std::collections::{HashMap, HashSet};

use crate::coords::{EdgeId, VertexId};

/// Length of the longest trail through `edges`: no edge is used twice,
/// vertices may repeat. Exhaustive search, which is fine for the 15 roads a
/// player can own.
pub fn longest_path<'a>(edges: impl IntoIterator<Item = &'a EdgeId>) -> u8 {
    let mut adjacency: HashMap<VertexId, Vec<(VertexId, EdgeId)>> = HashMap::new();
    for edge in edges {
        let (a, b) = edge.endpoints();
        adjacency.entry(a).or_default().push((b, *edge));
        adjacency.entry(b).or_default().push((a, *edge));
    }

    let mut visited = HashSet::new();
    adjacency
        .keys()
        .map(|start| trail_from(&adjacency, *start, &mut visited))
        .max()
        .unwrap_or(0)
}

fn trail_from(
    adjacency: &HashMap<VertexId, Vec<(VertexId, EdgeId)>>,
    vertex: VertexId,
    visited: &mut HashSet<EdgeId>,
) -> u8 {
    let mut best = 0;
    let Some(neighbors) = adjacency.get(&vertex) else {
        return best;
    };
    for &(next, edge) in neighbors {
        if !visited.insert(edge) {
            continue;
        }
        best = best.max(1 + trail_from(adjacency, next, visited));
        visited.remove(&edge);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: i32) -> VertexId {
        VertexId::new(x, 0)
    }

    fn chain(points: &[VertexId]) -> Vec<EdgeId> {
        points
            .windows(2)
            .map(|pair| EdgeId::new(pair[0], pair[1]))
            .collect()
    }

    #[test]
    fn no_roads_is_zero() {
        assert_eq!(longest_path(&[]), 0);
    }

    #[test]
    fn straight_chain_counts_every_edge() {
        let points: Vec<_> = (0..6).map(v).collect();
        assert_eq!(longest_path(&chain(&points)), 5);
    }

    #[test]
    fn y_junction_uses_two_arms() {
        let hub = VertexId::new(0, 0);
        let mut edges = Vec::new();
        for arm in 1..=3 {
            let mid = VertexId::new(arm, 1);
            let tip = VertexId::new(arm, 2);
            edges.push(EdgeId::new(hub, mid));
            edges.push(EdgeId::new(mid, tip));
        }
        assert_eq!(longest_path(&edges), 4);
    }

    #[test]
    fn closed_loop_counts_each_edge_once() {
        let square = [
            VertexId::new(0, 0),
            VertexId::new(1, 0),
            VertexId::new(1, 1),
            VertexId::new(0, 1),
            VertexId::new(0, 0),
        ];
        assert_eq!(longest_path(&chain(&square)), 4);
    }

    #[test]
    fn loop_with_tail_walks_round_the_loop() {
        let mut points = vec![VertexId::new(0, 0), VertexId::new(1, 0), VertexId::new(1, 1)];
        points.extend([VertexId::new(0, 1), VertexId::new(0, 0), VertexId::new(-1, 0)]);
        assert_eq!(longest_path(&chain(&points)), 5);
    }

    #[test]
    fn disconnected_segments_report_the_longer_one() {
        let mut edges = chain(&[v(0), v(1), v(2)]);
        edges.extend(chain(&[v(10), v(11), v(12), v(13)]));
        assert_eq!(longest_path(&edges), 3);
    }
}
