//! Splitter selection strategies for BSP tree construction.
//!
//! The choice of splitter affects tree balance and how many edges end up in
//! both subtrees. Selection must be deterministic for a fixed input order.

use crate::config::SPLIT_PENALTY;
use crate::{Edge, PlaneSide};

/// Strategy for selecting which edge's line splits a BSP node.
pub trait SplitterSelector {
    /// Select the index of an edge in `edges` to use as the splitter.
    ///
    /// Returns `None` if the slice is empty.
    fn select(&self, edges: &[Edge]) -> Option<usize>;
}

/// Selects the first edge in the list.
///
/// Fast, but the tree shape depends entirely on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstEdge;

impl SplitterSelector for FirstEdge {
    fn select(&self, edges: &[Edge]) -> Option<usize> {
        if edges.is_empty() { None } else { Some(0) }
    }
}

/// Selects the edge with the lowest [`splitter_score`].
///
/// Ties go to the earliest edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedSplitter;

impl SplitterSelector for BalancedSplitter {
    fn select(&self, edges: &[Edge]) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;

        let scored = (0..edges.len())
            .filter_map(|i| splitter_score(edges, i).map(|score| (i, score)));
        for (candidate, score) in scored {
            if best.is_none_or(|(_, best_score)| score < best_score) {
                best = Some((candidate, score));
            }
        }

        best.map(|(index, _)| index)
    }
}

/// Scores `edges[candidate]` as a splitter for the rest of `edges`.
///
/// `|back - front| + SPLIT_PENALTY * splits`, where a spanning edge counts
/// towards front, back and splits. Edges on the splitter line are ignored.
///
/// Returns `None` if `candidate` is not an index into `edges`.
pub fn splitter_score(edges: &[Edge], candidate: usize) -> Option<usize> {
    let plane = edges.get(candidate)?.plane();
    let mut fronts = 0usize;
    let mut backs = 0usize;
    let mut splits = 0usize;

    for (i, edge) in edges.iter().enumerate() {
        if i == candidate {
            continue;
        }
        match edge.classify(&plane) {
            PlaneSide::Front => fronts += 1,
            PlaneSide::Back => backs += 1,
            PlaneSide::Both => {
                fronts += 1;
                backs += 1;
                splits += 1;
            }
            PlaneSide::On => {}
        }
    }

    Some(backs.abs_diff(fronts) + splits * SPLIT_PENALTY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn make_edge(a: [f32; 2], b: [f32; 2]) -> Edge {
        Edge::new(Point2::new(a[0], a[1]), Point2::new(b[0], b[1]))
    }

    fn square_edges() -> Vec<Edge> {
        vec![
            make_edge([0.0, 0.0], [1.0, 0.0]),
            make_edge([1.0, 0.0], [1.0, 1.0]),
            make_edge([1.0, 1.0], [0.0, 1.0]),
            make_edge([0.0, 1.0], [0.0, 0.0]),
        ]
    }

    #[test]
    fn first_edge_empty_list() {
        assert!(FirstEdge.select(&[]).is_none());
        assert!(BalancedSplitter.select(&[]).is_none());
    }

    #[test]
    fn first_edge_picks_index_zero() {
        assert_eq!(FirstEdge.select(&square_edges()), Some(0));
    }

    #[test]
    fn convex_square_scores_are_equal() {
        let edges = square_edges();
        // Every other edge of a convex loop is behind each edge.
        for i in 0..edges.len() {
            assert_eq!(splitter_score(&edges, i), Some(3));
        }
        assert_eq!(BalancedSplitter.select(&edges), Some(0));
    }

    #[test]
    fn spanning_edges_are_penalized() {
        // A vertical edge at x = 1 crosses both horizontal edges.
        let edges = vec![
            make_edge([1.0, -1.0], [1.0, 1.0]),
            make_edge([0.0, 0.0], [2.0, 0.0]),
            make_edge([0.0, 0.5], [2.0, 0.5]),
        ];
        assert_eq!(splitter_score(&edges, 0), Some(2 * SPLIT_PENALTY));
        // Horizontal splitters see the vertical edge spanning.
        assert_eq!(splitter_score(&edges, 1), Some(1 + SPLIT_PENALTY));
        assert_eq!(BalancedSplitter.select(&edges), Some(1));
    }

    #[test]
    fn score_of_missing_candidate_is_none() {
        let edges = square_edges();
        assert_eq!(splitter_score(&edges, edges.len()), None);
        assert_eq!(splitter_score(&[], 0), None);
    }

    #[test]
    fn selection_is_deterministic() {
        let edges = square_edges();
        let first = BalancedSplitter.select(&edges);
        for _ in 0..10 {
            assert_eq!(BalancedSplitter.select(&edges), first);
        }
    }
}
