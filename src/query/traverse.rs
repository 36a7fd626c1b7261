//! Graph traversal operator
//!
//! BFS over a directed edge relation, used by subgraph extraction: starting
//! from a root term, visit nodes up to `max_depth` edges away and return
//! only the edges whose endpoints were both visited. A root absent from the
//! relation yields an empty result, as does a depth of zero.

use fnv::{FnvHashMap, FnvHashSet};

use crate::term::TermId;

/// Extract the reachable subgraph around `root`
///
/// Depth counts edges, not nodes. Edges between two visited nodes are
/// returned even when the edge itself was not on a shortest path.
pub fn bfs_subgraph(
    edges: &[(TermId, TermId)],
    root: TermId,
    max_depth: usize,
) -> Vec<(TermId, TermId)> {
    if max_depth == 0 {
        return Vec::new();
    }

    let mut adjacency: FnvHashMap<TermId, Vec<TermId>> = FnvHashMap::default();
    let mut known: FnvHashSet<TermId> = FnvHashSet::default();
    for &(from, to) in edges {
        adjacency.entry(from).or_default().push(to);
        known.insert(from);
        known.insert(to);
    }
    if !known.contains(&root) {
        return Vec::new();
    }

    let mut visited: FnvHashSet<TermId> = FnvHashSet::default();
    visited.insert(root);
    let mut frontier = vec![root];
    for _ in 0..max_depth {
        let mut next = Vec::new();
        for node in frontier {
            for &target in adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]) {
                if visited.insert(target) {
                    next.push(target);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    edges
        .iter()
        .copied()
        .filter(|(from, to)| visited.contains(from) && visited.contains(to))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> TermId {
        TermId::from_raw(raw)
    }

    fn chain() -> Vec<(TermId, TermId)> {
        // A→B, B→C, B→D, E→F, F→G
        vec![
            (id(1), id(2)),
            (id(2), id(3)),
            (id(2), id(4)),
            (id(5), id(6)),
            (id(6), id(7)),
        ]
    }

    #[test]
    fn test_depth_two_reaches_grandchildren_only() {
        let result = bfs_subgraph(&chain(), id(1), 2);
        assert_eq!(
            result,
            vec![(id(1), id(2)), (id(2), id(3)), (id(2), id(4))]
        );
    }

    #[test]
    fn test_unconnected_component_is_excluded() {
        let result = bfs_subgraph(&chain(), id(1), 10);
        assert!(!result.contains(&(id(5), id(6))));
    }

    #[test]
    fn test_missing_root_yields_empty() {
        assert!(bfs_subgraph(&chain(), id(99), 3).is_empty());
    }

    #[test]
    fn test_depth_zero_yields_empty() {
        assert!(bfs_subgraph(&chain(), id(1), 0).is_empty());
    }

    #[test]
    fn test_depth_one_stops_at_children() {
        let result = bfs_subgraph(&chain(), id(1), 1);
        assert_eq!(result, vec![(id(1), id(2))]);
    }
}
