//! Phase 1: cycle breaking and rank assignment

use std::collections::VecDeque;

use super::WorkGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Mark every edge that closes a cycle.
///
/// Depth-first search from the sources (input order), then from any node
/// still unvisited. An edge into a node on the current DFS path would force
/// its target to an equal-or-lower rank, so it is a back edge. Self-loops
/// always are. On an acyclic input nothing is marked.
pub(super) fn classify_back_edges(graph: &WorkGraph) -> Vec<bool> {
    let n = graph.len();
    let mut back = vec![false; graph.edges.len()];

    let mut in_degree = vec![0usize; n];
    for &(u, v) in graph.edges.iter().flatten() {
        if u != v {
            in_degree[v] += 1;
        }
    }

    let mut state = vec![Visit::New; n];
    let roots = (0..n).filter(|&v| in_degree[v] == 0).chain(0..n);

    for root in roots {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (u, cursor) = *frame;
            match graph.out[u].get(cursor) {
                Some(&(v, edge)) => {
                    frame.1 += 1;
                    match state[v] {
                        Visit::New => {
                            state[v] = Visit::Active;
                            stack.push((v, 0));
                        }
                        Visit::Active => back[edge] = true,
                        Visit::Done => {}
                    }
                }
                None => {
                    state[u] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }

    back
}

/// Longest-path layering over the forward edges.
///
/// Sources get rank 0; every other node sits one past its deepest
/// predecessor, so each forward edge strictly increases rank.
pub(super) fn assign_ranks(graph: &WorkGraph, back: &[bool]) -> Vec<usize> {
    let n = graph.len();
    let mut in_degree = vec![0usize; n];
    for (i, ends) in graph.edges.iter().enumerate() {
        if let Some((_, v)) = ends {
            if !back[i] {
                in_degree[*v] += 1;
            }
        }
    }

    let mut ranks = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();

    while let Some(u) = queue.pop_front() {
        for &(v, edge) in &graph.out[u] {
            if back[edge] {
                continue;
            }
            ranks[v] = ranks[v].max(ranks[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                queue.push_back(v);
            }
        }
    }

    ranks
}
