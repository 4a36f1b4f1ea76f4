//! Phase 2: ordering within ranks
//!
//! Alternating barycenter sweeps. Each node moves to the mean position of
//! its neighbours in the reference rank; nodes without such neighbours keep
//! their current slot. Sorting is stable, so ties resolve by current order
//! and the whole phase is deterministic.

use super::WorkGraph;

/// Bucket a component's members by rank. Members arrive sorted by input
/// index, which becomes the initial order inside each rank.
pub(super) fn build_layers(members: &[usize], ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = members.iter().map(|&v| ranks[v]).max().map_or(0, |r| r + 1);
    let mut layers = vec![Vec::new(); depth];
    for &v in members {
        layers[ranks[v]].push(v);
    }
    layers
}

/// Reduce crossings with bounded barycenter passes.
///
/// Stops early once a full down-and-up pass leaves every rank unchanged and
/// returns the ordering with the fewest crossings seen.
pub(super) fn order_layers(
    mut layers: Vec<Vec<usize>>,
    graph: &WorkGraph,
    max_passes: usize,
) -> Vec<Vec<usize>> {
    if layers.len() <= 1 {
        return layers;
    }

    let mut slot = vec![usize::MAX; graph.len()];
    for layer in &layers {
        record_slots(layer, &mut slot);
    }

    let mut best = layers.clone();
    let mut best_crossings = total_crossings(&layers, graph, &slot);

    for _pass in 0..max_passes {
        let before = layers.clone();

        // Downward sweep
        for r in 1..layers.len() {
            reorder_by_barycenter(&mut layers, r, r - 1, graph, &mut slot);
        }
        // Upward sweep
        for r in (0..layers.len() - 1).rev() {
            reorder_by_barycenter(&mut layers, r, r + 1, graph, &mut slot);
        }

        if layers == before {
            break;
        }

        let crossings = total_crossings(&layers, graph, &slot);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }

    best
}

fn record_slots(layer: &[usize], slot: &mut [usize]) {
    for (i, &v) in layer.iter().enumerate() {
        slot[v] = i;
    }
}

/// Reorder `layers[current]` by the barycenter of each node's neighbours in
/// `layers[reference]`.
fn reorder_by_barycenter(
    layers: &mut [Vec<usize>],
    current: usize,
    reference: usize,
    graph: &WorkGraph,
    slot: &mut [usize],
) {
    let reference_layer = &layers[reference];
    let slots: &[usize] = slot;

    let mut scored: Vec<(usize, f64)> = layers[current]
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let (sum, count) = graph.neighbors[v]
                .iter()
                .filter(|&&w| reference_layer.get(slots[w]) == Some(&w))
                .fold((0.0, 0usize), |(sum, count), &w| {
                    (sum + slots[w] as f64, count + 1)
                });
            let barycenter = if count > 0 {
                sum / count as f64
            } else {
                i as f64
            };
            (v, barycenter)
        })
        .collect();

    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    layers[current] = scored.into_iter().map(|(v, _)| v).collect();
    record_slots(&layers[current], slot);
}

/// Count pairwise crossings between each pair of adjacent ranks.
fn total_crossings(layers: &[Vec<usize>], graph: &WorkGraph, slot: &[usize]) -> usize {
    let mut total = 0;
    for r in 0..layers.len().saturating_sub(1) {
        let lower = &layers[r + 1];
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for (i, &u) in layers[r].iter().enumerate() {
            for &w in &graph.neighbors[u] {
                if lower.get(slot[w]) == Some(&w) {
                    segments.push((i, slot[w]));
                }
            }
        }
        for (k, &(a1, b1)) in segments.iter().enumerate() {
            for &(a2, b2) in &segments[k + 1..] {
                if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                    total += 1;
                }
            }
        }
    }
    total
}
