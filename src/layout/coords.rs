//! Phase 3: coordinate assignment
//!
//! Works in (primary, secondary) axis space and only maps to (x, y) at the
//! end, so ranking and ordering never need to know the direction.

use super::{LayoutConfig, LayoutDirection, Point};

/// Node footprint and spacing expressed along the two layout axes
#[derive(Debug, Clone, Copy)]
pub(super) struct AxisGeometry {
    direction: LayoutDirection,
    primary_extent: f64,
    secondary_extent: f64,
    rank_gap: f64,
    node_gap: f64,
}

impl AxisGeometry {
    pub fn new(config: &LayoutConfig, direction: LayoutDirection) -> Self {
        let (primary_extent, secondary_extent) = match direction {
            LayoutDirection::TopToBottom => (config.node_height, config.node_width),
            LayoutDirection::LeftToRight => (config.node_width, config.node_height),
        };
        Self {
            direction,
            primary_extent,
            secondary_extent,
            rank_gap: config.rank_gap,
            node_gap: config.node_gap,
        }
    }

    fn rank_step(&self) -> f64 {
        self.primary_extent + self.rank_gap
    }

    fn slot_step(&self) -> f64 {
        self.secondary_extent + self.node_gap
    }

    /// Convert a box centre in axis space to its top-left corner in screen
    /// space.
    fn top_left(&self, primary_center: f64, secondary_center: f64) -> Point {
        let primary = primary_center - self.primary_extent / 2.0;
        let secondary = secondary_center - self.secondary_extent / 2.0;
        match self.direction {
            LayoutDirection::TopToBottom => Point::new(secondary, primary),
            LayoutDirection::LeftToRight => Point::new(primary, secondary),
        }
    }
}

/// Place one connected component starting at `offset` on the secondary
/// axis. Each rank is centred against the component's widest rank.
///
/// Returns the component's span along the secondary axis.
pub(super) fn place_component(
    layers: &[Vec<usize>],
    offset: f64,
    geometry: &AxisGeometry,
    placed: &mut [Point],
) -> f64 {
    let widest = layers.iter().map(Vec::len).max().unwrap_or(0);
    if widest == 0 {
        return 0.0;
    }

    for (rank, layer) in layers.iter().enumerate() {
        let primary_center = rank as f64 * geometry.rank_step() + geometry.primary_extent / 2.0;
        let lead = (widest - layer.len()) as f64 / 2.0;
        for (i, &v) in layer.iter().enumerate() {
            let secondary_center = offset
                + (lead + i as f64) * geometry.slot_step()
                + geometry.secondary_extent / 2.0;
            placed[v] = geometry.top_left(primary_center, secondary_center);
        }
    }

    widest as f64 * geometry.slot_step() - geometry.node_gap
}
