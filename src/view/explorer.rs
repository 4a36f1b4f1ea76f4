//! Interactive exploration of one job's results.

use std::sync::Arc;

use tracing::debug;

use super::{derive_view, headline_insight, EdgeFilter, GraphView, ViewState};
use crate::job::AnalysisResults;
use crate::layout::{LayoutCache, LayoutDirection, LayoutEngine, LayoutResult};

/// Results plus the user's view choices, with layouts memoized per
/// direction
#[derive(Debug)]
pub struct ResultsExplorer {
    results: Arc<AnalysisResults>,
    direction: LayoutDirection,
    layouts: LayoutCache,
    state: ViewState,
}

impl ResultsExplorer {
    pub fn new(results: Arc<AnalysisResults>, engine: LayoutEngine) -> Self {
        Self {
            results,
            direction: LayoutDirection::default(),
            layouts: LayoutCache::new(engine),
            state: ViewState::default(),
        }
    }

    pub fn results(&self) -> &Arc<AnalysisResults> {
        &self.results
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn set_direction(&mut self, direction: LayoutDirection) {
        self.direction = direction;
    }

    pub fn set_filter(&mut self, filter: EdgeFilter) {
        self.state.set_filter(filter);
    }

    pub fn select(&mut self, node_id: &str) {
        self.state.select(node_id);
        debug!(selected = ?self.state.selected, "Selection changed");
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    /// Layout for the current direction.
    pub fn layout(&mut self) -> Arc<LayoutResult> {
        let graph = &self.results.graph;
        self.layouts
            .get_or_compute(graph.nodes(), graph.edges(), self.direction)
    }

    pub fn view(&mut self) -> GraphView {
        let layout = self.layout();
        derive_view(&self.results.graph, &layout, &self.state)
    }

    pub fn insight(&self) -> String {
        headline_insight(&self.results.report)
    }

    /// Layout cache (hits, misses).
    pub fn cache_stats(&self) -> (u64, u64) {
        self.layouts.stats()
    }
}
