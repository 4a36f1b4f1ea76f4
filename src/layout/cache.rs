//! Memoized layouts
//!
//! Layout is pure, so a result can be reused for as long as the node ids,
//! edges and direction are unchanged. Entries are keyed by a SHA-256
//! fingerprint of exactly those inputs and evicted oldest-first.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::trace;

use super::{LayoutDirection, LayoutEngine, LayoutResult};
use crate::graph::{GraphEdge, GraphNode};

/// Identity of one layout input
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(nodes: &[GraphNode], edges: &[GraphEdge], direction: LayoutDirection) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(direction.as_str().as_bytes());
        hasher.update((nodes.len() as u64).to_le_bytes());
        for node in nodes {
            field(&mut hasher, &node.id);
        }
        hasher.update((edges.len() as u64).to_le_bytes());
        for edge in edges {
            field(&mut hasher, &edge.source);
            field(&mut hasher, &edge.target);
            field(&mut hasher, edge.label.as_str());
        }
        Self(hasher.finalize().into())
    }
}

/// Length-prefixed so ("ab","c") and ("a","bc") differ.
fn field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Bounded memo in front of a [`LayoutEngine`]
#[derive(Debug)]
pub struct LayoutCache {
    engine: LayoutEngine,
    capacity: usize,
    entries: VecDeque<(Fingerprint, Arc<LayoutResult>)>,
    hits: u64,
    misses: u64,
}

impl LayoutCache {
    pub const DEFAULT_CAPACITY: usize = 8;

    pub fn new(engine: LayoutEngine) -> Self {
        Self::with_capacity(engine, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(engine: LayoutEngine, capacity: usize) -> Self {
        Self {
            engine,
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Return the cached layout for these inputs, computing it on a miss.
    pub fn get_or_compute(
        &mut self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        direction: LayoutDirection,
    ) -> Arc<LayoutResult> {
        let key = Fingerprint::of(nodes, edges, direction);
        if let Some((_, result)) = self.entries.iter().find(|(k, _)| *k == key) {
            self.hits += 1;
            trace!(fingerprint = ?key, "Layout cache hit");
            return Arc::clone(result);
        }

        self.misses += 1;
        let result = Arc::new(self.engine.compute(nodes, edges, direction));
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, Arc::clone(&result)));
        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
