//! Graph Model
//!
//! Immutable representation of the nodes and edges produced by one analysis
//! job. It carries no layout or UI state.
//!
//! ```text
//! ResultsBundle (from service)
//!        │  nodes + tree_data.edges
//!        ▼
//! validate (dangling / unknown relation / duplicate edges dropped)
//!        │
//!        ▼
//! GraphModel ──► LayoutEngine ──► LayoutResult
//!        │                              │
//!        └──────────► derive_view ◄─────┘
//! ```

mod model;
pub mod types;
pub mod validate;

pub use model::GraphModel;
pub use types::*;
pub use validate::ValidationReport;
