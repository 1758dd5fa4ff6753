//! # gas_graph - Static Skill Graphs
//!
//! Skills are authored as graphs of typed nodes joined by port connections:
//! - [`NodeData`]: the closed set of node kinds and their static payloads
//! - [`SkillGraph`]: nodes plus connections, loadable from JSON
//! - [`SkillDataCenter`]: the shared store answering "what hangs off port P of node N"
//! - [`formula`]: level-scaled numeric expressions used by magnitudes
//!
//! Nothing in this crate changes at runtime; the interpreter in `gas_runtime`
//! only reads it.

pub mod data;
pub mod error;
pub mod formula;
pub mod graph;
pub mod node;
pub mod store;

pub mod prelude {
    pub use crate::data::*;
    pub use crate::error::{FormulaError, GraphError, GraphResult};
    pub use crate::graph::{Connection, SkillGraph};
    pub use crate::node::*;
    pub use crate::store::SkillDataCenter;
}

pub use prelude::*;
