//! Graph and formula errors

use crate::node::NodeId;
use thiserror::Error;

/// Errors raised while building or loading skill graphs
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A node was added twice under the same id
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// A connection referenced a node that is not in the graph
    #[error("connection references unknown node: {0}")]
    UnknownNode(NodeId),

    /// The graph has no ability node
    #[error("skill '{0}' has no ability node")]
    MissingAbilityNode(String),

    /// The skill id was empty
    #[error("skill id is empty")]
    EmptySkillId,
}

/// Errors raised while evaluating formula strings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
