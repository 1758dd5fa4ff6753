//! Runtime error types
//!
//! Only setup and addressing APIs fail with an error. Gameplay rejections
//! (already active, insufficient cost, blocked by tags) are boolean results.

use crate::ids::{AbilitySpecId, AscId};
use gas_graph::{GraphError, NodeId, SkillId};
use gas_tags::TagError;
use thiserror::Error;

/// Errors raised by the ability system host
#[derive(Debug, Error)]
pub enum GasError {
    #[error("unknown unit: {0}")]
    UnknownUnit(AscId),

    #[error("skill '{0}' is not registered")]
    UnknownSkill(SkillId),

    #[error("unknown ability {0}")]
    UnknownAbility(AbilitySpecId),

    #[error("skill '{skill}' has no node '{node}'")]
    UnknownNode { skill: SkillId, node: NodeId },

    #[error("node '{0}' is not an effect node")]
    NotAnEffect(NodeId),

    #[error("tag error: {0}")]
    Tag(#[from] TagError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for host operations
pub type GasResult<T> = Result<T, GasError>;
