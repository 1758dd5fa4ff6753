//! Damage information and mitigation

use crate::ids::AscId;
use gas_graph::DamageType;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Information about a damage instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Damage before mitigation
    pub amount: f32,
    pub damage_type: DamageType,
    /// Unit that caused the damage (if any)
    pub source: Option<AscId>,
    /// World position where damage was applied
    pub hit_point: Option<Vec2>,
}

impl DamageInfo {
    /// Create new damage info
    pub fn new(amount: f32, damage_type: DamageType) -> Self {
        Self {
            amount,
            damage_type,
            source: None,
            hit_point: None,
        }
    }

    /// Set the source unit
    pub fn with_source(mut self, source: AscId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the hit point
    pub fn with_hit_point(mut self, point: Vec2) -> Self {
        self.hit_point = Some(point);
        self
    }

    /// Damage after the target's mitigation value.
    ///
    /// Mitigation `m` scales damage by `100 / (100 + m)`; negative values
    /// count as zero. True damage ignores mitigation.
    pub fn mitigated_amount(&self, mitigation: f32) -> f32 {
        if self.damage_type == DamageType::True {
            return self.amount.max(0.0);
        }
        (self.amount * 100.0 / (100.0 + mitigation.max(0.0))).max(0.0)
    }
}

impl Default for DamageInfo {
    fn default() -> Self {
        Self::new(0.0, DamageType::Physical)
    }
}
