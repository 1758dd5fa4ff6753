//! Execution context threaded through graph interpretation
//!
//! One context is created per ability activation. Asynchronous branches
//! (projectile hits, search results) derive child contexts with
//! [`ExecutionContext::create_with_parent_input`].

use crate::ids::{AbilityRef, AscId, ProjectileId};
use gas_graph::TargetSelector;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Values that can be passed between nodes in one execution pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CustomValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    Text(String),
    Position(Vec2),
    Unit(AscId),
}

/// Per-activation scratch state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionContext {
    pub caster: Option<AscId>,
    pub main_target: Option<AscId>,
    /// The unit that caused the current sub-branch
    pub parent_input_target: Option<AscId>,
    pub ability_level: u32,
    /// Accumulated targets, unique, in insertion order
    pub targets: Vec<AscId>,
    pub custom_data: HashMap<String, CustomValue>,
    /// The ability this pass runs for, if any
    pub ability: Option<AbilityRef>,
    /// The projectile driving this branch, if any
    pub projectile: Option<ProjectileId>,
}

impl ExecutionContext {
    /// Create a new context for `caster`
    pub fn new(caster: AscId, main_target: Option<AscId>, level: u32) -> Self {
        let mut context = Self {
            caster: Some(caster),
            main_target,
            ability_level: level.max(1),
            ..Self::default()
        };
        if let Some(target) = main_target {
            context.add_target(target);
        }
        context
    }

    /// Attach the owning ability
    pub fn with_ability(mut self, ability: AbilityRef) -> Self {
        self.ability = Some(ability);
        self
    }

    /// Derive a child context rebinding the current target.
    ///
    /// Caster, level, main target, ability, projectile and custom data are
    /// kept; the target list restarts with `target`.
    pub fn create_with_parent_input(&self, target: AscId) -> Self {
        Self {
            caster: self.caster,
            main_target: self.main_target,
            parent_input_target: Some(target),
            ability_level: self.ability_level,
            targets: vec![target],
            custom_data: self.custom_data.clone(),
            ability: self.ability,
            projectile: self.projectile,
        }
    }

    /// Parent-input target when set, otherwise the main target
    pub fn current_target(&self) -> Option<AscId> {
        self.parent_input_target.or(self.main_target)
    }

    /// Resolve a selector to a unit
    pub fn unit_for(&self, selector: TargetSelector) -> Option<AscId> {
        match selector {
            TargetSelector::Caster => self.caster,
            TargetSelector::MainTarget => self.main_target,
            TargetSelector::ParentInput => self.parent_input_target,
            TargetSelector::Current => self.current_target(),
        }
    }

    /// Add a target once
    pub fn add_target(&mut self, target: AscId) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn set_custom_data(&mut self, key: impl Into<String>, value: CustomValue) {
        self.custom_data.insert(key.into(), value);
    }

    pub fn get_custom_data(&self, key: &str) -> Option<&CustomValue> {
        self.custom_data.get(key)
    }

    /// Numeric custom value, ints and bools converted
    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.custom_data.get(key)? {
            CustomValue::Float(v) => Some(*v),
            CustomValue::Int(v) => Some(*v as f32),
            CustomValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Position custom value
    pub fn get_position(&self, key: &str) -> Option<Vec2> {
        match self.custom_data.get(key)? {
            CustomValue::Position(p) => Some(*p),
            _ => None,
        }
    }
}
