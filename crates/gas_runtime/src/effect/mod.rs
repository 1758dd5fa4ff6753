//! Effect lifecycle
//!
//! Instant effects run their payload and are not tracked. Duration, infinite
//! and periodic effects become a [`GameplayEffectSpec`] in the target's
//! [`EffectContainer`] until they expire or are removed.

pub mod container;
pub mod cooldown;
pub mod projectile;
pub mod spec;
pub mod stacking;

pub use container::EffectContainer;
pub use cooldown::ChargeState;
pub use spec::GameplayEffectSpec;

use self::stacking::{ExpirationResult, StackResult};
use crate::context::{CustomValue, ExecutionContext};
use crate::damage::DamageInfo;
use crate::error::{GasError, GasResult};
use crate::events::GasEvent;
use crate::host::GasHost;
use crate::ids::{AscId, EffectHandle};
use gas_graph::{
    ports, AttributeKind, DisplaceDirection, DurationType, GraphNode, ModifierOperation, NodeData,
    NodeId, NodeKind, SkillId, StackOverflowPolicy, StackType,
};
use gas_tags::GameplayTagSet;
use std::sync::Arc;

/// Custom data key holding a placement's resolved centre
pub const PLACEMENT_POSITION: &str = "PlacementPosition";

/// Result of applying an effect node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// An instant effect ran
    Executed,
    /// A new effect is tracked
    Applied(EffectHandle),
    /// An existing stack grew
    Stacked(EffectHandle),
    /// The stack was full
    Overflowed(EffectHandle),
    /// No target, or the target failed the tag checks
    Rejected,
}

impl ApplyOutcome {
    pub fn handle(&self) -> Option<EffectHandle> {
        match self {
            ApplyOutcome::Applied(h) | ApplyOutcome::Stacked(h) | ApplyOutcome::Overflowed(h) => Some(*h),
            ApplyOutcome::Executed | ApplyOutcome::Rejected => None,
        }
    }

    /// Whether the node's output port runs afterwards
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::Executed | ApplyOutcome::Applied(_) | ApplyOutcome::Stacked(_)
        )
    }
}

impl GasHost {
    pub fn effect(&self, handle: EffectHandle) -> Option<&GameplayEffectSpec> {
        self.units.get(&handle.target)?.effects.get(handle.effect)
    }

    /// Apply an effect node of a registered skill from outside a graph pass
    pub fn apply_gameplay_effect(
        &mut self,
        skill: &SkillId,
        node: &NodeId,
        source: AscId,
        target: AscId,
    ) -> GasResult<ApplyOutcome> {
        let graph_node = self.data.get_node(skill, node).ok_or_else(|| GasError::UnknownNode {
            skill: skill.clone(),
            node: node.clone(),
        })?;
        if graph_node.data.effect().is_none() {
            return Err(GasError::NotAnEffect(node.clone()));
        }
        if !self.units.contains_key(&target) {
            return Err(GasError::UnknownUnit(target));
        }
        let mut context = ExecutionContext::new(source, Some(target), 1);
        let outcome = self.apply_effect(skill, &graph_node, &context);
        if outcome.succeeded() {
            self.execute_connected_nodes(skill, node, ports::OUTPUT, &mut context);
        }
        Ok(outcome)
    }

    /// Remove a tracked effect
    pub fn remove_active_effect(&mut self, handle: EffectHandle) -> bool {
        self.remove_effect(handle)
    }

    /// Remove a unit's effects whose asset or granted tags intersect `tags`
    pub fn remove_active_effects_with_tags(&mut self, unit: AscId, tags: &GameplayTagSet) -> usize {
        self.remove_effects_with_tags(unit, tags, None)
    }

    fn remove_effects_with_tags(&mut self, unit: AscId, tags: &GameplayTagSet, except: Option<EffectHandle>) -> usize {
        let Some(asc) = self.units.get(&unit) else {
            return 0;
        };
        let matching: Vec<EffectHandle> = asc
            .effects
            .effects_with_tags(tags)
            .into_iter()
            .map(|id| EffectHandle::new(unit, id))
            .filter(|h| Some(*h) != except)
            .collect();
        matching.into_iter().filter(|h| self.remove_effect(*h)).count()
    }

    /// Apply an effect node with a context
    pub(crate) fn apply_effect(
        &mut self,
        skill: &SkillId,
        node: &Arc<GraphNode>,
        context: &ExecutionContext,
    ) -> ApplyOutcome {
        let Some(data) = node.data.effect() else {
            log::warn!("Node '{}' of '{}' is not an effect", node.id, skill);
            return ApplyOutcome::Rejected;
        };
        let target = match node.kind() {
            NodeKind::CostEffect | NodeKind::CooldownEffect => context.caster,
            _ => context.unit_for(data.target),
        };
        let Some(target) = target else {
            log::debug!("Effect '{}' of '{}' has no {:?} target", node.id, skill, data.target);
            return ApplyOutcome::Rejected;
        };
        let Some(asc) = self.units.get(&target) else {
            log::debug!("Effect '{}' target {} is gone", node.id, target);
            return ApplyOutcome::Rejected;
        };
        if !asc.satisfies(&data.application_required_tags, &data.application_immunity_tags) {
            log::debug!("Effect '{}' rejected by {} tags", node.id, target);
            return ApplyOutcome::Rejected;
        }

        if data.duration_type == DurationType::Instant && !data.is_periodic {
            self.execute_payload(target, node, context, 1);
            self.remove_effects_with_tags(target, &data.remove_effects_with_tags, None);
            self.events.push(GasEvent::EffectExecuted {
                target,
                source: context.caster,
                node: node.id.clone(),
            });
            return ApplyOutcome::Executed;
        }

        if data.stacking.stack_type != StackType::None {
            let by_source = data.stacking.stack_type == StackType::AggregateBySource;
            if let Some(existing) = asc.effects.find_stack(skill, &node.id, context.caster, by_source) {
                return self.add_stack(skill, EffectHandle::new(target, existing));
            }
        }

        self.apply_new_effect(skill, node, target, context)
    }

    fn apply_new_effect(
        &mut self,
        skill: &SkillId,
        node: &Arc<GraphNode>,
        target: AscId,
        context: &ExecutionContext,
    ) -> ApplyOutcome {
        let Some(data) = node.data.effect() else {
            return ApplyOutcome::Rejected;
        };
        let duration = match (node.kind(), data.duration_type) {
            (NodeKind::ProjectileEffect, _) => -1.0,
            (_, DurationType::HasDuration) => self.evaluate(&data.duration, context, 0.0).max(0.0),
            (_, DurationType::Infinite) | (_, DurationType::Instant) => -1.0,
        };
        let period = if data.is_periodic {
            let period = self.evaluate(&data.period, context, 0.0);
            if period <= 0.0 {
                log::warn!(
                    "Effect '{}' of '{}' has period {}, treated as not periodic",
                    node.id,
                    skill,
                    period
                );
            }
            period.max(0.0)
        } else {
            0.0
        };

        let mut effect_context = context.clone();
        if let NodeData::PlacementEffect(placement) = &node.data {
            match self.resolve_position(&placement.position, context) {
                Some(center) => effect_context.set_custom_data(PLACEMENT_POSITION, CustomValue::Position(center)),
                None => log::warn!("Placement '{}' of '{}' has no position", node.id, skill),
            }
        }

        let id = self.ids.next_effect();
        let handle = EffectHandle::new(target, id);
        let mut spec = GameplayEffectSpec::new(id, target, skill.clone(), node.clone(), data.clone(), effect_context)
            .with_duration(duration)
            .with_period(period);
        if data.cancel_on_ability_end {
            spec.owning_ability = context.ability;
        }
        let periodic = spec.is_periodic();

        let Some(asc) = self.units.get_mut(&target) else {
            return ApplyOutcome::Rejected;
        };
        asc.effects.add(spec);

        if !data.granted_tags.is_empty() {
            if let Some(spec) = asc.effects.get_mut(id) {
                spec.tags_granted = true;
            }
            self.grant_tags(target, &data.granted_tags);
        }
        if !periodic {
            self.refresh_effect_modifiers(handle);
        }
        self.events.push(GasEvent::EffectApplied {
            effect: handle,
            source: context.caster,
            node: node.id.clone(),
        });
        log::debug!(
            "Effect '{}' of '{}' applied to {} (duration {}, period {})",
            node.id,
            skill,
            target,
            duration,
            period
        );

        self.remove_effects_with_tags(target, &data.remove_effects_with_tags, Some(handle));

        if periodic && data.execute_on_application {
            self.execute_periodic(handle);
        }
        if node.kind() == NodeKind::ProjectileEffect {
            self.spawn_projectile(handle);
        }
        if data.cancel_on_ability_end {
            if let Some(ability) = context.ability {
                self.register_running_effect(ability, handle);
            }
        }
        ApplyOutcome::Applied(handle)
    }

    fn add_stack(&mut self, skill: &SkillId, handle: EffectHandle) -> ApplyOutcome {
        let Some(spec) = self
            .units
            .get_mut(&handle.target)
            .and_then(|asc| asc.effects.get_mut(handle.effect))
        else {
            return ApplyOutcome::Rejected;
        };
        let periodic = spec.is_periodic();
        let node = spec.node.clone();
        let context = spec.context.clone();

        match spec.try_add_stack() {
            StackResult::Added(stack_count) => {
                if !periodic {
                    self.refresh_effect_modifiers(handle);
                }
                self.events.push(GasEvent::EffectStacked {
                    effect: handle,
                    stack_count,
                });
                log::debug!("Effect '{}' on {} stacked to {}", node.id, handle.target, stack_count);
                ApplyOutcome::Stacked(handle)
            }
            StackResult::Overflow(StackOverflowPolicy::Deny) => {
                log::debug!("Effect '{}' on {} is at its stack limit", node.id, handle.target);
                ApplyOutcome::Overflowed(handle)
            }
            StackResult::Overflow(StackOverflowPolicy::TriggerOverflowPort) => {
                // Source and target come from the first application, not the overflowing one
                let mut context = context;
                self.execute_connected_nodes(skill, &node.id, ports::ON_OVERFLOW, &mut context);
                self.events.push(GasEvent::EffectOverflowed {
                    effect: handle,
                    routed: true,
                });
                ApplyOutcome::Overflowed(handle)
            }
        }
    }

    /// Re-add the temporary modifiers of an effect for its current stack count
    fn refresh_effect_modifiers(&mut self, handle: EffectHandle) {
        let Some(effect) = self.effect(handle) else {
            return;
        };
        let stacks = effect.stack_count as f32;
        let modifiers: Vec<(AttributeKind, ModifierOperation, f32)> = effect
            .data
            .attribute_modifiers
            .iter()
            .map(|m| {
                let value = self.evaluate(&m.magnitude, &effect.context, 0.0);
                let value = if m.operation == ModifierOperation::Add {
                    value * stacks
                } else {
                    value
                };
                (m.attribute, m.operation, value)
            })
            .collect();

        let Some(asc) = self.units.get_mut(&handle.target) else {
            return;
        };
        let Some(spec) = asc.effects.get_mut(handle.effect) else {
            return;
        };
        let mut changes = Vec::new();
        for old in std::mem::take(&mut spec.modifiers) {
            changes.extend(asc.attributes.remove_modifier(old));
        }
        for (attribute, operation, value) in modifiers {
            if let Some((modifier, applied)) = asc.attributes.add_modifier(attribute, operation, value) {
                spec.modifiers.push(modifier);
                changes.extend(applied);
            }
        }
        self.apply_attribute_changes(handle.target, changes);
    }

    /// Run an effect's one-shot payload against `target`
    pub(crate) fn execute_payload(
        &mut self,
        target: AscId,
        node: &Arc<GraphNode>,
        context: &ExecutionContext,
        stacks: u32,
    ) {
        let stacks = stacks.max(1) as f32;
        match &node.data {
            NodeData::DamageEffect(damage) => {
                let amount = self.evaluate(&damage.damage, context, 0.0) * stacks;
                let mut info = DamageInfo::new(amount, damage.damage_type);
                if let Some(caster) = context.caster {
                    info = info.with_source(caster);
                }
                if let Some(point) = self.world.position_of(target) {
                    info = info.with_hit_point(point);
                }
                self.apply_damage(target, info);
            }
            NodeData::HealEffect(heal) => {
                let amount = self.evaluate(&heal.heal, context, 0.0) * stacks;
                if let Some(asc) = self.units.get_mut(&target) {
                    let changes = asc
                        .attributes
                        .modify_base(AttributeKind::Health, ModifierOperation::Add, amount);
                    self.apply_attribute_changes(target, changes);
                }
            }
            NodeData::DisplaceEffect(displace) => {
                let distance = self.evaluate(&displace.distance, context, 0.0);
                let from = context.caster.and_then(|c| self.world.position_of(c));
                let to = self.world.position_of(target);
                if let (Some(from), Some(to)) = (from, to) {
                    let mut direction = (to - from).normalize_or_zero();
                    if displace.direction == DisplaceDirection::TowardCaster {
                        direction = -direction;
                    }
                    self.world.displace(target, direction * distance);
                }
            }
            _ => {}
        }

        let Some(data) = node.data.effect() else {
            return;
        };
        let modifiers: Vec<(AttributeKind, ModifierOperation, f32)> = data
            .attribute_modifiers
            .iter()
            .map(|m| {
                let value = self.evaluate(&m.magnitude, context, 0.0);
                let value = if m.operation == ModifierOperation::Add {
                    value * stacks
                } else {
                    value
                };
                (m.attribute, m.operation, value)
            })
            .collect();
        let Some(asc) = self.units.get_mut(&target) else {
            return;
        };
        let mut changes = Vec::new();
        for (attribute, operation, value) in modifiers {
            changes.extend(asc.attributes.modify_base(attribute, operation, value));
        }
        self.apply_attribute_changes(target, changes);
    }

    /// One periodic execution
    pub(crate) fn execute_periodic(&mut self, handle: EffectHandle) {
        let Some(effect) = self.effect(handle) else {
            return;
        };
        if !effect.is_running() {
            return;
        }
        let node = effect.node.clone();
        let skill = effect.skill.clone();
        let context = effect.context.clone();
        let stacks = effect.stack_count;

        if let NodeData::PlacementEffect(placement) = &node.data {
            let Some(center) = context.get_position(PLACEMENT_POSITION) else {
                return;
            };
            let inside: Vec<AscId> = self
                .world
                .units_in_radius(center, placement.radius)
                .into_iter()
                .filter(|unit| placement.include_caster || Some(*unit) != context.caster)
                .filter(|unit| {
                    self.units.get(unit).is_some_and(|asc| {
                        asc.has_all_tags(&placement.required_tags) && asc.has_none_tags(&placement.excluded_tags)
                    })
                })
                .collect();
            for unit in inside {
                let mut child = context.create_with_parent_input(unit);
                self.execute_connected_nodes(&skill, &node.id, ports::ON_TICK, &mut child);
            }
            return;
        }

        self.execute_payload(handle.target, &node, &context, stacks);
        let mut context = context;
        self.execute_connected_nodes(&skill, &node.id, ports::ON_TICK, &mut context);
    }

    /// Stop a tracked effect, undoing its modifiers, tags and projectile
    pub(crate) fn remove_effect(&mut self, handle: EffectHandle) -> bool {
        let Some(asc) = self.units.get_mut(&handle.target) else {
            return false;
        };
        let Some(spec) = asc.effects.get_mut(handle.effect) else {
            return false;
        };
        if !spec.is_running {
            return false;
        }
        spec.is_running = false;
        let modifiers = std::mem::take(&mut spec.modifiers);
        let projectile = spec.projectile.take();
        let granted = spec.tags_granted.then(|| spec.data.granted_tags.clone());
        spec.tags_granted = false;
        let node = spec.node.id.clone();
        asc.effects.retire(handle.effect);

        if let Some(projectile) = projectile {
            self.projectile_owners.remove(&projectile);
            self.projectile_driver.destroy(projectile);
        }

        if let Some(asc) = self.units.get_mut(&handle.target) {
            let mut changes = Vec::new();
            for modifier in modifiers {
                changes.extend(asc.attributes.remove_modifier(modifier));
            }
            self.apply_attribute_changes(handle.target, changes);
        }
        if let Some(tags) = granted {
            self.revoke_tags(handle.target, &tags);
        }
        self.events.push(GasEvent::EffectRemoved {
            effect: handle,
            node: node.clone(),
        });
        log::debug!("Effect '{}' removed from {}", node, handle.target);
        true
    }

    /// Advance a unit's tracked effects
    pub(crate) fn tick_effects(&mut self, unit: AscId, dt: f32) {
        let Some(asc) = self.units.get_mut(&unit) else {
            return;
        };
        let visiting = asc.effects.begin_update();
        for id in visiting {
            self.tick_effect(EffectHandle::new(unit, id), dt);
        }
        if let Some(asc) = self.units.get_mut(&unit) {
            asc.effects.end_update();
        }
    }

    fn tick_effect(&mut self, handle: EffectHandle, dt: f32) {
        let Some(asc) = self.units.get(&handle.target) else {
            return;
        };
        let Some(effect) = asc.effects.get(handle.effect) else {
            return;
        };
        if !effect.is_running() {
            return;
        }
        if !asc.has_all_tags(&effect.data.ongoing_required_tags) {
            log::debug!("Effect '{}' lost its ongoing required tags", effect.node.id);
            self.remove_effect(handle);
            return;
        }
        if effect.charges.is_some() {
            self.tick_charges(handle, dt);
            return;
        }

        if effect.is_periodic() {
            if let Some(spec) = self.effect_spec_mut(handle) {
                spec.period_timer -= dt;
            }
            loop {
                let due = match self.effect_spec_mut(handle) {
                    Some(spec) if spec.is_running && spec.period_timer <= 0.0 => {
                        spec.period_timer += spec.period;
                        true
                    }
                    _ => false,
                };
                if !due {
                    break;
                }
                self.execute_periodic(handle);
            }
        }

        let Some(spec) = self.effect_spec_mut(handle) else {
            return;
        };
        if !spec.is_running || spec.is_infinite() {
            return;
        }
        spec.remaining -= dt;
        if spec.remaining > 0.0 {
            return;
        }
        if !spec.data.stacking.is_stacking() {
            self.remove_effect(handle);
            return;
        }
        let periodic = spec.is_periodic();
        match spec.on_duration_expired() {
            ExpirationResult::Remove => {
                self.remove_effect(handle);
            }
            ExpirationResult::Refreshed => {}
            ExpirationResult::StackDropped(stack_count) => {
                if !periodic {
                    self.refresh_effect_modifiers(handle);
                }
                self.events.push(GasEvent::EffectStacked {
                    effect: handle,
                    stack_count,
                });
            }
        }
    }

    pub(crate) fn effect_spec_mut(&mut self, handle: EffectHandle) -> Option<&mut GameplayEffectSpec> {
        self.units.get_mut(&handle.target)?.effects.get_mut(handle.effect)
    }
}
