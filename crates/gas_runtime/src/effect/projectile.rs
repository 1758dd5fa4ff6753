//! Projectile effects
//!
//! A projectile effect stays applied while its projectile flies. The host
//! spawns the projectile through the driver and maps driver events back to
//! the effect's ports.

use crate::context::{CustomValue, ExecutionContext};
use crate::driver::{ProjectileEvent, ProjectileEventKind, ProjectileInitData};
use crate::host::GasHost;
use crate::ids::{AscId, EffectHandle};
use gas_graph::{ports, NodeData, PositionSource, ProjectileTargetType};
use glam::Vec2;

pub const HIT_POSITION: &str = "HitPosition";
pub const BOUNCE_POSITION: &str = "BouncePosition";
pub const REACH_POSITION: &str = "ReachPosition";

impl GasHost {
    /// Resolve a position source against a context
    pub fn resolve_position(&self, source: &PositionSource, context: &ExecutionContext) -> Option<Vec2> {
        let unit = match source {
            PositionSource::Caster => context.caster,
            PositionSource::MainTarget => context.main_target,
            PositionSource::ParentInput => context.parent_input_target,
            PositionSource::Current => context.current_target(),
            PositionSource::CustomData(key) => match context.get_custom_data(key)? {
                CustomValue::Position(position) => return Some(*position),
                CustomValue::Unit(unit) => Some(*unit),
                _ => None,
            },
        };
        self.world.position_of(unit?)
    }

    /// Spawn the projectile of a freshly applied projectile effect
    pub(crate) fn spawn_projectile(&mut self, handle: EffectHandle) {
        let Some(effect) = self.effect(handle) else {
            return;
        };
        let NodeData::ProjectileEffect(data) = &effect.node.data else {
            return;
        };
        let context = &effect.context;

        let Some(launch_position) = self.resolve_position(&data.launch_position_source, context) else {
            log::warn!(
                "Projectile '{}' of '{}' has no launch position, removing",
                effect.node.id,
                effect.skill
            );
            self.remove_effect(handle);
            return;
        };

        let target_unit = match data.projectile_target_type {
            ProjectileTargetType::Unit => match data.target_position_source {
                PositionSource::Caster => context.caster,
                PositionSource::ParentInput => context.parent_input_target,
                _ => context.main_target,
            },
            ProjectileTargetType::Position => None,
        };
        let target_position = self
            .resolve_position(&data.target_position_source, context)
            .or_else(|| target_unit.and_then(|unit| self.world.position_of(unit)))
            .unwrap_or(launch_position);

        let mut direction = (target_position - launch_position).normalize_or_zero();
        if data.projectile_target_type == ProjectileTargetType::Position && data.offset_angle.abs() > 0.01 {
            direction = Vec2::from_angle(-data.offset_angle.to_radians()).rotate(direction);
        }

        let init = ProjectileInitData {
            launch_position,
            target_position,
            direction,
            target_unit,
            target_type: data.projectile_target_type,
            fly_over: data.fly_over,
            curve_height: data.curve_height,
            speed: data.speed,
            max_distance: data.max_distance,
            collision_radius: data.collision_radius,
            is_piercing: data.is_piercing,
            max_pierce_count: data.max_pierce_count,
            collision_target_tags: data.collision_target_tags.clone(),
            collision_exclude_tags: data.collision_exclude_tags.clone(),
            is_bouncing: data.is_bouncing,
            bounce_target_mode: data.bounce_target_mode,
            max_bounce_count: data.max_bounce_count,
            bounce_search_radius: data.bounce_search_radius,
            can_bounce_to_same_target: data.can_bounce_to_same_target,
            bounce_angle_offset: data.bounce_angle_offset,
            source: context.caster,
            effect: handle,
            skill: effect.skill.clone(),
            node: effect.node.id.clone(),
        };

        let id = self.ids.next_projectile();
        if let Some(spec) = self.effect_spec_mut(handle) {
            spec.projectile = Some(id);
            spec.context.projectile = Some(id);
        }
        self.projectile_owners.insert(id, handle);
        log::debug!(
            "Projectile {} launched from {:?} toward {:?} ({:?})",
            id,
            init.launch_position,
            init.target_position,
            init.target_unit
        );
        self.projectile_driver.spawn(id, init);
    }

    /// Route a driver event to the owning effect's ports
    pub(crate) fn dispatch_projectile_event(&mut self, event: ProjectileEvent) {
        let Some(&handle) = self.projectile_owners.get(&event.projectile) else {
            log::debug!("Event for unknown projectile {} ignored", event.projectile);
            return;
        };
        let Some(effect) = self.effect(handle) else {
            self.projectile_owners.remove(&event.projectile);
            return;
        };
        let skill = effect.skill.clone();
        let node = effect.node.id.clone();
        let context = effect.context.clone();

        match event.kind {
            ProjectileEventKind::Hit { target, position } => {
                let mut child = Self::branch(&context, target, HIT_POSITION, position);
                self.execute_connected_nodes(&skill, &node, ports::ON_HIT, &mut child);
            }
            ProjectileEventKind::Bounce {
                target: Some(target),
                position,
            } => {
                let mut child = Self::branch(&context, target, BOUNCE_POSITION, position);
                self.execute_connected_nodes(&skill, &node, ports::ON_BOUNCE, &mut child);
            }
            ProjectileEventKind::Bounce { target: None, .. } => {}
            ProjectileEventKind::Reach { position } => {
                let mut reached = context;
                reached.set_custom_data(REACH_POSITION, CustomValue::Position(position));
                self.execute_connected_nodes(&skill, &node, ports::ON_REACH, &mut reached);
            }
            ProjectileEventKind::Destroyed => {
                self.projectile_owners.remove(&event.projectile);
                if let Some(spec) = self.effect_spec_mut(handle) {
                    spec.projectile = None;
                }
                self.remove_effect(handle);
            }
        }
    }

    fn branch(context: &ExecutionContext, target: AscId, key: &str, position: Vec2) -> ExecutionContext {
        let mut child = context.create_with_parent_input(target);
        child.set_custom_data(key, CustomValue::Position(position));
        child
    }

    pub fn projectile_count(&self) -> usize {
        self.projectile_owners.len()
    }
}
