//! Charge-based cooldowns
//!
//! A charge cooldown node keeps one infinite effect per unit holding a
//! [`ChargeState`]. Each execution spends a charge; the node's granted tags
//! are present only while no charge is left.

use super::spec::GameplayEffectSpec;
use super::ApplyOutcome;
use crate::context::ExecutionContext;
use crate::events::GasEvent;
use crate::host::GasHost;
use crate::ids::EffectHandle;
use gas_graph::{GraphNode, NodeData, SkillId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Charges of a charge-mode cooldown.
///
/// One charge is restored every `charge_time` seconds while below the
/// maximum; the timer is idle (zero) when full.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeState {
    pub max_charges: u32,
    pub current_charges: u32,
    pub charge_time: f32,
    /// Seconds until the next charge, zero when idle
    pub timer: f32,
}

impl ChargeState {
    /// Full charges
    pub fn new(max_charges: u32, charge_time: f32) -> Self {
        let max_charges = max_charges.max(1);
        Self {
            max_charges,
            current_charges: max_charges,
            charge_time,
            timer: 0.0,
        }
    }

    /// Use one charge. Returns false when none is left.
    pub fn spend(&mut self) -> bool {
        if self.current_charges == 0 {
            return false;
        }
        self.current_charges -= 1;
        if self.timer <= 0.0 && self.current_charges < self.max_charges {
            self.timer = self.charge_time;
        }
        true
    }

    /// Advance the charge timer. Returns true when a charge was restored.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.current_charges >= self.max_charges {
            self.timer = 0.0;
            return false;
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return false;
        }
        self.current_charges += 1;
        self.timer = if self.current_charges < self.max_charges {
            self.charge_time
        } else {
            0.0
        };
        true
    }

    pub fn is_depleted(&self) -> bool {
        self.current_charges == 0
    }

    /// 0..1 progress of the charge being restored
    pub fn progress(&self) -> f32 {
        if self.current_charges >= self.max_charges || self.charge_time <= 0.0 {
            return 1.0;
        }
        (1.0 - self.timer / self.charge_time).clamp(0.0, 1.0)
    }

    pub fn time_remaining(&self) -> f32 {
        self.timer.max(0.0)
    }
}

impl GasHost {
    /// Spend a charge of the caster's charge cooldown, creating it full on
    /// first use
    pub(crate) fn execute_charge_cooldown(
        &mut self,
        skill: &SkillId,
        node: &Arc<GraphNode>,
        context: &ExecutionContext,
    ) -> ApplyOutcome {
        let NodeData::CooldownEffect(cooldown) = &node.data else {
            return ApplyOutcome::Rejected;
        };
        let Some(caster) = context.caster else {
            return ApplyOutcome::Rejected;
        };
        let Some(asc) = self.units.get(&caster) else {
            return ApplyOutcome::Rejected;
        };

        let handle = match asc.effects.find_effect_by_node(skill, &node.id) {
            Some(existing) => EffectHandle::new(caster, existing),
            None => {
                let charge_time = self.evaluate(&cooldown.charge_time, context, self.config.default_charge_time);
                let id = self.ids.next_effect();
                let mut spec = GameplayEffectSpec::new(
                    id,
                    caster,
                    skill.clone(),
                    node.clone(),
                    cooldown.effect.clone(),
                    context.clone(),
                )
                .with_duration(-1.0);
                spec.charges = Some(ChargeState::new(cooldown.max_charges, charge_time));
                let Some(asc) = self.units.get_mut(&caster) else {
                    return ApplyOutcome::Rejected;
                };
                asc.effects.add(spec);
                let handle = EffectHandle::new(caster, id);
                self.events.push(GasEvent::EffectApplied {
                    effect: handle,
                    source: Some(caster),
                    node: node.id.clone(),
                });
                log::debug!(
                    "Charge cooldown '{}' of '{}' created on {} ({} charges, {}s)",
                    node.id,
                    skill,
                    caster,
                    cooldown.max_charges,
                    charge_time
                );
                handle
            }
        };

        if let Some(charges) = self.effect_spec_mut(handle).and_then(|spec| spec.charges.as_mut()) {
            if !charges.spend() {
                log::debug!("Charge cooldown '{}' on {} has no charge left", node.id, caster);
            }
        }
        self.refresh_charge_tags(handle);
        ApplyOutcome::Applied(handle)
    }

    /// Advance a charge cooldown
    pub(crate) fn tick_charges(&mut self, handle: EffectHandle, dt: f32) {
        let restored = self
            .effect_spec_mut(handle)
            .and_then(|spec| spec.charges.as_mut())
            .map(|charges| charges.tick(dt))
            .unwrap_or(false);
        if restored {
            self.refresh_charge_tags(handle);
        }
    }

    /// Grant the cooldown tags while depleted, revoke them otherwise
    fn refresh_charge_tags(&mut self, handle: EffectHandle) {
        let Some(spec) = self.effect_spec_mut(handle) else {
            return;
        };
        let Some(charges) = spec.charges else {
            return;
        };
        let tags = spec.data.granted_tags.clone();
        if tags.is_empty() {
            return;
        }
        if charges.is_depleted() && !spec.tags_granted {
            spec.tags_granted = true;
            self.grant_tags(handle.target, &tags);
        } else if !charges.is_depleted() && spec.tags_granted {
            spec.tags_granted = false;
            self.revoke_tags(handle.target, &tags);
        }
    }
}
