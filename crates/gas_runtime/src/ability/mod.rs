//! Ability lifecycle
//!
//! Granting, activation, timeline ticking and ending of abilities. The
//! per-ability state lives in [`GameplayAbilitySpec`]; the transitions live
//! here because they reach across units, effects and drivers.

pub mod container;
pub mod spec;

pub use container::AbilityContainer;
pub use spec::{AbilityState, AbilityTimeline, GameplayAbilitySpec, SkillCooldownInfo};

use crate::asc::AbilitySystemComponent;
use crate::context::ExecutionContext;
use crate::error::{GasError, GasResult};
use crate::events::{self, GasEvent};
use crate::host::GasHost;
use crate::ids::{AbilityRef, AbilitySpecId, AscId, CueSpecId, EffectHandle};
use gas_graph::{ports, NodeId, SkillId};
use gas_tags::GameplayTagSet;

impl GasHost {
    /// Grant the skill's ability to a unit
    pub fn grant_ability(&mut self, unit: AscId, skill: &SkillId) -> GasResult<AbilityRef> {
        self.grant_ability_with_number(unit, skill, None)
    }

    /// Grant the skill's ability, overriding its skill number
    pub fn grant_ability_with_number(
        &mut self,
        unit: AscId,
        skill: &SkillId,
        skill_number: Option<i32>,
    ) -> GasResult<AbilityRef> {
        if !self.units.contains_key(&unit) {
            return Err(GasError::UnknownUnit(unit));
        }
        let graph = self
            .data
            .get_graph(skill)
            .ok_or_else(|| GasError::UnknownSkill(skill.clone()))?;
        let id = self.ids.next_ability();
        let spec = GameplayAbilitySpec::new(id, unit, graph, skill_number, &self.config)
            .ok_or_else(|| GasError::UnknownSkill(skill.clone()))?;

        let asc = self.units.get_mut(&unit).ok_or(GasError::UnknownUnit(unit))?;
        asc.abilities.grant(spec);
        log::debug!("Granted {} to {}", events::describe(skill, id), unit);
        Ok(AbilityRef::new(unit, id))
    }

    /// Cancel (if active) and remove an ability
    pub fn remove_ability(&mut self, ability: AbilityRef) -> GasResult<()> {
        if self.ability(ability).is_none() {
            return Err(GasError::UnknownAbility(ability.spec));
        }
        self.end_ability_spec(ability.asc, ability.spec, true);
        if let Some(asc) = self.units.get_mut(&ability.asc) {
            asc.abilities.remove(ability.spec);
        }
        Ok(())
    }

    pub fn set_ability_level(&mut self, ability: AbilityRef, level: u32) -> GasResult<()> {
        let spec = self
            .units
            .get_mut(&ability.asc)
            .and_then(|asc| asc.abilities.get_mut(ability.spec))
            .ok_or(GasError::UnknownAbility(ability.spec))?;
        spec.level = level.max(1);
        Ok(())
    }

    pub fn ability(&self, ability: AbilityRef) -> Option<&GameplayAbilitySpec> {
        self.units.get(&ability.asc)?.abilities.get(ability.spec)
    }

    pub fn find_ability(&self, unit: AscId, skill: &SkillId) -> Option<AbilityRef> {
        let id = self.units.get(&unit)?.abilities.find_by_skill(skill)?;
        Some(AbilityRef::new(unit, id))
    }

    pub fn find_ability_by_number(&self, unit: AscId, skill_number: i32) -> Option<AbilityRef> {
        let id = self.units.get(&unit)?.abilities.find_by_skill_number(skill_number)?;
        Some(AbilityRef::new(unit, id))
    }

    /// Whether the ability could activate now
    pub fn can_activate_ability(&self, ability: AbilityRef) -> bool {
        let Some(asc) = self.units.get(&ability.asc) else {
            return false;
        };
        let Some(spec) = asc.abilities.get(ability.spec) else {
            return false;
        };
        if spec.is_active() {
            return false;
        }
        if asc.abilities.is_blocked(&spec.tags.asset_tags) {
            log::debug!("{} blocked by an active ability", events::describe(&spec.skill, spec.id));
            return false;
        }
        if !asc.has_all_tags(&spec.tags.activation_required_tags) {
            return false;
        }
        let blocked = &spec.tags.activation_blocked_tags;
        if !blocked.is_empty() && asc.has_any_tags(blocked) {
            log::debug!("{} blocked by owned tags", events::describe(&spec.skill, spec.id));
            return false;
        }
        self.can_afford_cost(asc, spec)
    }

    /// Cost modifiers checked against current values. Attributes the owner
    /// lacks do not block.
    fn can_afford_cost(&self, asc: &AbilitySystemComponent, spec: &GameplayAbilitySpec) -> bool {
        let Some(cost_node) = &spec.cost_node else {
            return true;
        };
        let Some(node) = self.data.get_node(&spec.skill, cost_node) else {
            return true;
        };
        let Some(effect) = node.data.effect() else {
            return true;
        };
        let context = ExecutionContext::new(spec.owner, None, spec.level);
        effect.attribute_modifiers.iter().all(|modifier| {
            let cost = self.evaluate(&modifier.magnitude, &context, 0.0).abs();
            match asc.attributes.get_current_value(modifier.attribute) {
                Some(current) if current < cost => {
                    log::debug!(
                        "{} cannot afford {:.1} {:?} (has {:.1})",
                        events::describe(&spec.skill, spec.id),
                        cost,
                        modifier.attribute,
                        current
                    );
                    false
                }
                _ => true,
            }
        })
    }

    /// Try to activate an ability against an optional main target
    pub fn try_activate_ability(&mut self, ability: AbilityRef, target: Option<AscId>) -> bool {
        if !self.can_activate_ability(ability) {
            return false;
        }
        let (unit, id) = (ability.asc, ability.spec);
        let Some(asc) = self.units.get_mut(&unit) else {
            return false;
        };
        let Some(spec) = asc.abilities.get_mut(id) else {
            return false;
        };

        spec.state = AbilityState::Active;
        spec.activation_count += 1;
        spec.running_effects.clear();
        spec.timeline.reset();
        let skill = spec.skill.clone();
        let level = spec.level;
        let tags = spec.tags.clone();
        let listens = spec.listens_to_tags();
        let animation = spec
            .timeline
            .animation_node()
            .map(|_| (spec.timeline.animation_name().to_string(), spec.timeline.is_looping()));
        spec.context = Some(ExecutionContext::new(unit, target, level).with_ability(ability));

        asc.abilities.mark_active(id);
        if listens {
            asc.abilities.add_tag_listener(id);
        }

        self.grant_tags(unit, &tags.activation_owned_tags);
        self.cancel_matching_abilities(unit, &tags.cancel_abilities_with_tags, Some(id));

        if let Some((name, looping)) = animation {
            self.animation.play_animation(unit, &name, looping);
        }
        self.events.push(GasEvent::AbilityActivated {
            unit,
            ability: id,
            skill: skill.clone(),
        });
        log::debug!("{} activated by {} (target {:?})", events::describe(&skill, id), unit, target);

        for port in [ports::COST, ports::COOLDOWN, ports::ACTIVATE] {
            if !self.is_ability_active(unit, id) {
                break;
            }
            self.run_ability_port(unit, id, port);
        }
        true
    }

    /// Cancel an active ability
    pub fn cancel_ability(&mut self, ability: AbilityRef) -> bool {
        self.end_ability_spec(ability.asc, ability.spec, true)
    }

    /// End an active ability
    pub fn end_ability(&mut self, ability: AbilityRef, was_cancelled: bool) -> bool {
        self.end_ability_spec(ability.asc, ability.spec, was_cancelled)
    }

    /// Cancel every ability of `unit` whose asset tags intersect `tags`
    pub fn cancel_abilities_with_tags(&mut self, unit: AscId, tags: &GameplayTagSet) -> usize {
        self.cancel_matching_abilities(unit, tags, None)
    }

    fn cancel_matching_abilities(
        &mut self,
        unit: AscId,
        tags: &GameplayTagSet,
        except: Option<AbilitySpecId>,
    ) -> usize {
        let Some(asc) = self.units.get(&unit) else {
            return 0;
        };
        let matching: Vec<AbilitySpecId> = asc
            .abilities
            .abilities_matching_tags(tags)
            .into_iter()
            .filter(|id| Some(*id) != except)
            .collect();
        matching
            .into_iter()
            .filter(|id| self.end_ability_spec(unit, *id, true))
            .count()
    }

    pub fn is_ability_active(&self, unit: AscId, ability: AbilitySpecId) -> bool {
        self.units
            .get(&unit)
            .and_then(|asc| asc.abilities.get(ability))
            .map(|spec| spec.is_active())
            .unwrap_or(false)
    }

    /// Whether the ability is cooling down: no charge left for charge
    /// cooldowns, otherwise the owner carries the cooldown node's first
    /// granted tag
    pub fn is_on_cooldown(&self, ability: AbilityRef) -> bool {
        let Some(spec) = self.ability(ability) else {
            return false;
        };
        let Some(cooldown_node) = &spec.cooldown_node else {
            return false;
        };
        let Some(asc) = self.units.get(&ability.asc) else {
            return false;
        };
        let charges = asc
            .effects
            .find_effect_by_node(&spec.skill, cooldown_node)
            .and_then(|id| asc.effects.get(id))
            .and_then(|effect| effect.charges);
        if let Some(charges) = charges {
            return charges.is_depleted();
        }
        self.data
            .get_node(&spec.skill, cooldown_node)
            .and_then(|node| node.data.effect().and_then(|e| e.granted_tags.first().cloned()))
            .map(|tag| asc.has_tag(&tag))
            .unwrap_or(false)
    }

    /// Cooldown summary of an ability for UI
    pub fn cooldown_info(&self, ability: AbilityRef) -> SkillCooldownInfo {
        let effect = self.ability(ability).and_then(|spec| {
            let node = spec.cooldown_node.as_ref()?;
            let asc = self.units.get(&ability.asc)?;
            asc.effects.get(asc.effects.find_effect_by_node(&spec.skill, node)?)
        });
        let Some(effect) = effect else {
            return SkillCooldownInfo::default();
        };

        match effect.charges {
            Some(charges) => SkillCooldownInfo {
                is_on_cooldown: charges.is_depleted(),
                is_charge_cooldown: true,
                current_charges: charges.current_charges,
                max_charges: charges.max_charges,
                charge_progress: charges.progress(),
                charge_time_remaining: charges.time_remaining(),
                ..SkillCooldownInfo::default()
            },
            None => SkillCooldownInfo {
                is_on_cooldown: effect.remaining_time() > 0.0,
                remaining_time: effect.remaining_time().max(0.0),
                total_duration: effect.duration().max(0.0),
                ..SkillCooldownInfo::default()
            },
        }
    }

    /// End an ability. Returns false if it was not active.
    pub(crate) fn end_ability_spec(&mut self, unit: AscId, id: AbilitySpecId, was_cancelled: bool) -> bool {
        let Some(asc) = self.units.get_mut(&unit) else {
            return false;
        };
        let Some(spec) = asc.abilities.get_mut(id) else {
            return false;
        };
        if !spec.is_active() {
            return false;
        }

        spec.state = if was_cancelled {
            AbilityState::Cancelled
        } else {
            AbilityState::Ended
        };
        let skill = spec.skill.clone();
        let running = std::mem::take(&mut spec.running_effects);
        let cues = spec.timeline.close_all();
        let has_animation = spec.timeline.animation_node().is_some();
        let owned = spec.tags.activation_owned_tags.clone();
        asc.abilities.remove_tag_listener(id);

        if has_animation {
            self.animation.stop_animation(unit, &self.config.idle_animation);
        }
        for cue in cues {
            self.stop_cue(cue);
        }
        for handle in running {
            self.remove_effect(handle);
        }
        self.revoke_tags(unit, &owned);

        self.events.push(GasEvent::AbilityEnded {
            unit,
            ability: id,
            skill: skill.clone(),
            was_cancelled,
        });
        log::debug!(
            "{} on {} {}",
            events::describe(&skill, id),
            unit,
            if was_cancelled { "cancelled" } else { "ended" }
        );

        if let Some(asc) = self.units.get_mut(&unit) {
            if let Some(spec) = asc.abilities.get_mut(id) {
                spec.state = AbilityState::Inactive;
                spec.context = None;
            }
            asc.abilities.retire(id);
        }
        true
    }

    /// Run an ability-node port with the activation context
    pub(crate) fn run_ability_port(&mut self, unit: AscId, id: AbilitySpecId, port: &str) {
        let Some((skill, node, context)) = self.ability_pass(unit, id, |spec| Some(spec.ability_node.clone())) else {
            return;
        };
        self.run_with_context(unit, id, &skill, &node, port, context);
    }

    fn run_with_context(
        &mut self,
        unit: AscId,
        id: AbilitySpecId,
        skill: &SkillId,
        node: &NodeId,
        port: &str,
        mut context: ExecutionContext,
    ) -> Vec<CueSpecId> {
        let cues = self.execute_connected_cue_nodes(skill, node, port, &mut context);
        if let Some(spec) = self
            .units
            .get_mut(&unit)
            .and_then(|asc| asc.abilities.get_mut(id))
        {
            if spec.is_active() {
                spec.context = Some(context);
            }
        }
        cues
    }

    /// Skill, start node and a copy of the context of an active ability
    fn ability_pass(
        &self,
        unit: AscId,
        id: AbilitySpecId,
        node: impl FnOnce(&GameplayAbilitySpec) -> Option<NodeId>,
    ) -> Option<(SkillId, NodeId, ExecutionContext)> {
        let spec = self.units.get(&unit)?.abilities.get(id)?;
        if !spec.is_active() {
            return None;
        }
        let context = spec.context.clone()?;
        Some((spec.skill.clone(), node(spec)?, context))
    }

    /// Advance the timelines of a unit's active abilities
    pub(crate) fn tick_abilities(&mut self, unit: AscId, dt: f32) {
        let Some(asc) = self.units.get_mut(&unit) else {
            return;
        };
        let visiting = asc.abilities.begin_update();
        for id in visiting {
            self.tick_ability(unit, id, dt);
        }
        if let Some(asc) = self.units.get_mut(&unit) {
            asc.abilities.end_update();
        }
    }

    fn tick_ability(&mut self, unit: AscId, id: AbilitySpecId, dt: f32) {
        let Some(spec) = self
            .units
            .get_mut(&unit)
            .and_then(|asc| asc.abilities.get_mut(id))
        else {
            return;
        };
        if !spec.is_active() {
            return;
        }
        spec.timeline.advance(dt);
        let triggers = spec.timeline.due_triggers();

        for port in triggers {
            let Some((skill, node, context)) =
                self.ability_pass(unit, id, |spec| spec.timeline.animation_node().cloned())
            else {
                break;
            };
            self.run_with_context(unit, id, &skill, &node, &port, context);
        }

        let opens = match self.ability_spec_mut(unit, id) {
            Some(spec) if spec.is_active() => spec.timeline.due_window_opens(),
            _ => return,
        };
        for (index, port) in opens {
            let Some((skill, node, context)) =
                self.ability_pass(unit, id, |spec| spec.timeline.animation_node().cloned())
            else {
                return;
            };
            let started = self.run_with_context(unit, id, &skill, &node, &port, context);
            let owned: Vec<CueSpecId> = started
                .into_iter()
                .filter(|cue| {
                    self.active_cues
                        .get(cue)
                        .map(|c| c.destroy_with_node)
                        .unwrap_or(false)
                })
                .collect();
            if let Some(spec) = self.ability_spec_mut(unit, id) {
                spec.timeline.record_window_cues(index, owned);
            }
        }

        let closes = match self.ability_spec_mut(unit, id) {
            Some(spec) if spec.is_active() => spec.timeline.due_window_closes(),
            _ => return,
        };
        for cue in closes {
            self.stop_cue(cue);
        }

        self.prune_running_effects(unit, id);
    }

    fn ability_spec_mut(&mut self, unit: AscId, id: AbilitySpecId) -> Option<&mut GameplayAbilitySpec> {
        self.units.get_mut(&unit)?.abilities.get_mut(id)
    }

    /// Forget running effects that have ended on their own
    fn prune_running_effects(&mut self, unit: AscId, id: AbilitySpecId) {
        let Some(spec) = self.ability(AbilityRef::new(unit, id)) else {
            return;
        };
        let alive: Vec<_> = spec
            .running_effects
            .iter()
            .copied()
            .filter(|handle| self.effect(*handle).map(|e| e.is_running()).unwrap_or(false))
            .collect();
        if let Some(spec) = self.ability_spec_mut(unit, id) {
            spec.running_effects = alive;
        }
    }

    /// Register an effect to be removed when the ability ends
    pub(crate) fn register_running_effect(&mut self, ability: AbilityRef, handle: EffectHandle) {
        if let Some(spec) = self.ability_spec_mut(ability.asc, ability.spec) {
            if spec.is_active() {
                spec.register_running_effect(handle);
            }
        }
    }

    /// Skill numbers of a unit's granted abilities
    pub fn skill_numbers(&self, unit: AscId) -> Vec<i32> {
        self.units
            .get(&unit)
            .map(|asc| asc.abilities.iter().map(|s| s.skill_number).collect())
            .unwrap_or_default()
    }
}
