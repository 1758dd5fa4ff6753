//! GasHost - owner of every unit, skill graph and driver
//!
//! All mutation goes through `&mut GasHost`. Units, abilities and effects
//! address each other by id, so a cancellation triggered in the middle of an
//! execution pass never observes a dangling reference; it finds the id gone
//! and does nothing.
//!
//! # Example
//!
//! ```
//! use gas_runtime::prelude::*;
//!
//! let mut host = GasHost::new(GasConfig::default());
//! let hero = host.create_unit("Hero", AttributeSet::new().with(AttributeKind::Health, 100.0));
//! host.tick(1.0 / 30.0);
//! assert_eq!(host.unit(hero).unwrap().attribute(AttributeKind::Health), Some(100.0));
//! ```

use crate::asc::AbilitySystemComponent;
use crate::attributes::{AttributeChange, AttributeSet};
use crate::config::GasConfig;
use crate::context::ExecutionContext;
use crate::cue::ActiveCue;
use crate::damage::DamageInfo;
use crate::driver::{
    AnimationDriver, CueDriver, NullAnimation, NullCues, NullProjectiles, PlaneWorld,
    ProjectileDriver, TagQuery, WorldQuery,
};
use crate::error::{GasError, GasResult};
use crate::events::GasEvent;
use crate::ids::{AbilitySpecId, AscId, CueSpecId, EffectHandle, IdGenerator, ProjectileId};
use crate::magnitude::{self, AttributeSource};
use gas_graph::{
    AttributeKind, GameplayEventType, Magnitude, ModifierOperation, SkillDataCenter, SkillGraph,
};
use gas_tags::{GameplayTag, GameplayTagSet, TagEvent};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tag transitions reported by unit tag observers, drained by the host
type TagInbox = Arc<Mutex<Vec<(AscId, TagEvent)>>>;

/// The ability system
pub struct GasHost {
    pub(crate) config: GasConfig,
    pub(crate) data: SkillDataCenter,
    pub(crate) units: BTreeMap<AscId, AbilitySystemComponent>,
    pub(crate) ids: IdGenerator,
    pub(crate) events: Vec<GasEvent>,
    pub(crate) animation: Box<dyn AnimationDriver>,
    pub(crate) cue_driver: Box<dyn CueDriver>,
    pub(crate) projectile_driver: Box<dyn ProjectileDriver>,
    pub(crate) world: Box<dyn WorldQuery>,
    pub(crate) projectile_owners: BTreeMap<ProjectileId, EffectHandle>,
    pub(crate) active_cues: BTreeMap<CueSpecId, ActiveCue>,
    pub(crate) tag_inbox: TagInbox,
    /// Nesting of the graph interpreter
    pub(crate) depth: u32,
}

impl GasHost {
    /// Create a host with null drivers and an empty plane world
    pub fn new(config: GasConfig) -> Self {
        log::info!(
            "Ability system host created ({} fps, max depth {})",
            config.frame_rate,
            config.max_depth
        );
        Self {
            config,
            data: SkillDataCenter::new(),
            units: BTreeMap::new(),
            ids: IdGenerator::default(),
            events: Vec::new(),
            animation: Box::new(NullAnimation),
            cue_driver: Box::new(NullCues),
            projectile_driver: Box::new(NullProjectiles::default()),
            world: Box::new(PlaneWorld::new()),
            projectile_owners: BTreeMap::new(),
            active_cues: BTreeMap::new(),
            tag_inbox: Arc::new(Mutex::new(Vec::new())),
            depth: 0,
        }
    }

    pub fn with_animation_driver(mut self, driver: impl AnimationDriver + 'static) -> Self {
        self.animation = Box::new(driver);
        self
    }

    pub fn with_cue_driver(mut self, driver: impl CueDriver + 'static) -> Self {
        self.cue_driver = Box::new(driver);
        self
    }

    pub fn with_projectile_driver(mut self, driver: impl ProjectileDriver + 'static) -> Self {
        self.projectile_driver = Box::new(driver);
        self
    }

    pub fn with_world(mut self, world: impl WorldQuery + 'static) -> Self {
        self.world = Box::new(world);
        self
    }

    pub fn config(&self) -> &GasConfig {
        &self.config
    }

    pub fn data(&self) -> &SkillDataCenter {
        &self.data
    }

    pub fn world(&self) -> &dyn WorldQuery {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut dyn WorldQuery {
        &mut *self.world
    }

    // ---- Skill registry ----

    /// Register a skill graph. Registering an id twice keeps the first graph.
    pub fn register_skill(&mut self, graph: SkillGraph) -> GasResult<Arc<SkillGraph>> {
        Ok(self.data.register_graph(graph)?)
    }

    /// Parse and register a skill graph from JSON
    pub fn register_skill_json(&mut self, json: &str) -> GasResult<Arc<SkillGraph>> {
        Ok(self.data.register_json(json)?)
    }

    // ---- Units ----

    /// Register a new unit
    pub fn create_unit(&mut self, name: &str, attributes: AttributeSet) -> AscId {
        let id = self.ids.next_asc();
        let mut asc = AbilitySystemComponent::new(id, name, attributes);
        let inbox = Arc::clone(&self.tag_inbox);
        asc.tags.subscribe(move |event| match event {
            TagEvent::Added(_) | TagEvent::Removed(_) => inbox.lock().push((id, event.clone())),
            TagEvent::Changed => {}
        });
        self.units.insert(id, asc);
        log::debug!("Unit '{}' registered as {}", name, id);
        self.events.push(GasEvent::UnitRegistered { unit: id });
        id
    }

    /// Cancel a unit's abilities, remove its effects and cues, and deregister it
    pub fn destroy_unit(&mut self, unit: AscId) -> GasResult<()> {
        let asc = self.units.get(&unit).ok_or(GasError::UnknownUnit(unit))?;
        let active = asc.abilities.cancel_all();
        let effects = asc.effects.running_ids();

        for ability in active {
            self.end_ability_spec(unit, ability, true);
        }
        for effect in effects {
            self.remove_effect(EffectHandle::new(unit, effect));
        }
        let cues: Vec<CueSpecId> = self
            .active_cues
            .iter()
            .filter(|(_, cue)| cue.unit == unit)
            .map(|(id, _)| *id)
            .collect();
        for cue in cues {
            self.stop_cue(cue);
        }

        if let Some(mut asc) = self.units.remove(&unit) {
            asc.tags.clear();
            asc.abilities.clear();
            log::debug!("Unit '{}' ({}) unregistered", asc.name, unit);
        }
        self.flush_tag_events();
        self.events.push(GasEvent::UnitUnregistered { unit });
        Ok(())
    }

    pub fn unit(&self, unit: AscId) -> Option<&AbilitySystemComponent> {
        self.units.get(&unit)
    }

    /// Mutable unit access. Attribute changes made through it skip events and
    /// gameplay reactions; tag changes are published on the next tag update
    /// or tick.
    pub fn unit_mut(&mut self, unit: AscId) -> Option<&mut AbilitySystemComponent> {
        self.units.get_mut(&unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &AbilitySystemComponent> {
        self.units.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GasEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Tags ----

    /// Add loose tags, cancelling abilities whose ongoing-blocked tags appear
    pub fn add_loose_tags(&mut self, unit: AscId, tags: &GameplayTagSet) -> GasResult<()> {
        if !self.units.contains_key(&unit) {
            return Err(GasError::UnknownUnit(unit));
        }
        self.grant_tags(unit, tags);
        Ok(())
    }

    pub fn remove_loose_tags(&mut self, unit: AscId, tags: &GameplayTagSet) -> GasResult<()> {
        if !self.units.contains_key(&unit) {
            return Err(GasError::UnknownUnit(unit));
        }
        self.revoke_tags(unit, tags);
        Ok(())
    }

    /// Add tags to a unit and notify ongoing-blocked listeners
    pub(crate) fn grant_tags(&mut self, unit: AscId, tags: &GameplayTagSet) {
        if tags.is_empty() {
            return;
        }
        if let Some(asc) = self.units.get_mut(&unit) {
            asc.tags.add_tags(tags);
        }
        self.flush_tag_events();
    }

    pub(crate) fn revoke_tags(&mut self, unit: AscId, tags: &GameplayTagSet) {
        if tags.is_empty() {
            return;
        }
        if let Some(asc) = self.units.get_mut(&unit) {
            asc.tags.remove_tags(tags);
        }
        self.flush_tag_events();
    }

    /// Publish queued tag transitions, then cancel abilities whose
    /// ongoing-blocked tags were added. Cancellation may queue more
    /// transitions; those are published in a later batch.
    pub(crate) fn flush_tag_events(&mut self) {
        loop {
            let batch = std::mem::take(&mut *self.tag_inbox.lock());
            if batch.is_empty() {
                return;
            }
            for (unit, event) in &batch {
                let (tag, added) = match event {
                    TagEvent::Added(tag) => (tag.clone(), true),
                    TagEvent::Removed(tag) => (tag.clone(), false),
                    TagEvent::Changed => continue,
                };
                self.events.push(GasEvent::TagChanged {
                    unit: *unit,
                    tag,
                    added,
                });
            }
            for (unit, event) in batch {
                let TagEvent::Added(tag) = event else {
                    continue;
                };
                let Some(listeners) = self.units.get(&unit).map(|asc| asc.abilities.tag_listeners.clone()) else {
                    continue;
                };
                for ability in listeners {
                    if self.ability_blocked_by(unit, ability, &tag) {
                        log::debug!("Ability {} on {} cancelled by tag '{}'", ability, unit, tag);
                        self.end_ability_spec(unit, ability, true);
                    }
                }
            }
        }
    }

    fn ability_blocked_by(&self, unit: AscId, ability: AbilitySpecId, tag: &GameplayTag) -> bool {
        self.units
            .get(&unit)
            .and_then(|asc| asc.abilities.get(ability))
            .map(|spec| spec.is_active() && spec.tags.ongoing_blocked_tags.has_tag(tag))
            .unwrap_or(false)
    }

    // ---- Attributes ----

    /// Set an attribute's base value
    pub fn set_attribute_base(&mut self, unit: AscId, attribute: AttributeKind, value: f32) -> GasResult<()> {
        let asc = self.units.get_mut(&unit).ok_or(GasError::UnknownUnit(unit))?;
        let changes = asc.attributes.set_base(attribute, value);
        self.apply_attribute_changes(unit, changes);
        Ok(())
    }

    /// Mitigate and apply damage to a unit's health, returning the damage dealt
    pub fn apply_damage(&mut self, target: AscId, damage: DamageInfo) -> f32 {
        let Some(asc) = self.units.get_mut(&target) else {
            log::debug!("Damage to unknown unit {} ignored", target);
            return 0.0;
        };
        let mitigation = damage
            .damage_type
            .mitigation()
            .and_then(|attr| asc.attributes.get_current_value(attr))
            .unwrap_or(0.0);
        let amount = damage.mitigated_amount(mitigation);
        if amount <= 0.0 {
            return 0.0;
        }
        let changes = asc
            .attributes
            .modify_base(AttributeKind::Health, ModifierOperation::Add, -amount);
        log::debug!(
            "{} takes {:.1} {:?} damage (from {:?})",
            target,
            amount,
            damage.damage_type,
            damage.source
        );
        self.apply_attribute_changes(target, changes);
        amount
    }

    /// Publish attribute changes and raise the derived gameplay events
    pub(crate) fn apply_attribute_changes(&mut self, unit: AscId, changes: Vec<AttributeChange>) {
        for change in changes {
            self.events.push(GasEvent::AttributeChanged { unit, change });
            if change.attribute != AttributeKind::Health {
                continue;
            }
            if change.delta() < 0.0 {
                self.raise_gameplay_event(unit, GameplayEventType::OnTakeDamage);
            } else if change.delta() > 0.0 {
                self.raise_gameplay_event(unit, GameplayEventType::OnHealed);
            }
        }
    }

    /// Run the matching event ports of the unit's active abilities
    pub fn raise_gameplay_event(&mut self, unit: AscId, event: GameplayEventType) {
        let Some(asc) = self.units.get(&unit) else {
            return;
        };
        let listeners: Vec<_> = asc
            .abilities
            .active_ids()
            .iter()
            .filter_map(|id| asc.abilities.get(*id))
            .filter(|spec| spec.is_active())
            .map(|spec| (spec.id, spec.ports_for_event(event)))
            .filter(|(_, ports)| !ports.is_empty())
            .collect();
        self.events.push(GasEvent::Gameplay { unit, event });

        for (ability, ports) in listeners {
            for port in ports {
                self.run_ability_port(unit, ability, &port);
            }
        }
    }

    // ---- Frame ----

    /// Advance projectiles, cues, abilities and effects by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.flush_tag_events();

        let projectile_events = {
            let view = TagView { units: &self.units };
            self.projectile_driver.tick(dt, &*self.world, &view)
        };
        for event in projectile_events {
            self.dispatch_projectile_event(event);
        }

        self.tick_cues(dt);

        let units: Vec<AscId> = self.units.keys().copied().collect();
        for unit in units {
            self.tick_abilities(unit, dt);
            self.tick_effects(unit, dt);
        }
    }

    /// Evaluate a magnitude against this host's attributes
    pub(crate) fn evaluate(&self, magnitude: &Magnitude, context: &ExecutionContext, default: f32) -> f32 {
        magnitude::evaluate(magnitude, context, self, default)
    }
}

impl AttributeSource for GasHost {
    fn attribute_value(&self, unit: AscId, attribute: AttributeKind) -> Option<f32> {
        self.units.get(&unit)?.attributes.get_current_value(attribute)
    }
}

/// Tag lookups over the host's units, lent to the projectile driver
pub(crate) struct TagView<'a> {
    pub(crate) units: &'a BTreeMap<AscId, AbilitySystemComponent>,
}

impl TagQuery for TagView<'_> {
    fn unit_has_any_tags(&self, unit: AscId, tags: &GameplayTagSet) -> bool {
        self.units
            .get(&unit)
            .map(|asc| asc.has_any_tags(tags))
            .unwrap_or(false)
    }
}
