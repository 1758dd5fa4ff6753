//! Per-unit container of granted abilities

use super::spec::{AbilityState, GameplayAbilitySpec};
use crate::ids::AbilitySpecId;
use gas_graph::SkillId;
use gas_tags::GameplayTagSet;
use std::collections::BTreeMap;

/// Granted abilities of one unit.
///
/// Removal requested while the container is being ticked is deferred until
/// the tick pass ends.
#[derive(Debug, Default)]
pub struct AbilityContainer {
    specs: BTreeMap<AbilitySpecId, GameplayAbilitySpec>,
    active: Vec<AbilitySpecId>,
    pending_remove: Vec<AbilitySpecId>,
    is_updating: bool,
    /// Specs with ongoing-blocked tags, notified of tag additions
    pub(crate) tag_listeners: Vec<AbilitySpecId>,
}

impl AbilityContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, spec: GameplayAbilitySpec) -> AbilitySpecId {
        let id = spec.id;
        self.specs.insert(id, spec);
        id
    }

    pub fn get(&self, id: AbilitySpecId) -> Option<&GameplayAbilitySpec> {
        self.specs.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: AbilitySpecId) -> Option<&mut GameplayAbilitySpec> {
        self.specs.get_mut(&id)
    }

    /// Remove a spec immediately
    pub(crate) fn remove(&mut self, id: AbilitySpecId) -> Option<GameplayAbilitySpec> {
        self.active.retain(|a| *a != id);
        self.pending_remove.retain(|a| *a != id);
        self.tag_listeners.retain(|a| *a != id);
        self.specs.remove(&id)
    }

    pub fn contains(&self, id: AbilitySpecId) -> bool {
        self.specs.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayAbilitySpec> {
        self.specs.values()
    }

    pub fn find_by_skill_number(&self, skill_number: i32) -> Option<AbilitySpecId> {
        self.specs
            .values()
            .find(|s| s.skill_number == skill_number)
            .map(|s| s.id)
    }

    pub fn find_by_skill(&self, skill: &SkillId) -> Option<AbilitySpecId> {
        self.specs.values().find(|s| &s.skill == skill).map(|s| s.id)
    }

    /// Whether any granted ability carries one of `tags` as an asset tag
    pub fn has_ability_with_tag(&self, tags: &GameplayTagSet) -> bool {
        self.specs.values().any(|s| s.tags.asset_tags.intersects(tags))
    }

    /// Whether any active ability carries one of `tags` as an asset tag
    pub fn has_active_ability_with_tag(&self, tags: &GameplayTagSet) -> bool {
        self.active_specs().any(|s| s.tags.asset_tags.intersects(tags))
    }

    /// Whether an active ability blocks a candidate with `asset_tags`
    pub fn is_blocked(&self, asset_tags: &GameplayTagSet) -> bool {
        self.active_specs().any(|s| s.blocks_ability_with_tags(asset_tags))
    }

    /// Abilities whose asset tags intersect `tags`
    pub fn abilities_matching_tags(&self, tags: &GameplayTagSet) -> Vec<AbilitySpecId> {
        if tags.is_empty() {
            return Vec::new();
        }
        self.specs
            .values()
            .filter(|s| s.tags.asset_tags.intersects(tags))
            .map(|s| s.id)
            .collect()
    }

    pub fn active_ids(&self) -> &[AbilitySpecId] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub(crate) fn mark_active(&mut self, id: AbilitySpecId) {
        self.pending_remove.retain(|a| *a != id);
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    /// Drop a spec from the active list, deferred while ticking
    pub(crate) fn retire(&mut self, id: AbilitySpecId) {
        if self.is_updating {
            if !self.pending_remove.contains(&id) {
                self.pending_remove.push(id);
            }
        } else {
            self.active.retain(|a| *a != id);
        }
    }

    pub(crate) fn add_tag_listener(&mut self, id: AbilitySpecId) {
        if !self.tag_listeners.contains(&id) {
            self.tag_listeners.push(id);
        }
    }

    pub(crate) fn remove_tag_listener(&mut self, id: AbilitySpecId) {
        self.tag_listeners.retain(|a| *a != id);
    }

    /// Start a tick pass, returning the active specs to visit
    pub(crate) fn begin_update(&mut self) -> Vec<AbilitySpecId> {
        self.is_updating = true;
        self.active.clone()
    }

    /// End a tick pass and flush deferred removals
    pub(crate) fn end_update(&mut self) {
        self.is_updating = false;
        let pending = std::mem::take(&mut self.pending_remove);
        for id in pending {
            let reactivated = self
                .specs
                .get(&id)
                .map(|s| s.state == AbilityState::Active)
                .unwrap_or(false);
            if !reactivated {
                self.active.retain(|a| *a != id);
            }
        }
    }

    /// Ids of every active ability, for cancellation
    pub(crate) fn cancel_all(&self) -> Vec<AbilitySpecId> {
        self.active.clone()
    }

    pub(crate) fn clear(&mut self) {
        self.specs.clear();
        self.active.clear();
        self.pending_remove.clear();
        self.tag_listeners.clear();
    }

    fn active_specs(&self) -> impl Iterator<Item = &GameplayAbilitySpec> {
        self.active
            .iter()
            .filter_map(|id| self.specs.get(id))
            .filter(|s| s.state == AbilityState::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GasConfig;
    use crate::ids::AscId;
    use gas_graph::{AbilityNodeData, AbilityTags, NodeData, SkillGraph};
    use gas_tags::GameplayTag;

    fn spec(id: u64, skill: &str, tags: AbilityTags) -> GameplayAbilitySpec {
        let data = AbilityNodeData {
            skill_number: id as i32,
            tags,
            event_ports: Vec::new(),
        };
        let graph = SkillGraph::new(skill)
            .with_node("ability", NodeData::Ability(data))
            .unwrap();
        GameplayAbilitySpec::new(AbilitySpecId(id), AscId(1), &graph, None, &GasConfig::default()).unwrap()
    }

    fn tags(names: &[&str]) -> GameplayTagSet {
        GameplayTagSet::from_names(names.iter().copied()).unwrap()
    }

    #[test]
    fn test_lookup() {
        let mut container = AbilityContainer::new();
        container.grant(spec(1, "Slash", AbilityTags::default()));
        container.grant(spec(2, "Dash", AbilityTags::default()));
        assert_eq!(container.find_by_skill_number(2), Some(AbilitySpecId(2)));
        assert_eq!(container.find_by_skill(&SkillId::new("Slash")), Some(AbilitySpecId(1)));
        assert_eq!(container.find_by_skill(&SkillId::new("Nope")), None);
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn test_block_only_counts_active() {
        let blocking = AbilityTags {
            block_abilities_with_tags: tags(&["Ability.Attack"]),
            ..AbilityTags::default()
        };
        let mut container = AbilityContainer::new();
        container.grant(spec(1, "Channel", blocking));
        let candidate = tags(&["Ability.Attack"]);
        assert!(!container.is_blocked(&candidate));

        container.get_mut(AbilitySpecId(1)).unwrap().state = AbilityState::Active;
        container.mark_active(AbilitySpecId(1));
        assert!(container.is_blocked(&candidate));
        assert!(!container.is_blocked(&tags(&["Ability.Move"])));
    }

    #[test]
    fn test_retire_deferred_while_updating() {
        let mut container = AbilityContainer::new();
        container.grant(spec(1, "Slash", AbilityTags::default()));
        container.grant(spec(2, "Dash", AbilityTags::default()));
        container.mark_active(AbilitySpecId(1));
        container.mark_active(AbilitySpecId(2));

        let visiting = container.begin_update();
        assert_eq!(visiting.len(), 2);
        container.retire(AbilitySpecId(1));
        assert_eq!(container.active_count(), 2);
        container.end_update();
        assert_eq!(container.active_ids(), &[AbilitySpecId(2)]);
    }

    #[test]
    fn test_reactivated_survives_flush() {
        let mut container = AbilityContainer::new();
        container.grant(spec(1, "Slash", AbilityTags::default()));
        container.mark_active(AbilitySpecId(1));

        container.begin_update();
        container.retire(AbilitySpecId(1));
        container.get_mut(AbilitySpecId(1)).unwrap().state = AbilityState::Active;
        container.end_update();
        assert_eq!(container.active_ids(), &[AbilitySpecId(1)]);
    }

    #[test]
    fn test_matching_tags() {
        let attack = AbilityTags {
            asset_tags: tags(&["Ability.Attack"]),
            ..AbilityTags::default()
        };
        let mut container = AbilityContainer::new();
        container.grant(spec(1, "Slash", attack));
        container.grant(spec(2, "Dash", AbilityTags::default()));
        let query = GameplayTagSet::new().with_tag(GameplayTag::new("Ability.Attack").unwrap());
        assert_eq!(container.abilities_matching_tags(&query), vec![AbilitySpecId(1)]);
        assert!(container.has_ability_with_tag(&query));
        assert!(!container.has_active_ability_with_tag(&query));
        assert!(container.abilities_matching_tags(&GameplayTagSet::new()).is_empty());
    }
}
