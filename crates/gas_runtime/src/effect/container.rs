//! Per-unit container of tracked effects

use super::spec::GameplayEffectSpec;
use crate::ids::{AscId, EffectSpecId};
use gas_graph::{NodeId, SkillId};
use gas_tags::{GameplayTag, GameplayTagSet};

/// Tracked effects of one unit, in application order.
///
/// Removal requested while the container is being ticked is deferred until
/// the tick pass ends.
#[derive(Debug, Default)]
pub struct EffectContainer {
    effects: Vec<GameplayEffectSpec>,
    pending_remove: Vec<EffectSpecId>,
    is_updating: bool,
}

impl EffectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, spec: GameplayEffectSpec) -> EffectSpecId {
        let id = spec.id;
        self.effects.push(spec);
        id
    }

    pub fn get(&self, id: EffectSpecId) -> Option<&GameplayEffectSpec> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: EffectSpecId) -> Option<&mut GameplayEffectSpec> {
        self.effects.iter_mut().find(|e| e.id == id)
    }

    /// Running effects
    pub fn iter(&self) -> impl Iterator<Item = &GameplayEffectSpec> {
        self.effects.iter().filter(|e| e.is_running)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Running effect sharing stacking identity with an application
    pub(crate) fn find_stack(
        &self,
        skill: &SkillId,
        node: &NodeId,
        source: Option<AscId>,
        by_source: bool,
    ) -> Option<EffectSpecId> {
        self.iter()
            .find(|e| e.same_identity(skill, node, source, by_source))
            .map(|e| e.id)
    }

    /// Running effect created from `(skill, node)`
    pub fn find_effect_by_node(&self, skill: &SkillId, node: &NodeId) -> Option<EffectSpecId> {
        self.find_stack(skill, node, None, false)
    }

    /// First running effect granting `tag`
    pub fn find_effect_by_granted_tag(&self, tag: &GameplayTag) -> Option<EffectSpecId> {
        self.iter().find(|e| e.granted_tags().has_tag(tag)).map(|e| e.id)
    }

    /// Running effects whose asset or granted tags intersect `tags`
    pub fn effects_with_tags(&self, tags: &GameplayTagSet) -> Vec<EffectSpecId> {
        if tags.is_empty() {
            return Vec::new();
        }
        self.iter().filter(|e| e.matches_tags(tags)).map(|e| e.id).collect()
    }

    pub fn running_ids(&self) -> Vec<EffectSpecId> {
        self.iter().map(|e| e.id).collect()
    }

    /// Start a tick pass, returning the effects to visit
    pub(crate) fn begin_update(&mut self) -> Vec<EffectSpecId> {
        self.is_updating = true;
        self.running_ids()
    }

    /// Drop a stopped effect, deferred while ticking
    pub(crate) fn retire(&mut self, id: EffectSpecId) {
        if self.is_updating {
            if !self.pending_remove.contains(&id) {
                self.pending_remove.push(id);
            }
        } else {
            self.effects.retain(|e| e.id != id);
        }
    }

    /// End a tick pass and flush deferred removals
    pub(crate) fn end_update(&mut self) {
        self.is_updating = false;
        let pending = std::mem::take(&mut self.pending_remove);
        self.effects.retain(|e| !pending.contains(&e.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use gas_graph::{EffectNodeData, GraphNode, ModifierEffectNodeData, NodeData};
    use std::sync::Arc;

    fn effect(id: u64, node: &str, source: u64, tag: &str) -> GameplayEffectSpec {
        let data = EffectNodeData::infinite()
            .granting(GameplayTagSet::new().with_tag(GameplayTag::new(tag).unwrap()));
        let graph_node = Arc::new(GraphNode::new(
            node,
            NodeData::BuffEffect(ModifierEffectNodeData { effect: data.clone() }),
        ));
        GameplayEffectSpec::new(
            EffectSpecId(id),
            AscId(1),
            SkillId::new("Skill"),
            graph_node,
            data,
            ExecutionContext::new(AscId(source), Some(AscId(1)), 1),
        )
    }

    #[test]
    fn test_find_stack_by_source() {
        let mut container = EffectContainer::new();
        container.add(effect(1, "poison", 5, "Debuff.Poison"));
        let skill = SkillId::new("Skill");
        let node = NodeId::new("poison");
        assert_eq!(container.find_stack(&skill, &node, Some(AscId(6)), false), Some(EffectSpecId(1)));
        assert_eq!(container.find_stack(&skill, &node, Some(AscId(6)), true), None);
        assert_eq!(container.find_stack(&skill, &node, Some(AscId(5)), true), Some(EffectSpecId(1)));
        assert_eq!(container.find_effect_by_node(&skill, &node), Some(EffectSpecId(1)));
    }

    #[test]
    fn test_effects_with_tags() {
        let mut container = EffectContainer::new();
        container.add(effect(1, "poison", 5, "Debuff.Poison"));
        container.add(effect(2, "haste", 5, "Buff.Haste"));
        let query = GameplayTagSet::from_names(["Buff.Haste"]).unwrap();
        assert_eq!(container.effects_with_tags(&query), vec![EffectSpecId(2)]);
        assert!(container.effects_with_tags(&GameplayTagSet::new()).is_empty());

        let haste = GameplayTag::new("Buff.Haste").unwrap();
        assert_eq!(container.find_effect_by_granted_tag(&haste), Some(EffectSpecId(2)));
        let slow = GameplayTag::new("Buff.Slow").unwrap();
        assert_eq!(container.find_effect_by_granted_tag(&slow), None);
    }

    #[test]
    fn test_deferred_removal() {
        let mut container = EffectContainer::new();
        container.add(effect(1, "poison", 5, "Debuff.Poison"));
        container.add(effect(2, "haste", 5, "Buff.Haste"));

        let visiting = container.begin_update();
        assert_eq!(visiting, vec![EffectSpecId(1), EffectSpecId(2)]);
        container.get_mut(EffectSpecId(1)).unwrap().is_running = false;
        container.retire(EffectSpecId(1));
        assert!(container.get(EffectSpecId(1)).is_some());
        assert_eq!(container.len(), 1);
        container.end_update();
        assert!(container.get(EffectSpecId(1)).is_none());

        container.retire(EffectSpecId(2));
        assert!(container.is_empty());
    }
}
