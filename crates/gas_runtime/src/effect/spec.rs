//! GameplayEffectSpec - one tracked effect on one unit

use super::cooldown::ChargeState;
use crate::attributes::ModifierHandle;
use crate::context::ExecutionContext;
use crate::ids::{AbilityRef, AscId, EffectHandle, EffectSpecId, ProjectileId};
use gas_graph::{DurationType, EffectNodeData, GraphNode, NodeId, NodeKind, SkillId};
use gas_tags::GameplayTagSet;
use std::sync::Arc;

/// Runtime instance of a duration, infinite or periodic effect
#[derive(Debug, Clone)]
pub struct GameplayEffectSpec {
    pub(crate) id: EffectSpecId,
    pub(crate) target: AscId,
    pub(crate) source: Option<AscId>,
    pub(crate) skill: SkillId,
    pub(crate) node: Arc<GraphNode>,
    pub(crate) data: EffectNodeData,
    /// Context captured at application, replayed by periodic executions
    pub(crate) context: ExecutionContext,
    /// Negative for infinite
    pub(crate) duration: f32,
    pub(crate) remaining: f32,
    /// Zero when not periodic
    pub(crate) period: f32,
    pub(crate) period_timer: f32,
    pub(crate) stack_count: u32,
    pub(crate) modifiers: Vec<ModifierHandle>,
    pub(crate) tags_granted: bool,
    pub(crate) charges: Option<ChargeState>,
    pub(crate) projectile: Option<ProjectileId>,
    pub(crate) owning_ability: Option<AbilityRef>,
    pub(crate) is_running: bool,
}

impl GameplayEffectSpec {
    pub(crate) fn new(
        id: EffectSpecId,
        target: AscId,
        skill: SkillId,
        node: Arc<GraphNode>,
        data: EffectNodeData,
        context: ExecutionContext,
    ) -> Self {
        Self {
            id,
            target,
            source: context.caster,
            skill,
            node,
            data,
            context,
            duration: 0.0,
            remaining: 0.0,
            period: 0.0,
            period_timer: 0.0,
            stack_count: 1,
            modifiers: Vec::new(),
            tags_granted: false,
            charges: None,
            projectile: None,
            owning_ability: None,
            is_running: true,
        }
    }

    pub(crate) fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self.remaining = duration;
        self
    }

    pub(crate) fn with_period(mut self, period: f32) -> Self {
        self.period = period.max(0.0);
        self.period_timer = self.period;
        self
    }

    pub fn id(&self) -> EffectSpecId {
        self.id
    }

    pub fn handle(&self) -> EffectHandle {
        EffectHandle::new(self.target, self.id)
    }

    pub fn target(&self) -> AscId {
        self.target
    }

    pub fn source(&self) -> Option<AscId> {
        self.source
    }

    pub fn skill(&self) -> &SkillId {
        &self.skill
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node.id
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn data(&self) -> &EffectNodeData {
        &self.data
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn is_infinite(&self) -> bool {
        self.duration < 0.0 || self.data.duration_type == DurationType::Infinite
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Seconds left, negative for infinite effects
    pub fn remaining_time(&self) -> f32 {
        if self.is_infinite() {
            -1.0
        } else {
            self.remaining.max(0.0)
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.period > 0.0
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn stack_count(&self) -> u32 {
        self.stack_count
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn asset_tags(&self) -> &GameplayTagSet {
        &self.data.asset_tags
    }

    pub fn granted_tags(&self) -> &GameplayTagSet {
        &self.data.granted_tags
    }

    pub fn charges(&self) -> Option<&ChargeState> {
        self.charges.as_ref()
    }

    pub fn projectile(&self) -> Option<ProjectileId> {
        self.projectile
    }

    pub fn owning_ability(&self) -> Option<AbilityRef> {
        self.owning_ability
    }

    /// Whether this effect shares stacking identity with an application of
    /// `(skill, node)` by `source`
    pub(crate) fn same_identity(&self, skill: &SkillId, node: &NodeId, source: Option<AscId>, by_source: bool) -> bool {
        &self.skill == skill && &self.node.id == node && (!by_source || self.source == source)
    }

    /// Whether `tags` matches an asset or granted tag of this effect
    pub(crate) fn matches_tags(&self, tags: &GameplayTagSet) -> bool {
        self.data.asset_tags.intersects(tags) || self.data.granted_tags.intersects(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_graph::{ModifierEffectNodeData, NodeData};
    use gas_tags::GameplayTag;

    fn buff() -> GameplayEffectSpec {
        let data = EffectNodeData::with_duration(5.0)
            .granting(GameplayTagSet::new().with_tag(GameplayTag::new("Buff.Haste").unwrap()));
        let node = Arc::new(GraphNode::new(
            "haste",
            NodeData::BuffEffect(ModifierEffectNodeData { effect: data.clone() }),
        ));
        GameplayEffectSpec::new(
            EffectSpecId(1),
            AscId(2),
            SkillId::new("Haste"),
            node,
            data,
            ExecutionContext::new(AscId(3), Some(AscId(2)), 1),
        )
        .with_duration(5.0)
    }

    #[test]
    fn test_identity() {
        let spec = buff();
        let skill = SkillId::new("Haste");
        let node = NodeId::new("haste");
        assert!(spec.same_identity(&skill, &node, Some(AscId(9)), false));
        assert!(!spec.same_identity(&skill, &node, Some(AscId(9)), true));
        assert!(spec.same_identity(&skill, &node, Some(AscId(3)), true));
        assert!(!spec.same_identity(&skill, &NodeId::new("other"), Some(AscId(3)), false));
    }

    #[test]
    fn test_timing_accessors() {
        let spec = buff().with_period(0.0);
        assert!(!spec.is_periodic());
        assert!(!spec.is_infinite());
        assert_eq!(spec.remaining_time(), 5.0);
        assert_eq!(spec.source(), Some(AscId(3)));
        assert_eq!(spec.handle(), EffectHandle::new(AscId(2), EffectSpecId(1)));

        let tags = GameplayTagSet::new().with_tag(GameplayTag::new("Buff.Haste").unwrap());
        assert!(spec.matches_tags(&tags));
    }
}
