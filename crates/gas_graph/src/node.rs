//! Node - graph vertices and their closed set of kinds
//!
//! Every node a skill graph can contain is one variant of [`NodeData`]. The
//! interpreter matches on it exhaustively, so adding a kind means adding one
//! interpreter case.

use crate::data::{
    AttributeKind, CompareOp, DamageType, EffectNodeData, GameplayEventType, Magnitude,
    PositionSource, TargetSelector,
};
use gas_tags::GameplayTagSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node inside one skill graph
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a skill graph
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SkillId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Well-known output port names
pub mod ports {
    /// Ability: resource deduction branch
    pub const COST: &str = "cost";
    /// Ability: cooldown branch
    pub const COOLDOWN: &str = "cooldown";
    /// Ability: main activation branch
    pub const ACTIVATE: &str = "activate";
    /// Ability: linked animation timeline
    pub const ANIMATION: &str = "animation";
    /// Effects and tasks: continue after successful execution
    pub const OUTPUT: &str = "output";
    /// Periodic effects: each periodic execution
    pub const ON_TICK: &str = "on_tick";
    /// Stacking effects: application beyond the stack limit
    pub const ON_OVERFLOW: &str = "on_overflow";
    /// Projectile: collided with a unit
    pub const ON_HIT: &str = "on_hit";
    /// Projectile: arrived at its target position
    pub const ON_REACH: &str = "on_reach";
    /// Projectile: bounced to a new unit
    pub const ON_BOUNCE: &str = "on_bounce";
    /// Condition: comparison held
    pub const TRUE: &str = "true";
    /// Condition: comparison failed
    pub const FALSE: &str = "false";
    /// Search task: once per found unit
    pub const ON_FOUND: &str = "on_found";
    /// Search task: nothing found
    pub const ON_EMPTY: &str = "on_empty";
}

/// Tag requirements and grants of an ability
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTags {
    /// Tags describing the ability itself
    pub asset_tags: GameplayTagSet,
    /// Active abilities with any of these asset tags are cancelled on activation
    pub cancel_abilities_with_tags: GameplayTagSet,
    /// Abilities with any of these asset tags cannot activate while this one is active
    pub block_abilities_with_tags: GameplayTagSet,
    /// Granted to the owner while active
    pub activation_owned_tags: GameplayTagSet,
    /// Owner must have all of these to activate
    pub activation_required_tags: GameplayTagSet,
    /// Owner must have none of these to activate
    pub activation_blocked_tags: GameplayTagSet,
    /// Gaining any of these while active cancels the ability
    pub ongoing_blocked_tags: GameplayTagSet,
}

/// Maps a gameplay event to an output port on the ability node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEventPort {
    pub event: GameplayEventType,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityNodeData {
    /// Numeric id used by tables and UI
    pub skill_number: i32,
    pub tags: AbilityTags,
    pub event_ports: Vec<AbilityEventPort>,
}

/// A one-shot trigger on the animation timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEffectData {
    pub trigger_frame: f32,
    pub port: String,
}

/// A cue window on the animation timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCueData {
    pub start_frame: f32,
    /// Negative means the end of the animation
    #[serde(default = "minus_one")]
    pub end_frame: f32,
    pub port: String,
}

fn minus_one() -> f32 {
    -1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationNodeData {
    pub animation_name: String,
    /// Total length in frames
    pub duration_frames: Magnitude,
    pub looping: bool,
    pub time_effects: Vec<TimeEffectData>,
    pub time_cues: Vec<TimeCueData>,
}

impl Default for AnimationNodeData {
    fn default() -> Self {
        Self {
            animation_name: String::new(),
            duration_frames: Magnitude::Fixed(1.0),
            looping: false,
            time_effects: Vec::new(),
            time_cues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageEffectNodeData {
    pub effect: EffectNodeData,
    pub damage: Magnitude,
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealEffectNodeData {
    pub effect: EffectNodeData,
    pub heal: Magnitude,
}

/// Effect whose payload is its attribute modifiers
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierEffectNodeData {
    pub effect: EffectNodeData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplaceDirection {
    #[default]
    AwayFromCaster,
    TowardCaster,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaceEffectNodeData {
    pub effect: EffectNodeData,
    pub distance: Magnitude,
    pub direction: DisplaceDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementEffectNodeData {
    pub effect: EffectNodeData,
    pub position: PositionSource,
    pub radius: f32,
    pub required_tags: GameplayTagSet,
    pub excluded_tags: GameplayTagSet,
    pub include_caster: bool,
}

impl Default for PlacementEffectNodeData {
    fn default() -> Self {
        Self {
            effect: EffectNodeData::default(),
            position: PositionSource::MainTarget,
            radius: 3.0,
            required_tags: GameplayTagSet::new(),
            excluded_tags: GameplayTagSet::new(),
            include_caster: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectileTargetType {
    Position,
    #[default]
    Unit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BounceTargetMode {
    #[default]
    SearchNearest,
    ReverseAngle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileEffectNodeData {
    pub effect: EffectNodeData,
    pub launch_position_source: PositionSource,
    pub launch_binding_name: String,
    pub target_position_source: PositionSource,
    pub target_binding_name: String,
    pub projectile_target_type: ProjectileTargetType,
    pub fly_over: bool,
    /// Degrees, position mode only
    pub offset_angle: f32,
    pub curve_height: f32,
    pub speed: f32,
    /// Negative means unlimited
    pub max_distance: f32,
    pub collision_radius: f32,
    pub is_piercing: bool,
    pub max_pierce_count: u32,
    pub collision_target_tags: GameplayTagSet,
    pub collision_exclude_tags: GameplayTagSet,
    pub is_bouncing: bool,
    pub bounce_target_mode: BounceTargetMode,
    pub max_bounce_count: u32,
    pub bounce_search_radius: f32,
    pub can_bounce_to_same_target: bool,
    pub bounce_angle_offset: f32,
}

impl Default for ProjectileEffectNodeData {
    fn default() -> Self {
        Self {
            effect: EffectNodeData::infinite(),
            launch_position_source: PositionSource::Caster,
            launch_binding_name: String::new(),
            target_position_source: PositionSource::MainTarget,
            target_binding_name: String::new(),
            projectile_target_type: ProjectileTargetType::Unit,
            fly_over: false,
            offset_angle: 0.0,
            curve_height: 0.0,
            speed: 10.0,
            max_distance: -1.0,
            collision_radius: 0.5,
            is_piercing: false,
            max_pierce_count: 1,
            collision_target_tags: GameplayTagSet::new(),
            collision_exclude_tags: GameplayTagSet::new(),
            is_bouncing: false,
            bounce_target_mode: BounceTargetMode::SearchNearest,
            max_bounce_count: 3,
            bounce_search_radius: 10.0,
            can_bounce_to_same_target: false,
            bounce_angle_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CooldownType {
    #[default]
    Normal,
    Charge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownEffectNodeData {
    pub effect: EffectNodeData,
    pub cooldown_type: CooldownType,
    pub max_charges: u32,
    /// Seconds to restore one charge
    pub charge_time: Magnitude,
}

impl Default for CooldownEffectNodeData {
    fn default() -> Self {
        Self {
            effect: EffectNodeData::default(),
            cooldown_type: CooldownType::Normal,
            max_charges: 1,
            charge_time: Magnitude::Formula(String::new()),
        }
    }
}

/// Fields shared by cue nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CueNodeData {
    /// Stopped when the owning timeline window or ability ends
    pub destroy_with_node: bool,
    pub required_tags: GameplayTagSet,
    pub immunity_tags: GameplayTagSet,
    pub target: TargetSelector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleCueNodeData {
    pub cue: CueNodeData,
    pub particle: String,
    pub binding_name: String,
    /// Negative loops until stopped
    pub duration: f32,
}

impl Default for ParticleCueNodeData {
    fn default() -> Self {
        Self {
            cue: CueNodeData::default(),
            particle: String::new(),
            binding_name: String::new(),
            duration: -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundCueNodeData {
    pub cue: CueNodeData,
    pub sound: String,
    pub volume: f32,
}

impl Default for SoundCueNodeData {
    fn default() -> Self {
        Self {
            cue: CueNodeData::default(),
            sound: String::new(),
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingTextCueNodeData {
    pub cue: CueNodeData,
    pub text: String,
    pub color: [f32; 4],
}

impl Default for FloatingTextCueNodeData {
    fn default() -> Self {
        Self {
            cue: CueNodeData::default(),
            text: String::new(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTargetTaskNodeData {
    pub center: PositionSource,
    pub radius: f32,
    /// 0 means unlimited
    pub max_targets: u32,
    pub required_tags: GameplayTagSet,
    pub excluded_tags: GameplayTagSet,
    pub include_caster: bool,
}

impl Default for SearchTargetTaskNodeData {
    fn default() -> Self {
        Self {
            center: PositionSource::Caster,
            radius: 5.0,
            max_targets: 0,
            required_tags: GameplayTagSet::new(),
            excluded_tags: GameplayTagSet::new(),
            include_caster: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndAbilityTaskNodeData {
    pub was_cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeCompareConditionNodeData {
    pub source: TargetSelector,
    pub attribute: AttributeKind,
    pub operator: CompareOp,
    pub value: Magnitude,
    /// Compare current / max instead of the raw value
    pub compare_percent: bool,
}

impl Default for AttributeCompareConditionNodeData {
    fn default() -> Self {
        Self {
            source: TargetSelector::Caster,
            attribute: AttributeKind::Health,
            operator: CompareOp::Greater,
            value: Magnitude::Fixed(0.0),
            compare_percent: false,
        }
    }
}

/// Payload of a graph node, tagged by `$type` in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum NodeData {
    #[serde(alias = "AbilityNodeData")]
    Ability(AbilityNodeData),
    #[serde(alias = "AnimationNodeData")]
    Animation(AnimationNodeData),
    #[serde(alias = "DamageEffectNodeData")]
    DamageEffect(DamageEffectNodeData),
    #[serde(alias = "HealEffectNodeData")]
    HealEffect(HealEffectNodeData),
    #[serde(alias = "CostEffectNodeData")]
    CostEffect(ModifierEffectNodeData),
    #[serde(alias = "ModifyAttributeEffectNodeData")]
    ModifyAttributeEffect(ModifierEffectNodeData),
    #[serde(alias = "ProjectileEffectNodeData")]
    ProjectileEffect(ProjectileEffectNodeData),
    #[serde(alias = "PlacementEffectNodeData")]
    PlacementEffect(PlacementEffectNodeData),
    #[serde(alias = "CooldownEffectNodeData")]
    CooldownEffect(CooldownEffectNodeData),
    #[serde(alias = "BuffEffectNodeData")]
    BuffEffect(ModifierEffectNodeData),
    #[serde(alias = "GenericEffectNodeData")]
    GenericEffect(ModifierEffectNodeData),
    #[serde(alias = "DisplaceEffectNodeData")]
    DisplaceEffect(DisplaceEffectNodeData),
    #[serde(alias = "ParticleCueNodeData")]
    ParticleCue(ParticleCueNodeData),
    #[serde(alias = "SoundCueNodeData")]
    SoundCue(SoundCueNodeData),
    #[serde(alias = "FloatingTextCueNodeData")]
    FloatingTextCue(FloatingTextCueNodeData),
    #[serde(alias = "SearchTargetTaskNodeData")]
    SearchTargetTask(SearchTargetTaskNodeData),
    #[serde(alias = "EndAbilityTaskNodeData")]
    EndAbilityTask(EndAbilityTaskNodeData),
    #[serde(alias = "AttributeCompareConditionNodeData")]
    AttributeCompareCondition(AttributeCompareConditionNodeData),
}

/// Stable discriminant of [`NodeData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Ability,
    Animation,
    DamageEffect,
    HealEffect,
    CostEffect,
    ModifyAttributeEffect,
    ProjectileEffect,
    PlacementEffect,
    CooldownEffect,
    BuffEffect,
    GenericEffect,
    DisplaceEffect,
    ParticleCue,
    SoundCue,
    FloatingTextCue,
    SearchTargetTask,
    EndAbilityTask,
    AttributeCompareCondition,
}

/// The `$type` names recognised by the loader
pub const NODE_TYPE_NAMES: &[&str] = &[
    "Ability",
    "Animation",
    "DamageEffect",
    "HealEffect",
    "CostEffect",
    "ModifyAttributeEffect",
    "ProjectileEffect",
    "PlacementEffect",
    "CooldownEffect",
    "BuffEffect",
    "GenericEffect",
    "DisplaceEffect",
    "ParticleCue",
    "SoundCue",
    "FloatingTextCue",
    "SearchTargetTask",
    "EndAbilityTask",
    "AttributeCompareCondition",
];

/// Whether `name` (short or `...NodeData` form) is a known node type
pub fn is_known_node_type(name: &str) -> bool {
    let short = name.strip_suffix("NodeData").unwrap_or(name);
    NODE_TYPE_NAMES.contains(&short)
}

impl NodeKind {
    pub fn is_effect(self) -> bool {
        matches!(
            self,
            NodeKind::DamageEffect
                | NodeKind::HealEffect
                | NodeKind::CostEffect
                | NodeKind::ModifyAttributeEffect
                | NodeKind::ProjectileEffect
                | NodeKind::PlacementEffect
                | NodeKind::CooldownEffect
                | NodeKind::BuffEffect
                | NodeKind::GenericEffect
                | NodeKind::DisplaceEffect
        )
    }

    pub fn is_cue(self) -> bool {
        matches!(self, NodeKind::ParticleCue | NodeKind::SoundCue | NodeKind::FloatingTextCue)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Ability(_) => NodeKind::Ability,
            NodeData::Animation(_) => NodeKind::Animation,
            NodeData::DamageEffect(_) => NodeKind::DamageEffect,
            NodeData::HealEffect(_) => NodeKind::HealEffect,
            NodeData::CostEffect(_) => NodeKind::CostEffect,
            NodeData::ModifyAttributeEffect(_) => NodeKind::ModifyAttributeEffect,
            NodeData::ProjectileEffect(_) => NodeKind::ProjectileEffect,
            NodeData::PlacementEffect(_) => NodeKind::PlacementEffect,
            NodeData::CooldownEffect(_) => NodeKind::CooldownEffect,
            NodeData::BuffEffect(_) => NodeKind::BuffEffect,
            NodeData::GenericEffect(_) => NodeKind::GenericEffect,
            NodeData::DisplaceEffect(_) => NodeKind::DisplaceEffect,
            NodeData::ParticleCue(_) => NodeKind::ParticleCue,
            NodeData::SoundCue(_) => NodeKind::SoundCue,
            NodeData::FloatingTextCue(_) => NodeKind::FloatingTextCue,
            NodeData::SearchTargetTask(_) => NodeKind::SearchTargetTask,
            NodeData::EndAbilityTask(_) => NodeKind::EndAbilityTask,
            NodeData::AttributeCompareCondition(_) => NodeKind::AttributeCompareCondition,
        }
    }

    /// Common effect fields, for effect kinds
    pub fn effect(&self) -> Option<&EffectNodeData> {
        match self {
            NodeData::DamageEffect(d) => Some(&d.effect),
            NodeData::HealEffect(d) => Some(&d.effect),
            NodeData::CostEffect(d)
            | NodeData::ModifyAttributeEffect(d)
            | NodeData::BuffEffect(d)
            | NodeData::GenericEffect(d) => Some(&d.effect),
            NodeData::ProjectileEffect(d) => Some(&d.effect),
            NodeData::PlacementEffect(d) => Some(&d.effect),
            NodeData::CooldownEffect(d) => Some(&d.effect),
            NodeData::DisplaceEffect(d) => Some(&d.effect),
            _ => None,
        }
    }

    /// Common cue fields, for cue kinds
    pub fn cue(&self) -> Option<&CueNodeData> {
        match self {
            NodeData::ParticleCue(d) => Some(&d.cue),
            NodeData::SoundCue(d) => Some(&d.cue),
            NodeData::FloatingTextCue(d) => Some(&d.cue),
            _ => None,
        }
    }
}

/// A node of a skill graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub data: NodeData,
}

impl GraphNode {
    /// Create a new node
    pub fn new(id: impl Into<NodeId>, data: NodeData) -> Self {
        Self { id: id.into(), data }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_accepts_both_spellings() {
        let short: NodeData =
            serde_json::from_str(r#"{"$type": "DamageEffect", "damage": 30}"#).unwrap();
        let long: NodeData =
            serde_json::from_str(r#"{"$type": "DamageEffectNodeData", "damage": 30}"#).unwrap();
        assert_eq!(short, long);
        assert_eq!(short.kind(), NodeKind::DamageEffect);
        assert!(short.kind().is_effect());
    }

    #[test]
    fn test_projectile_defaults() {
        let node: NodeData = serde_json::from_str(r#"{"$type": "ProjectileEffect"}"#).unwrap();
        let NodeData::ProjectileEffect(data) = node else {
            panic!("expected projectile");
        };
        assert_eq!(data.speed, 10.0);
        assert_eq!(data.max_distance, -1.0);
        assert_eq!(data.collision_radius, 0.5);
        assert_eq!(data.max_pierce_count, 1);
        assert_eq!(data.max_bounce_count, 3);
        assert_eq!(data.bounce_search_radius, 10.0);
    }

    #[test]
    fn test_known_types() {
        assert!(is_known_node_type("SoundCue"));
        assert!(is_known_node_type("SoundCueNodeData"));
        assert!(!is_known_node_type("TeleportEffect"));
    }

    #[test]
    fn test_effect_and_cue_accessors() {
        let cue = NodeData::SoundCue(SoundCueNodeData::default());
        assert!(cue.cue().is_some());
        assert!(cue.effect().is_none());
        assert!(cue.kind().is_cue());

        let buff = NodeData::BuffEffect(ModifierEffectNodeData::default());
        assert!(buff.effect().is_some());
    }
}
