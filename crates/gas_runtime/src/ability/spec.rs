//! GameplayAbilitySpec - one granted ability on one unit

use crate::config::GasConfig;
use crate::context::ExecutionContext;
use crate::ids::{AbilitySpecId, AscId, CueSpecId, EffectHandle};
use gas_graph::{
    ports, AbilityEventPort, AbilityTags, GameplayEventType, NodeData, NodeId, NodeKind,
    SkillGraph, SkillId,
};
use gas_tags::GameplayTagSet;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AbilityState {
    #[default]
    Inactive,
    Active,
    Cancelled,
    Ended,
}

/// Cooldown summary for UI
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillCooldownInfo {
    pub is_on_cooldown: bool,
    pub is_charge_cooldown: bool,
    /// Normal mode: seconds left
    pub remaining_time: f32,
    /// Normal mode: full duration
    pub total_duration: f32,
    pub current_charges: u32,
    pub max_charges: u32,
    /// Charge mode: 0..1 progress of the charge being restored
    pub charge_progress: f32,
    /// Charge mode: seconds until the next charge
    pub charge_time_remaining: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct TimeTrigger {
    time: f32,
    port: String,
    fired: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct TimeWindow {
    start: f32,
    /// Negative closes at the animation's end
    end: f32,
    port: String,
    started: bool,
    ended: bool,
    cues: Vec<CueSpecId>,
}

/// Per-activation timeline driven by the linked animation node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbilityTimeline {
    animation_node: Option<NodeId>,
    animation_name: String,
    looping: bool,
    /// Seconds
    duration: f32,
    elapsed: f32,
    triggers: Vec<TimeTrigger>,
    windows: Vec<TimeWindow>,
}

impl AbilityTimeline {
    /// Read the animation node linked to the ability node, if any
    pub fn from_graph(graph: &SkillGraph, ability_node: &NodeId, config: &GasConfig) -> Self {
        let linked = graph
            .connections_from(ability_node, ports::ANIMATION)
            .filter_map(|c| graph.get_node(&c.input_node))
            .find_map(|node| match &node.data {
                NodeData::Animation(anim) => Some((node.id.clone(), anim)),
                _ => None,
            });
        let Some((node, anim)) = linked else {
            return Self::default();
        };

        let frames = anim.duration_frames.static_value(1.0).unwrap_or(1.0).trunc();
        Self {
            animation_node: Some(node),
            animation_name: anim.animation_name.clone(),
            looping: anim.looping,
            duration: config.frames_to_seconds(frames),
            elapsed: 0.0,
            triggers: anim
                .time_effects
                .iter()
                .map(|te| TimeTrigger {
                    time: config.frames_to_seconds(te.trigger_frame),
                    port: te.port.clone(),
                    fired: false,
                })
                .collect(),
            windows: anim
                .time_cues
                .iter()
                .map(|tc| TimeWindow {
                    start: config.frames_to_seconds(tc.start_frame),
                    end: if tc.end_frame < 0.0 {
                        -1.0
                    } else {
                        config.frames_to_seconds(tc.end_frame)
                    },
                    port: tc.port.clone(),
                    started: false,
                    ended: false,
                    cues: Vec::new(),
                })
                .collect(),
        }
    }

    /// Animation node driving this timeline, if any
    pub fn animation_node(&self) -> Option<&NodeId> {
        self.animation_node.as_ref()
    }

    /// Name of the animation to play
    pub fn animation_name(&self) -> &str {
        &self.animation_name
    }

    /// Whether the animation loops
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Animation length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Seconds since activation
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Rewind to zero and re-arm every trigger and window
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        for trigger in &mut self.triggers {
            trigger.fired = false;
        }
        for window in &mut self.windows {
            window.started = false;
            window.ended = false;
            window.cues.clear();
        }
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Ports of triggers whose time has come, each reported once
    pub(crate) fn due_triggers(&mut self) -> Vec<String> {
        let elapsed = self.elapsed;
        self.triggers
            .iter_mut()
            .filter(|t| !t.fired && elapsed >= t.time)
            .map(|t| {
                t.fired = true;
                t.port.clone()
            })
            .collect()
    }

    /// Windows whose start has come, each reported once
    pub(crate) fn due_window_opens(&mut self) -> Vec<(usize, String)> {
        let elapsed = self.elapsed;
        self.windows
            .iter_mut()
            .enumerate()
            .filter(|(_, w)| !w.started && elapsed >= w.start)
            .map(|(index, w)| {
                w.started = true;
                (index, w.port.clone())
            })
            .collect()
    }

    pub(crate) fn record_window_cues(&mut self, index: usize, cues: Vec<CueSpecId>) {
        if let Some(window) = self.windows.get_mut(index) {
            window.cues.extend(cues);
        }
    }

    /// Cues of windows whose end has come
    pub(crate) fn due_window_closes(&mut self) -> Vec<CueSpecId> {
        let (elapsed, duration) = (self.elapsed, self.duration);
        let mut stopped = Vec::new();
        for window in &mut self.windows {
            let end = if window.end < 0.0 { duration } else { window.end };
            if window.started && !window.ended && elapsed >= end {
                window.ended = true;
                stopped.append(&mut window.cues);
            }
        }
        stopped
    }

    /// Close every open window, returning their cues
    pub(crate) fn close_all(&mut self) -> Vec<CueSpecId> {
        let mut stopped = Vec::new();
        for window in &mut self.windows {
            if window.started && !window.ended {
                window.ended = true;
                stopped.append(&mut window.cues);
            }
        }
        stopped
    }
}

/// Runtime instance of a granted ability
#[derive(Debug, Clone)]
pub struct GameplayAbilitySpec {
    pub(crate) id: AbilitySpecId,
    pub(crate) owner: AscId,
    pub(crate) skill: SkillId,
    pub(crate) ability_node: NodeId,
    pub(crate) skill_number: i32,
    pub(crate) level: u32,
    pub(crate) tags: AbilityTags,
    pub(crate) event_ports: Vec<AbilityEventPort>,
    pub(crate) cost_node: Option<NodeId>,
    pub(crate) cooldown_node: Option<NodeId>,
    pub(crate) state: AbilityState,
    pub(crate) context: Option<ExecutionContext>,
    pub(crate) timeline: AbilityTimeline,
    /// Effects flagged cancel-on-ability-end applied by the current activation
    pub(crate) running_effects: Vec<EffectHandle>,
    pub(crate) activation_count: u32,
}

impl GameplayAbilitySpec {
    /// Create a spec for the ability node of `graph`. Returns `None` if the
    /// graph has no ability node.
    pub fn new(
        id: AbilitySpecId,
        owner: AscId,
        graph: &SkillGraph,
        skill_number: Option<i32>,
        config: &GasConfig,
    ) -> Option<Self> {
        let node = graph.ability_node()?;
        let NodeData::Ability(data) = &node.data else {
            return None;
        };

        let first_of = |port: &str, kind: NodeKind| {
            graph
                .connections_from(&node.id, port)
                .filter_map(|c| graph.get_node(&c.input_node))
                .find(|n| n.kind() == kind)
                .map(|n| n.id.clone())
        };

        Some(Self {
            id,
            owner,
            skill: graph.skill_id().clone(),
            ability_node: node.id.clone(),
            skill_number: skill_number.unwrap_or(data.skill_number),
            level: 1,
            tags: data.tags.clone(),
            event_ports: data.event_ports.clone(),
            cost_node: first_of(ports::COST, NodeKind::CostEffect),
            cooldown_node: first_of(ports::COOLDOWN, NodeKind::CooldownEffect),
            state: AbilityState::Inactive,
            context: None,
            timeline: AbilityTimeline::from_graph(graph, &node.id, config),
            running_effects: Vec::new(),
            activation_count: 0,
        })
    }

    /// Spec identifier
    pub fn id(&self) -> AbilitySpecId {
        self.id
    }

    /// Unit the ability is granted to
    pub fn owner(&self) -> AscId {
        self.owner
    }

    /// Skill graph this spec runs
    pub fn skill(&self) -> &SkillId {
        &self.skill
    }

    /// Ability node of the skill graph
    pub fn ability_node(&self) -> &NodeId {
        &self.ability_node
    }

    /// Authored or explicitly granted skill number
    pub fn skill_number(&self) -> i32 {
        self.skill_number
    }

    /// Level used by formula magnitudes
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Current lifecycle state
    pub fn state(&self) -> AbilityState {
        self.state
    }

    /// True between activation and end
    pub fn is_active(&self) -> bool {
        self.state == AbilityState::Active
    }

    /// Activation, blocking and cancellation tags
    pub fn tags(&self) -> &AbilityTags {
        &self.tags
    }

    /// Time triggers and windows of the current activation
    pub fn timeline(&self) -> &AbilityTimeline {
        &self.timeline
    }

    /// Context of the current activation
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }

    /// Effects removed when the ability ends
    pub fn running_effects(&self) -> &[EffectHandle] {
        &self.running_effects
    }

    /// Node connected to the cost port
    pub fn cost_node(&self) -> Option<&NodeId> {
        self.cost_node.as_ref()
    }

    /// Node connected to the cooldown port
    pub fn cooldown_node(&self) -> Option<&NodeId> {
        self.cooldown_node.as_ref()
    }

    /// How many times this spec has been activated
    pub fn activation_count(&self) -> u32 {
        self.activation_count
    }

    /// Whether this ability, while active, blocks an ability tagged `ability_tags`
    pub fn blocks_ability_with_tags(&self, ability_tags: &GameplayTagSet) -> bool {
        self.is_active()
            && !self.tags.block_abilities_with_tags.is_empty()
            && ability_tags.intersects(&self.tags.block_abilities_with_tags)
    }

    /// Whether the ability declares ongoing-blocked tags
    pub fn listens_to_tags(&self) -> bool {
        !self.tags.ongoing_blocked_tags.is_empty()
    }

    /// Event ports declared for `event`
    pub(crate) fn ports_for_event(&self, event: GameplayEventType) -> Vec<String> {
        self.event_ports
            .iter()
            .filter(|p| p.event == event)
            .map(|p| p.port.clone())
            .collect()
    }

    pub(crate) fn register_running_effect(&mut self, handle: EffectHandle) {
        if !self.running_effects.contains(&handle) {
            self.running_effects.push(handle);
        }
    }
}
