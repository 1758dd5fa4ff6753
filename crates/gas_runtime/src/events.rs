//! Events emitted by the host
//!
//! Events are collected during a frame and handed out by
//! [`GasHost::drain_events`](crate::host::GasHost::drain_events).

use crate::attributes::AttributeChange;
use crate::ids::{AbilitySpecId, AscId, CueSpecId, EffectHandle};
use gas_graph::{GameplayEventType, NodeId, SkillId};
use gas_tags::GameplayTag;

/// Events emitted by the ability system
#[derive(Debug, Clone, PartialEq)]
pub enum GasEvent {
    /// A unit joined the host
    UnitRegistered { unit: AscId },
    /// A unit left the host
    UnitUnregistered { unit: AscId },
    /// An ability started
    AbilityActivated {
        unit: AscId,
        ability: AbilitySpecId,
        skill: SkillId,
    },
    /// An ability ended or was cancelled
    AbilityEnded {
        unit: AscId,
        ability: AbilitySpecId,
        skill: SkillId,
        was_cancelled: bool,
    },
    /// A tracked effect started
    EffectApplied {
        effect: EffectHandle,
        source: Option<AscId>,
        node: NodeId,
    },
    /// An instant effect executed
    EffectExecuted {
        target: AscId,
        source: Option<AscId>,
        node: NodeId,
    },
    /// An effect gained a stack
    EffectStacked { effect: EffectHandle, stack_count: u32 },
    /// An application beyond the stack limit was routed or dropped
    EffectOverflowed { effect: EffectHandle, routed: bool },
    /// A tracked effect ended
    EffectRemoved { effect: EffectHandle, node: NodeId },
    /// A tag appeared on or disappeared from a unit
    TagChanged {
        unit: AscId,
        tag: GameplayTag,
        added: bool,
    },
    /// An attribute's current value changed
    AttributeChanged { unit: AscId, change: AttributeChange },
    /// A gameplay event derived from attribute changes
    Gameplay { unit: AscId, event: GameplayEventType },
    /// A cue started
    CueStarted { cue: CueSpecId, unit: AscId },
    /// A cue stopped
    CueStopped { cue: CueSpecId },
}

impl GasEvent {
    /// The unit most directly concerned by this event
    pub fn unit(&self) -> Option<AscId> {
        match self {
            GasEvent::UnitRegistered { unit }
            | GasEvent::UnitUnregistered { unit }
            | GasEvent::AbilityActivated { unit, .. }
            | GasEvent::AbilityEnded { unit, .. }
            | GasEvent::TagChanged { unit, .. }
            | GasEvent::AttributeChanged { unit, .. }
            | GasEvent::Gameplay { unit, .. }
            | GasEvent::CueStarted { unit, .. } => Some(*unit),
            GasEvent::EffectApplied { effect, .. }
            | GasEvent::EffectStacked { effect, .. }
            | GasEvent::EffectOverflowed { effect, .. }
            | GasEvent::EffectRemoved { effect, .. } => Some(effect.target),
            GasEvent::EffectExecuted { target, .. } => Some(*target),
            GasEvent::CueStopped { .. } => None,
        }
    }
}

/// Skill identity of an ability event, used by logs
pub(crate) fn describe(skill: &SkillId, ability: AbilitySpecId) -> String {
    format!("{}[{}]", skill, ability)
}
