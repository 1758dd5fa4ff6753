//! # gas_runtime - Gameplay Ability System Runtime
//!
//! Interprets the skill graphs of `gas_graph` against live units:
//! - [`GasHost`]: owner of units, skill data, drivers and the frame tick
//! - [`AbilitySystemComponent`]: one unit's attributes, tags, abilities and effects
//! - [`GameplayAbilitySpec`]: a granted ability with its timeline and tag gating
//! - [`GameplayEffectSpec`]: an applied effect with duration, period and stacks
//! - [`driver`]: the animation, cue, projectile and world seams a game plugs into
//!
//! ## Frame order
//!
//! ```text
//! tick(dt) ─► projectiles ─► projectile events ─► cues ─► per unit: abilities ─► effects
//! ```
//!
//! Everything runs on one thread; drivers are called synchronously.

pub mod ability;
pub mod asc;
pub mod attributes;
pub mod config;
pub mod context;
pub mod cue;
pub mod damage;
pub mod driver;
pub mod effect;
pub mod error;
pub mod events;
pub mod executor;
pub mod host;
pub mod ids;
pub mod magnitude;
pub mod projectile_sim;

pub mod prelude {
    pub use crate::ability::{
        AbilityContainer, AbilityState, AbilityTimeline, GameplayAbilitySpec, SkillCooldownInfo,
    };
    pub use crate::asc::AbilitySystemComponent;
    pub use crate::attributes::{AttributeChange, AttributeSet, ModifierHandle};
    pub use crate::config::GasConfig;
    pub use crate::context::{CustomValue, ExecutionContext};
    pub use crate::cue::ActiveCue;
    pub use crate::damage::DamageInfo;
    pub use crate::driver::{
        AnimationCall, AnimationDriver, CueDriver, CueKind, CueRequest, NullAnimation, NullCues,
        NullProjectiles, PlaneWorld, ProjectileDriver, ProjectileEvent, ProjectileEventKind,
        ProjectileInitData, RecordingAnimation, RecordingCues, SharedWorld, TagQuery, WorldQuery,
    };
    pub use crate::effect::projectile::{BOUNCE_POSITION, HIT_POSITION, REACH_POSITION};
    pub use crate::effect::{
        ApplyOutcome, ChargeState, EffectContainer, GameplayEffectSpec, PLACEMENT_POSITION,
    };
    pub use crate::error::{GasError, GasResult};
    pub use crate::events::GasEvent;
    pub use crate::host::GasHost;
    pub use crate::ids::{
        AbilityRef, AbilitySpecId, AscId, CueSpecId, EffectHandle, EffectSpecId, ProjectileId,
    };
    pub use crate::projectile_sim::KinematicProjectiles;

    pub use gas_graph::{
        ports, AttributeKind, DamageType, GameplayEventType, NodeData, NodeId, SkillDataCenter,
        SkillGraph, SkillId,
    };
    pub use gas_tags::{GameplayTag, GameplayTagContainer, GameplayTagSet};
    pub use glam::Vec2;
}

pub use prelude::*;
