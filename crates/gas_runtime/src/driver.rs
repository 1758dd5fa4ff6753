//! External collaborators of the ability system
//!
//! The host never plays animations, spawns particles, moves projectiles or
//! queries physics itself. It talks to these traits; the game plugs in real
//! implementations. Null implementations are used by default.

use crate::ids::{AscId, CueSpecId, EffectHandle, ProjectileId};
use gas_graph::{BounceTargetMode, NodeId, ProjectileTargetType, SkillId};
use gas_tags::GameplayTagSet;
use glam::Vec2;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Plays unit animations
pub trait AnimationDriver: Send {
    fn play_animation(&mut self, unit: AscId, name: &str, looping: bool);

    /// Return the unit to its idle animation
    fn stop_animation(&mut self, unit: AscId, idle: &str) {
        self.play_animation(unit, idle, true);
    }
}

/// What a cue asks the presentation layer to show
#[derive(Debug, Clone, PartialEq)]
pub enum CueKind {
    Particle {
        particle: String,
        binding_name: String,
        /// Negative loops until stopped
        duration: f32,
    },
    Sound {
        sound: String,
        volume: f32,
    },
    FloatingText {
        text: String,
        color: [f32; 4],
    },
}

/// A cue start request
#[derive(Debug, Clone, PartialEq)]
pub struct CueRequest {
    pub unit: AscId,
    pub position: Option<Vec2>,
    pub kind: CueKind,
}

/// Presents cues (particles, sounds, floating text)
pub trait CueDriver: Send {
    fn start_cue(&mut self, id: CueSpecId, request: &CueRequest);
    fn stop_cue(&mut self, id: CueSpecId);
}

/// Spatial queries and movement of units
pub trait WorldQuery: Send {
    fn position_of(&self, unit: AscId) -> Option<Vec2>;

    /// Units within `radius` of `center`
    fn units_in_radius(&self, center: Vec2, radius: f32) -> Vec<AscId>;

    /// Move a unit by `offset`
    fn displace(&mut self, unit: AscId, offset: Vec2);
}

/// Tag lookups a sub-simulation needs to filter units
pub trait TagQuery {
    fn unit_has_any_tags(&self, unit: AscId, tags: &GameplayTagSet) -> bool;
}

/// Snapshot handed to the projectile driver on spawn
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileInitData {
    pub launch_position: Vec2,
    pub target_position: Vec2,
    /// Normalised launch direction, zero when launch and target coincide
    pub direction: Vec2,
    pub target_unit: Option<AscId>,
    pub target_type: ProjectileTargetType,
    pub fly_over: bool,
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
    /// The launching unit, never hit by its own projectile
    pub source: Option<AscId>,
    pub effect: EffectHandle,
    pub skill: SkillId,
    pub node: NodeId,
}

/// Something that happened to a projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileEventKind {
    Hit { target: AscId, position: Vec2 },
    /// `target` is `None` for reverse-angle bounces
    Bounce { target: Option<AscId>, position: Vec2 },
    Reach { position: Vec2 },
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileEvent {
    pub projectile: ProjectileId,
    pub kind: ProjectileEventKind,
}

impl ProjectileEvent {
    pub fn new(projectile: ProjectileId, kind: ProjectileEventKind) -> Self {
        Self { projectile, kind }
    }
}

/// Independently ticked projectile simulation
pub trait ProjectileDriver: Send {
    fn spawn(&mut self, id: ProjectileId, init: ProjectileInitData);

    /// Tear a projectile down without reporting `Destroyed`
    fn destroy(&mut self, id: ProjectileId);

    /// Advance every projectile and report what happened
    fn tick(&mut self, dt: f32, world: &dyn WorldQuery, tags: &dyn TagQuery) -> Vec<ProjectileEvent>;

    fn is_alive(&self, id: ProjectileId) -> bool;
}

/// Ignores animation requests
#[derive(Debug, Default)]
pub struct NullAnimation;

impl AnimationDriver for NullAnimation {
    fn play_animation(&mut self, _unit: AscId, _name: &str, _looping: bool) {}
}

/// Ignores cues
#[derive(Debug, Default)]
pub struct NullCues;

impl CueDriver for NullCues {
    fn start_cue(&mut self, _id: CueSpecId, _request: &CueRequest) {}
    fn stop_cue(&mut self, _id: CueSpecId) {}
}

/// Destroys every projectile on the next tick
#[derive(Debug, Default)]
pub struct NullProjectiles {
    pending: Vec<ProjectileId>,
}

impl ProjectileDriver for NullProjectiles {
    fn spawn(&mut self, id: ProjectileId, _init: ProjectileInitData) {
        log::debug!("No projectile driver, {} is destroyed on the next tick", id);
        self.pending.push(id);
    }

    fn destroy(&mut self, id: ProjectileId) {
        self.pending.retain(|p| *p != id);
    }

    fn tick(&mut self, _dt: f32, _world: &dyn WorldQuery, _tags: &dyn TagQuery) -> Vec<ProjectileEvent> {
        self.pending
            .drain(..)
            .map(|id| ProjectileEvent::new(id, ProjectileEventKind::Destroyed))
            .collect()
    }

    fn is_alive(&self, id: ProjectileId) -> bool {
        self.pending.contains(&id)
    }
}

/// A flat 2D world of point units
#[derive(Debug, Default, Clone)]
pub struct PlaneWorld {
    positions: BTreeMap<AscId, Vec2>,
}

impl PlaneWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: AscId, position: Vec2) -> Self {
        self.positions.insert(unit, position);
        self
    }

    pub fn set_position(&mut self, unit: AscId, position: Vec2) {
        self.positions.insert(unit, position);
    }

    pub fn remove_unit(&mut self, unit: AscId) -> Option<Vec2> {
        self.positions.remove(&unit)
    }
}

impl WorldQuery for PlaneWorld {
    fn position_of(&self, unit: AscId) -> Option<Vec2> {
        self.positions.get(&unit).copied()
    }

    fn units_in_radius(&self, center: Vec2, radius: f32) -> Vec<AscId> {
        self.positions
            .iter()
            .filter(|(_, p)| p.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }

    fn displace(&mut self, unit: AscId, offset: Vec2) {
        if let Some(position) = self.positions.get_mut(&unit) {
            *position += offset;
        }
    }
}

/// World shared between the host and the game loop
#[derive(Debug, Default, Clone)]
pub struct SharedWorld(pub Arc<Mutex<PlaneWorld>>);

impl SharedWorld {
    pub fn new(world: PlaneWorld) -> Self {
        Self(Arc::new(Mutex::new(world)))
    }

    pub fn set_position(&self, unit: AscId, position: Vec2) {
        self.0.lock().set_position(unit, position);
    }

    pub fn remove_unit(&self, unit: AscId) -> Option<Vec2> {
        self.0.lock().remove_unit(unit)
    }
}

impl WorldQuery for SharedWorld {
    fn position_of(&self, unit: AscId) -> Option<Vec2> {
        self.0.lock().position_of(unit)
    }

    fn units_in_radius(&self, center: Vec2, radius: f32) -> Vec<AscId> {
        self.0.lock().units_in_radius(center, radius)
    }

    fn displace(&mut self, unit: AscId, offset: Vec2) {
        self.0.lock().displace(unit, offset);
    }
}

/// A call recorded by [`RecordingAnimation`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationCall {
    pub unit: AscId,
    pub name: String,
    pub looping: bool,
}

/// Records animation requests into a shared log
#[derive(Debug, Default, Clone)]
pub struct RecordingAnimation {
    pub log: Arc<Mutex<Vec<AnimationCall>>>,
}

impl AnimationDriver for RecordingAnimation {
    fn play_animation(&mut self, unit: AscId, name: &str, looping: bool) {
        self.log.lock().push(AnimationCall {
            unit,
            name: name.to_string(),
            looping,
        });
    }
}

/// Tracks running cues in a shared map
#[derive(Debug, Default, Clone)]
pub struct RecordingCues {
    pub running: Arc<Mutex<BTreeMap<CueSpecId, CueRequest>>>,
    pub started: Arc<Mutex<Vec<CueSpecId>>>,
}

impl CueDriver for RecordingCues {
    fn start_cue(&mut self, id: CueSpecId, request: &CueRequest) {
        self.running.lock().insert(id, request.clone());
        self.started.lock().push(id);
    }

    fn stop_cue(&mut self, id: CueSpecId) {
        self.running.lock().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTags;

    impl TagQuery for NoTags {
        fn unit_has_any_tags(&self, _unit: AscId, _tags: &GameplayTagSet) -> bool {
            false
        }
    }

    #[test]
    fn test_plane_world_queries() {
        let mut world = PlaneWorld::new()
            .with_unit(AscId(1), Vec2::ZERO)
            .with_unit(AscId(2), Vec2::new(3.0, 4.0))
            .with_unit(AscId(3), Vec2::new(10.0, 0.0));
        assert_eq!(world.units_in_radius(Vec2::ZERO, 5.0), vec![AscId(1), AscId(2)]);

        world.displace(AscId(3), Vec2::new(-5.0, 0.0));
        assert_eq!(world.position_of(AscId(3)), Some(Vec2::new(5.0, 0.0)));
        assert_eq!(world.position_of(AscId(9)), None);
    }

    #[test]
    fn test_null_projectiles_destroy_next_tick() {
        let mut driver = NullProjectiles::default();
        driver.pending.push(ProjectileId(4));
        assert!(driver.is_alive(ProjectileId(4)));
        let events = driver.tick(0.1, &PlaneWorld::new(), &NoTags);
        assert_eq!(events, vec![ProjectileEvent::new(ProjectileId(4), ProjectileEventKind::Destroyed)]);
        assert!(!driver.is_alive(ProjectileId(4)));
    }

    #[test]
    fn test_recording_drivers() {
        let mut anim = RecordingAnimation::default();
        anim.play_animation(AscId(1), "Cast", false);
        anim.stop_animation(AscId(1), "Stand");
        let log = anim.log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].name, "Stand");
        assert!(log[1].looping);
    }
}
