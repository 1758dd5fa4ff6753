//! KinematicProjectiles - reference projectile driver
//!
//! Point projectiles flying over a [`WorldQuery`]: homing on a unit or
//! travelling to a position, straight or curved, with optional fly-over,
//! piercing and bouncing.

use crate::driver::{
    ProjectileDriver, ProjectileEvent, ProjectileEventKind, ProjectileInitData, TagQuery, WorldQuery,
};
use crate::ids::{AscId, ProjectileId};
use gas_graph::{BounceTargetMode, ProjectileTargetType};
use glam::Vec2;
use std::collections::{BTreeMap, BTreeSet};

/// Distance under which a projectile counts as arrived
const ARRIVE_EPSILON: f32 = 0.1;

fn perpendicular(direction: Vec2) -> Vec2 {
    Vec2::new(direction.y, -direction.x)
}

fn move_towards(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let length = delta.length();
    if length <= max_step || length == 0.0 {
        to
    } else {
        from + delta / length * max_step
    }
}

fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// One projectile in flight
#[derive(Debug, Clone)]
struct Flight {
    id: ProjectileId,
    data: ProjectileInitData,
    target: Option<AscId>,
    position: Vec2,
    direction: Vec2,
    start: Vec2,
    end: Vec2,
    traveled: f32,
    total: f32,
    progress: f32,
    hit_count: u32,
    bounce_count: u32,
    hit: BTreeSet<AscId>,
    reached: bool,
    alive: bool,
}

impl Flight {
    fn new(id: ProjectileId, data: ProjectileInitData) -> Self {
        Self {
            id,
            target: data.target_unit,
            position: data.launch_position,
            direction: data.direction,
            start: data.launch_position,
            end: data.target_position,
            traveled: 0.0,
            total: data.launch_position.distance(data.target_position),
            progress: 0.0,
            hit_count: 0,
            bounce_count: 0,
            hit: BTreeSet::new(),
            reached: false,
            alive: true,
            data,
        }
    }

    fn emit(&self, events: &mut Vec<ProjectileEvent>, kind: ProjectileEventKind) {
        events.push(ProjectileEvent::new(self.id, kind));
    }

    fn destroy(&mut self, events: &mut Vec<ProjectileEvent>) {
        if self.alive {
            self.alive = false;
            self.emit(events, ProjectileEventKind::Destroyed);
        }
    }

    fn step(&mut self, dt: f32, world: &dyn WorldQuery, tags: &dyn TagQuery, events: &mut Vec<ProjectileEvent>) {
        let distance = self.data.speed * dt;
        self.traveled += distance;
        match self.data.target_type {
            ProjectileTargetType::Unit => self.move_to_unit(distance, world),
            ProjectileTargetType::Position => self.move_to_position(distance),
        }
        self.check_collision(world, tags, events);
        if self.alive {
            self.check_reach(world, events);
        }
    }

    fn move_to_unit(&mut self, distance: f32, world: &dyn WorldQuery) {
        if let Some(target) = self.target.and_then(|t| world.position_of(t)) {
            self.end = target;
            self.total = self.position.distance(self.end);
        }
        if self.data.curve_height > 0.0 && self.total > ARRIVE_EPSILON {
            self.progress = (self.traveled / (self.total + self.traveled)).clamp(0.0, 1.0);
            let linear = move_towards(self.position, self.end, distance);
            let offset = self.data.curve_height * 4.0 * self.progress * (1.0 - self.progress);
            self.position = linear + perpendicular(self.direction) * offset;
            self.direction = (self.end - self.position).normalize_or_zero();
        } else {
            self.direction = (self.end - self.position).normalize_or_zero();
            self.position = move_towards(self.position, self.end, distance);
        }
    }

    fn move_to_position(&mut self, distance: f32) {
        if self.data.fly_over {
            self.position += self.direction * distance;
            return;
        }
        if self.data.curve_height > 0.0 && self.total > ARRIVE_EPSILON {
            let along = (self.end - self.start).normalize_or_zero();
            let curve = |progress: f32| {
                self.start.lerp(self.end, progress)
                    + perpendicular(along) * self.data.curve_height * 4.0 * progress * (1.0 - progress)
            };
            self.progress = (self.traveled / self.total).clamp(0.0, 1.0);
            let position = curve(self.progress);
            if self.progress < 1.0 {
                let next = curve(((self.traveled + ARRIVE_EPSILON) / self.total).clamp(0.0, 1.0));
                self.direction = (next - position).normalize_or_zero();
            }
            self.position = position;
        } else {
            self.position += self.direction * distance;
            self.progress = if self.total > 0.0 {
                (self.traveled / self.total).clamp(0.0, 1.0)
            } else {
                1.0
            };
        }
    }

    fn is_valid_target(&self, unit: AscId, tags: &dyn TagQuery) -> bool {
        let required = &self.data.collision_target_tags;
        let excluded = &self.data.collision_exclude_tags;
        (required.is_empty() || tags.unit_has_any_tags(unit, required))
            && (excluded.is_empty() || !tags.unit_has_any_tags(unit, excluded))
    }

    fn check_collision(&mut self, world: &dyn WorldQuery, tags: &dyn TagQuery, events: &mut Vec<ProjectileEvent>) {
        for unit in world.units_in_radius(self.position, self.data.collision_radius) {
            if self.hit.contains(&unit) || Some(unit) == self.data.source || !self.is_valid_target(unit, tags) {
                continue;
            }
            self.hit.insert(unit);
            self.hit_count += 1;
            self.emit(
                events,
                ProjectileEventKind::Hit {
                    target: unit,
                    position: self.position,
                },
            );

            let can_bounce = self.data.is_bouncing && self.bounce_count < self.data.max_bounce_count;
            if !self.data.is_piercing {
                if !(can_bounce && self.try_bounce(unit, world, tags, events)) {
                    self.destroy(events);
                }
                return;
            }
            if self.hit_count >= self.data.max_pierce_count {
                if can_bounce {
                    self.try_bounce(unit, world, tags, events);
                    self.hit_count = 0;
                } else {
                    self.destroy(events);
                }
                return;
            }
        }
    }

    fn try_bounce(
        &mut self,
        current: AscId,
        world: &dyn WorldQuery,
        tags: &dyn TagQuery,
        events: &mut Vec<ProjectileEvent>,
    ) -> bool {
        self.bounce_count += 1;
        match self.data.bounce_target_mode {
            BounceTargetMode::SearchNearest => {
                let next = world
                    .units_in_radius(self.position, self.data.bounce_search_radius)
                    .into_iter()
                    .filter(|u| Some(*u) != self.data.source && *u != current)
                    .filter(|u| self.data.can_bounce_to_same_target || !self.hit.contains(u))
                    .filter(|u| self.is_valid_target(*u, tags))
                    .filter_map(|u| Some((u, world.position_of(u)?.distance(self.position))))
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                let Some((next, _)) = next else {
                    self.bounce_count -= 1;
                    return false;
                };
                if self.data.can_bounce_to_same_target {
                    self.hit.remove(&next);
                } else {
                    self.hit.insert(current);
                }
                self.target = Some(next);
                self.start = self.position;
                self.end = world.position_of(next).unwrap_or(self.position);
                self.total = self.start.distance(self.end);
                self.direction = (self.end - self.start).normalize_or_zero();
                self.traveled = 0.0;
                self.progress = 0.0;
                self.emit(
                    events,
                    ProjectileEventKind::Bounce {
                        target: Some(next),
                        position: self.position,
                    },
                );
            }
            BounceTargetMode::ReverseAngle => {
                let mut direction = -self.direction;
                if self.data.bounce_angle_offset.abs() > 0.01 {
                    direction = rotate_degrees(direction, self.data.bounce_angle_offset);
                }
                if !self.data.can_bounce_to_same_target {
                    self.hit.insert(current);
                }
                // Fly back out as far as the original leg
                self.direction = direction;
                self.target = None;
                self.start = self.position;
                self.end = self.position + direction * self.total.max(ARRIVE_EPSILON);
                self.traveled = 0.0;
                self.progress = 0.0;
                self.emit(
                    events,
                    ProjectileEventKind::Bounce {
                        target: None,
                        position: self.position,
                    },
                );
            }
        }
        true
    }

    fn check_reach(&mut self, world: &dyn WorldQuery, events: &mut Vec<ProjectileEvent>) {
        let limit = self.data.max_distance;
        let past_limit = limit > 0.0 && self.traveled >= limit;
        match self.data.target_type {
            ProjectileTargetType::Unit => {
                let tracking = self.target.and_then(|t| world.position_of(t)).is_some();
                if !tracking && (past_limit || self.position.distance(self.end) < ARRIVE_EPSILON) {
                    self.destroy(events);
                }
            }
            ProjectileTargetType::Position if self.data.fly_over => {
                if !self.reached
                    && (self.position.distance(self.end) < self.data.collision_radius || self.traveled >= self.total)
                {
                    self.reached = true;
                    self.emit(events, ProjectileEventKind::Reach { position: self.end });
                }
                if past_limit {
                    self.destroy(events);
                }
            }
            ProjectileTargetType::Position => {
                if self.progress >= 1.0 || self.position.distance(self.end) < ARRIVE_EPSILON {
                    self.emit(events, ProjectileEventKind::Reach { position: self.end });
                    self.destroy(events);
                } else if past_limit {
                    self.destroy(events);
                }
            }
        }
    }
}

/// Reference [`ProjectileDriver`] simulating point projectiles
#[derive(Debug, Default)]
pub struct KinematicProjectiles {
    flights: BTreeMap<ProjectileId, Flight>,
}

impl KinematicProjectiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position of a projectile
    pub fn position(&self, id: ProjectileId) -> Option<Vec2> {
        self.flights.get(&id).map(|f| f.position)
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

impl ProjectileDriver for KinematicProjectiles {
    fn spawn(&mut self, id: ProjectileId, init: ProjectileInitData) {
        self.flights.insert(id, Flight::new(id, init));
    }

    fn destroy(&mut self, id: ProjectileId) {
        self.flights.remove(&id);
    }

    fn tick(&mut self, dt: f32, world: &dyn WorldQuery, tags: &dyn TagQuery) -> Vec<ProjectileEvent> {
        let mut events = Vec::new();
        for flight in self.flights.values_mut() {
            flight.step(dt, world, tags, &mut events);
        }
        self.flights.retain(|_, f| f.alive);
        events
    }

    fn is_alive(&self, id: ProjectileId) -> bool {
        self.flights.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::PlaneWorld;
    use crate::ids::{EffectHandle, EffectSpecId};
    use gas_graph::{NodeId, SkillId};
    use gas_tags::GameplayTagSet;

    struct NoTags;

    impl TagQuery for NoTags {
        fn unit_has_any_tags(&self, _unit: AscId, _tags: &GameplayTagSet) -> bool {
            false
        }
    }

    fn init(target_type: ProjectileTargetType, from: Vec2, to: Vec2, target: Option<AscId>) -> ProjectileInitData {
        ProjectileInitData {
            launch_position: from,
            target_position: to,
            direction: (to - from).normalize_or_zero(),
            target_unit: target,
            target_type,
            fly_over: false,
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
            source: Some(AscId(1)),
            effect: EffectHandle::new(AscId(1), EffectSpecId(1)),
            skill: SkillId::new("Bolt"),
            node: NodeId::new("bolt"),
        }
    }

    fn kinds(events: &[ProjectileEvent]) -> Vec<ProjectileEventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_position_projectile_reaches() {
        let world = PlaneWorld::new().with_unit(AscId(1), Vec2::ZERO);
        let mut sim = KinematicProjectiles::new();
        let id = ProjectileId(1);
        sim.spawn(id, init(ProjectileTargetType::Position, Vec2::ZERO, Vec2::new(5.0, 0.0), None));

        assert!(sim.tick(0.25, &world, &NoTags).is_empty());
        assert_eq!(sim.position(id), Some(Vec2::new(2.5, 0.0)));
        let events = sim.tick(0.25, &world, &NoTags);
        assert_eq!(
            kinds(&events),
            vec![
                ProjectileEventKind::Reach {
                    position: Vec2::new(5.0, 0.0)
                },
                ProjectileEventKind::Destroyed
            ]
        );
        assert!(!sim.is_alive(id));
    }

    #[test]
    fn test_homing_hit_destroys() {
        let world = PlaneWorld::new()
            .with_unit(AscId(1), Vec2::ZERO)
            .with_unit(AscId(2), Vec2::new(3.0, 0.0));
        let mut sim = KinematicProjectiles::new();
        sim.spawn(
            ProjectileId(1),
            init(ProjectileTargetType::Unit, Vec2::ZERO, Vec2::new(3.0, 0.0), Some(AscId(2))),
        );
        let events = sim.tick(0.3, &world, &NoTags);
        assert_eq!(
            kinds(&events),
            vec![
                ProjectileEventKind::Hit {
                    target: AscId(2),
                    position: Vec2::new(3.0, 0.0)
                },
                ProjectileEventKind::Destroyed
            ]
        );
    }

    #[test]
    fn test_pierce_passes_through() {
        let world = PlaneWorld::new()
            .with_unit(AscId(1), Vec2::ZERO)
            .with_unit(AscId(2), Vec2::new(2.0, 0.0))
            .with_unit(AscId(3), Vec2::new(4.0, 0.0));
        let mut data = init(ProjectileTargetType::Position, Vec2::ZERO, Vec2::new(8.0, 0.0), None);
        data.is_piercing = true;
        data.max_pierce_count = 2;
        let mut sim = KinematicProjectiles::new();
        sim.spawn(ProjectileId(1), data);

        let first = sim.tick(0.2, &world, &NoTags);
        assert!(matches!(first[0].kind, ProjectileEventKind::Hit { target: AscId(2), .. }));
        assert!(sim.is_alive(ProjectileId(1)));

        let second = sim.tick(0.2, &world, &NoTags);
        assert!(matches!(second[0].kind, ProjectileEventKind::Hit { target: AscId(3), .. }));
        assert_eq!(second[1].kind, ProjectileEventKind::Destroyed);
    }

    #[test]
    fn test_bounce_to_nearest() {
        let world = PlaneWorld::new()
            .with_unit(AscId(1), Vec2::ZERO)
            .with_unit(AscId(2), Vec2::new(2.0, 0.0))
            .with_unit(AscId(3), Vec2::new(2.0, 4.0))
            .with_unit(AscId(4), Vec2::new(2.0, 9.0));
        let mut data = init(ProjectileTargetType::Unit, Vec2::ZERO, Vec2::new(2.0, 0.0), Some(AscId(2)));
        data.is_bouncing = true;
        data.max_bounce_count = 1;
        let mut sim = KinematicProjectiles::new();
        sim.spawn(ProjectileId(1), data);

        let events = sim.tick(0.2, &world, &NoTags);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1].kind,
            ProjectileEventKind::Bounce {
                target: Some(AscId(3)),
                position: Vec2::new(2.0, 0.0)
            }
        );

        // Out of bounces: the next hit destroys
        let events = sim.tick(0.4, &world, &NoTags);
        assert!(matches!(events[0].kind, ProjectileEventKind::Hit { target: AscId(3), .. }));
        assert_eq!(events[1].kind, ProjectileEventKind::Destroyed);
    }

    #[test]
    fn test_fly_over_reaches_once() {
        let world = PlaneWorld::new();
        let mut data = init(ProjectileTargetType::Position, Vec2::ZERO, Vec2::new(2.0, 0.0), None);
        data.fly_over = true;
        data.max_distance = 6.0;
        let mut sim = KinematicProjectiles::new();
        sim.spawn(ProjectileId(1), data);

        let reach = sim.tick(0.2, &world, &NoTags);
        assert_eq!(reach.len(), 1);
        assert!(matches!(reach[0].kind, ProjectileEventKind::Reach { .. }));
        assert!(sim.tick(0.2, &world, &NoTags).is_empty());
        let last = sim.tick(0.2, &world, &NoTags);
        assert_eq!(kinds(&last), vec![ProjectileEventKind::Destroyed]);
    }

    #[test]
    fn test_lost_target_destroyed_on_arrival() {
        let world = PlaneWorld::new().with_unit(AscId(1), Vec2::ZERO);
        let mut sim = KinematicProjectiles::new();
        sim.spawn(
            ProjectileId(1),
            init(ProjectileTargetType::Unit, Vec2::ZERO, Vec2::new(1.0, 0.0), Some(AscId(9))),
        );
        let events = sim.tick(0.2, &world, &NoTags);
        assert_eq!(kinds(&events), vec![ProjectileEventKind::Destroyed]);
    }
}
