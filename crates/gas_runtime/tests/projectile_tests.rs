//! Integration tests for gas_runtime
//!
//! JSON-authored projectile and placement skills driven by the kinematic
//! projectile driver over a shared plane world

use gas_runtime::prelude::*;

const BOLT: &str = r#"{
    "skillId": "Bolt",
    "nodes": [
        { "guid": "ability", "$type": "AbilityNodeData", "skill_number": 301 },
        {
            "guid": "bolt",
            "$type": "ProjectileEffectNodeData",
            "speed": 4,
            "collision_radius": 0.5
        },
        { "guid": "burn", "$type": "DamageEffect", "damage": 25, "damage_type": "True" },
        { "guid": "end", "$type": "EndAbilityTask" }
    ],
    "connections": [
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "bolt", "inputPortName": "input" },
        { "outputNodeGuid": "bolt", "outputPortName": "on_hit", "inputNodeGuid": "burn", "inputPortName": "input" },
        { "outputNodeGuid": "bolt", "outputPortName": "output", "inputNodeGuid": "end", "inputPortName": "input" }
    ]
}"#;

const TETHER: &str = r#"{
    "skillId": "Tether",
    "nodes": [
        { "guid": "ability", "$type": "Ability" },
        {
            "guid": "tether",
            "$type": "ProjectileEffect",
            "speed": 1,
            "effect": { "duration_type": "Infinite", "cancel_on_ability_end": true }
        },
        { "guid": "burn", "$type": "DamageEffect", "damage": 25, "damage_type": "True" }
    ],
    "connections": [
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "tether", "inputPortName": "input" },
        { "outputNodeGuid": "tether", "outputPortName": "on_hit", "inputNodeGuid": "burn", "inputPortName": "input" }
    ]
}"#;

const INFERNO: &str = r#"{
    "skillId": "Inferno",
    "nodes": [
        { "guid": "ability", "$type": "Ability" },
        {
            "guid": "zone",
            "$type": "PlacementEffect",
            "position": "MainTarget",
            "radius": 3,
            "effect": {
                "duration_type": "HasDuration",
                "duration": 2,
                "is_periodic": true,
                "period": 1
            }
        },
        { "guid": "scorch", "$type": "DamageEffect", "damage": 10, "damage_type": "True" }
    ],
    "connections": [
        { "outputNodeGuid": "zone", "outputPortName": "on_tick", "inputNodeGuid": "scorch", "inputPortName": "input" }
    ]
}"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stats() -> AttributeSet {
    AttributeSet::new()
        .with(AttributeKind::MaxHealth, 100.0)
        .with(AttributeKind::Health, 100.0)
}

fn health(host: &GasHost, unit: AscId) -> f32 {
    host.unit(unit).unwrap().attribute(AttributeKind::Health).unwrap()
}

fn arena() -> (GasHost, SharedWorld) {
    let world = SharedWorld::default();
    let mut host = GasHost::new(GasConfig::default())
        .with_world(world.clone())
        .with_projectile_driver(KinematicProjectiles::new());
    for json in [BOLT, TETHER, INFERNO] {
        host.register_skill_json(json).unwrap();
    }
    (host, world)
}

#[test]
fn test_projectile_hit_runs_on_hit() {
    init_logging();
    let (mut host, world) = arena();
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    world.set_position(hero, Vec2::ZERO);
    world.set_position(dummy, Vec2::new(3.0, 0.0));

    let bolt = host.grant_ability(hero, &SkillId::new("Bolt")).unwrap();
    assert!(host.try_activate_ability(bolt, Some(dummy)));
    assert_eq!(host.projectile_count(), 1);
    // The projectile outlives the ability that fired it
    assert!(!host.is_ability_active(hero, bolt.spec));

    host.tick(0.25);
    host.tick(0.25);
    assert_eq!(health(&host, dummy), 100.0);
    host.tick(0.25);
    assert_eq!(health(&host, dummy), 75.0);
    assert_eq!(host.projectile_count(), 0);
    assert!(host.unit(dummy).unwrap().effects().is_empty());
}

#[test]
fn test_projectile_removed_with_ability() {
    init_logging();
    let (mut host, world) = arena();
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    world.set_position(hero, Vec2::ZERO);
    world.set_position(dummy, Vec2::new(3.0, 0.0));

    let tether = host.grant_ability(hero, &SkillId::new("Tether")).unwrap();
    assert!(host.try_activate_ability(tether, Some(dummy)));
    assert_eq!(host.ability(tether).unwrap().running_effects().len(), 1);
    host.tick(1.0);
    assert_eq!(host.projectile_count(), 1);

    assert!(host.cancel_ability(tether));
    assert_eq!(host.projectile_count(), 0);
    for _ in 0..4 {
        host.tick(1.0);
    }
    assert_eq!(health(&host, dummy), 100.0);
}

#[test]
fn test_placement_ticks_units_inside() {
    init_logging();
    let (mut host, world) = arena();
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    let ally = host.create_unit("Ally", stats());
    let far = host.create_unit("Far", stats());
    world.set_position(hero, Vec2::ZERO);
    world.set_position(dummy, Vec2::new(5.0, 0.0));
    world.set_position(ally, Vec2::new(6.0, 0.0));
    world.set_position(far, Vec2::new(20.0, 0.0));

    let outcome = host
        .apply_gameplay_effect(&SkillId::new("Inferno"), &NodeId::new("zone"), hero, dummy)
        .unwrap();
    let zone = outcome.handle().unwrap();
    assert_eq!(
        host.effect(zone).unwrap().context().get_position(PLACEMENT_POSITION),
        Some(Vec2::new(5.0, 0.0))
    );

    host.tick(1.0);
    assert_eq!(health(&host, dummy), 90.0);
    assert_eq!(health(&host, ally), 90.0);
    host.tick(1.0);
    assert_eq!(health(&host, dummy), 80.0);
    assert_eq!(health(&host, ally), 80.0);

    host.tick(1.0);
    assert_eq!(health(&host, dummy), 80.0);
    assert_eq!(health(&host, far), 100.0);
    assert_eq!(health(&host, hero), 100.0);
}
