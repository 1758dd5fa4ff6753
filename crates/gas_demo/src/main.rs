//! Ability system arena demo
//!
//! Loads the JSON skills under `skills/`, drops a mage and a pack of goblins
//! onto a plane and plays a short scripted fight at a fixed frame rate.
//!
//! Run with: cargo run -p gas_demo
//!
//! `RUST_LOG=debug` shows every skipped branch and rejected application.

use std::collections::BTreeMap;

use gas_runtime::prelude::*;

const SKILLS: &[(&str, &str)] = &[
    ("fireball", include_str!("../skills/fireball.json")),
    ("frost_nova", include_str!("../skills/frost_nova.json")),
    ("ignite", include_str!("../skills/ignite.json")),
];

/// Seconds of simulated fight
const FIGHT_LENGTH: f32 = 6.0;

/// Prints animation requests instead of playing them
struct LogAnimation;

impl AnimationDriver for LogAnimation {
    fn play_animation(&mut self, unit: AscId, name: &str, looping: bool) {
        log::info!("[anim] {} plays '{}'{}", unit, name, if looping { " (loop)" } else { "" });
    }
}

/// Prints cue requests instead of presenting them
struct LogCues;

impl CueDriver for LogCues {
    fn start_cue(&mut self, id: CueSpecId, request: &CueRequest) {
        match &request.kind {
            CueKind::Particle { particle, .. } => {
                log::info!("[{}] particle '{}' on {}", id, particle, request.unit)
            }
            CueKind::Sound { sound, volume } => {
                log::info!("[{}] sound '{}' at {:.1}", id, sound, volume)
            }
            CueKind::FloatingText { text, .. } => {
                log::info!("[{}] '{}' over {}", id, text, request.unit)
            }
        }
    }

    fn stop_cue(&mut self, id: CueSpecId) {
        log::info!("[{}] stopped", id);
    }
}

/// A cast the script issues at a given time
struct ScriptedCast {
    at: f32,
    skill: &'static str,
    target: usize,
}

fn mage_stats() -> AttributeSet {
    AttributeSet::new()
        .with(AttributeKind::MaxHealth, 120.0)
        .with(AttributeKind::Health, 120.0)
        .with(AttributeKind::MaxMana, 60.0)
        .with(AttributeKind::Mana, 60.0)
        .with(AttributeKind::MoveSpeed, 4.0)
}

fn goblin_stats(magic_resist: f32) -> AttributeSet {
    AttributeSet::new()
        .with(AttributeKind::MaxHealth, 90.0)
        .with(AttributeKind::Health, 90.0)
        .with(AttributeKind::MagicResist, magic_resist)
        .with(AttributeKind::MoveSpeed, 5.0)
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("=== Gameplay Ability System arena ===");
    println!();

    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> GasResult<()> {
    let config = GasConfig::load();
    let frame_time = 1.0 / config.frame_rate.max(1.0);
    log::info!(
        "Frame rate {} fps, max traversal depth {}",
        config.frame_rate,
        config.max_depth
    );

    let world = SharedWorld::default();
    let mut host = GasHost::new(config)
        .with_world(world.clone())
        .with_animation_driver(LogAnimation)
        .with_cue_driver(LogCues)
        .with_projectile_driver(KinematicProjectiles::new());

    for (name, json) in SKILLS {
        let graph = host.register_skill_json(json)?;
        log::info!(
            "Loaded skill '{}' from {}.json ({} nodes)",
            graph.skill_id(),
            name,
            graph.node_count()
        );
    }

    let mage = host.create_unit("Mage", mage_stats());
    world.set_position(mage, Vec2::ZERO);
    host.add_loose_tags(mage, &GameplayTagSet::from_names(["State.Ally"])?)?;

    let goblins: Vec<AscId> = [
        ("Goblin Scout", Vec2::new(6.0, 0.0), 0.0),
        ("Goblin Shaman", Vec2::new(3.0, 1.0), 25.0),
        ("Goblin Brute", Vec2::new(6.5, 1.5), 10.0),
    ]
    .into_iter()
    .map(|(name, position, resist)| {
        let id = host.create_unit(name, goblin_stats(resist));
        world.set_position(id, position);
        id
    })
    .collect();

    let mut abilities = BTreeMap::new();
    for skill in ["Fireball", "FrostNova", "Ignite"] {
        abilities.insert(skill, host.grant_ability(mage, &SkillId::new(skill))?);
    }

    let script = [
        ScriptedCast { at: 0.0, skill: "Fireball", target: 0 },
        ScriptedCast { at: 0.5, skill: "Fireball", target: 0 },
        ScriptedCast { at: 1.0, skill: "Ignite", target: 0 },
        ScriptedCast { at: 1.5, skill: "FrostNova", target: 1 },
        ScriptedCast { at: 2.0, skill: "Ignite", target: 2 },
        ScriptedCast { at: 2.5, skill: "Ignite", target: 2 },
        ScriptedCast { at: 3.5, skill: "Fireball", target: 2 },
    ];

    let mut summary: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut next_cast = 0;
    let mut time = 0.0;

    while time < FIGHT_LENGTH {
        while let Some(cast) = script.get(next_cast).filter(|c| c.at <= time) {
            next_cast += 1;
            let Some(&ability) = abilities.get(cast.skill) else {
                continue;
            };
            let target = goblins.get(cast.target).copied();
            if host.try_activate_ability(ability, target) {
                log::info!("{:.2}s: Mage casts {}", time, cast.skill);
            } else {
                let cooldown = host.cooldown_info(ability);
                log::info!(
                    "{:.2}s: {} not ready (cooldown {:.1}s, charges {}/{})",
                    time,
                    cast.skill,
                    cooldown.remaining_time,
                    cooldown.current_charges,
                    cooldown.max_charges
                );
            }
        }

        host.tick(frame_time);
        time += frame_time;

        for event in host.drain_events() {
            *summary.entry(event_name(&event)).or_default() += 1;
        }
    }

    println!();
    println!("--- Final state ---");
    for unit in host.units() {
        let health = unit.attribute(AttributeKind::Health).unwrap_or(0.0);
        let mana = unit.attribute(AttributeKind::Mana);
        let position = host.world().position_of(unit.id()).unwrap_or(Vec2::ZERO);
        match mana {
            Some(mana) => println!(
                "{:<14} hp {:>6.1}  mana {:>5.1}  at ({:.1}, {:.1})",
                unit.name(),
                health,
                mana,
                position.x,
                position.y
            ),
            None => println!(
                "{:<14} hp {:>6.1}  effects {}  at ({:.1}, {:.1})",
                unit.name(),
                health,
                unit.effects().len(),
                position.x,
                position.y
            ),
        }
    }

    println!();
    println!("--- Events ---");
    for (name, count) in &summary {
        println!("{:<20} {}", name, count);
    }
    println!();

    Ok(())
}

fn event_name(event: &GasEvent) -> &'static str {
    match event {
        GasEvent::UnitRegistered { .. } => "UnitRegistered",
        GasEvent::UnitUnregistered { .. } => "UnitUnregistered",
        GasEvent::AbilityActivated { .. } => "AbilityActivated",
        GasEvent::AbilityEnded { .. } => "AbilityEnded",
        GasEvent::EffectApplied { .. } => "EffectApplied",
        GasEvent::EffectExecuted { .. } => "EffectExecuted",
        GasEvent::EffectStacked { .. } => "EffectStacked",
        GasEvent::EffectOverflowed { .. } => "EffectOverflowed",
        GasEvent::EffectRemoved { .. } => "EffectRemoved",
        GasEvent::TagChanged { .. } => "TagChanged",
        GasEvent::AttributeChanged { .. } => "AttributeChanged",
        GasEvent::Gameplay { .. } => "Gameplay",
        GasEvent::CueStarted { .. } => "CueStarted",
        GasEvent::CueStopped { .. } => "CueStopped",
    }
}
