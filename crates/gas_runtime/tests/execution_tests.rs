//! Integration tests for gas_runtime
//!
//! Graph traversal order, condition branches, target search, event ports and
//! the traversal depth guard

use gas_graph::{
    AbilityEventPort, AbilityNodeData, AttributeCompareConditionNodeData, CompareOp,
    DamageEffectNodeData, EffectNodeData, EndAbilityTaskNodeData, HealEffectNodeData, Magnitude,
    ModifierEffectNodeData, SearchTargetTaskNodeData, TargetSelector,
};
use gas_runtime::prelude::*;

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

fn hit(amount: f32, target: TargetSelector) -> NodeData {
    NodeData::DamageEffect(DamageEffectNodeData {
        effect: EffectNodeData::instant().targeting(target),
        damage: Magnitude::fixed(amount),
        damage_type: DamageType::True,
    })
}

fn end() -> NodeData {
    NodeData::EndAbilityTask(EndAbilityTaskNodeData { was_cancelled: false })
}

fn ability(event_ports: Vec<AbilityEventPort>) -> NodeData {
    NodeData::Ability(AbilityNodeData {
        event_ports,
        ..AbilityNodeData::default()
    })
}

/// Three hits in authored order
fn volley() -> SkillGraph {
    SkillGraph::new("Volley")
        .with_node("ability", ability(Vec::new()))
        .unwrap()
        .with_node("one", hit(1.0, TargetSelector::Current))
        .unwrap()
        .with_node("two", hit(2.0, TargetSelector::Current))
        .unwrap()
        .with_node("three", hit(3.0, TargetSelector::Current))
        .unwrap()
        .with_node("end", end())
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "one")
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "two")
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "three")
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "end")
        .unwrap()
}

/// Heals the caster when at half health or less, jabs the target otherwise
fn mend() -> SkillGraph {
    SkillGraph::new("Mend")
        .with_node("ability", ability(Vec::new()))
        .unwrap()
        .with_node(
            "check",
            NodeData::AttributeCompareCondition(AttributeCompareConditionNodeData {
                source: TargetSelector::Caster,
                attribute: AttributeKind::Health,
                operator: CompareOp::LessOrEqual,
                value: Magnitude::fixed(0.5),
                compare_percent: true,
            }),
        )
        .unwrap()
        .with_node(
            "heal",
            NodeData::HealEffect(HealEffectNodeData {
                effect: EffectNodeData::instant().targeting(TargetSelector::Caster),
                heal: Magnitude::fixed(20.0),
            }),
        )
        .unwrap()
        .with_node("jab", hit(10.0, TargetSelector::Current))
        .unwrap()
        .with_node("end", end())
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "check")
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "end")
        .unwrap()
        .with_connection("check", ports::TRUE, "heal")
        .unwrap()
        .with_connection("check", ports::FALSE, "jab")
        .unwrap()
}

/// Zaps the two nearest units around the caster
fn nova() -> SkillGraph {
    SkillGraph::new("Nova")
        .with_node("ability", ability(Vec::new()))
        .unwrap()
        .with_node(
            "search",
            NodeData::SearchTargetTask(SearchTargetTaskNodeData {
                radius: 5.0,
                max_targets: 2,
                ..SearchTargetTaskNodeData::default()
            }),
        )
        .unwrap()
        .with_node("zap", hit(10.0, TargetSelector::Current))
        .unwrap()
        .with_node("fizzle", hit(1.0, TargetSelector::Caster))
        .unwrap()
        .with_node("end", end())
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "search")
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "end")
        .unwrap()
        .with_connection("search", ports::ON_FOUND, "zap")
        .unwrap()
        .with_connection("search", ports::ON_EMPTY, "fizzle")
        .unwrap()
}

/// Strikes back at the main target whenever the owner is hurt
fn thorns() -> SkillGraph {
    SkillGraph::new("Thorns")
        .with_node(
            "ability",
            ability(vec![AbilityEventPort {
                event: GameplayEventType::OnTakeDamage,
                port: "retaliate".to_string(),
            }]),
        )
        .unwrap()
        .with_node("spike", hit(5.0, TargetSelector::MainTarget))
        .unwrap()
        .with_connection("ability", "retaliate", "spike")
        .unwrap()
}

/// An effect feeding its own output
fn echo() -> SkillGraph {
    SkillGraph::new("Echo")
        .with_node("ability", ability(Vec::new()))
        .unwrap()
        .with_node(
            "echo",
            NodeData::GenericEffect(ModifierEffectNodeData {
                effect: EffectNodeData::instant().targeting(TargetSelector::Caster),
            }),
        )
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "echo")
        .unwrap()
        .with_connection("echo", ports::OUTPUT, "echo")
        .unwrap()
}

/// Two hits around a node of an unknown type and one without a type
const CLEAVE: &str = r#"{
    "skillId": "Cleave",
    "nodes": [
        { "guid": "ability", "$type": "AbilityNodeData" },
        { "guid": "left", "$type": "DamageEffect", "damage": 5, "damage_type": "True" },
        { "guid": "ghost", "$type": "SummonEffect" },
        { "guid": "untyped", "damage": 50, "damage_type": "True" },
        { "guid": "right", "$type": "DamageEffect", "damage": 7, "damage_type": "True" },
        { "guid": "end", "$type": "EndAbilityTask" }
    ],
    "connections": [
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "left", "inputPortName": "input" },
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "ghost", "inputPortName": "input" },
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "untyped", "inputPortName": "input" },
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "right", "inputPortName": "input" },
        { "outputNodeGuid": "ability", "outputPortName": "activate", "inputNodeGuid": "end", "inputPortName": "input" }
    ]
}"#;

fn host_with(graphs: Vec<SkillGraph>) -> GasHost {
    let mut host = GasHost::new(GasConfig::default().with_max_depth(8));
    for graph in graphs {
        host.register_skill(graph).unwrap();
    }
    host
}

#[test]
fn test_connections_run_in_authored_order() {
    init_logging();
    let mut host = host_with(vec![volley()]);
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    let volley = host.grant_ability(hero, &SkillId::new("Volley")).unwrap();
    host.drain_events();

    assert!(host.try_activate_ability(volley, Some(dummy)));
    let after: Vec<f32> = host
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            GasEvent::AttributeChanged { unit, change } if unit == dummy => Some(change.after),
            _ => None,
        })
        .collect();
    assert_eq!(after, vec![99.0, 97.0, 94.0]);
    assert!(!host.is_ability_active(hero, volley.spec));
}

#[test]
fn test_condition_takes_one_branch() {
    init_logging();
    let mut host = host_with(vec![mend()]);
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    let mend = host.grant_ability(hero, &SkillId::new("Mend")).unwrap();

    assert!(host.try_activate_ability(mend, Some(dummy)));
    assert_eq!(health(&host, hero), 100.0);
    assert_eq!(health(&host, dummy), 90.0);

    host.set_attribute_base(hero, AttributeKind::Health, 40.0).unwrap();
    assert!(host.try_activate_ability(mend, Some(dummy)));
    assert_eq!(health(&host, hero), 60.0);
    assert_eq!(health(&host, dummy), 90.0);
}

#[test]
fn test_search_visits_nearest() {
    init_logging();
    let world = SharedWorld::default();
    let mut host = host_with(vec![nova()]).with_world(world.clone());
    let hero = host.create_unit("Hero", stats());
    let near = host.create_unit("Near", stats());
    let mid = host.create_unit("Mid", stats());
    let edge = host.create_unit("Edge", stats());
    let far = host.create_unit("Far", stats());
    world.set_position(hero, Vec2::ZERO);
    world.set_position(near, Vec2::new(1.0, 0.0));
    world.set_position(mid, Vec2::new(0.0, 2.0));
    world.set_position(edge, Vec2::new(3.0, 0.0));
    world.set_position(far, Vec2::new(10.0, 0.0));

    let nova = host.grant_ability(hero, &SkillId::new("Nova")).unwrap();
    assert!(host.try_activate_ability(nova, None));
    assert_eq!(health(&host, near), 90.0);
    assert_eq!(health(&host, mid), 90.0);
    assert_eq!(health(&host, edge), 100.0);
    assert_eq!(health(&host, far), 100.0);
    assert_eq!(health(&host, hero), 100.0);

    for unit in [near, mid, edge] {
        world.set_position(unit, Vec2::new(20.0, 0.0));
    }
    assert!(host.try_activate_ability(nova, None));
    assert_eq!(health(&host, hero), 99.0);
}

#[test]
fn test_event_port_runs_while_active() {
    init_logging();
    let mut host = host_with(vec![thorns()]);
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    let thorns = host.grant_ability(hero, &SkillId::new("Thorns")).unwrap();

    host.apply_damage(hero, DamageInfo::new(10.0, DamageType::True));
    assert_eq!(health(&host, dummy), 100.0);

    assert!(host.try_activate_ability(thorns, Some(dummy)));
    host.apply_damage(hero, DamageInfo::new(10.0, DamageType::True));
    assert_eq!(health(&host, hero), 80.0);
    assert_eq!(health(&host, dummy), 95.0);

    // Healing is a different event
    host.set_attribute_base(hero, AttributeKind::Health, 100.0).unwrap();
    assert_eq!(health(&host, dummy), 95.0);

    host.end_ability(thorns, false);
    host.apply_damage(hero, DamageInfo::new(10.0, DamageType::True));
    assert_eq!(health(&host, dummy), 95.0);
}

#[test]
fn test_cyclic_graph_stops_at_depth() {
    init_logging();
    let mut host = host_with(vec![echo()]);
    let hero = host.create_unit("Hero", stats());
    let echo = host.grant_ability(hero, &SkillId::new("Echo")).unwrap();
    host.drain_events();

    assert!(host.try_activate_ability(echo, None));
    let executed = host
        .drain_events()
        .iter()
        .filter(|e| matches!(e, GasEvent::EffectExecuted { .. }))
        .count();
    assert_eq!(executed, 8);
}

#[test]
fn test_skipped_nodes_do_not_stop_siblings() {
    init_logging();
    let mut host = host_with(Vec::new());
    host.register_skill_json(CLEAVE).unwrap();
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    let cleave = host.grant_ability(hero, &SkillId::new("Cleave")).unwrap();

    assert!(host.try_activate_ability(cleave, Some(dummy)));
    assert_eq!(health(&host, dummy), 88.0);
    assert!(!host.is_ability_active(hero, cleave.spec));
}
