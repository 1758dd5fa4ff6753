//! Integration tests for gas_runtime
//!
//! Effect durations, periods, stacking, charge cooldowns and tag rules

use gas_graph::{
    AbilityNodeData, AbilityTags, AttributeModifierData, CooldownEffectNodeData, CooldownType,
    DamageEffectNodeData, EffectNodeData, EndAbilityTaskNodeData, Magnitude, ModifierEffectNodeData,
    ModifierOperation, StackExpirationPolicy, StackOverflowPolicy, StackType, StackingData,
};
use gas_runtime::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tags(names: &[&str]) -> GameplayTagSet {
    GameplayTagSet::from_names(names.iter().copied()).unwrap()
}

fn stats() -> AttributeSet {
    AttributeSet::new()
        .with(AttributeKind::MaxHealth, 100.0)
        .with(AttributeKind::Health, 100.0)
        .with(AttributeKind::Attack, 10.0)
        .with(AttributeKind::Defense, 10.0)
}

fn attribute(host: &GasHost, unit: AscId, attribute: AttributeKind) -> f32 {
    host.unit(unit).unwrap().attribute(attribute).unwrap()
}

fn ability_node() -> NodeData {
    NodeData::Ability(AbilityNodeData::default())
}

fn true_damage(amount: f32, effect: EffectNodeData) -> NodeData {
    NodeData::DamageEffect(DamageEffectNodeData {
        effect,
        damage: Magnitude::fixed(amount),
        damage_type: DamageType::True,
    })
}

fn modifier(effect: EffectNodeData) -> NodeData {
    NodeData::BuffEffect(ModifierEffectNodeData { effect })
}

fn shred(limit: u32, expiration: StackExpirationPolicy) -> EffectNodeData {
    EffectNodeData::with_duration(4.0)
        .with_modifier(AttributeModifierData::new(
            AttributeKind::Defense,
            ModifierOperation::Add,
            Magnitude::fixed(-2.0),
        ))
        .with_stacking(StackingData {
            stack_type: StackType::AggregateByTarget,
            stack_limit: limit,
            expiration,
            overflow: StackOverflowPolicy::TriggerOverflowPort,
            ..StackingData::default()
        })
}

/// Effects applied directly with `apply_gameplay_effect`
fn library() -> SkillGraph {
    let mut poison = EffectNodeData::with_duration(3.0).periodic(1.0, false);
    poison.asset_tags = tags(&["Buff.DeBuff.Poison"]);
    let mut cleanse = EffectNodeData::instant();
    cleanse.remove_effects_with_tags = tags(&["Buff.DeBuff.Poison"]);
    let mut blessing = EffectNodeData::infinite().with_modifier(AttributeModifierData::new(
        AttributeKind::Attack,
        ModifierOperation::Add,
        Magnitude::fixed(5.0),
    ));
    blessing.ongoing_required_tags = tags(&["State.Blessed"]);
    let mut ward = EffectNodeData::instant();
    ward.application_immunity_tags = tags(&["State.Warded"]);

    SkillGraph::new("Library")
        .with_node("ability", ability_node())
        .unwrap()
        .with_node("shred", modifier(shred(2, StackExpirationPolicy::ClearEntireStack)))
        .unwrap()
        .with_node(
            "erode",
            modifier(shred(0, StackExpirationPolicy::RemoveSingleStackAndRefreshDuration)),
        )
        .unwrap()
        .with_node("burst", true_damage(15.0, EffectNodeData::instant()))
        .unwrap()
        .with_node("poison", true_damage(10.0, poison))
        .unwrap()
        .with_node("cleanse", NodeData::GenericEffect(ModifierEffectNodeData { effect: cleanse }))
        .unwrap()
        .with_node("blessing", modifier(blessing))
        .unwrap()
        .with_node("smite", true_damage(30.0, ward))
        .unwrap()
        .with_connection("shred", ports::ON_OVERFLOW, "burst")
        .unwrap()
}

/// Three charges, one back every five seconds
fn blink() -> SkillGraph {
    SkillGraph::new("Blink")
        .with_node(
            "ability",
            NodeData::Ability(AbilityNodeData {
                skill_number: 7,
                tags: AbilityTags {
                    activation_blocked_tags: tags(&["CD.Blink"]),
                    ..AbilityTags::default()
                },
                event_ports: Vec::new(),
            }),
        )
        .unwrap()
        .with_node(
            "charges",
            NodeData::CooldownEffect(CooldownEffectNodeData {
                effect: EffectNodeData::infinite().granting(tags(&["CD.Blink"])),
                cooldown_type: CooldownType::Charge,
                max_charges: 3,
                charge_time: Magnitude::fixed(5.0),
            }),
        )
        .unwrap()
        .with_node(
            "end",
            NodeData::EndAbilityTask(EndAbilityTaskNodeData { was_cancelled: false }),
        )
        .unwrap()
        .with_connection("ability", ports::COOLDOWN, "charges")
        .unwrap()
        .with_connection("ability", ports::ACTIVATE, "end")
        .unwrap()
}

fn setup() -> (GasHost, AscId, AscId) {
    let mut host = GasHost::new(GasConfig::default());
    host.register_skill(library()).unwrap();
    host.register_skill(blink()).unwrap();
    let hero = host.create_unit("Hero", stats());
    let dummy = host.create_unit("Dummy", stats());
    (host, hero, dummy)
}

fn apply(host: &mut GasHost, node: &str, source: AscId, target: AscId) -> ApplyOutcome {
    host.apply_gameplay_effect(&SkillId::new("Library"), &NodeId::new(node), source, target)
        .unwrap()
}

#[test]
fn test_charge_cooldown() {
    init_logging();
    let (mut host, hero, _) = setup();
    let blink = host.grant_ability(hero, &SkillId::new("Blink")).unwrap();
    let cd = tags(&["CD.Blink"]);

    // First charge starts the recharge timer, the tag waits for the last one
    assert!(host.try_activate_ability(blink, None));
    let info = host.cooldown_info(blink);
    assert_eq!(info.current_charges, 2);
    assert_eq!(info.charge_time_remaining, 5.0);
    assert!(!info.is_on_cooldown);
    assert!(!host.unit(hero).unwrap().has_any_tags(&cd));

    assert!(host.try_activate_ability(blink, None));
    assert!(!host.unit(hero).unwrap().has_any_tags(&cd));
    assert!(host.try_activate_ability(blink, None));
    assert!(host.unit(hero).unwrap().has_all_tags(&cd));
    assert!(host.is_on_cooldown(blink));
    assert!(!host.try_activate_ability(blink, None));

    let info = host.cooldown_info(blink);
    assert!(info.is_charge_cooldown);
    assert_eq!(info.current_charges, 0);
    assert_eq!(info.max_charges, 3);
    assert_eq!(info.charge_time_remaining, 5.0);

    host.tick(2.5);
    assert_eq!(host.cooldown_info(blink).charge_progress, 0.5);
    assert!(host.is_on_cooldown(blink));

    host.tick(2.5);
    let info = host.cooldown_info(blink);
    assert_eq!(info.current_charges, 1);
    assert_eq!(info.charge_time_remaining, 5.0);
    assert!(!info.is_on_cooldown);
    assert!(!host.unit(hero).unwrap().has_any_tags(&cd));

    assert!(host.try_activate_ability(blink, None));
    assert!(host.is_on_cooldown(blink));
}

#[test]
fn test_stack_overflow_routes_port() {
    init_logging();
    let (mut host, hero, dummy) = setup();

    let first = apply(&mut host, "shred", hero, dummy);
    assert!(matches!(first, ApplyOutcome::Applied(_)));
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 8.0);

    assert!(matches!(apply(&mut host, "shred", hero, dummy), ApplyOutcome::Stacked(_)));
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 6.0);
    let handle = first.handle().unwrap();
    assert_eq!(host.effect(handle).unwrap().stack_count(), 2);

    host.drain_events();
    assert!(matches!(apply(&mut host, "shred", hero, dummy), ApplyOutcome::Overflowed(_)));
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 6.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 85.0);
    assert!(host
        .drain_events()
        .contains(&GasEvent::EffectOverflowed { effect: handle, routed: true }));

    host.tick(4.0);
    assert!(host.effect(handle).map(|e| !e.is_running()).unwrap_or(true));
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 10.0);
}

#[test]
fn test_stack_expires_one_at_a_time() {
    let (mut host, hero, dummy) = setup();
    apply(&mut host, "erode", hero, dummy);
    apply(&mut host, "erode", hero, dummy);
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 6.0);

    host.tick(4.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 8.0);
    host.tick(4.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Defense), 10.0);
    assert!(host.unit(dummy).unwrap().effects().is_empty());
}

#[test]
fn test_periodic_damage_over_time() {
    init_logging();
    let (mut host, hero, dummy) = setup();
    let handle = apply(&mut host, "poison", hero, dummy).handle().unwrap();
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 100.0);

    host.tick(1.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 90.0);
    host.tick(1.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 80.0);
    host.tick(1.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 70.0);
    assert!(host.effect(handle).map(|e| !e.is_running()).unwrap_or(true));

    host.tick(1.0);
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 70.0);
}

#[test]
fn test_remove_effects_with_tags() {
    let (mut host, hero, dummy) = setup();
    apply(&mut host, "poison", hero, dummy);
    assert_eq!(host.unit(dummy).unwrap().effects().len(), 1);

    assert_eq!(apply(&mut host, "cleanse", hero, dummy), ApplyOutcome::Executed);
    assert!(host.unit(dummy).unwrap().effects().is_empty());

    apply(&mut host, "poison", hero, dummy);
    assert_eq!(
        host.remove_active_effects_with_tags(dummy, &tags(&["Buff.DeBuff.Poison"])),
        1
    );
}

#[test]
fn test_ongoing_required_tags() {
    let (mut host, hero, _) = setup();
    let blessed = tags(&["State.Blessed"]);
    host.add_loose_tags(hero, &blessed).unwrap();

    apply(&mut host, "blessing", hero, hero);
    assert_eq!(attribute(&host, hero, AttributeKind::Attack), 15.0);
    host.tick(0.5);
    assert_eq!(attribute(&host, hero, AttributeKind::Attack), 15.0);

    host.remove_loose_tags(hero, &blessed).unwrap();
    host.tick(0.5);
    assert_eq!(attribute(&host, hero, AttributeKind::Attack), 10.0);
    assert!(host.unit(hero).unwrap().effects().is_empty());
}

#[test]
fn test_immunity_rejects_application() {
    let (mut host, hero, dummy) = setup();
    host.add_loose_tags(dummy, &tags(&["State.Warded"])).unwrap();
    assert_eq!(apply(&mut host, "smite", hero, dummy), ApplyOutcome::Rejected);
    assert_eq!(attribute(&host, dummy, AttributeKind::Health), 100.0);

    assert!(matches!(
        host.apply_gameplay_effect(&SkillId::new("Library"), &NodeId::new("ability"), hero, dummy),
        Err(GasError::NotAnEffect(_))
    ));
    assert!(matches!(
        host.apply_gameplay_effect(&SkillId::new("Library"), &NodeId::new("nope"), hero, dummy),
        Err(GasError::UnknownNode { .. })
    ));
}
