//! End-to-end tests of the decision pipeline over the sandbox battlefield

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use skirmish_core::{
    Agent, Battlefield, BehaviorKind, Contribution, Criterion, CriterionKind, CriterionRegistry,
    EngineConfig, EvalContext, Evaluation, FactionId, Hex, RoleData, RuleError, Scenario, Skill,
    SkillId, SkillTag, SkillType, Suppression, TileScore, Unit, UnitId, World,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn soldier(id: u32, faction: u8, tile: Hex) -> Unit {
    Unit {
        id: UnitId(id),
        name: format!("soldier-{id}"),
        faction: FactionId(faction),
        role: "line".to_string(),
        tile,
        hitpoints: 10.0,
        max_hitpoints: 10.0,
        action_points: 2,
        max_action_points: 2,
        has_acted: false,
        turn_done: false,
        suppression: Suppression::None,
        stunned: false,
        threat: 0.0,
        movement: 4,
        sight: 10,
        skills: Vec::new(),
    }
}

fn carbine(range: u8) -> Skill {
    Skill {
        id: SkillId(1),
        skill_type: SkillType::new("carbine"),
        tags: vec![SkillTag::Damage],
        min_range: 1,
        max_range: range,
        ap_cost: 1,
        accuracy: 0.7,
        accuracy_falloff: 0.05,
        always_hits: false,
        damage: 3.0,
        suppression: 0.0,
        area_radius: 0,
    }
}

fn field(units: Vec<Unit>, role: RoleData) -> Battlefield {
    let mut roles = BTreeMap::new();
    roles.insert("line".to_string(), role);
    Battlefield::from_scenario(Scenario {
        name: "pipeline".to_string(),
        radius: 8,
        roles,
        units,
        cover: Vec::new(),
        concealed: Vec::new(),
        busy: Vec::new(),
        mission_resolving: false,
    })
    .unwrap()
}

fn config() -> EngineConfig {
    EngineConfig::default().with_readiness(Duration::from_millis(1), Duration::from_millis(50))
}

/// Criterion writing preset scores onto chosen tiles
struct Preset {
    tiles: Vec<(Hex, Contribution)>,
}

impl Criterion for Preset {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Custom("preset")
    }

    fn is_valid(&self, _unit: &Unit, _role: &RoleData) -> bool {
        true
    }

    fn evaluate(&self, _ctx: &EvalContext<'_>, tile: &TileScore) -> Result<Contribution, RuleError> {
        Ok(self
            .tiles
            .iter()
            .find(|(t, _)| *t == tile.tile)
            .map(|(_, c)| *c)
            .unwrap_or_default())
    }
}

fn preset_registry() -> Arc<CriterionRegistry> {
    let a = Contribution { utility: 10.0, safety: 2.0, distance: 1.0, ..Default::default() };
    let b = Contribution { utility: 4.0, safety: 8.0, distance: 0.0, ..Default::default() };
    Arc::new(CriterionRegistry::empty().register(Preset {
        tiles: vec![(Hex::new(0, 1), b), (Hex::new(1, 0), a)],
    }))
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_weighted_aggregation_picks_utility_tile() {
    let role = RoleData::default().with_scales(30.0, 10.0, 5.0);
    let world = field(vec![soldier(1, 0, Hex::new(0, 0))], role);
    let me = world.unit(UnitId(1)).unwrap();
    let mut agent = Agent::new(me, preset_registry(), Arc::new(config().with_power(1.0)));

    assert!(matches!(agent.evaluate(&world), Evaluation::Ready { .. }));
    assert_eq!(agent.tiles().get(Hex::new(1, 0)).unwrap().final_score, 315.0);
    assert_eq!(agent.tiles().get(Hex::new(0, 1)).unwrap().final_score, 200.0);

    let action = agent.execute().unwrap();
    assert_eq!(action.kind, BehaviorKind::Move);
    assert_eq!(action.tile, Hex::new(1, 0));
}

#[test]
fn test_power_exponent_keeps_choice() {
    let role = RoleData::default().with_scales(30.0, 10.0, 5.0);
    let world = field(vec![soldier(1, 0, Hex::new(0, 0))], role);
    let me = world.unit(UnitId(1)).unwrap();

    for power in [0.5f32, 1.0, 1.2, 2.0, 3.0] {
        let mut agent = Agent::new(me, preset_registry(), Arc::new(config().with_power(power)));
        agent.evaluate(&world);
        assert_eq!(agent.selected_action().unwrap().tile, Hex::new(1, 0), "power {power}");
    }
}

#[test]
fn test_unarmed_unit_steps_out_of_range() {
    let me = soldier(1, 0, Hex::new(0, 0));
    let mut foe = soldier(2, 1, Hex::new(0, -4));
    foe.threat = 0.5;
    foe.skills.push(carbine(4));
    let world = field(vec![me, foe], RoleData::default());

    let me = world.unit(UnitId(1)).unwrap();
    let mut agent = Agent::new(me, Arc::new(CriterionRegistry::with_builtins()), Arc::new(config()));
    assert!(matches!(agent.evaluate(&world), Evaluation::Ready { .. }));

    let action = agent.execute().unwrap();
    assert_eq!(action.kind, BehaviorKind::Move);
    assert_eq!(action.tile.distance_to(Hex::new(0, 0)), 1);
    assert!(action.tile.distance_to(Hex::new(0, -4)) > 4);
}

#[test]
fn test_armed_unit_shoots_exposed_target() {
    let mut me = soldier(1, 0, Hex::new(0, 0));
    me.skills.push(carbine(5));
    let mut foe = soldier(2, 1, Hex::new(0, -2));
    foe.threat = 0.9;
    foe.hitpoints = 2.0;
    let world = field(vec![me, foe], RoleData::default().with_scales(0.0, 0.0, 1.0));

    let me = world.unit(UnitId(1)).unwrap();
    let mut agent = Agent::new(me, Arc::new(CriterionRegistry::with_builtins()), Arc::new(config()));
    assert!(matches!(agent.evaluate(&world), Evaluation::Ready { .. }));

    let action = agent.execute().unwrap();
    assert_eq!(action.kind, BehaviorKind::InflictDamage);
    assert_eq!(action.target, Some(UnitId(2)));
    assert_eq!(action.skill, Some(SkillId(1)));
}

#[test]
fn test_agents_share_registry_across_threads() {
    let mut units = Vec::new();
    for i in 0..4u32 {
        let mut u = soldier(i + 1, 0, Hex::new(i as i8 * 2 - 3, 2));
        u.skills.push(carbine(5));
        units.push(u);
    }
    let mut foe = soldier(10, 1, Hex::new(0, -4));
    foe.threat = 0.6;
    foe.skills.push(carbine(4));
    units.push(foe);
    let world = field(units, RoleData::default());

    let registry = Arc::new(CriterionRegistry::with_builtins());
    let engine = Arc::new(config());
    let expected: Vec<_> = (1..=4)
        .map(|id| {
            let mut agent = Agent::new(world.unit(UnitId(id)).unwrap(), registry.clone(), engine.clone());
            agent.evaluate(&world);
            agent.selected_action()
        })
        .collect();

    let concurrent: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|id| {
                let registry = registry.clone();
                let engine = engine.clone();
                let world = &world;
                s.spawn(move || {
                    let mut agent = Agent::new(world.unit(UnitId(id)).unwrap(), registry, engine);
                    agent.evaluate(world);
                    agent.selected_action()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(expected, concurrent);
}
