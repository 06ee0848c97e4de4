//! Combat integration test
//!
//! Полный headless бой через ECS: HeadlessArbiter раздаёт ходы, контроллеры
//! тикают в FixedUpdate, windup/followthrough идут по `Time<Real>`.
//!
//! Проверяем:
//! - Бой доходит до развязки без зависаний
//! - Инварианты стамины и комбо на каждом тике
//! - Контратака перехватывает ход врага
//! - Roll во время windup перенацеливает удар

use bevy::prelude::*;
use sidescroll_combat::headless::{setup_duel, TurnOrder};
use sidescroll_combat::*;

/// Helper: App со всеми combat plugins и headless arbiter driver
fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins((SimulationPlugin::<HeadlessArbiter>::default(), HeadlessPlugin));
    app
}

/// Helper: игрок в 0, враг в 5, арена [-10, 10]
fn spawn_duel(app: &mut App, script: ActionCommandResult) -> (Entity, Entity) {
    let (player, enemies) = setup_duel(
        app,
        (0.0, PlayerCombatConfig::default()),
        vec![(5.0, EnemyCombatConfig::default())],
        Obstacles::arena(-10.0, 10.0),
    );
    app.world_mut()
        .resource_mut::<HeadlessArbiter>()
        .set_script(script);
    (player, enemies[0])
}

fn check_invariants(app: &mut App) {
    let world = app.world_mut();

    let mut enemies = world.query::<(&EnemyCombatController, &Stamina)>();
    for (enemy, stamina) in enemies.iter(world) {
        assert!(
            stamina.current >= 0.0 && stamina.current <= stamina.max,
            "Stamina вне диапазона: {:?}",
            stamina
        );
        if let Some(attack) = enemy.current_attack() {
            assert!(
                enemy.combo_index() < attack.combo_len(),
                "combo index {} вышел за комбо {}",
                enemy.combo_index(),
                attack.name
            );
        }
    }

    let mut movers = world.query::<&Mover>();
    for mover in movers.iter(world) {
        assert!(mover.position().is_finite());
        assert!(
            mover.position() > -10.0 && mover.position() < 10.0,
            "Mover вылетел за стены: {}",
            mover.position()
        );
    }
}

fn last_turn_end(app: &App) -> Option<(Entity, TurnEndReason)> {
    app.world()
        .resource::<HeadlessArbiter>()
        .ledger()
        .turn_ends
        .last()
        .copied()
}

#[test]
fn test_player_gets_the_first_turn() {
    let mut app = create_combat_app(42);
    let (player, enemy) = spawn_duel(&mut app, ActionCommandResult::landed(100.0));

    app.update();
    app.update();

    let world = app.world();
    let player_combat = world
        .get::<PlayerCombatController>(player)
        .expect("player spawned");
    assert!(player_combat.is_in_combat());
    assert!(player_combat.is_turn_active());

    let enemy_combat = world
        .get::<EnemyCombatController>(enemy)
        .expect("enemy spawned");
    assert!(enemy_combat.is_in_combat());
    assert!(!enemy_combat.is_turn_active());
    assert_eq!(enemy_combat.home_position(), Some(5.0));

    assert_eq!(
        world.resource::<HeadlessArbiter>().current_phase(),
        CombatPhase::PlayerTurn
    );
    assert_eq!(world.resource::<TurnOrder>().turns_started(), 1);
}

#[test]
fn test_duel_reaches_a_decision() {
    let mut app = create_combat_app(42);
    let (_player, enemy) = spawn_duel(&mut app, ActionCommandResult::blocked(70.0));

    let mut ticks = 0;
    while !app.world().resource::<TurnOrder>().is_finished() {
        app.update();
        check_invariants(&mut app);
        ticks += 1;
        assert!(ticks < 30_000, "Бой не закончился за {} тиков", ticks);
    }

    let (_, reason) = last_turn_end(&app).expect("turn ended");
    assert!(reason.ends_combat());

    let arbiter = app.world().resource::<HeadlessArbiter>();
    assert!(arbiter.turn_roster().len() >= 1);
    match reason {
        TurnEndReason::Victory => assert_eq!(arbiter.enemy_health(enemy), Some(0)),
        TurnEndReason::PlayerDefeated => assert_eq!(arbiter.player_health(), 0),
        other => panic!("unexpected combat end: {:?}", other),
    }

    // обе стороны успели походить
    let turn_ends = &arbiter.ledger().turn_ends;
    assert!(turn_ends.iter().any(|(actor, _)| *actor == enemy));
    assert!(!arbiter.ledger().commands.is_empty());
}

#[test]
fn test_counter_takes_over_enemy_turn() {
    let mut app = create_combat_app(7);
    let (player, enemy) = spawn_duel(&mut app, ActionCommandResult::landed(100.0));
    let mut arbiter = HeadlessArbiter::new(player, vec![enemy])
        .with_script(ActionCommandResult::landed(100.0))
        .with_enemy_health(enemy, 500);
    arbiter.arm_counter();
    app.world_mut().insert_resource(arbiter);

    let mut ticks = 0;
    while app.world().resource::<HeadlessArbiter>().ledger().turn_ends.len() < 3 {
        app.update();
        ticks += 1;
        assert!(ticks < 10_000, "Контратака не завершилась");
    }

    let arbiter = app.world().resource::<HeadlessArbiter>();
    let ledger = arbiter.ledger();
    assert_eq!(ledger.turn_ends[0], (player, TurnEndReason::ComboFinished));
    assert_eq!(ledger.turn_ends[1], (enemy, TurnEndReason::CounterActivated));
    assert_eq!(ledger.turn_ends[2], (player, TurnEndReason::ComboFinished));

    // 3 удара обычного комбо + 2 удара контратаки
    let dealt: Vec<i32> = ledger.health_changes.iter().map(|(_, d)| -d).collect();
    assert_eq!(dealt.len(), 5);
    assert!((29..=30).contains(&dealt[4]), "{:?}", dealt);
    assert!(!arbiter.counter_activated());
    assert_eq!(arbiter.counter_meter(), 0.0);
}

#[test]
fn test_roll_during_windup_reaims_strike() {
    let mut app = create_combat_app(42);
    // промах игрока сразу отдаёт ход врагу
    let (player, enemy) = spawn_duel(&mut app, ActionCommandResult::missed());

    let mut ticks = 0;
    loop {
        app.update();
        ticks += 1;
        assert!(ticks < 10_000, "Враг так и не замахнулся");
        let state = app
            .world()
            .get::<EnemyCombatController>(enemy)
            .map(|e| e.state());
        if state == Some(EnemyCombatState::AttackWindup) {
            break;
        }
    }

    let plan = *app
        .world()
        .get::<EnemyCombatController>(enemy)
        .and_then(|e| e.strike_plan())
        .expect("strike planned");
    let leftward = plan.leftward;
    app.world_mut().send_event(RollIntent {
        actor: player,
        leftward,
        success_rate: 100.0,
    });
    app.update();

    let world = app.world();
    let stop = world.get::<Mover>(player).expect("player mover").target();
    let caught = plan.contains(stop);
    let expected = if !caught {
        plan.far_bound()
    } else if leftward {
        stop + sidescroll_combat::ai::ROLL_CATCH_OFFSET
    } else {
        stop - sidescroll_combat::ai::ROLL_CATCH_OFFSET
    };
    let adjusted = world
        .get::<EnemyCombatController>(enemy)
        .and_then(|e| e.strike_plan())
        .expect("strike still pending");
    assert!((adjusted.end - expected).abs() < 1e-3);
    assert_eq!(adjusted.redirected, caught);
    assert!(world
        .resource::<HeadlessArbiter>()
        .ledger()
        .triggers
        .contains(&CombatTrigger::PlayerRolled));
}

#[test]
fn test_leave_combat_releases_everyone() {
    let mut app = create_combat_app(42);
    let (player, enemy) = spawn_duel(&mut app, ActionCommandResult::landed(100.0));
    for _ in 0..30 {
        app.update();
    }

    app.world_mut().send_event(LeaveCombat);
    app.update();

    let world = app.world();
    let player_combat = world.get::<PlayerCombatController>(player).expect("player");
    assert!(!player_combat.is_in_combat());
    assert!(!player_combat.is_turn_active());
    let enemy_combat = world.get::<EnemyCombatController>(enemy).expect("enemy");
    assert!(!enemy_combat.is_in_combat());
    assert!(!world.get::<Mover>(player).expect("mover").is_auto_facing_locked());
}

#[test]
fn test_animation_cues_are_emitted() {
    let mut app = create_combat_app(42);
    let (player, _enemy) = spawn_duel(&mut app, ActionCommandResult::landed(100.0));

    let mut seen = Vec::new();
    let mut cursor = app
        .world()
        .resource::<Events<AnimationCue>>()
        .get_cursor();
    for _ in 0..300 {
        app.update();
        let events = app.world().resource::<Events<AnimationCue>>();
        seen.extend(cursor.read(events).copied());
    }

    let player_cues: Vec<&str> = seen
        .iter()
        .filter(|cue| cue.actor == player)
        .map(|cue| cue.name)
        .collect();
    assert!(player_cues.contains(&"combat_idle"));
    assert!(player_cues.contains(&"windup"));
    assert!(player_cues.contains(&"attack"));
}
