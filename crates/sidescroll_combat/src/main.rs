//! Headless дуэль: игрок против одного врага, ходы раздаёт HeadlessArbiter.
//!
//! Игрок блокирует каждый удар на 70%, свои удары проводит с тем же рейтингом.

use sidescroll_combat::combat::AttackTable;
use sidescroll_combat::headless::{setup_duel, TurnOrder};
use sidescroll_combat::{
    create_headless_app, log_error, ActionCommandResult, CombatError, EnemyCombatConfig,
    HeadlessArbiter, HeadlessPlugin, Mover, Obstacles, PlayerCombatConfig, SimulationPlugin,
};

const ATTACK_TABLE: &str = r#"[
    {
        "name": "slash",
        "approach": { "style": "chase" },
        "combo": [
            { "range": 1.5, "windup": 0.4, "stamina_cost_percent": 15.0, "knockback": 0.5 },
            { "range": 1.8, "windup": 0.6, "stamina_cost_percent": 20.0, "knockback": 1.0, "speed_multiplier": 1.5 }
        ]
    },
    {
        "name": "lunge",
        "approach": { "style": "retreat", "distance_requirement": 2.0 },
        "combo": [
            { "range": 4.0, "windup": 0.8, "stamina_cost_percent": 30.0, "knockback": 1.5,
              "speed_multiplier": 3.0, "direction": "heavy", "statuses": ["bleed"] }
        ]
    }
]"#;

const DUEL_ENEMY: &str = r#"{ "move_speed": 4.0, "attacks": [["slash", 2], ["lunge", 1]] }"#;

fn load_enemy() -> Result<EnemyCombatConfig, CombatError> {
    let table = AttackTable::from_json(ATTACK_TABLE)?;
    EnemyCombatConfig::from_json_with_table(DUEL_ENEMY, &table)
}

fn main() {
    let seed = 42;
    println!("Starting sidescroll combat headless duel (seed: {})", seed);

    let enemy_config = match load_enemy() {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("❌ Enemy config rejected: {}", err));
            return;
        }
    };

    let mut app = create_headless_app(seed);
    app.add_plugins((SimulationPlugin::<HeadlessArbiter>::default(), HeadlessPlugin));

    let (player, enemies) = setup_duel(
        &mut app,
        (0.0, PlayerCombatConfig::default()),
        vec![(5.0, enemy_config)],
        Obstacles::arena(-10.0, 10.0),
    );
    app.world_mut()
        .resource_mut::<HeadlessArbiter>()
        .set_script(ActionCommandResult::blocked(70.0));

    // максимум ~100 секунд симуляции
    for tick in 0..6000 {
        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            let arbiter = world.resource::<HeadlessArbiter>();
            let player_x = world.get::<Mover>(player).map(|m| m.position());
            let enemy_x = world.get::<Mover>(enemies[0]).map(|m| m.position());
            println!(
                "Tick {}: player {:?} hp {} | enemy {:?} hp {:?} | turns {}",
                tick,
                player_x,
                arbiter.player_health(),
                enemy_x,
                arbiter.enemy_health(enemies[0]),
                world.resource::<TurnOrder>().turns_started(),
            );
        }

        if app.world().resource::<TurnOrder>().is_finished() {
            println!("Combat decided at tick {}", tick);
            break;
        }
    }

    let arbiter = app.world().resource::<HeadlessArbiter>();
    println!(
        "Simulation complete! {} turn ends, {} blocks, {} hits",
        arbiter.ledger().turn_ends.len(),
        arbiter
            .ledger()
            .triggers
            .iter()
            .filter(|t| **t == sidescroll_combat::CombatTrigger::AttackBlocked)
            .count(),
        arbiter.ledger().health_changes.len(),
    );
}
