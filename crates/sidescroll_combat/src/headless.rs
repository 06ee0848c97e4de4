//! Headless combat arbiter.
//!
//! In-process stand-in for the real turn/UI layer: scripted action-command
//! outcomes, health and stamina bookkeeping, counter meter, and a ledger of
//! everything the combatants reported. `drive_headless_turns` alternates turns
//! (player, then each living enemy) until combat is decided.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::ai::{spawn_enemy, EnemyCombatConfig};
use crate::combat::{
    ActionCommandResult, ActionCommandSpec, CombatArbiter, CombatPhase, CombatSet, CombatTrigger,
    CounterIntent, EnterCombat, ScreenShake, StartTurn, StatusType, TurnEndReason,
};
use crate::logger;
use crate::movement::Obstacles;
use crate::player::{spawn_player, PlayerCombatConfig};

pub const DEFAULT_HEALTH: i32 = 100;
pub const DEFAULT_PLAYER_STAMINA: f32 = 10.0;
pub const DEFAULT_COUNTER_THRESHOLD: f32 = 10.0;
pub const DEFAULT_BLOCK_COUNTER_FILL: f32 = 2.0;

/// Everything combatants reported, in order.
#[derive(Debug, Clone, Default)]
pub struct CombatLedger {
    pub turn_ends: Vec<(Entity, TurnEndReason)>,
    pub triggers: Vec<CombatTrigger>,
    pub shakes: Vec<ScreenShake>,
    pub status_damage: Vec<(StatusType, f32)>,
    pub commands: Vec<ActionCommandSpec>,
    pub health_changes: Vec<(Entity, i32)>,
}

#[derive(Resource, Debug)]
pub struct HeadlessArbiter {
    player: Entity,
    enemies: Vec<Entity>,
    active_enemy: Option<Entity>,
    phase: CombatPhase,
    /// Outcome reported for every action command.
    script: ActionCommandResult,
    last_result: ActionCommandResult,
    player_health: i32,
    player_max_health: i32,
    player_stamina: f32,
    player_max_stamina: f32,
    enemy_health: HashMap<Entity, i32>,
    counter_meter: f32,
    counter_threshold: f32,
    block_counter_fill: f32,
    counter_armed: bool,
    out_of_bounds: bool,
    range_effectiveness: f32,
    ledger: CombatLedger,
}

impl HeadlessArbiter {
    pub fn new(player: Entity, enemies: Vec<Entity>) -> Self {
        let enemy_health = enemies.iter().map(|e| (*e, DEFAULT_HEALTH)).collect();
        Self {
            player,
            enemies,
            active_enemy: None,
            phase: CombatPhase::Idle,
            script: ActionCommandResult::missed(),
            last_result: ActionCommandResult::missed(),
            player_health: DEFAULT_HEALTH,
            player_max_health: DEFAULT_HEALTH,
            player_stamina: DEFAULT_PLAYER_STAMINA,
            player_max_stamina: DEFAULT_PLAYER_STAMINA,
            enemy_health,
            counter_meter: 0.0,
            counter_threshold: DEFAULT_COUNTER_THRESHOLD,
            block_counter_fill: DEFAULT_BLOCK_COUNTER_FILL,
            counter_armed: false,
            out_of_bounds: false,
            range_effectiveness: 1.0,
            ledger: CombatLedger::default(),
        }
    }

    pub fn with_script(mut self, script: ActionCommandResult) -> Self {
        self.script = script;
        self
    }

    pub fn with_player_stamina(mut self, stamina: f32) -> Self {
        self.player_max_stamina = stamina.max(0.0);
        self.player_stamina = self.player_max_stamina;
        self
    }

    pub fn with_enemy_health(mut self, enemy: Entity, health: i32) -> Self {
        self.enemy_health.insert(enemy, health);
        self
    }

    pub fn set_script(&mut self, script: ActionCommandResult) {
        self.script = script;
    }

    pub fn set_out_of_bounds(&mut self, out_of_bounds: bool) {
        self.out_of_bounds = out_of_bounds;
    }

    pub fn set_range_effectiveness(&mut self, value: f32) {
        self.range_effectiveness = value.clamp(0.0, 1.0);
    }

    pub fn arm_counter(&mut self) {
        self.counter_meter = self.counter_threshold;
        self.counter_armed = true;
    }

    /// Counter handed to the player: meter empties.
    pub fn consume_counter(&mut self) {
        self.counter_meter = 0.0;
        self.counter_armed = false;
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn ledger(&self) -> &CombatLedger {
        &self.ledger
    }

    pub fn player_health(&self) -> i32 {
        self.player_health
    }

    pub fn enemy_health(&self, enemy: Entity) -> Option<i32> {
        self.enemy_health.get(&enemy).copied()
    }

    pub fn counter_meter(&self) -> f32 {
        self.counter_meter
    }

    pub fn player_stamina_max(&self) -> f32 {
        self.player_max_stamina
    }

    pub fn is_alive(&self, enemy: Entity) -> bool {
        self.enemy_health.get(&enemy).is_some_and(|hp| *hp > 0)
    }

    /// Player first, then living enemies.
    pub fn turn_roster(&self) -> Vec<Entity> {
        std::iter::once(self.player)
            .chain(self.enemies.iter().copied().filter(|e| self.is_alive(*e)))
            .collect()
    }

    /// Marks whose turn it is (and refills player stamina on the player's turn).
    pub fn begin_turn(&mut self, actor: Entity) {
        if actor == self.player {
            self.phase = CombatPhase::PlayerTurn;
            self.active_enemy = None;
            self.player_stamina = self.player_max_stamina;
        } else {
            self.phase = CombatPhase::EnemyTurn;
            self.active_enemy = Some(actor);
        }
    }
}

impl CombatArbiter for HeadlessArbiter {
    fn opponent_of(&self, actor: Entity) -> Option<Entity> {
        if actor == self.player {
            return self
                .active_enemy
                .or_else(|| self.enemies.iter().copied().find(|e| self.is_alive(*e)))
                .or_else(|| self.enemies.first().copied());
        }
        self.enemies.contains(&actor).then_some(self.player)
    }

    fn current_phase(&self) -> CombatPhase {
        self.phase
    }

    fn request_action_command(&mut self, spec: ActionCommandSpec) {
        self.ledger.commands.push(spec);
        self.last_result = self.script;
    }

    fn clear_action_command(&mut self) {
        self.last_result = ActionCommandResult::missed();
    }

    fn last_action_command(&self) -> ActionCommandResult {
        self.last_result
    }

    fn notify_turn_ended(&mut self, actor: Entity, reason: TurnEndReason) {
        self.ledger.turn_ends.push((actor, reason));
        self.phase = match reason {
            TurnEndReason::Victory => CombatPhase::Victory,
            TurnEndReason::PlayerDefeated => CombatPhase::Defeat,
            TurnEndReason::PlayerEscaped => CombatPhase::Escaped,
            _ => CombatPhase::TurnChange,
        };
    }

    fn notify_combat_event(&mut self, trigger: CombatTrigger) {
        self.ledger.triggers.push(trigger);
    }

    fn change_health(&mut self, target: Entity, delta: i32) {
        self.ledger.health_changes.push((target, delta));
        if target == self.player {
            self.player_health = (self.player_health + delta).clamp(0, self.player_max_health);
        } else if let Some(health) = self.enemy_health.get_mut(&target) {
            *health = (*health + delta).max(0);
        } else {
            logger::log_warning(&format!("⚠️ Health change for unknown {:?}", target));
        }
    }

    fn player_stamina(&self) -> f32 {
        self.player_stamina
    }

    fn change_stamina(&mut self, delta: f32) {
        self.player_stamina = (self.player_stamina + delta).clamp(0.0, self.player_max_stamina);
    }

    fn report_screen_shake(&mut self, shake: ScreenShake) {
        self.ledger.shakes.push(shake);
    }

    fn report_status_damage(&mut self, status: StatusType, amount: f32) {
        self.ledger.status_damage.push((status, amount));
    }

    fn combat_won(&self) -> bool {
        !self.enemies.is_empty() && self.enemies.iter().all(|e| !self.is_alive(*e))
    }

    fn player_dead(&self) -> bool {
        self.player_health <= 0
    }

    fn player_out_of_bounds(&self) -> bool {
        self.out_of_bounds
    }

    fn counter_activated(&self) -> bool {
        self.counter_armed
    }

    fn range_effectiveness(&self) -> f32 {
        self.range_effectiveness
    }

    fn block_counter_fill(&self) -> f32 {
        self.block_counter_fill
    }

    fn counter_would_trigger(&self, fill: f32) -> bool {
        self.counter_meter + fill >= self.counter_threshold
    }

    fn fill_counter_meter(&mut self, amount: f32) {
        self.counter_meter = (self.counter_meter + amount).min(self.counter_threshold);
        if self.counter_meter >= self.counter_threshold {
            self.counter_armed = true;
        }
    }
}

/// Turn rotation state for `drive_headless_turns`.
#[derive(Resource, Debug, Default)]
pub struct TurnOrder {
    next: usize,
    awaiting: bool,
    handled_turn_ends: usize,
    finished: bool,
    turns_started: usize,
}

impl TurnOrder {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn turns_started(&self) -> usize {
        self.turns_started
    }
}

/// System: start the next turn once the previous actor handed it back.
pub fn drive_headless_turns(
    mut arbiter: ResMut<HeadlessArbiter>,
    mut order: ResMut<TurnOrder>,
    mut starts: EventWriter<StartTurn>,
    mut counters: EventWriter<CounterIntent>,
) {
    if order.finished {
        return;
    }

    let ends = arbiter.ledger().turn_ends.len();
    if order.awaiting && ends == order.handled_turn_ends {
        return;
    }
    let last = arbiter.ledger().turn_ends.last().map(|(_, reason)| *reason);
    order.handled_turn_ends = ends;

    match last {
        Some(reason) if reason.ends_combat() => {
            order.finished = true;
            logger::log_info(&format!("🏆 Combat decided: {:?}", reason));
            return;
        }
        Some(TurnEndReason::CounterActivated) => {
            let player = arbiter.player();
            arbiter.consume_counter();
            arbiter.begin_turn(player);
            counters.write(CounterIntent { actor: player });
            order.awaiting = true;
            order.turns_started += 1;
            return;
        }
        _ => {}
    }

    let roster = arbiter.turn_roster();
    let actor = roster[order.next % roster.len()];
    order.next += 1;

    arbiter.begin_turn(actor);
    starts.write(StartTurn { actor });
    order.awaiting = true;
    order.turns_started += 1;
    logger::log(&format!("🔁 Turn {} → {:?}", order.turns_started, actor));
}

/// Spawns the combatants, installs the arena and a fresh `HeadlessArbiter`,
/// and queues `EnterCombat`. Combat plugins must already be added.
pub fn setup_duel(
    app: &mut App,
    player: (f32, PlayerCombatConfig),
    enemies: Vec<(f32, EnemyCombatConfig)>,
    arena: Obstacles,
) -> (Entity, Vec<Entity>) {
    let world = app.world_mut();
    let (player_x, player_config) = player;
    let player_entity = spawn_player(world, player_x, player_config);
    let enemy_entities: Vec<Entity> = enemies
        .into_iter()
        .map(|(x, config)| spawn_enemy(world, x, config))
        .collect();

    world.insert_resource(arena);
    world.insert_resource(HeadlessArbiter::new(player_entity, enemy_entities.clone()));
    world.send_event(EnterCombat);

    (player_entity, enemy_entities)
}

/// Headless arbiter + turn driver.
pub struct HeadlessPlugin;

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TurnOrder>().add_systems(
            Update,
            drive_headless_turns
                .after(CombatSet::Presentation)
                .run_if(resource_exists::<HeadlessArbiter>),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> (HeadlessArbiter, Entity, Entity) {
        let player = Entity::from_raw(1);
        let enemy = Entity::from_raw(2);
        (HeadlessArbiter::new(player, vec![enemy]), player, enemy)
    }

    #[test]
    fn test_opponents() {
        let (arbiter, player, enemy) = arbiter();
        assert_eq!(arbiter.opponent_of(player), Some(enemy));
        assert_eq!(arbiter.opponent_of(enemy), Some(player));
        assert_eq!(arbiter.opponent_of(Entity::from_raw(9)), None);
    }

    #[test]
    fn test_health_and_victory() {
        let (mut arbiter, player, enemy) = arbiter();
        arbiter.change_health(enemy, -60);
        assert!(!arbiter.combat_won());
        arbiter.change_health(enemy, -60);
        assert_eq!(arbiter.enemy_health(enemy), Some(0));
        assert!(arbiter.combat_won());

        arbiter.change_health(player, -150);
        assert!(arbiter.player_dead());
        assert_eq!(arbiter.player_health(), 0);
    }

    #[test]
    fn test_counter_meter_arms_at_threshold() {
        let (mut arbiter, _, _) = arbiter();
        assert!(!arbiter.counter_would_trigger(2.0));
        arbiter.fill_counter_meter(9.0);
        assert!(arbiter.counter_would_trigger(1.0));
        assert!(!arbiter.counter_activated());
        arbiter.fill_counter_meter(2.0);
        assert!(arbiter.counter_activated());
        assert_eq!(arbiter.counter_meter(), DEFAULT_COUNTER_THRESHOLD);

        arbiter.consume_counter();
        assert!(!arbiter.counter_activated());
    }

    #[test]
    fn test_action_command_script() {
        let (mut arbiter, player, _) = arbiter();
        arbiter.set_script(ActionCommandResult::blocked(80.0));
        assert!(!arbiter.last_action_command().success);

        arbiter.request_action_command(ActionCommandSpec {
            issuer: player,
            kind: crate::combat::ActionCommandKind::PlayerPhysicalAttack,
            move_time: 0.2,
            windup: 0.3,
            defender_on_left: false,
            hidden_time: 0.0,
            direction: Default::default(),
        });
        assert!(arbiter.last_action_command().is_block());

        arbiter.clear_action_command();
        assert!(!arbiter.last_action_command().success);
    }
}
