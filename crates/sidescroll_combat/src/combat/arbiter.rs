//! Combat arbiter interface.
//!
//! Arbiter живёт снаружи ядра: порядок ходов, ввод action command, полоски
//! здоровья, счётчик контратаки. Контроллеры обращаются к нему только через
//! этот trait (тип подставляется как Bevy resource).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::action_command::{ActionCommandResult, ActionCommandSpec};
use super::attack::StatusType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombatPhase {
    #[default]
    Idle,
    PlayerTurn,
    EnemyTurn,
    TurnChange,
    Victory,
    Defeat,
    Escaped,
}

/// Why a controller handed its turn back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEndReason {
    StaminaExhausted,
    ComboFinished,
    AttackMissed,
    CounterActivated,
    PlayerDefeated,
    PlayerEscaped,
    Victory,
}

impl TurnEndReason {
    /// Combat is over after this turn end.
    pub fn ends_combat(self) -> bool {
        matches!(
            self,
            TurnEndReason::Victory | TurnEndReason::PlayerDefeated | TurnEndReason::PlayerEscaped
        )
    }
}

/// Notable moments reported to the arbiter (tutorial hooks, UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatTrigger {
    EnemyTurnEnded,
    PlayerCompletedFullCombo,
    PlayerMissedAttack,
    PlayerRolled,
    AttackBlocked,
    GuardBroken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenShake {
    Light,
    Medium,
    Heavy,
}

pub trait CombatArbiter: Send + Sync + 'static {
    /// Who `actor` is fighting right now.
    fn opponent_of(&self, actor: Entity) -> Option<Entity>;
    fn current_phase(&self) -> CombatPhase;

    /// Opens a timed prompt for the defender.
    fn request_action_command(&mut self, spec: ActionCommandSpec);
    fn clear_action_command(&mut self);
    /// Outcome of the latest prompt (a failure if none was opened).
    fn last_action_command(&self) -> ActionCommandResult;

    fn notify_turn_ended(&mut self, actor: Entity, reason: TurnEndReason);
    fn notify_combat_event(&mut self, trigger: CombatTrigger);

    fn change_health(&mut self, target: Entity, delta: i32);
    fn player_stamina(&self) -> f32;
    fn change_stamina(&mut self, delta: f32);

    fn report_screen_shake(&mut self, shake: ScreenShake);
    fn report_status_damage(&mut self, status: StatusType, amount: f32);

    fn combat_won(&self) -> bool;
    fn player_dead(&self) -> bool;
    fn player_out_of_bounds(&self) -> bool;
    fn counter_activated(&self) -> bool;

    /// Damage scale for the player's next turn (0..=1).
    fn range_effectiveness(&self) -> f32;
    /// Base counter meter gain for a successful block.
    fn block_counter_fill(&self) -> f32;
    fn counter_would_trigger(&self, fill: f32) -> bool;
    fn fill_counter_meter(&mut self, amount: f32);
}
