//! Combat domain: attack data, damage rules, arbiter interface, ECS wiring.
//!
//! Архитектура:
//! - Turn ticks (FixedUpdate, после интеграции движения): enemy → player
//! - Intents (Update): enter/leave combat, start turn, roll, counter
//! - Timed sequences (Update, `Time<Real>`): windup, followthrough, roll, knockdown
//! - Presentation (Update): facing + base loop cues

use std::marker::PhantomData;

use bevy::prelude::*;

pub mod action_command;
pub mod arbiter;
pub mod attack;
pub mod context;
pub mod damage;
pub mod events;
pub mod sequence;
pub mod stamina;
pub mod systems;

pub use action_command::{
    ActionCommandKind, ActionCommandResult, ActionCommandSpec, DefensiveResponse, Evasion,
};
pub use arbiter::{CombatArbiter, CombatPhase, CombatTrigger, ScreenShake, TurnEndReason};
pub use attack::{
    pick_weighted, ApproachStyle, AttackDefinition, AttackDirection, AttackOption, AttackTable,
    ComboHit, StatusType,
};
pub use context::{CombatActor, CombatContext};
pub use events::{
    AnimationCue, CounterIntent, EnterCombat, EvasionPerformed, LeaveCombat, RollIntent,
    StartTurn,
};
pub use stamina::{Stamina, EXHAUSTION_EPSILON, STAMINA_SCALE};

use crate::movement::{Obstacles, SimulationSet};
use crate::DeterministicRng;

/// Ordering labels for the Update half of combat.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSet {
    Intents,
    Sequences,
    Presentation,
}

/// Combat plugin for arbiter type `A`.
pub struct CombatPlugin<A> {
    _arbiter: PhantomData<fn() -> A>,
}

impl<A> Default for CombatPlugin<A> {
    fn default() -> Self {
        Self {
            _arbiter: PhantomData,
        }
    }
}

impl<A: CombatArbiter + Resource> Plugin for CombatPlugin<A> {
    fn build(&self, app: &mut App) {
        app.add_event::<EnterCombat>()
            .add_event::<LeaveCombat>()
            .add_event::<StartTurn>()
            .add_event::<RollIntent>()
            .add_event::<CounterIntent>()
            .add_event::<EvasionPerformed>()
            .add_event::<AnimationCue>()
            .register_type::<Stamina>()
            .init_resource::<Obstacles>()
            .configure_sets(
                Update,
                (
                    CombatSet::Intents,
                    CombatSet::Sequences,
                    CombatSet::Presentation,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::enemy_turn_tick::<A>,
                    systems::player_turn_tick::<A>,
                )
                    .chain()
                    .in_set(SimulationSet::Turns),
            )
            .add_systems(
                Update,
                (
                    systems::handle_enter_combat::<A>,
                    systems::handle_leave_combat,
                    systems::handle_start_turn::<A>,
                    systems::handle_roll_intents::<A>,
                    systems::apply_roll_catch,
                    systems::handle_counter_intents,
                )
                    .chain()
                    .in_set(CombatSet::Intents),
            )
            .add_systems(
                Update,
                systems::run_timed_sequences.in_set(CombatSet::Sequences),
            )
            .add_systems(
                Update,
                systems::update_combat_presentation::<A>.in_set(CombatSet::Presentation),
            );

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}
