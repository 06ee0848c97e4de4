//! Combat ECS systems.

mod intents;
mod presentation;
mod turns;

pub use intents::{
    apply_roll_catch, handle_counter_intents, handle_enter_combat, handle_leave_combat,
    handle_roll_intents, handle_start_turn,
};
pub use presentation::{run_timed_sequences, update_combat_presentation};
pub use turns::{enemy_turn_tick, player_turn_tick};
