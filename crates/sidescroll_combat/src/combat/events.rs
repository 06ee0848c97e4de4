//! Combat events: intents coming from the arbiter / input, and animation cues
//! going out to whoever renders.

use bevy::prelude::*;

/// All combatants enter combat (controllers validate and reset).
#[derive(Event, Debug, Clone, Copy)]
pub struct EnterCombat;

#[derive(Event, Debug, Clone, Copy)]
pub struct LeaveCombat;

#[derive(Event, Debug, Clone, Copy)]
pub struct StartTurn {
    pub actor: Entity,
}

/// Player evasive roll, resolved with the action command's success rate.
#[derive(Event, Debug, Clone, Copy)]
pub struct RollIntent {
    pub actor: Entity,
    pub leftward: bool,
    pub success_rate: f32,
}

/// Counter meter went off: player takes over with the counter combo.
#[derive(Event, Debug, Clone, Copy)]
pub struct CounterIntent {
    pub actor: Entity,
}

/// A roll was committed; turn-active attackers may re-aim at its stop point.
#[derive(Event, Debug, Clone, Copy)]
pub struct EvasionPerformed {
    pub evader: Entity,
    pub stop_position: f32,
    pub leftward: bool,
}

/// Outward animation request. `duration` 0 means a looping base animation.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AnimationCue {
    pub actor: Entity,
    pub name: &'static str,
    pub duration: f32,
}

impl AnimationCue {
    pub fn new(actor: Entity, name: &'static str, duration: f32) -> Self {
        Self {
            actor,
            name,
            duration,
        }
    }

    pub fn looping(actor: Entity, name: &'static str) -> Self {
        Self::new(actor, name, 0.0)
    }
}
