//! Timed action commands: what an attacker asks the arbiter to prompt, and
//! what the defender's input resolved to.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::attack::AttackDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCommandKind {
    EnemyStandardAttack,
    EnemyHeavyAttack,
    PlayerPhysicalAttack,
}

/// Prompt parameters for one strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCommandSpec {
    pub issuer: Entity,
    pub kind: ActionCommandKind,
    /// Travel time of the strike after windup.
    pub move_time: f32,
    pub windup: f32,
    pub defender_on_left: bool,
    pub hidden_time: f32,
    pub direction: AttackDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefensiveResponse {
    #[default]
    None,
    Blocked,
    Evaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionCommandResult {
    pub success: bool,
    /// 0..=100
    pub success_rate: f32,
    pub response: DefensiveResponse,
    pub perfect: bool,
    pub evaded_leftward: bool,
}

impl ActionCommandResult {
    /// Failed input, the strike lands undefended.
    pub fn missed() -> Self {
        Self::default()
    }

    /// Successful attack input (player strikes).
    pub fn landed(success_rate: f32) -> Self {
        Self {
            success: true,
            success_rate: success_rate.clamp(0.0, 100.0),
            ..Self::default()
        }
    }

    pub fn blocked(success_rate: f32) -> Self {
        Self {
            response: DefensiveResponse::Blocked,
            ..Self::landed(success_rate)
        }
    }

    pub fn perfect_block() -> Self {
        Self {
            perfect: true,
            ..Self::blocked(100.0)
        }
    }

    pub fn evaded(leftward: bool, success_rate: f32) -> Self {
        Self {
            response: DefensiveResponse::Evaded,
            evaded_leftward: leftward,
            ..Self::landed(success_rate)
        }
    }

    pub fn is_block(&self) -> bool {
        self.success && self.response == DefensiveResponse::Blocked
    }

    pub fn is_evasion(&self) -> bool {
        self.success && self.response == DefensiveResponse::Evaded
    }
}

/// Where an evading combatant will stop, and which way it went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evasion {
    pub stop_position: f32,
    pub leftward: bool,
}
