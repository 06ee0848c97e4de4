//! Player tuning and weapon data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::{AttackDefinition, ComboHit};
use crate::error::CombatError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub base_damage: f32,
    /// Distance at which the player stops walking and winds up.
    pub startup_range: f32,
    pub attack: Arc<AttackDefinition>,
    pub counter_combo: Arc<AttackDefinition>,
}

impl Weapon {
    pub fn training_sword() -> Self {
        let attack = AttackDefinition::chase(
            "sword_combo",
            vec![
                ComboHit::new(1.5, 0.35).with_speed(1.5),
                ComboHit::new(1.5, 0.35).with_speed(1.5),
                ComboHit::new(1.5, 0.5).with_speed(2.0),
            ],
        );
        let mut counter = AttackDefinition::chase(
            "sword_counter",
            vec![
                ComboHit::new(1.5, 0.2).with_speed(2.0),
                ComboHit::new(1.5, 0.2).with_speed(2.0),
            ],
        );
        counter.combo[1].damage_multiplier = 1.5;

        Self {
            name: "training sword".to_string(),
            base_damage: 20.0,
            startup_range: 1.5,
            attack: Arc::new(attack),
            counter_combo: Arc::new(counter),
        }
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        if self.startup_range < 0.0 || self.base_damage < 0.0 {
            return Err(CombatError::Configuration(format!(
                "weapon `{}` has negative range or damage",
                self.name
            )));
        }
        self.attack.validate()?;
        self.counter_combo.validate()
    }
}

impl Default for Weapon {
    fn default() -> Self {
        Self::training_sword()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerCombatConfig {
    pub move_speed: f32,
    pub roll_speed: f32,
    /// Roll length at a 100% action command.
    pub base_roll_distance: f32,
    /// Knockback dealt to the enemy per landed hit.
    pub enemy_knockback: f32,
    pub hard_knockdown_min: f32,
    /// Extra lock after the knockdown animation.
    pub hard_knockdown_tail: f32,
    pub block_cue_duration: f32,
    pub followthrough_settle: f32,
    pub sprites_default_left: bool,
    pub weapon: Weapon,
}

impl Default for PlayerCombatConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            roll_speed: 10.0,
            base_roll_distance: 4.2,
            enemy_knockback: 0.5,
            hard_knockdown_min: 0.7,
            hard_knockdown_tail: 0.5,
            block_cue_duration: 0.3,
            followthrough_settle: 0.1,
            sprites_default_left: false,
            weapon: Weapon::default(),
        }
    }
}

impl PlayerCombatConfig {
    pub fn validate(&self) -> Result<(), CombatError> {
        if self.move_speed <= 0.0 || self.roll_speed <= 0.0 {
            return Err(CombatError::Configuration(
                "player speeds must be positive".to_string(),
            ));
        }
        self.weapon.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_player_config() {
        let config = PlayerCombatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.roll_speed, 10.0);
        assert_eq!(config.weapon.attack.combo_len(), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlayerCombatConfig = serde_json::from_str(r#"{ "move_speed": 5.0 }"#).unwrap();
        assert_eq!(config.move_speed, 5.0);
        assert_eq!(config.base_roll_distance, 4.2);
        assert_eq!(config.weapon.name, "training sword");
    }
}
