//! Enemy tuning.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::{AttackDefinition, AttackOption, AttackTable, ComboHit, StatusType};
use crate::error::CombatError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyCombatConfig {
    pub move_speed: f32,
    pub max_stamina: f32,
    /// Base health damage per hit.
    pub physical_damage: f32,
    /// Raw stamina damage dealt into a block.
    pub stamina_damage: f32,
    pub status_damage: f32,
    pub status_damage_through_block: f32,
    pub sprites_default_left: bool,
    pub attack_options: Vec<AttackOption>,
}

impl Default for EnemyCombatConfig {
    fn default() -> Self {
        let slash = AttackDefinition::chase(
            "slash",
            vec![
                ComboHit::new(1.5, 0.4).with_cost(15.0).with_knockback(0.5),
                ComboHit::new(1.8, 0.6)
                    .with_cost(20.0)
                    .with_knockback(1.0)
                    .with_speed(1.5),
            ],
        );
        let mut lunge = AttackDefinition::retreat(
            "lunge",
            2.0,
            vec![ComboHit::new(4.0, 0.8).with_cost(30.0).with_knockback(1.5).with_speed(3.0).heavy()],
        );
        lunge.combo[0].statuses.push(StatusType::Bleed);

        Self {
            move_speed: 4.0,
            max_stamina: 100.0,
            physical_damage: 10.0,
            stamina_damage: 5.0,
            status_damage: 2.0,
            status_damage_through_block: 1.0,
            sprites_default_left: false,
            attack_options: vec![
                AttackOption::new(Arc::new(slash), 2),
                AttackOption::new(Arc::new(lunge), 1),
            ],
        }
    }
}

impl EnemyCombatConfig {
    /// Single-attack config, handy for scripted fights.
    pub fn with_only_attack(mut self, attack: AttackDefinition) -> Self {
        self.attack_options = vec![AttackOption::new(Arc::new(attack), 1)];
        self
    }

    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Tuning from JSON with the attack pool named against a shared table:
    /// `{ "move_speed": 3.0, "attacks": [["slash", 2], ["lunge", 1]] }`.
    /// Without `attacks` the default pool stays.
    pub fn from_json_with_table(json: &str, table: &AttackTable) -> Result<Self, CombatError> {
        let TableBackedConfig {
            mut tuning,
            attacks,
        } = serde_json::from_str(json)?;

        if !attacks.is_empty() {
            let weights: Vec<(&str, u32)> = attacks
                .iter()
                .map(|(name, weight)| (name.as_str(), *weight))
                .collect();
            tuning.attack_options = table.options(&weights)?;
        }
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        if self.move_speed <= 0.0 {
            return Err(CombatError::Configuration(format!(
                "enemy move speed must be positive, got {}",
                self.move_speed
            )));
        }
        if self.max_stamina < 0.0 {
            return Err(CombatError::Configuration(
                "enemy max stamina is negative".to_string(),
            ));
        }
        if self.attack_options.iter().all(|option| option.weight == 0) {
            return Err(CombatError::Configuration(
                "enemy has no weighted attack options".to_string(),
            ));
        }
        for option in &self.attack_options {
            option.attack.validate()?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct TableBackedConfig {
    #[serde(flatten)]
    tuning: EnemyCombatConfig,
    #[serde(default)]
    attacks: Vec<(String, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EnemyCombatConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attack_options.len(), 2);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let json = r#"{
            "move_speed": 3.0,
            "attack_options": [
                {
                    "weight": 1,
                    "attack": {
                        "name": "bite",
                        "approach": { "style": "chase" },
                        "combo": [ { "range": 1.0, "windup": 0.3 } ]
                    }
                }
            ]
        }"#;
        let config = EnemyCombatConfig::from_json(json).unwrap();

        assert_eq!(config.move_speed, 3.0);
        assert_eq!(config.max_stamina, 100.0);
        assert_eq!(config.attack_options[0].attack.name, "bite");
    }

    const ATTACKS: &str = r#"[
        { "name": "jab", "approach": { "style": "chase" }, "combo": [ { "range": 1.0, "windup": 0.2 } ] },
        {
            "name": "hop_back",
            "approach": { "style": "retreat", "distance_requirement": 2.5 },
            "combo": [ { "range": 4.0, "windup": 0.8, "stamina_cost_percent": 25.0 } ]
        }
    ]"#;

    #[test]
    fn test_attack_pool_from_table() {
        let table = AttackTable::from_json(ATTACKS).unwrap();
        let json = r#"{ "max_stamina": 40.0, "attacks": [["hop_back", 1], ["jab", 3]] }"#;

        let config = EnemyCombatConfig::from_json_with_table(json, &table).unwrap();

        assert_eq!(config.max_stamina, 40.0);
        assert_eq!(config.move_speed, 4.0);
        let pool: Vec<(&str, u32)> = config
            .attack_options
            .iter()
            .map(|option| (option.attack.name.as_str(), option.weight))
            .collect();
        assert_eq!(pool, vec![("hop_back", 1), ("jab", 3)]);
    }

    #[test]
    fn test_table_config_keeps_default_pool_without_attacks() {
        let table = AttackTable::from_json(ATTACKS).unwrap();
        let config = EnemyCombatConfig::from_json_with_table(r#"{ "move_speed": 2.0 }"#, &table).unwrap();

        assert_eq!(config.attack_options.len(), 2);
        assert_eq!(config.attack_options[0].attack.name, "slash");
    }

    #[test]
    fn test_table_config_unknown_attack() {
        let table = AttackTable::from_json(ATTACKS).unwrap();
        let err = EnemyCombatConfig::from_json_with_table(r#"{ "attacks": [["bite", 1]] }"#, &table)
            .unwrap_err();
        assert!(matches!(err, CombatError::Configuration(_)));
    }

    #[test]
    fn test_rejects_empty_pool() {
        let mut config = EnemyCombatConfig::default();
        config.attack_options.clear();
        assert!(matches!(config.validate(), Err(CombatError::Configuration(_))));
    }
}
