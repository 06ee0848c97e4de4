//! Attack data: combos, approach styles, weighted attack pools.
//!
//! Definitions are immutable and shared through `Arc`; controllers only keep a
//! combo index into them.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CombatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackDirection {
    #[default]
    Standard,
    /// Double knockback, heavy shake, knocks the player down
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusType {
    Bleed,
    Poison,
    Burn,
    Frost,
    Shock,
}

/// How the attacker gets into position before a combo step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ApproachStyle {
    /// Walk up until the opponent is within the step's range.
    Chase,
    /// Back off at least `distance_requirement` before striking. Distance
    /// builds up across turns until the attack is picked again.
    Retreat { distance_requirement: f32 },
}

fn one() -> f32 {
    1.0
}

/// One step of a combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboHit {
    pub range: f32,
    pub windup: f32,
    #[serde(default = "one")]
    pub speed_multiplier: f32,
    #[serde(default)]
    pub direction: AttackDirection,
    /// Percent of max stamina paid at launch.
    #[serde(default)]
    pub stamina_cost_percent: f32,
    #[serde(default = "one")]
    pub damage_multiplier: f32,
    #[serde(default = "one")]
    pub block_damage_multiplier: f32,
    #[serde(default)]
    pub knockback: f32,
    /// Time the strike stays hidden from the defender's prompt.
    #[serde(default)]
    pub hidden_time: f32,
    #[serde(default)]
    pub statuses: Vec<StatusType>,
    #[serde(default)]
    pub through_block_statuses: Vec<StatusType>,
}

impl ComboHit {
    pub fn new(range: f32, windup: f32) -> Self {
        Self {
            range,
            windup,
            speed_multiplier: 1.0,
            direction: AttackDirection::Standard,
            stamina_cost_percent: 0.0,
            damage_multiplier: 1.0,
            block_damage_multiplier: 1.0,
            knockback: 0.0,
            hidden_time: 0.0,
            statuses: Vec::new(),
            through_block_statuses: Vec::new(),
        }
    }

    pub fn with_cost(mut self, stamina_cost_percent: f32) -> Self {
        self.stamina_cost_percent = stamina_cost_percent;
        self
    }

    pub fn with_knockback(mut self, knockback: f32) -> Self {
        self.knockback = knockback;
        self
    }

    pub fn with_speed(mut self, speed_multiplier: f32) -> Self {
        self.speed_multiplier = speed_multiplier;
        self
    }

    pub fn heavy(mut self) -> Self {
        self.direction = AttackDirection::Heavy;
        self
    }

    pub fn is_heavy(&self) -> bool {
        self.direction == AttackDirection::Heavy
    }

    fn validate(&self, attack: &str, index: usize) -> Result<(), CombatError> {
        let numbers = [
            self.range,
            self.windup,
            self.speed_multiplier,
            self.stamina_cost_percent,
            self.damage_multiplier,
            self.block_damage_multiplier,
            self.knockback,
            self.hidden_time,
        ];
        if numbers.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(CombatError::Configuration(format!(
                "attack `{}` hit {} has a negative or non-finite parameter",
                attack, index
            )));
        }
        if self.speed_multiplier <= 0.0 {
            return Err(CombatError::Configuration(format!(
                "attack `{}` hit {} has zero strike speed",
                attack, index
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    pub name: String,
    pub approach: ApproachStyle,
    pub combo: Vec<ComboHit>,
}

impl AttackDefinition {
    pub fn chase(name: impl Into<String>, combo: Vec<ComboHit>) -> Self {
        Self {
            name: name.into(),
            approach: ApproachStyle::Chase,
            combo,
        }
    }

    pub fn retreat(name: impl Into<String>, distance_requirement: f32, combo: Vec<ComboHit>) -> Self {
        Self {
            name: name.into(),
            approach: ApproachStyle::Retreat {
                distance_requirement,
            },
            combo,
        }
    }

    pub fn combo_len(&self) -> usize {
        self.combo.len()
    }

    pub fn hit(&self, index: usize) -> Result<&ComboHit, CombatError> {
        self.combo.get(index).ok_or_else(|| CombatError::ComboOutOfRange {
            attack: self.name.clone(),
            index,
            len: self.combo.len(),
        })
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        if self.combo.is_empty() {
            return Err(CombatError::Configuration(format!(
                "attack `{}` has an empty combo",
                self.name
            )));
        }
        if let ApproachStyle::Retreat {
            distance_requirement,
        } = self.approach
        {
            if !distance_requirement.is_finite() || distance_requirement < 0.0 {
                return Err(CombatError::Configuration(format!(
                    "attack `{}` has an invalid retreat distance",
                    self.name
                )));
            }
        }
        for (index, hit) in self.combo.iter().enumerate() {
            hit.validate(&self.name, index)?;
        }
        Ok(())
    }
}

/// Attack with its selection weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackOption {
    pub attack: Arc<AttackDefinition>,
    pub weight: u32,
}

impl AttackOption {
    pub fn new(attack: Arc<AttackDefinition>, weight: u32) -> Self {
        Self { attack, weight }
    }
}

/// Weighted draw: each option occupies `weight` slots of a uniform pool.
pub fn pick_weighted<R: Rng + ?Sized>(
    options: &[AttackOption],
    rng: &mut R,
) -> Result<Arc<AttackDefinition>, CombatError> {
    let pool: Vec<usize> = options
        .iter()
        .enumerate()
        .flat_map(|(index, option)| std::iter::repeat(index).take(option.weight as usize))
        .collect();

    if pool.is_empty() {
        return Err(CombatError::Configuration(
            "no attack option has a positive weight".to_string(),
        ));
    }

    let drawn = pool[rng.gen_range(0..pool.len())];
    Ok(options[drawn].attack.clone())
}

/// Named attacks loaded from data.
#[derive(Debug, Clone, Default)]
pub struct AttackTable {
    attacks: HashMap<String, Arc<AttackDefinition>>,
}

impl AttackTable {
    /// Parses a JSON array of attack definitions and validates each one.
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        let definitions: Vec<AttackDefinition> = serde_json::from_str(json)?;
        let mut attacks = HashMap::new();

        for definition in definitions {
            definition.validate()?;
            if attacks.contains_key(&definition.name) {
                return Err(CombatError::Configuration(format!(
                    "duplicate attack `{}`",
                    definition.name
                )));
            }
            attacks.insert(definition.name.clone(), Arc::new(definition));
        }

        Ok(Self { attacks })
    }

    pub fn get(&self, name: &str) -> Option<Arc<AttackDefinition>> {
        self.attacks.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }

    /// Builds a weighted pool from `(name, weight)` pairs.
    pub fn options(&self, weights: &[(&str, u32)]) -> Result<Vec<AttackOption>, CombatError> {
        weights
            .iter()
            .map(|(name, weight)| {
                self.get(name)
                    .map(|attack| AttackOption::new(attack, *weight))
                    .ok_or_else(|| CombatError::Configuration(format!("unknown attack `{}`", name)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TABLE: &str = r#"[
        {
            "name": "lunge",
            "approach": { "style": "chase" },
            "combo": [
                { "range": 2.0, "windup": 0.4, "stamina_cost_percent": 15.0, "knockback": 1.0 },
                { "range": 2.5, "windup": 0.6, "direction": "heavy", "statuses": ["bleed"] }
            ]
        },
        {
            "name": "hop_back",
            "approach": { "style": "retreat", "distance_requirement": 2.0 },
            "combo": [ { "range": 4.0, "windup": 0.8, "speed_multiplier": 2.5 } ]
        }
    ]"#;

    #[test]
    fn test_attack_table_from_json() {
        let table = AttackTable::from_json(TABLE).unwrap();
        assert_eq!(table.len(), 2);

        let lunge = table.get("lunge").unwrap();
        assert_eq!(lunge.approach, ApproachStyle::Chase);
        assert_eq!(lunge.combo_len(), 2);
        assert!(lunge.hit(1).unwrap().is_heavy());
        assert_eq!(lunge.hit(0).unwrap().damage_multiplier, 1.0);
        assert_eq!(lunge.hit(1).unwrap().statuses, vec![StatusType::Bleed]);

        let hop = table.get("hop_back").unwrap();
        assert_eq!(
            hop.approach,
            ApproachStyle::Retreat {
                distance_requirement: 2.0
            }
        );
    }

    #[test]
    fn test_unknown_approach_style_is_configuration_error() {
        let json = r#"[{ "name": "x", "approach": { "style": "teleport" }, "combo": [ { "range": 1.0, "windup": 0.1 } ] }]"#;
        let err = AttackTable::from_json(json).unwrap_err();
        assert!(matches!(err, CombatError::Configuration(_)));
    }

    #[test]
    fn test_empty_combo_rejected() {
        let attack = AttackDefinition::chase("nothing", vec![]);
        assert!(matches!(attack.validate(), Err(CombatError::Configuration(_))));
    }

    #[test]
    fn test_hit_out_of_range() {
        let attack = AttackDefinition::chase("jab", vec![ComboHit::new(1.0, 0.2)]);
        assert!(attack.hit(0).is_ok());
        assert_eq!(
            attack.hit(1).unwrap_err(),
            CombatError::ComboOutOfRange {
                attack: "jab".to_string(),
                index: 1,
                len: 1
            }
        );
    }

    #[test]
    fn test_pick_weighted_respects_zero_weights() {
        let jab = Arc::new(AttackDefinition::chase("jab", vec![ComboHit::new(1.0, 0.2)]));
        let slam = Arc::new(AttackDefinition::chase("slam", vec![ComboHit::new(1.0, 0.9)]));
        let options = vec![AttackOption::new(jab, 0), AttackOption::new(slam, 3)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..20 {
            assert_eq!(pick_weighted(&options, &mut rng).unwrap().name, "slam");
        }

        let empty = vec![AttackOption::new(options[0].attack.clone(), 0)];
        assert!(pick_weighted(&empty, &mut rng).is_err());
    }

    #[test]
    fn test_options_unknown_name() {
        let table = AttackTable::from_json(TABLE).unwrap();
        assert_eq!(table.options(&[("lunge", 2), ("hop_back", 1)]).unwrap().len(), 2);
        assert!(table.options(&[("missing", 1)]).is_err());
    }
}
