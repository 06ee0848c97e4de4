//! Combat error taxonomy.
//!
//! Only setup and data problems are errors. Running out of stamina, a wall
//! query without a hit or a whiffed strike are ordinary control flow and never
//! show up here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CombatError {
    /// Attack data that no feasibility/positioning rule can handle
    /// (unknown approach style, empty combo, no weighted options).
    #[error("invalid attack configuration: {0}")]
    Configuration(String),

    /// A combo step was requested past the end of the combo.
    #[error("combo index {index} is out of range for attack `{attack}` ({len} hits)")]
    ComboOutOfRange {
        attack: String,
        index: usize,
        len: usize,
    },

    /// Arbiter, opponent or other required collaborator is not wired up.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}

impl CombatError {
    /// Setup failures that must stop the simulation instead of being logged.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingCollaborator(_))
    }
}

impl From<serde_json::Error> for CombatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CombatError::ComboOutOfRange {
            attack: "lunge".to_string(),
            index: 3,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "combo index 3 is out of range for attack `lunge` (3 hits)"
        );
        assert!(!err.is_fatal());
        assert!(CombatError::MissingCollaborator("combat arbiter").is_fatal());
    }
}
