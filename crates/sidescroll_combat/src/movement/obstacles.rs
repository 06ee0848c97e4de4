//! Obstacle queries along the world axis.
//!
//! Физика внешняя: ядро видит только raycast-запрос. `Obstacles`: простая
//! реализация для headless режима (список помеченных точек).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Blocks movement
    Wall,
    /// Reported by raycasts, ignored by movement clamping
    Prop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleHit {
    pub position: f32,
    pub kind: ObstacleKind,
}

/// Pure raycast query. Hits come back in no particular order.
pub trait ObstacleQuery {
    fn raycast(&self, origin: f32, leftward: bool, distance: f32) -> Vec<ObstacleHit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: f32,
    pub kind: ObstacleKind,
}

/// Obstacles of the current arena.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Obstacles {
    obstacles: Vec<Obstacle>,
}

impl Obstacles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena bounded by two walls.
    pub fn arena(left_wall: f32, right_wall: f32) -> Self {
        Self::new().with_wall(left_wall).with_wall(right_wall)
    }

    pub fn with_wall(mut self, position: f32) -> Self {
        self.push(Obstacle {
            position,
            kind: ObstacleKind::Wall,
        });
        self
    }

    pub fn push(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }
}

impl ObstacleQuery for Obstacles {
    fn raycast(&self, origin: f32, leftward: bool, distance: f32) -> Vec<ObstacleHit> {
        self.obstacles
            .iter()
            .filter(|obstacle| {
                let along = if leftward {
                    origin - obstacle.position
                } else {
                    obstacle.position - origin
                };
                along >= 0.0 && along <= distance
            })
            .map(|obstacle| ObstacleHit {
                position: obstacle.position,
                kind: obstacle.kind,
            })
            .collect()
    }
}

/// Open field, raycasts never hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleQuery for NoObstacles {
    fn raycast(&self, _origin: f32, _leftward: bool, _distance: f32) -> Vec<ObstacleHit> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raycast_respects_direction_and_distance() {
        let mut obstacles = Obstacles::arena(-5.0, 5.0);
        obstacles.push(Obstacle {
            position: 2.0,
            kind: ObstacleKind::Prop,
        });

        let right = obstacles.raycast(0.0, false, 3.0);
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].kind, ObstacleKind::Prop);

        let right_far = obstacles.raycast(0.0, false, 10.0);
        assert_eq!(right_far.len(), 2);

        let left = obstacles.raycast(0.0, true, 4.9);
        assert!(left.is_empty());

        assert!(NoObstacles.raycast(0.0, true, 100.0).is_empty());
    }
}
