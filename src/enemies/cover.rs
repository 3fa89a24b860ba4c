//! Cover point search around nearby obstacles.

use bevy::prelude::*;

use super::perception::Obstacle;
use crate::core::geometry::yaw_direction;

/// Angular spacing between candidates around an obstacle.
pub const CANDIDATE_STEP_DEGREES: f32 = 45.0;

const TARGET_DISTANCE_WEIGHT: f32 = 0.4;
const AGENT_PROXIMITY_WEIGHT: f32 = 0.6;

/// A scored cover candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPoint {
    pub position: Vec3,
    pub score: f32,
}

/// Parameters of the candidate layout and scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverSearch {
    pub search_radius: f32,
    /// Distance of each candidate from its obstacle
    pub offset: f32,
    /// Target distance beyond which candidates stop scoring higher
    pub distance_cap: f32,
}

impl Default for CoverSearch {
    fn default() -> Self {
        Self {
            search_radius: 15.0,
            offset: 3.0,
            distance_cap: 20.0,
        }
    }
}

impl CoverSearch {
    /// Weighted score: far from the target (capped) and close to the agent.
    pub fn score(&self, candidate: Vec3, agent_pos: Vec3, target_pos: Vec3) -> f32 {
        let to_target = candidate.distance(target_pos).min(self.distance_cap) / self.distance_cap;
        let from_agent = candidate.distance(agent_pos) / self.search_radius;
        TARGET_DISTANCE_WEIGHT * to_target + AGENT_PROXIMITY_WEIGHT * (1.0 - from_agent)
    }

    /// Best candidate around obstacles within range of the agent.
    ///
    /// Obstacles are visited in slice order and angles from +Z turning about
    /// +Y; on equal scores the first candidate is kept.
    pub fn best(&self, agent_pos: Vec3, target_pos: Vec3, obstacles: &[Obstacle]) -> Option<CoverPoint> {
        let steps = (360.0 / CANDIDATE_STEP_DEGREES) as usize;
        let mut best: Option<CoverPoint> = None;

        for obstacle in obstacles {
            if obstacle.position.distance(agent_pos) > self.search_radius {
                continue;
            }

            for step in 0..steps {
                let angle = (CANDIDATE_STEP_DEGREES * step as f32).to_radians();
                let offset = yaw_direction(angle) * self.offset;
                let position = Vec3::new(
                    obstacle.position.x + offset.x,
                    agent_pos.y,
                    obstacle.position.z + offset.z,
                );
                let score = self.score(position, agent_pos, target_pos);

                if best.map_or(true, |current| score > current.score) {
                    best = Some(CoverPoint { position, score });
                }
            }
        }

        best
    }
}

/// Highest-scoring cover point near the agent, with its score.
pub fn find_cover_point(
    agent_pos: Vec3,
    target_pos: Vec3,
    obstacles: &[Obstacle],
    search_radius: f32,
) -> Option<CoverPoint> {
    CoverSearch {
        search_radius,
        ..default()
    }
    .best(agent_pos, target_pos, obstacles)
}

/// Position of the highest-scoring cover point near the agent.
pub fn find_cover(
    agent_pos: Vec3,
    target_pos: Vec3,
    obstacles: &[Obstacle],
    search_radius: f32,
) -> Option<Vec3> {
    find_cover_point(agent_pos, target_pos, obstacles, search_radius).map(|point| point.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pillar(x: f32, z: f32) -> Obstacle {
        Obstacle::cuboid(Vec3::new(x, 0.0, z), Vec3::splat(0.5))
    }

    #[test]
    fn nothing_in_range_returns_none() {
        let obstacles = [pillar(100.0, 0.0)];
        assert_eq!(find_cover(Vec3::ZERO, Vec3::X * 10.0, &obstacles, 15.0), None);
        assert_eq!(find_cover(Vec3::ZERO, Vec3::X * 10.0, &[], 15.0), None);
    }

    #[test]
    fn prefers_the_side_away_from_the_target() {
        // Target to the +X, pillar right next to the agent.
        let obstacles = [pillar(2.0, 0.0)];
        let cover = find_cover(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), &obstacles, 15.0).unwrap();
        assert!(cover.x < 2.0, "cover {cover:?} should sit on the agent's side");
    }

    #[test]
    fn candidates_sit_at_the_offset() {
        let obstacles = [pillar(4.0, 4.0)];
        let cover = find_cover(Vec3::ZERO, Vec3::new(-10.0, 0.0, 0.0), &obstacles, 15.0).unwrap();
        let flat = Vec3::new(cover.x - 4.0, 0.0, cover.z - 4.0);
        assert!((flat.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn identical_inputs_give_identical_points() {
        let obstacles = [pillar(3.0, 1.0), pillar(-2.0, 5.0), pillar(6.0, -4.0)];
        let a = find_cover_point(Vec3::ZERO, Vec3::new(8.0, 0.0, 8.0), &obstacles, 15.0);
        let b = find_cover_point(Vec3::ZERO, Vec3::new(8.0, 0.0, 8.0), &obstacles, 15.0);
        assert_eq!(a, b);
    }

    #[test]
    fn ties_keep_the_first_obstacle() {
        // Two identical obstacles at the same place: the first one's candidate wins.
        let obstacles = [pillar(3.0, 0.0), pillar(3.0, 0.0)];
        let search = CoverSearch::default();
        let best = search.best(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &obstacles).unwrap();
        let first_only = search.best(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &obstacles[..1]).unwrap();
        assert_eq!(best, first_only);
    }

    #[test]
    fn score_caps_target_distance() {
        let search = CoverSearch::default();
        let far = search.score(Vec3::ZERO, Vec3::ZERO, Vec3::X * 1000.0);
        let capped = search.score(Vec3::ZERO, Vec3::ZERO, Vec3::X * search.distance_cap);
        assert!((far - capped).abs() < 1e-6);
        assert!((far - 1.0).abs() < 1e-6);
    }
}
