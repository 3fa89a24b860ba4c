//! Movement planner: where each state wants to stand, and how to get there smoothly.

use std::f32::consts::PI;

use bevy::prelude::*;

use super::components::{Agent, AgentState};
use super::cover::CoverSearch;
use super::data::{AiTuning, ArchetypeStats};
use super::perception::Obstacle;
use crate::core::geometry::{direction_to, horizontal_distance, rotate_y, yaw_direction, yaw_of};
use crate::core::tween::{damp_angle, damp_vec3};

/// Chasing stops this fraction inside `attack_start` so the agent ends up
/// engaged rather than hovering on the threshold.
const ENGAGE_MARGIN: f32 = 0.9;

/// Result of planning one tick of movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementPlan {
    pub target_position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
}

/// Distance from the target at which chasing stops.
pub fn engage_distance(stats: &ArchetypeStats, tuning: &AiTuning) -> f32 {
    stats.attack_range.min(tuning.attack_start * ENGAGE_MARGIN)
}

/// Plan the agent's movement for this tick and update its velocity and facing.
pub fn plan_movement(
    agent: &mut Agent,
    target: Vec3,
    obstacles: &[Obstacle],
    tuning: &AiTuning,
    delta: f32,
) -> MovementPlan {
    let destination = target_position(agent, target, obstacles, tuning, delta);
    let desired = desired_velocity(agent, destination, tuning);
    agent.velocity = damp_vec3(agent.velocity, desired, tuning.velocity_smoothing, delta);

    let look_at = if agent.state().faces_target() {
        target
    } else {
        destination
    };
    if let Some(yaw) = yaw_of(look_at - agent.position) {
        agent.yaw = damp_angle(
            agent.yaw,
            yaw,
            tuning.turn_rate,
            delta,
            tuning.rotation_threshold,
        );
    }

    MovementPlan {
        target_position: destination,
        velocity: agent.velocity,
        yaw: agent.yaw,
    }
}

/// Where the agent wants to be in its current state.
pub fn target_position(
    agent: &mut Agent,
    target: Vec3,
    obstacles: &[Obstacle],
    tuning: &AiTuning,
    delta: f32,
) -> Vec3 {
    match agent.state() {
        AgentState::Idle | AgentState::Attack | AgentState::Dead => agent.position,
        AgentState::Patrol => patrol_target(agent, tuning),
        AgentState::Chase => chase_target(agent, target, tuning),
        AgentState::Strafe => strafe_target(agent, target, tuning, delta),
        AgentState::Retreat => retreat_target(agent, target, obstacles, tuning),
        AgentState::Cover => match agent.scratch.last_cover {
            Some(cover) => cover,
            None => retreat_target(agent, target, obstacles, tuning),
        },
    }
}

/// Current waypoint, advancing (and wrapping) once it has been reached.
/// An emptied route holds position.
pub fn patrol_target(agent: &mut Agent, tuning: &AiTuning) -> Vec3 {
    let Some(waypoint) = agent.patrol.current_waypoint() else {
        return agent.position;
    };
    if horizontal_distance(agent.position, waypoint) <= tuning.arrival_radius {
        agent.patrol.advance();
    }
    agent.patrol.current_waypoint().unwrap_or(waypoint)
}

/// Point on the line to the target, `engage_distance` short of it.
pub fn chase_target(agent: &Agent, target: Vec3, tuning: &AiTuning) -> Vec3 {
    let engage = engage_distance(&agent.stats, tuning);
    if horizontal_distance(agent.position, target) <= engage {
        return agent.position;
    }
    let toward = direction_to(agent.position, target);
    at_height(target, agent.position.y) - toward * engage
}

/// Point beside the target at `strafe_range`, swung `strafe_arc` off the
/// agent's bearing (perpendicular by default), flipping side every
/// `strafe_duration` seconds.
pub fn strafe_target(agent: &mut Agent, target: Vec3, tuning: &AiTuning, delta: f32) -> Vec3 {
    let scratch = &mut agent.scratch;
    scratch.strafe_timer += delta;
    if scratch.strafe_timer >= tuning.strafe_duration {
        scratch.strafe_timer = 0.0;
        scratch.strafe_direction = -scratch.strafe_direction;
    }

    let bearing = bearing_from(target, agent);
    let swung = rotate_y(bearing, tuning.strafe_arc * agent.scratch.strafe_direction);
    at_height(target, agent.position.y) + swung * tuning.strafe_range
}

/// Cover point if one is reachable, otherwise a jittered point straight away
/// from the target.
pub fn retreat_target(agent: &mut Agent, target: Vec3, obstacles: &[Obstacle], tuning: &AiTuning) -> Vec3 {
    if !agent.scratch.cover_searched {
        agent.scratch.cover_searched = true;
        let search = CoverSearch {
            search_radius: tuning.cover_search_radius,
            offset: tuning.cover_offset,
            distance_cap: tuning.cover_distance_cap,
        };
        let position = agent.position;
        agent.scratch.last_cover = search
            .best(position, target, obstacles)
            .map(|point| point.position)
            .filter(|cover| is_reachable(position, *cover, target));

        match agent.scratch.last_cover {
            Some(cover) => debug!("Agent {} retreating to cover at {}", agent.id, cover),
            None => debug!("Agent {} found no cover, fleeing", agent.id),
        }
    }

    match agent.scratch.last_cover {
        Some(cover) => cover,
        None => flee_target(agent, target, tuning),
    }
}

/// A cover point is worth running to only if it does not bring the agent
/// closer to the target.
fn is_reachable(agent_pos: Vec3, cover: Vec3, target: Vec3) -> bool {
    horizontal_distance(cover, target) >= horizontal_distance(agent_pos, target)
}

fn flee_target(agent: &Agent, target: Vec3, tuning: &AiTuning) -> Vec3 {
    let away = bearing_from(target, agent);
    let heading = rotate_y(away, agent.scratch.retreat_jitter);
    let range = (horizontal_distance(agent.position, target) + tuning.retreat_step)
        .max(tuning.min_retreat_distance);
    at_height(target, agent.position.y) + heading * range
}

/// Direction from the target to the agent, falling back to behind the agent
/// when they overlap.
fn bearing_from(target: Vec3, agent: &Agent) -> Vec3 {
    let bearing = direction_to(target, agent.position);
    if bearing == Vec3::ZERO {
        yaw_direction(agent.yaw + PI)
    } else {
        bearing
    }
}

fn at_height(point: Vec3, y: f32) -> Vec3 {
    Vec3::new(point.x, y, point.z)
}

/// Full-speed velocity toward `destination`, scaled by the state's profile.
pub fn desired_velocity(agent: &Agent, destination: Vec3, tuning: &AiTuning) -> Vec3 {
    let profile = agent.state().movement_profile();
    if !profile.can_move || horizontal_distance(agent.position, destination) <= tuning.arrival_radius {
        return Vec3::ZERO;
    }
    direction_to(agent.position, destination) * agent.stats.speed * profile.speed_multiplier
}
