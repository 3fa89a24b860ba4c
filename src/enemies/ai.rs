//! Combat state machine: perception summary and transition policy.
//!
//! Transitions other than death are debounced by
//! [`AiTuning::min_state_duration`]. Once the window has elapsed the policy
//! below picks the state the agent should be in:
//!
//! 1. target unseen: `Patrol` (a `Retreat` keeps fleeing for up to
//!    `retreat_timeout`, since the agent may be running around a corner)
//! 2. close and approaching: `Retreat`
//! 3. within `attack_start`: alternate `Attack` and `Strafe`
//! 4. within `chase_start`: `Chase`
//! 5. otherwise `Patrol`
//!
//! A retreating agent that reaches its cover point switches to `Cover` and
//! holds it for `cover_hold` seconds.

use bevy::prelude::*;

use super::components::{Agent, AgentState};
use super::data::AiTuning;
use super::perception::{can_see_target, Obstacle};
use crate::core::geometry::{closing_speed, horizontal_distance};

/// What the agent knows about the target this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Senses {
    /// Ground-plane distance to the target
    pub distance: f32,
    pub can_see: bool,
    pub approaching: bool,
}

/// Whether the target closed in faster than `threshold` units per second
/// since the previous sample.
pub fn is_target_approaching(previous: Option<f32>, current: f32, delta: f32, threshold: f32) -> bool {
    previous.is_some_and(|previous| closing_speed(previous, current, delta) > threshold)
}

/// Sample distance, visibility and approach speed, and remember the distance
/// for the next tick.
pub fn perceive(
    agent: &mut Agent,
    target: Vec3,
    obstacles: &[Obstacle],
    delta: f32,
    tuning: &AiTuning,
) -> Senses {
    let distance = horizontal_distance(agent.position, target);
    let senses = Senses {
        distance,
        can_see: can_see_target(agent.position, target, obstacles),
        approaching: is_target_approaching(
            agent.last_target_distance,
            distance,
            delta,
            tuning.approach_speed_threshold,
        ),
    };
    agent.last_target_distance = Some(distance);
    senses
}

/// The state the transition policy wants, ignoring the debounce window.
pub fn desired_state(agent: &Agent, senses: &Senses, tuning: &AiTuning, now: f64) -> AgentState {
    let current = agent.state();
    let in_state = agent.time_in_state(now);

    match current {
        AgentState::Dead => return AgentState::Dead,
        AgentState::Cover if in_state < f64::from(tuning.cover_hold) => return AgentState::Cover,
        AgentState::Retreat if reached_cover(agent, tuning) => return AgentState::Cover,
        _ => {}
    }

    if !senses.can_see {
        if current == AgentState::Retreat && in_state < f64::from(tuning.retreat_timeout) {
            return AgentState::Retreat;
        }
        return AgentState::Patrol;
    }

    if senses.distance <= tuning.retreat_start && senses.approaching {
        return AgentState::Retreat;
    }

    if senses.distance <= tuning.attack_start {
        // Standing still is easy to punish, so engagement alternates.
        return match current {
            AgentState::Attack if in_state >= f64::from(tuning.attack_dwell) => AgentState::Strafe,
            AgentState::Attack => AgentState::Attack,
            AgentState::Strafe if in_state >= f64::from(tuning.strafe_dwell) => AgentState::Attack,
            AgentState::Strafe => AgentState::Strafe,
            _ => AgentState::Attack,
        };
    }

    if senses.distance <= tuning.chase_start {
        return AgentState::Chase;
    }

    AgentState::Patrol
}

fn reached_cover(agent: &Agent, tuning: &AiTuning) -> bool {
    agent
        .scratch
        .last_cover
        .is_some_and(|cover| horizontal_distance(agent.position, cover) <= tuning.arrival_radius)
}

/// Run the transition policy if the debounce window has elapsed.
///
/// Returns the `(from, to)` pair when the state changed.
pub fn think(
    agent: &mut Agent,
    senses: &Senses,
    tuning: &AiTuning,
    now: f64,
) -> Option<(AgentState, AgentState)> {
    if agent.is_dead() || !agent.can_change_state(now, tuning.min_state_duration) {
        return None;
    }

    let from = agent.state();
    let to = desired_state(agent, senses, tuning, now);
    agent.enter_state(to, now, tuning).then_some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemies::components::AgentId;
    use crate::enemies::data::{Archetype, ArchetypeStats};

    fn agent_at(position: Vec3) -> Agent {
        Agent::new(
            AgentId(1),
            Archetype::Basic,
            ArchetypeStats::basic(),
            position,
            None,
            &AiTuning::default(),
            0.0,
            3,
        )
    }

    fn visible(distance: f32, approaching: bool) -> Senses {
        Senses {
            distance,
            can_see: true,
            approaching,
        }
    }

    #[test]
    fn approach_requires_a_previous_sample() {
        assert!(!is_target_approaching(None, 5.0, 0.1, 2.0));
        assert!(is_target_approaching(Some(5.3), 5.0, 0.1, 2.0));
        assert!(!is_target_approaching(Some(5.1), 5.0, 0.1, 2.0));
        assert!(!is_target_approaching(Some(5.3), 5.0, 0.0, 2.0));
    }

    #[test]
    fn close_approaching_target_triggers_retreat() {
        let tuning = AiTuning::default();
        let agent = agent_at(Vec3::ZERO);
        assert_eq!(desired_state(&agent, &visible(5.0, true), &tuning, 1.0), AgentState::Retreat);
        assert_eq!(desired_state(&agent, &visible(5.0, false), &tuning, 1.0), AgentState::Attack);
    }

    #[test]
    fn distance_bands_pick_states() {
        let tuning = AiTuning::default();
        let agent = agent_at(Vec3::ZERO);
        assert_eq!(desired_state(&agent, &visible(9.0, false), &tuning, 1.0), AgentState::Attack);
        assert_eq!(desired_state(&agent, &visible(15.0, false), &tuning, 1.0), AgentState::Chase);
        assert_eq!(desired_state(&agent, &visible(50.0, false), &tuning, 1.0), AgentState::Patrol);
    }

    #[test]
    fn unseen_target_means_patrol() {
        let tuning = AiTuning::default();
        let agent = agent_at(Vec3::ZERO);
        let hidden = Senses {
            distance: 4.0,
            can_see: false,
            approaching: true,
        };
        assert_eq!(desired_state(&agent, &hidden, &tuning, 1.0), AgentState::Patrol);
    }

    #[test]
    fn retreat_survives_losing_sight_until_timeout() {
        let tuning = AiTuning::default();
        let mut agent = agent_at(Vec3::ZERO);
        assert!(agent.enter_state(AgentState::Retreat, 1.0, &tuning));
        let hidden = Senses {
            distance: 12.0,
            can_see: false,
            approaching: false,
        };
        assert_eq!(desired_state(&agent, &hidden, &tuning, 2.0), AgentState::Retreat);
        let late = 1.0 + f64::from(tuning.retreat_timeout);
        assert_eq!(desired_state(&agent, &hidden, &tuning, late), AgentState::Patrol);
    }

    #[test]
    fn engagement_alternates_after_dwell() {
        let tuning = AiTuning::default();
        let mut agent = agent_at(Vec3::ZERO);
        assert!(agent.enter_state(AgentState::Attack, 1.0, &tuning));
        assert_eq!(desired_state(&agent, &visible(8.0, false), &tuning, 1.5), AgentState::Attack);
        let swap = 1.0 + f64::from(tuning.attack_dwell);
        assert_eq!(desired_state(&agent, &visible(8.0, false), &tuning, swap), AgentState::Strafe);

        assert!(agent.enter_state(AgentState::Strafe, swap, &tuning));
        let back = swap + f64::from(tuning.strafe_dwell);
        assert_eq!(desired_state(&agent, &visible(8.0, false), &tuning, back - 0.1), AgentState::Strafe);
        assert_eq!(desired_state(&agent, &visible(8.0, false), &tuning, back), AgentState::Attack);
    }

    #[test]
    fn reaching_cover_switches_to_cover_and_holds() {
        let tuning = AiTuning::default();
        let mut agent = agent_at(Vec3::ZERO);
        assert!(agent.enter_state(AgentState::Retreat, 1.0, &tuning));
        agent.scratch.last_cover = Some(Vec3::new(0.2, 0.0, 0.0));
        assert_eq!(desired_state(&agent, &visible(4.0, true), &tuning, 2.0), AgentState::Cover);

        assert!(agent.enter_state(AgentState::Cover, 2.0, &tuning));
        assert_eq!(desired_state(&agent, &visible(30.0, false), &tuning, 3.0), AgentState::Cover);
        let released = 2.0 + f64::from(tuning.cover_hold);
        assert_eq!(desired_state(&agent, &visible(30.0, false), &tuning, released), AgentState::Patrol);
    }

    #[test]
    fn think_is_debounced() {
        let tuning = AiTuning::default();
        let mut agent = agent_at(Vec3::ZERO);
        assert_eq!(think(&mut agent, &visible(15.0, false), &tuning, 0.1), None);
        assert_eq!(
            think(&mut agent, &visible(15.0, false), &tuning, 0.5),
            Some((AgentState::Idle, AgentState::Chase))
        );
        assert_eq!(think(&mut agent, &visible(8.0, false), &tuning, 0.7), None);
        assert_eq!(agent.state(), AgentState::Chase);
    }

    #[test]
    fn perceive_tracks_previous_distance() {
        let tuning = AiTuning::default();
        let mut agent = agent_at(Vec3::ZERO);
        let first = perceive(&mut agent, Vec3::new(5.3, 0.0, 0.0), &[], 0.1, &tuning);
        assert!(!first.approaching);
        let second = perceive(&mut agent, Vec3::new(5.0, 0.0, 0.0), &[], 0.1, &tuning);
        assert!(second.approaching);
        assert!(second.can_see);
        assert_eq!(agent.last_target_distance, Some(5.0));
    }
}
