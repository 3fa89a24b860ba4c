//! Agent record, behavioural states and the ECS components linking them to entities.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

use super::data::{AiTuning, Archetype, ArchetypeStats};
use crate::core::geometry::yaw_direction;

/// Opaque identifier handed out by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Links an entity to its agent in the [`AgentRegistry`](super::AgentRegistry).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enemy(pub AgentId);

/// Behavioural state of an agent.
///
/// Also inserted on agent entities as a read-only mirror for animation and
/// audio systems.
#[derive(Component, Default, PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum AgentState {
    /// Freshly spawned, holding position.
    #[default]
    Idle,
    /// Walking the patrol route; target unseen or far away.
    Patrol,
    /// Closing in to engagement range.
    Chase,
    /// Holding ground and firing.
    Attack,
    /// Side-stepping around the target while firing.
    Strafe,
    /// Backing off from a target that is closing in.
    Retreat,
    /// Sheltering at a cover point.
    Cover,
    /// Terminal. Waiting for the despawn grace period to run out.
    Dead,
}

/// How an agent moves while in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    Hold,
    Walk,
    Run,
    Strafe,
    Sprint,
}

/// Per-state movement parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementProfile {
    pub can_move: bool,
    /// Scales the archetype speed
    pub speed_multiplier: f32,
    pub kind: MovementKind,
}

impl MovementProfile {
    const fn new(can_move: bool, speed_multiplier: f32, kind: MovementKind) -> Self {
        Self {
            can_move,
            speed_multiplier,
            kind,
        }
    }
}

impl AgentState {
    pub const fn movement_profile(self) -> MovementProfile {
        match self {
            AgentState::Idle | AgentState::Attack | AgentState::Dead => {
                MovementProfile::new(false, 0.0, MovementKind::Hold)
            }
            AgentState::Patrol => MovementProfile::new(true, 0.5, MovementKind::Walk),
            AgentState::Chase => MovementProfile::new(true, 1.0, MovementKind::Run),
            AgentState::Strafe => MovementProfile::new(true, 0.7, MovementKind::Strafe),
            AgentState::Retreat => MovementProfile::new(true, 1.2, MovementKind::Sprint),
            AgentState::Cover => MovementProfile::new(true, 1.0, MovementKind::Run),
        }
    }

    /// States from which an attack may be released.
    pub const fn can_attack(self) -> bool {
        matches!(self, AgentState::Attack | AgentState::Strafe | AgentState::Retreat)
    }

    /// States that keep facing the target instead of the movement direction.
    pub const fn faces_target(self) -> bool {
        matches!(
            self,
            AgentState::Idle
                | AgentState::Chase
                | AgentState::Attack
                | AgentState::Strafe
                | AgentState::Retreat
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, AgentState::Dead)
    }
}

/// Cyclic list of waypoints walked while patrolling.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolRoute {
    pub waypoints: Vec<Vec3>,
    /// Index of the waypoint currently being walked to
    pub current: usize,
}

impl PatrolRoute {
    /// A route starting at the first waypoint. Empty input yields `None`.
    pub fn new(waypoints: Vec<Vec3>) -> Option<Self> {
        if waypoints.is_empty() {
            None
        } else {
            Some(Self {
                waypoints,
                current: 0,
            })
        }
    }

    /// Evenly spaced waypoints on a horizontal circle around `center`.
    pub fn circle(center: Vec3, radius: f32, points: usize) -> Self {
        let points = points.max(1);
        let step = std::f32::consts::TAU / points as f32;
        let waypoints = (0..points)
            .map(|i| center + yaw_direction(step * i as f32) * radius)
            .collect();
        Self {
            waypoints,
            current: 0,
        }
    }

    /// `None` only if the waypoints were cleared after construction.
    pub fn current_waypoint(&self) -> Option<Vec3> {
        match self.waypoints.len() {
            0 => None,
            len => Some(self.waypoints[self.current % len]),
        }
    }

    /// Move on to the next waypoint, wrapping to the start.
    pub fn advance(&mut self) {
        if !self.waypoints.is_empty() {
            self.current = (self.current + 1) % self.waypoints.len();
        }
    }
}

/// Transient data owned by individual states.
#[derive(Debug, Clone, PartialEq)]
pub struct StateScratch {
    /// +1.0 or -1.0
    pub strafe_direction: f32,
    /// Seconds since the last strafe direction flip
    pub strafe_timer: f32,
    /// Flee direction offset (radians) chosen when the retreat started
    pub retreat_jitter: f32,
    /// Whether the cover search already ran for the current retreat
    pub cover_searched: bool,
    pub last_cover: Option<Vec3>,
    /// When the attack currently winding up will be released
    pub attack_release_at: Option<f64>,
    pub last_release_time: f64,
}

impl Default for StateScratch {
    fn default() -> Self {
        Self {
            strafe_direction: 1.0,
            strafe_timer: 0.0,
            retreat_jitter: 0.0,
            cover_searched: false,
            last_cover: None,
            attack_release_at: None,
            last_release_time: f64::NEG_INFINITY,
        }
    }
}

/// A released attack for the projectile / hit-resolution system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub origin: Vec3,
    pub target_position: Vec3,
    pub damage: f32,
    pub accuracy: f32,
}

/// A single controlled combat agent.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub archetype: Archetype,
    pub stats: ArchetypeStats,
    pub(crate) health: f32,
    pub(crate) state: AgentState,
    pub last_state_change: f64,
    pub last_attack_time: f64,
    pub velocity: Vec3,
    /// Mirrored from the physics body every tick
    pub position: Vec3,
    /// Facing around +Y, 0 = +Z
    pub yaw: f32,
    pub patrol: PatrolRoute,
    pub scratch: StateScratch,
    /// Target distance seen on the previous tick
    pub last_target_distance: Option<f32>,
    pub died_at: Option<f64>,
    pub(crate) death_reported: bool,
    pub(crate) rng: StdRng,
}

impl Agent {
    /// Create an agent standing at `position`.
    ///
    /// Without a (non-empty) patrol route a circular one is laid around the
    /// spawn point.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AgentId,
        archetype: Archetype,
        stats: ArchetypeStats,
        position: Vec3,
        patrol_route: Option<Vec<Vec3>>,
        tuning: &AiTuning,
        now: f64,
        seed: u64,
    ) -> Self {
        let patrol = patrol_route
            .and_then(PatrolRoute::new)
            .unwrap_or_else(|| PatrolRoute::circle(position, tuning.patrol_radius, tuning.patrol_points));

        Self {
            id,
            archetype,
            health: stats.max_health,
            stats,
            state: AgentState::Idle,
            last_state_change: now,
            last_attack_time: f64::NEG_INFINITY,
            velocity: Vec3::ZERO,
            position,
            yaw: 0.0,
            patrol,
            scratch: StateScratch::default(),
            last_target_distance: None,
            died_at: None,
            death_reported: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn is_dead(&self) -> bool {
        self.state == AgentState::Dead
    }

    /// Seconds since the last state change.
    pub fn time_in_state(&self, now: f64) -> f64 {
        now - self.last_state_change
    }

    /// Whether the debounce window has elapsed.
    pub fn can_change_state(&self, now: f64, min_state_duration: f32) -> bool {
        self.time_in_state(now) >= f64::from(min_state_duration)
    }

    pub fn facing(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Switch to `next` if the debounce window allows it.
    ///
    /// Never enters or leaves `Dead`; death goes through
    /// [`take_damage`](super::combat::take_damage).
    pub fn enter_state(&mut self, next: AgentState, now: f64, tuning: &AiTuning) -> bool {
        if self.is_dead() || next == AgentState::Dead || next == self.state {
            return false;
        }
        if !self.can_change_state(now, tuning.min_state_duration) {
            return false;
        }

        self.state = next;
        self.last_state_change = now;
        self.on_enter(next, tuning);
        true
    }

    fn on_enter(&mut self, state: AgentState, tuning: &AiTuning) {
        match state {
            AgentState::Strafe => {
                self.scratch.strafe_direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                self.scratch.strafe_timer = 0.0;
            }
            AgentState::Retreat => {
                let jitter = tuning.retreat_jitter;
                self.scratch.retreat_jitter = self.rng.gen_range(-jitter..=jitter);
                self.scratch.cover_searched = false;
            }
            _ => {}
        }
    }

    /// Unconditional transition into `Dead`.
    pub(crate) fn kill(&mut self, now: f64) {
        if self.is_dead() {
            return;
        }
        debug!("Agent {} {:?} -> Dead", self.id, self.state);
        self.health = 0.0;
        self.state = AgentState::Dead;
        self.last_state_change = now;
        self.died_at = Some(now);
        self.velocity = Vec3::ZERO;
        self.scratch.attack_release_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent::new(
            AgentId(1),
            Archetype::Basic,
            ArchetypeStats::basic(),
            Vec3::ZERO,
            None,
            &AiTuning::default(),
            0.0,
            7,
        )
    }

    #[test]
    fn missing_route_is_synthesised_around_spawn() {
        let tuning = AiTuning::default();
        let agent = agent();
        assert_eq!(agent.patrol.waypoints.len(), tuning.patrol_points);
        for waypoint in &agent.patrol.waypoints {
            assert!((waypoint.length() - tuning.patrol_radius).abs() < 1e-4);
        }
    }

    #[test]
    fn empty_route_is_treated_as_missing() {
        let agent = Agent::new(
            AgentId(2),
            Archetype::Heavy,
            ArchetypeStats::heavy(),
            Vec3::X,
            Some(Vec::new()),
            &AiTuning::default(),
            0.0,
            1,
        );
        assert!(!agent.patrol.waypoints.is_empty());
    }

    #[test]
    fn enter_state_respects_debounce() {
        let tuning = AiTuning::default();
        let mut agent = agent();
        assert!(!agent.enter_state(AgentState::Patrol, 0.2, &tuning));
        assert!(agent.enter_state(AgentState::Patrol, 0.5, &tuning));
        assert!(!agent.enter_state(AgentState::Chase, 0.9, &tuning));
        assert!(agent.enter_state(AgentState::Chase, 1.0, &tuning));
        assert_eq!(agent.state(), AgentState::Chase);
    }

    #[test]
    fn dead_is_not_reachable_through_enter_state() {
        let tuning = AiTuning::default();
        let mut agent = agent();
        assert!(!agent.enter_state(AgentState::Dead, 10.0, &tuning));
        agent.kill(10.0);
        assert!(!agent.enter_state(AgentState::Patrol, 20.0, &tuning));
        assert_eq!(agent.state(), AgentState::Dead);
    }

    #[test]
    fn strafe_entry_picks_a_unit_direction() {
        let tuning = AiTuning::default();
        let mut agent = agent();
        assert!(agent.enter_state(AgentState::Strafe, 1.0, &tuning));
        assert_eq!(agent.scratch.strafe_direction.abs(), 1.0);
    }

    #[test]
    fn route_advance_wraps() {
        let mut route = PatrolRoute::new(vec![Vec3::ZERO, Vec3::X]).unwrap();
        route.advance();
        route.advance();
        assert_eq!(route.current, 0);
    }

    #[test]
    fn cleared_route_has_no_waypoint() {
        let mut route = PatrolRoute::new(vec![Vec3::ZERO, Vec3::X]).unwrap();
        route.waypoints.clear();
        route.advance();
        assert_eq!(route.current_waypoint(), None);
        assert_eq!(route.current, 0);
    }

    #[test]
    fn movement_profiles_match_states() {
        assert!(!AgentState::Attack.movement_profile().can_move);
        assert_eq!(AgentState::Retreat.movement_profile().kind, MovementKind::Sprint);
        assert!(AgentState::Retreat.can_attack());
        assert!(!AgentState::Cover.can_attack());
    }
}
