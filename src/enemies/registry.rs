//! Owner of every live agent and the per-tick update driving them.

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::ai::{perceive, think};
use super::combat::{take_damage, update_attack};
use super::components::{Agent, AgentId, AgentState, AttackIntent};
use super::data::{AiTuning, Archetype, ArchetypeTable};
use super::error::AiError;
use super::movement::plan_movement;
use super::perception::Obstacle;

/// Golden-ratio increment used to spread agent ids over the seed space.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// What happened to one agent during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentUpdate {
    pub id: AgentId,
    pub previous_state: AgentState,
    pub state: AgentState,
    pub target_position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub attack_started: bool,
    pub attack: Option<AttackIntent>,
    /// Set on the first tick after the agent died
    pub just_died: bool,
}

impl AgentUpdate {
    pub fn state_changed(&self) -> bool {
        self.previous_state != self.state
    }
}

/// Result of [`AgentRegistry::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// One entry per agent that was present at the start of the tick
    pub updates: Vec<AgentUpdate>,
    /// Agents whose despawn grace period ran out; already removed
    pub despawned: Vec<AgentId>,
}

impl TickReport {
    pub fn update(&self, id: AgentId) -> Option<&AgentUpdate> {
        self.updates.iter().find(|update| update.id == id)
    }
}

/// All agents, their shared archetype table and tuning.
///
/// Iteration is in id order so a tick is reproducible for a given seed and
/// input sequence.
#[derive(Resource, Debug)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, Agent>,
    next_id: u32,
    archetypes: ArchetypeTable,
    tuning: AiTuning,
    /// Time of the most recent tick
    clock: f64,
    seed: u64,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(ArchetypeTable::default(), AiTuning::default())
    }
}

impl AgentRegistry {
    pub fn new(archetypes: ArchetypeTable, tuning: AiTuning) -> Self {
        Self {
            agents: BTreeMap::new(),
            next_id: 1,
            archetypes,
            tuning,
            clock: 0.0,
            seed: 0,
        }
    }

    /// Seed for the per-agent random streams (strafe side, retreat jitter).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Register a new agent in `Idle` at `position`.
    ///
    /// Without a route (or with an empty one) the agent patrols a circle
    /// around its spawn point.
    pub fn spawn(&mut self, position: Vec3, archetype: Archetype, patrol_route: Option<Vec<Vec3>>) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;

        let stats = self.archetypes.get(archetype).clone();
        let seed = self.seed ^ u64::from(id.0).wrapping_mul(SEED_MIX);
        let agent = Agent::new(id, archetype, stats, position, patrol_route, &self.tuning, self.clock, seed);
        self.agents.insert(id, agent);

        info!("Spawned {} agent {} at {}", archetype, id, position);
        id
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    /// Damage an agent at the current clock. Returns `true` if it died.
    pub fn take_damage(&mut self, id: AgentId, amount: f32) -> Result<bool, AiError> {
        let now = self.clock;
        let agent = self.agents.get_mut(&id).ok_or(AiError::UnknownAgent(id))?;
        Ok(take_damage(agent, amount, now))
    }

    /// Overwrite the agent's position with the physics body's.
    pub fn sync_position(&mut self, id: AgentId, position: Vec3) -> Result<(), AiError> {
        let agent = self.agents.get_mut(&id).ok_or(AiError::UnknownAgent(id))?;
        agent.position = position;
        Ok(())
    }

    /// Advance every agent by one tick against a single target.
    pub fn tick(&mut self, target: Vec3, obstacles: &[Obstacle], now: f64, delta: f32) -> TickReport {
        self.clock = now;
        let tuning = &self.tuning;
        let mut report = TickReport::default();

        for agent in self.agents.values_mut() {
            if agent.is_dead() {
                report.updates.push(tick_dead(agent));
                if agent
                    .died_at
                    .is_some_and(|died_at| now - died_at >= f64::from(tuning.despawn_delay))
                {
                    report.despawned.push(agent.id);
                }
                continue;
            }

            let previous_state = agent.state();
            let senses = perceive(agent, target, obstacles, delta, tuning);
            if let Some((from, to)) = think(agent, &senses, tuning, now) {
                debug!("Agent {} {:?} -> {:?} (distance {:.1})", agent.id, from, to, senses.distance);
            }

            let plan = plan_movement(agent, target, obstacles, tuning, delta);
            let in_reach = senses.can_see && senses.distance <= agent.stats.attack_range;
            let attack = update_attack(agent, target, in_reach, now);

            report.updates.push(AgentUpdate {
                id: agent.id,
                previous_state,
                state: agent.state(),
                target_position: plan.target_position,
                velocity: plan.velocity,
                yaw: plan.yaw,
                attack_started: attack.started,
                attack: attack.released,
                just_died: false,
            });
        }

        for id in &report.despawned {
            self.agents.remove(id);
            info!("Despawned agent {}", id);
        }

        report
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn tuning(&self) -> &AiTuning {
        &self.tuning
    }

    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    /// Applies to every agent from the next tick on.
    pub fn set_tuning(&mut self, tuning: AiTuning) {
        self.tuning = tuning;
    }

    /// Only agents spawned afterwards pick up the new stats.
    pub fn set_archetypes(&mut self, archetypes: ArchetypeTable) {
        self.archetypes = archetypes;
    }

    /// Time of the most recent tick.
    pub fn now(&self) -> f64 {
        self.clock
    }
}

fn tick_dead(agent: &mut Agent) -> AgentUpdate {
    agent.velocity = Vec3::ZERO;
    let just_died = !agent.death_reported;
    agent.death_reported = true;

    AgentUpdate {
        id: agent.id,
        previous_state: AgentState::Dead,
        state: AgentState::Dead,
        target_position: agent.position,
        velocity: Vec3::ZERO,
        yaw: agent.yaw,
        attack_started: false,
        attack: None,
        just_died,
    }
}
