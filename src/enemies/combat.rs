//! Attack cooldown, attack windup and damage bookkeeping for agents.

use bevy::prelude::*;

use super::components::{Agent, AttackIntent};

/// Start an attack if the state allows firing and the cooldown has elapsed.
///
/// Records `now` as the last attack time when it returns `true`. A call
/// during the cooldown is silently refused.
pub fn maybe_attack(agent: &mut Agent, now: f64) -> bool {
    if !agent.state().can_attack() {
        return false;
    }
    if now - agent.last_attack_time < f64::from(agent.stats.attack_cooldown) {
        return false;
    }
    agent.last_attack_time = now;
    true
}

/// Apply damage; returns `true` if this hit killed the agent.
///
/// Death bypasses the state debounce. Damage to a dead agent is ignored, and
/// negative or NaN amounts count as zero so health never goes up.
pub fn take_damage(agent: &mut Agent, amount: f32, now: f64) -> bool {
    if agent.is_dead() {
        return false;
    }

    let amount = amount.max(0.0);
    agent.health = (agent.health - amount).clamp(0.0, agent.stats.max_health);

    if agent.health <= 0.0 {
        agent.kill(now);
        info!("Agent {} ({}) died", agent.id, agent.archetype);
        return true;
    }
    false
}

/// Outcome of the attack step of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttackOutcome {
    /// An attack began winding up this tick (drives the attack animation)
    pub started: bool,
    /// An attack was released this tick
    pub released: Option<AttackIntent>,
}

/// Start an attack and release it once its windup has passed.
///
/// `in_reach` says whether the target is visible and within attack range.
/// A release is also held back until a full cooldown has passed since the
/// previous release, so released intents keep the cooldown spacing even
/// when ticks arrive unevenly. A pending attack is dropped as soon as the
/// agent leaves a firing state or the target goes out of reach.
pub fn update_attack(agent: &mut Agent, target: Vec3, in_reach: bool, now: f64) -> AttackOutcome {
    let mut outcome = AttackOutcome::default();
    if agent.is_dead() {
        return outcome;
    }

    if agent.scratch.attack_release_at.is_some() && !(in_reach && agent.state().can_attack()) {
        agent.scratch.attack_release_at = None;
        debug!("Agent {} dropped its attack in {:?}", agent.id, agent.state());
    }

    if agent.scratch.attack_release_at.is_none() && in_reach && maybe_attack(agent, now) {
        outcome.started = true;
        agent.scratch.attack_release_at = Some(now + f64::from(agent.stats.attack_windup));
        debug!("Agent {} attacking from {:?}", agent.id, agent.state());
    }

    if let Some(release_at) = agent.scratch.attack_release_at {
        let cooled = now - agent.scratch.last_release_time >= f64::from(agent.stats.attack_cooldown);
        if now >= release_at && cooled {
            agent.scratch.attack_release_at = None;
            agent.scratch.last_release_time = now;
            outcome.released = Some(intent(agent, target));
        }
    }
    outcome
}

fn intent(agent: &Agent, target: Vec3) -> AttackIntent {
    AttackIntent {
        origin: agent.position,
        target_position: target,
        damage: agent.stats.damage,
        accuracy: agent.stats.accuracy,
    }
}
