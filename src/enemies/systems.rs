//! ECS systems bridging entities and the [`AgentRegistry`].

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::components::{AgentState, Enemy};
use super::data::{AiTuning, ArchetypeTable, ARCHETYPE_DIR, TUNING_FILE};
use super::error::DataLoadError;
use super::perception::Obstacle;
use super::registry::AgentRegistry;
use crate::core::{AgentDiedEvent, AgentStateChangedEvent, AttackIntentEvent, DamageAgentEvent};
use crate::player::Player;
use crate::world::ObstacleMarker;

/// Load archetype and tuning overrides from `assets/data`.
///
/// Missing files are fine; broken ones are logged and the built-in values
/// kept.
pub fn load_agent_data(mut registry: ResMut<AgentRegistry>) {
    let mut archetypes = ArchetypeTable::default();
    let applied = archetypes.apply_overrides_from_dir(Path::new(ARCHETYPE_DIR));
    registry.set_archetypes(archetypes);

    match AiTuning::load(Path::new(TUNING_FILE)) {
        Ok(tuning) => {
            info!("Loaded AI tuning from {}", TUNING_FILE);
            registry.set_tuning(tuning);
        }
        Err(DataLoadError::FileNotFound(_)) => info!("No AI tuning file, using defaults"),
        Err(e) => error!("Failed to load AI tuning, using defaults: {}", e),
    }

    info!("Agent data ready ({} archetype overrides)", applied);
}

/// Forward damage events to the registry.
pub fn apply_agent_damage(
    mut events: EventReader<DamageAgentEvent>,
    mut registry: ResMut<AgentRegistry>,
    enemy_query: Query<&Enemy>,
) {
    for event in events.read() {
        let Ok(enemy) = enemy_query.get(event.target) else {
            warn!("Damage event for non-agent entity {:?}", event.target);
            continue;
        };

        if let Err(e) = registry.take_damage(enemy.0, event.amount) {
            warn!("Dropping damage event: {}", e);
        }
    }
}

/// Run one registry tick against the player and write the results back.
///
/// Agents with a Rapier [`Velocity`] get their horizontal velocity set and
/// the physics step moves them; the others are moved kinematically here.
#[allow(clippy::too_many_arguments)]
pub fn tick_agents(
    time: Res<Time>,
    mut registry: ResMut<AgentRegistry>,
    player_query: Query<&Transform, (With<Player>, Without<Enemy>)>,
    obstacle_query: Query<(&Transform, &Collider), (With<ObstacleMarker>, Without<Enemy>)>,
    mut enemy_query: Query<
        (Entity, &Enemy, &mut Transform, &mut AgentState, Option<&mut Velocity>),
        Without<Player>,
    >,
    mut intents: EventWriter<AttackIntentEvent>,
    mut deaths: EventWriter<AgentDiedEvent>,
    mut changes: EventWriter<AgentStateChangedEvent>,
) {
    let Ok(player_transform) = player_query.get_single() else {
        return;
    };

    let obstacles: Vec<Obstacle> = obstacle_query
        .iter()
        .map(|(transform, collider)| {
            Obstacle::new(transform.translation, collider.clone()).with_rotation(transform.rotation)
        })
        .collect();

    for (entity, enemy, transform, ..) in enemy_query.iter() {
        if registry.sync_position(enemy.0, transform.translation).is_err() {
            debug!("Entity {:?} links to removed agent {}", entity, enemy.0);
        }
    }

    let now = time.elapsed_secs_f64();
    let delta = time.delta_secs();
    let report = registry.tick(player_transform.translation, &obstacles, now, delta);
    let updates: HashMap<_, _> = report.updates.iter().map(|update| (update.id, update)).collect();

    for (entity, enemy, mut transform, mut state, velocity) in enemy_query.iter_mut() {
        let Some(update) = updates.get(&enemy.0) else {
            continue;
        };

        match velocity {
            Some(mut velocity) => {
                velocity.linvel = Vec3::new(update.velocity.x, velocity.linvel.y, update.velocity.z);
            }
            None => transform.translation += update.velocity * delta,
        }
        transform.rotation = Quat::from_rotation_y(update.yaw);

        if *state != update.state {
            changes.send(AgentStateChangedEvent {
                entity,
                from: *state,
                to: update.state,
            });
            *state = update.state;
        }

        if update.just_died {
            deaths.send(AgentDiedEvent { entity });
        }

        if let Some(intent) = update.attack {
            intents.send(AttackIntentEvent {
                attacker: entity,
                intent,
            });
        }
    }
}

/// Despawn entities whose agent the registry has dropped.
pub fn despawn_removed_agents(
    mut commands: Commands,
    registry: Res<AgentRegistry>,
    enemy_query: Query<(Entity, &Enemy)>,
) {
    for (entity, enemy) in enemy_query.iter() {
        if registry.get(enemy.0).is_none() {
            commands.entity(entity).despawn_recursive();
        }
    }
}
