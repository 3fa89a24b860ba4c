//! Combat AI - headless demo.
//!
//! Spawns a small arena with pillars and a wall, three agents of different
//! archetypes and a player that walks through the arena while shooting the
//! nearest agent. State changes, attacks and deaths are logged; the app
//! exits after `DEMO_SECONDS`.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use combat_ai::core::{AgentDiedEvent, AgentStateChangedEvent, AttackIntentEvent, DamageAgentEvent};
use combat_ai::enemies::{spawn_agent, AgentRegistry, Archetype, Enemy};
use combat_ai::player::{spawn_player, Player};
use combat_ai::world::{spawn_pillar, spawn_wall, PILLAR_SIZE};

const DEMO_SECONDS: f64 = 30.0;
const PLAYER_SPEED: f32 = 3.0;
const PLAYER_DAMAGE: f32 = 35.0;
const PLAYER_FIRE_INTERVAL: f32 = 1.5;

/// Height of the player's and agents' origins; sight lines run at this level.
const EYE: f32 = 1.0;

/// Waypoints the player walks, looping.
const PLAYER_PATH: [Vec3; 4] = [
    Vec3::new(-20.0, EYE, -20.0),
    Vec3::new(20.0, EYE, -20.0),
    Vec3::new(20.0, EYE, 20.0),
    Vec3::new(-20.0, EYE, 20.0),
];

#[derive(Resource)]
struct PlayerScript {
    next_waypoint: usize,
    fire_timer: Timer,
}

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(combat_ai::CombatAiPlugin)
        .insert_resource(PlayerScript {
            next_waypoint: 1,
            fire_timer: Timer::from_seconds(PLAYER_FIRE_INTERVAL, TimerMode::Repeating),
        })
        .add_systems(Startup, setup_arena)
        .add_systems(Update, (walk_player, shoot_nearest_agent, log_agent_events, stop_after_demo))
        .run();
}

fn setup_arena(mut commands: Commands, mut registry: ResMut<AgentRegistry>) {
    spawn_player(&mut commands, PLAYER_PATH[0]);

    for (x, z) in [(-6.0, 0.0), (6.0, 4.0), (0.0, -8.0), (10.0, -10.0)] {
        spawn_pillar(&mut commands, Vec3::new(x, 0.0, z), PILLAR_SIZE, 3.0);
    }
    spawn_wall(&mut commands, Vec3::new(-12.0, 0.0, 10.0), Vec3::new(-2.0, 0.0, 10.0), 0.5, 3.0);

    spawn_agent(&mut commands, &mut registry, Vec3::new(0.0, EYE, 0.0), Archetype::Basic, None);
    spawn_agent(&mut commands, &mut registry, Vec3::new(8.0, EYE, -4.0), Archetype::Heavy, None);
    spawn_agent(
        &mut commands,
        &mut registry,
        Vec3::new(-10.0, EYE, 12.0),
        Archetype::Sniper,
        Some(vec![Vec3::new(-10.0, EYE, 12.0), Vec3::new(-4.0, EYE, 14.0)]),
    );

    info!("Arena ready with {} agents", registry.len());
}

fn walk_player(
    time: Res<Time>,
    mut script: ResMut<PlayerScript>,
    mut player_query: Query<&mut Transform, With<Player>>,
) {
    let Ok(mut transform) = player_query.get_single_mut() else {
        return;
    };

    let waypoint = PLAYER_PATH[script.next_waypoint];
    let to_waypoint = waypoint - transform.translation;
    let step = PLAYER_SPEED * time.delta_secs();

    if to_waypoint.length() <= step {
        transform.translation = waypoint;
        script.next_waypoint = (script.next_waypoint + 1) % PLAYER_PATH.len();
    } else {
        transform.translation += to_waypoint.normalize() * step;
    }
}

fn shoot_nearest_agent(
    time: Res<Time>,
    mut script: ResMut<PlayerScript>,
    player_query: Query<&Transform, With<Player>>,
    enemy_query: Query<(Entity, &Transform), (With<Enemy>, Without<Player>)>,
    mut damage: EventWriter<DamageAgentEvent>,
) {
    if !script.fire_timer.tick(time.delta()).just_finished() {
        return;
    }
    let Ok(player_transform) = player_query.get_single() else {
        return;
    };

    let nearest = enemy_query.iter().min_by(|(_, a), (_, b)| {
        let da = a.translation.distance_squared(player_transform.translation);
        let db = b.translation.distance_squared(player_transform.translation);
        da.total_cmp(&db)
    });

    if let Some((entity, _)) = nearest {
        damage.send(DamageAgentEvent {
            target: entity,
            amount: PLAYER_DAMAGE,
        });
    }
}

fn log_agent_events(
    mut changes: EventReader<AgentStateChangedEvent>,
    mut attacks: EventReader<AttackIntentEvent>,
    mut deaths: EventReader<AgentDiedEvent>,
) {
    for event in changes.read() {
        info!("{:?}: {:?} -> {:?}", event.entity, event.from, event.to);
    }
    for event in attacks.read() {
        info!(
            "{:?} fires at {} for {} (accuracy {})",
            event.attacker, event.intent.target_position, event.intent.damage, event.intent.accuracy
        );
    }
    for event in deaths.read() {
        info!("{:?} died", event.entity);
    }
}

fn stop_after_demo(time: Res<Time>, mut exit: EventWriter<AppExit>) {
    if time.elapsed_secs_f64() >= DEMO_SECONDS {
        info!("Demo finished");
        exit.send(AppExit::Success);
    }
}
