//! Headless `App` tests for the Bevy integration.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::Velocity;
use combat_ai::core::{AgentDiedEvent, AgentStateChangedEvent, AttackIntentEvent, DamageAgentEvent};
use combat_ai::enemies::{spawn_agent, AgentRegistry, AgentState, Archetype, Enemy};
use combat_ai::player::spawn_player;
use combat_ai::world::spawn_wall;
use combat_ai::CombatAiPlugin;

const FRAME: Duration = Duration::from_millis(100);

/// Everything the agent systems sent, accumulated across frames.
#[derive(Resource, Default)]
struct Captured {
    changes: Vec<AgentStateChangedEvent>,
    attacks: Vec<AttackIntentEvent>,
    deaths: Vec<AgentDiedEvent>,
}

fn capture_events(
    mut captured: ResMut<Captured>,
    mut changes: EventReader<AgentStateChangedEvent>,
    mut attacks: EventReader<AttackIntentEvent>,
    mut deaths: EventReader<AgentDiedEvent>,
) {
    captured.changes.extend(changes.read().copied());
    captured.attacks.extend(attacks.read().copied());
    captured.deaths.extend(deaths.read().copied());
}

/// Player and agents stand at this height so sight lines clear the floor.
const EYE: f32 = 1.0;

/// App with the player at the origin plus whatever `setup` spawns.
fn app_with<F>(setup: F) -> App
where
    F: Fn(&mut Commands, &mut AgentRegistry) + Send + Sync + 'static,
{
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(CombatAiPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .init_resource::<Captured>()
        .add_systems(
            Startup,
            move |mut commands: Commands, mut registry: ResMut<AgentRegistry>| {
                spawn_player(&mut commands, Vec3::new(0.0, EYE, 0.0));
                setup(&mut commands, &mut *registry);
            },
        )
        .add_systems(Update, capture_events);
    app
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn only_agent(app: &mut App) -> (Entity, Transform, AgentState) {
    let mut query = app.world_mut().query::<(Entity, &Transform, &AgentState)>();
    let (entity, transform, state) = query.single(app.world());
    (entity, *transform, *state)
}

fn basic_agent_at(x: f32) -> impl Fn(&mut Commands, &mut AgentRegistry) + Send + Sync + 'static {
    move |commands: &mut Commands, registry: &mut AgentRegistry| {
        spawn_agent(commands, registry, Vec3::new(x, EYE, 0.0), Archetype::Basic, None);
    }
}

#[test]
fn nearby_agent_engages_and_fires() {
    let mut app = app_with(basic_agent_at(8.0));
    run_frames(&mut app, 30);

    let (entity, _, state) = only_agent(&mut app);
    assert!(matches!(state, AgentState::Attack | AgentState::Strafe), "got {state:?}");

    let captured = app.world().resource::<Captured>();
    let first = captured.changes.first().expect("a state change");
    assert_eq!((first.entity, first.from, first.to), (entity, AgentState::Idle, AgentState::Attack));
    assert!(!captured.attacks.is_empty());
    assert!(captured.attacks.iter().all(|attack| attack.attacker == entity));
}

#[test]
fn chasing_agent_moves_toward_the_player() {
    let mut app = app_with(basic_agent_at(15.0));
    run_frames(&mut app, 12);

    let (_, transform, state) = only_agent(&mut app);
    assert_eq!(state, AgentState::Chase);
    assert!(transform.translation.x < 15.0);
    assert!(transform.translation.x > 0.0);
}

#[test]
fn physics_bodies_get_velocity_instead_of_being_moved() {
    let mut app = app_with(|commands, registry| {
        let entity = spawn_agent(commands, registry, Vec3::new(15.0, EYE, 0.0), Archetype::Basic, None);
        commands.entity(entity).insert(Velocity::zero());
    });
    run_frames(&mut app, 12);

    let mut query = app.world_mut().query::<(&Transform, &Velocity)>();
    let (transform, velocity) = query.single(app.world());
    assert_eq!(transform.translation, Vec3::new(15.0, EYE, 0.0));
    assert!(velocity.linvel.x < 0.0);
}

#[test]
fn walls_hide_the_player() {
    let mut app = app_with(|commands, registry| {
        spawn_wall(commands, Vec3::new(7.0, 0.0, -5.0), Vec3::new(7.0, 0.0, 5.0), 1.0, 3.0);
        spawn_agent(commands, registry, Vec3::new(15.0, EYE, 0.0), Archetype::Basic, None);
    });
    run_frames(&mut app, 20);

    let (_, _, state) = only_agent(&mut app);
    assert_eq!(state, AgentState::Patrol);
    assert!(app.world().resource::<Captured>().attacks.is_empty());
}

#[test]
fn damage_kills_and_the_body_is_despawned() {
    let mut app = app_with(basic_agent_at(15.0));
    run_frames(&mut app, 3);

    let (entity, _, _) = only_agent(&mut app);
    app.world_mut().send_event(DamageAgentEvent {
        target: entity,
        amount: 1000.0,
    });
    run_frames(&mut app, 2);

    assert_eq!(*app.world().get::<AgentState>(entity).unwrap(), AgentState::Dead);
    let captured = app.world().resource::<Captured>();
    assert_eq!(captured.deaths.len(), 1);
    assert_eq!(captured.deaths[0].entity, entity);

    // Default despawn delay is two seconds.
    run_frames(&mut app, 25);
    assert!(!app.world().entities().contains(entity));
    assert!(app.world().resource::<AgentRegistry>().is_empty());
    assert_eq!(app.world().resource::<Captured>().deaths.len(), 1);
}

#[test]
fn damage_to_unknown_entities_is_ignored() {
    let mut app = app_with(basic_agent_at(15.0));
    run_frames(&mut app, 2);

    let stray = app.world_mut().spawn_empty().id();
    app.world_mut().send_event(DamageAgentEvent {
        target: stray,
        amount: 1000.0,
    });
    run_frames(&mut app, 2);

    let (_, _, state) = only_agent(&mut app);
    assert_ne!(state, AgentState::Dead);
    assert!(app.world().resource::<Captured>().deaths.is_empty());
    let mut enemies = app.world_mut().query::<&Enemy>();
    assert_eq!(enemies.iter(app.world()).count(), 1);
}
