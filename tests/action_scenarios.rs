/// End-to-end scenarios: actions driven through the world the way a game loop would

use approx::assert_relative_eq;
use danmaku_kinematics::action::{
    preview_path, AngleOffset, DetachFromParentEmpa, EmpAction, MoveCustomBezierEmpa, MoveCustomPolarEmpa,
    MovePlayerHomingEmpa, MovementAction, StandaloneContext, StayStillAtLastPositionEmpa,
};
use danmaku_kinematics::ecs::hierarchy::ReferenceHierarchy;
use danmaku_kinematics::ecs::init::{create_moving_entity, create_player_entity, create_reference_anchor};
use danmaku_kinematics::ecs::{EcsWorld, EntityQuery};
use danmaku_kinematics::movement::{reference_origin, update_movement_paths, MovementPath};
use danmaku_kinematics::mp::MotionEvaluator;
use danmaku_kinematics::tfv::{TimeFunction, Tfv};
use glam::Vec2;

#[test]
fn test_linear_scenario() {
    assert_eq!(Tfv::linear(0.0, 10.0, 5.0).evaluate(2.5).unwrap(), 5.0);
}

#[test]
fn test_detach_scenario() {
    let mut ecs = EcsWorld::new();
    let parent = create_moving_entity(&mut ecs.world, Vec2::new(5.0, 5.0), None);
    let bullet = create_moving_entity(&mut ecs.world, Vec2::new(8.0, 9.0), Some(parent));

    let mut execution = DetachFromParentEmpa.execute(&mut ecs, bullet, 0.0).unwrap();
    let anchor = execution.new_reference.expect("detach installs a new reference");
    ReferenceHierarchy::reparent(&mut ecs.world, bullet, anchor);

    for step in 1..=5 {
        ecs.set_position(parent, Vec2::new(5.0 + step as f32 * 30.0, -20.0)).unwrap();
        let origin = reference_origin(&ecs, bullet);
        let position = execution.motion.compute(&ecs, origin, 0.0).unwrap();
        assert_eq!(position, Vec2::new(8.0, 9.0));
    }
}

#[test]
fn test_homing_bullet_closes_on_player() {
    let mut ecs = EcsWorld::new();
    let player = create_player_entity(&mut ecs.world, Vec2::new(0.0, -100.0), Vec2::ZERO);
    let bullet = create_moving_entity(&mut ecs.world, Vec2::new(60.0, 100.0), None);
    ecs.world
        .insert_one(
            bullet,
            MovementPath::new(vec![MovePlayerHomingEmpa::new(
                Tfv::constant(0.2),
                Tfv::constant(100.0),
                3.0,
            )
            .into()]),
        )
        .unwrap();

    let start_distance = ecs.position(bullet).unwrap().distance(ecs.position(player).unwrap());
    for _ in 0..120 {
        update_movement_paths(&mut ecs, 1.0 / 120.0);
    }
    let end_distance = ecs.position(bullet).unwrap().distance(ecs.position(player).unwrap());

    // One second at speed 100 toward a target ~208 away
    assert!(end_distance < start_distance - 80.0, "{} -> {}", start_distance, end_distance);
}

#[test]
fn test_preview_matches_live_run() {
    let script: Vec<EmpAction> = vec![
        MoveCustomPolarEmpa::new(
            Tfv::linear(0.0, 30.0, 1.0),
            Tfv::constant(0.0),
            1.0,
            AngleOffset::ToPlayer { x_offset: 0.0, y_offset: 0.0 },
        )
        .into(),
        MoveCustomBezierEmpa::new(
            1.0,
            vec![Vec2::ZERO, Vec2::new(10.0, 10.0), Vec2::new(20.0, 0.0)],
            AngleOffset::Zero,
        )
        .into(),
    ];
    let spawn = Vec2::new(10.0, 50.0);
    let player_position = Vec2::new(10.0, 0.0);

    let ctx = StandaloneContext::new(spawn, player_position, 0.0);
    let preview = preview_path(&script, &ctx, 0.05).unwrap();

    let mut ecs = EcsWorld::new();
    create_player_entity(&mut ecs.world, player_position, Vec2::ZERO);
    let anchor = create_reference_anchor(&mut ecs.world, spawn);
    let bullet = create_moving_entity(&mut ecs.world, spawn, Some(anchor));
    ecs.world.insert_one(bullet, MovementPath::new(script)).unwrap();

    for _ in 0..40 {
        update_movement_paths(&mut ecs, 0.05);
    }

    let live = ecs.position(bullet).unwrap();
    let previewed = spawn + preview.evaluate(&ecs, 2.0).unwrap();
    assert_relative_eq!(live.x, previewed.x, epsilon = 1e-3);
    assert_relative_eq!(live.y, previewed.y, epsilon = 1e-3);
    // Straight down 30, then 20 along +x
    assert_relative_eq!(live.x, 30.0, epsilon = 1e-3);
    assert_relative_eq!(live.y, 20.0, epsilon = 1e-3);
}

#[test]
fn test_stay_still_keeps_offset_from_moving_reference() {
    let mut ecs = EcsWorld::new();
    let carrier = create_moving_entity(&mut ecs.world, Vec2::new(1.0, 1.0), None);
    let bullet = create_moving_entity(&mut ecs.world, Vec2::ZERO, Some(carrier));
    ecs.world
        .insert_one(
            bullet,
            MovementPath::new(vec![StayStillAtLastPositionEmpa::new(2.0).into()]),
        )
        .unwrap();

    update_movement_paths(&mut ecs, 0.1);
    assert_eq!(ecs.position(bullet).unwrap(), Vec2::ZERO);

    ecs.set_position(carrier, Vec2::new(4.0, -2.0)).unwrap();
    update_movement_paths(&mut ecs, 0.1);
    assert_eq!(ecs.position(bullet).unwrap(), Vec2::new(3.0, -3.0));
}

#[test]
fn test_consecutive_actions_join_without_detach() {
    let script: Vec<EmpAction> = vec![
        MoveCustomPolarEmpa::new(Tfv::linear(0.0, 4.0, 1.0), Tfv::constant(0.0), 1.0, AngleOffset::Zero).into(),
        StayStillAtLastPositionEmpa::new(1.0).into(),
    ];
    let spawn = Vec2::new(10.0, 10.0);
    let preview = preview_path(&script, &StandaloneContext::new(spawn, Vec2::ZERO, 0.0), 0.05).unwrap();

    let mut ecs = EcsWorld::new();
    let bullet = create_moving_entity(&mut ecs.world, spawn, None);
    ecs.world.insert_one(bullet, MovementPath::new(script)).unwrap();

    let mut previous = spawn;
    for _ in 0..30 {
        update_movement_paths(&mut ecs, 0.05);
        let position = ecs.position(bullet).unwrap();
        // 4 units per second is 0.2 per tick at most
        assert!(position.distance(previous) <= 0.2 + 1e-4, "{} -> {}", previous, position);
        previous = position;
    }

    let live = ecs.position(bullet).unwrap();
    let previewed = spawn + preview.evaluate(&ecs, 1.5).unwrap();
    assert_relative_eq!(live.x, 14.0, epsilon = 1e-4);
    assert_relative_eq!(live.y, 10.0, epsilon = 1e-4);
    assert_relative_eq!(live.x, previewed.x, epsilon = 1e-4);
    assert_relative_eq!(live.y, previewed.y, epsilon = 1e-4);
}

#[test]
fn test_relative_path_inherits_carrier_motion() {
    let mut ecs = EcsWorld::new();
    let carrier = create_moving_entity(&mut ecs.world, Vec2::ZERO, None);
    let bullet = create_moving_entity(&mut ecs.world, Vec2::new(2.0, 0.0), Some(carrier));
    ecs.world
        .insert_one(
            bullet,
            MovementPath::new(vec![
                MoveCustomPolarEmpa::new(Tfv::linear(0.0, 1.0, 1.0), Tfv::constant(0.0), 1.0, AngleOffset::Zero)
                    .into(),
                StayStillAtLastPositionEmpa::new(1.0).into(),
            ]),
        )
        .unwrap();

    for _ in 0..15 {
        update_movement_paths(&mut ecs, 0.1);
    }
    // Polar finished at (3, 0); the carrier moving drags the bullet along
    assert_relative_eq!(ecs.position(bullet).unwrap().x, 3.0, epsilon = 1e-4);
    ecs.set_position(carrier, Vec2::new(0.0, 5.0)).unwrap();
    update_movement_paths(&mut ecs, 0.1);
    let position = ecs.position(bullet).unwrap();
    assert_relative_eq!(position.x, 3.0, epsilon = 1e-4);
    assert_relative_eq!(position.y, 5.0, epsilon = 1e-4);
    assert!(ReferenceHierarchy::parent(&ecs.world, bullet).is_some());
}
