use std::f32::consts::FRAC_PI_2;

use anyhow::Context;
use glam::Vec2;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use danmaku_kinematics::action::{
    self, AngleOffset, DetachFromParentEmpa, EmpAction, MoveCustomBezierEmpa, MoveCustomPolarEmpa,
    MovePlayerHomingEmpa, MovementAction, StandaloneContext, StayStillAtLastPositionEmpa,
};
use danmaku_kinematics::config::KinematicsConfig;
use danmaku_kinematics::ecs::init::{create_moving_entity, create_player_entity, create_reference_anchor};
use danmaku_kinematics::ecs::{EcsWorld, EntityQuery};
use danmaku_kinematics::format::TextFormat;
use danmaku_kinematics::movement::{update_movement_paths, MovementPath};
use danmaku_kinematics::tfv::{DampenedEndTfv, Tfv};

const CONFIG_PATH: &str = "config/kinematics.json";

/// Enemy entrance: glide down, pause, sweep sideways, then home in
fn demo_script() -> Vec<EmpAction> {
    let mut script: Vec<EmpAction> = vec![
        MoveCustomPolarEmpa::new(
            Tfv::DampenedEnd(DampenedEndTfv::new(0.0, 120.0, 1.5, 4)),
            Tfv::constant(-FRAC_PI_2),
            1.5,
            AngleOffset::Zero,
        )
        .into(),
        StayStillAtLastPositionEmpa::new(0.5).into(),
        MoveCustomBezierEmpa::new(
            1.0,
            vec![Vec2::ZERO, Vec2::new(40.0, 60.0), Vec2::new(80.0, 0.0)],
            AngleOffset::Zero,
        )
        .into(),
        DetachFromParentEmpa.into(),
        MovePlayerHomingEmpa::new(Tfv::constant(0.05), Tfv::constant(90.0), 2.0).into(),
    ];
    // Stretch the homing curves to the duration actually wanted
    if let Some(last) = script.last_mut() {
        last.set_time(2.5);
    }
    script
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== Danmaku Kinematics Demo ===");
    let config = KinematicsConfig::load_or_default(CONFIG_PATH);
    let demo = &config.demo;

    // Scripts are stored as text; make sure this one survives the trip
    let script: Vec<EmpAction> = demo_script()
        .iter()
        .map(|a| {
            let text = a.format();
            debug!("{}", text);
            EmpAction::load(&text).with_context(|| format!("reloading {}", text))
        })
        .collect::<anyhow::Result<_>>()?;
    info!(
        "Loaded {} actions, {:.2}s total",
        script.len(),
        action::total_time(&script)
    );

    let preview_ctx = StandaloneContext::new(demo.spawn_position, demo.player_position, config.default_player_facing);
    let preview = action::preview_path(&script, &preview_ctx, config.preview_step)?;
    if let Some((time, offset)) = preview.samples().last() {
        info!(
            "Preview ends at {:?} after {:.2}s",
            demo.spawn_position + *offset,
            time
        );
    }

    let mut ecs = EcsWorld::with_config(&config);
    create_player_entity(&mut ecs.world, demo.player_position, Vec2::ZERO);
    let anchor = create_reference_anchor(&mut ecs.world, demo.spawn_position);
    let enemy = create_moving_entity(&mut ecs.world, demo.spawn_position, Some(anchor));
    ecs.world
        .insert_one(enemy, MovementPath::new(script))
        .context("attaching movement path")?;

    let dt = config.max_physics_step;
    for frame in 1..=demo.frames {
        update_movement_paths(&mut ecs, dt);

        if demo.log_interval > 0 && frame % demo.log_interval == 0 {
            let position = ecs.position(enemy)?;
            info!(
                "t={:.2}s enemy at ({:.1}, {:.1})",
                frame as f32 * dt,
                position.x,
                position.y
            );
        }
    }

    info!("Simulation complete, {} entities alive", ecs.entity_count());
    Ok(())
}
