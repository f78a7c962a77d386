/// Every serializable value must survive format -> load unchanged

use danmaku_kinematics::action::{
    AngleOffset, DetachFromParentEmpa, EmpAction, MoveCustomBezierEmpa, MoveCustomPolarEmpa, MoveGlobalHomingEmpa,
    MovePlayerHomingEmpa, StayStillAtLastPositionEmpa,
};
use danmaku_kinematics::format::{FormatError, TextFormat};
use danmaku_kinematics::tfv::{
    ConstantAccelerationDistanceTfv, DampenedEndTfv, DampenedStartTfv, DoubleDampenedTfv, PiecewiseTfv, SineWaveTfv,
    Tfv,
};
use glam::Vec2;

fn assert_round_trip<T: TextFormat + PartialEq + std::fmt::Debug>(value: &T) {
    let text = value.format();
    let loaded = T::load(&text).unwrap_or_else(|e| panic!("failed to reload {}: {}", text, e));
    assert_eq!(&loaded, value, "round trip changed {}", text);
    assert_eq!(loaded.format(), text);
}

fn sample_tfvs() -> Vec<Tfv> {
    let mut piecewise = PiecewiseTfv::new();
    piecewise.insert_segment(0.0, Tfv::constant(2.0)).unwrap();
    piecewise
        .insert_segment(0.75, Tfv::DampenedStart(DampenedStartTfv::new(2.0, -1.0, 1.25, 3)))
        .unwrap();

    vec![
        Tfv::constant(-0.1),
        Tfv::linear(0.0, 10.0, 5.0),
        Tfv::SineWave(SineWaveTfv::new(1.5, 20.0, 0.3, 0.785)),
        Tfv::ConstantAccelerationDistance(ConstantAccelerationDistanceTfv::new(1.0, -2.5, 9.81)),
        Tfv::DampenedStart(DampenedStartTfv::new(0.0, 1.0, 2.0, 1)),
        Tfv::DampenedEnd(DampenedEndTfv::new(5.0, 0.0, 0.333, 7)),
        Tfv::DoubleDampened(DoubleDampenedTfv::new(-3.0, 3.0, 1.0, 2)),
        Tfv::linear(1.0, 2.0, 3.0).translated(0.1),
        Tfv::Piecewise(piecewise),
    ]
}

#[test]
fn test_every_tfv_round_trips() {
    for tfv in sample_tfvs() {
        assert_round_trip(&tfv);
    }
}

#[test]
fn test_every_angle_offset_round_trips() {
    for offset in [
        AngleOffset::Zero,
        AngleOffset::Constant { value: 1.2 },
        AngleOffset::ToPlayer { x_offset: -4.0, y_offset: 0.5 },
        AngleOffset::ToGlobalPosition { x: 100.0, y: -7.25 },
        AngleOffset::PlayerFacing,
    ] {
        assert_round_trip(&offset);
    }
}

#[test]
fn test_every_action_round_trips() {
    let tfvs = sample_tfvs();
    let actions: Vec<EmpAction> = vec![
        DetachFromParentEmpa.into(),
        StayStillAtLastPositionEmpa::new(0.4).into(),
        MoveCustomPolarEmpa::new(
            tfvs[8].clone(),
            tfvs[2].clone(),
            2.0,
            AngleOffset::ToPlayer { x_offset: 1.0, y_offset: 2.0 },
        )
        .into(),
        MoveCustomBezierEmpa::new(
            1.5,
            vec![Vec2::ZERO, Vec2::new(3.0, 4.0), Vec2::new(-1.0, 8.0), Vec2::new(0.5, 0.25)],
            AngleOffset::PlayerFacing,
        )
        .into(),
        MovePlayerHomingEmpa::new(tfvs[1].clone(), tfvs[7].clone(), 5.0).into(),
        MoveGlobalHomingEmpa::new(Tfv::constant(0.2), tfvs[3].clone(), 3.0, Vec2::new(-50.0, 75.5)).into(),
    ];

    for action in &actions {
        assert_round_trip(action);
    }
}

#[test]
fn test_nested_records_are_fields() {
    let text = "MovePlayerHomingEMPA(ConstantTFV(1))(LinearTFV(0)(10)(5))(5)";
    let action = EmpAction::load(text).unwrap();
    assert_eq!(action.format(), text);
}

#[test]
fn test_malformed_input_is_rejected() {
    assert!(matches!(
        Tfv::load("ConstantTFV(1"),
        Err(FormatError::Syntax { .. })
    ));
    assert!(matches!(
        Tfv::load("ConstantTFV(1)junk"),
        Err(FormatError::Syntax { .. })
    ));
    assert!(matches!(
        Tfv::load("LinearTFV(0)(ten)(5)"),
        Err(FormatError::InvalidNumber { .. })
    ));
    assert!(matches!(
        Tfv::load("CurrentAngleTFV(0)(0)"),
        Err(FormatError::NotSerializable(_))
    ));
    assert!(matches!(
        EmpAction::load("StayStillAtLastPositionEMPA(1)(2)"),
        Err(FormatError::FieldCount { .. })
    ));
}
