/// Time function variables (TFVs)
///
/// Scalar quantities (distance, angle, speed, homing strength) as functions
/// of elapsed time. Every variant in `Tfv` is pure; `CurrentAngleTfv` samples
/// live entity state and is kept out of the enum on purpose.

pub mod current_angle;
pub mod curves;
pub mod dampened;
pub mod piecewise;

pub use current_angle::{AngleTarget, CurrentAngleTfv};
pub use curves::{ConstantAccelerationDistanceTfv, ConstantTfv, LinearTfv, SineWaveTfv, TranslationWrapperTfv};
pub use dampened::{DampenedEndTfv, DampenedStartTfv, DoubleDampenedTfv};
pub use piecewise::PiecewiseTfv;

use thiserror::Error;

use crate::format::{FormatError, Record, RecordFormat, TextFormat};

/// Domain errors raised while evaluating a TFV
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TfvError {
    #[error("piecewise TFV has no segments")]
    NoSegments,

    #[error("time {time} is before the first segment at {first_start}")]
    BeforeFirstSegment { time: f32, first_start: f32 },

    #[error("a segment already starts at {0}")]
    DuplicateStartTime(f32),

    #[error("segment {index} cannot start at {start_time}")]
    InvalidStartTime { index: usize, start_time: f32 },

    #[error("segment index {index} out of range for {len} segments")]
    SegmentIndex { index: usize, len: usize },
}

/// A scalar function of time on `[0, max_time]`
pub trait TimeFunction {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError>;

    /// Rescale the curve's domain; no-op for curves without one
    fn set_max_time(&mut self, max_time: f32);

    /// Display name for editors
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tfv {
    Constant(ConstantTfv),
    Linear(LinearTfv),
    SineWave(SineWaveTfv),
    ConstantAccelerationDistance(ConstantAccelerationDistanceTfv),
    DampenedStart(DampenedStartTfv),
    DampenedEnd(DampenedEndTfv),
    DoubleDampened(DoubleDampenedTfv),
    TranslationWrapper(TranslationWrapperTfv),
    Piecewise(PiecewiseTfv),
}

impl Tfv {
    pub fn constant(value: f32) -> Self {
        Tfv::Constant(ConstantTfv::new(value))
    }

    pub fn linear(start: f32, end: f32, max_time: f32) -> Self {
        Tfv::Linear(LinearTfv::new(start, end, max_time))
    }

    /// Shift by `translation`, folding into an existing wrapper if there is one
    pub fn translated(self, translation: f32) -> Self {
        Tfv::TranslationWrapper(TranslationWrapperTfv::new(translation, self))
    }

    fn as_time_function(&self) -> &dyn TimeFunction {
        match self {
            Tfv::Constant(t) => t,
            Tfv::Linear(t) => t,
            Tfv::SineWave(t) => t,
            Tfv::ConstantAccelerationDistance(t) => t,
            Tfv::DampenedStart(t) => t,
            Tfv::DampenedEnd(t) => t,
            Tfv::DoubleDampened(t) => t,
            Tfv::TranslationWrapper(t) => t,
            Tfv::Piecewise(t) => t,
        }
    }

    fn as_time_function_mut(&mut self) -> &mut dyn TimeFunction {
        match self {
            Tfv::Constant(t) => t,
            Tfv::Linear(t) => t,
            Tfv::SineWave(t) => t,
            Tfv::ConstantAccelerationDistance(t) => t,
            Tfv::DampenedStart(t) => t,
            Tfv::DampenedEnd(t) => t,
            Tfv::DoubleDampened(t) => t,
            Tfv::TranslationWrapper(t) => t,
            Tfv::Piecewise(t) => t,
        }
    }
}

impl TimeFunction for Tfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        self.as_time_function().evaluate(time)
    }

    fn set_max_time(&mut self, max_time: f32) {
        self.as_time_function_mut().set_max_time(max_time);
    }

    fn name(&self) -> &'static str {
        self.as_time_function().name()
    }
}

impl TextFormat for Tfv {
    fn format(&self) -> String {
        match self {
            Tfv::Constant(t) => t.format(),
            Tfv::Linear(t) => t.format(),
            Tfv::SineWave(t) => t.format(),
            Tfv::ConstantAccelerationDistance(t) => t.format(),
            Tfv::DampenedStart(t) => t.format(),
            Tfv::DampenedEnd(t) => t.format(),
            Tfv::DoubleDampened(t) => t.format(),
            Tfv::TranslationWrapper(t) => t.format(),
            Tfv::Piecewise(t) => t.format(),
        }
    }

    fn load(text: &str) -> Result<Self, FormatError> {
        let record = Record::parse(text)?;
        Ok(match record.tag() {
            ConstantTfv::TAG => Tfv::Constant(ConstantTfv::read_fields(&record)?),
            LinearTfv::TAG => Tfv::Linear(LinearTfv::read_fields(&record)?),
            SineWaveTfv::TAG => Tfv::SineWave(SineWaveTfv::read_fields(&record)?),
            ConstantAccelerationDistanceTfv::TAG => Tfv::ConstantAccelerationDistance(
                ConstantAccelerationDistanceTfv::read_fields(&record)?,
            ),
            DampenedStartTfv::TAG => Tfv::DampenedStart(DampenedStartTfv::read_fields(&record)?),
            DampenedEndTfv::TAG => Tfv::DampenedEnd(DampenedEndTfv::read_fields(&record)?),
            DoubleDampenedTfv::TAG => Tfv::DoubleDampened(DoubleDampenedTfv::read_fields(&record)?),
            TranslationWrapperTfv::TAG => {
                Tfv::TranslationWrapper(TranslationWrapperTfv::read_fields(&record)?)
            }
            PiecewiseTfv::TAG => Tfv::Piecewise(PiecewiseTfv::read_fields(&record)?),
            CurrentAngleTfv::NAME => return Err(FormatError::NotSerializable(CurrentAngleTfv::NAME)),
            other => {
                return Err(FormatError::UnknownTag {
                    family: "TFV",
                    tag: other.to_string(),
                })
            }
        })
    }
}
