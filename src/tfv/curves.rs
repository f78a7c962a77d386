/// Closed-form time functions
///
/// Constant, linear, sine, constant-acceleration and translated curves.

use std::f32::consts::TAU;

use super::{TfvError, TimeFunction, Tfv};
use crate::format::{FormatError, Record, RecordFormat, RecordWriter};

/// `value` at every time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTfv {
    pub value: f32,
}

impl ConstantTfv {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl TimeFunction for ConstantTfv {
    fn evaluate(&self, _time: f32) -> Result<f32, TfvError> {
        Ok(self.value)
    }

    fn set_max_time(&mut self, _max_time: f32) {}

    fn name(&self) -> &'static str {
        "Constant"
    }
}

impl RecordFormat for ConstantTfv {
    const TAG: &'static str = "ConstantTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer.f32(self.value)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(1)?;
        Ok(Self::new(record.f32(0)?))
    }
}

/// Straight line from `start` at t=0 to `end` at t=max_time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTfv {
    pub start: f32,
    pub end: f32,
    pub max_time: f32,
}

impl LinearTfv {
    pub fn new(start: f32, end: f32, max_time: f32) -> Self {
        Self { start, end, max_time }
    }
}

impl TimeFunction for LinearTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        if self.max_time == 0.0 {
            return Ok(self.end);
        }
        Ok(self.start + (time / self.max_time) * (self.end - self.start))
    }

    fn set_max_time(&mut self, max_time: f32) {
        self.max_time = max_time;
    }

    fn name(&self) -> &'static str {
        "Linear"
    }
}

impl RecordFormat for LinearTfv {
    const TAG: &'static str = "LinearTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer.f32(self.start).f32(self.end).f32(self.max_time)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(3)?;
        Ok(Self::new(record.f32(0)?, record.f32(1)?, record.f32(2)?))
    }
}

/// `amplitude * sin(t * 2π / period + phase_shift) + value_shift`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineWaveTfv {
    pub period: f32,
    pub amplitude: f32,
    pub value_shift: f32,
    pub phase_shift: f32,
}

impl SineWaveTfv {
    pub fn new(period: f32, amplitude: f32, value_shift: f32, phase_shift: f32) -> Self {
        Self {
            period,
            amplitude,
            value_shift,
            phase_shift,
        }
    }
}

impl TimeFunction for SineWaveTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        Ok(self.amplitude * (time * TAU / self.period + self.phase_shift).sin() + self.value_shift)
    }

    // Periodic, so the domain does not rescale
    fn set_max_time(&mut self, _max_time: f32) {}

    fn name(&self) -> &'static str {
        "Sine wave"
    }
}

impl RecordFormat for SineWaveTfv {
    const TAG: &'static str = "SineWaveTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .f32(self.period)
            .f32(self.amplitude)
            .f32(self.value_shift)
            .f32(self.phase_shift)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(4)?;
        Ok(Self::new(
            record.f32(0)?,
            record.f32(1)?,
            record.f32(2)?,
            record.f32(3)?,
        ))
    }
}

/// Distance travelled under constant acceleration: `d0 + v0 t + 0.5 a t²`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantAccelerationDistanceTfv {
    pub initial_distance: f32,
    pub initial_velocity: f32,
    pub acceleration: f32,
}

impl ConstantAccelerationDistanceTfv {
    pub fn new(initial_distance: f32, initial_velocity: f32, acceleration: f32) -> Self {
        Self {
            initial_distance,
            initial_velocity,
            acceleration,
        }
    }
}

impl TimeFunction for ConstantAccelerationDistanceTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        Ok(self.initial_distance
            + self.initial_velocity * time
            + 0.5 * self.acceleration * time * time)
    }

    fn set_max_time(&mut self, _max_time: f32) {}

    fn name(&self) -> &'static str {
        "Constant acceleration"
    }
}

impl RecordFormat for ConstantAccelerationDistanceTfv {
    const TAG: &'static str = "ConstantAccelerationDistanceTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .f32(self.initial_distance)
            .f32(self.initial_velocity)
            .f32(self.acceleration)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(3)?;
        Ok(Self::new(record.f32(0)?, record.f32(1)?, record.f32(2)?))
    }
}

/// `translation + wrapped(t)`
///
/// Never wraps another translation wrapper; construction folds nested
/// wrappers into a single translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationWrapperTfv {
    translation: f32,
    wrapped: Box<Tfv>,
}

impl TranslationWrapperTfv {
    pub fn new(translation: f32, wrapped: Tfv) -> Self {
        let (translation, wrapped) = match wrapped {
            Tfv::TranslationWrapper(inner) => (translation + inner.translation, inner.wrapped),
            other => (translation, Box::new(other)),
        };
        debug_assert!(!matches!(*wrapped, Tfv::TranslationWrapper(_)));

        Self {
            translation,
            wrapped,
        }
    }

    pub fn translation(&self) -> f32 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: f32) {
        self.translation = translation;
    }

    pub fn wrapped(&self) -> &Tfv {
        &self.wrapped
    }

    pub fn into_wrapped(self) -> Tfv {
        *self.wrapped
    }
}

impl TimeFunction for TranslationWrapperTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        Ok(self.translation + self.wrapped.evaluate(time)?)
    }

    fn set_max_time(&mut self, max_time: f32) {
        self.wrapped.set_max_time(max_time);
    }

    fn name(&self) -> &'static str {
        "Translation wrapper"
    }
}

impl RecordFormat for TranslationWrapperTfv {
    const TAG: &'static str = "TranslationWrapperTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer.f32(self.translation).nested(self.wrapped.as_ref())
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(2)?;
        Ok(Self::new(record.f32(0)?, record.nested::<Tfv>(1)?))
    }
}
