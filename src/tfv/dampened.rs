/// Dampened easing curves
///
/// All three share the exponent `0.08 * D + 1` where `D` is a positive
/// integer dampening factor. Authored content depends on this exact form.

use super::{TfvError, TimeFunction};
use crate::format::{FormatError, Record, RecordFormat, RecordWriter};

fn dampening_exponent(dampening_factor: u32) -> f32 {
    0.08 * dampening_factor as f32 + 1.0
}

/// Starts slow and accelerates: `A t^e + start`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampenedStartTfv {
    start: f32,
    end: f32,
    max_time: f32,
    dampening_factor: u32,
}

impl DampenedStartTfv {
    pub fn new(start: f32, end: f32, max_time: f32, dampening_factor: u32) -> Self {
        debug_assert!(dampening_factor >= 1, "dampening factor must be at least 1");
        Self {
            start,
            end,
            max_time,
            dampening_factor,
        }
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    pub fn dampening_factor(&self) -> u32 {
        self.dampening_factor
    }

    pub fn set_start(&mut self, start: f32) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: f32) {
        self.end = end;
    }

    pub fn set_dampening_factor(&mut self, dampening_factor: u32) {
        debug_assert!(dampening_factor >= 1, "dampening factor must be at least 1");
        self.dampening_factor = dampening_factor;
    }

    fn value_at(&self, time: f32) -> f32 {
        if self.max_time <= 0.0 {
            return self.end;
        }
        let exponent = dampening_exponent(self.dampening_factor);
        let a = (self.end - self.start) / self.max_time.powf(exponent);
        // Clamped so the fractional power never sees a negative base
        a * time.clamp(0.0, self.max_time).powf(exponent) + self.start
    }
}

impl TimeFunction for DampenedStartTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        Ok(self.value_at(time))
    }

    fn set_max_time(&mut self, max_time: f32) {
        self.max_time = max_time;
    }

    fn name(&self) -> &'static str {
        "Dampened start"
    }
}

impl RecordFormat for DampenedStartTfv {
    const TAG: &'static str = "DampenedStartTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .f32(self.start)
            .f32(self.end)
            .f32(self.max_time)
            .u32(self.dampening_factor)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(4)?;
        let dampening_factor = record.u32(3)?;
        if dampening_factor == 0 {
            return Err(record.invalid("dampening factor must be at least 1"));
        }
        Ok(Self::new(record.f32(0)?, record.f32(1)?, record.f32(2)?, dampening_factor))
    }
}

/// Starts fast and decelerates: `-A (max_time - t)^e + end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampenedEndTfv {
    start: f32,
    end: f32,
    max_time: f32,
    dampening_factor: u32,
}

impl DampenedEndTfv {
    pub fn new(start: f32, end: f32, max_time: f32, dampening_factor: u32) -> Self {
        debug_assert!(dampening_factor >= 1, "dampening factor must be at least 1");
        Self {
            start,
            end,
            max_time,
            dampening_factor,
        }
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    pub fn dampening_factor(&self) -> u32 {
        self.dampening_factor
    }

    pub fn set_start(&mut self, start: f32) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: f32) {
        self.end = end;
    }

    pub fn set_dampening_factor(&mut self, dampening_factor: u32) {
        debug_assert!(dampening_factor >= 1, "dampening factor must be at least 1");
        self.dampening_factor = dampening_factor;
    }

    fn value_at(&self, time: f32) -> f32 {
        if self.max_time <= 0.0 {
            return self.end;
        }
        let exponent = dampening_exponent(self.dampening_factor);
        let a = (self.end - self.start) / self.max_time.powf(exponent);
        -a * (self.max_time - time.clamp(0.0, self.max_time)).powf(exponent) + self.end
    }
}

impl TimeFunction for DampenedEndTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        Ok(self.value_at(time))
    }

    fn set_max_time(&mut self, max_time: f32) {
        self.max_time = max_time;
    }

    fn name(&self) -> &'static str {
        "Dampened end"
    }
}

impl RecordFormat for DampenedEndTfv {
    const TAG: &'static str = "DampenedEndTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .f32(self.start)
            .f32(self.end)
            .f32(self.max_time)
            .u32(self.dampening_factor)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(4)?;
        let dampening_factor = record.u32(3)?;
        if dampening_factor == 0 {
            return Err(record.invalid("dampening factor must be at least 1"));
        }
        Ok(Self::new(record.f32(0)?, record.f32(1)?, record.f32(2)?, dampening_factor))
    }
}

/// S-curve: dampened start up to the midpoint value at `max_time / 2`,
/// dampened end from there to `end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleDampenedTfv {
    start: f32,
    end: f32,
    max_time: f32,
    dampening_factor: u32,
}

impl DoubleDampenedTfv {
    pub fn new(start: f32, end: f32, max_time: f32, dampening_factor: u32) -> Self {
        debug_assert!(dampening_factor >= 1, "dampening factor must be at least 1");
        Self {
            start,
            end,
            max_time,
            dampening_factor,
        }
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    pub fn dampening_factor(&self) -> u32 {
        self.dampening_factor
    }

    pub fn set_start(&mut self, start: f32) {
        self.start = start;
    }

    pub fn set_end(&mut self, end: f32) {
        self.end = end;
    }

    pub fn set_dampening_factor(&mut self, dampening_factor: u32) {
        debug_assert!(dampening_factor >= 1, "dampening factor must be at least 1");
        self.dampening_factor = dampening_factor;
    }

    fn value_at(&self, time: f32) -> f32 {
        let half = self.max_time / 2.0;
        let mid = (self.start + self.end) / 2.0;

        if time <= half {
            DampenedStartTfv::new(self.start, mid, half, self.dampening_factor).value_at(time)
        } else {
            DampenedEndTfv::new(mid, self.end, half, self.dampening_factor).value_at(time - half)
        }
    }
}

impl TimeFunction for DoubleDampenedTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        Ok(self.value_at(time))
    }

    fn set_max_time(&mut self, max_time: f32) {
        self.max_time = max_time;
    }

    fn name(&self) -> &'static str {
        "Double dampened"
    }
}

impl RecordFormat for DoubleDampenedTfv {
    const TAG: &'static str = "DoubleDampenedTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        writer
            .f32(self.start)
            .f32(self.end)
            .f32(self.max_time)
            .u32(self.dampening_factor)
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        record.expect_fields(4)?;
        let dampening_factor = record.u32(3)?;
        if dampening_factor == 0 {
            return Err(record.invalid("dampening factor must be at least 1"));
        }
        Ok(Self::new(record.f32(0)?, record.f32(1)?, record.f32(2)?, dampening_factor))
    }
}
