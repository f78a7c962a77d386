/// Piecewise time function
///
/// Segments are `(start_time, Tfv)` pairs sorted ascending by start time.
/// The first segment always starts at 0 and no two segments share a start.

use tracing::debug;

use super::{TfvError, TimeFunction, Tfv};
use crate::format::{FormatError, Record, RecordFormat, RecordWriter};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PiecewiseTfv {
    segments: Vec<(f32, Tfv)>,
}

impl PiecewiseTfv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single segment spanning the whole domain
    pub fn from_tfv(tfv: Tfv) -> Self {
        Self {
            segments: vec![(0.0, tfv)],
        }
    }

    pub fn segments(&self) -> &[(f32, Tfv)] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&(f32, Tfv)> {
        self.segments.get(index)
    }

    /// Mutable access to a segment's curve; start times go through
    /// `change_segment_start_time` so ordering is preserved
    pub fn segment_tfv_mut(&mut self, index: usize) -> Option<&mut Tfv> {
        self.segments.get_mut(index).map(|(_, tfv)| tfv)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Evaluate and report which segment was active
    pub fn piecewise_evaluate(&self, time: f32) -> Result<(usize, f32), TfvError> {
        let index = self.active_segment(time)?;
        let (start, tfv) = &self.segments[index];
        Ok((index, tfv.evaluate(time - start)?))
    }

    /// Index of the last segment starting at or before `time`
    pub fn active_segment(&self, time: f32) -> Result<usize, TfvError> {
        let first_start = match self.segments.first() {
            Some((start, _)) => *start,
            None => return Err(TfvError::NoSegments),
        };
        if time < first_start {
            return Err(TfvError::BeforeFirstSegment { time, first_start });
        }

        Ok(self
            .segments
            .partition_point(|(start, _)| *start <= time)
            .saturating_sub(1))
    }

    /// Insert a segment, keeping the list sorted. Returns the new segment's index.
    ///
    /// The first segment inserted into an empty list always starts at 0.
    pub fn insert_segment(&mut self, start_time: f32, tfv: Tfv) -> Result<usize, TfvError> {
        if self.segments.is_empty() {
            self.segments.push((0.0, tfv));
            return Ok(0);
        }
        self.check_start_time(start_time, None)?;

        let index = self.segments.partition_point(|(start, _)| *start < start_time);
        self.segments.insert(index, (start_time, tfv));
        debug!("Inserted piecewise segment at {} (index {})", start_time, index);
        Ok(index)
    }

    /// Remove a segment. If the first segment is removed, the next one is
    /// moved to start at 0.
    pub fn remove_segment(&mut self, index: usize) -> Result<(f32, Tfv), TfvError> {
        if index >= self.segments.len() {
            return Err(TfvError::SegmentIndex {
                index,
                len: self.segments.len(),
            });
        }

        let removed = self.segments.remove(index);
        if let Some(first) = self.segments.first_mut() {
            first.0 = 0.0;
        }
        Ok(removed)
    }

    /// Move a segment to a new start time. Returns the segment's index after
    /// re-sorting so callers can keep tracking a selected segment.
    ///
    /// The first segment is pinned at 0.
    pub fn change_segment_start_time(
        &mut self,
        index: usize,
        start_time: f32,
    ) -> Result<usize, TfvError> {
        if index >= self.segments.len() {
            return Err(TfvError::SegmentIndex {
                index,
                len: self.segments.len(),
            });
        }
        if index == 0 {
            if start_time == 0.0 {
                return Ok(0);
            }
            return Err(TfvError::InvalidStartTime { index, start_time });
        }
        self.check_start_time(start_time, Some(index))?;

        let (_, tfv) = self.segments.remove(index);
        let new_index = self.segments.partition_point(|(start, _)| *start < start_time);
        self.segments.insert(new_index, (start_time, tfv));
        if new_index != index {
            debug!("Piecewise segment {} moved to index {}", index, new_index);
        }
        Ok(new_index)
    }

    /// Non-first segments must start strictly after 0 at a free time
    fn check_start_time(&self, start_time: f32, ignore: Option<usize>) -> Result<(), TfvError> {
        if !(start_time > 0.0) || !start_time.is_finite() {
            return Err(TfvError::InvalidStartTime {
                index: ignore.unwrap_or(self.segments.len()),
                start_time,
            });
        }
        let taken = self
            .segments
            .iter()
            .enumerate()
            .any(|(i, (start, _))| Some(i) != ignore && *start == start_time);
        if taken {
            return Err(TfvError::DuplicateStartTime(start_time));
        }
        Ok(())
    }
}

impl TimeFunction for PiecewiseTfv {
    fn evaluate(&self, time: f32) -> Result<f32, TfvError> {
        self.piecewise_evaluate(time).map(|(_, value)| value)
    }

    /// Rescales only the last segment, which runs to the end of the domain
    fn set_max_time(&mut self, max_time: f32) {
        if let Some((start, tfv)) = self.segments.last_mut() {
            if max_time > *start {
                tfv.set_max_time(max_time - *start);
            }
        }
    }

    fn name(&self) -> &'static str {
        "Piecewise"
    }
}

impl RecordFormat for PiecewiseTfv {
    const TAG: &'static str = "PiecewiseTFV";

    fn write_fields(&self, writer: RecordWriter) -> RecordWriter {
        self.segments
            .iter()
            .fold(writer, |w, (start, tfv)| w.f32(*start).nested(tfv))
    }

    fn read_fields(record: &Record<'_>) -> Result<Self, FormatError> {
        if record.len() % 2 != 0 {
            return Err(record.invalid("segments must be start time and curve pairs"));
        }

        let mut piecewise = Self::new();
        for i in (0..record.len()).step_by(2) {
            let start = record.f32(i)?;
            if i == 0 && start != 0.0 {
                return Err(record.invalid("first segment must start at 0"));
            }
            let tfv = record.nested::<Tfv>(i + 1)?;
            piecewise
                .insert_segment(start, tfv)
                .map_err(|e| record.invalid(e.to_string()))?;
        }
        Ok(piecewise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfv::{ConstantTfv, LinearTfv};

    fn constant(value: f32) -> Tfv {
        Tfv::Constant(ConstantTfv::new(value))
    }

    fn assert_invariants(piecewise: &PiecewiseTfv) {
        let starts: Vec<f32> = piecewise.segments().iter().map(|(s, _)| *s).collect();
        if let Some(first) = starts.first() {
            assert_eq!(*first, 0.0);
        }
        assert!(starts.windows(2).all(|w| w[0] < w[1]), "unsorted: {starts:?}");
    }

    #[test]
    fn test_evaluates_active_segment_relative_to_its_start() {
        let mut piecewise = PiecewiseTfv::from_tfv(constant(1.0));
        piecewise
            .insert_segment(2.0, Tfv::Linear(LinearTfv::new(0.0, 10.0, 1.0)))
            .unwrap();

        assert_eq!(piecewise.piecewise_evaluate(1.0).unwrap(), (0, 1.0));
        assert_eq!(piecewise.piecewise_evaluate(2.0).unwrap(), (1, 0.0));
        assert_eq!(piecewise.piecewise_evaluate(2.5).unwrap(), (1, 5.0));
    }

    #[test]
    fn test_empty_and_early_evaluation_are_errors() {
        let empty = PiecewiseTfv::new();
        assert_eq!(empty.evaluate(0.0), Err(TfvError::NoSegments));

        let piecewise = PiecewiseTfv::from_tfv(constant(1.0));
        assert!(matches!(
            piecewise.evaluate(-0.5),
            Err(TfvError::BeforeFirstSegment { .. })
        ));
    }

    #[test]
    fn test_first_insert_starts_at_zero() {
        let mut piecewise = PiecewiseTfv::new();
        assert_eq!(piecewise.insert_segment(3.0, constant(1.0)).unwrap(), 0);
        assert_eq!(piecewise.segment(0).unwrap().0, 0.0);
    }

    #[test]
    fn test_insert_returns_sorted_index() {
        let mut piecewise = PiecewiseTfv::from_tfv(constant(0.0));
        assert_eq!(piecewise.insert_segment(5.0, constant(5.0)).unwrap(), 1);
        assert_eq!(piecewise.insert_segment(2.0, constant(2.0)).unwrap(), 1);
        assert_eq!(piecewise.insert_segment(9.0, constant(9.0)).unwrap(), 3);
        assert_invariants(&piecewise);

        assert_eq!(
            piecewise.insert_segment(5.0, constant(0.0)),
            Err(TfvError::DuplicateStartTime(5.0))
        );
        assert!(piecewise.insert_segment(0.0, constant(0.0)).is_err());
    }

    #[test]
    fn test_change_start_time_reorders() {
        let mut piecewise = PiecewiseTfv::from_tfv(constant(0.0));
        piecewise.insert_segment(1.0, constant(1.0)).unwrap();
        piecewise.insert_segment(2.0, constant(2.0)).unwrap();
        piecewise.insert_segment(3.0, constant(3.0)).unwrap();

        let new_index = piecewise.change_segment_start_time(1, 2.5).unwrap();
        assert_eq!(new_index, 2);
        assert_eq!(piecewise.segment(2).unwrap().1, constant(1.0));
        assert_invariants(&piecewise);

        assert!(piecewise.change_segment_start_time(0, 1.0).is_err());
        assert_eq!(
            piecewise.change_segment_start_time(1, 3.0),
            Err(TfvError::DuplicateStartTime(3.0))
        );
    }

    #[test]
    fn test_removing_first_segment_rebases_next() {
        let mut piecewise = PiecewiseTfv::from_tfv(constant(0.0));
        piecewise.insert_segment(4.0, constant(4.0)).unwrap();

        let (start, removed) = piecewise.remove_segment(0).unwrap();
        assert_eq!(start, 0.0);
        assert_eq!(removed, constant(0.0));
        assert_eq!(piecewise.segment(0).unwrap().0, 0.0);
        assert_eq!(piecewise.evaluate(0.0).unwrap(), 4.0);

        piecewise.remove_segment(0).unwrap();
        assert!(piecewise.is_empty());
        assert!(piecewise.remove_segment(0).is_err());
    }

    #[test]
    fn test_invariants_hold_under_mixed_edits() {
        let mut piecewise = PiecewiseTfv::new();
        let edits: [(u8, f32); 12] = [
            (0, 7.0), (0, 3.0), (0, 5.0), (2, 1.0), (1, 0.0), (0, 0.5),
            (2, 9.0), (0, 4.0), (1, 2.0), (2, 0.25), (1, 0.0), (0, 6.0),
        ];

        for (op, value) in edits {
            match op {
                0 => {
                    let _ = piecewise.insert_segment(value, constant(value));
                }
                1 => {
                    let _ = piecewise.remove_segment(value as usize);
                }
                _ => {
                    let last = piecewise.len().saturating_sub(1);
                    let _ = piecewise.change_segment_start_time(last, value);
                }
            }
            assert_invariants(&piecewise);
        }
    }

    #[test]
    fn test_set_max_time_rescales_last_segment() {
        let mut piecewise = PiecewiseTfv::from_tfv(constant(0.0));
        piecewise
            .insert_segment(2.0, Tfv::Linear(LinearTfv::new(0.0, 10.0, 1.0)))
            .unwrap();

        piecewise.set_max_time(4.0);
        assert_eq!(piecewise.evaluate(3.0).unwrap(), 5.0);
    }
}
