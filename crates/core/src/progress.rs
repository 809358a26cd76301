//! Progress checkpoints and arithmetic for pipeline jobs.
//!
//! Progress is an integer percentage in `[0, 100]`. Fractional values are
//! floored before they are written.

use crate::error::CoreError;

pub const PROGRESS_MIN: i16 = 0;
pub const PROGRESS_MAX: i16 = 100;

/// Written when a stage begins its first remote call.
pub const PROGRESS_STARTED: i16 = 10;

/// Written by decomposition once the layer analysis has come back.
pub const PROGRESS_ANALYSIS_DONE: i16 = 50;

/// Written by export preparation before it completes.
pub const PROGRESS_EXPORT_HALFWAY: i16 = 50;

/// Expression generation never reports more than this before completing.
pub const PROGRESS_EXPRESSION_CAP: i16 = 90;

/// Step size of the demo simulator.
pub const DEMO_PROGRESS_STEP: i16 = 20;

/// Reject values outside `[0, 100]`.
pub fn validate_progress(progress: i16) -> Result<(), CoreError> {
    if (PROGRESS_MIN..=PROGRESS_MAX).contains(&progress) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "progress must be between {PROGRESS_MIN} and {PROGRESS_MAX}, got {progress}"
        )))
    }
}

/// Floor a fractional percentage and clamp it into `[0, 100]`.
pub fn floor_progress(value: f64) -> i16 {
    if value.is_nan() {
        return PROGRESS_MIN;
    }
    value
        .floor()
        .clamp(f64::from(PROGRESS_MIN), f64::from(PROGRESS_MAX)) as i16
}

/// Tracks expression-generation progress across a fixed number of pairs.
///
/// Starts at [`PROGRESS_STARTED`] and spreads the remaining range up to
/// [`PROGRESS_EXPRESSION_CAP`] evenly over `total` pairs. Each value is
/// computed from the number of finished pairs so rounding never drifts.
#[derive(Debug, Clone)]
pub struct ExpressionProgress {
    done: u32,
    total: u32,
}

impl ExpressionProgress {
    pub fn new(total: usize) -> Self {
        Self {
            done: 0,
            total: u32::try_from(total).unwrap_or(u32::MAX).max(1),
        }
    }

    /// Record one finished pair and return the value to write.
    pub fn advance(&mut self) -> i16 {
        self.done = self.done.saturating_add(1);
        let span = f64::from(PROGRESS_EXPRESSION_CAP - PROGRESS_STARTED);
        let value = f64::from(PROGRESS_STARTED)
            + span * f64::from(self.done) / f64::from(self.total);
        floor_progress(value).min(PROGRESS_EXPRESSION_CAP)
    }
}

/// Progress values the demo simulator writes, `0, 20, ..., 100`.
pub fn demo_progress_steps() -> impl Iterator<Item = i16> {
    (PROGRESS_MIN..=PROGRESS_MAX).step_by(DEMO_PROGRESS_STEP as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_progress_bounds() {
        assert!(validate_progress(0).is_ok());
        assert!(validate_progress(100).is_ok());
        assert!(validate_progress(-1).is_err());
        assert!(validate_progress(101).is_err());
    }

    #[test]
    fn floor_progress_floors_and_clamps() {
        assert_eq!(floor_progress(13.99), 13);
        assert_eq!(floor_progress(-4.0), 0);
        assert_eq!(floor_progress(250.0), 100);
        assert_eq!(floor_progress(f64::NAN), 0);
    }

    #[test]
    fn expression_progress_is_monotonic_and_capped() {
        let mut progress = ExpressionProgress::new(21);
        let mut last = PROGRESS_STARTED;
        let mut values = Vec::new();
        for _ in 0..21 {
            let v = progress.advance();
            assert!(v >= last, "{v} < {last}");
            assert!(v <= PROGRESS_EXPRESSION_CAP);
            last = v;
            values.push(v);
        }
        assert_eq!(values[0], 13);
        assert_eq!(*values.last().unwrap(), 90);
    }

    #[test]
    fn expression_progress_never_exceeds_cap_with_extra_steps() {
        let mut progress = ExpressionProgress::new(2);
        progress.advance();
        progress.advance();
        assert_eq!(progress.advance(), PROGRESS_EXPRESSION_CAP);
    }

    #[test]
    fn demo_steps_are_twenty_apart() {
        let steps: Vec<i16> = demo_progress_steps().collect();
        assert_eq!(steps, vec![0, 20, 40, 60, 80, 100]);
    }
}
