//! Difference-in-differences over recorded series.
//!
//! Pure functions of the series; they never see live agent state.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::DidError;
use crate::metrics::MetricsSeries;

/// Inclusive range of step indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StepWindow {
    pub start: usize,
    pub end: usize,
}

impl StepWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check the window against a series of length `len`.
    fn check(
        self,
        label: &'static str,
        len: usize,
    ) -> Result<std::ops::RangeInclusive<usize>, DidError> {
        if self.start > self.end || self.end >= len {
            return Err(DidError::InvalidWindow {
                label,
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(self.start..=self.end)
    }
}

fn window_mean(values: &[f64], range: std::ops::RangeInclusive<usize>) -> f64 {
    let slice = &values[range];
    slice.iter().sum::<f64>() / slice.len() as f64
}

fn check_aligned(treated: &[f64], control: &[f64]) -> Result<usize, DidError> {
    if treated.len() != control.len() {
        return Err(DidError::LengthMismatch {
            treated: treated.len(),
            control: control.len(),
        });
    }
    Ok(treated.len())
}

/// `(mean(treated[post]) - mean(treated[pre])) - (mean(control[post]) - mean(control[pre]))`
///
/// Empty or out-of-range windows are an error, never an average over nothing.
pub fn did(
    treated: &[f64],
    control: &[f64],
    pre: StepWindow,
    post: StepWindow,
) -> Result<f64, DidError> {
    let len = check_aligned(treated, control)?;
    let pre = pre.check("pre", len)?;
    let post = post.check("post", len)?;

    let treated_change = window_mean(treated, post.clone()) - window_mean(treated, pre.clone());
    let control_change = window_mean(control, post) - window_mean(control, pre);
    Ok(treated_change - control_change)
}

/// Per-step treated-minus-control gap, relative to its mean over `pre`.
///
/// Pre-period entries average to zero; post-period entries trace the effect
/// over time.
pub fn event_study(
    treated: &[f64],
    control: &[f64],
    pre: StepWindow,
) -> Result<Vec<f64>, DidError> {
    let len = check_aligned(treated, control)?;
    let pre = pre.check("pre", len)?;

    let gaps: Vec<f64> = treated.iter().zip(control).map(|(t, c)| t - c).collect();
    let baseline = window_mean(&gaps, pre);
    Ok(gaps.into_iter().map(|g| g - baseline).collect())
}

/// [`did`] over two named series from a run.
pub fn did_from_metrics(
    metrics: &MetricsSeries,
    treated: &str,
    control: &str,
    pre: StepWindow,
    post: StepWindow,
) -> Result<f64, DidError> {
    let t = metrics
        .get(treated)
        .ok_or_else(|| DidError::UnknownSeries(treated.to_string()))?;
    let c = metrics
        .get(control)
        .ok_or_else(|| DidError::UnknownSeries(control.to_string()))?;
    did(t, c, pre, post)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREATED: [f64; 6] = [10.0, 10.0, 10.0, 20.0, 22.0, 24.0];
    const CONTROL: [f64; 6] = [10.0; 6];

    #[test]
    fn test_did_reference_case() {
        let estimate = did(
            &TREATED,
            &CONTROL,
            StepWindow::new(0, 2),
            StepWindow::new(3, 5),
        )
        .unwrap();
        assert!((estimate - 12.0).abs() < 1e-12, "estimate = {estimate}");
    }

    #[test]
    fn test_post_window_past_end_is_invalid() {
        let err = did(
            &TREATED,
            &CONTROL,
            StepWindow::new(0, 2),
            StepWindow::new(7, 8),
        )
        .unwrap_err();
        assert!(matches!(err, DidError::InvalidWindow { label: "post", .. }));
    }

    #[test]
    fn test_inverted_window_is_invalid() {
        let err = did(
            &TREATED,
            &CONTROL,
            StepWindow::new(2, 0),
            StepWindow::new(3, 5),
        )
        .unwrap_err();
        assert!(matches!(err, DidError::InvalidWindow { label: "pre", .. }));
    }

    #[test]
    fn test_empty_series_is_invalid() {
        let err = did(&[], &[], StepWindow::new(0, 0), StepWindow::new(0, 0)).unwrap_err();
        assert!(matches!(err, DidError::InvalidWindow { len: 0, .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let err = did(
            &TREATED,
            &CONTROL[..5],
            StepWindow::new(0, 2),
            StepWindow::new(3, 4),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DidError::LengthMismatch {
                treated: 6,
                control: 5
            }
        );
    }

    #[test]
    fn test_event_study() {
        let effects = event_study(&TREATED, &CONTROL, StepWindow::new(0, 2)).unwrap();
        assert_eq!(effects, vec![0.0, 0.0, 0.0, 10.0, 12.0, 14.0]);
    }

    #[test]
    fn test_unknown_series() {
        let metrics = MetricsSeries::new();
        let err = did_from_metrics(
            &metrics,
            "treated_employment",
            "control_employment",
            StepWindow::new(0, 0),
            StepWindow::new(0, 0),
        )
        .unwrap_err();
        assert_eq!(err, DidError::UnknownSeries("treated_employment".to_string()));
    }
}
