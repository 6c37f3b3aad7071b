//! Aggregates computed over result series.

use serde::Serialize;

use crate::error::{Result, SimError};

/// Arithmetic mean. An empty slice is an error rather than `NaN`.
pub fn mean(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(SimError::EmptySeries);
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Relative improvement of `optimized` over `baseline`, in percent.
pub fn reduction_percent(baseline: f64, optimized: f64) -> Result<f64> {
    if baseline == 0.0 {
        return Err(SimError::ZeroBaseline);
    }
    Ok((baseline - optimized) / baseline * 100.0)
}

/// Five-number description of a group of samples, used for per-class comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(samples: &[f64]) -> Result<Self> {
        let mean = mean(samples)?;
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Ok(Self {
            count: n,
            mean,
            min: sorted[0],
            median,
            max: sorted[n - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_samples() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), Ok(3.0));
    }

    #[test]
    fn mean_of_nothing_is_an_error() {
        assert_eq!(mean(&[]), Err(SimError::EmptySeries));
        assert_eq!(Summary::of(&[]), Err(SimError::EmptySeries));
    }

    #[test]
    fn reduction() {
        assert_eq!(reduction_percent(200.0, 150.0), Ok(25.0));
        assert_eq!(reduction_percent(100.0, 120.0), Ok(-20.0));
        assert_eq!(reduction_percent(0.0, 1.0), Err(SimError::ZeroBaseline));
    }

    #[test]
    fn summary_odd_and_even() {
        let odd = Summary::of(&[5.0, 1.0, 3.0]).unwrap();
        assert_eq!((odd.count, odd.min, odd.median, odd.max), (3, 1.0, 3.0, 5.0));

        let even = Summary::of(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(even.median, 2.5);
        assert_eq!(even.mean, 2.5);
    }
}
