//! Missing-value imputation for one numeric field.

use serde::{Deserialize, Serialize};

use crate::analyzers::statistics::{mean, median};
use crate::config::MissingValueStrategy;
use crate::error::{FiscalError, Result};

/// Output of an imputation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Imputation {
    /// Full-length sequence with every gap filled
    pub values: Vec<f64>,
    /// Positions that were filled
    pub imputed_positions: Vec<usize>,
}

impl Imputation {
    /// Number of values that were filled.
    pub fn imputed_count(&self) -> usize {
        self.imputed_positions.len()
    }
}

/// Fills the gaps in `values` with the given strategy.
///
/// Mean, median and interpolation need at least one present value and fail
/// with `EmptySample` otherwise; zero fill always succeeds.
///
/// # Examples
///
/// ```rust
/// use fiscal_guard::analyzers::imputation::impute;
/// use fiscal_guard::config::MissingValueStrategy;
///
/// let filled = impute(&[Some(1.0), None, Some(3.0)], MissingValueStrategy::Mean).unwrap();
/// assert_eq!(filled.values, vec![1.0, 2.0, 3.0]);
/// assert_eq!(filled.imputed_count(), 1);
/// ```
pub fn impute(values: &[Option<f64>], strategy: MissingValueStrategy) -> Result<Imputation> {
    let imputed_positions: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.is_none().then_some(i))
        .collect();

    if imputed_positions.is_empty() {
        return Ok(Imputation {
            values: values.iter().flatten().copied().collect(),
            imputed_positions,
        });
    }

    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() && strategy != MissingValueStrategy::Zero {
        return Err(FiscalError::empty_sample("<imputation>"));
    }

    let filled = match strategy {
        MissingValueStrategy::Zero => fill_constant(values, 0.0),
        MissingValueStrategy::Mean => fill_constant(values, mean(&present)),
        MissingValueStrategy::Median => {
            let m = median(&present).ok_or_else(|| FiscalError::empty_sample("<imputation>"))?;
            fill_constant(values, m)
        }
        MissingValueStrategy::Interpolate => interpolate(values),
    };

    Ok(Imputation {
        values: filled,
        imputed_positions,
    })
}

fn fill_constant(values: &[Option<f64>], fill: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(fill)).collect()
}

/// Linear interpolation by position; edges take the nearest present value.
fn interpolate(values: &[Option<f64>]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for (i, v) in values.iter().enumerate() {
        if let Some(v) = v {
            out.push(*v);
            continue;
        }
        let previous = values[..i]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(j, v)| v.map(|v| (j, v)));
        let next = values[i + 1..]
            .iter()
            .enumerate()
            .find_map(|(j, v)| v.map(|v| (i + 1 + j, v)));

        let filled = match (previous, next) {
            (Some((j0, v0)), Some((j1, v1))) => {
                let t = (i - j0) as f64 / (j1 - j0) as f64;
                v0 + (v1 - v0) * t
            }
            (Some((_, v0)), None) => v0,
            (None, Some((_, v1))) => v1,
            // caller guarantees at least one present value
            (None, None) => 0.0,
        };
        out.push(filled);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_zero() {
        let sample = [Some(1.0), None, Some(3.0)];
        assert_eq!(
            impute(&sample, MissingValueStrategy::Mean).unwrap().values,
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(
            impute(&sample, MissingValueStrategy::Zero).unwrap().values,
            vec![1.0, 0.0, 3.0]
        );
    }

    #[test]
    fn test_median_ignores_missing() {
        let sample = [Some(1.0), None, Some(2.0), Some(100.0), None];
        let filled = impute(&sample, MissingValueStrategy::Median).unwrap();
        assert_eq!(filled.values, vec![1.0, 2.0, 2.0, 100.0, 2.0]);
        assert_eq!(filled.imputed_positions, vec![1, 4]);
    }

    #[test]
    fn test_interpolation_between_neighbours() {
        let sample = [Some(10.0), None, None, Some(40.0)];
        let filled = impute(&sample, MissingValueStrategy::Interpolate).unwrap();
        assert_eq!(filled.values, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_interpolation_constant_at_edges() {
        let sample = [None, Some(5.0), Some(7.0), None, None];
        let filled = impute(&sample, MissingValueStrategy::Interpolate).unwrap();
        assert_eq!(filled.values, vec![5.0, 5.0, 7.0, 7.0, 7.0]);
        assert_eq!(filled.imputed_count(), 3);
    }

    #[test]
    fn test_nothing_missing_is_unchanged() {
        let sample = [Some(4.0), Some(-1.0)];
        let filled = impute(&sample, MissingValueStrategy::Mean).unwrap();
        assert_eq!(filled.values, vec![4.0, -1.0]);
        assert_eq!(filled.imputed_count(), 0);
    }

    #[test]
    fn test_all_missing() {
        let sample = [None, None];
        assert!(matches!(
            impute(&sample, MissingValueStrategy::Median),
            Err(FiscalError::EmptySample { .. })
        ));
        assert!(impute(&sample, MissingValueStrategy::Interpolate).is_err());
        assert_eq!(
            impute(&sample, MissingValueStrategy::Zero).unwrap().values,
            vec![0.0, 0.0]
        );
    }
}
