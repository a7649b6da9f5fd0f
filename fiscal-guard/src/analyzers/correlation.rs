//! Pearson correlation between numeric fields.
//!
//! Pairs are computed over records where both fields hold a valid number.
//! Pairs with fewer than two co-present values, or with zero variance in
//! either field, have no defined coefficient and are omitted.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::record::Record;

/// Minimum co-present values for a defined coefficient.
pub const MIN_PAIRED_VALUES: usize = 2;

/// Qualitative strength of a correlation, by absolute coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    /// |r| < 0.2
    VeryWeak,
    /// |r| < 0.4
    Weak,
    /// |r| < 0.6
    Moderate,
    /// |r| < 0.8
    Strong,
    /// |r| >= 0.8
    VeryStrong,
}

impl CorrelationStrength {
    /// Classifies a coefficient by its absolute value.
    pub fn from_coefficient(r: f64) -> Self {
        let r = r.abs();
        if r < 0.2 {
            CorrelationStrength::VeryWeak
        } else if r < 0.4 {
            CorrelationStrength::Weak
        } else if r < 0.6 {
            CorrelationStrength::Moderate
        } else if r < 0.8 {
            CorrelationStrength::Strong
        } else {
            CorrelationStrength::VeryStrong
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::VeryWeak => "very weak",
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Strong => "strong",
            CorrelationStrength::VeryStrong => "very strong",
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sign of a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

/// Correlation between two numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub field_a: String,
    pub field_b: String,
    /// Pearson coefficient in [-1, 1]
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    /// Number of records where both fields were present
    pub sample_size: usize,
}

/// Running state for one pair of samples.
///
/// Accumulates centered moments (Welford) so large magnitudes such as
/// national spending totals do not cancel catastrophically.
#[derive(Debug, Clone, Default)]
struct PairState {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    co_moment: f64,
}

impl PairState {
    fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        let n = self.n as f64;
        let dx = x - self.mean_x;
        self.mean_x += dx / n;
        let dy = y - self.mean_y;
        self.mean_y += dy / n;
        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.co_moment += dx * (y - self.mean_y);
    }

    fn coefficient(&self) -> Option<f64> {
        if self.n < MIN_PAIRED_VALUES {
            return None;
        }
        let denominator = (self.m2_x * self.m2_y).sqrt();
        if denominator <= 0.0 || !denominator.is_finite() {
            return None;
        }
        Some((self.co_moment / denominator).clamp(-1.0, 1.0))
    }
}

/// Pearson coefficient of two equally long samples.
///
/// Returns `None` when the samples differ in length, have fewer than two
/// values, or either has zero variance.
///
/// # Examples
///
/// ```rust
/// use fiscal_guard::analyzers::correlation::pearson;
///
/// let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
/// assert!(pearson(&[1.0, 1.0], &[3.0, 4.0]).is_none());
/// ```
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() {
        return None;
    }
    let mut state = PairState::default();
    for (x, y) in xs.iter().zip(ys) {
        state.push(*x, *y);
    }
    state.coefficient()
}

/// Correlates one pair of fields over their co-present values.
pub fn correlate_fields(records: &[Record], field_a: &str, field_b: &str) -> Option<CorrelationPair> {
    let mut state = PairState::default();
    for record in records {
        if let (Some(x), Some(y)) = (
            record.numeric(field_a).as_f64(),
            record.numeric(field_b).as_f64(),
        ) {
            state.push(x, y);
        }
    }

    let coefficient = state.coefficient()?;
    Some(CorrelationPair {
        field_a: field_a.to_string(),
        field_b: field_b.to_string(),
        coefficient,
        strength: CorrelationStrength::from_coefficient(coefficient),
        direction: if coefficient < 0.0 {
            CorrelationDirection::Negative
        } else {
            CorrelationDirection::Positive
        },
        sample_size: state.n,
    })
}

/// Correlates every unordered pair of the given fields, in field order.
#[instrument(skip(records, fields), fields(records = records.len(), fields = fields.len()))]
pub fn correlation_matrix(records: &[Record], fields: &[String]) -> Vec<CorrelationPair> {
    let mut pairs = Vec::new();
    for (i, a) in fields.iter().enumerate() {
        for b in &fields[i + 1..] {
            match correlate_fields(records, a, b) {
                Some(pair) => pairs.push(pair),
                None => debug!(field_a = %a, field_b = %b, "Correlation undefined, pair omitted"),
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    const EPS: f64 = 1e-9;

    fn xy_records(pairs: &[(Option<f64>, Option<f64>)]) -> Vec<Record> {
        pairs
            .iter()
            .map(|(x, y)| Record::new().with("x", *x).with("y", *y))
            .collect()
    }

    #[test]
    fn test_identical_and_inverse_fields() {
        let records: Vec<Record> = (1..=6)
            .map(|i| {
                let v = f64::from(i) * 1.5e11;
                Record::new().with("x", v).with("same", v).with("inverse", -v)
            })
            .collect();
        let fields = vec!["x".to_string(), "same".to_string(), "inverse".to_string()];
        let pairs = correlation_matrix(&records, &fields);
        assert_eq!(pairs.len(), 3);

        let same = pairs.iter().find(|p| p.field_b == "same").unwrap();
        assert!((same.coefficient - 1.0).abs() < EPS);
        assert_eq!(same.strength, CorrelationStrength::VeryStrong);
        assert_eq!(same.direction, CorrelationDirection::Positive);

        let inverse = pairs
            .iter()
            .find(|p| p.field_a == "x" && p.field_b == "inverse")
            .unwrap();
        assert!((inverse.coefficient + 1.0).abs() < EPS);
        assert_eq!(inverse.direction, CorrelationDirection::Negative);
        assert_eq!(inverse.sample_size, 6);
    }

    #[test]
    fn test_only_co_present_values_are_used() {
        let records = xy_records(&[
            (Some(1.0), Some(10.0)),
            (Some(2.0), None),
            (None, Some(50.0)),
            (Some(3.0), Some(30.0)),
            (Some(4.0), Some(40.0)),
        ]);
        let pair = correlate_fields(&records, "x", "y").unwrap();
        assert_eq!(pair.sample_size, 3);
        assert!(pair.coefficient > 0.95);
    }

    #[test]
    fn test_undefined_pairs_are_omitted() {
        let single = xy_records(&[(Some(1.0), Some(2.0)), (Some(3.0), None)]);
        assert!(correlate_fields(&single, "x", "y").is_none());

        let flat = xy_records(&[(Some(1.0), Some(5.0)), (Some(2.0), Some(5.0))]);
        assert!(correlate_fields(&flat, "x", "y").is_none());

        let fields = vec!["x".to_string(), "y".to_string()];
        assert!(correlation_matrix(&flat, &fields).is_empty());
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let records = vec![
            Record::new().with("x", 1.0).with("y", 2.0),
            Record::new().with("x", "n/a").with("y", 3.0),
            Record::new().with("x", 2.0).with("y", 4.0),
            Record::new().with("x", 3.0).with("y", FieldValue::Null),
            Record::new().with("x", 3.0).with("y", 6.0),
        ];
        let pair = correlate_fields(&records, "x", "y").unwrap();
        assert_eq!(pair.sample_size, 3);
        assert!((pair.coefficient - 1.0).abs() < EPS);
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(CorrelationStrength::from_coefficient(0.1), CorrelationStrength::VeryWeak);
        assert_eq!(CorrelationStrength::from_coefficient(-0.3), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_coefficient(0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(-0.79), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_coefficient(0.8), CorrelationStrength::VeryStrong);
        assert_eq!(CorrelationStrength::Moderate.to_string(), "moderate");
    }

    #[test]
    fn test_pearson_length_mismatch() {
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_none());
    }
}
