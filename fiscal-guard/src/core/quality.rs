//! Quality scoring across six dimensions with a letter grade.
//!
//! | Dimension | Score |
//! |---|---|
//! | completeness | mean field completeness over the required fields (all fields when none are required) |
//! | accuracy | share of numeric values that are finite and within the domain bound; outliers removed during cleaning count as failures |
//! | consistency | share of values matching their field's dominant format |
//! | validity | share of records with every required field present and every numeric field well typed |
//! | uniqueness | 100 minus the duplicate percentage over the required fields (all fields when none are required) |
//! | timeliness | `100 - 10 * max(0, lag - 1)` where lag is the distance from the latest year to the reference year |
//!
//! The overall score is the weighted mean of the six, mapped to a grade:
//! A at 90 and above, B at 80, C at 70, D at 60, F below.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::inference::{InferredFieldType, TypeInferenceEngine};
use crate::config::{ProcessingOptions, QualityConfig};
use crate::core::cleaner::CleaningReport;
use crate::record::{NumericValue, Record};

/// Timeliness points lost per year of lag beyond the first.
pub const TIMELINESS_PENALTY_PER_YEAR: f64 = 10.0;

/// Letter grade for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Maps a score in [0, 100] to a grade.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fiscal_guard::core::quality::Grade;
    ///
    /// assert_eq!(Grade::from_score(90.0), Grade::A);
    /// assert_eq!(Grade::from_score(89.99), Grade::B);
    /// assert_eq!(Grade::from_score(12.0), Grade::F);
    /// ```
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// One of the six scored dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDimension {
    Completeness,
    Accuracy,
    Consistency,
    Validity,
    Uniqueness,
    Timeliness,
}

impl QualityDimension {
    pub const ALL: [QualityDimension; 6] = [
        QualityDimension::Completeness,
        QualityDimension::Accuracy,
        QualityDimension::Consistency,
        QualityDimension::Validity,
        QualityDimension::Uniqueness,
        QualityDimension::Timeliness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QualityDimension::Completeness => "completeness",
            QualityDimension::Accuracy => "accuracy",
            QualityDimension::Consistency => "consistency",
            QualityDimension::Validity => "validity",
            QualityDimension::Uniqueness => "uniqueness",
            QualityDimension::Timeliness => "timeliness",
        }
    }
}

impl fmt::Display for QualityDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scores per dimension, each in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityDimensions {
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub validity: f64,
    pub uniqueness: f64,
    pub timeliness: f64,
}

impl QualityDimensions {
    /// Score of one dimension.
    pub fn get(&self, dimension: QualityDimension) -> f64 {
        match dimension {
            QualityDimension::Completeness => self.completeness,
            QualityDimension::Accuracy => self.accuracy,
            QualityDimension::Consistency => self.consistency,
            QualityDimension::Validity => self.validity,
            QualityDimension::Uniqueness => self.uniqueness,
            QualityDimension::Timeliness => self.timeliness,
        }
    }

    /// Dimension scores in [`QualityDimension::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (QualityDimension, f64)> + '_ {
        QualityDimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }
}

/// Overall score and grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallQuality {
    pub score: f64,
    pub grade: Grade,
}

/// Per-field profile gathered during assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalysis {
    /// Non-missing share in percent
    pub completeness: f64,
    /// Distinct non-missing values over all records, in percent
    pub uniqueness: f64,
    pub inferred_type: InferredFieldType,
    /// Share of non-missing values matching the dominant format, in percent
    pub consistency: f64,
    pub non_missing_count: usize,
    pub distinct_count: usize,
}

/// Result of a quality assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    #[serde(flatten)]
    pub dimensions: QualityDimensions,
    pub overall: OverallQuality,
    pub duplicate_records: usize,
    pub recommendations: Vec<String>,
    pub field_analysis: BTreeMap<String, FieldAnalysis>,
    pub record_count: usize,
}

/// Scores record sets.
#[derive(Debug, Clone, Default)]
pub struct QualityAssessor {
    config: QualityConfig,
    required_fields: Vec<String>,
    numeric_fields: Vec<String>,
    inference: TypeInferenceEngine,
}

impl QualityAssessor {
    /// Creates an assessor with the given settings and no field lists.
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates an assessor from full processing options.
    pub fn from_options(options: &ProcessingOptions) -> Self {
        Self::new(options.quality.clone())
            .with_required_fields(options.required_fields.clone())
            .with_numeric_fields(options.numeric_fields.clone())
    }

    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    pub fn with_numeric_fields(mut self, fields: Vec<String>) -> Self {
        self.numeric_fields = fields;
        self
    }

    /// Replaces the type inference engine used for consistency.
    pub fn with_inference_engine(mut self, engine: TypeInferenceEngine) -> Self {
        self.inference = engine;
        self
    }

    /// Assesses a record set.
    ///
    /// When the cleaning report is supplied, values removed as outliers count
    /// as failed accuracy checks.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn assess(
        &self,
        records: &[Record],
        cleaning: Option<&CleaningReport>,
    ) -> QualityAssessment {
        if records.is_empty() {
            return self.empty_assessment();
        }

        let field_analysis = self.analyze_fields(records);
        let duplicate_records = self.count_duplicates(records, &field_analysis);
        let (accuracy_passed, accuracy_checked) = self.accuracy_counts(records);
        let removed_outliers = cleaning.map_or(0, |r| r.outlier_value_count);
        let latest_year = self.latest_year(records);

        let dimensions = QualityDimensions {
            completeness: self.completeness(&field_analysis),
            accuracy: percentage(accuracy_passed, accuracy_checked + removed_outliers),
            consistency: consistency(&field_analysis),
            validity: percentage(
                records.iter().filter(|r| self.is_valid(r)).count(),
                records.len(),
            ),
            uniqueness: 100.0 - percentage(duplicate_records, records.len()),
            timeliness: self.timeliness(latest_year),
        };
        let overall = self.overall(&dimensions);

        let recommendations = self.recommendations(
            &dimensions,
            &field_analysis,
            duplicate_records,
            accuracy_checked + removed_outliers - accuracy_passed,
            latest_year,
        );

        debug!(
            score = overall.score,
            grade = %overall.grade,
            duplicates = duplicate_records,
            "Quality assessment complete"
        );

        QualityAssessment {
            dimensions,
            overall,
            duplicate_records,
            recommendations,
            field_analysis,
            record_count: records.len(),
        }
    }

    /// Weighted overall score of a set of dimension scores.
    pub fn overall(&self, dimensions: &QualityDimensions) -> OverallQuality {
        let weights = &self.config.weights;
        let total = weights.total();
        let score = if total > 0.0 {
            (dimensions.completeness * weights.completeness
                + dimensions.accuracy * weights.accuracy
                + dimensions.consistency * weights.consistency
                + dimensions.validity * weights.validity
                + dimensions.uniqueness * weights.uniqueness
                + dimensions.timeliness * weights.timeliness)
                / total
        } else {
            0.0
        };
        let score = score.clamp(0.0, 100.0);
        OverallQuality {
            score,
            grade: Grade::from_score(score),
        }
    }

    fn empty_assessment(&self) -> QualityAssessment {
        let dimensions = QualityDimensions {
            completeness: 0.0,
            accuracy: 0.0,
            consistency: 0.0,
            validity: 0.0,
            uniqueness: 0.0,
            timeliness: 0.0,
        };
        QualityAssessment {
            overall: OverallQuality {
                score: 0.0,
                grade: Grade::F,
            },
            dimensions,
            duplicate_records: 0,
            recommendations: vec![
                "No records left to assess: review required fields and outlier settings"
                    .to_string(),
            ],
            field_analysis: BTreeMap::new(),
            record_count: 0,
        }
    }

    fn analyze_fields(&self, records: &[Record]) -> BTreeMap<String, FieldAnalysis> {
        let mut fields: BTreeSet<&str> = records.iter().flat_map(Record::field_names).collect();
        fields.extend(self.required_fields.iter().map(String::as_str));
        fields.extend(self.numeric_fields.iter().map(String::as_str));

        let total = records.len();
        fields
            .into_iter()
            .map(|field| {
                let mut distinct = HashSet::new();
                let mut non_missing = 0;
                for record in records {
                    if let Some(value) = record.get(field).filter(|v| !v.is_missing()) {
                        non_missing += 1;
                        distinct.insert(value.canonical());
                    }
                }
                let inference = self.inference.infer_field(records, field);
                let analysis = FieldAnalysis {
                    completeness: percentage(non_missing, total),
                    uniqueness: percentage(distinct.len(), total),
                    inferred_type: inference.inferred_type,
                    consistency: inference.format_share * 100.0,
                    non_missing_count: non_missing,
                    distinct_count: distinct.len(),
                };
                (field.to_string(), analysis)
            })
            .collect()
    }

    fn completeness(&self, analysis: &BTreeMap<String, FieldAnalysis>) -> f64 {
        let scores: Vec<f64> = if self.required_fields.is_empty() {
            analysis.values().map(|a| a.completeness).collect()
        } else {
            self.required_fields
                .iter()
                .map(|f| analysis.get(f).map_or(0.0, |a| a.completeness))
                .collect()
        };
        if scores.is_empty() {
            return 100.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// (passed, checked) over non-missing numeric values.
    fn accuracy_counts(&self, records: &[Record]) -> (usize, usize) {
        let bound = self.config.accuracy_bound;
        let mut passed = 0;
        let mut checked = 0;
        for record in records {
            for field in &self.numeric_fields {
                match record.numeric(field) {
                    NumericValue::Present(v) => {
                        checked += 1;
                        if v.abs() <= bound {
                            passed += 1;
                        }
                    }
                    NumericValue::Invalid(_) => checked += 1,
                    NumericValue::Absent => {}
                }
            }
        }
        (passed, checked)
    }

    fn is_valid(&self, record: &Record) -> bool {
        self.required_fields.iter().all(|f| record.has_value(f))
            && self
                .numeric_fields
                .iter()
                .all(|f| !record.numeric(f).is_invalid())
    }

    fn duplicate_key_fields(&self, analysis: &BTreeMap<String, FieldAnalysis>) -> Vec<String> {
        if self.required_fields.is_empty() {
            analysis.keys().cloned().collect()
        } else {
            self.required_fields.clone()
        }
    }

    fn count_duplicates(
        &self,
        records: &[Record],
        analysis: &BTreeMap<String, FieldAnalysis>,
    ) -> usize {
        let key_fields = self.duplicate_key_fields(analysis);
        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|r| !seen.insert(r.key_for(&key_fields)))
            .count()
    }

    fn latest_year(&self, records: &[Record]) -> Option<i32> {
        records
            .iter()
            .filter_map(|r| r.get_ignore_case(&self.config.time_field))
            .filter_map(|(_, v)| v.to_numeric().as_f64())
            .map(|y| y.round() as i32)
            .max()
    }

    fn timeliness(&self, latest_year: Option<i32>) -> f64 {
        let Some(latest) = latest_year else {
            return 100.0;
        };
        // years saturate at the i32 bounds, so widen before subtracting
        let lag = (i64::from(self.config.resolved_reference_year()) - i64::from(latest)) as f64;
        (100.0 - TIMELINESS_PENALTY_PER_YEAR * (lag - 1.0).max(0.0)).clamp(0.0, 100.0)
    }

    fn recommendations(
        &self,
        dimensions: &QualityDimensions,
        analysis: &BTreeMap<String, FieldAnalysis>,
        duplicates: usize,
        failed_accuracy: usize,
        latest_year: Option<i32>,
    ) -> Vec<String> {
        let threshold = self.config.recommendation_threshold;
        let mut out = Vec::new();

        for (dimension, score) in dimensions.iter() {
            if score >= threshold {
                continue;
            }
            let message = match dimension {
                QualityDimension::Completeness => {
                    let sparse = fields_below(analysis, threshold, |a| a.completeness);
                    format!(
                        "Completeness below threshold ({score:.1}%): consider imputing missing values for {}",
                        list_or(&sparse, "the required fields")
                    )
                }
                QualityDimension::Accuracy => format!(
                    "Accuracy below threshold ({score:.1}%): {failed_accuracy} numeric values failed range checks or were removed as outliers; verify source units"
                ),
                QualityDimension::Consistency => {
                    let mixed = fields_below(analysis, threshold, |a| a.consistency);
                    format!(
                        "Consistency below threshold ({score:.1}%): standardise value formats for {}",
                        list_or(&mixed, "mixed-format fields")
                    )
                }
                QualityDimension::Validity => format!(
                    "Validity below threshold ({score:.1}%): records are missing required fields or carry non-numeric values in numeric fields"
                ),
                QualityDimension::Uniqueness => format!(
                    "Uniqueness below threshold ({score:.1}%): {duplicates} duplicate records found; deduplicate on {}",
                    if self.required_fields.is_empty() {
                        "all fields".to_string()
                    } else {
                        self.required_fields.join(", ")
                    }
                ),
                QualityDimension::Timeliness => format!(
                    "Timeliness below threshold ({score:.1}%): latest {} is {}; refresh the dataset",
                    self.config.time_field,
                    latest_year.map_or_else(|| "unknown".to_string(), |y| y.to_string())
                ),
            };
            out.push(message);
        }
        out
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 100.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

/// Share of non-missing values matching their field's dominant format.
fn consistency(analysis: &BTreeMap<String, FieldAnalysis>) -> f64 {
    let (matching, total) = analysis
        .values()
        .fold((0.0, 0usize), |(matching, total), a| {
            (
                matching + a.consistency / 100.0 * a.non_missing_count as f64,
                total + a.non_missing_count,
            )
        });
    if total == 0 {
        return 100.0;
    }
    (matching / total as f64 * 100.0).clamp(0.0, 100.0)
}

fn fields_below(
    analysis: &BTreeMap<String, FieldAnalysis>,
    threshold: f64,
    score: impl Fn(&FieldAnalysis) -> f64,
) -> Vec<&str> {
    analysis
        .iter()
        .filter(|(_, a)| score(a) < threshold)
        .map(|(name, _)| name.as_str())
        .collect()
}

fn list_or(fields: &[&str], fallback: &str) -> String {
    if fields.is_empty() {
        fallback.to_string()
    } else {
        fields.join(", ")
    }
}
