//! Append-only log of processing runs and the report derived from it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum difference between recent and earlier mean quality scores for
/// the trend to count as increasing or decreasing.
pub const QUALITY_TREND_TOLERANCE: f64 = 5.0;

/// One completed `process_data` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub processing_time_ms: f64,
    pub quality_score: f64,
    pub input_count: usize,
    pub output_count: usize,
}

/// Direction of quality scores over the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// Aggregate view of the processing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingReport {
    pub total_processing_runs: usize,
    /// Mean processing time in milliseconds
    pub average_processing_time: f64,
    pub average_quality_score: f64,
    pub quality_trend: QualityTrend,
}

/// Thread-safe, append-only processing history.
#[derive(Debug, Default)]
pub struct ProcessingHistory {
    entries: Mutex<Vec<ProcessingHistoryEntry>>,
}

impl ProcessingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: ProcessingHistoryEntry) {
        self.lock().push(entry);
    }

    /// Copy of the entries, oldest first.
    pub fn entries(&self) -> Vec<ProcessingHistoryEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Summarises the history.
    ///
    /// The quality trend compares the mean score of the recent half with the
    /// earlier half (the earlier half gets the smaller share for odd counts).
    pub fn report(&self) -> ProcessingReport {
        let entries = self.lock();
        let runs = entries.len();
        if runs == 0 {
            return ProcessingReport {
                total_processing_runs: 0,
                average_processing_time: 0.0,
                average_quality_score: 0.0,
                quality_trend: QualityTrend::Stable,
            };
        }

        let scores: Vec<f64> = entries.iter().map(|e| e.quality_score).collect();
        ProcessingReport {
            total_processing_runs: runs,
            average_processing_time: entries.iter().map(|e| e.processing_time_ms).sum::<f64>()
                / runs as f64,
            average_quality_score: scores.iter().sum::<f64>() / runs as f64,
            quality_trend: quality_trend(&scores),
        }
    }

    // A poisoned lock still holds a consistent Vec; appends are single pushes.
    fn lock(&self) -> MutexGuard<'_, Vec<ProcessingHistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Trend of a score series, oldest first.
pub fn quality_trend(scores: &[f64]) -> QualityTrend {
    if scores.len() < 2 {
        return QualityTrend::Stable;
    }
    let (earlier, recent) = scores.split_at(scores.len() / 2);
    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let delta = mean(recent) - mean(earlier);
    if delta > QUALITY_TREND_TOLERANCE {
        QualityTrend::Increasing
    } else if delta < -QUALITY_TREND_TOLERANCE {
        QualityTrend::Decreasing
    } else {
        QualityTrend::Stable
    }
}
