//! Student exercise dataset.
//!
//! Loaded once from a JSON file of the form
//! `{"records": [{"student_id", "exercise", "score", "time_spent", "date"?}]}`
//! and shared read-only behind an `Arc`. The aggregates here back the
//! dataset-computing resolver.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{DatasetError, DatasetResult};

/// Score at or above which an attempt counts as passed.
pub const PASS_MARK: f64 = 50.0;

/// One student's attempt at one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub student_id: String,
    pub exercise: String,
    /// Score in percent (0-100)
    pub score: f64,
    /// Seconds spent on the exercise
    pub time_spent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Read-only collection of exercise records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<ExerciseRecord>,
}

/// Aggregate metrics for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentSummary {
    pub student_id: String,
    pub average_score: f64,
    /// Percentage of attempts at or above [`PASS_MARK`]
    pub pass_rate: f64,
    pub average_time: f64,
    pub attempts: usize,
}

impl Dataset {
    /// Build a dataset from records, validating score ranges.
    pub fn new(records: Vec<ExerciseRecord>) -> DatasetResult<Self> {
        if let Some(bad) = records
            .iter()
            .find(|r| !(0.0..=100.0).contains(&r.score) || r.time_spent < 0.0)
        {
            return Err(DatasetError::Invalid {
                message: format!(
                    "record for {} on {} is out of range (score {}, time {})",
                    bad.student_id, bad.exercise, bad.score, bad.time_spent
                ),
            });
        }
        Ok(Self { records })
    }

    /// Parse a dataset from JSON text.
    pub fn from_json(json: &str) -> DatasetResult<Self> {
        let raw: Dataset = serde_json::from_str(json)?;
        Self::new(raw.records)
    }

    /// Load a dataset file.
    pub fn load(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let dataset = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            records = dataset.records.len(),
            "Student data loaded"
        );
        Ok(dataset)
    }

    /// All records in file order.
    pub fn records(&self) -> &[ExerciseRecord] {
        &self.records
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Average score per student, highest first.
    pub fn student_averages(&self) -> Vec<(String, f64)> {
        let mut averages = average_by(&self.records, |r| &r.student_id);
        averages.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        averages
    }

    /// Average score per exercise, lowest (hardest) first.
    pub fn exercise_averages(&self) -> Vec<(String, f64)> {
        let mut averages = average_by(&self.records, |r| &r.exercise);
        averages.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        averages
    }

    /// `(time_spent, score)` for every record.
    pub fn time_score_points(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.time_spent, r.score))
            .collect()
    }

    /// Pearson correlation between time spent and score.
    ///
    /// `None` with fewer than two records or zero variance.
    pub fn time_score_correlation(&self) -> Option<f64> {
        pearson(&self.time_score_points())
    }

    /// A student's records ordered by date. Undated records come after the
    /// dated ones, in file order.
    pub fn student_timeline(&self, student_id: &str) -> Vec<&ExerciseRecord> {
        let mut timeline: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.student_id.eq_ignore_ascii_case(student_id))
            .collect();
        timeline.sort_by_key(|r| (r.date.is_none(), r.date));
        timeline
    }

    /// Aggregate metrics for a student, `None` if they have no records.
    pub fn student_summary(&self, student_id: &str) -> Option<StudentSummary> {
        let records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.student_id.eq_ignore_ascii_case(student_id))
            .collect();
        if records.is_empty() {
            return None;
        }

        let n = records.len() as f64;
        let passed = records.iter().filter(|r| r.score >= PASS_MARK).count() as f64;
        Some(StudentSummary {
            student_id: records[0].student_id.clone(),
            average_score: records.iter().map(|r| r.score).sum::<f64>() / n,
            pass_rate: passed / n * 100.0,
            average_time: records.iter().map(|r| r.time_spent).sum::<f64>() / n,
            attempts: records.len(),
        })
    }

    /// Pass rate in percent for one exercise, `None` if it was never attempted.
    pub fn exercise_pass_rate(&self, exercise: &str) -> Option<f64> {
        let exercise = exercise.to_lowercase();
        let scores: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.exercise.to_lowercase() == exercise)
            .map(|r| r.score)
            .collect();
        if scores.is_empty() {
            return None;
        }
        let passed = scores.iter().filter(|&&s| s >= PASS_MARK).count() as f64;
        Some(passed / scores.len() as f64 * 100.0)
    }
}

fn average_by<'a, F>(records: &'a [ExerciseRecord], key: F) -> Vec<(String, f64)>
where
    F: Fn(&'a ExerciseRecord) -> &'a String,
{
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = totals.entry(key(record).as_str()).or_insert((0.0, 0));
        entry.0 += record.score;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(k, (sum, n))| (k.to_string(), sum / n as f64))
        .collect()
}

fn pearson(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}
