//! Answers computed from the loaded dataset.

use std::sync::Arc;
use tracing::debug;

use super::canned::{comparison_spec, line_spec, pass_rate_spec, scatter_spec};
use super::{FactResolver, StaticResolver};
use crate::dataset::{Dataset, PASS_MARK};
use crate::intent::{Intent, Rule};
use crate::response::Response;
use crate::visualization::{ChartData, ChartKind, Series, VisualizationSpec};

/// Number of entries shown in ranking charts.
const TOP_N: usize = 5;

/// Resolver computing each intent from a [`Dataset`].
///
/// Falls back to the authored answers when the dataset has nothing to say
/// about the intent (unknown student, empty dataset).
#[derive(Debug, Clone)]
pub struct DatasetResolver {
    dataset: Arc<Dataset>,
    fallback: StaticResolver,
}

impl DatasetResolver {
    /// Create a resolver over a shared dataset.
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            fallback: StaticResolver::new(),
        }
    }

    /// The dataset backing this resolver.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn compute(&self, intent: &Intent) -> Option<Response> {
        match intent {
            Intent::TopStudents => self.top_students(),
            Intent::HardestExercises => self.hardest_exercises(),
            Intent::TimeVersusScore => self.time_versus_score(),
            Intent::StudentTrend { student } => self.student_trend(student),
            Intent::CompareStudents { first, second } => self.compare(first, second),
            Intent::ExercisePassRate { exercise } => self.pass_rate(exercise),
        }
    }

    fn top_students(&self) -> Option<Response> {
        let averages = self.dataset.student_averages();
        let (best, score) = averages.first()?;
        let top: Vec<_> = averages.iter().take(TOP_N).collect();

        Some(
            Response::text(format!(
                "The student with the highest average score is {} with an average score of {:.1}%.",
                best, score
            ))
            .with_visualization(ranking_spec(
                ChartKind::Bar,
                format!("Top {} Students by Average Score", top.len()),
                &top,
            )),
        )
    }

    fn hardest_exercises(&self) -> Option<Response> {
        let averages = self.dataset.exercise_averages();
        let (hardest, score) = averages.first()?;
        let bottom: Vec<_> = averages.iter().take(TOP_N).collect();

        Some(
            Response::text(format!(
                "The most difficult exercise is \"{}\" with an average score of {:.1}%. \
                 This exercise has the lowest average score across all students.",
                hardest, score
            ))
            .with_visualization(ranking_spec(
                ChartKind::HorizontalBar,
                format!("{} Most Difficult Exercises", bottom.len()),
                &bottom,
            )),
        )
    }

    fn time_versus_score(&self) -> Option<Response> {
        let r = self.dataset.time_score_correlation()?;
        let points = self.dataset.time_score_points();

        Some(
            Response::text(format!(
                "There is a {} correlation (r = {:.2}) between time spent and scores.",
                describe_correlation(r),
                r
            ))
            .with_visualization(scatter_spec(ChartData::unlabeled(vec![Series::points(
                "Exercises",
                &points,
            )]))),
        )
    }

    fn student_trend(&self, student: &str) -> Option<Response> {
        let timeline = self.dataset.student_timeline(student);
        let summary = self.dataset.student_summary(student)?;

        let scores: Vec<f64> = timeline.iter().map(|r| r.score).collect();
        let labels: Vec<String> = timeline
            .iter()
            .enumerate()
            .map(|(i, r)| match r.date {
                Some(date) => date.format("%b %-d").to_string(),
                None => format!("#{}", i + 1),
            })
            .collect();

        let mut text = format!(
            "Student {} has an average score of {:.1}%.",
            summary.student_id, summary.average_score
        );
        if scores.len() >= 2 {
            let (early, later) = scores.split_at(scores.len() / 2);
            let early_avg = mean(early);
            let later_avg = mean(later);
            let direction = if later_avg > early_avg {
                "improving"
            } else if later_avg < early_avg {
                "declining"
            } else {
                "stable"
            };
            text.push_str(&format!(
                " Their performance appears to be {} over time (early exercises: {:.1}%, later exercises: {:.1}%).",
                direction, early_avg, later_avg
            ));
        }

        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        Some(
            Response::text(text)
                .with_visualization(line_spec(&summary.student_id, &label_refs, &scores)),
        )
    }

    fn compare(&self, first: &str, second: &str) -> Option<Response> {
        let a = self.dataset.student_summary(first)?;
        let b = self.dataset.student_summary(second)?;

        // Compared at the precision shown in the text
        let (score_a, score_b) = (round1(a.average_score), round1(b.average_score));
        let verdict = if score_a > score_b {
            format!("Student {} performs better overall with a higher average score.", a.student_id)
        } else if score_b > score_a {
            format!("Student {} performs better overall with a higher average score.", b.student_id)
        } else {
            format!(
                "Students {} and {} perform equally overall with the same average score.",
                a.student_id, b.student_id
            )
        };

        let text = format!(
            "Comparison between {a} and {b}:\n\n\
             {a}: {:.1}% average score, {:.1}% pass rate, {:.1} seconds average time\n\
             {b}: {:.1}% average score, {:.1}% pass rate, {:.1} seconds average time\n\n\
             {verdict}",
            a.average_score,
            a.pass_rate,
            a.average_time,
            b.average_score,
            b.pass_rate,
            b.average_time,
            a = a.student_id,
            b = b.student_id,
            verdict = verdict,
        );

        Some(Response::text(text).with_visualization(comparison_spec(
            (a.student_id.as_str(), [round1(a.average_score), round1(a.pass_rate), round1(a.average_time)]),
            (b.student_id.as_str(), [round1(b.average_score), round1(b.pass_rate), round1(b.average_time)]),
        )))
    }

    fn pass_rate(&self, exercise: &str) -> Option<Response> {
        let rate = round1(self.dataset.exercise_pass_rate(exercise)?);
        Some(
            Response::text(format!(
                "The pass rate for exercise \"{}\" is {:.1}%. This means that {:.1}% of attempts \
                 achieved a score of {}% or higher on this exercise.",
                exercise, rate, rate, PASS_MARK
            ))
            .with_visualization(pass_rate_spec(exercise, rate)),
        )
    }
}

impl FactResolver for DatasetResolver {
    fn resolve(&self, rule: Option<&Rule>) -> Response {
        let Some(rule) = rule else {
            return self.fallback.resolve(None);
        };

        match self.compute(&rule.intent) {
            Some(response) => response,
            None => {
                debug!(
                    rule = %rule.name,
                    "Dataset has no data for intent, using authored answer"
                );
                self.fallback.resolve(Some(rule))
            }
        }
    }

    fn name(&self) -> &'static str {
        "dataset"
    }
}

fn ranking_spec(kind: ChartKind, title: String, entries: &[&(String, f64)]) -> VisualizationSpec {
    let values: Vec<f64> = entries.iter().map(|(_, v)| round1(*v)).collect();
    VisualizationSpec::new(
        kind,
        title,
        ChartData::new(
            entries.iter().map(|(label, _)| label.clone()),
            vec![Series::new("Average Score (%)", &values)],
        ),
    )
}

fn describe_correlation(r: f64) -> &'static str {
    let strength = r.abs();
    match (strength, r >= 0.0) {
        (s, _) if s < 0.1 => "negligible",
        (s, true) if s < 0.3 => "weak positive",
        (s, false) if s < 0.3 => "weak negative",
        (s, true) if s < 0.6 => "moderate positive",
        (s, false) if s < 0.6 => "moderate negative",
        (_, true) => "strong positive",
        (_, false) => "strong negative",
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ExerciseRecord;
    use crate::intent::{IntentClassifier, Question};

    fn record(student: &str, exercise: &str, score: f64, time: f64) -> ExerciseRecord {
        ExerciseRecord {
            student_id: student.to_string(),
            exercise: exercise.to_string(),
            score,
            time_spent: time,
            date: None,
        }
    }

    fn resolver() -> DatasetResolver {
        let dataset = Dataset::new(vec![
            record("S01", "Ü1A3a)_", 60.0, 120.0),
            record("S01", "Ü2B4c)_", 70.0, 180.0),
            record("S01", "Ü2B4c)_", 90.0, 300.0),
            record("S05", "Ü1A3a)_", 40.0, 90.0),
            record("S05", "Ü2B4c)_", 30.0, 60.0),
            record("S08", "Ü1A3a)_", 95.0, 320.0),
        ])
        .unwrap();
        DatasetResolver::new(Arc::new(dataset))
    }

    fn answer(resolver: &DatasetResolver, text: &str) -> Response {
        let classifier = IntentClassifier::builtin();
        resolver.resolve(classifier.classify(&Question::parse(text).unwrap()))
    }

    #[test]
    fn test_top_students_computed() {
        let response = answer(&resolver(), "Who is the best student?");
        assert!(response.text.contains("S08"));
        assert!(response.text.contains("95.0%"));
        let spec = response.visualization.unwrap();
        assert_eq!(spec.labels(), &["S08", "S01", "S05"]);
        assert_eq!(spec.title(), "Top 3 Students by Average Score");
    }

    #[test]
    fn test_hardest_exercises_computed_horizontal() {
        let response = answer(&resolver(), "What is the hardest exercise?");
        let spec = response.visualization.unwrap();
        assert!(spec.is_horizontal());
        // Ü2B4c)_ = (70+90+30)/3 = 63.3, Ü1A3a)_ = (60+40+95)/3 = 65.0
        assert_eq!(spec.labels()[0], "Ü2B4c)_");
        assert!(response.text.contains("63.3%"));
    }

    #[test]
    fn test_time_versus_score_computed() {
        let response = answer(&resolver(), "Does time spent affect the score?");
        assert!(response.text.contains("strong positive"));
        assert_eq!(response.visualization.unwrap().kind(), ChartKind::Scatter);
    }

    #[test]
    fn test_student_trend_computed() {
        let response = answer(&resolver(), "Show the performance of S01");
        assert!(response.text.contains("Student S01 has an average score of 73.3%"));
        assert!(response.text.contains("improving"));
        let spec = response.visualization.unwrap();
        assert_eq!(spec.labels(), &["#1", "#2", "#3"]);
    }

    #[test]
    fn test_compare_computed() {
        let response = answer(&resolver(), "Compare S05 and S08");
        assert!(response.text.starts_with("Comparison between S05 and S08:"));
        assert!(response.text.contains("Student S08 performs better"));
        let spec = response.visualization.unwrap();
        assert_eq!(spec.title(), "Comparison: S05 vs S08");
    }

    #[test]
    fn test_compare_tie_names_neither() {
        let dataset = Dataset::new(vec![
            record("S05", "Ü1A3a)_", 60.0, 100.0),
            record("S05", "Ü2B4c)_", 80.0, 100.0),
            record("S08", "Ü1A3a)_", 70.0, 200.0),
        ])
        .unwrap();
        let response = answer(&DatasetResolver::new(Arc::new(dataset)), "Compare S05 and S08");
        assert!(response
            .text
            .ends_with("Students S05 and S08 perform equally overall with the same average score."));
        assert!(!response.text.contains("performs better"));
    }

    #[test]
    fn test_pass_rate_computed() {
        let response = answer(&resolver(), "pass rate of Ü1A3a)_");
        assert!(response.text.contains("66.7%"));
        let spec = response.visualization.unwrap();
        let values: Vec<f64> = spec.data().datasets[0].data.iter().filter_map(|p| p.magnitude()).collect();
        assert_eq!(values, vec![66.7, 33.3]);
    }

    #[test]
    fn test_empty_dataset_falls_back_to_authored() {
        let resolver = DatasetResolver::new(Arc::new(Dataset::default()));
        let response = answer(&resolver, "Who has the highest average score?");
        assert!(response.text.contains("S03"));
    }

    #[test]
    fn test_no_rule_gets_default() {
        let response = answer(&resolver(), "What is the weather today?");
        assert!(response.visualization.is_none());
    }

    #[test]
    fn test_describe_correlation() {
        assert_eq!(describe_correlation(0.05), "negligible");
        assert_eq!(describe_correlation(0.42), "moderate positive");
        assert_eq!(describe_correlation(-0.2), "weak negative");
        assert_eq!(describe_correlation(0.9), "strong positive");
    }
}
