//! Hand-authored answers for the built-in intents.

use tracing::debug;

use super::{default_response, FactResolver};
use crate::intent::{Intent, Rule};
use crate::response::Response;
use crate::visualization::{ChartData, ChartKind, Series, VisualizationSpec};

const BLUE: &str = "rgba(54, 162, 235, 0.7)";
const RED: &str = "rgba(255, 99, 132, 0.7)";
const TEAL: &str = "rgba(75, 192, 192, 0.7)";

/// Resolver backed by the authored answer table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticResolver;

impl StaticResolver {
    /// Create a static resolver.
    pub fn new() -> Self {
        Self
    }
}

impl FactResolver for StaticResolver {
    fn resolve(&self, rule: Option<&Rule>) -> Response {
        match rule.and_then(|r| authored_response(&r.intent)) {
            Some(response) => response,
            None => {
                if let Some(rule) = rule {
                    debug!(rule = %rule.name, "No authored answer for intent");
                }
                default_response()
            }
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// The authored answer for an intent, if one was written.
///
/// Parameterized intents only have answers for the subjects the built-in
/// rules name (S01, S05/S08, Ü1A3a)_).
pub fn authored_response(intent: &Intent) -> Option<Response> {
    match intent {
        Intent::TopStudents => Some(top_students()),
        Intent::HardestExercises => Some(hardest_exercises()),
        Intent::TimeVersusScore => Some(time_versus_score()),
        Intent::StudentTrend { student } if student.eq_ignore_ascii_case("S01") => {
            Some(student_trend_s01())
        }
        Intent::CompareStudents { first, second }
            if first.eq_ignore_ascii_case("S05") && second.eq_ignore_ascii_case("S08") =>
        {
            Some(compare_s05_s08())
        }
        Intent::ExercisePassRate { exercise } if exercise.to_lowercase() == "ü1a3a)_" => {
            Some(pass_rate_u1a3a())
        }
        _ => None,
    }
}

fn top_students() -> Response {
    Response::text(
        "The student with the highest average score is S03 with an average score of 92.5%.",
    )
    .with_visualization(VisualizationSpec::new(
        ChartKind::Bar,
        "Top 5 Students by Average Score",
        ChartData::new(
            ["S03", "S01", "S07", "S05", "S02"],
            vec![Series::new("Average Score (%)", &[92.5, 87.3, 85.1, 82.7, 79.4])
                .with_style("backgroundColor", BLUE)],
        ),
    ))
}

fn hardest_exercises() -> Response {
    Response::text(
        "The most difficult exercise is \"Ü2B4c)_\" with an average score of 42.3%. \
         This exercise has the lowest average score across all students.",
    )
    .with_visualization(VisualizationSpec::new(
        ChartKind::HorizontalBar,
        "5 Most Difficult Exercises",
        ChartData::new(
            ["Ü2B4c)_", "Ü3A2a)_", "Ü1C5b)_", "Ü2A1d)_", "Ü3B3a)_"],
            vec![Series::new("Average Score (%)", &[42.3, 45.7, 48.2, 51.4, 53.8])
                .with_style("backgroundColor", RED)],
        ),
    ))
}

fn time_versus_score() -> Response {
    let points = [
        (120.0, 65.0),
        (240.0, 75.0),
        (180.0, 60.0),
        (300.0, 85.0),
        (150.0, 70.0),
        (210.0, 80.0),
        (270.0, 90.0),
        (90.0, 50.0),
        (330.0, 95.0),
        (180.0, 75.0),
        (240.0, 85.0),
        (120.0, 60.0),
        (300.0, 90.0),
        (150.0, 65.0),
        (210.0, 75.0),
    ];

    Response::text(
        "There is a moderate positive correlation (r = 0.42) between time spent and scores. \
         This suggests that students who spend more time on exercises tend to get higher \
         scores, although the relationship is not very strong.",
    )
    .with_visualization(scatter_spec(
        ChartData::unlabeled(vec![
            Series::points("Exercises", &points).with_style("backgroundColor", TEAL)
        ]),
    ))
}

/// Scatter chart with the time/score axis titles.
pub(crate) fn scatter_spec(data: ChartData) -> VisualizationSpec {
    VisualizationSpec::new(ChartKind::Scatter, "Time Spent vs. Score", data).with_option(
        "scales",
        serde_json::json!({
            "x": {"title": {"display": true, "text": "Time Spent (seconds)"}},
            "y": {"title": {"display": true, "text": "Score (%)"}}
        }),
    )
}

fn student_trend_s01() -> Response {
    Response::text(
        "Student S01 has an average score of 87.3%. Their performance appears to be improving \
         over time (early exercises: 82.1%, later exercises: 92.5%).",
    )
    .with_visualization(line_spec(
        "S01",
        &[
            "Jan 5", "Jan 12", "Jan 19", "Jan 26", "Feb 2", "Feb 9", "Feb 16", "Feb 23",
        ],
        &[75.0, 80.0, 85.0, 82.0, 90.0, 88.0, 95.0, 93.0],
    ))
}

/// Line chart of one student's scores over time.
pub(crate) fn line_spec(student: &str, labels: &[&str], scores: &[f64]) -> VisualizationSpec {
    VisualizationSpec::new(
        ChartKind::Line,
        format!("Performance Timeline for {}", student),
        ChartData::new(
            labels.iter().copied(),
            vec![Series::new("Score (%)", scores)
                .with_style("borderColor", "rgba(54, 162, 235, 1)")
                .with_style("backgroundColor", "rgba(54, 162, 235, 0.2)")
                .with_style("tension", 0.1)],
        ),
    )
}

fn compare_s05_s08() -> Response {
    Response::text(
        "Comparison between S05 and S08:\n\n\
         S05: 82.7% average score, 90.5% pass rate, 185.3 seconds average time\n\
         S08: 76.4% average score, 85.2% pass rate, 210.7 seconds average time\n\n\
         Student S05 performs better overall with higher average scores and pass rates while \
         spending less time on exercises.",
    )
    .with_visualization(comparison_spec(
        ("S05", [82.7, 90.5, 185.3]),
        ("S08", [76.4, 85.2, 210.7]),
    ))
}

/// Grouped bar chart comparing two students across three metrics.
pub(crate) fn comparison_spec(first: (&str, [f64; 3]), second: (&str, [f64; 3])) -> VisualizationSpec {
    VisualizationSpec::new(
        ChartKind::Bar,
        format!("Comparison: {} vs {}", first.0, second.0),
        ChartData::new(
            ["Average Score", "Pass Rate", "Average Time (s)"],
            vec![
                Series::new(first.0, &first.1).with_style("backgroundColor", BLUE),
                Series::new(second.0, &second.1).with_style("backgroundColor", RED),
            ],
        ),
    )
}

fn pass_rate_u1a3a() -> Response {
    Response::text(
        "The pass rate for exercise \"Ü1A3a)_\" is 78.3%. This means that 78.3% of students \
         achieved a score of 50% or higher on this exercise.",
    )
    .with_visualization(pass_rate_spec("Ü1A3a)_", 78.3))
}

/// Pass/fail pie chart for one exercise.
pub(crate) fn pass_rate_spec(exercise: &str, rate: f64) -> VisualizationSpec {
    let fail = ((100.0 - rate) * 10.0).round() / 10.0;
    VisualizationSpec::new(
        ChartKind::Pie,
        format!("Pass Rate for {}", exercise),
        ChartData::new(
            ["Pass", "Fail"],
            vec![Series::unlabeled(&[rate, fail])
                .with_style("backgroundColor", serde_json::json!([TEAL, RED]))],
        ),
    )
}
