//! Built-in rule table for the student exercise dataset.
//!
//! Order matters. A question mentioning both "most difficult" and
//! "time spent ... score" satisfies two rules; the difficulty rule answers it
//! because it is declared first.

use tracing::error;

use super::{Intent, Predicate, Rule, RuleTable};

/// "Which student has the highest average score?"
pub fn top_students_rule() -> Rule {
    Rule::new(
        "top-students",
        Predicate::any_of(&["highest average score", "best student"]),
        Intent::TopStudents,
    )
}

/// "What is the most difficult exercise?"
pub fn hardest_exercises_rule() -> Rule {
    Rule::new(
        "hardest-exercises",
        Predicate::any_of(&["most difficult", "hardest exercise"]),
        Intent::HardestExercises,
    )
}

/// "How does time spent correlate with scores?"
pub fn time_versus_score_rule() -> Rule {
    Rule::new(
        "time-vs-score",
        Predicate::all_of(&["time spent", "score"]),
        Intent::TimeVersusScore,
    )
}

/// "Show me the performance trend for student S01"
pub fn student_trend_rule() -> Rule {
    Rule::new(
        "student-trend",
        Predicate::all_of(&["performance", "s01"]),
        Intent::StudentTrend {
            student: "S01".to_string(),
        },
    )
}

/// "Compare the performance of students S05 and S08"
pub fn compare_students_rule() -> Rule {
    Rule::new(
        "compare-students",
        Predicate::all_of(&["compare", "s05", "s08"]),
        Intent::CompareStudents {
            first: "S05".to_string(),
            second: "S08".to_string(),
        },
    )
}

/// "What is the pass rate for exercise Ü1A3a)_?"
pub fn exercise_pass_rate_rule() -> Rule {
    Rule::new(
        "exercise-pass-rate",
        Predicate::all_of(&["pass rate", "ü1a3a"]),
        Intent::ExercisePassRate {
            exercise: "Ü1A3a)_".to_string(),
        },
    )
}

/// The built-in table in declaration order.
pub fn builtin_rules() -> RuleTable {
    let rules = [
        top_students_rule(),
        hardest_exercises_rule(),
        time_versus_score_rule(),
        student_trend_rule(),
        compare_students_rule(),
        exercise_pass_rate_rule(),
    ];

    let mut table = RuleTable::new();
    for rule in rules {
        let name = rule.name.clone();
        if let Err(e) = table.push(rule) {
            error!(rule = %name, error = %e, "Failed to register built-in rule");
        }
    }
    table
}

/// Example questions the built-in table understands, in rule order.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Which student has the highest average score?",
    "What is the most difficult exercise?",
    "How does time spent correlate with scores?",
    "Show me the performance trend for student S01",
    "Compare the performance of students S05 and S08",
    "What is the pass rate for exercise Ü1A3a)_?",
];
