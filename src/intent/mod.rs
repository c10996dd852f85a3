//! Intent classification.
//!
//! Questions are matched against an ordered [`RuleTable`]. Each rule pairs a
//! keyword [`Predicate`] with the [`Intent`] it answers; the first rule whose
//! predicate holds wins. There is no scoring and no multi-match resolution, so
//! overlapping rules are decided by declaration order alone.

mod rules;

pub use rules::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SessionError;

/// A trimmed, non-empty user question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    normalized: String,
}

impl Question {
    /// Trim `raw` and reject it when nothing is left.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidInput {
                reason: "Question cannot be empty".to_string(),
            });
        }

        Ok(Self {
            text: text.to_string(),
            normalized: text.to_lowercase(),
        })
    }

    /// The question as typed, trimmed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lower-cased form used for matching.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Boolean combination of case-insensitive substring tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The question contains the (lower-cased) keyword.
    Contains(String),
    /// Every inner predicate holds.
    All(Vec<Predicate>),
    /// At least one inner predicate holds.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Single keyword test.
    pub fn contains(keyword: &str) -> Self {
        Predicate::Contains(keyword.to_lowercase())
    }

    /// All keywords must appear.
    pub fn all_of(keywords: &[&str]) -> Self {
        Predicate::All(keywords.iter().map(|k| Predicate::contains(k)).collect())
    }

    /// Any keyword may appear.
    pub fn any_of(keywords: &[&str]) -> Self {
        Predicate::Any(keywords.iter().map(|k| Predicate::contains(k)).collect())
    }

    /// Evaluate against an already lower-cased question.
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Predicate::Contains(keyword) => normalized.contains(keyword.as_str()),
            Predicate::All(inner) => inner.iter().all(|p| p.matches(normalized)),
            Predicate::Any(inner) => inner.iter().any(|p| p.matches(normalized)),
        }
    }
}

/// The fact a rule asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Students ranked by average score.
    TopStudents,
    /// Exercises ranked by lowest average score.
    HardestExercises,
    /// Relationship between time spent and score.
    TimeVersusScore,
    /// Score timeline for one student.
    StudentTrend {
        /// Student identifier, e.g. `S01`.
        student: String,
    },
    /// Side-by-side metrics for two students.
    CompareStudents {
        /// First student identifier.
        first: String,
        /// Second student identifier.
        second: String,
    },
    /// Share of attempts scoring at least the pass mark on one exercise.
    ExercisePassRate {
        /// Exercise identifier, e.g. `Ü1A3a)_`.
        exercise: String,
    },
}

impl Intent {
    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::TopStudents => "top_students",
            Intent::HardestExercises => "hardest_exercises",
            Intent::TimeVersusScore => "time_versus_score",
            Intent::StudentTrend { .. } => "student_trend",
            Intent::CompareStudents { .. } => "compare_students",
            Intent::ExercisePassRate { .. } => "exercise_pass_rate",
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub predicate: Predicate,
    pub intent: Intent,
}

impl Rule {
    /// Create a rule.
    pub fn new(name: impl Into<String>, predicate: Predicate, intent: Intent) -> Self {
        Self {
            name: name.into(),
            predicate,
            intent,
        }
    }
}

/// Ordered rule table. Adding a rule is a data change.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Empty table; nothing matches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule after every rule already declared.
    ///
    /// # Errors
    /// Returns error if the name is empty or already taken.
    pub fn push(&mut self, rule: Rule) -> Result<(), String> {
        if rule.name.trim().is_empty() {
            return Err("Rule name is required".to_string());
        }
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(format!("Rule '{}' already exists", rule.name));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Builder form of [`RuleTable::push`].
    pub fn with_rule(mut self, rule: Rule) -> Result<Self, String> {
        self.push(rule)?;
        Ok(self)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Maps a question to the first matching rule, if any.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    table: RuleTable,
}

impl IntentClassifier {
    /// Classifier over a custom table.
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    /// Classifier over the built-in student analytics rules.
    pub fn builtin() -> Self {
        Self::new(builtin_rules())
    }

    /// Linear scan in declaration order; first match wins.
    pub fn classify(&self, question: &Question) -> Option<&Rule> {
        let matched = self
            .table
            .rules()
            .iter()
            .find(|rule| rule.predicate.matches(question.normalized()));

        match matched {
            Some(rule) => debug!(rule = %rule.name, intent = rule.intent.as_str(), "Question matched rule"),
            None => debug!("Question matched no rule"),
        }

        matched
    }

    /// The underlying table.
    pub fn table(&self) -> &RuleTable {
        &self.table
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
