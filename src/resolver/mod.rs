//! Fact resolvers.
//!
//! A [`FactResolver`] turns the rule picked by the classifier (or no rule)
//! into a [`Response`]. Two implementations ship:
//! - [`StaticResolver`]: hand-authored answers for the built-in intents
//! - [`DatasetResolver`]: the same intents computed from a loaded [`Dataset`]
//!
//! Neither has a failure path; an intent with nothing to say resolves to the
//! default help response.
//!
//! [`Dataset`]: crate::dataset::Dataset

mod canned;
mod computed;

pub use canned::*;
pub use computed::*;

use crate::intent::{Rule, EXAMPLE_QUESTIONS};
use crate::response::Response;

/// Capability turning a classification result into an answer.
pub trait FactResolver: Send + Sync {
    /// Resolve a matched rule, or the absence of one, to a response.
    fn resolve(&self, rule: Option<&Rule>) -> Response;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Answer for questions no rule understands: example questions, no chart.
pub fn default_response() -> Response {
    let examples: Vec<String> = EXAMPLE_QUESTIONS
        .iter()
        .map(|q| format!("- {}", q))
        .collect();

    Response::text(format!(
        "I don't have specific information about that. Try asking about student performance, \
         exercise difficulty, or time spent on exercises.\n\nExample questions:\n{}",
        examples.join("\n")
    ))
}
