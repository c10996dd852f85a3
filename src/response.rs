//! The answer payload produced by resolvers and remote sources alike.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::visualization::VisualizationSpec;

/// A fully resolved answer: text plus an optional chart.
///
/// `text` may hold newline-separated paragraphs or list markup; the engine
/// never parses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    #[serde(default, deserialize_with = "lenient_visualization")]
    pub visualization: Option<VisualizationSpec>,
}

/// A chart that cannot be read is dropped; the text still stands.
fn lenient_visualization<'de, D>(deserializer: D) -> Result<Option<VisualizationSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(spec) => Ok(Some(spec)),
            Err(e) => {
                warn!(error = %e, "Dropping unreadable visualization");
                Ok(None)
            }
        },
    }
}

impl Response {
    /// Create a text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visualization: None,
        }
    }

    /// Attach a chart.
    pub fn with_visualization(mut self, spec: VisualizationSpec) -> Self {
        self.visualization = Some(spec);
        self
    }

    /// Check the payload is usable as an answer.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("response text is empty".to_string());
        }
        Ok(())
    }
}
