//! # Analytics Assistant
//!
//! A conversational engine that answers free-text questions about a student
//! exercise-performance dataset. Each question is classified against an ordered
//! keyword rule table, resolved to a textual fact plus an optional chart, and
//! appended to a conversation transcript while a single live chart is managed
//! on the side.
//!
//! ## Architecture
//!
//! ```text
//! ConversationSession ──▶ ServiceAdapter ──▶ RemoteClient (HTTP, bounded wait)
//!        │                      │ on failure
//!        │                      ▼
//!        │             IntentClassifier ──▶ FactResolver (static | dataset)
//!        ▼
//! VisualizationController (one live chart) + ChatTranscript
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use analytics_assistant::{Config, ConversationSession, ServiceAdapter};
//! use analytics_assistant::render::TerminalChartRenderer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let adapter = ServiceAdapter::from_config(&config, None)?;
//!     let mut session =
//!         ConversationSession::new(Arc::new(adapter), TerminalChartRenderer::stdout());
//!     session.submit("Who has the highest average score?").await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Visualization lifecycle controller and the rendering backend seam.
pub mod chart;
/// Configuration management loaded from the environment.
pub mod config;
/// Student exercise dataset loading and aggregates.
pub mod dataset;
/// Error types and result aliases for the application.
pub mod error;
/// Question normalization, keyword predicates and the ordered rule table.
pub mod intent;
/// HTTP client and wire types for the remote knowledge source.
pub mod remote;
/// Terminal implementations of the rendering collaborators.
pub mod render;
/// Fact resolvers turning a matched rule into a response.
pub mod resolver;
/// The answer payload shared by every stage of the pipeline.
pub mod response;
/// Remote-then-local answering policy.
pub mod service;
/// Conversation session and transcript.
pub mod session;
/// Renderer-agnostic chart descriptions.
pub mod visualization;

pub use chart::{ChartRenderer, ChartState, VisualizationController};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use intent::{IntentClassifier, Question, Rule, RuleTable};
pub use resolver::{DatasetResolver, FactResolver, StaticResolver};
pub use response::Response;
pub use service::{AnswerSource, Answerer, ServiceAdapter};
pub use session::{ConversationSession, SessionState};
pub use visualization::{ChartKind, VisualizationSpec};
