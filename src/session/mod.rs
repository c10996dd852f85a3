//! Conversation session.
//!
//! A session sequences one question at a time through the answerer, the
//! transcript and the visualization controller:
//!
//! ```text
//! idle ──submit──▶ awaiting-response ──answer / defect──▶ idle
//! ```
//!
//! While awaiting, a pending indicator is shown to observers. It is not a
//! transcript entry and is always removed before the answer is appended.
//! `submit` borrows the session mutably, so a second question cannot be
//! started while one is in flight; the [`SessionError::Busy`] guard rejects
//! it should the state ever say otherwise.
//!
//! The awaiting state is held by a drop guard. A panicking answerer is
//! caught and answered with the apology, and a `submit` future dropped
//! mid-wait (timeout, task abort) still leaves the session idle with the
//! indicator removed. The question of a dropped submit stays in the
//! transcript without a reply.

mod transcript;

pub use transcript::*;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::chart::{ChartRenderer, ChartState, VisualizationController};
use crate::error::{AppError, SessionError};
use crate::intent::Question;
use crate::service::Answerer;

/// Reply appended when the answerer fails unexpectedly.
pub const APOLOGY_TEXT: &str =
    "Sorry, I encountered an error processing your question. Please try again.";

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Ready for a question.
    Idle,
    /// A question is being answered.
    AwaitingResponse,
}

/// Transient "assistant is typing" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIndicator {
    /// Ordinal of the user message being answered.
    pub question_ordinal: u64,
    /// When the indicator appeared.
    pub since: DateTime<Utc>,
}

/// Receives transcript notifications, e.g. to draw them.
pub trait TranscriptObserver: Send {
    /// A message was appended.
    fn message_appended(&mut self, message: &ChatMessage);

    /// The pending indicator appeared.
    fn indicator_shown(&mut self, _indicator: &PendingIndicator) {}

    /// The pending indicator was removed.
    fn indicator_removed(&mut self) {}
}

/// One conversation: transcript, pending indicator and the live chart.
pub struct ConversationSession<R: ChartRenderer> {
    id: String,
    answerer: Arc<dyn Answerer>,
    transcript: ChatTranscript,
    state: SessionState,
    pending: Option<PendingIndicator>,
    charts: VisualizationController<R>,
    observers: Vec<Box<dyn TranscriptObserver>>,
}

impl<R: ChartRenderer> ConversationSession<R> {
    /// Start a conversation.
    pub fn new(answerer: Arc<dyn Answerer>, renderer: R) -> Self {
        let id = Uuid::new_v4().to_string();
        info!(session_id = %id, "Conversation started");
        Self {
            id,
            answerer,
            transcript: ChatTranscript::new(),
            state: SessionState::Idle,
            pending: None,
            charts: VisualizationController::new(renderer),
            observers: Vec::new(),
        }
    }

    /// Register a transcript observer.
    pub fn with_observer(mut self, observer: Box<dyn TranscriptObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Ask one question and wait for its answer.
    ///
    /// Returns the assistant message appended for this question. An answerer
    /// error never escapes: it becomes an apology message.
    ///
    /// # Errors
    /// - [`SessionError::InvalidInput`] for an empty question (nothing changes)
    /// - [`SessionError::Busy`] if a question is already awaiting a response
    pub async fn submit(&mut self, raw: &str) -> Result<&ChatMessage, SessionError> {
        let question = Question::parse(raw)?;
        if self.state == SessionState::AwaitingResponse {
            return Err(SessionError::Busy);
        }

        let ordinal = self.append(Sender::User, question.as_str());

        debug!(session_id = %self.id, ordinal, "Awaiting answer");
        let outcome = {
            let _pending =
                PendingGuard::begin(&mut self.state, &mut self.pending, &mut self.observers, ordinal);
            AssertUnwindSafe(self.answerer.answer(&question))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(AppError::Internal {
                        message: panic_message(&*panic),
                    })
                })
        };

        let reply = match outcome {
            Ok(response) => {
                let reply = self.append(Sender::Assistant, &response.text);
                if let Err(e) = self.charts.apply(response.visualization.as_ref()) {
                    // The answer stands; only the chart is lost
                    error!(session_id = %self.id, error = %e, "Failed to render chart");
                }
                reply
            }
            Err(e) => {
                error!(session_id = %self.id, error = %e, "Unexpected error answering question");
                self.charts.hide();
                self.append(Sender::Assistant, APOLOGY_TEXT)
            }
        };

        Ok(&self.transcript.messages()[reply as usize - 1])
    }

    /// End the conversation, tearing down any live chart.
    pub fn close(mut self) -> ChatTranscript {
        self.charts.hide();
        info!(
            session_id = %self.id,
            messages = self.transcript.len(),
            "Conversation closed"
        );
        std::mem::take(&mut self.transcript)
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The pending indicator, present only while awaiting a response.
    pub fn pending(&self) -> Option<&PendingIndicator> {
        self.pending.as_ref()
    }

    /// Messages so far.
    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// Visualization controller state.
    pub fn chart_state(&self) -> ChartState {
        self.charts.state()
    }

    /// Read-only view of the visualization controller.
    pub fn charts(&self) -> &VisualizationController<R> {
        &self.charts
    }

    fn append(&mut self, sender: Sender, text: &str) -> u64 {
        let message = self.transcript.append(sender, text);
        for observer in &mut self.observers {
            observer.message_appended(message);
        }
        message.ordinal()
    }
}

/// Keeps the session awaiting a response until dropped.
///
/// Dropping returns the state to idle and removes the indicator, whether the
/// answer arrived or the wait was abandoned.
struct PendingGuard<'a> {
    state: &'a mut SessionState,
    pending: &'a mut Option<PendingIndicator>,
    observers: &'a mut [Box<dyn TranscriptObserver>],
}

impl<'a> PendingGuard<'a> {
    fn begin(
        state: &'a mut SessionState,
        pending: &'a mut Option<PendingIndicator>,
        observers: &'a mut [Box<dyn TranscriptObserver>],
        question_ordinal: u64,
    ) -> Self {
        *state = SessionState::AwaitingResponse;
        let indicator = PendingIndicator {
            question_ordinal,
            since: Utc::now(),
        };
        for observer in observers.iter_mut() {
            observer.indicator_shown(&indicator);
        }
        *pending = Some(indicator);
        Self {
            state,
            pending,
            observers,
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        *self.state = SessionState::Idle;
        if self.pending.take().is_some() {
            for observer in self.observers.iter_mut() {
                observer.indicator_removed();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("answerer panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("answerer panicked: {}", message)
    } else {
        "answerer panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppResult, RenderError};
    use crate::response::Response;
    use crate::service::ServiceAdapter;
    use crate::visualization::VisualizationSpec;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct NullRenderer;

    impl ChartRenderer for NullRenderer {
        type Handle = ();

        fn create(&mut self, _spec: &VisualizationSpec) -> Result<(), RenderError> {
            Ok(())
        }

        fn destroy(&mut self, _handle: ()) {}
    }

    struct BrokenRenderer;

    impl ChartRenderer for BrokenRenderer {
        type Handle = ();

        fn create(&mut self, _spec: &VisualizationSpec) -> Result<(), RenderError> {
            Err(RenderError::Backend {
                message: "no canvas".to_string(),
            })
        }

        fn destroy(&mut self, _handle: ()) {}
    }

    struct FailingAnswerer;

    #[async_trait]
    impl Answerer for FailingAnswerer {
        async fn answer(&self, _question: &Question) -> AppResult<Response> {
            Err(AppError::Internal {
                message: "resolver panicked".to_string(),
            })
        }
    }

    /// Panics on the first question, answers afterwards.
    #[derive(Default)]
    struct PanicsOnce(AtomicUsize);

    #[async_trait]
    impl Answerer for PanicsOnce {
        async fn answer(&self, _question: &Question) -> AppResult<Response> {
            if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("index out of bounds");
            }
            Ok(Response::text("Second time lucky"))
        }
    }

    /// Never finishes the first question, answers afterwards.
    #[derive(Default)]
    struct StallsOnce(AtomicBool);

    #[async_trait]
    impl Answerer for StallsOnce {
        async fn answer(&self, _question: &Question) -> AppResult<Response> {
            if !self.0.swap(true, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            Ok(Response::text("Back again"))
        }
    }

    /// Records observer events as strings.
    struct EventLog(Arc<Mutex<Vec<String>>>);

    impl TranscriptObserver for EventLog {
        fn message_appended(&mut self, message: &ChatMessage) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{}:{}", message.sender().as_str(), message.ordinal()));
        }

        fn indicator_shown(&mut self, indicator: &PendingIndicator) {
            self.0
                .lock()
                .unwrap()
                .push(format!("pending:{}", indicator.question_ordinal));
        }

        fn indicator_removed(&mut self) {
            self.0.lock().unwrap().push("pending-removed".to_string());
        }
    }

    fn session() -> ConversationSession<NullRenderer> {
        ConversationSession::new(Arc::new(ServiceAdapter::builtin()), NullRenderer)
    }

    #[tokio::test]
    async fn test_blank_question_changes_nothing() {
        let mut session = session();
        let err = session.submit("   ").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput { .. }));
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_submit_appends_pair_and_shows_chart() {
        let mut session = session();
        let reply = session
            .submit("  Who has the highest average score?  ")
            .await
            .unwrap();
        assert_eq!(reply.sender(), Sender::Assistant);
        assert!(reply.text().contains("S03"));

        let entries = session.transcript().entries();
        assert_eq!(entries[0], (Sender::User, "Who has the highest average score?".to_string()));
        assert_eq!(session.chart_state(), ChartState::Visible);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_response_without_chart_hides() {
        let mut session = session();
        session.submit("best student").await.unwrap();
        assert_eq!(session.chart_state(), ChartState::Visible);

        session.submit("What is the weather today?").await.unwrap();
        assert_eq!(session.chart_state(), ChartState::Hidden);
    }

    #[tokio::test]
    async fn test_defect_becomes_apology() {
        let mut session = ConversationSession::new(Arc::new(FailingAnswerer), NullRenderer);
        let reply = session.submit("best student").await.unwrap();
        assert_eq!(reply.text(), APOLOGY_TEXT);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.pending().is_none());
        assert_eq!(session.chart_state(), ChartState::Hidden);
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_panicking_answerer_becomes_apology() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut session = ConversationSession::new(Arc::new(PanicsOnce::default()), NullRenderer)
            .with_observer(Box::new(EventLog(events.clone())));

        let reply = session.submit("best student").await.unwrap();
        assert_eq!(reply.text(), APOLOGY_TEXT);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.pending().is_none());
        assert_eq!(
            *events.lock().unwrap(),
            vec!["user:1", "pending:1", "pending-removed", "assistant:2"]
        );

        let reply = session.submit("best student").await.unwrap();
        assert_eq!(reply.text(), "Second time lucky");
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submit_returns_to_idle() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut session = ConversationSession::new(Arc::new(StallsOnce::default()), NullRenderer)
            .with_observer(Box::new(EventLog(events.clone())));

        let waited =
            tokio::time::timeout(Duration::from_secs(5), session.submit("best student")).await;
        assert!(waited.is_err());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.pending().is_none());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["user:1", "pending:1", "pending-removed"]
        );

        let reply = session.submit("best student").await.unwrap();
        assert_eq!(reply.text(), "Back again");
        assert_eq!(reply.ordinal(), 3);
    }

    #[test]
    fn test_panic_message_reads_payload() {
        assert_eq!(panic_message(&"boom"), "answerer panicked: boom");
        assert_eq!(panic_message(&"boom".to_string()), "answerer panicked: boom");
        assert_eq!(panic_message(&42_u8), "answerer panicked");
    }

    #[tokio::test]
    async fn test_render_failure_keeps_answer() {
        let mut session =
            ConversationSession::new(Arc::new(ServiceAdapter::builtin()), BrokenRenderer);
        let reply = session.submit("best student").await.unwrap();
        assert!(reply.text().contains("S03"));
        assert_eq!(session.chart_state(), ChartState::Hidden);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_indicator_brackets_answer() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut session = session().with_observer(Box::new(EventLog(events.clone())));
        session.submit("best student").await.unwrap();
        session.submit("hardest exercise").await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "user:1",
                "pending:1",
                "pending-removed",
                "assistant:2",
                "user:3",
                "pending:3",
                "pending-removed",
                "assistant:4",
            ]
        );
    }

    #[tokio::test]
    async fn test_busy_state_rejects_submit() {
        let mut session = session();
        session.state = SessionState::AwaitingResponse;
        assert_eq!(session.submit("best student").await.unwrap_err(), SessionError::Busy);
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_close_hides_chart_and_returns_transcript() {
        let mut session = session();
        session.submit("best student").await.unwrap();
        let transcript = session.close();
        assert_eq!(transcript.len(), 2);
    }
}
