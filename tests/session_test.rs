//! Conversation session scenarios
//!
//! End-to-end runs through the built-in rules with the terminal renderers
//! writing into memory.

use pretty_assertions::assert_eq;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use analytics_assistant::chart::{ChartRenderer, ChartState};
use analytics_assistant::error::{RenderError, SessionError};
use analytics_assistant::render::{TerminalChartRenderer, TerminalTranscript};
use analytics_assistant::session::{Sender, APOLOGY_TEXT};
use analytics_assistant::visualization::{ChartKind, VisualizationSpec};
use analytics_assistant::{ConversationSession, ServiceAdapter, SessionState};

/// Writer that shares its buffer so tests can read what was printed.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records every create/destroy call and the live count after each.
#[derive(Clone, Default)]
struct RecordingRenderer {
    log: Arc<Mutex<Vec<String>>>,
    live: Arc<Mutex<usize>>,
}

impl ChartRenderer for RecordingRenderer {
    type Handle = String;

    fn create(&mut self, spec: &VisualizationSpec) -> Result<String, RenderError> {
        let mut live = self.live.lock().unwrap();
        assert_eq!(*live, 0, "a chart was still live");
        *live += 1;
        self.log.lock().unwrap().push(format!("create {}", spec.title()));
        Ok(spec.title().to_string())
    }

    fn destroy(&mut self, handle: String) {
        *self.live.lock().unwrap() -= 1;
        self.log.lock().unwrap().push(format!("destroy {}", handle));
    }
}

fn local_session() -> (ConversationSession<RecordingRenderer>, RecordingRenderer) {
    let renderer = RecordingRenderer::default();
    let session = ConversationSession::new(Arc::new(ServiceAdapter::builtin()), renderer.clone());
    (session, renderer)
}

#[tokio::test]
async fn test_example_questions_in_order() {
    let (mut session, renderer) = local_session();

    session
        .submit("Which student has the highest average score?")
        .await
        .unwrap();
    session
        .submit("What is the most difficult exercise?")
        .await
        .unwrap();
    let reply = session.submit("What is the weather today?").await.unwrap();
    assert!(reply.text().starts_with("I don't have specific information about that."));

    let senders: Vec<Sender> = session
        .transcript()
        .messages()
        .iter()
        .map(|m| m.sender())
        .collect();
    assert_eq!(
        senders,
        vec![
            Sender::User,
            Sender::Assistant,
            Sender::User,
            Sender::Assistant,
            Sender::User,
            Sender::Assistant,
        ]
    );

    assert_eq!(
        *renderer.log.lock().unwrap(),
        vec![
            "create Top 5 Students by Average Score".to_string(),
            "destroy Top 5 Students by Average Score".to_string(),
            "create 5 Most Difficult Exercises".to_string(),
            "destroy 5 Most Difficult Exercises".to_string(),
        ]
    );
    assert_eq!(session.chart_state(), ChartState::Hidden);
    assert_eq!(*renderer.live.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_horizontal_chart_reaches_renderer_normalized() {
    let (mut session, _renderer) = local_session();
    session.submit("hardest exercise").await.unwrap();

    let chart = session.charts().current().unwrap();
    assert_eq!(chart.kind(), ChartKind::Bar);
    assert_eq!(chart.authored_kind(), ChartKind::HorizontalBar);
    assert_eq!(chart.options()["indexAxis"], "y");
}

#[tokio::test]
async fn test_blank_submissions_leave_no_trace() {
    let (mut session, renderer) = local_session();
    for blank in ["", "   ", "\n\t"] {
        let err = session.submit(blank).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput { .. }));
    }
    assert!(session.transcript().is_empty());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(renderer.log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_close_tears_down_live_chart() {
    let (mut session, renderer) = local_session();
    session.submit("best student").await.unwrap();
    assert_eq!(*renderer.live.lock().unwrap(), 1);

    let transcript = session.close();
    assert_eq!(transcript.len(), 2);
    assert_eq!(*renderer.live.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_terminal_output_end_to_end() {
    let charts = SharedBuffer::default();
    let messages = SharedBuffer::default();

    let mut session = ConversationSession::new(
        Arc::new(ServiceAdapter::builtin()),
        TerminalChartRenderer::new(charts.clone()),
    )
    .with_observer(Box::new(TerminalTranscript::new(messages.clone())));

    session
        .submit("What is the pass rate for exercise Ü1A3a)_?")
        .await
        .unwrap();

    let printed = messages.contents();
    assert!(printed.starts_with("You:\n  What is the pass rate for exercise Ü1A3a)_?\n"));
    assert!(printed.contains("Assistant is typing..."));
    assert!(printed.contains("78.3%"));

    let drawn = charts.contents();
    assert!(drawn.contains("(pie)"));
    assert!(drawn.contains("78.3"));
}

#[test]
fn test_apology_text_is_exact() {
    assert_eq!(
        APOLOGY_TEXT,
        "Sorry, I encountered an error processing your question. Please try again."
    );
}
