//! Service adapter: the remote-then-local answering policy.
//!
//! Every call walks the same two-step ladder:
//! 1. [`ServiceAdapter::attempt_remote`]: ask the remote source under a
//!    bounded wait, if one is configured and enabled
//! 2. [`ServiceAdapter::answer_locally`]: classify and resolve in process
//!
//! The first step's failure is logged and absorbed; the second step cannot
//! fail. There are no retries and no circuit breaker.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{Config, ModelParams, RemoteConfig};
use crate::dataset::Dataset;
use crate::error::{AppResult, RemoteError, RemoteResult};
use crate::intent::{IntentClassifier, Question};
use crate::remote::{KnowledgeSource, RemoteClient, RemoteRequest};
use crate::resolver::{DatasetResolver, FactResolver, StaticResolver};
use crate::response::Response;

/// Anything that can answer a question for a conversation session.
///
/// An `Err` here is an unexpected defect; the session turns it into an
/// apology rather than propagating it.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Produce exactly one response for the question.
    async fn answer(&self, question: &Question) -> AppResult<Response>;
}

/// Which rung of the ladder produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// The remote knowledge source answered.
    Remote,
    /// The local classifier and resolver answered.
    Local,
}

impl AnswerSource {
    /// Source name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Remote => "remote",
            AnswerSource::Local => "local",
        }
    }
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Remote source plus the policy knobs that go with it.
struct RemoteRung {
    source: Arc<dyn KnowledgeSource>,
    enabled: bool,
    timeout: Duration,
    send_dataset: bool,
    model_params: ModelParams,
}

/// Orchestrates remote answering with a silent local fallback.
pub struct ServiceAdapter {
    remote: Option<RemoteRung>,
    classifier: IntentClassifier,
    resolver: Arc<dyn FactResolver>,
    dataset: Option<Arc<Dataset>>,
    local_delay: Duration,
}

impl ServiceAdapter {
    /// Local-only adapter over the given classifier and resolver.
    pub fn new(classifier: IntentClassifier, resolver: Arc<dyn FactResolver>) -> Self {
        Self {
            remote: None,
            classifier,
            resolver,
            dataset: None,
            local_delay: Duration::ZERO,
        }
    }

    /// Local-only adapter over the built-in rules and authored answers.
    pub fn builtin() -> Self {
        Self::new(IntentClassifier::builtin(), Arc::new(StaticResolver::new()))
    }

    /// Build an adapter from configuration.
    ///
    /// With a dataset the local rung computes answers from it; without one it
    /// serves the authored answers. A remote client is created only when the
    /// remote source is enabled.
    pub fn from_config(config: &Config, dataset: Option<Arc<Dataset>>) -> AppResult<Self> {
        let resolver: Arc<dyn FactResolver> = match &dataset {
            Some(data) => Arc::new(DatasetResolver::new(Arc::clone(data))),
            None => Arc::new(StaticResolver::new()),
        };

        let mut adapter = Self::new(IntentClassifier::builtin(), resolver)
            .with_local_delay(Duration::from_millis(config.assistant.local_delay_ms));

        if let Some(data) = dataset {
            adapter = adapter.with_dataset(data);
        }

        if config.remote.is_active() {
            let client = RemoteClient::new(&config.remote)?;
            info!(endpoint = %client.endpoint(), "Remote knowledge source enabled");
            adapter = adapter.with_remote(Arc::new(client), &config.remote);
        } else {
            info!("Remote knowledge source disabled, answering locally");
        }

        Ok(adapter)
    }

    /// Attach a remote source governed by `config`.
    pub fn with_remote(mut self, source: Arc<dyn KnowledgeSource>, config: &RemoteConfig) -> Self {
        self.remote = Some(RemoteRung {
            source,
            enabled: config.enabled,
            timeout: Duration::from_millis(config.timeout_ms),
            send_dataset: config.send_dataset,
            model_params: config.model_params.clone(),
        });
        self
    }

    /// Dataset handed to the remote source when `send_dataset` is set.
    pub fn with_dataset(mut self, dataset: Arc<Dataset>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Simulated latency for locally resolved answers.
    pub fn with_local_delay(mut self, delay: Duration) -> Self {
        self.local_delay = delay;
        self
    }

    /// Answer a question, reporting which rung answered.
    pub async fn answer_with_source(&self, question: &Question) -> (Response, AnswerSource) {
        let start = Instant::now();

        let (response, source) = match self.attempt_remote(question).await {
            Ok(response) => (response, AnswerSource::Remote),
            Err(RemoteError::Disabled) => {
                debug!("Remote source disabled, using local rules");
                (self.answer_locally(question).await, AnswerSource::Local)
            }
            Err(e) => {
                warn!(error = %e, "Remote source failed, falling back to local rules");
                (self.answer_locally(question).await, AnswerSource::Local)
            }
        };

        info!(
            source = %source,
            latency_ms = start.elapsed().as_millis(),
            has_chart = response.visualization.is_some(),
            "Question answered"
        );

        (response, source)
    }

    /// First rung: the remote source under a bounded wait.
    pub async fn attempt_remote(&self, question: &Question) -> RemoteResult<Response> {
        let rung = match &self.remote {
            Some(rung) if rung.enabled => rung,
            _ => return Err(RemoteError::Disabled),
        };

        let mut request = RemoteRequest::new(question.as_str())
            .with_model_params(rung.model_params.clone());
        if rung.send_dataset {
            if let Some(dataset) = &self.dataset {
                match serde_json::to_value(dataset.as_ref()) {
                    Ok(value) => request = request.with_dataset(value),
                    Err(e) => warn!(error = %e, "Failed to serialize dataset for remote request"),
                }
            }
        }

        debug!(source = %rung.source.describe(), "Asking remote source");

        let response = tokio::time::timeout(rung.timeout, rung.source.ask(&request))
            .await
            .map_err(|_| RemoteError::Timeout {
                timeout_ms: rung.timeout.as_millis() as u64,
            })??;

        // Sources other than RemoteClient may skip validation
        response
            .validate()
            .map_err(|message| RemoteError::InvalidResponse { message })?;

        Ok(response)
    }

    /// Second rung: classify and resolve in process.
    pub async fn answer_locally(&self, question: &Question) -> Response {
        if !self.local_delay.is_zero() {
            tokio::time::sleep(self.local_delay).await;
        }

        let rule = self.classifier.classify(question);
        debug!(
            resolver = self.resolver.name(),
            rule = rule.map(|r| r.name.as_str()).unwrap_or("none"),
            "Resolving locally"
        );
        self.resolver.resolve(rule)
    }
}

#[async_trait]
impl Answerer for ServiceAdapter {
    async fn answer(&self, question: &Question) -> AppResult<Response> {
        Ok(self.answer_with_source(question).await.0)
    }
}
