//! Remote knowledge source.
//!
//! The wire contract is a single `POST` carrying the question (optionally the
//! dataset and model parameters) and answered with `200 {text, visualization}`.
//! Any other status, transport error or malformed body is a [`RemoteError`].
//!
//! [`RemoteError`]: crate::error::RemoteError

mod client;
mod types;


pub use client::RemoteClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::RemoteResult;
use crate::response::Response;

/// A source of answers living outside the process.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Ask the source one question.
    async fn ask(&self, request: &RemoteRequest) -> RemoteResult<Response>;

    /// Where the source lives, for logs.
    fn describe(&self) -> String;
}
