//! Unified error types surfaced by the runtime API.
//!
//! Arbitration itself never fails across the gate boundary; these errors
//! cover assembling the engine and coordinating its background worker.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime requires pool A to be registered before building")]
    MissingPool,

    #[error("sweeper worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("sweeper worker is no longer receiving ticks")]
    SweeperStopped,

    #[error("failed to install log subscriber: {0}")]
    Logging(String),

    #[error(transparent)]
    Content(#[from] anyhow::Error),
}
