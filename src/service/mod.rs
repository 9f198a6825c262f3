pub mod memory;

use crate::models::{VoteOutcome, VoteTally};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryVoteService;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("vote service unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt data: {0}")]
    Corrupt(String),
}

/// The authoritative side of the voting workflow.
///
/// Implementations own persistence and must enforce at most one vote per
/// voter name atomically: two concurrent `cast_vote` calls for the same
/// name may not both return [`VoteOutcome::Recorded`].
#[async_trait]
pub trait VoteService: Send + Sync {
    /// Display names in ballot order. Stable for the lifetime of a session.
    async fn list_candidates(&self) -> Result<Vec<String>, ServiceError>;

    /// One tally per candidate, in candidate order.
    async fn list_tallies(&self) -> Result<Vec<VoteTally>, ServiceError>;

    async fn has_voted(&self, voter: &str) -> Result<bool, ServiceError>;

    async fn cast_vote(&self, candidate: usize, voter: &str) -> Result<VoteOutcome, ServiceError>;
}
