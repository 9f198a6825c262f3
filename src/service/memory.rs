use super::{ServiceError, VoteService};
use crate::models::{Rejection, VoteOutcome, VoteTally};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

struct Ballots {
    candidates: Vec<String>,
    // voter name -> (candidate index, cast time)
    votes: HashMap<String, (usize, DateTime<Utc>)>,
}

// In-process vote store. Useful for local runs and tests.
pub struct MemoryVoteService {
    ballots: Mutex<Ballots>,
}

impl MemoryVoteService {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            ballots: Mutex::new(Ballots {
                candidates,
                votes: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ballots>, ServiceError> {
        self.ballots
            .lock()
            .map_err(|_| ServiceError::Unavailable("vote store lock poisoned".to_string()))
    }
}

#[async_trait]
impl VoteService for MemoryVoteService {
    async fn list_candidates(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.lock()?.candidates.clone())
    }

    async fn list_tallies(&self) -> Result<Vec<VoteTally>, ServiceError> {
        let ballots = self.lock()?;
        let mut counts = vec![0u64; ballots.candidates.len()];
        for (candidate, _) in ballots.votes.values() {
            if let Some(count) = counts.get_mut(*candidate) {
                *count += 1;
            }
        }
        Ok(ballots
            .candidates
            .iter()
            .zip(counts)
            .map(|(name, count)| VoteTally::new(name.clone(), count))
            .collect())
    }

    async fn has_voted(&self, voter: &str) -> Result<bool, ServiceError> {
        Ok(self.lock()?.votes.contains_key(voter.trim()))
    }

    async fn cast_vote(&self, candidate: usize, voter: &str) -> Result<VoteOutcome, ServiceError> {
        let voter = voter.trim();
        if voter.is_empty() {
            return Ok(VoteOutcome::Rejected(Rejection::InvalidVoter));
        }

        // Check and insert under one lock so a name can only ever win once.
        let mut ballots = self.lock()?;
        if candidate >= ballots.candidates.len() {
            return Ok(VoteOutcome::Rejected(Rejection::UnknownCandidate));
        }
        if ballots.votes.contains_key(voter) {
            return Ok(VoteOutcome::Rejected(Rejection::AlreadyVoted));
        }
        ballots.votes.insert(voter.to_string(), (candidate, Utc::now()));
        info!("Recorded vote for candidate {} by {}", candidate, voter);
        Ok(VoteOutcome::Recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn service() -> MemoryVoteService {
        MemoryVoteService::new(vec!["Alice".to_string(), "Bob".to_string()])
    }

    #[tokio::test]
    async fn second_vote_for_same_name_is_rejected() {
        let service = service();
        assert_eq!(service.cast_vote(0, "Sam").await.unwrap(), VoteOutcome::Recorded);
        assert_eq!(
            service.cast_vote(1, " Sam ").await.unwrap(),
            VoteOutcome::Rejected(Rejection::AlreadyVoted)
        );
        assert!(service.has_voted("Sam").await.unwrap());
        assert_eq!(
            service.list_tallies().await.unwrap(),
            vec![VoteTally::new("Alice", 1), VoteTally::new("Bob", 0)]
        );
    }

    #[tokio::test]
    async fn rejects_out_of_range_candidate_and_blank_voter() {
        let service = service();
        assert_eq!(
            service.cast_vote(2, "Sam").await.unwrap(),
            VoteOutcome::Rejected(Rejection::UnknownCandidate)
        );
        assert_eq!(
            service.cast_vote(0, "   ").await.unwrap(),
            VoteOutcome::Rejected(Rejection::InvalidVoter)
        );
        assert!(!service.has_voted("Sam").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_for_one_name_record_once() {
        let service = Arc::new(service());
        let mut handles = Vec::new();
        for i in 0..16 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move { service.cast_vote(i % 2, "Sam").await }));
        }

        let mut recorded = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == VoteOutcome::Recorded {
                recorded += 1;
            }
        }
        assert_eq!(recorded, 1);

        let total: u64 = service.list_tallies().await.unwrap().iter().map(|t| t.vote_count).sum();
        assert_eq!(total, 1);
    }
}
