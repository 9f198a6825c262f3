use serde::{Deserialize, Serialize};
use std::fmt;

// A ballot entry. Position in the candidate list is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub index: usize,
    pub name: String,
}

impl Candidate {
    pub fn from_names(names: Vec<String>) -> Vec<Candidate> {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Candidate { index, name })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub candidate: String,
    pub vote_count: u64,
}

impl VoteTally {
    pub fn new(candidate: impl Into<String>, vote_count: u64) -> Self {
        Self {
            candidate: candidate.into(),
            vote_count,
        }
    }
}

/// What the vote service decided about a cast vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    Recorded,
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    AlreadyVoted,
    UnknownCandidate,
    InvalidVoter,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::AlreadyVoted => write!(f, "voter has already voted"),
            Rejection::UnknownCandidate => write!(f, "no such candidate"),
            Rejection::InvalidVoter => write!(f, "voter name is empty"),
        }
    }
}

// Message shown to the voter. Kept as a kind rather than text so that
// behavior never depends on how a message is worded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EnterNameFirst,
    VoteRecorded { candidate: String },
    AlreadyVoted,
    UnknownCandidate,
    VoteRejected(Rejection),
    VoteFailed,
    LoadFailed,
    ServiceUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EnterNameFirst => write!(f, "Please enter your name first."),
            Notice::VoteRecorded { candidate } => write!(f, "Your vote for {} has been recorded.", candidate),
            Notice::AlreadyVoted => write!(f, "You have already voted."),
            Notice::UnknownCandidate => write!(f, "That candidate is not on the ballot."),
            Notice::VoteRejected(reason) => write!(f, "Vote rejected: {}.", reason),
            Notice::VoteFailed => write!(f, "Something went wrong while voting."),
            Notice::LoadFailed => write!(f, "Failed to load data."),
            Notice::ServiceUnavailable => write!(f, "The vote service is unavailable."),
        }
    }
}
