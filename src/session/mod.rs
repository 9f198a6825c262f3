//! The voting client's state machine.
//!
//! A [`Session`] never talks to the vote service itself. Each user action
//! returns the [`Request`]s it needs performed, and the caller feeds the
//! answers back through [`Session::on_reply`] or [`Session::on_failure`].
//! This keeps every transition synchronous and lets `Submitting` be
//! observed while a vote is in flight.

use crate::models::{Candidate, Notice, Rejection, VoteOutcome, VoteTally};
use log::{info, warn};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListCandidates,
    ListTallies,
    HasVoted { voter: String },
    CastVote { candidate: usize, voter: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Candidates(Vec<String>),
    Tallies(Vec<VoteTally>),
    VoterStatus { voter: String, has_voted: bool },
    Vote { candidate: usize, voter: String, outcome: VoteOutcome },
}

// Where a submission returns to if the vote is not taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    NameEntered,
    Eligible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No name entered.
    Idle,
    /// Name present, vote status unknown.
    NameEntered,
    /// Name present and the service says it has not voted.
    Eligible,
    /// A vote is in flight.
    Submitting { candidate: usize, resume: Resume },
    /// The voter has voted; results are shown.
    Voted,
}

impl From<Resume> for Phase {
    fn from(resume: Resume) -> Self {
        match resume {
            Resume::NameEntered => Phase::NameEntered,
            Resume::Eligible => Phase::Eligible,
        }
    }
}

pub struct Session {
    id: Uuid,
    voter_name: String,
    phase: Phase,
    candidates: Vec<Candidate>,
    tallies: Vec<VoteTally>,
    notice: Option<Notice>,
    // Names the service has confirmed as voted during this session
    voted: HashSet<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        info!("[{}] session started", id);
        Self {
            id,
            voter_name: String::new(),
            phase: Phase::Idle,
            candidates: Vec::new(),
            tallies: Vec::new(),
            notice: None,
            voted: HashSet::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn voter_name(&self) -> &str {
        &self.voter_name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn tallies(&self) -> &[VoteTally] {
        &self.tallies
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn has_voted(&self) -> bool {
        self.phase == Phase::Voted
    }

    pub fn results_visible(&self) -> bool {
        self.phase == Phase::Voted
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    /// Whether the candidate list may be offered to the current voter.
    pub fn ballot_visible(&self) -> bool {
        matches!(self.phase, Phase::NameEntered | Phase::Eligible)
    }

    fn trimmed_name(&self) -> &str {
        self.voter_name.trim()
    }

    pub fn load(&self) -> Vec<Request> {
        vec![Request::ListCandidates, Request::ListTallies]
    }

    pub fn enter_name(&mut self, text: &str) {
        if self.is_pending() {
            warn!("[{}] name change ignored while a vote is pending", self.id);
            return;
        }
        self.voter_name = text.to_string();
        self.notice = None;
        self.phase = if self.trimmed_name().is_empty() {
            Phase::Idle
        } else if self.voted.contains(self.trimmed_name()) {
            // Never offer the ballot again to a name known to have voted.
            Phase::Voted
        } else {
            Phase::NameEntered
        };
    }

    pub fn check_status(&mut self) -> Option<Request> {
        if self.trimmed_name().is_empty() || self.is_pending() {
            return None;
        }
        Some(Request::HasVoted {
            voter: self.trimmed_name().to_string(),
        })
    }

    pub fn cast_vote(&mut self, candidate: usize) -> Option<Request> {
        let resume = match self.phase {
            Phase::Idle => {
                self.notice = Some(Notice::EnterNameFirst);
                return None;
            }
            Phase::Submitting { .. } => return None,
            Phase::Voted => {
                self.notice = Some(Notice::AlreadyVoted);
                return None;
            }
            Phase::NameEntered => Resume::NameEntered,
            Phase::Eligible => Resume::Eligible,
        };

        if candidate >= self.candidates.len() {
            self.notice = Some(Notice::UnknownCandidate);
            return None;
        }

        info!("[{}] submitting vote for candidate {}", self.id, candidate);
        self.phase = Phase::Submitting { candidate, resume };
        Some(Request::CastVote {
            candidate,
            voter: self.trimmed_name().to_string(),
        })
    }

    pub fn fetch_results(&self) -> Request {
        Request::ListTallies
    }

    /// Apply a successful service answer. Returns any follow-up requests.
    pub fn on_reply(&mut self, reply: Reply) -> Vec<Request> {
        match reply {
            Reply::Candidates(names) => {
                self.candidates = Candidate::from_names(names);
                Vec::new()
            }
            Reply::Tallies(tallies) => {
                if tallies.len() != self.candidates.len() {
                    warn!(
                        "[{}] {} tallies for {} candidates",
                        self.id,
                        tallies.len(),
                        self.candidates.len()
                    );
                }
                self.tallies = tallies;
                Vec::new()
            }
            Reply::VoterStatus { voter, has_voted } => self.on_voter_status(voter, has_voted),
            Reply::Vote { candidate, voter, outcome } => self.on_vote(candidate, voter, outcome),
        }
    }

    fn on_voter_status(&mut self, voter: String, has_voted: bool) -> Vec<Request> {
        if voter != self.trimmed_name() || self.is_pending() {
            warn!("[{}] dropping stale status for {}", self.id, voter);
            return Vec::new();
        }

        self.notice = None;
        match (self.phase, has_voted) {
            (Phase::NameEntered | Phase::Eligible | Phase::Voted, true) => {
                self.voted.insert(voter);
                self.phase = Phase::Voted;
                vec![self.fetch_results()]
            }
            (Phase::NameEntered | Phase::Eligible, false) => {
                self.phase = Phase::Eligible;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_vote(&mut self, candidate: usize, voter: String, outcome: VoteOutcome) -> Vec<Request> {
        let resume = match self.phase {
            Phase::Submitting { candidate: pending, resume }
                if pending == candidate && voter == self.trimmed_name() =>
            {
                resume
            }
            _ => {
                warn!("[{}] vote reply for {} with no matching submission", self.id, voter);
                return vec![self.fetch_results()];
            }
        };

        match outcome {
            VoteOutcome::Recorded => {
                let name = self
                    .candidates
                    .get(candidate)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                info!("[{}] vote recorded for {}", self.id, name);
                self.voted.insert(voter);
                self.phase = Phase::Voted;
                self.notice = Some(Notice::VoteRecorded { candidate: name });
            }
            VoteOutcome::Rejected(Rejection::AlreadyVoted) => {
                warn!("[{}] {} has already voted", self.id, voter);
                self.voted.insert(voter);
                self.phase = Phase::Voted;
                self.notice = Some(Notice::AlreadyVoted);
            }
            VoteOutcome::Rejected(Rejection::UnknownCandidate) => {
                self.phase = resume.into();
                self.notice = Some(Notice::UnknownCandidate);
            }
            VoteOutcome::Rejected(reason) => {
                self.phase = resume.into();
                self.notice = Some(Notice::VoteRejected(reason));
            }
        }

        // Tallies are refreshed after every vote, whatever the outcome.
        vec![self.fetch_results()]
    }

    /// Record that `request` could not be completed.
    pub fn on_failure(&mut self, request: &Request) {
        match request {
            Request::ListCandidates => self.notice = Some(Notice::LoadFailed),
            Request::ListTallies if self.candidates.is_empty() => {
                self.notice = Some(Notice::LoadFailed)
            }
            Request::ListTallies | Request::HasVoted { .. } => {
                self.notice = Some(Notice::ServiceUnavailable)
            }
            Request::CastVote { .. } => {
                if let Phase::Submitting { resume, .. } = self.phase {
                    self.phase = resume.into();
                }
                self.notice = Some(Notice::VoteFailed);
            }
        }
    }
}
