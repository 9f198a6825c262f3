use crate::service::{ServiceError, VoteService};
use crate::session::{Reply, Request, Session};
use log::{error, info};
use std::collections::VecDeque;
use std::sync::Arc;

// Runs a session's requests against a vote service, one at a time.
pub struct Client<S: VoteService + ?Sized> {
    session: Session,
    service: Arc<S>,
}

impl<S: VoteService + ?Sized> Client<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            session: Session::new(),
            service,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // Fetch candidates and current tallies
    pub async fn load(&mut self) {
        let requests = self.session.load();
        self.run(requests).await;
        info!(
            "[{}] loaded {} candidate(s)",
            self.session.id(),
            self.session.candidates().len()
        );
    }

    pub fn enter_name(&mut self, text: &str) {
        self.session.enter_name(text);
    }

    pub async fn check_status(&mut self) {
        let request = self.session.check_status();
        self.run(request).await;
    }

    pub async fn cast_vote(&mut self, candidate: usize) {
        let request = self.session.cast_vote(candidate);
        self.run(request).await;
    }

    pub async fn fetch_results(&mut self) {
        let request = self.session.fetch_results();
        self.run(Some(request)).await;
    }

    async fn run(&mut self, requests: impl IntoIterator<Item = Request>) {
        let mut queue: VecDeque<Request> = requests.into_iter().collect();
        while let Some(request) = queue.pop_front() {
            match self.perform(&request).await {
                Ok(reply) => queue.extend(self.session.on_reply(reply)),
                Err(e) => {
                    error!("[{}] {:?} failed: {}", self.session.id(), request, e);
                    self.session.on_failure(&request);
                }
            }
        }
    }

    async fn perform(&self, request: &Request) -> Result<Reply, ServiceError> {
        let reply = match request {
            Request::ListCandidates => Reply::Candidates(self.service.list_candidates().await?),
            Request::ListTallies => Reply::Tallies(self.service.list_tallies().await?),
            Request::HasVoted { voter } => Reply::VoterStatus {
                voter: voter.clone(),
                has_voted: self.service.has_voted(voter).await?,
            },
            Request::CastVote { candidate, voter } => Reply::Vote {
                candidate: *candidate,
                voter: voter.clone(),
                outcome: self.service.cast_vote(*candidate, voter).await?,
            },
        };
        Ok(reply)
    }
}
