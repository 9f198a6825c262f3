mod view;

use crate::client::Client;
use crate::commands::{self, Command, ParseError};
use crate::service::VoteService;
use log::{info, warn};

pub use view::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// Handle one line of console input, returning the text to print
pub async fn handle_line<S: VoteService + ?Sized>(client: &mut Client<S>, line: &str) -> (Flow, String) {
    match commands::parse(line) {
        Ok(command) => handle_command(client, command).await,
        Err(ParseError::Empty) => (Flow::Continue, String::new()),
        Err(ParseError::BadCandidate(input)) => {
            warn!("Invalid candidate number: {:?}", input);
            (Flow::Continue, format!("'{}' is not a candidate number.", input))
        }
        Err(ParseError::Unknown(word)) => {
            warn!("Unknown command: {}", word);
            (Flow::Continue, format!("Unknown command '{}'. Type 'help' for commands.", word))
        }
    }
}

pub async fn handle_command<S: VoteService + ?Sized>(
    client: &mut Client<S>,
    command: Command,
) -> (Flow, String) {
    info!("Received command: {:?}", command);
    match command {
        Command::Name(name) => {
            client.enter_name(&name);
            // Submitting a name checks it straight away
            client.check_status().await;
        }
        Command::Check => client.check_status().await,
        Command::Vote(index) => client.cast_vote(index).await,
        Command::Results => client.fetch_results().await,
        Command::Json => {
            let json = serde_json::to_string_pretty(client.session().tallies())
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
            return (Flow::Continue, json);
        }
        Command::Help => return (Flow::Continue, commands::HELP.to_string()),
        Command::Quit => return (Flow::Quit, String::new()),
    }
    (Flow::Continue, render(client.session()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VoteOutcome, VoteTally};
    use crate::service::{MemoryVoteService, ServiceError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Confirms the voter once, then stops answering status checks.
    struct FlakyStatus {
        answered: AtomicBool,
    }

    #[async_trait]
    impl VoteService for FlakyStatus {
        async fn list_candidates(&self) -> Result<Vec<String>, ServiceError> {
            Ok(vec!["Alice".to_string(), "Bob".to_string()])
        }

        async fn list_tallies(&self) -> Result<Vec<VoteTally>, ServiceError> {
            Ok(vec![VoteTally::new("Alice", 1), VoteTally::new("Bob", 0)])
        }

        async fn has_voted(&self, _voter: &str) -> Result<bool, ServiceError> {
            if self.answered.swap(true, Ordering::SeqCst) {
                Err(ServiceError::Unavailable("timed out".to_string()))
            } else {
                Ok(true)
            }
        }

        async fn cast_vote(&self, _candidate: usize, _voter: &str) -> Result<VoteOutcome, ServiceError> {
            Err(ServiceError::Unavailable("timed out".to_string()))
        }
    }

    async fn client() -> Client<MemoryVoteService> {
        let service = MemoryVoteService::new(vec!["Alice".to_string(), "Bob".to_string()]);
        let mut client = Client::new(Arc::new(service));
        client.load().await;
        client
    }

    #[tokio::test]
    async fn name_then_vote_shows_results() {
        let mut client = client().await;

        let (flow, out) = handle_line(&mut client, "name Sam").await;
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("1. Alice"));

        let (_, out) = handle_line(&mut client, "vote 2").await;
        assert!(out.contains("Thank you Sam"));
        assert!(out.contains("Bob: 1 votes"));
        assert!(!out.contains("1. Alice"));
    }

    #[tokio::test]
    async fn known_voter_never_gets_the_ballot_when_status_check_fails() {
        let mut client = Client::new(Arc::new(FlakyStatus { answered: AtomicBool::new(false) }));
        client.load().await;

        let (_, out) = handle_line(&mut client, "name Sam").await;
        assert!(out.contains("Thank you Sam"));

        let (_, out) = handle_line(&mut client, "name Sam").await;
        assert!(!out.contains("Choose one candidate"));
        assert!(!out.contains("1. Alice"));
        assert!(out.contains("Thank you Sam"));
        assert!(out.contains("The vote service is unavailable."));
    }

    #[tokio::test]
    async fn json_lists_tallies() {
        let mut client = client().await;
        let (_, out) = handle_line(&mut client, "json").await;
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["candidate"], "Alice");
        assert_eq!(parsed[1]["voteCount"], 0);
    }

    #[tokio::test]
    async fn quit_and_unknown_input() {
        let mut client = client().await;
        assert_eq!(handle_line(&mut client, "quit").await.0, Flow::Quit);
        let (flow, out) = handle_line(&mut client, "dance").await;
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("Unknown command"));
    }
}
