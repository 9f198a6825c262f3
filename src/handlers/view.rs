use crate::session::Session;
use crate::voting;
use std::fmt::Write;

// Text rendering of everything the voter should currently see
pub fn render(session: &Session) -> String {
    let mut out = String::new();

    if session.voter_name().trim().is_empty() {
        out.push_str("Enter your name with: name <your name>\n");
    } else {
        let _ = writeln!(out, "Voter: {}", session.voter_name().trim());
    }

    if session.ballot_visible() {
        out.push_str("\nChoose one candidate (vote <number>):\n");
        for candidate in session.candidates() {
            let _ = writeln!(out, "  {}. {}", candidate.index + 1, candidate.name);
        }
    }

    if session.is_pending() {
        out.push_str("\nSubmitting your vote...\n");
    }

    if session.has_voted() {
        let _ = writeln!(
            out,
            "\nThank you {}, you have taken part in this vote!",
            session.voter_name().trim()
        );
    }

    if session.results_visible() {
        out.push_str("\nResults:\n");
        let _ = writeln!(out, "{}", voting::summarize(session.tallies()));
    }

    if let Some(notice) = session.notice() {
        let _ = writeln!(out, "\n{}", notice);
    }

    out
}
