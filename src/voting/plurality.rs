use crate::models::VoteTally;
use crate::voting::{ResultLine, ResultsSummary};
use std::fmt;

pub fn summarize(tallies: &[VoteTally]) -> ResultsSummary {
    let total_votes: u64 = tallies.iter().map(|t| t.vote_count).sum();
    let top = tallies.iter().map(|t| t.vote_count).max().unwrap_or(0);

    let lines: Vec<ResultLine> = tallies
        .iter()
        .map(|tally| ResultLine {
            candidate: tally.candidate.clone(),
            votes: tally.vote_count,
            percentage: percentage(tally.vote_count, total_votes),
            leading: total_votes > 0 && tally.vote_count == top,
        })
        .collect();

    let leaders = lines
        .iter()
        .filter(|line| line.leading)
        .map(|line| line.candidate.clone())
        .collect();

    ResultsSummary {
        leaders,
        total_votes,
        lines,
    }
}

// Share of the total, rounded to one decimal
fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (votes as f64 * 1000.0 / total as f64).round() / 10.0
}

impl fmt::Display for ResultsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_votes == 0 {
            return write!(f, "No votes were cast.");
        }

        for line in &self.lines {
            // Leaders are marked so ties stay visible
            let marker = if line.leading { "*" } else { " " };
            writeln!(f, "{} {}: {} votes ({:.1}%)", marker, line.candidate, line.votes, line.percentage)?;
        }

        match self.leaders.as_slice() {
            [only] => write!(f, "\n{} is leading with {} total votes.", only, self.total_votes),
            tied => write!(f, "\nTied between {} with {} total votes.", tied.join(", "), self.total_votes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_votes_has_no_leader() {
        let summary = summarize(&[VoteTally::new("Alice", 0), VoteTally::new("Bob", 0)]);
        assert!(summary.leaders.is_empty());
        assert_eq!(summary.total_votes, 0);
        assert_eq!(summary.to_string(), "No votes were cast.");
    }

    #[test]
    fn single_leader_with_percentages() {
        let summary = summarize(&[
            VoteTally::new("Alice", 2),
            VoteTally::new("Bob", 1),
        ]);
        assert_eq!(summary.leaders, vec!["Alice"]);
        assert_eq!(summary.lines[0].percentage, 66.7);
        assert_eq!(summary.lines[1].percentage, 33.3);
        assert!(summary.to_string().ends_with("Alice is leading with 3 total votes."));
        assert!(summary.to_string().contains("* Alice: 2 votes (66.7%)"));
    }

    #[test]
    fn ties_report_every_leader_in_ballot_order() {
        let summary = summarize(&[
            VoteTally::new("Alice", 1),
            VoteTally::new("Bob", 0),
            VoteTally::new("Carol", 1),
        ]);
        assert_eq!(summary.leaders, vec!["Alice", "Carol"]);
        assert!(summary.to_string().contains("Tied between Alice, Carol"));
    }
}
