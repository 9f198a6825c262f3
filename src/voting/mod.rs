pub mod plurality;

// Summary of a tally list, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsSummary {
    pub leaders: Vec<String>,   // Every candidate sharing the top count; empty when nobody voted
    pub total_votes: u64,
    pub lines: Vec<ResultLine>, // One line per candidate, in ballot order
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultLine {
    pub candidate: String,
    pub votes: u64,
    pub percentage: f64,
    pub leading: bool,
}

pub use plurality::summarize;
