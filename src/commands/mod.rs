// A line of console input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Name(String),
    Check,
    Vote(usize), // zero-based candidate index
    Results,
    Json,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    BadCandidate(String),
}

pub const HELP: &str = "\
Commands:
  name <your name>   set the voter name
  check              check whether this name has voted
  vote <number>      vote for the numbered candidate
  results            refresh the vote counts
  json               print the vote counts as JSON
  help               show this help
  quit               leave";

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        // An empty name is allowed; it clears the current voter.
        "name" => Ok(Command::Name(rest.to_string())),
        "check" => Ok(Command::Check),
        "vote" => match rest.parse::<usize>() {
            // Candidates are shown numbered from 1
            Ok(n) if n >= 1 => Ok(Command::Vote(n - 1)),
            _ => Err(ParseError::BadCandidate(rest.to_string())),
        },
        "results" => Ok(Command::Results),
        "json" => Ok(Command::Json),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}
