use std::env;
use std::str::FromStr;
use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Memory,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "memory" => Ok(Backend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub database_url: String,
    pub max_connections: u32,
    pub candidates: Vec<String>,
}

impl Config {
    // Read configuration from the process environment (after .env is loaded)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = parse_or("VOTE_BACKEND", &lookup, Backend::Sqlite)?;
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            info!("DATABASE_URL not set, using default");
            "sqlite:trusty_vote.db".to_string()
        });
        let max_connections = parse_or("DB_MAX_CONNECTIONS", &lookup, 5)?;
        let candidates = lookup("VOTE_CANDIDATES")
            .map(|list| parse_candidates(&list))
            .unwrap_or_default();

        Ok(Self {
            backend,
            database_url,
            max_connections,
            candidates,
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

// Comma-separated names; surrounding whitespace and empty entries are dropped.
pub fn parse_candidates(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
