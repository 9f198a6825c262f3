mod client;
mod commands;
mod config;
mod db;
mod handlers;
mod models;
mod service;
mod session;
mod voting;

use client::Client;
use config::{Backend, Config};
use db::Database;
use handlers::Flow;
use service::{MemoryVoteService, ServiceError, VoteService};
use std::sync::Arc;
use log::{info, error, warn};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

async fn build_service(config: &Config) -> Result<Arc<dyn VoteService>, ServiceError> {
    match config.backend {
        Backend::Memory => {
            info!("Using in-memory vote store");
            Ok(Arc::new(MemoryVoteService::new(config.candidates.clone())))
        }
        Backend::Sqlite => {
            let database = Database::new(config).await?;
            database.seed_candidates(&config.candidates).await?;
            Ok(Arc::new(database))
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let service = match build_service(&config).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize vote service: {}", e);
            return;
        }
    };

    let mut client = Client::new(service);
    client.load().await;
    if client.session().candidates().is_empty() {
        warn!("The ballot is empty; set VOTE_CANDIDATES to seed it");
    }

    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();

    let greeting = format!("{}\n{}\n> ", handlers::render(client.session()), commands::HELP);
    if let Err(e) = stdout.write_all(greeting.as_bytes()).await {
        error!("Failed to write to stdout: {}", e);
        return;
    }

    loop {
        let _ = stdout.flush().await;
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        let (flow, output) = handlers::handle_line(&mut client, &line).await;
        if flow == Flow::Quit {
            break;
        }
        if let Err(e) = stdout.write_all(format!("{}\n> ", output).as_bytes()).await {
            error!("Failed to write to stdout: {}", e);
            break;
        }
    }

    info!("[{}] session closed", client.session().id());
}
