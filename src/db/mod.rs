use sqlx::{migrate::MigrateDatabase, sqlite::{SqlitePool, SqlitePoolOptions}, Sqlite, Row};
use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use crate::config::Config;
use crate::models::{Rejection, VoteOutcome, VoteTally};
use crate::service::{ServiceError, VoteService};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &Config) -> Result<Self, ServiceError> {
        let db_url = &config.database_url;

        // Create database if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database at {}", db_url);
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(db_url)
            .await?;

        Self::from_pool(pool).await
    }

    // Wrap an existing pool, creating the schema if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, ServiceError> {
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candidates (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // The primary key on voter_name is what enforces one vote per voter.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                voter_name TEXT PRIMARY KEY,
                candidate INTEGER NOT NULL,
                cast_at TEXT NOT NULL,
                FOREIGN KEY (candidate) REFERENCES candidates(position)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    // Insert the ballot if the candidates table is still empty.
    // Returns the number of candidates written.
    pub async fn seed_candidates(&self, names: &[String]) -> Result<usize, ServiceError> {
        let existing: i64 = sqlx::query("SELECT COUNT(*) AS n FROM candidates")
            .fetch_one(&self.pool)
            .await?
            .get("n");

        if existing > 0 {
            if !names.is_empty() {
                warn!("Candidates already present ({}), ignoring configured list", existing);
            }
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for (i, name) in names.iter().enumerate() {
            sqlx::query("INSERT INTO candidates (position, name) VALUES (?, ?)")
                .bind(i as i64)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Seeded {} candidate(s)", names.len());
        Ok(names.len())
    }

    async fn candidate_exists(&self, candidate: usize) -> Result<bool, ServiceError> {
        let Ok(position) = i64::try_from(candidate) else {
            return Ok(false);
        };
        Ok(sqlx::query("SELECT 1 FROM candidates WHERE position = ?")
            .bind(position)
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }
}

#[async_trait]
impl VoteService for Database {
    async fn list_candidates(&self) -> Result<Vec<String>, ServiceError> {
        let names = sqlx::query("SELECT name FROM candidates ORDER BY position")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.get::<String, _>("name"))
            .collect();
        Ok(names)
    }

    async fn list_tallies(&self) -> Result<Vec<VoteTally>, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT c.name AS name, COUNT(v.voter_name) AS vote_count
            FROM candidates c
            LEFT JOIN votes v ON v.candidate = c.position
            GROUP BY c.position, c.name
            ORDER BY c.position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let name = row.get::<String, _>("name");
                let count = row.get::<i64, _>("vote_count");
                let count = u64::try_from(count)
                    .map_err(|_| ServiceError::Corrupt(format!("negative tally for {}", name)))?;
                Ok(VoteTally::new(name, count))
            })
            .collect()
    }

    async fn has_voted(&self, voter: &str) -> Result<bool, ServiceError> {
        Ok(sqlx::query("SELECT 1 FROM votes WHERE voter_name = ?")
            .bind(voter.trim())
            .fetch_optional(&self.pool)
            .await?
            .is_some())
    }

    async fn cast_vote(&self, candidate: usize, voter: &str) -> Result<VoteOutcome, ServiceError> {
        let voter = voter.trim();
        if voter.is_empty() {
            return Ok(VoteOutcome::Rejected(Rejection::InvalidVoter));
        }
        if !self.candidate_exists(candidate).await? {
            return Ok(VoteOutcome::Rejected(Rejection::UnknownCandidate));
        }

        // A conflicting row means this name already voted; nothing is written.
        let result = sqlx::query(
            r#"
            INSERT INTO votes (voter_name, candidate, cast_at)
            VALUES (?, ?, ?)
            ON CONFLICT(voter_name) DO NOTHING
            "#,
        )
        .bind(voter)
        .bind(candidate as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!("Rejected second vote by {}", voter);
            return Ok(VoteOutcome::Rejected(Rejection::AlreadyVoted));
        }

        info!("Recorded vote for candidate {} by {}", candidate, voter);
        Ok(VoteOutcome::Recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
    use std::sync::Arc;
    use std::time::Duration;

    async fn memory_db(names: &[&str]) -> Database {
        // One connection that never idles out, so the in-memory database lives as long as the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db = Database::from_pool(pool).await.unwrap();
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        db.seed_candidates(&names).await.unwrap();
        db
    }

    #[tokio::test]
    async fn tallies_include_candidates_without_votes() {
        let db = memory_db(&["Alice", "Bob"]).await;
        assert_eq!(db.list_candidates().await.unwrap(), vec!["Alice", "Bob"]);
        assert_eq!(
            db.list_tallies().await.unwrap(),
            vec![VoteTally::new("Alice", 0), VoteTally::new("Bob", 0)]
        );
    }

    #[tokio::test]
    async fn records_one_vote_per_name() {
        let db = memory_db(&["Alice", "Bob"]).await;

        assert!(!db.has_voted("Sam").await.unwrap());
        assert_eq!(db.cast_vote(0, "Sam").await.unwrap(), VoteOutcome::Recorded);
        assert!(db.has_voted("Sam").await.unwrap());
        assert_eq!(
            db.cast_vote(1, "Sam").await.unwrap(),
            VoteOutcome::Rejected(Rejection::AlreadyVoted)
        );
        assert_eq!(db.cast_vote(1, "Kim").await.unwrap(), VoteOutcome::Recorded);

        assert_eq!(
            db.list_tallies().await.unwrap(),
            vec![VoteTally::new("Alice", 1), VoteTally::new("Bob", 1)]
        );
    }

    #[tokio::test]
    async fn rejects_unknown_candidate_without_recording() {
        let db = memory_db(&["Alice"]).await;
        assert_eq!(
            db.cast_vote(5, "Sam").await.unwrap(),
            VoteOutcome::Rejected(Rejection::UnknownCandidate)
        );
        assert!(!db.has_voted("Sam").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_for_one_name_record_once() {
        // A file database so that every pooled connection sees the same data.
        let path = std::env::temp_dir().join(format!("trusty_vote_{}.db", uuid::Uuid::new_v4()));
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .unwrap();
        let db = Arc::new(Database::from_pool(pool).await.unwrap());
        db.seed_candidates(&["Alice".to_string(), "Bob".to_string()]).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move { db.cast_vote(i % 2, "Sam").await }));
        }

        let mut recorded = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                VoteOutcome::Recorded => recorded += 1,
                outcome => assert_eq!(outcome, VoteOutcome::Rejected(Rejection::AlreadyVoted)),
            }
        }
        assert_eq!(recorded, 1);

        let total: u64 = db.list_tallies().await.unwrap().iter().map(|t| t.vote_count).sum();
        assert_eq!(total, 1);

        db.pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn seeding_is_skipped_once_candidates_exist() {
        let db = memory_db(&["Alice", "Bob"]).await;
        let written = db.seed_candidates(&["Carol".to_string()]).await.unwrap();
        assert_eq!(written, 0);
        assert_eq!(db.list_candidates().await.unwrap(), vec!["Alice", "Bob"]);
    }
}
