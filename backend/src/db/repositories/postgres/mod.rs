//! Postgres repository implementation using Diesel.
//!
//! Reads survey responses from the `responses`, `users` and `questions`
//! tables owned by the survey application. This module never creates or
//! migrates those tables.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Server-side `statement_timeout` on every pooled connection
//! - Per-fetch deadline covering checkout and the query (`SET LOCAL statement_timeout`)
//! - Connection health check
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `POSTGRES_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_STATEMENT_TIMEOUT_MS`: Per-statement timeout in milliseconds (default: 10000)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_query;
use diesel::sql_types::Text;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::debug;

use crate::api::{ResponseRow, SurveyId};
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, ResponseRepository,
};

mod models;

use models::SurveyResponseRow;

type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Joined respondent/question/answer rows for one survey.
///
/// The survey id is always bound as `$1`. Every column is cast to text so
/// numeric phone or id columns map onto the typed row without surprises.
pub const SURVEY_RESPONSES_QUERY: &str = r#"
SELECT
    u.user_name::text    AS first_name,
    u.surname::text      AS last_name,
    u.email::text        AS email,
    u.city::text         AS city,
    u.pharmacy::text     AS organization,
    u.phone::text        AS phone,
    q.questiontext::text AS question_text,
    r.answertext::text   AS answer_text
FROM responses r
JOIN users u ON r.userid = u.id
JOIN questions q ON r.questionid = q.questionid
WHERE r.formid::text = $1
ORDER BY u.id, r.questionid
"#;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Server-side statement timeout in milliseconds (0 disables it)
    pub statement_timeout_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            statement_timeout_ms: 10_000,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `POSTGRES_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_STATEMENT_TIMEOUT_MS`: Statement timeout in milliseconds (default: 10000)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("POSTGRES_URL"))
            .map_err(|_| "DATABASE_URL or POSTGRES_URL must be set".to_string())?;

        let defaults = Self::default();

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.max_pool_size);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.min_pool_size);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.connection_timeout_sec);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.idle_timeout_sec);

        let statement_timeout_ms = std::env::var("PG_STATEMENT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.statement_timeout_ms);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            statement_timeout_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Applies `statement_timeout` to each new physical connection.
///
/// This is the ceiling for statements that run without a tighter
/// per-transaction budget.
#[derive(Debug, Clone, Copy)]
struct StatementTimeout {
    millis: u64,
}

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        sql_query(format!("SET statement_timeout = {}", self.millis))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Time left of `budget` once `elapsed` has passed, or `None` when spent.
fn remaining(budget: Duration, elapsed: Duration) -> Option<Duration> {
    budget.checked_sub(elapsed).filter(|left| !left.is_zero())
}

/// `SET LOCAL` statement bounding the rest of the current transaction.
///
/// Rounds up so a sub-millisecond budget never becomes `0` (no limit).
fn local_statement_timeout(left: Duration) -> String {
    let millis = left.as_nanos().div_ceil(1_000_000).max(1);
    format!("SET LOCAL statement_timeout = {}", millis)
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl fmt::Debug for PostgresRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresRepository")
            .field("max_pool_size", &self.config.max_pool_size)
            .field("statement_timeout_ms", &self.config.statement_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl PostgresRepository {
    /// Create a new repository and open the connection pool.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if the pool cannot be built
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let mut builder = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true);

        if config.statement_timeout_ms > 0 {
            builder = builder.connection_customizer(Box::new(StatementTimeout {
                millis: config.statement_timeout_ms,
            }));
        }

        let pool = builder.build(manager).map_err(|e| {
            RepositoryError::connection_with_context(
                e.to_string(),
                ErrorContext::new("create_pool")
                    .with_details(format!("max_size={}", config.max_pool_size)),
            )
        })?;

        Ok(Self { pool, config })
    }

    /// Run `f` on a pooled connection inside a blocking task, within `budget`.
    ///
    /// Checkout waits at most for what is left of `budget`, and `f` receives
    /// the time still left once it holds the connection. The pooled
    /// connection goes back to the pool when the closure returns, so it is
    /// released before any error reaches the caller.
    async fn with_conn<T, F>(
        &self,
        operation: &'static str,
        budget: Duration,
        f: F,
    ) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection, Duration) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let started = Instant::now();

        task::spawn_blocking(move || {
            let expired = |stage: &str| {
                RepositoryError::timeout_with_context(
                    format!("deadline of {}ms expired {}", budget.as_millis(), stage),
                    ErrorContext::new(operation).with_details("get_connection"),
                )
            };

            let checkout =
                remaining(budget, started.elapsed()).ok_or_else(|| expired("before checkout"))?;
            let mut conn = pool
                .get_timeout(checkout)
                .map_err(|e| expired(&format!("waiting for a connection: {}", e)))?;
            let left =
                remaining(budget, started.elapsed()).ok_or_else(|| expired("during checkout"))?;

            f(&mut conn, left)
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

#[async_trait]
impl ResponseRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        let budget = Duration::from_secs(self.config.connection_timeout_sec);
        self.with_conn("health_check", budget, |conn, _| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn fetch_survey_responses(
        &self,
        survey_id: &SurveyId,
        deadline: Duration,
    ) -> RepositoryResult<Vec<ResponseRow>> {
        let bound_id = survey_id.value().to_string();

        let rows = self
            .with_conn("fetch_survey_responses", deadline, move |conn, left| {
                conn.build_transaction()
                    .read_only()
                    .run(|conn| {
                        sql_query(local_statement_timeout(left)).execute(conn)?;
                        sql_query(SURVEY_RESPONSES_QUERY)
                            .bind::<Text, _>(bound_id)
                            .load::<SurveyResponseRow>(conn)
                    })
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("fetch_survey_responses").with_survey(survey_id))?;

        debug!(survey_id = %survey_id, rows = rows.len(), "Loaded survey responses");

        Ok(rows.into_iter().map(ResponseRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.min_pool_size, 1);
        assert_eq!(config.statement_timeout_ms, 10_000);
    }

    #[test]
    fn test_with_url_keeps_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/surveys");
        assert_eq!(config.database_url, "postgres://localhost/surveys");
        assert_eq!(config.connection_timeout_sec, 30);
    }

    #[test]
    fn test_query_binds_survey_id() {
        assert!(SURVEY_RESPONSES_QUERY.contains("$1"));
        assert!(SURVEY_RESPONSES_QUERY.contains("ORDER BY u.id, r.questionid"));
        assert_eq!(SURVEY_RESPONSES_QUERY.matches("$").count(), 1);
    }

    #[test]
    fn test_remaining_budget() {
        let budget = Duration::from_millis(100);
        assert_eq!(
            remaining(budget, Duration::from_millis(30)),
            Some(Duration::from_millis(70))
        );
        assert_eq!(remaining(budget, budget), None);
        assert_eq!(remaining(budget, Duration::from_millis(250)), None);
    }

    #[test]
    fn test_local_statement_timeout_rounds_up() {
        assert_eq!(
            local_statement_timeout(Duration::from_millis(1500)),
            "SET LOCAL statement_timeout = 1500"
        );
        assert_eq!(
            local_statement_timeout(Duration::from_micros(1500)),
            "SET LOCAL statement_timeout = 2"
        );
        assert_eq!(
            local_statement_timeout(Duration::from_nanos(1)),
            "SET LOCAL statement_timeout = 1"
        );
    }
}
