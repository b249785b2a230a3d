//! In-memory local repository implementation.
//!
//! This module provides a local implementation of [`ResponseRepository`]
//! suitable for unit testing and local development. Responses are kept in a
//! `HashMap` keyed by survey, and every fetch goes through a connection guard
//! so tests can observe that connections are released on all exit paths.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{RespondentKey, ResponseRow, SurveyId};
use crate::db::repository::*;

/// Connection accounting for the local repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Connections handed out to fetches
    pub acquired: u64,
    /// Connections given back
    pub released: u64,
    /// Queries executed on an acquired connection
    pub queries: u64,
}

impl ConnectionStats {
    /// Connections acquired but not yet released.
    pub fn in_use(&self) -> u64 {
        self.acquired - self.released
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicU64,
    released: AtomicU64,
    queries: AtomicU64,
}

/// Scoped connection; releasing happens in `Drop` so early returns, errors
/// and cancelled futures all give it back.
struct LocalConnection {
    counters: Arc<Counters>,
}

impl LocalConnection {
    fn acquire(counters: &Arc<Counters>) -> Self {
        counters.acquired.fetch_add(1, Ordering::SeqCst);
        Self {
            counters: Arc::clone(counters),
        }
    }
}

impl Drop for LocalConnection {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
struct StoredResponse {
    respondent_id: i64,
    question_id: i64,
    row: ResponseRow,
}

struct LocalData {
    responses: HashMap<SurveyId, Vec<StoredResponse>>,

    // Failure injection
    query_failure: Option<String>,
    latency: Option<Duration>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            responses: HashMap::new(),
            query_failure: None,
            latency: None,
            is_healthy: true,
        }
    }
}

/// In-memory local repository.
///
/// # Example
/// ```
/// use survey_reports::api::{ResponseRow, SurveyId};
/// use survey_reports::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// repo.seed_survey(
///     SurveyId::new("1"),
///     vec![ResponseRow {
///         first_name: Some("Ada".into()),
///         last_name: Some("Lovelace".into()),
///         question_text: "Q1".into(),
///         answer_text: Some("yes".into()),
///         ..Default::default()
///     }],
/// );
/// assert_eq!(repo.response_count(&SurveyId::new("1")), 1);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    counters: Arc<Counters>,
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Store one answer with explicit respondent and question ids.
    ///
    /// Fetches order rows by `(respondent_id, question_id)`; rows sharing
    /// both ids keep their insertion order.
    pub fn insert_response(
        &self,
        survey_id: SurveyId,
        respondent_id: i64,
        question_id: i64,
        row: ResponseRow,
    ) {
        self.data
            .write()
            .responses
            .entry(survey_id)
            .or_default()
            .push(StoredResponse {
                respondent_id,
                question_id,
                row,
            });
    }

    /// Replace a survey's responses with `rows`.
    ///
    /// Respondent ids are assigned by first appearance of the respondent key
    /// and question ids follow the input position, so a fetch returns the
    /// rows grouped by respondent while keeping their relative order.
    pub fn seed_survey(&self, survey_id: SurveyId, rows: Vec<ResponseRow>) {
        let mut respondent_ids: HashMap<RespondentKey, i64> = HashMap::new();
        let stored = rows
            .into_iter()
            .enumerate()
            .map(|(position, row)| {
                let next_id = respondent_ids.len() as i64 + 1;
                let respondent_id = *respondent_ids
                    .entry(RespondentKey::for_row(&row))
                    .or_insert(next_id);
                StoredResponse {
                    respondent_id,
                    question_id: position as i64,
                    row,
                }
            })
            .collect();

        self.data.write().responses.insert(survey_id, stored);
    }

    /// Number of stored answers for a survey.
    pub fn response_count(&self, survey_id: &SurveyId) -> usize {
        self.data
            .read()
            .responses
            .get(survey_id)
            .map_or(0, Vec::len)
    }

    /// Make every subsequent query fail with `message`.
    pub fn fail_queries(&self, message: impl Into<String>) {
        self.data.write().query_failure = Some(message.into());
    }

    /// Stop failing queries.
    pub fn clear_failure(&self) {
        self.data.write().query_failure = None;
    }

    /// Delay every query by `latency` while holding the connection.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.data.write().latency = latency;
    }

    /// Set the health status (for testing).
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Snapshot of connection accounting.
    pub fn connection_stats(&self) -> ConnectionStats {
        ConnectionStats {
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
            queries: self.counters.queries.load(Ordering::SeqCst),
        }
    }

    /// Clear all data and counters.
    pub fn clear(&self) {
        *self.data.write() = LocalData::default();
        self.counters.acquired.store(0, Ordering::SeqCst);
        self.counters.released.store(0, Ordering::SeqCst);
        self.counters.queries.store(0, Ordering::SeqCst);
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn fetch_survey_responses(
        &self,
        survey_id: &SurveyId,
        deadline: Duration,
    ) -> RepositoryResult<Vec<ResponseRow>> {
        let conn = LocalConnection::acquire(&self.counters);

        let (latency, failure) = {
            let data = self.data.read();
            (data.latency, data.query_failure.clone())
        };

        if let Some(latency) = latency {
            if tokio::time::timeout(deadline, tokio::time::sleep(latency))
                .await
                .is_err()
            {
                drop(conn);
                return Err(RepositoryError::deadline_exceeded(survey_id, deadline));
            }
        }

        self.counters.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = failure {
            return Err(RepositoryError::query_with_context(
                message,
                ErrorContext::new("fetch_survey_responses")
                    .with_entity("survey")
                    .with_entity_id(survey_id),
            ));
        }

        let mut stored = self
            .data
            .read()
            .responses
            .get(survey_id)
            .cloned()
            .unwrap_or_default();
        stored.sort_by_key(|r| (r.respondent_id, r.question_id));

        drop(conn);
        Ok(stored.into_iter().map(|r| r.row).collect())
    }
}
