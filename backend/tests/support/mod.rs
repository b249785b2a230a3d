#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use survey_reports::api::ResponseRow;
use survey_reports::auth::{AuthConfig, CredentialVerifier, JwtCookieVerifier};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub const TEST_SECRET: &str = "integration-test-secret";

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Sign `claims` with `secret` (HS256).
pub fn sign(claims: &Value, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding")
}

/// Token valid for the next hour, signed with [`TEST_SECRET`].
pub fn valid_token() -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    sign(&json!({ "sub": "admin", "exp": exp }), TEST_SECRET)
}

/// Token that expired an hour ago.
pub fn expired_token() -> String {
    let exp = chrono::Utc::now().timestamp() - 3600;
    sign(&json!({ "sub": "admin", "exp": exp }), TEST_SECRET)
}

/// `Cookie` header value carrying `token`.
pub fn token_cookie(token: &str) -> String {
    format!("token={}", token)
}

/// A fully populated row for respondent `first last`.
pub fn row(first: &str, last: &str, question: &str, answer: &str) -> ResponseRow {
    ResponseRow {
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        email: Some(format!("{}@example.com", first.to_lowercase())),
        city: Some("Lyon".to_string()),
        organization: Some("Pharmacie Centrale".to_string()),
        phone: Some("0102030405".to_string()),
        question_text: question.to_string(),
        answer_text: Some(answer.to_string()),
    }
}

/// JWT verifier that counts how many times it was consulted.
pub struct CountingVerifier {
    inner: JwtCookieVerifier,
    calls: AtomicUsize,
}

impl CountingVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            inner: JwtCookieVerifier::new(&AuthConfig::with_secret(secret)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialVerifier for CountingVerifier {
    fn verify(&self, cookie_header: Option<&str>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(cookie_header)
    }
}
