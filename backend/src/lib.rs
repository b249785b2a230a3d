//! # Survey Reports Backend
//!
//! Authenticated survey response reporting.
//!
//! An administrator asks for every answer given to one survey. The service
//! checks the session cookie, reads the joined respondent/question/answer rows
//! from the data source, folds them into one record per respondent and returns
//! the records as JSON.
//!
//! ## Architecture
//!
//! - [`api`]: Core types (survey ids, response rows, respondent records)
//! - [`auth`]: Session token verification
//! - [`config`]: Server configuration from the environment
//! - [`db`]: Repository pattern and storage backends
//! - [`services`]: Aggregation and report building
//! - [`routes`]: Route paths and report wire types
//! - `http`: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
