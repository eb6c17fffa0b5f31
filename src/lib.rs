//! Mastery estimation, spaced review and exercise selection for a children's
//! learning app, plus the SQLite-backed service that drives them.

pub mod api;
pub mod config;
pub mod data;
pub mod db;
pub mod edge;
pub mod error;
pub mod learners;
pub mod mastery;
pub mod missions;
pub mod models;
pub mod selector;
pub mod srs;
pub mod streak;
