#![allow(dead_code)]

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use noraliva::api::{app_router, ApiState};
use noraliva::db::Db;
use std::path::{Path, PathBuf};

pub async fn seeded_db() -> Db {
    let db = Db::connect("sqlite::memory:").await.unwrap();
    db.seed_demo_data_if_empty().await.unwrap();
    db
}

/// A seeded database in a fresh file under the temp dir, with a multi-connection pool.
pub async fn file_db() -> (Db, PathBuf) {
    let path = std::env::temp_dir().join(format!("noraliva-test-{}.db", uuid::Uuid::new_v4()));
    let db = Db::connect(&format!("sqlite://{}?mode=rwc", path.display())).await.unwrap();
    db.seed_demo_data_if_empty().await.unwrap();
    (db, path)
}

pub fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

pub async fn create_test_app() -> (Router, Db) {
    let db = seeded_db().await;
    (app_router(ApiState { db: db.clone() }), db)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}
