//! Shared fixtures: a fake browser store and an in-process collector.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use rusqlite::{params, Connection};

/// Create or extend a Chromium-style `urls` table.
pub fn write_history(path: &Path, rows: &[(i64, &str, Option<&str>, i64)]) {
    let conn = Connection::open(path).expect("Failed to open store");
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS urls (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             url LONGVARCHAR,
             title LONGVARCHAR,
             visit_count INTEGER DEFAULT 0 NOT NULL,
             typed_count INTEGER DEFAULT 0 NOT NULL,
             last_visit_time INTEGER NOT NULL,
             hidden INTEGER DEFAULT 0 NOT NULL
         );",
    )
    .expect("Failed to create urls table");
    for (id, url, title, last_visit) in rows {
        conn.execute(
            "INSERT OR REPLACE INTO urls (id, url, title, last_visit_time) VALUES (?1, ?2, ?3, ?4)",
            params![id, url, title, last_visit],
        )
        .expect("Failed to insert row");
    }
}

/// Collector that records every accepted JSON body.
#[derive(Clone)]
pub struct Collector {
    pub received: Arc<Mutex<Vec<serde_json::Value>>>,
    pub hits: Arc<AtomicUsize>,
    /// Requests answered with `failure` before the collector starts accepting.
    fail_first: usize,
    failure: StatusCode,
}

impl Collector {
    pub fn accepting() -> Self {
        Self::failing_first(0, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn failing_first(fail_first: usize, failure: StatusCode) -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            fail_first,
            failure,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }

    /// Serve on an ephemeral localhost port.
    pub async fn spawn(&self) -> SocketAddr {
        let app = Router::new()
            .route("/", post(collect))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }
}

async fn collect(
    State(collector): State<Collector>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let n = collector.hits.fetch_add(1, Ordering::SeqCst);
    if n < collector.fail_first {
        return collector.failure;
    }
    collector.received.lock().unwrap().push(body);
    StatusCode::OK
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("Failed to get address").port()
}
