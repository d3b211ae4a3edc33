#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use feed_proxy::proxy::{CacheTtls, Proxy, RetryPolicy, UpstreamClient};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;

/// 记录请求次数的假上游
#[derive(Default)]
pub struct UpstreamStats {
    pub hits: AtomicUsize,
    pub per_path: Mutex<HashMap<String, usize>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_query: Mutex<Option<String>>,
    pub order: Mutex<Vec<String>>,
}

impl UpstreamStats {
    fn hit(&self, path: String) -> usize {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.order.lock().push(path.clone());
        let mut per_path = self.per_path.lock();
        let count = per_path.entry(path).or_insert(0);
        *count += 1;
        *count
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn hits_for(&self, path: &str) -> usize {
        self.per_path.lock().get(path).copied().unwrap_or(0)
    }
}

pub struct FakeUpstream {
    pub addr: SocketAddr,
    pub stats: Arc<UpstreamStats>,
    handle: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        let stats = Arc::new(UpstreamStats::default());
        let app = Router::new()
            .route("/api/user/{id}", get(user))
            .route("/api/user/{id}/tweets", get(tweets))
            .route("/api/tweet/{id}", get(tweet))
            .with_state(Arc::clone(&stats));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            stats,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 返回一个当前没有进程监听的地址
pub async fn closed_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn user(State(stats): State<Arc<UpstreamStats>>, Path(name): Path<String>) -> impl IntoResponse {
    stats.hit(format!("/api/user/{}", name));
    match name.as_str() {
        "ghost" => (StatusCode::NOT_FOUND, Json(json!({"error": "User not found"}))),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))),
        _ => (StatusCode::OK, Json(json!({"id": "1", "username": name}))),
    }
}

#[derive(Deserialize)]
struct CursorQuery {
    cursor: Option<String>,
}

async fn tweets(
    State(stats): State<Arc<UpstreamStats>>,
    Path(id): Path<String>,
    Query(query): Query<CursorQuery>,
) -> impl IntoResponse {
    stats.hit(format!("/api/user/{}/tweets", id));
    *stats.last_query.lock() = query.cursor.clone();
    (StatusCode::OK, Json(json!({"user": id, "cursor": query.cursor})))
}

async fn tweet(State(stats): State<Arc<UpstreamStats>>, Path(id): Path<String>) -> Response {
    let count = stats.hit(format!("/api/tweet/{}", id));

    if id.starts_with("slow") {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    match id.as_str() {
        // 前两次返回 429
        "flaky" if count <= 2 => {
            (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "slow down"}))).into_response()
        }
        "limited" => {
            (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "slow down"}))).into_response()
        }
        "missing" => (StatusCode::NOT_FOUND, Json(json!({"error": "Tweet not found"}))).into_response(),
        "html" => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            "<html>Not found</html>",
        )
            .into_response(),
        "empty" => StatusCode::OK.into_response(),
        _ => (StatusCode::OK, Json(json!({"id": id}))).into_response(),
    }
}

pub struct ProxyOptions {
    pub concurrency: usize,
    pub capacity: usize,
    pub quota_window: Duration,
    pub ttls: CacheTtls,
    pub retry: Option<RetryPolicy>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            capacity: 100,
            quota_window: Duration::from_secs(15 * 60),
            ttls: CacheTtls::default(),
            retry: None,
        }
    }
}

pub fn build_proxy(base_url: &str, options: ProxyOptions) -> Proxy {
    let upstream = UpstreamClient::new(base_url, Some(Duration::from_secs(5)), options.retry).unwrap();
    Proxy::new(
        upstream,
        options.concurrency,
        options.quota_window,
        NonZeroUsize::new(options.capacity).unwrap(),
        options.ttls,
    )
}
