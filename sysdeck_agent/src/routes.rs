//! HTTP routes. Each handler queries the backend once, bounded by the fetch
//! timeout, and answers with JSON (gzipped when the client accepts it).

use std::collections::HashMap;
use std::io::Write;

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use flate2::{write::GzEncoder, Compression};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{error, warn};

use sysdeck::error::FetchError;
use sysdeck::ops::FetchSpec;
use sysdeck::report::{self, SystemReport};
use sysdeck::types::{Connection, CpuSnapshot, DiskSnapshot, MemorySnapshot, NetStats, Snapshot};

use crate::state::AppState;

const JSON: &str = "application/json";
const MARKDOWN: &str = "text/markdown; charset=utf-8";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/processes", get(processes))
        .route("/services", get(services))
        .route("/network", get(network))
        .route("/report", get(report_json))
        .route("/report.md", get(report_markdown))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

async fn require_token(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.auth_token.as_ref() {
        match q.get("token") {
            Some(t) if t == expected => {}
            _ => return StatusCode::UNAUTHORIZED.into_response(),
        }
    }
    next.run(req).await
}

#[derive(Debug, Serialize)]
struct Metrics {
    timestamp: DateTime<Utc>,
    cpu: Option<CpuSnapshot>,
    memory: Option<MemorySnapshot>,
    disk: Option<DiskSnapshot>,
}

#[derive(Debug, Serialize)]
struct Network {
    stats: Vec<NetStats>,
    connections: Vec<Connection>,
}

async fn fetch(state: &AppState, spec: FetchSpec) -> Result<Snapshot, FetchError> {
    timeout(state.fetch_timeout, state.backend.fetch(spec))
        .await
        .unwrap_or(Err(FetchError::Timeout(state.fetch_timeout)))
}

fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"))
}

fn gzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(body)?;
    enc.finish()
}

fn respond(body: Vec<u8>, content_type: &'static str, headers: &HeaderMap) -> Response {
    let ct = [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))];
    if accepts_gzip(headers) {
        match gzip(&body) {
            Ok(packed) => {
                return (
                    ct,
                    [(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"))],
                    packed,
                )
                    .into_response()
            }
            Err(e) => warn!(error = %e, "gzip failed; sending plain body"),
        }
    }
    (ct, body).into_response()
}

fn json<T: Serialize>(value: &T, headers: &HeaderMap) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => respond(body, JSON, headers),
        Err(e) => internal(e.to_string()),
    }
}

fn internal(msg: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
}

fn failure(result: Result<Snapshot, FetchError>) -> Response {
    match result {
        Err(e) => {
            warn!(error = %e, "fetch failed");
            internal(e.to_string())
        }
        Ok(other) => {
            error!(domain = %other.domain(), "backend answered with the wrong snapshot");
            internal(format!("unexpected {} snapshot", other.domain()))
        }
    }
}

// Errors are tolerated here: a failed section is served as null.
async fn metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (cpu, memory, disk) = tokio::join!(
        fetch(&state, FetchSpec::Cpu),
        fetch(&state, FetchSpec::Memory),
        fetch(&state, FetchSpec::Disk),
    );
    let mut r = SystemReport::empty(Utc::now());
    r.absorb("cpu", cpu);
    r.absorb("memory", memory);
    r.absorb("disk", disk);
    for e in &r.errors {
        warn!(section = %e.section, error = %e.error, "metrics section unavailable");
    }
    json(
        &Metrics {
            timestamp: r.timestamp,
            cpu: r.cpu,
            memory: r.memory,
            disk: r.disk,
        },
        &headers,
    )
}

async fn processes(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match fetch(&state, FetchSpec::Processes).await {
        Ok(Snapshot::Processes(s)) => json(&s.data, &headers),
        other => failure(other),
    }
}

async fn services(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match fetch(&state, FetchSpec::Services).await {
        Ok(Snapshot::Services(s)) => json(&s.data, &headers),
        other => failure(other),
    }
}

async fn network(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (stats, conns) = tokio::join!(
        fetch(&state, FetchSpec::NetStats),
        fetch(&state, FetchSpec::Connections),
    );
    let stats = match stats {
        Ok(Snapshot::NetStats(s)) => s.data,
        other => return failure(other),
    };
    let connections = match conns {
        Ok(Snapshot::Connections(s)) => s.data,
        other => return failure(other),
    };
    json(&Network { stats, connections }, &headers)
}

async fn report_json(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let r = report::collect(state.backend.as_ref(), state.fetch_timeout).await;
    json(&r, &headers)
}

async fn report_markdown(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let r = report::collect(state.backend.as_ref(), state.fetch_timeout).await;
    respond(report::to_markdown(&r).into_bytes(), MARKDOWN, &headers)
}
