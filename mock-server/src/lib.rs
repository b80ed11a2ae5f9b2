use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

/// What the server saw for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

pub type Journal = Arc<RwLock<Vec<Echo>>>;

pub fn app() -> Router {
    let journal: Journal = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/__journal", get(list_journal))
        .route("/status/{code}", any(reply_with_status))
        .fallback(echo)
        .with_state(journal)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_journal(State(journal): State<Journal>) -> Json<Vec<Echo>> {
    Json(journal.read().await.clone())
}

async fn echo(
    State(journal): State<Journal>,
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let echo = record(&journal, method, &uri, query, &headers, &body).await;
    Json(echo)
}

async fn reply_with_status(
    State(journal): State<Journal>,
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Echo>) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    let echo = record(&journal, method, &uri, query, &headers, &body).await;
    (status, Json(echo))
}

async fn record(
    journal: &Journal,
    method: Method,
    uri: &Uri,
    query: BTreeMap<String, String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Echo {
    let echo = Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        body: parse_body(body),
    };
    tracing::debug!(method = %echo.method, path = %echo.path, "echoing request");
    journal.write().await.push(echo.clone());
    echo
}

fn parse_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(body).into_owned())))
}
