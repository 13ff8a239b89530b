//! Graduate Job Search Server
//!
//! Streams live search progress from GradConnection and Seek as
//! newline-delimited JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::{ProgressEvent, SearchRequest};
use futures::StreamExt;
use gradscout_scraper::{Aggregator, HttpFetcher, ScrapeConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Shared application state
struct AppState {
    aggregator: Aggregator,
}

/// One event as a JSON line.
fn encode_line(event: &ProgressEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("{json}\n"),
        Err(e) => format!("{}\n", json!({ "error": format!("failed to encode event: {e}") })),
    }
}

/// Handler for POST /search
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Response {
    if request.selection().is_none() {
        tracing::warn!(source = %request.source, "Rejected search with unknown source");
        let body = json!({ "error": format!("Unknown source: {}", request.source) });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    tracing::info!(
        job_level = request.job_level.slug(),
        discipline = %request.discipline,
        location = %request.location,
        source = %request.source,
        "Starting search"
    );
    let lines = state
        .aggregator
        .search(&request)
        .map(|event| Ok::<_, std::convert::Infallible>(encode_line(&event)));

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response()
}

/// Handler for GET / (root)
async fn root_handler() -> &'static str {
    "🎓 Graduate Job Search API\n\nEndpoints:\n  POST /search - Stream search progress as JSON lines\n\nExample:\n  curl -N -X POST http://127.0.0.1:3000/search -H 'content-type: application/json' \\\n    -d '{\"job_level\":\"graduate-jobs\",\"discipline\":\"computer-science\",\"location\":\"australia\",\"source\":\"both\"}'"
}

fn app(aggregator: Aggregator) -> Router {
    let state = Arc::new(AppState { aggregator });
    Router::new()
        .route("/", get(root_handler))
        .route("/search", post(search_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradscout=info")),
        )
        .init();

    println!("🚀 Starting Graduate Job Search Server...\n");

    let fetcher = Arc::new(HttpFetcher::new()?);
    let aggregator = Aggregator::new(fetcher, ScrapeConfig::default());

    let addr: SocketAddr = std::env::var("GRADSCOUT_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("🌐 Server running at http://{}", addr);
    println!(
        "   Try: curl -N -X POST http://{}/search -d '{{}}' -H 'content-type: application/json'\n",
        addr
    );

    axum::serve(listener, app(aggregator)).await?;
    Ok(())
}
