use crate::prelude::{eprintln, *};
use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use colored::Colorize;
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Path clients POST JSON-RPC messages to, announced on the SSE stream.
const MESSAGE_PATH: &str = "/message";

pub async fn run_sse(options: super::cli::SseOptions, global: crate::Global) -> Result<()> {
    let addr = f!("{}:{}", options.host, options.port);
    let verbose = global.verbose;

    let router = Router::new()
        .route("/sse", get(announce_endpoint))
        .route(MESSAGE_PATH, post(answer_message))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::new(global));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind the MCP server to {addr}: {e}"))?;

    eprintln!(
        "{} codeprompt tools on http://{addr}/sse",
        "Serving".green().bold()
    );
    if verbose {
        eprintln!("  JSON-RPC messages: POST http://{addr}{MESSAGE_PATH}");
    }
    log::info!("MCP SSE server bound to {addr}");

    axum::serve(listener, router)
        .await
        .map_err(|e| eyre!("MCP server stopped: {e}"))?;

    Ok(())
}

/// Tell a freshly connected client where to send its messages.
async fn announce_endpoint() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    log::debug!("SSE client connected");
    Sse::new(stream::once(async {
        Ok(Event::default().event("endpoint").data(MESSAGE_PATH))
    }))
}

async fn answer_message(
    State(global): State<Arc<crate::Global>>,
    Json(request): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let message = request.to_string();
    let label = super::describe_request(&message);

    let response = super::handle_request(&message, &global).await;
    log::debug!("http request: {label} -> {}", response.outcome());
    if global.verbose {
        eprintln!("{} {label}: {}", "mcp".cyan(), response.outcome());
    }

    Json(serde_json::to_value(response).unwrap_or(serde_json::Value::Null))
}
