use crate::config::AppConfig;
use crate::http_api::{build_response, invalid_json_message};
use anyhow::{Context as AnyhowContext, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use codedesk_chat::{ChatBridge, ChatError};
use codedesk_protocol::{
    ChatRequest, ChatResponse, HealthResponse, ReadQuery, ReadResponse, SaveRequest, SaveResponse,
    TreeResponse, ROOT_NOT_FOUND_MESSAGE,
};
use codedesk_workspace::{LocalWorkspace, WorkspaceError};
use std::path::PathBuf;
use std::sync::Arc;

struct AppState {
    workspace: LocalWorkspace,
    chat: ChatBridge,
    pages_dir: PathBuf,
}

/// Build the HTTP surface for one root directory and one chat provider.
pub fn build_router(config: AppConfig) -> Result<Router> {
    let bridge = ChatBridge::new(config.chat).context("Failed to build HTTP client")?;
    log::info!(
        "Chat model {} via {}",
        bridge.config().model,
        bridge.endpoint()
    );
    let state = Arc::new(AppState {
        workspace: LocalWorkspace::new(&config.root, config.scan),
        chat: bridge,
        pages_dir: config.pages_dir,
    });

    Ok(Router::new()
        .route("/", get(index_page))
        .route("/explorer", get(explorer_page))
        .route("/health", get(health))
        .route("/api/local/files", get(list_files))
        .route("/api/local/read", get(read_file))
        .route("/api/local/save", post(save_file))
        .route("/api/chat", post(chat))
        .with_state(state))
}

// Filesystem calls run on the blocking pool.
async fn run_blocking<T, F>(work: F) -> codedesk_workspace::Result<T>
where
    F: FnOnce() -> codedesk_workspace::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|e| Err(WorkspaceError::Io(std::io::Error::other(e))))
}

async fn list_files(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let workspace = state.workspace.clone();
    let root = workspace.root().display().to_string();

    let response = match run_blocking(move || workspace.tree()).await {
        Ok(tree) => TreeResponse::ok(tree, root),
        Err(WorkspaceError::RootNotFound) => {
            log::warn!("Root directory {root} does not exist");
            TreeResponse::failed(ROOT_NOT_FOUND_MESSAGE)
        }
        Err(err) => {
            log::warn!("Failed to scan {root}: {err}");
            TreeResponse::failed(err.to_string())
        }
    };
    build_response(StatusCode::OK, &response)
}

async fn read_file(
    State(state): State<Arc<AppState>>,
    query: Option<Query<ReadQuery>>,
) -> Result<Response, StatusCode> {
    let Some(Query(ReadQuery { filepath })) = query else {
        let response = ReadResponse::error("missing filepath query parameter");
        return build_response(StatusCode::BAD_REQUEST, &response);
    };
    let workspace = state.workspace.clone();

    let (status, response) = match run_blocking(move || workspace.read(&filepath)).await {
        Ok(content) => (StatusCode::OK, ReadResponse::new(content)),
        Err(WorkspaceError::AccessDenied) => {
            (StatusCode::FORBIDDEN, ReadResponse::access_denied())
        }
        Err(WorkspaceError::NotFound) => (StatusCode::OK, ReadResponse::not_found()),
        Err(err) => {
            log::warn!("Read failed: {err}");
            (StatusCode::OK, ReadResponse::error(err))
        }
    };
    build_response(status, &response)
}

async fn save_file(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let request: SaveRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let response = SaveResponse::error(invalid_json_message(&err));
            return build_response(StatusCode::BAD_REQUEST, &response);
        }
    };

    let workspace = state.workspace.clone();
    let SaveRequest { filename, content } = request;
    let target = filename.clone();
    let (status, response) =
        match run_blocking(move || workspace.write(&target, &content)).await {
            Ok(()) => {
                log::info!("Saved {filename}");
                (StatusCode::OK, SaveResponse::saved(&filename))
            }
            Err(WorkspaceError::AccessDenied) => (
                StatusCode::FORBIDDEN,
                SaveResponse::error(WorkspaceError::AccessDenied.to_string()),
            ),
            Err(err) => {
                log::warn!("Failed to save {filename}: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SaveResponse::error(err.to_string()),
                )
            }
        };
    build_response(status, &response)
}

async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, StatusCode> {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let response = ChatResponse::Error(invalid_json_message(&err));
            return build_response(StatusCode::BAD_REQUEST, &response);
        }
    };

    let (status, response) = match state.chat.chat(request).await {
        Ok(text) => (StatusCode::OK, ChatResponse::Result(text)),
        Err(ChatError::MissingApiKey) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ChatResponse::Error(ChatError::MissingApiKey.to_string()),
        ),
        Err(err) => {
            log::warn!("Chat request failed: {err}");
            (StatusCode::BAD_GATEWAY, ChatResponse::Error(err.to_string()))
        }
    };
    build_response(status, &response)
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let response = HealthResponse {
        status: "ok".to_string(),
        root: state.workspace.root().display().to_string(),
        root_exists: state.workspace.root_exists(),
    };
    build_response(StatusCode::OK, &response)
}

async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "index.html").await
}

async fn explorer_page(State(state): State<Arc<AppState>>) -> Response {
    serve_page(&state, "explorer.html").await
}

async fn serve_page(state: &AppState, name: &str) -> Response {
    match tokio::fs::read_to_string(state.pages_dir.join(name)).await {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            log::debug!("Page {name} unavailable: {e}");
            (StatusCode::NOT_FOUND, Html(format!("File {name} not found"))).into_response()
        }
    }
}
