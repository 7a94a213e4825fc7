//! HTTP binding for the dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dispatcher_core::{ClaimOutcome, DispatchError, StatusCounts, TaskDispatcher, TaskStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub fn router(dispatcher: Arc<TaskDispatcher>) -> Router {
    Router::new()
        .route("/getTask", post(get_task))
        .route("/updateTask", post(update_task))
        .route("/withdrawTask", post(withdraw_task))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

#[derive(Debug, Default, Deserialize)]
struct GetTaskRequest {
    #[serde(default)]
    worker_name: Option<String>,
    /// Worker-side counter, logged only.
    #[serde(default)]
    execute_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskRequest {
    task: String,
    #[serde(default)]
    worker_name: Option<String>,
    /// Target status code: absent or `2` finishes, `0` gives the task back.
    #[serde(default)]
    status: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct WithdrawTaskRequest {
    #[serde(default)]
    worker_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct TaskResponse {
    task: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

#[derive(Debug)]
enum ApiError {
    /// Malformed request: 400 `{error}`.
    BadRequest(String),
    /// Nothing matched: 404 `{message}`.
    NotFound(String),
    /// Nothing to withdraw: 400 `{message}`.
    NothingToWithdraw(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::NotFound(text) => (StatusCode::NOT_FOUND, message(&text)).into_response(),
            ApiError::NothingToWithdraw(text) => {
                (StatusCode::BAD_REQUEST, message(&text)).into_response()
            }
        }
    }
}

/// Parse a JSON body; an empty body yields the default request.
fn parse_optional<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_required(body)
}

fn parse_required<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid request: {e}")))
}

/// `worker_name` from the body, else the peer IP.
fn worker_identity(
    named: Option<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<String, ApiError> {
    if let Some(name) = named.filter(|n| !n.trim().is_empty()) {
        return Ok(name);
    }
    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .ok_or_else(|| ApiError::BadRequest("Invalid request: missing worker identity".to_string()))
}

fn invalid_input(e: DispatchError) -> ApiError {
    ApiError::BadRequest(format!("Invalid request: {e}"))
}

async fn get_task(
    State(dispatcher): State<Arc<TaskDispatcher>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req: GetTaskRequest = parse_optional(&body)?;
    let worker = worker_identity(req.worker_name, peer)?;

    match dispatcher
        .claim(&worker, req.execute_count)
        .await
        .map_err(invalid_input)?
    {
        ClaimOutcome::Assigned { pattern, .. } => {
            Ok(Json(TaskResponse { task: pattern }).into_response())
        }
        ClaimOutcome::NoTasks => Ok(message("no tasks available").into_response()),
    }
}

async fn update_task(
    State(dispatcher): State<Arc<TaskDispatcher>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let req: UpdateTaskRequest = parse_required(&body)?;
    let target = match req.status {
        None => TaskStatus::Finished,
        Some(code) => match TaskStatus::from_code(code) {
            Some(status @ (TaskStatus::Finished | TaskStatus::Unfinished)) => status,
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "Invalid request: status {code} cannot be reported"
                )));
            }
        },
    };
    let worker = worker_identity(req.worker_name, peer)?;

    let result = match target {
        TaskStatus::Unfinished => dispatcher.release(&req.task, &worker).await,
        _ => dispatcher.complete(&req.task, &worker).await,
    };
    match result {
        Ok(()) => Ok(message("task updated")),
        Err(e) if e.is_invalid_input() => Err(invalid_input(e)),
        Err(e) => Err(ApiError::NotFound(e.to_string())),
    }
}

async fn withdraw_task(
    State(dispatcher): State<Arc<TaskDispatcher>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let req: WithdrawTaskRequest = parse_optional(&body)?;
    let worker = worker_identity(req.worker_name, peer)?;

    match dispatcher.withdraw(&worker).await {
        Ok(_) => Ok(message("task withdrawn")),
        Err(e) if e.is_invalid_input() => Err(invalid_input(e)),
        Err(e) => Err(ApiError::NothingToWithdraw(e.to_string())),
    }
}

async fn status(State(dispatcher): State<Arc<TaskDispatcher>>) -> Json<StatusCounts> {
    Json(dispatcher.status().await)
}
