use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use application::{JoinRequest, SendMessageRequest};
use domain::UserId;

use crate::{error::ApiError, state::AppState, ws_connection};

#[derive(Debug, Deserialize)]
struct InitiatePayload {
    name: String,
    avatar_url: String,
}

#[derive(Debug, Serialize)]
struct InitiateResponse {
    id: UserId,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    id: UserId,
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    id: UserId,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(initiate))
        .route("/messages", post(send_message))
        .route("/stream/messages", get(stream_messages))
        .route("/stream/users", get(stream_users))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn initiate(
    State(state): State<AppState>,
    Json(payload): Json<InitiatePayload>,
) -> Result<Json<InitiateResponse>, ApiError> {
    let id = state
        .chat_service
        .join(JoinRequest {
            name: payload.name,
            avatar: payload.avatar_url,
        })
        .await?;

    Ok(Json(InitiateResponse { id }))
}

async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<StatusCode, ApiError> {
    state
        .chat_service
        .send_message(SendMessageRequest {
            sender_id: payload.id,
            body: payload.message,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn stream_messages(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| ws_connection::run_message_stream(socket, state, query.id))
}

async fn stream_users(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| ws_connection::run_roster_stream(socket, state, query.id))
}
