//! HTTP API endpoint handlers.
//!
//! Every room endpoint requires `Authorization: Bearer <access token>`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};

use crate::{
    domain::{Identity, Room},
    infrastructure::dto::{
        conversion::room_summary,
        http::{
            CreateRoomRequest, ErrorDto, HealthDto, JoinRoomRequest, MessageListDto,
            MessagesQuery, PresenceDto, RoomListDto, RoomSummaryDto,
        },
    },
    ui::state::AppState,
    usecase::GatewayError,
};

/// `GatewayError` rendered as a JSON error response
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Invalid(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorDto {
            code: self.0.code().to_string(),
            message: self.0.notice(),
        };
        (status, Json(body)).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ")
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let token = bearer_token(headers).ok_or(GatewayError::Unauthorized)?;
    let identity = state
        .verifier
        .verify(token)
        .await
        .map_err(GatewayError::from)?;
    Ok(identity)
}

async fn summarize(state: &AppState, room: &Room) -> RoomSummaryDto {
    let online = state.presence.lock().await.online_count(&room.name);
    room_summary(room, online)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// `POST /api/rooms`
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomSummaryDto>), ApiError> {
    let identity = authorize(&state, &headers).await?;
    let room = state
        .create_room_usecase
        .execute(&identity, request.room_name, request.private, request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(summarize(&state, &room).await)))
}

/// `GET /api/rooms`
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RoomListDto>, ApiError> {
    let identity = authorize(&state, &headers).await?;
    let rooms = state.list_rooms_usecase.execute(&identity).await?;

    // Domain Model から DTO への変換
    Ok(Json(RoomListDto {
        rooms: rooms
            .iter()
            .map(|summary| room_summary(&summary.room, summary.online))
            .collect(),
    }))
}

/// `POST /api/rooms/{room}/join`
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<RoomSummaryDto>, ApiError> {
    let identity = authorize(&state, &headers).await?;
    let room = state
        .join_room_usecase
        .execute(&identity, room, request.password)
        .await?;

    Ok(Json(summarize(&state, &room).await))
}

/// `GET /api/rooms/{room}/messages?limit=`
pub async fn room_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessageListDto>, ApiError> {
    let identity = authorize(&state, &headers).await?;
    let (room, messages) = state
        .query_room_usecase
        .messages(&identity, room, query.limit)
        .await?;

    Ok(Json(MessageListDto {
        room: room.name.to_string(),
        count: messages.len(),
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /api/rooms/{room}/presence`
pub async fn room_presence(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room): Path<String>,
) -> Result<Json<PresenceDto>, ApiError> {
    let identity = authorize(&state, &headers).await?;
    let (room, names) = state.query_room_usecase.presence(&identity, room).await?;

    Ok(Json(PresenceDto {
        room: room.name.to_string(),
        users: names.into_iter().map(|name| name.into_string()).collect(),
    }))
}
