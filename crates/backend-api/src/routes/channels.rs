use axum::extract::{Path, State};

use crate::{
    extract::CurrentUser,
    response::ApiResponse,
    routes::models::{ChannelProfileResponse, WatchHistoryEntry},
    ApiError, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/user/c/{username}",
    tag = "Channels",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    params(("username" = String, Path, description = "Channel owner's username")),
    responses(
        (status = 200, description = "Channel profile with subscription counts", body = ChannelProfileResponse),
        (status = 404, description = "Channel does not exist", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfileResponse>, ApiError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::bad_request("username is missing"));
    }

    let profile = state
        .channels()
        .channel_profile(&username, viewer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("channel does not exist"))?;

    Ok(ApiResponse::ok(
        profile.into(),
        "user channel fetched successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/history",
    tag = "Channels",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Watched videos, newest first", body = Vec<WatchHistoryEntry>),
        (status = 401, description = "Authentication required", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<Vec<WatchHistoryEntry>>, ApiError> {
    let history = state
        .channels()
        .watch_history(user.id)
        .await?
        .into_iter()
        .map(WatchHistoryEntry::from)
        .collect();

    Ok(ApiResponse::ok(
        history,
        "watch history fetched successfully",
    ))
}
