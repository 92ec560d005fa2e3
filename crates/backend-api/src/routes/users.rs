use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    extract::{AppJson, CurrentUser},
    response::{ApiResponse, Empty},
    routes::auth::{AVATAR_FIELD, COVER_IMAGE_FIELD},
    routes::models::{ChangePasswordRequest, UpdateAccountRequest, UserResponse},
    services::{read_form, Upload},
    ApiError, AppState,
};

/// Multipart body carrying a single image file.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

async fn single_upload(
    multipart: Result<Multipart, MultipartRejection>,
    field: &str,
    missing_message: &str,
) -> Result<Upload, ApiError> {
    let mut multipart = multipart?;
    let mut form = read_form(&mut multipart, &[field]).await?;
    form.take_file(field)
        .ok_or_else(|| ApiError::bad_request(missing_message))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/change-password",
    tag = "Users",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = Empty),
        (status = 400, description = "Old password is wrong", body = crate::error::ErrorEnvelope),
        (status = 401, description = "Authentication required", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<ApiResponse<Empty>, ApiError> {
    state
        .authenticator()
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(ApiResponse::ok(Empty {}, "password changed successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/current-user",
    tag = "Users",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn current_user(CurrentUser(user): CurrentUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into(), "current user fetched successfully")
}

#[utoipa::path(
    patch,
    path = "/api/v1/user/update-account",
    tag = "Users",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated user profile", body = UserResponse),
        (status = 400, description = "Full name or email missing", body = crate::error::ErrorEnvelope),
        (status = 409, description = "Email belongs to another user", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let updated = state
        .authenticator()
        .update_account(user.id, &payload.full_name, &payload.email)
        .await?;

    Ok(ApiResponse::ok(
        updated.into(),
        "account details updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/user/avatar",
    tag = "Users",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data", description = "Send the image as the `avatar` field"),
    responses(
        (status = 200, description = "Avatar replaced", body = UserResponse),
        (status = 400, description = "Missing or non-image file", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let upload = single_upload(multipart, AVATAR_FIELD, "avatar file is required").await?;

    let media = state.media();
    let url = media.store(&upload).await?;
    let (updated, previous) = match state.authenticator().replace_avatar(user.id, &url).await {
        Ok(result) => result,
        Err(error) => {
            media.remove(&url).await;
            return Err(error.into());
        }
    };
    media.remove(&previous).await;

    info!(user = %updated.public_id, "avatar updated");
    Ok(ApiResponse::ok(updated.into(), "avatar updated successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/user/coverImage",
    tag = "Users",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data", description = "Send the image as the `coverImage` field"),
    responses(
        (status = 200, description = "Cover image replaced", body = UserResponse),
        (status = 400, description = "Missing or non-image file", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let upload = single_upload(multipart, COVER_IMAGE_FIELD, "cover image file is required").await?;

    let media = state.media();
    let url = media.store(&upload).await?;
    let (updated, previous) = match state
        .authenticator()
        .replace_cover_image(user.id, &url)
        .await
    {
        Ok(result) => result,
        Err(error) => {
            media.remove(&url).await;
            return Err(error.into());
        }
    };
    if let Some(previous) = previous {
        media.remove(&previous).await;
    }

    info!(user = %updated.public_id, "cover image updated");
    Ok(ApiResponse::ok(
        updated.into(),
        "cover image updated successfully",
    ))
}
