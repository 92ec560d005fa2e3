use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use tubehub_auth::{Credentials, Registration, TokenPair};
use utoipa::ToSchema;

use crate::{
    extract::{AppJson, CurrentUser},
    response::{ApiResponse, Empty},
    routes::models::{LoginRequest, LoginResponse, RefreshRequest, TokensResponse, UserResponse},
    services::read_form,
    util::{cookie_value, expired_cookie, token_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    ApiError, AppState,
};

pub const AVATAR_FIELD: &str = "avatar";
pub const COVER_IMAGE_FIELD: &str = "coverImage";

/// Multipart body accepted by the register route.
#[allow(dead_code)]
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    full_name: String,
    email: String,
    username: String,
    password: String,
    #[schema(value_type = String, format = Binary)]
    avatar: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    cover_image: Option<Vec<u8>>,
}

fn with_token_cookies(jar: CookieJar, state: &AppState, pair: &TokenPair) -> CookieJar {
    let tokens = state.authenticator().tokens();
    let secure = state.secure_cookies();

    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        tokens.access_ttl_seconds(),
        secure,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        tokens.refresh_ttl_seconds(),
        secure,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/register",
    tag = "Auth",
    request_body(content = RegisterForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Missing fields or avatar", body = crate::error::ErrorEnvelope),
        (status = 409, description = "Username or email already taken", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let mut multipart = multipart?;
    let media = state.media();
    let mut form = read_form(&mut multipart, &[AVATAR_FIELD, COVER_IMAGE_FIELD]).await?;

    let registration = Registration {
        full_name: form.text("fullName"),
        email: form.text("email"),
        username: form.text("username"),
        password: form.text("password"),
    };
    let registration = state.authenticator().ensure_available(&registration).await?;

    let avatar = form
        .take_file(AVATAR_FIELD)
        .ok_or_else(|| ApiError::bad_request("avatar file is required"))?;
    let cover_image = form.take_file(COVER_IMAGE_FIELD);
    media.validate(&avatar)?;
    if let Some(upload) = &cover_image {
        media.validate(upload)?;
    }

    let avatar_url = media.store(&avatar).await?;
    let cover_image_url = match cover_image {
        Some(upload) => match media.store(&upload).await {
            Ok(url) => Some(url),
            Err(error) => {
                media.remove(&avatar_url).await;
                return Err(error.into());
            }
        },
        None => None,
    };

    match state
        .authenticator()
        .register(&registration, avatar_url.clone(), cover_image_url.clone())
        .await
    {
        Ok(user) => Ok(ApiResponse::created(
            UserResponse::from(user),
            "user registered successfully",
        )),
        Err(error) => {
            media.remove(&avatar_url).await;
            if let Some(url) = &cover_image_url {
                media.remove(url).await;
            }
            Err(error.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, token cookies set", body = LoginResponse),
        (status = 400, description = "Username or email missing", body = crate::error::ErrorEnvelope),
        (status = 401, description = "Wrong password", body = crate::error::ErrorEnvelope),
        (status = 404, description = "No such user", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), ApiError> {
    let credentials = Credentials {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };
    let (user, pair) = state.authenticator().login(&credentials).await?;

    let jar = with_token_cookies(jar, &state, &pair);
    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: user.into(),
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "user logged in successfully",
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/logout",
    tag = "Auth",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Logged out, token cookies cleared", body = Empty),
        (status = 401, description = "Authentication required", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>), ApiError> {
    state.authenticator().logout(user.id).await?;

    let secure = state.secure_cookies();
    let jar = jar
        .add(expired_cookie(ACCESS_TOKEN_COOKIE, secure))
        .add(expired_cookie(REFRESH_TOKEN_COOKIE, secure));

    Ok((jar, ApiResponse::ok(Empty {}, "user logged out")))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/refresh-token",
    tag = "Auth",
    request_body(content = RefreshRequest, description = "Used when no refreshToken cookie is sent"),
    responses(
        (status = 200, description = "New token pair, cookies replaced", body = TokensResponse),
        (status = 401, description = "Missing, invalid or already used refresh token", body = crate::error::ErrorEnvelope)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<AppJson<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<TokensResponse>), ApiError> {
    let incoming = cookie_value(&jar, REFRESH_TOKEN_COOKIE)
        .or_else(|| {
            payload
                .and_then(|AppJson(body)| body.refresh_token)
                .filter(|token| !token.is_empty())
        })
        .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;

    let (_, pair) = state.authenticator().refresh(&incoming).await?;

    let jar = with_token_cookies(jar, &state, &pair);
    Ok((
        jar,
        ApiResponse::ok(
            TokensResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "access token refreshed",
        ),
    ))
}
