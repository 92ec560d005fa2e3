use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use tubehub_database::User;

use crate::util::{bearer_token, cookie_value, ACCESS_TOKEN_COOKIE};
use crate::{ApiError, AppState};

/// JSON body whose rejections render as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// The user behind the request's access token.
///
/// The `accessToken` cookie wins over an `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = cookie_value(&jar, ACCESS_TOKEN_COOKIE)
            .or_else(|| bearer_token(&parts.headers))
            .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;

        let user = state.authenticate(&token).await?;
        Ok(Self(user))
    }
}
