use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::util::ACCESS_TOKEN_COOKIE;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::refresh_token,
        crate::routes::users::change_password,
        crate::routes::users::current_user,
        crate::routes::users::update_account,
        crate::routes::users::update_avatar,
        crate::routes::users::update_cover_image,
        crate::routes::channels::channel_profile,
        crate::routes::channels::watch_history
    ),
    components(
        schemas(
            crate::error::ErrorEnvelope,
            crate::response::Empty,
            crate::routes::health::HealthResponse,
            crate::routes::auth::RegisterForm,
            crate::routes::users::ImageUploadForm,
            crate::routes::models::UserResponse,
            crate::routes::models::LoginRequest,
            crate::routes::models::LoginResponse,
            crate::routes::models::RefreshRequest,
            crate::routes::models::TokensResponse,
            crate::routes::models::ChangePasswordRequest,
            crate::routes::models::UpdateAccountRequest,
            crate::routes::models::ChannelProfileResponse,
            crate::routes::models::VideoOwner,
            crate::routes::models::WatchHistoryEntry
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Registration, login and token lifecycle"),
        (name = "Users", description = "Account and profile management"),
        (name = "Channels", description = "Channel pages and watch history")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
        schemes.insert(
            "cookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(ACCESS_TOKEN_COOKIE))),
        );
    }
}
