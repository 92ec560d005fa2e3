mod error;
mod extract;
mod response;
mod state;
mod util;

pub mod docs;
pub mod routes;
pub mod services;

pub use error::{ApiError, ErrorEnvelope};
pub use extract::{AppJson, CurrentUser};
pub use response::{ApiResponse, Empty};
pub use state::AppState;
pub use util::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;
use tubehub_config::HttpConfig;
use utoipa::OpenApi;

/// Multipart overhead allowed on top of the file payload itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let media = state.media().clone();
    let single_upload = DefaultBodyLimit::max(media.max_upload_bytes() + FORM_OVERHEAD_BYTES);
    let double_upload =
        DefaultBodyLimit::max(media.max_upload_bytes() * 2 + FORM_OVERHEAD_BYTES);

    let users = Router::new()
        .route(
            "/register",
            post(routes::auth::register).layer(double_upload),
        )
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh-token", post(routes::auth::refresh_token))
        .route("/change-password", post(routes::users::change_password))
        .route("/current-user", get(routes::users::current_user))
        .route("/update-account", patch(routes::users::update_account))
        .route(
            "/avatar",
            patch(routes::users::update_avatar).layer(single_upload.clone()),
        )
        .route(
            "/coverImage",
            patch(routes::users::update_cover_image).layer(single_upload),
        )
        .route("/c/:username", get(routes::channels::channel_profile))
        .route("/history", get(routes::channels::watch_history));

    let json_limit = DefaultBodyLimit::max(state.http().json_body_limit_bytes);
    let cors = cors_layer(state.http());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(docs::ApiDoc::openapi()) }),
        )
        .nest("/api/v1/user", users)
        .nest_service(media.public_path(), ServeDir::new(media.root()))
        .with_state(state)
        .layer(json_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let origin = match http.allowed_origins() {
        None => AllowOrigin::mirror_request(),
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(%origin, "ignoring invalid cors origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(parsed)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
