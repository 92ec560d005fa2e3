use tubehub_auth::{AuthError, Authenticator};
use tubehub_config::HttpConfig;
use tubehub_database::{ChannelRepository, User};

use crate::services::MediaStore;
use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    channels: ChannelRepository,
    media: MediaStore,
    http: HttpConfig,
    secure_cookies: bool,
}

impl AppState {
    pub fn new(
        authenticator: Authenticator,
        channels: ChannelRepository,
        media: MediaStore,
        http: HttpConfig,
        secure_cookies: bool,
    ) -> Self {
        Self {
            authenticator,
            channels,
            media,
            http,
            secure_cookies,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn channels(&self) -> &ChannelRepository {
        &self.channels
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        self.authenticator
            .authenticate_access_token(token)
            .await
            .map_err(|error| match error {
                AuthError::Database(_) => ApiError::from(error),
                _ => ApiError::unauthorized(AuthError::InvalidAccessToken.to_string()),
            })
    }
}
