use serde::{Deserialize, Serialize};
use tubehub_database::{ChannelProfile, User, WatchedVideo};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.public_id,
            username: value.username,
            email: value.email,
            full_name: value.full_name,
            avatar: value.avatar,
            cover_image: value.cover_image,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfileResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

impl From<ChannelProfile> for ChannelProfileResponse {
    fn from(value: ChannelProfile) -> Self {
        Self {
            id: value.public_id,
            username: value.username,
            full_name: value.full_name,
            email: value.email,
            avatar: value.avatar,
            cover_image: value.cover_image,
            subscribers_count: value.subscribers_count,
            channels_subscribed_to_count: value.channels_subscribed_to_count,
            is_subscribed: value.is_subscribed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub owner: VideoOwner,
    pub watched_at: String,
}

impl From<WatchedVideo> for WatchHistoryEntry {
    fn from(value: WatchedVideo) -> Self {
        Self {
            id: value.public_id,
            title: value.title,
            description: value.description,
            video_file: value.video_file,
            thumbnail: value.thumbnail,
            duration: value.duration_seconds,
            views: value.views,
            owner: VideoOwner {
                id: value.owner_public_id,
                username: value.owner_username,
                full_name: value.owner_full_name,
                avatar: value.owner_avatar,
            },
            watched_at: value.watched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_hides_private_columns() {
        let user = User {
            id: 42,
            public_id: "ck123".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice".into(),
            avatar: "/static/a.png".into(),
            cover_image: None,
            password_hash: "$argon2id$secret".into(),
            refresh_token: Some("refresh".into()),
            created_at: "2024-06-01T00:00:00+00:00".into(),
            updated_at: "2024-06-01T00:00:00+00:00".into(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["_id"], "ck123");
        assert_eq!(json["fullName"], "Alice");
        assert!(json["coverImage"].is_null());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshToken").is_none());
        assert!(json.get("id").is_none());
    }
}
