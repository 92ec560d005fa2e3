//! Read models for channel pages and watch history.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ChannelProfile {
    pub public_id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// A video from a user's watch history joined with its owner's public summary.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WatchedVideo {
    pub public_id: String,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration_seconds: f64,
    pub views: i64,
    pub owner_public_id: String,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar: String,
    pub watched_at: String,
}
