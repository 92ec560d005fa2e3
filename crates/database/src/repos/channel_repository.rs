//! Channel pages and watch history queries.

use sqlx::SqlitePool;

use crate::entities::{ChannelProfile, WatchedVideo};
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct ChannelRepository {
    pool: SqlitePool,
}

impl ChannelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Profile of the channel owned by `username`, with subscription counts as seen by `viewer_id`.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: i64,
    ) -> DatabaseResult<Option<ChannelProfile>> {
        let profile = sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT
                u.public_id,
                u.username,
                u.full_name,
                u.email,
                u.avatar,
                u.cover_image,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
                EXISTS (
                    SELECT 1 FROM subscriptions s
                    WHERE s.channel_id = u.id AND s.subscriber_id = ?
                ) AS is_subscribed
            FROM users u
            WHERE u.username = ?
            "#,
        )
        .bind(viewer_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Watched videos, most recent first.
    pub async fn watch_history(&self, user_id: i64) -> DatabaseResult<Vec<WatchedVideo>> {
        let videos = sqlx::query_as::<_, WatchedVideo>(
            r#"
            SELECT
                v.public_id,
                v.title,
                v.description,
                v.video_file,
                v.thumbnail,
                v.duration_seconds,
                v.views,
                o.public_id AS owner_public_id,
                o.username AS owner_username,
                o.full_name AS owner_full_name,
                o.avatar AS owner_avatar,
                w.watched_at
            FROM watch_history w
            JOIN videos v ON v.id = w.video_id
            JOIN users o ON o.id = v.owner_id
            WHERE w.user_id = ?
            ORDER BY w.watched_at DESC, w.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }
}
