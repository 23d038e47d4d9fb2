/// Database row types — these map directly to SQLite rows.
/// Distinct from vidhive-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub created_at: String,
}

pub struct ChannelRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub created_at: String,
}

pub struct VideoRow {
    pub id: String,
    pub channel_id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_file: String,
    pub thumbnail: Option<String>,
    pub views: i64,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub video_id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: String,
}

pub struct TagRow {
    pub id: String,
    pub video_id: String,
    pub name: String,
    pub created_at: String,
}

/// A like row, keyed by (video_id, user_id) — membership is unique.
pub struct LikeRow {
    pub video_id: String,
    pub user_id: String,
}
