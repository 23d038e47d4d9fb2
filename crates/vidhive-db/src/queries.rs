use crate::Database;
use crate::models::{ChannelRow, CommentRow, LikeRow, TagRow, UserRow, VideoRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        avatar: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, avatar) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, email, password_hash, avatar],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Patch profile fields; `None` leaves the stored value untouched.
    pub fn update_user(
        &self,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                     username = COALESCE(?2, username),
                     email    = COALESCE(?3, email),
                     avatar   = COALESCE(?4, avatar)
                 WHERE id = ?1",
                rusqlite::params![id, username, email, avatar],
            )?;
            Ok(changed > 0)
        })
    }

    /// Cascades to sessions, channel, videos, comments, likes, subscriptions.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id) VALUES (?1, ?2)",
                [id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn session_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<String> = conn
                .query_row("SELECT id FROM sessions WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Channels --

    pub fn create_channel(
        &self,
        id: &str,
        owner_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO channels (id, owner_id, name, description) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, owner_id, name, description],
            )?;
            Ok(())
        })
    }

    pub fn get_channel(&self, id: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel(conn, "id", id))
    }

    pub fn get_channel_by_owner(&self, owner_id: &str) -> Result<Option<ChannelRow>> {
        self.with_conn(|conn| query_channel(conn, "owner_id", owner_id))
    }

    pub fn update_channel(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
        avatar: Option<&str>,
        banner: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE channels SET
                     name        = COALESCE(?2, name),
                     description = COALESCE(?3, description),
                     avatar      = COALESCE(?4, avatar),
                     banner      = COALESCE(?5, banner)
                 WHERE id = ?1",
                rusqlite::params![id, name, description, avatar, banner],
            )?;
            Ok(changed > 0)
        })
    }

    /// Cascades to the channel's videos and subscriptions.
    pub fn delete_channel(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM channels WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Add to the subscriber set. Returns false if already subscribed.
    pub fn subscribe(&self, channel_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO subscriptions (channel_id, user_id) VALUES (?1, ?2)",
                [channel_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Remove from the subscriber set. Absent membership is a no-op.
    pub fn unsubscribe(&self, channel_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM subscriptions WHERE channel_id = ?1 AND user_id = ?2",
                [channel_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_subscribers(&self, channel_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT user_id FROM subscriptions WHERE channel_id = ?1")?;
            let ids = stmt
                .query_map([channel_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    // -- Videos --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_video(
        &self,
        id: &str,
        channel_id: &str,
        owner_id: &str,
        title: &str,
        description: Option<&str>,
        video_file: &str,
        thumbnail: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO videos (id, channel_id, owner_id, title, description, video_file, thumbnail)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, channel_id, owner_id, title, description, video_file, thumbnail],
            )?;
            Ok(())
        })
    }

    pub fn get_video(&self, id: &str) -> Result<Option<VideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{VIDEO_SELECT} WHERE id = ?1"))?;
            let row = stmt.query_row([id], map_video_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_videos(&self) -> Result<Vec<VideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{VIDEO_SELECT} ORDER BY created_at ASC"))?;
            let rows = stmt
                .query_map([], map_video_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_videos_by_owner(&self, owner_id: &str) -> Result<Vec<VideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{VIDEO_SELECT} WHERE owner_id = ?1 ORDER BY created_at ASC"
            ))?;
            let rows = stmt
                .query_map([owner_id], map_video_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_videos_by_channel(&self, channel_id: &str) -> Result<Vec<VideoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{VIDEO_SELECT} WHERE channel_id = ?1 ORDER BY created_at ASC"
            ))?;
            let rows = stmt
                .query_map([channel_id], map_video_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_video(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
        video_file: Option<&str>,
        thumbnail: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE videos SET
                     title       = COALESCE(?2, title),
                     description = COALESCE(?3, description),
                     video_file  = COALESCE(?4, video_file),
                     thumbnail   = COALESCE(?5, thumbnail)
                 WHERE id = ?1",
                rusqlite::params![id, title, description, video_file, thumbnail],
            )?;
            Ok(changed > 0)
        })
    }

    /// Cascades to the video's comments, likes, and tags.
    pub fn delete_video(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM videos WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Monotonic bump; the caller re-reads the row for the canonical record.
    pub fn increment_views(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("UPDATE videos SET views = views + 1 WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Add to the like set. Returns false if the user already liked it —
    /// membership stays unique either way.
    pub fn like_video(&self, video_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO likes (video_id, user_id) VALUES (?1, ?2)",
                [video_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Remove from the like set. Removing an absent like is a no-op.
    pub fn unlike_video(&self, video_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM likes WHERE video_id = ?1 AND user_id = ?2",
                [video_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_likes(&self, video_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM likes WHERE video_id = ?1")?;
            let ids = stmt
                .query_map([video_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Batch-fetch likes for a set of video IDs.
    pub fn get_likes_for_videos(&self, video_ids: &[String]) -> Result<Vec<LikeRow>> {
        if video_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=video_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT video_id, user_id FROM likes WHERE video_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = video_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(LikeRow {
                        video_id: row.get(0)?,
                        user_id: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Batch-fetch tags for a set of video IDs.
    pub fn get_tags_for_videos(&self, video_ids: &[String]) -> Result<Vec<TagRow>> {
        if video_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=video_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, video_id, name, created_at FROM tags WHERE video_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = video_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), map_tag_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, id: &str, video_id: &str, user_id: &str, text: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, video_id, user_id, text) VALUES (?1, ?2, ?3, ?4)",
                [id, video_id, user_id, text],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{COMMENT_SELECT} WHERE c.id = ?1"))?;
            let row = stmt.query_row([id], map_comment_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_comments(&self, video_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            // JOIN users for the author name in one query (no N+1)
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE c.video_id = ?1 ORDER BY c.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([video_id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Tags --

    /// Returns false when the (video, name) pair already exists.
    pub fn insert_tag(&self, id: &str, video_id: &str, name: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO tags (id, video_id, name) VALUES (?1, ?2, ?3)",
                [id, video_id, name],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn get_tag(&self, id: &str) -> Result<Option<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, video_id, name, created_at FROM tags WHERE id = ?1")?;
            let row = stmt.query_row([id], map_tag_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_tags(&self, video_id: &str) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, video_id, name, created_at FROM tags WHERE video_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map([video_id], map_tag_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_tag(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM tags WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

const VIDEO_SELECT: &str =
    "SELECT id, channel_id, owner_id, title, description, video_file, thumbnail, views, created_at
     FROM videos";

const COMMENT_SELECT: &str =
    "SELECT c.id, c.video_id, c.user_id, u.username, c.text, c.created_at
     FROM comments c
     LEFT JOIN users u ON c.user_id = u.id";

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, password, avatar, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                avatar: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_channel(conn: &Connection, column: &str, value: &str) -> Result<Option<ChannelRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, owner_id, name, description, avatar, banner, created_at
         FROM channels WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(ChannelRow {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                avatar: row.get(4)?,
                banner: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_video_row(row: &rusqlite::Row<'_>) -> std::result::Result<VideoRow, rusqlite::Error> {
    Ok(VideoRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        owner_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        video_file: row.get(5)?,
        thumbnail: row.get(6)?,
        views: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn map_comment_row(row: &rusqlite::Row<'_>) -> std::result::Result<CommentRow, rusqlite::Error> {
    Ok(CommentRow {
        id: row.get(0)?,
        video_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        text: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_tag_row(row: &rusqlite::Row<'_>) -> std::result::Result<TagRow, rusqlite::Error> {
    Ok(TagRow {
        id: row.get(0)?,
        video_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn seed(db: &Database) -> (String, String, String) {
        let user = "11111111-1111-1111-1111-111111111111".to_string();
        let channel = "22222222-2222-2222-2222-222222222222".to_string();
        let video = "33333333-3333-3333-3333-333333333333".to_string();
        db.create_user(&user, "alice", "alice@example.com", "hash", None)
            .unwrap();
        db.create_channel(&channel, &user, "alice's channel", None)
            .unwrap();
        db.insert_video(&video, &channel, &user, "first", None, "/tmp/v.mp4", None)
            .unwrap();
        (user, channel, video)
    }

    #[test]
    fn like_is_set_membership() {
        let db = Database::open_in_memory().unwrap();
        let (user, _, video) = seed(&db);

        assert!(db.like_video(&video, &user).unwrap());
        // second like of the same user is ignored, not duplicated
        assert!(!db.like_video(&video, &user).unwrap());
        assert_eq!(db.get_likes(&video).unwrap().len(), 1);

        assert!(db.unlike_video(&video, &user).unwrap());
        // unliking an absent like is a no-op
        assert!(!db.unlike_video(&video, &user).unwrap());
        assert!(db.get_likes(&video).unwrap().is_empty());
    }

    #[test]
    fn views_increment_monotonically() {
        let db = Database::open_in_memory().unwrap();
        let (_, _, video) = seed(&db);

        assert_eq!(db.get_video(&video).unwrap().unwrap().views, 0);
        assert!(db.increment_views(&video).unwrap());
        assert_eq!(db.get_video(&video).unwrap().unwrap().views, 1);
        assert!(!db.increment_views("missing").unwrap());
    }

    #[test]
    fn deleting_video_cascades() {
        let db = Database::open_in_memory().unwrap();
        let (user, _, video) = seed(&db);

        db.like_video(&video, &user).unwrap();
        db.insert_comment("c1", &video, &user, "nice").unwrap();
        db.insert_tag("t1", &video, "music").unwrap();

        assert!(db.delete_video(&video).unwrap());
        assert!(db.get_video(&video).unwrap().is_none());
        assert!(db.get_likes(&video).unwrap().is_empty());
        assert!(db.list_comments(&video).unwrap().is_empty());
        assert!(db.list_tags(&video).unwrap().is_empty());
    }

    #[test]
    fn deleting_user_cascades_to_channel_and_videos() {
        let db = Database::open_in_memory().unwrap();
        let (user, channel, video) = seed(&db);

        assert!(db.delete_user(&user).unwrap());
        assert!(db.get_channel(&channel).unwrap().is_none());
        assert!(db.get_video(&video).unwrap().is_none());
    }

    #[test]
    fn session_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let (user, _, _) = seed(&db);

        db.create_session("s1", &user).unwrap();
        assert!(db.session_exists("s1").unwrap());
        assert!(db.delete_session("s1").unwrap());
        assert!(!db.session_exists("s1").unwrap());
        assert!(!db.delete_session("s1").unwrap());
    }

    #[test]
    fn subscription_is_set_membership() {
        let db = Database::open_in_memory().unwrap();
        let (_, channel, _) = seed(&db);
        let viewer = "44444444-4444-4444-4444-444444444444";
        db.create_user(viewer, "bob", "bob@example.com", "hash", None)
            .unwrap();

        assert!(db.subscribe(&channel, viewer).unwrap());
        assert!(!db.subscribe(&channel, viewer).unwrap());
        assert_eq!(db.get_subscribers(&channel).unwrap().len(), 1);
        assert!(db.unsubscribe(&channel, viewer).unwrap());
        assert!(!db.unsubscribe(&channel, viewer).unwrap());
    }

    #[test]
    fn duplicate_email_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        let err = db.create_user("x", "alice2", "alice@example.com", "hash", None);
        assert!(err.is_err());
    }

    #[test]
    fn one_channel_per_user() {
        let db = Database::open_in_memory().unwrap();
        let (user, _, _) = seed(&db);
        let err = db.create_channel("other", &user, "second", None);
        assert!(err.is_err());
    }
}
