//! Row-to-model shaping: parse the TEXT ids and timestamps SQLite hands
//! back into the typed API models, tolerating corrupt rows with a warning
//! instead of failing the whole response.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use vidhive_db::models::{ChannelRow, CommentRow, LikeRow, TagRow, UserRow, VideoRow};
use vidhive_types::models::{Channel, Comment, Tag, User, Video};

pub fn parse_uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, value, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, value, e);
            DateTime::default()
        })
}

pub fn user(row: UserRow) -> User {
    User {
        id: parse_uuid(&row.id, "user id"),
        username: row.username,
        email: row.email,
        avatar: row.avatar,
        created_at: parse_timestamp(&row.created_at, "user created_at"),
    }
}

pub fn channel(row: ChannelRow, subscribers: Vec<String>) -> Channel {
    Channel {
        id: parse_uuid(&row.id, "channel id"),
        owner_id: parse_uuid(&row.owner_id, "channel owner_id"),
        name: row.name,
        description: row.description,
        avatar: row.avatar,
        banner: row.banner,
        subscribers: subscribers
            .iter()
            .map(|id| parse_uuid(id, "subscriber id"))
            .collect(),
        created_at: parse_timestamp(&row.created_at, "channel created_at"),
    }
}

pub fn video(row: VideoRow, likes: Vec<String>, tags: Vec<String>) -> Video {
    Video {
        id: parse_uuid(&row.id, "video id"),
        channel_id: parse_uuid(&row.channel_id, "video channel_id"),
        owner_id: parse_uuid(&row.owner_id, "video owner_id"),
        title: row.title,
        description: row.description,
        video_file: row.video_file,
        thumbnail: row.thumbnail,
        views: row.views.max(0) as u64,
        likes: likes.iter().map(|id| parse_uuid(id, "like user_id")).collect(),
        tags,
        created_at: parse_timestamp(&row.created_at, "video created_at"),
    }
}

/// Shape a list of video rows, grouping batch-fetched likes and tags by
/// video id so the whole listing needs three queries, not 2n+1.
pub fn videos(rows: Vec<VideoRow>, like_rows: Vec<LikeRow>, tag_rows: Vec<TagRow>) -> Vec<Video> {
    let mut likes_by_video: HashMap<String, Vec<String>> = HashMap::new();
    for like in like_rows {
        likes_by_video
            .entry(like.video_id)
            .or_default()
            .push(like.user_id);
    }

    let mut tags_by_video: HashMap<String, Vec<String>> = HashMap::new();
    for tag in tag_rows {
        tags_by_video.entry(tag.video_id).or_default().push(tag.name);
    }

    rows.into_iter()
        .map(|row| {
            let likes = likes_by_video.remove(&row.id).unwrap_or_default();
            let tags = tags_by_video.remove(&row.id).unwrap_or_default();
            video(row, likes, tags)
        })
        .collect()
}

pub fn comment(row: CommentRow) -> Comment {
    Comment {
        id: parse_uuid(&row.id, "comment id"),
        video_id: parse_uuid(&row.video_id, "comment video_id"),
        user_id: parse_uuid(&row.user_id, "comment user_id"),
        username: row.username,
        text: row.text,
        created_at: parse_timestamp(&row.created_at, "comment created_at"),
    }
}

pub fn tag(row: TagRow) -> Tag {
    Tag {
        id: parse_uuid(&row.id, "tag id"),
        video_id: parse_uuid(&row.video_id, "tag video_id"),
        name: row.name,
        created_at: parse_timestamp(&row.created_at, "tag created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_timestamps_parse_as_utc() {
        let ts = parse_timestamp("2026-08-23 10:15:00", "test");
        assert_eq!(ts.to_rfc3339(), "2026-08-23T10:15:00+00:00");
    }

    #[test]
    fn listing_groups_likes_and_tags_by_video() {
        let rows = vec![
            VideoRow {
                id: "aaaaaaaa-0000-0000-0000-000000000000".into(),
                channel_id: "bbbbbbbb-0000-0000-0000-000000000000".into(),
                owner_id: "cccccccc-0000-0000-0000-000000000000".into(),
                title: "one".into(),
                description: None,
                video_file: "/tmp/a.mp4".into(),
                thumbnail: None,
                views: 3,
                created_at: "2026-08-23 10:00:00".into(),
            },
            VideoRow {
                id: "dddddddd-0000-0000-0000-000000000000".into(),
                channel_id: "bbbbbbbb-0000-0000-0000-000000000000".into(),
                owner_id: "cccccccc-0000-0000-0000-000000000000".into(),
                title: "two".into(),
                description: None,
                video_file: "/tmp/b.mp4".into(),
                thumbnail: None,
                views: 0,
                created_at: "2026-08-23 11:00:00".into(),
            },
        ];
        let likes = vec![LikeRow {
            video_id: "aaaaaaaa-0000-0000-0000-000000000000".into(),
            user_id: "cccccccc-0000-0000-0000-000000000000".into(),
        }];
        let tags = vec![TagRow {
            id: "t".into(),
            video_id: "dddddddd-0000-0000-0000-000000000000".into(),
            name: "music".into(),
            created_at: "2026-08-23 11:00:00".into(),
        }];

        let shaped = videos(rows, likes, tags);
        assert_eq!(shaped[0].likes.len(), 1);
        assert!(shaped[0].tags.is_empty());
        assert!(shaped[1].likes.is_empty());
        assert_eq!(shaped[1].tags, vec!["music".to_string()]);
    }
}
