use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use vidhive_types::api::{Claims, LikeRequest, LikeResponse};
use vidhive_types::envelope::Envelope;
use vidhive_types::models::Video;

use crate::error::{ApiError, ApiResult};
use crate::shape;
use crate::state::AppState;
use crate::upload;

/// GET /videos/allVideo
pub async fn all_videos(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let videos = state
        .with_db(|db| {
            let rows = db.list_videos()?;
            let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
            let likes = db.get_likes_for_videos(&ids)?;
            let tags = db.get_tags_for_videos(&ids)?;
            Ok(shape::videos(rows, likes, tags))
        })
        .await?;

    Ok(Json(Envelope::new(videos)))
}

/// GET /videos/allUserVideo/{ownerId}
pub async fn all_user_videos(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let oid = owner_id.to_string();
    let videos = state
        .with_db(move |db| {
            let rows = db.list_videos_by_owner(&oid)?;
            let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
            let likes = db.get_likes_for_videos(&ids)?;
            let tags = db.get_tags_for_videos(&ids)?;
            Ok(shape::videos(rows, likes, tags))
        })
        .await?;

    Ok(Json(Envelope::new(videos)))
}

/// GET /videos/videoData/{id}
pub async fn video_data(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let video = load_video(&state, video_id).await?;
    Ok(Json(Envelope::new(video)))
}

/// POST /videos/publish — multipart. A non-empty title and a `videoFile`
/// part are required; the request fails before any persistence write when
/// either is missing, and nothing is left in scratch storage.
pub async fn publish(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = upload::collect(&state.uploads, multipart).await?;
    publish_form(&state, &claims, form).await
}

/// The post-collect half of [`publish`]. Validation runs before any
/// persistence write; every rejection discards the collected files.
async fn publish_form(
    state: &AppState,
    claims: &Claims,
    form: upload::FormData,
) -> ApiResult<(StatusCode, Json<Envelope<Video>>)> {
    let title = form.field("title").unwrap_or("").trim().to_string();
    if title.is_empty() {
        form.discard().await;
        return Err(ApiError::Validation("title is required".into()));
    }
    let Some(video_file) = form.file_path("videoFile") else {
        form.discard().await;
        return Err(ApiError::Validation("a video file is required".into()));
    };

    let oid = claims.sub.to_string();
    let channel = state
        .with_db(move |db| db.get_channel_by_owner(&oid))
        .await?;
    let Some(channel) = channel else {
        form.discard().await;
        return Err(ApiError::Validation(
            "create a channel before publishing".into(),
        ));
    };

    let video_id = Uuid::new_v4();
    let description = form.field("description").map(str::to_string);
    let thumbnail = form.file_path("thumbnail");
    let tags: Vec<String> = form
        .field("tags")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let vid = video_id.to_string();
    let cid = channel.id.clone();
    let oid = claims.sub.to_string();
    let file = video_file.clone();
    state
        .with_db(move |db| {
            db.insert_video(
                &vid,
                &cid,
                &oid,
                &title,
                description.as_deref(),
                &file,
                thumbnail.as_deref(),
            )?;
            for tag in &tags {
                db.insert_tag(&Uuid::new_v4().to_string(), &vid, tag)?;
            }
            Ok(())
        })
        .await?;

    info!("Video {} published by {}", video_id, claims.username);

    let video = load_video(state, video_id).await?;
    Ok((StatusCode::CREATED, Json(Envelope::new(video))))
}

/// PUT /videos/update/{id} — multipart patch; responds with the canonical
/// record so callers replace rather than merge locally.
pub async fn update(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = upload::collect(&state.uploads, multipart).await?;

    let vid = video_id.to_string();
    let row = state.with_db(move |db| db.get_video(&vid)).await?;
    let Some(row) = row else {
        form.discard().await;
        return Err(ApiError::NotFound("video"));
    };
    if row.owner_id != claims.sub.to_string() {
        form.discard().await;
        return Err(ApiError::Forbidden("you can only update your own videos"));
    }

    let title = form.field("title").map(str::to_string);
    if let Some(ref t) = title
        && t.trim().is_empty()
    {
        form.discard().await;
        return Err(ApiError::Validation("title cannot be empty".into()));
    }
    let description = form.field("description").map(str::to_string);
    let video_file = form.file_path("videoFile");
    let thumbnail = form.file_path("thumbnail");

    let vid = video_id.to_string();
    state
        .with_db(move |db| {
            db.update_video(
                &vid,
                title.as_deref(),
                description.as_deref(),
                video_file.as_deref(),
                thumbnail.as_deref(),
            )
        })
        .await?;

    let video = load_video(&state, video_id).await?;
    Ok(Json(Envelope::new(video)))
}

/// DELETE /videos/delete/{id} — cascades comments, likes, tags. Client
/// caches holding the id filter it out themselves.
pub async fn delete(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let vid = video_id.to_string();
    let row = state
        .with_db(move |db| db.get_video(&vid))
        .await?
        .ok_or(ApiError::NotFound("video"))?;
    if row.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("you can only delete your own videos"));
    }

    let vid = video_id.to_string();
    state.with_db(move |db| db.delete_video(&vid)).await?;

    info!("Video {} deleted by {}", video_id, claims.username);
    Ok(Json(Envelope::with_message(video_id, "video deleted")))
}

/// PUT /videos/incrementView/{id} — bumps the counter and returns the
/// updated record so callers reconcile lists without a refetch.
pub async fn increment_view(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let vid = video_id.to_string();
    let found = state.with_db(move |db| db.increment_views(&vid)).await?;
    if !found {
        return Err(ApiError::NotFound("video"));
    }

    let video = load_video(&state, video_id).await?;
    Ok(Json(Envelope::new(video)))
}

/// POST /videos/like — idempotent set insert, never a duplicate.
pub async fn like(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<LikeRequest>,
) -> ApiResult<impl IntoResponse> {
    apply_like(state, req, true).await
}

/// POST /videos/removelike — removing an absent like is a no-op.
pub async fn remove_like(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<LikeRequest>,
) -> ApiResult<impl IntoResponse> {
    apply_like(state, req, false).await
}

async fn apply_like(
    state: AppState,
    req: LikeRequest,
    liked: bool,
) -> ApiResult<impl IntoResponse> {
    let vid = req.video_id.to_string();
    state
        .with_db(move |db| db.get_video(&vid))
        .await?
        .ok_or(ApiError::NotFound("video"))?;

    let vid = req.video_id.to_string();
    let uid = req.user_id.to_string();
    state
        .with_db(move |db| {
            if liked {
                db.like_video(&vid, &uid)
            } else {
                db.unlike_video(&vid, &uid)
            }
        })
        .await?;

    Ok(Json(Envelope::new(LikeResponse {
        video_id: req.video_id,
        user_id: req.user_id,
        liked,
    })))
}

/// Fetch one video with its like set and tags.
async fn load_video(state: &AppState, video_id: Uuid) -> ApiResult<Video> {
    let vid = video_id.to_string();
    state
        .with_db(move |db| {
            let Some(row) = db.get_video(&vid)? else {
                return Ok(None);
            };
            let likes = db.get_likes(&vid)?;
            let tags = db.list_tags(&vid)?.into_iter().map(|t| t.name).collect();
            Ok(Some(shape::video(row, likes, tags)))
        })
        .await?
        .ok_or(ApiError::NotFound("video"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::state::AppStateInner;
    use crate::upload::{FormData, SavedFile, UploadStore};
    use vidhive_db::Database;

    async fn test_state(dir: &std::path::Path) -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            uploads: UploadStore::new(dir.to_path_buf()).await.unwrap(),
            jwt_secret: "test-secret".into(),
        })
    }

    fn seed_creator(state: &AppState) -> Claims {
        let user_id = Uuid::new_v4();
        state
            .db
            .create_user(&user_id.to_string(), "alice", "alice@example.com", "hash", None)
            .unwrap();
        state
            .db
            .create_channel(
                &Uuid::new_v4().to_string(),
                &user_id.to_string(),
                "alice's channel",
                None,
            )
            .unwrap();
        Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            username: "alice".into(),
            exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        }
    }

    #[tokio::test]
    async fn publish_without_a_media_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let claims = seed_creator(&state);

        let mut form = FormData::default();
        form.fields.insert("title".into(), "first clip".into());

        let err = publish_form(&state, &claims, form).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(state.db.list_videos().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_publish_leaves_no_scratch_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let claims = seed_creator(&state);

        // A stored media file but no title: the rejection must also clean
        // up the scratch file the middleware already wrote.
        let path = dir.path().join("videoFile-1-1.mp4");
        tokio::fs::write(&path, b"media").await.unwrap();

        let mut form = FormData::default();
        form.files.push(SavedFile {
            field: "videoFile".into(),
            path: path.clone(),
            size: 5,
        });

        let err = publish_form(&state, &claims, form).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(!path.exists());
        assert!(state.db.list_videos().unwrap().is_empty());
    }

    #[tokio::test]
    async fn publish_requires_a_channel() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let user_id = Uuid::new_v4();
        state
            .db
            .create_user(&user_id.to_string(), "bob", "bob@example.com", "hash", None)
            .unwrap();
        let claims = Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            username: "bob".into(),
            exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        };

        let path = dir.path().join("videoFile-2-2.mp4");
        tokio::fs::write(&path, b"media").await.unwrap();

        let mut form = FormData::default();
        form.fields.insert("title".into(), "orphan clip".into());
        form.files.push(SavedFile {
            field: "videoFile".into(),
            path: path.clone(),
            size: 5,
        });

        let err = publish_form(&state, &claims, form).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(!path.exists());
        assert!(state.db.list_videos().unwrap().is_empty());
    }
}
