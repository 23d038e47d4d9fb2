use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use vidhive_types::api::{AddTagRequest, Claims};
use vidhive_types::envelope::Envelope;

use crate::error::{ApiError, ApiResult};
use crate::shape;
use crate::state::AppState;

/// POST /tags/add — JSON { videoId, name }; video owner only.
pub async fn add(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddTagRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = req.name.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::Validation("tag name is required".into()));
    }

    let vid = req.video_id.to_string();
    let video = state
        .with_db(move |db| db.get_video(&vid))
        .await?
        .ok_or(ApiError::NotFound("video"))?;
    if video.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("you can only tag your own videos"));
    }

    let tag_id = Uuid::new_v4();
    let tid = tag_id.to_string();
    let vid = req.video_id.to_string();
    let tag = state
        .with_db(move |db| {
            if !db.insert_tag(&tid, &vid, &name)? {
                return Ok(None);
            }
            db.get_tag(&tid)
        })
        .await?
        .ok_or_else(|| ApiError::Conflict("tag already exists on this video".into()))?;

    Ok((StatusCode::CREATED, Json(Envelope::new(shape::tag(tag)))))
}

/// GET /tags/video/{videoId}
pub async fn for_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let vid = video_id.to_string();
    let tags = state
        .with_db(move |db| {
            let rows = db.list_tags(&vid)?;
            Ok(rows.into_iter().map(shape::tag).collect::<Vec<_>>())
        })
        .await?;

    Ok(Json(Envelope::new(tags)))
}

/// DELETE /tags/delete/{id} — video owner only.
pub async fn delete(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let tid = tag_id.to_string();
    let tag = state
        .with_db(move |db| db.get_tag(&tid))
        .await?
        .ok_or(ApiError::NotFound("tag"))?;

    let vid = tag.video_id.clone();
    let video = state
        .with_db(move |db| db.get_video(&vid))
        .await?
        .ok_or(ApiError::NotFound("video"))?;
    if video.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("you can only edit tags on your own videos"));
    }

    let tid = tag_id.to_string();
    state.with_db(move |db| db.delete_tag(&tid)).await?;

    Ok(Json(Envelope::with_message(tag_id, "tag deleted")))
}
