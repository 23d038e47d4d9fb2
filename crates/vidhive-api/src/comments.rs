use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use vidhive_types::api::{AddCommentRequest, Claims};
use vidhive_types::envelope::Envelope;

use crate::error::{ApiError, ApiResult};
use crate::shape;
use crate::state::AppState;

/// POST /comments/add — JSON { videoId, text }.
pub async fn add(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::Validation("comment text is required".into()));
    }

    let vid = req.video_id.to_string();
    state
        .with_db(move |db| db.get_video(&vid))
        .await?
        .ok_or(ApiError::NotFound("video"))?;

    let comment_id = Uuid::new_v4();
    let cid = comment_id.to_string();
    let vid = req.video_id.to_string();
    let uid = claims.sub.to_string();
    let comment = state
        .with_db(move |db| {
            db.insert_comment(&cid, &vid, &uid, &text)?;
            db.get_comment(&cid)?
                .ok_or_else(|| anyhow::anyhow!("comment vanished after insert"))
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(shape::comment(comment))),
    ))
}

/// GET /comments/video/{videoId} — newest first.
pub async fn for_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let vid = video_id.to_string();
    let comments = state
        .with_db(move |db| {
            let rows = db.list_comments(&vid)?;
            Ok(rows.into_iter().map(shape::comment).collect::<Vec<_>>())
        })
        .await?;

    Ok(Json(Envelope::new(comments)))
}

/// DELETE /comments/delete/{id} — author only.
pub async fn delete(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let cid = comment_id.to_string();
    let row = state
        .with_db(move |db| db.get_comment(&cid))
        .await?
        .ok_or(ApiError::NotFound("comment"))?;
    if row.user_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("you can only delete your own comments"));
    }

    let cid = comment_id.to_string();
    state.with_db(move |db| db.delete_comment(&cid)).await?;

    Ok(Json(Envelope::with_message(comment_id, "comment deleted")))
}
