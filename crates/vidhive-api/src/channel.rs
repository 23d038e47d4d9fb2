use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use vidhive_types::api::{ChannelData, Claims, CreateChannelRequest};
use vidhive_types::envelope::Envelope;

use crate::error::{ApiError, ApiResult};
use crate::shape;
use crate::state::AppState;
use crate::upload;

/// POST /channel/create — JSON; one channel per user.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateChannelRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("channel name is required".into()));
    }

    let oid = claims.sub.to_string();
    if state
        .with_db(move |db| db.get_channel_by_owner(&oid))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("you already have a channel".into()));
    }

    let channel_id = Uuid::new_v4();
    let cid = channel_id.to_string();
    let oid = claims.sub.to_string();
    let description = req.description.clone();
    state
        .with_db(move |db| db.create_channel(&cid, &oid, &name, description.as_deref()))
        .await?;

    info!("Channel {} created by {}", channel_id, claims.username);

    let cid = channel_id.to_string();
    let channel = state
        .with_db(move |db| {
            let row = db
                .get_channel(&cid)?
                .ok_or_else(|| anyhow::anyhow!("channel vanished after insert"))?;
            let subscribers = db.get_subscribers(&cid)?;
            Ok(shape::channel(row, subscribers))
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(channel, "channel created")),
    ))
}

/// GET /channel/data/{id} — channel plus its published videos.
pub async fn data(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let cid = channel_id.to_string();
    let payload = state
        .with_db(move |db| {
            let Some(row) = db.get_channel(&cid)? else {
                return Ok(None);
            };
            let subscribers = db.get_subscribers(&cid)?;

            let video_rows = db.list_videos_by_channel(&cid)?;
            let ids: Vec<String> = video_rows.iter().map(|r| r.id.clone()).collect();
            let likes = db.get_likes_for_videos(&ids)?;
            let tags = db.get_tags_for_videos(&ids)?;

            Ok(Some(ChannelData {
                channel: shape::channel(row, subscribers),
                videos: shape::videos(video_rows, likes, tags),
            }))
        })
        .await?
        .ok_or(ApiError::NotFound("channel"))?;

    Ok(Json(Envelope::new(payload)))
}

/// PUT /channel/update/{id} — multipart; optional avatar and banner files.
pub async fn update(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = upload::collect(&state.uploads, multipart).await?;

    let cid = channel_id.to_string();
    let row = state.with_db(move |db| db.get_channel(&cid)).await?;
    let Some(row) = row else {
        form.discard().await;
        return Err(ApiError::NotFound("channel"));
    };
    if row.owner_id != claims.sub.to_string() {
        form.discard().await;
        return Err(ApiError::Forbidden("you can only update your own channel"));
    }

    let name = form.field("name").map(str::to_string);
    if let Some(ref n) = name
        && n.trim().is_empty()
    {
        form.discard().await;
        return Err(ApiError::Validation("channel name cannot be empty".into()));
    }
    let description = form.field("description").map(str::to_string);
    let avatar = form.file_path("avatar");
    let banner = form.file_path("banner");

    let cid = channel_id.to_string();
    state
        .with_db(move |db| {
            db.update_channel(
                &cid,
                name.as_deref(),
                description.as_deref(),
                avatar.as_deref(),
                banner.as_deref(),
            )
        })
        .await?;

    let cid = channel_id.to_string();
    let channel = state
        .with_db(move |db| {
            let row = db
                .get_channel(&cid)?
                .ok_or_else(|| anyhow::anyhow!("channel vanished after update"))?;
            let subscribers = db.get_subscribers(&cid)?;
            Ok(shape::channel(row, subscribers))
        })
        .await?;

    Ok(Json(Envelope::with_message(channel, "channel updated")))
}

/// DELETE /channel/delete/{id} — cascades videos and subscriptions.
pub async fn delete(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let cid = channel_id.to_string();
    let row = state
        .with_db(move |db| db.get_channel(&cid))
        .await?
        .ok_or(ApiError::NotFound("channel"))?;
    if row.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("you can only delete your own channel"));
    }

    let cid = channel_id.to_string();
    state.with_db(move |db| db.delete_channel(&cid)).await?;

    info!("Channel {} deleted by {}", channel_id, claims.username);
    Ok(Json(Envelope::with_message(channel_id, "channel deleted")))
}

/// POST /channel/subscribe/{id} — idempotent set insert on the
/// subscriber set; subscribing twice changes nothing.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let cid = channel_id.to_string();
    state
        .with_db(move |db| db.get_channel(&cid))
        .await?
        .ok_or(ApiError::NotFound("channel"))?;

    let cid = channel_id.to_string();
    let uid = claims.sub.to_string();
    state.with_db(move |db| db.subscribe(&cid, &uid)).await?;

    Ok(Json(Envelope::with_message(channel_id, "subscribed")))
}

/// POST /channel/unsubscribe/{id} — absent membership is a no-op.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(channel_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let cid = channel_id.to_string();
    state
        .with_db(move |db| db.get_channel(&cid))
        .await?
        .ok_or(ApiError::NotFound("channel"))?;

    let cid = channel_id.to_string();
    let uid = claims.sub.to_string();
    state.with_db(move |db| db.unsubscribe(&cid, &uid)).await?;

    Ok(Json(Envelope::with_message(channel_id, "unsubscribed")))
}
