use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use vidhive_types::api::{AuthPayload, Claims, LoginRequest};
use vidhive_types::envelope::Envelope;
use vidhive_types::models::User;

use crate::error::{ApiError, ApiResult};
use crate::shape;
use crate::state::AppState;
use crate::upload;

/// POST /account/signup — multipart: username, email, password, optional
/// avatar file. Issues an access token; the client persists it.
pub async fn signup(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = upload::collect(&state.uploads, multipart).await?;

    let username = form.field("username").unwrap_or("").trim().to_string();
    let email = form.field("email").unwrap_or("").trim().to_string();
    let password = form.field("password").unwrap_or("").to_string();

    if username.len() < 3 || username.len() > 32 {
        form.discard().await;
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    if !email.contains('@') {
        form.discard().await;
        return Err(ApiError::Validation("a valid email is required".into()));
    }
    if password.len() < 8 {
        form.discard().await;
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let lookup_email = email.clone();
    let existing = state
        .with_db(move |db| db.get_user_by_email(&lookup_email))
        .await?;
    if existing.is_some() {
        form.discard().await;
        return Err(ApiError::Conflict("email is already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();
    let avatar = form.file_path("avatar");

    let uid = user_id.to_string();
    let uname = username.clone();
    let mail = email.clone();
    state
        .with_db(move |db| db.create_user(&uid, &uname, &mail, &password_hash, avatar.as_deref()))
        .await?;

    let (token, jti) = issue_token(&state.jwt_secret, user_id, &username)?;
    let sid = jti.to_string();
    let uid = user_id.to_string();
    state.with_db(move |db| db.create_session(&sid, &uid)).await?;

    let uid = user_id.to_string();
    let row = state
        .with_db(move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(AuthPayload {
            user: shape::user(row),
            access_token: token,
            has_channel: false,
        })),
    ))
}

/// POST /account/login — JSON { email, password }.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.clone();
    let row = state
        .with_db(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized("invalid email or password"))?;

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {e}")))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("invalid email or password"))?;

    let user_id = shape::parse_uuid(&row.id, "user id");
    let (token, jti) = issue_token(&state.jwt_secret, user_id, &row.username)?;

    let sid = jti.to_string();
    let uid = row.id.clone();
    state.with_db(move |db| db.create_session(&sid, &uid)).await?;

    let uid = row.id.clone();
    let has_channel = state
        .with_db(move |db| db.get_channel_by_owner(&uid))
        .await?
        .is_some();

    Ok(Json(Envelope::new(AuthPayload {
        user: shape::user(row),
        access_token: token,
        has_channel,
    })))
}

/// POST /account/logout — deletes the session named by the token's `jti`.
/// The same token is rejected by the auth middleware afterwards.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let sid = claims.jti.to_string();
    state.with_db(move |db| db.delete_session(&sid)).await?;
    Ok(Json(Envelope::with_message(true, "logged out")))
}

/// GET /account/userData/{id} — public profile.
pub async fn user_data(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let uid = user_id.to_string();
    let row = state
        .with_db(move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(Envelope::new(shape::user(row))))
}

/// PUT /account/update/{id} — multipart profile patch, optional avatar.
/// Returns the canonical updated record.
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = upload::collect(&state.uploads, multipart).await?;
    update_form(&state, &claims, user_id, form).await
}

/// The post-collect half of [`update`]. Every rejection path discards the
/// collected files first.
async fn update_form(
    state: &AppState,
    claims: &Claims,
    user_id: Uuid,
    form: upload::FormData,
) -> ApiResult<Json<Envelope<User>>> {
    if claims.sub != user_id {
        form.discard().await;
        return Err(ApiError::Forbidden("you can only update your own account"));
    }

    let username = form.field("username").map(str::to_string);
    let email = form.field("email").map(str::to_string);
    if let Some(ref e) = email
        && !e.contains('@')
    {
        form.discard().await;
        return Err(ApiError::Validation("a valid email is required".into()));
    }
    let avatar = form.file_path("avatar");

    let uid = user_id.to_string();
    let found = state
        .with_db(move |db| {
            db.update_user(
                &uid,
                username.as_deref(),
                email.as_deref(),
                avatar.as_deref(),
            )
        })
        .await?;
    if !found {
        form.discard().await;
        return Err(ApiError::NotFound("user"));
    }

    let uid = user_id.to_string();
    let row = state
        .with_db(move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(Envelope::new(shape::user(row))))
}

/// DELETE /account/delete/{id} — cascades sessions, channel, videos,
/// comments, likes, subscriptions.
pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    if claims.sub != user_id {
        return Err(ApiError::Forbidden("you can only delete your own account"));
    }

    let uid = user_id.to_string();
    let found = state.with_db(move |db| db.delete_user(&uid)).await?;
    if !found {
        return Err(ApiError::NotFound("user"));
    }

    Ok(Json(Envelope::with_message(true, "account deleted")))
}

/// Mint a 30-day HS256 token. Returns the token and its session id.
pub fn issue_token(secret: &str, user_id: Uuid, username: &str) -> ApiResult<(String, Uuid)> {
    let jti = Uuid::new_v4();
    let claims = Claims {
        sub: user_id,
        jti,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))?;

    Ok((token, jti))
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

    fn claims_for(user_id: Uuid) -> Claims {
        Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            username: "alice".into(),
            exp: (chrono::Utc::now() + chrono::Duration::days(1)).timestamp() as usize,
        }
    }

    #[tokio::test]
    async fn rejected_update_discards_the_uploaded_avatar() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        // Authenticated id with no matching row, as after a concurrent
        // account deletion.
        let user_id = Uuid::new_v4();
        let avatar = dir.path().join("avatar-1-1.png");
        tokio::fs::write(&avatar, b"png").await.unwrap();

        let mut form = FormData::default();
        form.files.push(SavedFile {
            field: "avatar".into(),
            path: avatar.clone(),
            size: 3,
        });

        let err = update_form(&state, &claims_for(user_id), user_id, form)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(!avatar.exists());
    }

    #[tokio::test]
    async fn updating_someone_elses_account_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let err = update_form(
            &state,
            &claims_for(Uuid::new_v4()),
            Uuid::new_v4(),
            FormData::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
