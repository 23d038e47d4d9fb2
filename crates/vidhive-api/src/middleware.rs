use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use vidhive_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the bearer JWT, then confirm the session it names
/// still exists — logout deletes the session row, so a token that decodes
/// fine is still rejected after logout.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let claims = authenticate(&state, auth_header.as_deref()).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// The decision half of [`require_auth`]: header syntax, signature, and
/// the live-session check, in that order.
async fn authenticate(state: &AppState, auth_header: Option<&str>) -> Result<Claims, ApiError> {
    let auth_header =
        auth_header.ok_or(ApiError::Unauthorized("missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("malformed authorization header"))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("invalid or expired token"))?;

    let jti = token_data.claims.jti.to_string();
    let live = state.with_db(move |db| db.session_exists(&jti)).await?;
    if !live {
        return Err(ApiError::Unauthorized("session has been terminated"));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use uuid::Uuid;

    use crate::account::issue_token;
    use crate::state::AppStateInner;
    use crate::upload::UploadStore;
    use vidhive_db::Database;

    async fn test_state(dir: &std::path::Path) -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            uploads: UploadStore::new(dir.to_path_buf()).await.unwrap(),
            jwt_secret: "test-secret".into(),
        })
    }

    fn seed_user(state: &AppState) -> Uuid {
        let user_id = Uuid::new_v4();
        state
            .db
            .create_user(&user_id.to_string(), "alice", "alice@example.com", "hash", None)
            .unwrap();
        user_id
    }

    #[tokio::test]
    async fn token_is_rejected_after_its_session_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let user_id = seed_user(&state);

        let (token, jti) = issue_token(&state.jwt_secret, user_id, "alice").unwrap();
        state
            .db
            .create_session(&jti.to_string(), &user_id.to_string())
            .unwrap();

        let header = format!("Bearer {token}");
        let claims = authenticate(&state, Some(&header)).await.unwrap();
        assert_eq!(claims.sub, user_id);

        // Logout's server-side effect: the session row is gone, and the
        // structurally valid token stops working.
        state.db.delete_session(&jti.to_string()).unwrap();
        let err = authenticate(&state, Some(&header)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_or_malformed_headers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let err = authenticate(&state, None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = authenticate(&state, Some("Basic abc")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let user_id = seed_user(&state);

        let (token, jti) = issue_token("other-secret", user_id, "alice").unwrap();
        state
            .db
            .create_session(&jti.to_string(), &user_id.to_string())
            .unwrap();

        let header = format!("Bearer {token}");
        let err = authenticate(&state, Some(&header)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
