use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Channel, User, Video};

// -- JWT Claims --

/// Canonical claims shared by the API middleware and the token issuer.
/// `jti` names the server-side session row; logout deletes it, so a token
/// outlives its session only cryptographically, never practically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Account --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub has_channel: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Videos --

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub video_id: Uuid,
    pub user_id: Uuid,
}

/// Returned by like/removelike so the caller can patch its loaded item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub video_id: Uuid,
    pub user_id: Uuid,
    pub liked: bool,
}

// -- Channel --

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Channel page payload: the channel plus its published videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelData {
    #[serde(flatten)]
    pub channel: Channel,
    pub videos: Vec<Video>,
}

// -- Comments --

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub video_id: Uuid,
    pub text: String,
}

// -- Tags --

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTagRequest {
    pub video_id: Uuid,
    pub name: String,
}
