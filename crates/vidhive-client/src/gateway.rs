//! Single HTTP gateway for all API calls: base URL, credentials, and a
//! uniform typed error in one place.

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use vidhive_types::api::{
    AddCommentRequest, AddTagRequest, AuthPayload, ChannelData, CreateChannelRequest, LikeRequest,
    LikeResponse, LoginRequest,
};
use vidhive_types::envelope::{Envelope, ErrorEnvelope};
use vidhive_types::models::{Channel, Comment, Tag, User, Video};

/// Uniform failure type for every gateway call. Replaces speculative
/// optional-chaining over error payload shapes with one normalization
/// point: the envelope's `error`/`message` field, or a generic fallback.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The server answered with a failure envelope.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 2xx but the body did not match the contract.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// Rejected client-side before any request was sent.
    #[error("{0}")]
    Invalid(String),
}

/// A file to attach to a multipart request.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    fn into_part(self) -> Result<Part, GatewayError> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)
            .map_err(|e| GatewayError::Invalid(format!("invalid mime type: {e}")))
    }
}

#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<FileAttachment>,
}

#[derive(Debug, Default, Clone)]
pub struct AccountPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<FileAttachment>,
}

#[derive(Debug, Clone)]
pub struct PublishForm {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub video_file: FileAttachment,
    pub thumbnail: Option<FileAttachment>,
}

#[derive(Debug, Default, Clone)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_file: Option<FileAttachment>,
    pub thumbnail: Option<FileAttachment>,
}

#[derive(Debug, Default, Clone)]
pub struct ChannelPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<FileAttachment>,
    pub banner: Option<FileAttachment>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and unwrap the envelope. Failure responses are normalized into
    /// [`GatewayError::Http`] with the envelope message, falling back to a
    /// generic message when the body carries none.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();

        if !status.is_success() {
            let envelope: ErrorEnvelope = response.json().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message: envelope.message(),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    // -- account --

    pub async fn signup(&self, form: SignupForm) -> Result<AuthPayload, GatewayError> {
        let mut body = Form::new()
            .text("username", form.username)
            .text("email", form.email)
            .text("password", form.password);
        if let Some(avatar) = form.avatar {
            body = body.part("avatar", avatar.into_part()?);
        }

        self.send(self.http.post(self.url("/account/signup")).multipart(body))
            .await
    }

    pub async fn login(&self, email: String, password: String) -> Result<AuthPayload, GatewayError> {
        self.send(
            self.http
                .post(self.url("/account/login"))
                .json(&LoginRequest { email, password }),
        )
        .await
    }

    pub async fn logout(&self) -> Result<bool, GatewayError> {
        self.send(self.http.post(self.url("/account/logout"))).await
    }

    pub async fn get_user_data(&self, user_id: Uuid) -> Result<User, GatewayError> {
        self.send(
            self.http
                .get(self.url(&format!("/account/userData/{user_id}"))),
        )
        .await
    }

    pub async fn update_account(
        &self,
        user_id: Uuid,
        patch: AccountPatch,
    ) -> Result<User, GatewayError> {
        let mut body = Form::new();
        if let Some(username) = patch.username {
            body = body.text("username", username);
        }
        if let Some(email) = patch.email {
            body = body.text("email", email);
        }
        if let Some(avatar) = patch.avatar {
            body = body.part("avatar", avatar.into_part()?);
        }

        self.send(
            self.http
                .put(self.url(&format!("/account/update/{user_id}")))
                .multipart(body),
        )
        .await
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<bool, GatewayError> {
        self.send(
            self.http
                .delete(self.url(&format!("/account/delete/{user_id}"))),
        )
        .await
    }

    // -- videos --

    pub async fn fetch_all_videos(&self) -> Result<Vec<Video>, GatewayError> {
        self.send(self.http.get(self.url("/videos/allVideo"))).await
    }

    pub async fn fetch_user_videos(&self, owner_id: Uuid) -> Result<Vec<Video>, GatewayError> {
        self.send(
            self.http
                .get(self.url(&format!("/videos/allUserVideo/{owner_id}"))),
        )
        .await
    }

    pub async fn fetch_video(&self, video_id: Uuid) -> Result<Video, GatewayError> {
        self.send(
            self.http
                .get(self.url(&format!("/videos/videoData/{video_id}"))),
        )
        .await
    }

    /// Pre-check mirrors the server's validation so an obviously bad
    /// publish never leaves the client.
    pub async fn publish_video(&self, form: PublishForm) -> Result<Video, GatewayError> {
        if form.title.trim().is_empty() {
            return Err(GatewayError::Invalid("title is required".into()));
        }

        let mut body = Form::new()
            .text("title", form.title)
            .part("videoFile", form.video_file.into_part()?);
        if let Some(description) = form.description {
            body = body.text("description", description);
        }
        if !form.tags.is_empty() {
            body = body.text("tags", form.tags.join(","));
        }
        if let Some(thumbnail) = form.thumbnail {
            body = body.part("thumbnail", thumbnail.into_part()?);
        }

        self.send(self.http.post(self.url("/videos/publish")).multipart(body))
            .await
    }

    pub async fn update_video(
        &self,
        video_id: Uuid,
        patch: VideoPatch,
    ) -> Result<Video, GatewayError> {
        let mut body = Form::new();
        if let Some(title) = patch.title {
            body = body.text("title", title);
        }
        if let Some(description) = patch.description {
            body = body.text("description", description);
        }
        if let Some(video_file) = patch.video_file {
            body = body.part("videoFile", video_file.into_part()?);
        }
        if let Some(thumbnail) = patch.thumbnail {
            body = body.part("thumbnail", thumbnail.into_part()?);
        }

        self.send(
            self.http
                .put(self.url(&format!("/videos/update/{video_id}")))
                .multipart(body),
        )
        .await
    }

    /// Returns the deleted id so callers can filter their cached lists.
    pub async fn delete_video(&self, video_id: Uuid) -> Result<Uuid, GatewayError> {
        self.send(
            self.http
                .delete(self.url(&format!("/videos/delete/{video_id}"))),
        )
        .await
    }

    pub async fn increment_view(&self, video_id: Uuid) -> Result<Video, GatewayError> {
        self.send(
            self.http
                .put(self.url(&format!("/videos/incrementView/{video_id}"))),
        )
        .await
    }

    pub async fn like_video(
        &self,
        video_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeResponse, GatewayError> {
        self.send(
            self.http
                .post(self.url("/videos/like"))
                .json(&LikeRequest { video_id, user_id }),
        )
        .await
    }

    pub async fn remove_like(
        &self,
        video_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeResponse, GatewayError> {
        self.send(
            self.http
                .post(self.url("/videos/removelike"))
                .json(&LikeRequest { video_id, user_id }),
        )
        .await
    }

    // -- channel --

    pub async fn create_channel(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<Channel, GatewayError> {
        self.send(
            self.http
                .post(self.url("/channel/create"))
                .json(&CreateChannelRequest { name, description }),
        )
        .await
    }

    pub async fn get_channel(&self, channel_id: Uuid) -> Result<ChannelData, GatewayError> {
        self.send(
            self.http
                .get(self.url(&format!("/channel/data/{channel_id}"))),
        )
        .await
    }

    pub async fn update_channel(
        &self,
        channel_id: Uuid,
        patch: ChannelPatch,
    ) -> Result<Channel, GatewayError> {
        let mut body = Form::new();
        if let Some(name) = patch.name {
            body = body.text("name", name);
        }
        if let Some(description) = patch.description {
            body = body.text("description", description);
        }
        if let Some(avatar) = patch.avatar {
            body = body.part("avatar", avatar.into_part()?);
        }
        if let Some(banner) = patch.banner {
            body = body.part("banner", banner.into_part()?);
        }

        self.send(
            self.http
                .put(self.url(&format!("/channel/update/{channel_id}")))
                .multipart(body),
        )
        .await
    }

    pub async fn delete_channel(&self, channel_id: Uuid) -> Result<Uuid, GatewayError> {
        self.send(
            self.http
                .delete(self.url(&format!("/channel/delete/{channel_id}"))),
        )
        .await
    }

    pub async fn subscribe(&self, channel_id: Uuid) -> Result<Uuid, GatewayError> {
        self.send(
            self.http
                .post(self.url(&format!("/channel/subscribe/{channel_id}"))),
        )
        .await
    }

    pub async fn unsubscribe(&self, channel_id: Uuid) -> Result<Uuid, GatewayError> {
        self.send(
            self.http
                .post(self.url(&format!("/channel/unsubscribe/{channel_id}"))),
        )
        .await
    }

    // -- comments --

    pub async fn add_comment(&self, video_id: Uuid, text: String) -> Result<Comment, GatewayError> {
        self.send(
            self.http
                .post(self.url("/comments/add"))
                .json(&AddCommentRequest { video_id, text }),
        )
        .await
    }

    pub async fn comments_for_video(&self, video_id: Uuid) -> Result<Vec<Comment>, GatewayError> {
        self.send(
            self.http
                .get(self.url(&format!("/comments/video/{video_id}"))),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<Uuid, GatewayError> {
        self.send(
            self.http
                .delete(self.url(&format!("/comments/delete/{comment_id}"))),
        )
        .await
    }

    // -- tags --

    pub async fn add_tag(&self, video_id: Uuid, name: String) -> Result<Tag, GatewayError> {
        self.send(
            self.http
                .post(self.url("/tags/add"))
                .json(&AddTagRequest { video_id, name }),
        )
        .await
    }

    pub async fn tags_for_video(&self, video_id: Uuid) -> Result<Vec<Tag>, GatewayError> {
        self.send(self.http.get(self.url(&format!("/tags/video/{video_id}"))))
            .await
    }

    pub async fn delete_tag(&self, tag_id: Uuid) -> Result<Uuid, GatewayError> {
        self.send(
            self.http
                .delete(self.url(&format!("/tags/delete/{tag_id}"))),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(
            client.url("/videos/allVideo"),
            "http://localhost:3000/api/v1/videos/allVideo"
        );
    }

    #[test]
    fn token_lifecycle() {
        let mut client = ApiClient::new("http://localhost:3000");
        assert!(client.token().is_none());
        client.set_token("abc");
        assert_eq!(client.token(), Some("abc"));
        client.clear_token();
        assert!(client.token().is_none());
    }
}
