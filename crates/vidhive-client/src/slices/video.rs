use uuid::Uuid;

use vidhive_types::api::LikeResponse;
use vidhive_types::models::Video;

use crate::gateway::{ApiClient, PublishForm, VideoPatch};
use crate::slices::Phase;

/// Video slice: the global listing, one user's listing, and the single
/// currently-loaded video.
#[derive(Debug, Default)]
pub struct VideoState {
    pub videos: Vec<Video>,
    pub user_videos: Vec<Video>,
    pub video: Option<Video>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum VideoAction {
    FetchAll(Phase<Vec<Video>>),
    FetchUserVideos(Phase<Vec<Video>>),
    FetchById(Phase<Video>),
    Publish(Phase<Video>),
    Update(Phase<Video>),
    Delete(Phase<Uuid>),
    IncrementView(Phase<Video>),
    Like(Phase<LikeResponse>),
    RemoveLike(Phase<LikeResponse>),
    /// Synchronous: drop the user-scoped listing (e.g. on profile switch).
    ResetUserVideos,
}

pub fn reduce(state: &mut VideoState, action: VideoAction) {
    match action {
        // fetch-all replaces the full collection
        VideoAction::FetchAll(phase) => {
            if let Some(videos) = settle(state, phase) {
                state.videos = videos;
            }
        }

        VideoAction::FetchUserVideos(phase) => {
            if let Some(videos) = settle(state, phase) {
                state.user_videos = videos;
            }
        }

        // fetch-by-id replaces the single-item slot
        VideoAction::FetchById(phase) => {
            if let Some(video) = settle(state, phase) {
                state.video = Some(video);
            }
        }

        // publish appends to the collection tail
        VideoAction::Publish(phase) => {
            if let Some(video) = settle(state, phase) {
                state.videos.push(video);
            }
        }

        // update replaces the slot with the server's canonical record,
        // never a local patch
        VideoAction::Update(phase) => {
            if let Some(video) = settle(state, phase) {
                state.video = Some(video);
            }
        }

        // delete removes the id from every collection that might hold it
        VideoAction::Delete(phase) => {
            if let Some(id) = settle(state, phase) {
                state.videos.retain(|v| v.id != id);
                state.user_videos.retain(|v| v.id != id);
            }
        }

        // the returned record replaces the matching list entry, so the
        // listing reconciles without a refetch
        VideoAction::IncrementView(phase) => {
            if let Some(updated) = settle(state, phase) {
                if let Some(slot) = state.videos.iter_mut().find(|v| v.id == updated.id) {
                    *slot = updated;
                }
            }
        }

        // like/unlike touch only the loaded single item; the listing may
        // show stale like state until refetched
        VideoAction::Like(phase) => {
            if let Some(like) = settle(state, phase)
                && let Some(video) = state.video.as_mut()
                && video.id == like.video_id
                && !video.likes.contains(&like.user_id)
            {
                video.likes.push(like.user_id);
            }
        }

        VideoAction::RemoveLike(phase) => {
            if let Some(like) = settle(state, phase)
                && let Some(video) = state.video.as_mut()
                && video.id == like.video_id
            {
                video.likes.retain(|id| *id != like.user_id);
            }
        }

        VideoAction::ResetUserVideos => {
            state.user_videos.clear();
        }
    }
}

/// Apply the loading/error bookkeeping common to every phase; yields the
/// payload only on fulfillment.
fn settle<T>(state: &mut VideoState, phase: Phase<T>) -> Option<T> {
    match phase {
        Phase::Pending => {
            state.loading = true;
            state.error = None;
            None
        }
        Phase::Fulfilled(payload) => {
            state.loading = false;
            Some(payload)
        }
        Phase::Rejected(message) => {
            state.loading = false;
            state.error = Some(message);
            None
        }
    }
}

// -- dispatch helpers --

pub async fn fetch_all_videos(client: &ApiClient, state: &mut VideoState) {
    reduce(state, VideoAction::FetchAll(Phase::Pending));
    let phase = match client.fetch_all_videos().await {
        Ok(videos) => Phase::Fulfilled(videos),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::FetchAll(phase));
}

pub async fn fetch_user_videos(client: &ApiClient, state: &mut VideoState, owner_id: Uuid) {
    reduce(state, VideoAction::FetchUserVideos(Phase::Pending));
    let phase = match client.fetch_user_videos(owner_id).await {
        Ok(videos) => Phase::Fulfilled(videos),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::FetchUserVideos(phase));
}

pub async fn fetch_video(client: &ApiClient, state: &mut VideoState, video_id: Uuid) {
    reduce(state, VideoAction::FetchById(Phase::Pending));
    let phase = match client.fetch_video(video_id).await {
        Ok(video) => Phase::Fulfilled(video),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::FetchById(phase));
}

pub async fn publish_video(client: &ApiClient, state: &mut VideoState, form: PublishForm) {
    reduce(state, VideoAction::Publish(Phase::Pending));
    let phase = match client.publish_video(form).await {
        Ok(video) => Phase::Fulfilled(video),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::Publish(phase));
}

pub async fn update_video(
    client: &ApiClient,
    state: &mut VideoState,
    video_id: Uuid,
    patch: VideoPatch,
) {
    reduce(state, VideoAction::Update(Phase::Pending));
    let phase = match client.update_video(video_id, patch).await {
        Ok(video) => Phase::Fulfilled(video),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::Update(phase));
}

pub async fn delete_video(client: &ApiClient, state: &mut VideoState, video_id: Uuid) {
    reduce(state, VideoAction::Delete(Phase::Pending));
    let phase = match client.delete_video(video_id).await {
        Ok(id) => Phase::Fulfilled(id),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::Delete(phase));
}

pub async fn increment_view(client: &ApiClient, state: &mut VideoState, video_id: Uuid) {
    reduce(state, VideoAction::IncrementView(Phase::Pending));
    let phase = match client.increment_view(video_id).await {
        Ok(video) => Phase::Fulfilled(video),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::IncrementView(phase));
}

pub async fn like_video(client: &ApiClient, state: &mut VideoState, video_id: Uuid, user_id: Uuid) {
    reduce(state, VideoAction::Like(Phase::Pending));
    let phase = match client.like_video(video_id, user_id).await {
        Ok(like) => Phase::Fulfilled(like),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::Like(phase));
}

pub async fn remove_like(
    client: &ApiClient,
    state: &mut VideoState,
    video_id: Uuid,
    user_id: Uuid,
) {
    reduce(state, VideoAction::RemoveLike(Phase::Pending));
    let phase = match client.remove_like(video_id, user_id).await {
        Ok(like) => Phase::Fulfilled(like),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, VideoAction::RemoveLike(phase));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video(id: Uuid) -> Video {
        Video {
            id,
            channel_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "clip".into(),
            description: None,
            video_file: "/tmp/clip.mp4".into(),
            thumbnail: None,
            views: 0,
            likes: vec![],
            tags: vec![],
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn pending_sets_loading_and_clears_error() {
        let mut state = VideoState {
            error: Some("old failure".into()),
            ..Default::default()
        };
        reduce(&mut state, VideoAction::FetchAll(Phase::Pending));
        assert!(state.loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn fulfilled_never_leaves_loading_set() {
        let mut state = VideoState::default();
        reduce(&mut state, VideoAction::FetchAll(Phase::Pending));
        reduce(&mut state, VideoAction::FetchAll(Phase::Fulfilled(vec![])));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn rejected_clears_loading_and_sets_error() {
        let mut state = VideoState::default();
        reduce(&mut state, VideoAction::FetchById(Phase::Pending));
        reduce(
            &mut state,
            VideoAction::FetchById(Phase::Rejected("video not found".into())),
        );
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("video not found"));
    }

    #[test]
    fn publish_appends_to_tail() {
        let mut state = VideoState::default();
        let first = sample_video(Uuid::new_v4());
        let second = sample_video(Uuid::new_v4());
        reduce(&mut state, VideoAction::FetchAll(Phase::Fulfilled(vec![first.clone()])));
        reduce(&mut state, VideoAction::Publish(Phase::Fulfilled(second.clone())));
        assert_eq!(state.videos.len(), 2);
        assert_eq!(state.videos[1].id, second.id);
    }

    #[test]
    fn delete_removes_from_every_collection() {
        let mut state = VideoState::default();
        let video = sample_video(Uuid::new_v4());
        state.videos = vec![video.clone()];
        state.user_videos = vec![video.clone()];

        reduce(&mut state, VideoAction::Delete(Phase::Fulfilled(video.id)));
        assert!(state.videos.is_empty());
        assert!(state.user_videos.is_empty());
    }

    #[test]
    fn increment_view_replaces_matching_list_entry() {
        let mut state = VideoState::default();
        let mut video = sample_video(Uuid::new_v4());
        state.videos = vec![video.clone(), sample_video(Uuid::new_v4())];

        video.views = 1;
        reduce(&mut state, VideoAction::IncrementView(Phase::Fulfilled(video.clone())));
        assert_eq!(state.videos[0].views, 1);
        assert_eq!(state.videos[1].views, 0);
    }

    #[test]
    fn like_is_idempotent_on_the_loaded_item() {
        let mut state = VideoState::default();
        let video = sample_video(Uuid::new_v4());
        let user = Uuid::new_v4();
        state.video = Some(video.clone());

        let like = LikeResponse {
            video_id: video.id,
            user_id: user,
            liked: true,
        };
        reduce(&mut state, VideoAction::Like(Phase::Fulfilled(like.clone())));
        reduce(&mut state, VideoAction::Like(Phase::Fulfilled(like)));
        assert_eq!(state.video.as_ref().unwrap().likes, vec![user]);
    }

    #[test]
    fn unlike_of_absent_id_is_a_noop() {
        let mut state = VideoState::default();
        let video = sample_video(Uuid::new_v4());
        state.video = Some(video.clone());

        reduce(
            &mut state,
            VideoAction::RemoveLike(Phase::Fulfilled(LikeResponse {
                video_id: video.id,
                user_id: Uuid::new_v4(),
                liked: false,
            })),
        );
        assert!(state.video.as_ref().unwrap().likes.is_empty());
    }

    #[test]
    fn like_does_not_touch_the_listing() {
        // The listing keeps stale like state until refetched.
        let mut state = VideoState::default();
        let video = sample_video(Uuid::new_v4());
        let user = Uuid::new_v4();
        state.videos = vec![video.clone()];
        state.video = Some(video.clone());

        reduce(
            &mut state,
            VideoAction::Like(Phase::Fulfilled(LikeResponse {
                video_id: video.id,
                user_id: user,
                liked: true,
            })),
        );
        assert!(state.videos[0].likes.is_empty());
        assert_eq!(state.video.as_ref().unwrap().likes, vec![user]);
    }

    #[test]
    fn reset_user_videos_clears_only_that_collection() {
        let mut state = VideoState::default();
        let video = sample_video(Uuid::new_v4());
        state.videos = vec![video.clone()];
        state.user_videos = vec![video];

        reduce(&mut state, VideoAction::ResetUserVideos);
        assert!(state.user_videos.is_empty());
        assert_eq!(state.videos.len(), 1);
    }
}
