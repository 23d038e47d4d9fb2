use uuid::Uuid;

use vidhive_types::api::ChannelData;
use vidhive_types::models::{Channel, Video};

use crate::gateway::{ApiClient, ChannelPatch};
use crate::slices::Phase;

/// Channel slice: the currently-viewed channel and its published videos.
#[derive(Debug, Default)]
pub struct ChannelState {
    pub channel: Option<Channel>,
    pub videos: Vec<Video>,
    pub loading: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
}

#[derive(Debug)]
pub enum ChannelAction {
    Create(Phase<Channel>),
    Fetch(Phase<ChannelData>),
    Update(Phase<Channel>),
    Delete(Phase<()>),
    Subscribe(Phase<()>),
    Unsubscribe(Phase<()>),
    /// Synchronous housekeeping for the UI layer.
    ClearError,
    ClearSuccessMessage,
}

pub fn reduce(state: &mut ChannelState, action: ChannelAction) {
    match action {
        ChannelAction::Create(phase) => {
            if matches!(phase, Phase::Pending) {
                state.success_message = None;
            }
            if let Some(channel) = settle(state, phase) {
                state.channel = Some(channel);
                state.videos.clear();
                state.success_message = Some("Channel created successfully!".into());
            }
        }

        ChannelAction::Fetch(phase) => {
            if let Some(data) = settle(state, phase) {
                state.channel = Some(data.channel);
                state.videos = data.videos;
            }
        }

        ChannelAction::Update(phase) => {
            if matches!(phase, Phase::Pending) {
                state.success_message = None;
            }
            if let Some(channel) = settle(state, phase) {
                state.channel = Some(channel);
                state.success_message = Some("Channel updated successfully!".into());
            }
        }

        ChannelAction::Delete(phase) => {
            if matches!(phase, Phase::Pending) {
                state.success_message = None;
            }
            if settle(state, phase).is_some() {
                state.channel = None;
                state.videos.clear();
            }
        }

        // Subscription changes carry no payload; the subscriber count is
        // picked up on the next channel fetch.
        ChannelAction::Subscribe(phase) | ChannelAction::Unsubscribe(phase) => {
            settle(state, phase);
        }

        ChannelAction::ClearError => {
            state.error = None;
        }

        ChannelAction::ClearSuccessMessage => {
            state.success_message = None;
        }
    }
}

fn settle<T>(state: &mut ChannelState, phase: Phase<T>) -> Option<T> {
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

pub async fn create_channel(
    client: &ApiClient,
    state: &mut ChannelState,
    name: String,
    description: Option<String>,
) {
    reduce(state, ChannelAction::Create(Phase::Pending));
    let phase = match client.create_channel(name, description).await {
        Ok(channel) => Phase::Fulfilled(channel),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, ChannelAction::Create(phase));
}

pub async fn fetch_channel(client: &ApiClient, state: &mut ChannelState, channel_id: Uuid) {
    reduce(state, ChannelAction::Fetch(Phase::Pending));
    let phase = match client.get_channel(channel_id).await {
        Ok(data) => Phase::Fulfilled(data),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, ChannelAction::Fetch(phase));
}

pub async fn update_channel(
    client: &ApiClient,
    state: &mut ChannelState,
    channel_id: Uuid,
    patch: ChannelPatch,
) {
    reduce(state, ChannelAction::Update(Phase::Pending));
    let phase = match client.update_channel(channel_id, patch).await {
        Ok(channel) => Phase::Fulfilled(channel),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, ChannelAction::Update(phase));
}

pub async fn delete_channel(client: &ApiClient, state: &mut ChannelState, channel_id: Uuid) {
    reduce(state, ChannelAction::Delete(Phase::Pending));
    let phase = match client.delete_channel(channel_id).await {
        Ok(_) => Phase::Fulfilled(()),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, ChannelAction::Delete(phase));
}

pub async fn subscribe(client: &ApiClient, state: &mut ChannelState, channel_id: Uuid) {
    reduce(state, ChannelAction::Subscribe(Phase::Pending));
    let phase = match client.subscribe(channel_id).await {
        Ok(_) => Phase::Fulfilled(()),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, ChannelAction::Subscribe(phase));
}

pub async fn unsubscribe(client: &ApiClient, state: &mut ChannelState, channel_id: Uuid) {
    reduce(state, ChannelAction::Unsubscribe(Phase::Pending));
    let phase = match client.unsubscribe(channel_id).await {
        Ok(_) => Phase::Fulfilled(()),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, ChannelAction::Unsubscribe(phase));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_channel() -> Channel {
        Channel {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "alice's channel".into(),
            description: None,
            avatar: None,
            banner: None,
            subscribers: vec![],
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn create_sets_channel_and_success_message() {
        let mut state = ChannelState::default();
        reduce(&mut state, ChannelAction::Create(Phase::Pending));
        assert!(state.loading);
        assert!(state.success_message.is_none());

        reduce(
            &mut state,
            ChannelAction::Create(Phase::Fulfilled(sample_channel())),
        );
        assert!(!state.loading);
        assert!(state.channel.is_some());
        assert_eq!(
            state.success_message.as_deref(),
            Some("Channel created successfully!")
        );
    }

    #[test]
    fn fetch_replaces_channel_and_videos() {
        let mut state = ChannelState::default();
        let channel = sample_channel();
        reduce(
            &mut state,
            ChannelAction::Fetch(Phase::Fulfilled(ChannelData {
                channel: channel.clone(),
                videos: vec![],
            })),
        );
        assert_eq!(state.channel.as_ref().unwrap().id, channel.id);
        assert!(state.videos.is_empty());
    }

    #[test]
    fn delete_clears_the_slice() {
        let mut state = ChannelState::default();
        state.channel = Some(sample_channel());
        reduce(&mut state, ChannelAction::Delete(Phase::Fulfilled(())));
        assert!(state.channel.is_none());
        assert!(state.videos.is_empty());
    }

    #[test]
    fn rejected_subscription_surfaces_the_message() {
        let mut state = ChannelState::default();
        reduce(
            &mut state,
            ChannelAction::Subscribe(Phase::Rejected("channel not found".into())),
        );
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("channel not found"));
    }

    #[test]
    fn clear_actions_reset_messages() {
        let mut state = ChannelState {
            error: Some("boom".into()),
            success_message: Some("done".into()),
            ..Default::default()
        };
        reduce(&mut state, ChannelAction::ClearError);
        reduce(&mut state, ChannelAction::ClearSuccessMessage);
        assert!(state.error.is_none());
        assert!(state.success_message.is_none());
    }
}
