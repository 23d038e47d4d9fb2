use uuid::Uuid;

use vidhive_types::api::AuthPayload;
use vidhive_types::models::User;

use crate::gateway::{AccountPatch, ApiClient, SignupForm};
use crate::slices::Phase;

/// Auth slice: the signed-in user, their token, and whether they own a
/// channel.
#[derive(Debug, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub access_token: Option<String>,
    /// True once a login has succeeded. Registration alone does not set
    /// it; the original flow routes fresh signups through login.
    pub status: bool,
    pub has_channel: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum AuthAction {
    Register(Phase<AuthPayload>),
    Login(Phase<AuthPayload>),
    Logout(Phase<()>),
    FetchUser(Phase<User>),
    UpdateAccount(Phase<User>),
    DeleteAccount(Phase<()>),
}

pub fn reduce(state: &mut AuthState, action: AuthAction) {
    match action {
        AuthAction::Register(phase) => {
            if let Some(payload) = settle(state, phase) {
                state.user = Some(payload.user);
                state.access_token = Some(payload.access_token);
                state.has_channel = payload.has_channel;
            }
        }

        AuthAction::Login(phase) => {
            // A failed login also drops the authenticated flag.
            if matches!(phase, Phase::Rejected(_)) {
                state.status = false;
            }
            if let Some(payload) = settle(state, phase) {
                state.status = true;
                state.user = Some(payload.user);
                state.access_token = Some(payload.access_token);
                state.has_channel = payload.has_channel;
            }
        }

        AuthAction::Logout(phase) => {
            if settle(state, phase).is_some() {
                state.status = false;
                state.user = None;
                state.access_token = None;
            }
        }

        AuthAction::FetchUser(phase) => {
            if let Some(user) = settle(state, phase) {
                state.user = Some(user);
            }
        }

        AuthAction::UpdateAccount(phase) => {
            if let Some(user) = settle(state, phase) {
                state.user = Some(user);
            }
        }

        AuthAction::DeleteAccount(phase) => {
            if settle(state, phase).is_some() {
                state.user = None;
                state.access_token = None;
                state.status = false;
                state.has_channel = false;
            }
        }
    }
}

fn settle<T>(state: &mut AuthState, phase: Phase<T>) -> Option<T> {
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
//
// Register/login store the token on the gateway as well as in the slice;
// logout and account deletion discard the client-held copy.

pub async fn register(client: &mut ApiClient, state: &mut AuthState, form: SignupForm) {
    reduce(state, AuthAction::Register(Phase::Pending));
    match client.signup(form).await {
        Ok(payload) => {
            client.set_token(payload.access_token.clone());
            reduce(state, AuthAction::Register(Phase::Fulfilled(payload)));
        }
        Err(e) => reduce(state, AuthAction::Register(Phase::Rejected(e.to_string()))),
    }
}

pub async fn login(client: &mut ApiClient, state: &mut AuthState, email: String, password: String) {
    reduce(state, AuthAction::Login(Phase::Pending));
    match client.login(email, password).await {
        Ok(payload) => {
            client.set_token(payload.access_token.clone());
            reduce(state, AuthAction::Login(Phase::Fulfilled(payload)));
        }
        Err(e) => reduce(state, AuthAction::Login(Phase::Rejected(e.to_string()))),
    }
}

pub async fn logout(client: &mut ApiClient, state: &mut AuthState) {
    reduce(state, AuthAction::Logout(Phase::Pending));
    match client.logout().await {
        Ok(_) => {
            client.clear_token();
            reduce(state, AuthAction::Logout(Phase::Fulfilled(())));
        }
        Err(e) => reduce(state, AuthAction::Logout(Phase::Rejected(e.to_string()))),
    }
}

pub async fn fetch_user(client: &ApiClient, state: &mut AuthState, user_id: Uuid) {
    reduce(state, AuthAction::FetchUser(Phase::Pending));
    let phase = match client.get_user_data(user_id).await {
        Ok(user) => Phase::Fulfilled(user),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, AuthAction::FetchUser(phase));
}

pub async fn update_account(
    client: &ApiClient,
    state: &mut AuthState,
    user_id: Uuid,
    patch: AccountPatch,
) {
    reduce(state, AuthAction::UpdateAccount(Phase::Pending));
    let phase = match client.update_account(user_id, patch).await {
        Ok(user) => Phase::Fulfilled(user),
        Err(e) => Phase::Rejected(e.to_string()),
    };
    reduce(state, AuthAction::UpdateAccount(phase));
}

pub async fn delete_account(client: &mut ApiClient, state: &mut AuthState, user_id: Uuid) {
    reduce(state, AuthAction::DeleteAccount(Phase::Pending));
    match client.delete_account(user_id).await {
        Ok(_) => {
            client.clear_token();
            reduce(state, AuthAction::DeleteAccount(Phase::Fulfilled(())));
        }
        Err(e) => reduce(state, AuthAction::DeleteAccount(Phase::Rejected(e.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> AuthPayload {
        AuthPayload {
            user: User {
                id: Uuid::new_v4(),
                username: "alice".into(),
                email: "alice@example.com".into(),
                avatar: None,
                created_at: chrono::Utc::now(),
            },
            access_token: "token-123".into(),
            has_channel: false,
        }
    }

    #[test]
    fn login_fulfilled_sets_everything() {
        let mut state = AuthState::default();
        reduce(&mut state, AuthAction::Login(Phase::Pending));
        assert!(state.loading);

        reduce(&mut state, AuthAction::Login(Phase::Fulfilled(sample_payload())));
        assert!(!state.loading);
        assert!(state.status);
        assert_eq!(state.access_token.as_deref(), Some("token-123"));
        assert!(state.user.is_some());
    }

    #[test]
    fn login_rejected_drops_authenticated_flag() {
        let mut state = AuthState {
            status: true,
            ..Default::default()
        };
        reduce(
            &mut state,
            AuthAction::Login(Phase::Rejected("invalid email or password".into())),
        );
        assert!(!state.status);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("invalid email or password"));
    }

    #[test]
    fn register_does_not_set_status() {
        let mut state = AuthState::default();
        reduce(
            &mut state,
            AuthAction::Register(Phase::Fulfilled(sample_payload())),
        );
        assert!(!state.status);
        assert!(state.access_token.is_some());
    }

    #[test]
    fn logout_clears_the_session_fields() {
        let mut state = AuthState::default();
        reduce(&mut state, AuthAction::Login(Phase::Fulfilled(sample_payload())));
        reduce(&mut state, AuthAction::Logout(Phase::Fulfilled(())));
        assert!(!state.status);
        assert!(state.user.is_none());
        assert!(state.access_token.is_none());
    }

    #[test]
    fn delete_account_resets_the_slice() {
        let mut state = AuthState::default();
        let mut payload = sample_payload();
        payload.has_channel = true;
        reduce(&mut state, AuthAction::Login(Phase::Fulfilled(payload)));
        reduce(&mut state, AuthAction::DeleteAccount(Phase::Fulfilled(())));
        assert!(state.user.is_none());
        assert!(state.access_token.is_none());
        assert!(!state.status);
        assert!(!state.has_channel);
    }
}
