use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use vidhive_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::upload::UploadStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub uploads: UploadStore,
    pub jwt_secret: String,
}

impl AppStateInner {
    /// Run a blocking DB closure off the async runtime.
    pub async fn with_db<F, T>(self: &Arc<Self>, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(anyhow!("blocking task failed"))
            })?
            .map_err(ApiError::Internal)
    }
}
