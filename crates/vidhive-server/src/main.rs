use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use vidhive_api::middleware::require_auth;
use vidhive_api::state::{AppState, AppStateInner};
use vidhive_api::upload::{MAX_FILE_SIZE, MAX_FILES_PER_REQUEST, UploadStore};
use vidhive_api::{account, channel, comments, tags, videos};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidhive=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("VIDHIVE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("VIDHIVE_DB_PATH").unwrap_or_else(|_| "vidhive.db".into());
    let upload_dir: PathBuf = std::env::var("VIDHIVE_UPLOAD_DIR")
        .unwrap_or_else(|_| "./temp".into())
        .into();
    let host = std::env::var("VIDHIVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("VIDHIVE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and upload scratch storage
    let db = vidhive_db::Database::open(&PathBuf::from(&db_path))?;
    let uploads = UploadStore::new(upload_dir).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        uploads,
        jwt_secret,
    });

    let app = Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .layer(DefaultBodyLimit::max(
            MAX_FILES_PER_REQUEST * MAX_FILE_SIZE as usize + 64 * 1024,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("vidhive server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn api_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/account/signup", post(account::signup))
        .route("/account/login", post(account::login))
        .route("/account/userData/{id}", get(account::user_data))
        .route("/videos/allVideo", get(videos::all_videos))
        .route("/videos/allUserVideo/{ownerId}", get(videos::all_user_videos))
        .route("/videos/videoData/{id}", get(videos::video_data))
        .route("/videos/incrementView/{id}", put(videos::increment_view))
        .route("/channel/data/{id}", get(channel::data))
        .route("/comments/video/{videoId}", get(comments::for_video))
        .route("/tags/video/{videoId}", get(tags::for_video))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/account/logout", post(account::logout))
        .route("/account/update/{id}", put(account::update))
        .route("/account/delete/{id}", delete(account::delete))
        .route("/videos/publish", post(videos::publish))
        .route("/videos/update/{id}", put(videos::update))
        .route("/videos/delete/{id}", delete(videos::delete))
        .route("/videos/like", post(videos::like))
        .route("/videos/removelike", post(videos::remove_like))
        .route("/channel/create", post(channel::create))
        .route("/channel/update/{id}", put(channel::update))
        .route("/channel/delete/{id}", delete(channel::delete))
        .route("/channel/subscribe/{id}", post(channel::subscribe))
        .route("/channel/unsubscribe/{id}", post(channel::unsubscribe))
        .route("/comments/add", post(comments::add))
        .route("/comments/delete/{id}", delete(comments::delete))
        .route("/tags/add", post(tags::add))
        .route("/tags/delete/{id}", delete(tags::delete))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    public.merge(protected)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
