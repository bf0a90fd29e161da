use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Extension, Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use sharepost_api::middleware::{UserId, require_user};
use sharepost_api::{AppState, AppStateInner, LocalPlatform};
use sharepost_core::PluginConfig;
use sharepost_gateway::{Dispatcher, connection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharepost=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("SHAREPOST_DB_PATH").unwrap_or_else(|_| "sharepost.db".into());
    let host = std::env::var("SHAREPOST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SHAREPOST_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .context("SHAREPOST_PORT must be a port number")?;
    let site_url = std::env::var("SHAREPOST_SITE_URL").ok();
    let platform_version =
        std::env::var("SHAREPOST_PLATFORM_VERSION").unwrap_or_else(|_| "5.39.0".into());

    // Init database
    let db = sharepost_db::Database::open(&PathBuf::from(&db_path))?;
    let dispatcher = Dispatcher::new();

    // Refuse to serve on a platform the plugin cannot run against
    let config = {
        let platform = LocalPlatform::new(&db, &dispatcher, site_url.as_deref(), &platform_version);
        PluginConfig::activate(&platform).map_err(|e| {
            error!("Activation failed: {}", e);
            e
        })?
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        dispatcher: dispatcher.clone(),
        config,
        platform_version,
    });

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .layer(middleware::from_fn(require_user))
        .with_state(dispatcher);

    let app = Router::new()
        .merge(sharepost_api::routes(state))
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("SharePost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ws_upgrade(
    State(dispatcher): State<Dispatcher>,
    Extension(UserId(user_id)): Extension<UserId>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, user_id))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
