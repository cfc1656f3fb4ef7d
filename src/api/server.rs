use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::users;
use crate::config::Config;
use crate::db::UserStore;
use crate::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
}

pub fn router(store: UserStore) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/users/", get(users::list_users).post(users::create_user))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(config: &Config) -> Result<()> {
    let store = UserStore::connect(&config.database).await?;
    store.migrate().await?;

    let app = router(store.clone());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
