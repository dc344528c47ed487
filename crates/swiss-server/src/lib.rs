pub mod config;
pub mod db;
pub mod routes;
pub mod service;
pub mod state;
pub mod ws;

use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build a fully configured Router + shared state.
pub async fn build_app(config: ServerConfig) -> Result<(Router, Arc<AppState>), sqlx::Error> {
    // Every connection to `sqlite::memory:` opens its own database.
    let max_connections = if config.database_url.contains(":memory:") {
        1
    } else {
        5
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&config.database_url)
        .await?;

    db::init_db(&pool).await?;

    let state = Arc::new(AppState {
        db: pool,
        config,
        tournaments: DashMap::new(),
        subscribers: DashMap::new(),
        connection_count: AtomicU32::new(0),
    });

    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                cleanup(&state);
            }
        });
    }

    let app = Router::new()
        .route("/health", get(routes::health))
        .route(
            "/tournaments",
            get(routes::list_tournaments).post(routes::create_tournament),
        )
        .route("/tournaments/{code}", get(routes::get_tournament))
        .route("/tournaments/{code}/standings", get(routes::standings))
        .route(
            "/tournaments/{code}/rounds/{round}/matches/{slot}",
            post(routes::report_result),
        )
        .route("/ws", get(routes::ws_upgrade))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    Ok((app, state))
}

/// Drop idle tournaments without subscribers from memory and prune closed channels.
/// Everything evicted is still in the database.
fn cleanup(state: &AppState) {
    let now = Instant::now();
    let idle = state.config.idle_eviction;

    state.subscribers.retain(|_, subs| {
        subs.retain(|tx| !tx.is_closed());
        !subs.is_empty()
    });

    let mut to_remove = Vec::new();
    for entry in state.tournaments.iter() {
        let watched = state.subscribers.contains_key(entry.key());
        if !watched && now.duration_since(entry.last_activity) > idle {
            to_remove.push(entry.key().clone());
        }
    }

    for code in to_remove {
        state.tournaments.remove(&code);
        info!(code = %code, "evicted idle tournament");
    }
}
