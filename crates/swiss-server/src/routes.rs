use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use swiss_core::protocol::{
    standings_view, CreateTournament, MatchupView, ReportResult, StandingEntry,
    TournamentSummary, TournamentView,
};

use crate::db;
use crate::service::{self, ServiceError};
use crate::state::{normalize_code, AppState};
use crate::ws;

fn reject(e: ServiceError) -> StatusCode {
    let status = e.status();
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    } else {
        warn!(error = %e, "request rejected");
    }
    status
}

// ── Health ──────────────────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "ok"
}

// ── Tournaments ─────────────────────────────────────────────────────────

pub async fn list_tournaments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TournamentSummary>>, StatusCode> {
    let rows = db::list_tournaments(&state.db, 100)
        .await
        .map_err(|e| reject(e.into()))?;
    Ok(Json(rows))
}

pub async fn create_tournament(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTournament>,
) -> Result<Json<TournamentView>, StatusCode> {
    service::create_tournament(&state, req)
        .await
        .map(Json)
        .map_err(reject)
}

pub async fn get_tournament(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<TournamentView>, StatusCode> {
    service::snapshot(&state, &code)
        .await
        .map(Json)
        .map_err(reject)
}

pub async fn standings(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<StandingEntry>>, StatusCode> {
    let code = normalize_code(&code);
    service::ensure_loaded(&state, &code).await.map_err(reject)?;
    let entry = state.tournaments.get(&code).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(standings_view(&entry.tournament)))
}

// ── Results ─────────────────────────────────────────────────────────────

pub async fn report_result(
    State(state): State<Arc<AppState>>,
    Path((code, round, slot)): Path<(String, usize, usize)>,
    Json(req): Json<ReportResult>,
) -> Result<Json<MatchupView>, StatusCode> {
    service::report_result(&state, &code, round, slot, req.outcome)
        .await
        .map(Json)
        .map_err(reject)
}

// ── WebSocket upgrade ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub code: String,
}

pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let code = normalize_code(&query.code);
    service::ensure_loaded(&state, &code).await.map_err(reject)?;

    let current = state.connection_count.load(Ordering::Relaxed);
    if current >= state.config.max_connections {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(ws.on_upgrade(move |socket| ws::handle_socket(state, socket, code)))
}
