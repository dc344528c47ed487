use std::time::Instant;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::{error, info, warn};

use swiss_core::protocol::{
    standings_view, CreateTournament, MatchupView, ServerMessage, TournamentView,
};
use swiss_core::{Outcome, PairingError, SwissError, SwissTournament, TournamentConfig};

use crate::db;
use crate::state::{broadcast, generate_code, normalize_code, AppState, TournamentEntry};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("tournament not found")]
    NotFound,

    #[error(transparent)]
    Swiss(#[from] SwissError),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
            ServiceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Swiss(e) => match e {
                SwissError::Pairing(PairingError::Infeasible { .. }) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                SwissError::Pairing(_)
                | SwissError::EmptyRoster
                | SwissError::EmptyName(_)
                | SwissError::DuplicateName(_) => StatusCode::BAD_REQUEST,
                SwissError::UnknownRound(_)
                | SwissError::UnknownMatch { .. }
                | SwissError::UnknownCompetitor(_) => StatusCode::NOT_FOUND,
                SwissError::AlreadyAdjudicated { .. }
                | SwissError::RoundNotReady(_)
                | SwissError::ScheduleInProgress => StatusCode::CONFLICT,
                SwissError::NoSchedule => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Make sure `code` is in memory, reading it from the database if needed.
pub async fn ensure_loaded(state: &AppState, code: &str) -> Result<(), ServiceError> {
    if state.tournaments.contains_key(code) {
        return Ok(());
    }
    let (id, tournament) = db::load_tournament(&state.db, code)
        .await?
        .ok_or(ServiceError::NotFound)?;
    info!(code, "tournament loaded from database");
    state
        .tournaments
        .entry(code.to_string())
        .or_insert_with(|| TournamentEntry::new(id, code.to_string(), tournament));
    Ok(())
}

/// Create and schedule a tournament, then persist it.
pub async fn create_tournament(
    state: &AppState,
    req: CreateTournament,
) -> Result<TournamentView, ServiceError> {
    let mut config: TournamentConfig = state.config.tournament.clone();
    if let Some(k) = req.k_factor {
        config.k_factor = k;
    }
    if let Some(rating) = req.initial_rating {
        config.initial_rating = rating;
    }
    if let Some(shuffle) = req.shuffle {
        config.shuffle_roster = shuffle;
    }
    config
        .validate()
        .map_err(|e| ServiceError::InvalidSettings(e.to_string()))?;
    if req.competitors.len() > state.config.max_competitors {
        return Err(ServiceError::InvalidSettings(format!(
            "at most {} competitors per tournament, got {}",
            state.config.max_competitors,
            req.competitors.len()
        )));
    }

    let name = if req.name.trim().is_empty() {
        "Swiss".to_string()
    } else {
        req.name.trim().to_string()
    };
    let mut tournament = SwissTournament::new(name, req.competitors, config)?;
    tournament.generate_schedule()?;

    let mut code = generate_code();
    while state.tournaments.contains_key(&code)
        || db::load_tournament(&state.db, &code).await?.is_some()
    {
        code = generate_code();
    }

    let id = db::insert_tournament(&state.db, &code, &tournament).await?;
    let view = TournamentView::new(&code, &tournament);
    info!(
        code = %code,
        competitors = tournament.competitors().len(),
        rounds = tournament.rounds().len(),
        "tournament created"
    );

    state
        .tournaments
        .insert(code.clone(), TournamentEntry::new(id, code, tournament));
    Ok(view)
}

/// Current state of a tournament.
pub async fn snapshot(state: &AppState, code: &str) -> Result<TournamentView, ServiceError> {
    let code = normalize_code(code);
    ensure_loaded(state, &code).await?;
    let entry = state.tournaments.get(&code).ok_or(ServiceError::NotFound)?;
    Ok(TournamentView::new(&code, &entry.tournament))
}

/// Record a result, persist it and notify subscribers.
pub async fn report_result(
    state: &AppState,
    code: &str,
    round: usize,
    slot: usize,
    outcome: Outcome,
) -> Result<MatchupView, ServiceError> {
    let code = normalize_code(code);
    ensure_loaded(state, &code).await?;

    let save_lock = state
        .tournaments
        .get(&code)
        .map(|entry| entry.save_lock.clone())
        .ok_or(ServiceError::NotFound)?;
    let _saving = save_lock.lock().await;

    // The map guard must be released before any await.
    let (id, before, snapshot, view, round_done, complete) = {
        let mut entry = state
            .tournaments
            .get_mut(&code)
            .ok_or(ServiceError::NotFound)?;
        entry.last_activity = Instant::now();
        let before = entry.tournament.clone();
        entry
            .tournament
            .record_result(round, slot, outcome)
            .inspect_err(|e| warn!(code = %code, round, slot, error = %e, "result rejected"))?;

        let t = &entry.tournament;
        let view = MatchupView::new(t, round, slot, &t.rounds()[round][slot]);
        (
            entry.id,
            before,
            t.clone(),
            view,
            t.is_round_complete(round),
            t.is_complete(),
        )
    };

    if let Err(e) = db::save_progress(&state.db, id, &snapshot).await {
        error!(code = %code, error = %e, "failed to persist result");
        // Memory never keeps a result the database does not have.
        if let Some(mut entry) = state.tournaments.get_mut(&code) {
            entry.tournament = before;
        }
        return Err(e.into());
    }

    broadcast(
        state,
        &code,
        &ServerMessage::ResultRecorded {
            matchup: view.clone(),
        },
    );
    broadcast(
        state,
        &code,
        &ServerMessage::Standings {
            entries: standings_view(&snapshot),
        },
    );
    if round_done {
        broadcast(state, &code, &ServerMessage::RoundComplete { round });
    }
    if complete {
        info!(code = %code, "tournament complete");
        broadcast(state, &code, &ServerMessage::TournamentComplete);
    }

    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let infeasible = ServiceError::Swiss(SwissError::Pairing(PairingError::Infeasible {
            round: 2,
        }));
        assert_eq!(infeasible.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let twice = ServiceError::Swiss(SwissError::AlreadyAdjudicated { round: 0, slot: 0 });
        assert_eq!(twice.status(), StatusCode::CONFLICT);

        let dup = ServiceError::Swiss(SwissError::DuplicateName("A".into()));
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ServiceError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
