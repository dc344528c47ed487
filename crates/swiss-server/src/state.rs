use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use swiss_core::protocol::ServerMessage;
use swiss_core::SwissTournament;

use crate::config::ServerConfig;

/// A tournament held in memory.
#[derive(Debug, Clone)]
pub struct TournamentEntry {
    /// Row id in the `tournaments` table.
    pub id: i64,
    pub code: String,
    pub tournament: SwissTournament,
    pub last_activity: Instant,
    /// Held from applying a result until it is stored, so saves reach the database in
    /// the order the results were applied.
    pub save_lock: Arc<tokio::sync::Mutex<()>>,
}

impl TournamentEntry {
    pub fn new(id: i64, code: String, tournament: SwissTournament) -> Self {
        Self {
            id,
            code,
            tournament,
            last_activity: Instant::now(),
            save_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub db: SqlitePool,
    pub config: ServerConfig,
    /// Live tournaments keyed by code.
    pub tournaments: DashMap<String, TournamentEntry>,
    /// WebSocket subscribers keyed by tournament code.
    pub subscribers: DashMap<String, Vec<mpsc::UnboundedSender<ServerMessage>>>,
    pub connection_count: AtomicU32,
}

/// Generate a random 6-character uppercase alphanumeric tournament code.
pub fn generate_code() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..6)
        .map(|_| {
            let idx = rng.random_range(0..CHARS.len());
            CHARS[idx] as char
        })
        .collect()
}

/// Codes are case-insensitive on input.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Send `msg` to every live subscriber of `code`, dropping closed channels.
pub fn broadcast(state: &AppState, code: &str, msg: &ServerMessage) {
    if let Some(mut subs) = state.subscribers.get_mut(code) {
        subs.retain(|tx| tx.send(msg.clone()).is_ok());
    }
}
