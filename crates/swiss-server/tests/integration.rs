use axum::http::StatusCode;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use swiss_core::protocol::{
    CreateTournament, MatchupView, StandingEntry, TournamentSummary, TournamentView,
};
use swiss_core::Outcome;
use swiss_server::config::ServerConfig;
use swiss_server::service;
use swiss_server::state::AppState;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Spin up a test server on a random port, return the base URL.
async fn start_server() -> String {
    start_server_with_state().await.0
}

/// Same as `start_server`, but also hands back the shared state.
async fn start_server_with_state() -> (String, Arc<AppState>) {
    // In-memory SQLite so tests don't clash.
    let (app, state) = swiss_server::build_app(ServerConfig::in_memory())
        .await
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{}", port), state)
}

fn create_request(names: &[&str]) -> CreateTournament {
    CreateTournament {
        name: "Club night".into(),
        competitors: names.iter().map(|n| n.to_string()).collect(),
        k_factor: None,
        initial_rating: None,
        shuffle: None,
    }
}

async fn create(base: &str, names: &[&str]) -> TournamentView {
    let resp = reqwest::Client::new()
        .post(format!("{}/tournaments", base))
        .json(&json!({ "name": "Club night", "competitors": names }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

async fn report(base: &str, code: &str, round: usize, slot: usize, outcome: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!(
            "{}/tournaments/{}/rounds/{}/matches/{}",
            base, code, round, slot
        ))
        .json(&json!({ "outcome": outcome }))
        .send()
        .await
        .unwrap()
}

/// Receive messages until we get one matching the expected type.
async fn ws_recv_type(
    stream: &mut futures_util::stream::SplitStream<WsStream>,
    msg_type: &str,
) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let remaining = deadline - tokio::time::Instant::now();
        if remaining.is_zero() {
            panic!("Timed out waiting for message type: {}", msg_type);
        }
        let msg = tokio::time::timeout(remaining, stream.next())
            .await
            .unwrap_or_else(|_| panic!("Timed out waiting for {}", msg_type))
            .unwrap()
            .unwrap();

        if let Message::Text(text) = msg {
            let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
            if parsed["type"].as_str() == Some(msg_type) {
                return parsed;
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(resp, "ok");
}

#[tokio::test]
async fn test_create_schedules_all_rounds() {
    let base = start_server().await;
    let view = create(&base, &["A", "B", "C", "D"]).await;

    assert_eq!(view.code.len(), 6);
    assert_eq!(view.name, "Club night");
    assert_eq!(view.rounds.len(), 2);
    assert_eq!(view.current_round, Some(0));
    assert!(!view.complete);

    let mut seen = HashSet::new();
    for round in &view.rounds {
        let mut names = HashSet::new();
        for m in &round.matchups {
            let key = if m.left < m.right {
                (m.left.clone(), m.right.clone())
            } else {
                (m.right.clone(), m.left.clone())
            };
            assert!(seen.insert(key), "pair repeated");
            assert!(names.insert(m.left.clone()));
            assert!(names.insert(m.right.clone()));
        }
        assert_eq!(names.len(), 4);
    }
}

#[tokio::test]
async fn test_odd_roster_gets_bye() {
    let base = start_server().await;
    let view = create(&base, &["A", "B", "C"]).await;

    assert_eq!(view.competitors.len(), 4);
    assert_eq!(view.competitors.iter().filter(|c| c.bye).count(), 1);
    let bye = view.rounds[0].matchups.iter().find(|m| m.bye).unwrap();
    let result = bye.result.as_ref().expect("bye resolves automatically");
    assert_eq!(result.left_change, 0.0);
    assert_eq!(result.right_change, 0.0);
}

#[tokio::test]
async fn test_rejects_bad_rosters() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let empty = client
        .post(format!("{}/tournaments", base))
        .json(&json!({ "name": "Empty", "competitors": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    let dup = client
        .post(format!("{}/tournaments", base))
        .json(&json!({ "name": "Dup", "competitors": ["A", "A"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), 400);

    let bad_k = client
        .post(format!("{}/tournaments", base))
        .json(&json!({ "name": "K", "competitors": ["A", "B"], "k_factor": -1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_k.status(), 400);
}

#[tokio::test]
async fn test_report_result_updates_ratings() {
    let base = start_server().await;
    let view = create(&base, &["A", "B"]).await;

    let resp = report(&base, &view.code, 0, 0, "LeftWin").await;
    assert_eq!(resp.status(), 200);
    let m: MatchupView = resp.json().await.unwrap();
    let result = m.result.unwrap();
    assert_eq!(result.outcome, Outcome::LeftWin);
    assert!((result.left_change - 16.0).abs() < 1e-9);
    assert!((result.right_change + 16.0).abs() < 1e-9);

    let standings: Vec<StandingEntry> =
        reqwest::get(format!("{}/tournaments/{}/standings", base, view.code))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(standings.len(), 2);
    assert_eq!(standings[0].name, "A");
    assert!((standings[0].rating - 1516.0).abs() < 1e-9);
    assert_eq!(standings[0].wins, 1);
    assert_eq!(standings[1].losses, 1);

    let after: TournamentView = reqwest::get(format!("{}/tournaments/{}", base, view.code))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(after.complete);
}

#[tokio::test]
async fn test_second_report_conflicts() {
    let base = start_server().await;
    let view = create(&base, &["A", "B", "C", "D"]).await;

    assert_eq!(report(&base, &view.code, 0, 0, "Draw").await.status(), 200);
    assert_eq!(report(&base, &view.code, 0, 0, "LeftWin").await.status(), 409);
    // Round 2 cannot start while round 1 is open.
    assert_eq!(report(&base, &view.code, 1, 0, "Draw").await.status(), 409);
    assert_eq!(report(&base, &view.code, 7, 0, "Draw").await.status(), 404);
}

#[tokio::test]
async fn test_unknown_tournament_is_404() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{}/tournaments/ZZZZZZ", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(report(&base, "ZZZZZZ", 0, 0, "Draw").await.status(), 404);
}

#[tokio::test]
async fn test_codes_are_case_insensitive() {
    let base = start_server().await;
    let view = create(&base, &["A", "B"]).await;
    let resp = reqwest::get(format!(
        "{}/tournaments/{}",
        base,
        view.code.to_ascii_lowercase()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_list_tournaments() {
    let base = start_server().await;
    create(&base, &["A", "B", "C"]).await;
    let second = create(&base, &["W", "X", "Y", "Z"]).await;

    let list: Vec<TournamentSummary> = reqwest::get(format!("{}/tournaments", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].code, second.code);
    assert_eq!(list[0].competitors, 4);
    assert_eq!(list[1].competitors, 3);
}

#[tokio::test]
async fn test_ws_snapshot_and_broadcast() {
    let base = start_server().await;
    let view = create(&base, &["A", "B", "C", "D"]).await;

    let ws_url = base.replace("http://", "ws://");
    let url = format!("{}/ws?code={}", ws_url, view.code);

    let (watcher, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (_watch_sink, mut watch_stream) = watcher.split();
    let snapshot = ws_recv_type(&mut watch_stream, "Snapshot").await;
    assert_eq!(snapshot["tournament"]["code"].as_str().unwrap(), view.code);

    let (reporter, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (mut sink, mut stream) = reporter.split();
    let _ = ws_recv_type(&mut stream, "Snapshot").await;

    sink.send(Message::Text(
        json!({"type": "ReportResult", "round": 0, "slot": 0, "outcome": "RightWin"})
            .to_string()
            .into(),
    ))
    .await
    .unwrap();

    let recorded = ws_recv_type(&mut watch_stream, "ResultRecorded").await;
    assert_eq!(recorded["matchup"]["result"]["outcome"].as_str().unwrap(), "RightWin");
    let standings = ws_recv_type(&mut watch_stream, "Standings").await;
    assert_eq!(standings["entries"].as_array().unwrap().len(), 4);

    // REST reports reach WebSocket subscribers too, and close the round.
    assert_eq!(report(&base, &view.code, 0, 1, "Draw").await.status(), 200);
    let done = ws_recv_type(&mut watch_stream, "RoundComplete").await;
    assert_eq!(done["round"].as_u64().unwrap(), 0);

    // Errors go only to the sender.
    sink.send(Message::Text(
        json!({"type": "ReportResult", "round": 0, "slot": 0, "outcome": "Draw"})
            .to_string()
            .into(),
    ))
    .await
    .unwrap();
    let err = ws_recv_type(&mut stream, "Error").await;
    assert!(err["message"].as_str().unwrap().contains("already has a result"));

    sink.send(Message::Text(json!({"type": "Ping"}).to_string().into()))
        .await
        .unwrap();
    let _ = ws_recv_type(&mut stream, "Pong").await;
}

#[tokio::test]
async fn test_ws_unknown_code_rejected() {
    let base = start_server().await;
    let ws_url = base.replace("http://", "ws://");
    let result = tokio_tungstenite::connect_async(format!("{}/ws?code=NOPE00", ws_url)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_full_tournament_over_rest() {
    let base = start_server().await;
    let names = ["P1", "P2", "P3", "P4", "P5", "P6", "P7"];
    let view = create(&base, &names).await;
    assert_eq!(view.rounds.len(), 3);

    for round in &view.rounds {
        for m in &round.matchups {
            if m.bye {
                continue;
            }
            let resp = report(&base, &view.code, round.index, m.slot, "LeftWin").await;
            assert_eq!(resp.status(), 200);
        }
    }

    let done: TournamentView = reqwest::get(format!("{}/tournaments/{}", base, view.code))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(done.complete);
    assert_eq!(done.current_round, None);

    let total: f64 = done
        .competitors
        .iter()
        .filter(|c| !c.bye)
        .map(|c| c.rating)
        .sum();
    assert!((total - 7.0 * 1500.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_rejects_oversized_roster() {
    let base = start_server().await;
    let names: Vec<String> = (0..300).map(|i| format!("P{}", i)).collect();
    let resp = reqwest::Client::new()
        .post(format!("{}/tournaments", base))
        .json(&json!({ "name": "Huge", "competitors": names }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_reload_from_database_matches_memory() {
    let (base, state) = start_server_with_state().await;
    let view = create(&base, &["A", "B", "C", "D", "E"]).await;
    assert_eq!(report(&base, &view.code, 0, 0, "RightWin").await.status(), 200);

    let url = format!("{}/tournaments/{}", base, view.code);
    let live: TournamentView = reqwest::get(&url).await.unwrap().json().await.unwrap();

    // Drop it from memory; the next request has to rebuild it from SQLite.
    assert!(state.tournaments.remove(&view.code).is_some());
    let reloaded: TournamentView = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert!(state.tournaments.contains_key(&view.code));
    assert_eq!(reloaded, live);

    // The rebuilt tournament keeps accepting results.
    assert_eq!(report(&base, &view.code, 0, 0, "Draw").await.status(), 409);
    assert_eq!(report(&base, &view.code, 0, 1, "Draw").await.status(), 200);
}

#[tokio::test]
async fn test_failed_save_leaves_tournament_untouched() {
    let (_base, state) = start_server_with_state().await;
    let view = service::create_tournament(&state, create_request(&["A", "B"]))
        .await
        .unwrap();

    state.db.close().await;

    let first = service::report_result(&state, &view.code, 0, 0, Outcome::LeftWin)
        .await
        .unwrap_err();
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Nothing was stored, so the same result is not "already recorded".
    let retry = service::report_result(&state, &view.code, 0, 0, Outcome::LeftWin)
        .await
        .unwrap_err();
    assert_eq!(retry.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let after = service::snapshot(&state, &view.code).await.unwrap();
    assert_eq!(after, view);
    assert!(!after.complete);
    assert!(after.competitors.iter().all(|c| c.rating == 1500.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reports_are_all_stored() {
    let (_base, state) = start_server_with_state().await;
    let names = ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8"];
    let view = service::create_tournament(&state, create_request(&names))
        .await
        .unwrap();

    let outcomes = [Outcome::LeftWin, Outcome::RightWin, Outcome::Draw, Outcome::LeftWin];
    let handles: Vec<_> = outcomes
        .into_iter()
        .enumerate()
        .map(|(slot, outcome)| {
            let state = state.clone();
            let code = view.code.clone();
            tokio::spawn(async move { service::report_result(&state, &code, 0, slot, outcome).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let live = service::snapshot(&state, &view.code).await.unwrap();
    assert_eq!(live.current_round, Some(1));

    state.tournaments.remove(&view.code);
    let reloaded = service::snapshot(&state, &view.code).await.unwrap();
    assert_eq!(reloaded, live);
}
