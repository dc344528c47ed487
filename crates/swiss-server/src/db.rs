use sqlx::{Row, SqlitePool};

use swiss_core::matchup::{MatchResult, Matchup};
use swiss_core::protocol::TournamentSummary;
use swiss_core::{Competitor, CompetitorId, CompetitorKind, Outcome, Tally, TournamentConfig};
use swiss_core::SwissTournament;

/// Create all tables if they don't exist.
pub async fn init_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tournaments (
            id INTEGER PRIMARY KEY,
            code TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            initial_rating REAL NOT NULL,
            k_factor REAL NOT NULL,
            bye_name TEXT NOT NULL,
            shuffle_roster INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS competitors (
            tournament_id INTEGER NOT NULL,
            seed INTEGER NOT NULL,
            name TEXT NOT NULL,
            is_bye INTEGER NOT NULL DEFAULT 0,
            rating REAL NOT NULL,
            wins INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            byes INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (tournament_id, seed),
            FOREIGN KEY (tournament_id) REFERENCES tournaments(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS matchups (
            tournament_id INTEGER NOT NULL,
            round INTEGER NOT NULL,
            slot INTEGER NOT NULL,
            left_seed INTEGER NOT NULL,
            right_seed INTEGER NOT NULL,
            is_bye INTEGER NOT NULL DEFAULT 0,
            outcome TEXT,
            left_change REAL NOT NULL DEFAULT 0,
            right_change REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (tournament_id, round, slot),
            FOREIGN KEY (tournament_id) REFERENCES tournaments(id)
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn outcome_to_str(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::LeftWin => "left",
        Outcome::RightWin => "right",
        Outcome::Draw => "draw",
    }
}

fn outcome_from_str(s: &str) -> Option<Outcome> {
    match s {
        "left" => Some(Outcome::LeftWin),
        "right" => Some(Outcome::RightWin),
        "draw" => Some(Outcome::Draw),
        _ => None,
    }
}

/// Store a freshly scheduled tournament. Returns the new row id.
pub async fn insert_tournament(
    pool: &SqlitePool,
    code: &str,
    tournament: &SwissTournament,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let config = tournament.config();

    let row = sqlx::query(
        "INSERT INTO tournaments (code, name, initial_rating, k_factor, bye_name, shuffle_roster)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id",
    )
    .bind(code)
    .bind(tournament.name())
    .bind(config.initial_rating)
    .bind(config.k_factor)
    .bind(&config.bye_name)
    .bind(config.shuffle_roster)
    .fetch_one(&mut *tx)
    .await?;
    let id: i64 = row.get("id");

    for c in tournament.competitors() {
        sqlx::query(
            "INSERT INTO competitors (tournament_id, seed, name, is_bye, rating)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(id)
        .bind(c.id.0 as i64)
        .bind(&c.name)
        .bind(c.is_bye())
        .bind(c.rating)
        .execute(&mut *tx)
        .await?;
    }

    for (round, matchups) in tournament.rounds().iter().enumerate() {
        for (slot, m) in matchups.iter().enumerate() {
            sqlx::query(
                "INSERT INTO matchups (tournament_id, round, slot, left_seed, right_seed, is_bye)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(id)
            .bind(round as i64)
            .bind(slot as i64)
            .bind(m.left.0 as i64)
            .bind(m.right.0 as i64)
            .bind(m.is_bye())
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    // Byes of the first round are already resolved.
    save_progress(pool, id, tournament).await?;
    Ok(id)
}

/// Write current ratings, tallies and results.
pub async fn save_progress(
    pool: &SqlitePool,
    id: i64,
    tournament: &SwissTournament,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for c in tournament.competitors() {
        sqlx::query(
            "UPDATE competitors SET rating = ?1, wins = ?2, draws = ?3, losses = ?4, byes = ?5
             WHERE tournament_id = ?6 AND seed = ?7",
        )
        .bind(c.rating)
        .bind(c.tally.wins as i64)
        .bind(c.tally.draws as i64)
        .bind(c.tally.losses as i64)
        .bind(c.tally.byes as i64)
        .bind(id)
        .bind(c.id.0 as i64)
        .execute(&mut *tx)
        .await?;
    }

    for (round, matchups) in tournament.rounds().iter().enumerate() {
        for (slot, m) in matchups.iter().enumerate() {
            let Some(result) = m.result else { continue };
            sqlx::query(
                "UPDATE matchups SET outcome = ?1, left_change = ?2, right_change = ?3
                 WHERE tournament_id = ?4 AND round = ?5 AND slot = ?6",
            )
            .bind(outcome_to_str(result.outcome))
            .bind(result.left_change)
            .bind(result.right_change)
            .bind(id)
            .bind(round as i64)
            .bind(slot as i64)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await
}

/// Load a tournament by code. Returns (row id, tournament).
pub async fn load_tournament(
    pool: &SqlitePool,
    code: &str,
) -> Result<Option<(i64, SwissTournament)>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, name, initial_rating, k_factor, bye_name, shuffle_roster
         FROM tournaments WHERE code = ?1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let id: i64 = row.get("id");
    let name: String = row.get("name");
    let config = TournamentConfig {
        initial_rating: row.get("initial_rating"),
        k_factor: row.get("k_factor"),
        bye_name: row.get("bye_name"),
        shuffle_roster: row.get("shuffle_roster"),
    };

    let competitors = sqlx::query(
        "SELECT seed, name, is_bye, rating, wins, draws, losses, byes
         FROM competitors WHERE tournament_id = ?1 ORDER BY seed",
    )
    .bind(id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| Competitor {
        id: CompetitorId(r.get::<i64, _>("seed") as usize),
        name: r.get("name"),
        rating: r.get("rating"),
        kind: if r.get::<bool, _>("is_bye") {
            CompetitorKind::Bye
        } else {
            CompetitorKind::Regular
        },
        tally: Tally {
            wins: r.get::<i64, _>("wins") as u32,
            draws: r.get::<i64, _>("draws") as u32,
            losses: r.get::<i64, _>("losses") as u32,
            byes: r.get::<i64, _>("byes") as u32,
        },
    })
    .collect::<Vec<_>>();

    let mut rounds: Vec<Vec<Matchup>> = Vec::new();
    let matchup_rows = sqlx::query(
        "SELECT round, left_seed, right_seed, is_bye, outcome, left_change, right_change
         FROM matchups WHERE tournament_id = ?1 ORDER BY round, slot",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    for r in matchup_rows {
        let round = r.get::<i64, _>("round") as usize;
        while rounds.len() <= round {
            rounds.push(Vec::new());
        }
        let outcome: Option<String> = r.get("outcome");
        rounds[round].push(Matchup {
            left: CompetitorId(r.get::<i64, _>("left_seed") as usize),
            right: CompetitorId(r.get::<i64, _>("right_seed") as usize),
            bye: r.get("is_bye"),
            result: outcome.as_deref().and_then(outcome_from_str).map(|outcome| MatchResult {
                outcome,
                left_change: r.get("left_change"),
                right_change: r.get("right_change"),
            }),
        });
    }

    Ok(Some((
        id,
        SwissTournament::restore(name, config, competitors, rounds),
    )))
}

/// Most recent tournaments first.
pub async fn list_tournaments(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<TournamentSummary>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT t.code, t.name, t.created_at,
                (SELECT COUNT(*) FROM competitors c
                 WHERE c.tournament_id = t.id AND c.is_bye = 0) AS competitors
         FROM tournaments t ORDER BY t.id DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| TournamentSummary {
            code: r.get("code"),
            name: r.get("name"),
            competitors: r.get::<i64, _>("competitors") as u32,
            created_at: r.get("created_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_text_round_trips() {
        for o in [Outcome::LeftWin, Outcome::RightWin, Outcome::Draw] {
            assert_eq!(outcome_from_str(outcome_to_str(o)), Some(o));
        }
        assert_eq!(outcome_from_str("forfeit"), None);
    }
}
