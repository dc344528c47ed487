use swiss_core::{
    CompetitorId, Matchup, Outcome, PairingError, Standing, SwissError, SwissTournament,
    TournamentConfig,
};
use tracing::{info, warn};

/// Longest competitor name accepted at the prompt.
pub const MAX_NAME_LEN: usize = 24;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Round,
    Standings,
    Failed,
}

pub struct Session {
    pub screen: Screen,
    pub config: TournamentConfig,
    pub title: String,
    // Setup
    pub roster: Vec<String>,
    pub name_input: String,
    // Running tournament
    pub tournament: Option<SwissTournament>,
    pub viewed_round: usize,
    pub selected: usize,
    pub standings_scroll: usize,
    // Status line, replaced by the next action
    pub status: Option<String>,
    // Why the schedule could not be built
    pub failure: Option<String>,
    pub show_quit_confirm: bool,
    // Set when the tournament changed and should be saved
    pub dirty: bool,
}

impl Session {
    pub fn new(config: TournamentConfig) -> Self {
        Self {
            screen: Screen::Setup,
            config,
            title: "Swiss".to_string(),
            roster: Vec::new(),
            name_input: String::new(),
            tournament: None,
            viewed_round: 0,
            selected: 0,
            standings_scroll: 0,
            status: None,
            failure: None,
            show_quit_confirm: false,
            dirty: false,
        }
    }

    /// Pick up a saved tournament where it was left.
    pub fn resume(config: TournamentConfig, tournament: SwissTournament) -> Self {
        let mut session = Self::new(config);
        session.title = tournament.name().to_string();
        session.roster = tournament
            .competitors()
            .iter()
            .filter(|c| !c.is_bye())
            .map(|c| c.name.clone())
            .collect();
        let complete = tournament.is_complete();
        session.tournament = Some(tournament);
        session.jump_to_current_round();
        session.screen = if complete {
            Screen::Standings
        } else {
            Screen::Round
        };
        session.status = Some("Resumed saved tournament".to_string());
        session
    }

    // ── Setup ────────────────────────────────────────────────────────────

    pub fn type_char(&mut self, c: char) {
        if self.name_input.chars().count() < MAX_NAME_LEN && !c.is_control() {
            self.name_input.push(c);
        }
    }

    /// Backspace edits the prompt, or drops the last name once the prompt is empty.
    pub fn backspace(&mut self) {
        if self.name_input.pop().is_none() {
            if let Some(name) = self.roster.pop() {
                self.status = Some(format!("Removed {}", name));
            }
        }
    }

    /// Move the prompt onto the roster.
    pub fn add_name(&mut self) -> bool {
        let name = self.name_input.trim().to_string();
        if name.is_empty() {
            return false;
        }
        if self.roster.contains(&name) {
            self.status = Some(format!("{} is already registered", name));
            return false;
        }
        self.roster.push(name);
        self.name_input.clear();
        self.status = None;
        true
    }

    /// Register the roster and build every round up front.
    pub fn start_tournament(&mut self) {
        let mut tournament =
            match SwissTournament::new(self.title.clone(), self.roster.clone(), self.config.clone())
            {
                Ok(t) => t,
                Err(e) => {
                    self.status = Some(e.to_string());
                    return;
                }
            };

        match tournament.generate_schedule() {
            Ok(_) => {}
            Err(e @ SwissError::Pairing(PairingError::Infeasible { .. })) => {
                warn!(error = %e, "no schedule for roster");
                self.failure = Some(e.to_string());
                self.screen = Screen::Failed;
                return;
            }
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        }

        info!(
            competitors = self.roster.len(),
            rounds = tournament.rounds().len(),
            "tournament started"
        );
        let complete = tournament.is_complete();
        self.tournament = Some(tournament);
        self.jump_to_current_round();
        self.screen = if complete {
            Screen::Standings
        } else {
            Screen::Round
        };
        self.status = None;
        self.failure = None;
        self.dirty = true;
    }

    /// Back to the setup prompt. The roster is kept for the next event.
    pub fn new_tournament(&mut self) {
        self.tournament = None;
        self.viewed_round = 0;
        self.selected = 0;
        self.standings_scroll = 0;
        self.failure = None;
        self.status = None;
        self.screen = Screen::Setup;
    }

    // ── Round navigation ─────────────────────────────────────────────────

    pub fn round_count(&self) -> usize {
        self.tournament.as_ref().map_or(0, |t| t.rounds().len())
    }

    pub fn matchups(&self) -> &[Matchup] {
        self.tournament
            .as_ref()
            .and_then(|t| t.round(self.viewed_round))
            .unwrap_or(&[])
    }

    pub fn selected_matchup(&self) -> Option<&Matchup> {
        self.matchups().get(self.selected)
    }

    pub fn move_selection(&mut self, delta: i32) {
        let len = self.matchups().len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }

    pub fn show_round(&mut self, delta: i32) {
        let count = self.round_count();
        if count == 0 {
            return;
        }
        let target = (self.viewed_round as i32 + delta).clamp(0, count as i32 - 1) as usize;
        if target != self.viewed_round {
            self.viewed_round = target;
            self.selected = self.first_open_slot();
        }
    }

    fn jump_to_current_round(&mut self) {
        let (round, last) = match &self.tournament {
            Some(t) => (t.current_round(), t.rounds().len().saturating_sub(1)),
            None => (None, 0),
        };
        self.viewed_round = round.unwrap_or(last);
        self.selected = self.first_open_slot();
    }

    fn first_open_slot(&self) -> usize {
        self.matchups()
            .iter()
            .position(|m| !m.is_decided())
            .unwrap_or(0)
    }

    // ── Adjudication ─────────────────────────────────────────────────────

    pub fn adjudicate(&mut self, outcome: Outcome) {
        let Some(tournament) = self.tournament.as_mut() else {
            return;
        };
        let (round, slot) = (self.viewed_round, self.selected);

        match tournament.record_result(round, slot, outcome) {
            Ok(result) => {
                let m = &tournament.rounds()[round][slot];
                let left = display_name(tournament, m.left);
                let right = display_name(tournament, m.right);
                let verdict = match outcome {
                    Outcome::LeftWin => format!("{} beats {}", left, right),
                    Outcome::RightWin => format!("{} beats {}", right, left),
                    Outcome::Draw => format!("{} and {} draw", left, right),
                };
                self.status = Some(format!(
                    "{} ({:+.1} / {:+.1})",
                    verdict, result.left_change, result.right_change
                ));
                self.dirty = true;

                if tournament.is_complete() {
                    info!("tournament complete");
                    self.standings_scroll = 0;
                    self.screen = Screen::Standings;
                } else if tournament.is_round_complete(round) {
                    self.jump_to_current_round();
                } else {
                    self.selected = self.first_open_slot();
                }
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    // ── Standings ────────────────────────────────────────────────────────

    pub fn standings(&self) -> Vec<Standing> {
        self.tournament
            .as_ref()
            .map(SwissTournament::standings)
            .unwrap_or_default()
    }

    pub fn show_standings(&mut self) {
        if self.tournament.is_some() {
            self.standings_scroll = 0;
            self.screen = Screen::Standings;
        }
    }

    pub fn close_standings(&mut self) {
        self.screen = Screen::Round;
    }

    pub fn is_complete(&self) -> bool {
        self.tournament.as_ref().is_some_and(SwissTournament::is_complete)
    }

    pub fn name_of(&self, id: CompetitorId) -> String {
        self.tournament
            .as_ref()
            .map(|t| display_name(t, id))
            .unwrap_or_default()
    }
}

fn display_name(tournament: &SwissTournament, id: CompetitorId) -> String {
    tournament
        .competitor(id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(names: &[&str]) -> Session {
        let mut s = Session::new(TournamentConfig::default());
        for name in names {
            for c in name.chars() {
                s.type_char(c);
            }
            assert!(s.add_name());
        }
        s
    }

    #[test]
    fn rejects_blank_and_duplicate_names() {
        let mut s = session_with(&["Ann"]);
        s.type_char(' ');
        assert!(!s.add_name());
        s.backspace();
        for c in "Ann".chars() {
            s.type_char(c);
        }
        assert!(!s.add_name());
        assert_eq!(s.roster, vec!["Ann".to_string()]);
        assert!(s.status.as_deref().unwrap().contains("already"));
    }

    #[test]
    fn backspace_on_empty_prompt_removes_last_name() {
        let mut s = session_with(&["Ann", "Bob"]);
        s.backspace();
        assert_eq!(s.roster, vec!["Ann".to_string()]);
    }

    #[test]
    fn name_length_is_capped() {
        let mut s = Session::new(TournamentConfig::default());
        for _ in 0..40 {
            s.type_char('x');
        }
        assert_eq!(s.name_input.len(), MAX_NAME_LEN);
    }

    #[test]
    fn empty_roster_stays_on_setup() {
        let mut s = Session::new(TournamentConfig::default());
        s.start_tournament();
        assert_eq!(s.screen, Screen::Setup);
        assert!(s.status.is_some());
        assert!(s.tournament.is_none());
    }

    #[test]
    fn start_builds_every_round() {
        let mut s = session_with(&["A", "B", "C", "D"]);
        s.start_tournament();
        assert_eq!(s.screen, Screen::Round);
        assert_eq!(s.round_count(), 2);
        assert_eq!(s.viewed_round, 0);
        assert_eq!(s.matchups().len(), 2);
        assert!(s.dirty);
    }

    #[test]
    fn adjudicating_moves_to_next_open_matchup() {
        let mut s = session_with(&["A", "B", "C", "D"]);
        s.start_tournament();
        s.adjudicate(Outcome::LeftWin);
        assert_eq!(s.selected, 1);
        assert!(s.status.as_deref().unwrap().contains("+16.0"));

        s.adjudicate(Outcome::Draw);
        // Round one done; the view follows to round two.
        assert_eq!(s.viewed_round, 1);
        assert_eq!(s.selected, 0);
    }

    #[test]
    fn second_result_for_a_matchup_is_refused() {
        let mut s = session_with(&["A", "B", "C", "D"]);
        s.start_tournament();
        s.adjudicate(Outcome::LeftWin);
        s.selected = 0;
        s.adjudicate(Outcome::RightWin);
        assert!(s.status.as_deref().unwrap().contains("already has a result"));
    }

    #[test]
    fn later_round_waits_for_current_one() {
        let mut s = session_with(&["A", "B", "C", "D"]);
        s.start_tournament();
        s.show_round(1);
        assert_eq!(s.viewed_round, 1);
        s.adjudicate(Outcome::Draw);
        assert!(s.status.as_deref().unwrap().contains("cannot start"));
        assert!(s.matchups().iter().all(|m| !m.is_decided()));
    }

    #[test]
    fn odd_roster_starts_on_a_rated_matchup() {
        let mut s = session_with(&["A", "B", "C"]);
        s.start_tournament();
        let m = s.selected_matchup().unwrap();
        assert!(!m.is_bye());
        assert!(!m.is_decided());
    }

    #[test]
    fn finishing_every_round_shows_standings() {
        let mut s = session_with(&["A", "B", "C", "D", "E"]);
        s.start_tournament();
        let mut guard = 0;
        while !s.is_complete() {
            s.adjudicate(Outcome::LeftWin);
            guard += 1;
            assert!(guard < 50);
        }
        assert_eq!(s.screen, Screen::Standings);
        let table = s.standings();
        assert_eq!(table.len(), 5);
        assert_eq!(table[0].rank, 1);
    }

    #[test]
    fn single_name_completes_immediately() {
        let mut s = session_with(&["Solo"]);
        s.start_tournament();
        assert!(s.is_complete());
        assert_eq!(s.screen, Screen::Standings);
    }

    #[test]
    fn resume_restores_position() {
        let mut s = session_with(&["A", "B", "C", "D"]);
        s.start_tournament();
        s.adjudicate(Outcome::LeftWin);
        s.adjudicate(Outcome::LeftWin);

        let saved = s.tournament.clone().unwrap();
        let resumed = Session::resume(TournamentConfig::default(), saved);
        assert_eq!(resumed.screen, Screen::Round);
        assert_eq!(resumed.viewed_round, 1);
        assert_eq!(resumed.roster.len(), 4);
    }

    #[test]
    fn new_tournament_keeps_roster() {
        let mut s = session_with(&["A", "B"]);
        s.start_tournament();
        s.new_tournament();
        assert_eq!(s.screen, Screen::Setup);
        assert!(s.tournament.is_none());
        assert_eq!(s.roster.len(), 2);
    }
}
