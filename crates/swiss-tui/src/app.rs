use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info, warn};

use crate::session::{Screen, Session};
use crate::storage;
use crate::ui;
use swiss_core::{Outcome, TournamentConfig};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_run())
}

async fn async_run() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_problem) = match storage::load_config(&storage::config_path()) {
        Ok(config) => (config, None),
        Err(e) => {
            warn!(error = %e, "falling back to default settings");
            (
                TournamentConfig::default(),
                Some(format!("config.toml ignored: {}", e)),
            )
        }
    };

    let save_path = storage::save_path();
    let mut session = match storage::load_tournament(&save_path) {
        Some(tournament) => {
            info!(path = %save_path.display(), "resuming saved tournament");
            Session::resume(config, tournament)
        }
        None => Session::new(config),
    };
    if config_problem.is_some() {
        session.status = config_problem;
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut session, &save_path).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    save_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut event_stream = EventStream::new();
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui::draw(f, session))?;

        tokio::select! {
            maybe_event = event_stream.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let quit = handle_key(session, key, save_path);
                    autosave(session, save_path);
                    if quit {
                        return Ok(());
                    }
                }
            }
            _ = tokio::time::sleep(tick_rate) => {}
        }
    }
}

fn autosave(session: &mut Session, save_path: &Path) {
    if !session.dirty {
        return;
    }
    let Some(tournament) = session.tournament.as_ref() else {
        return;
    };
    match storage::save_tournament(save_path, tournament) {
        Ok(()) => session.dirty = false,
        Err(e) => {
            error!(error = %e, "autosave failed");
            session.status = Some(format!("Could not save progress: {}", e));
        }
    }
}

fn handle_key(session: &mut Session, key: KeyEvent, save_path: &Path) -> bool {
    if session.show_quit_confirm {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => return true,
            _ => session.show_quit_confirm = false,
        }
        return false;
    }

    match session.screen {
        Screen::Setup => handle_setup_key(session, key),
        Screen::Round => handle_round_key(session, key),
        Screen::Standings => handle_standings_key(session, key, save_path),
        Screen::Failed => handle_failed_key(session, key),
    }
}

fn handle_setup_key(session: &mut Session, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => {
            if session.name_input.trim().is_empty() {
                session.start_tournament();
            } else {
                session.add_name();
            }
        }
        KeyCode::Backspace => session.backspace(),
        KeyCode::Char(c) => session.type_char(c),
        KeyCode::Esc => return true,
        _ => {}
    }
    false
}

fn handle_round_key(session: &mut Session, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Up => session.move_selection(-1),
        KeyCode::Down => session.move_selection(1),
        KeyCode::Left => session.show_round(-1),
        KeyCode::Right => session.show_round(1),
        KeyCode::Char('l') | KeyCode::Char('L') => session.adjudicate(Outcome::LeftWin),
        KeyCode::Char('r') | KeyCode::Char('R') => session.adjudicate(Outcome::RightWin),
        KeyCode::Char('d') | KeyCode::Char('D') => session.adjudicate(Outcome::Draw),
        KeyCode::Char('s') | KeyCode::Char('S') => session.show_standings(),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            session.show_quit_confirm = true;
        }
        _ => {}
    }
    false
}

fn handle_standings_key(session: &mut Session, key: KeyEvent, save_path: &Path) -> bool {
    match key.code {
        KeyCode::Up => {
            session.standings_scroll = session.standings_scroll.saturating_sub(1);
        }
        KeyCode::Down => {
            let max_scroll = session.standings().len().saturating_sub(20);
            if session.standings_scroll < max_scroll {
                session.standings_scroll += 1;
            }
        }
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('s') if !session.is_complete() => {
            session.close_standings();
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            if let Err(e) = storage::clear_saved(save_path) {
                warn!(error = %e, "could not remove saved tournament");
            }
            session.new_tournament();
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return true,
        _ => {}
    }
    false
}

fn handle_failed_key(session: &mut Session, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter | KeyCode::Char('n') => session.new_tournament(),
        KeyCode::Char('q') | KeyCode::Esc => return true,
        _ => {}
    }
    false
}
