use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph, Wrap},
    Frame,
};

use crate::session::{Screen, Session, MAX_NAME_LEN};
use swiss_core::{MatchResult, Matchup, Outcome};

// ── Constants ────────────────────────────────────────────────────────────────

const PANEL_WIDTH: u16 = 64;
const STANDINGS_VISIBLE: usize = 20;

// ── Public entry point ───────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, session: &Session) {
    match session.screen {
        Screen::Setup => draw_setup(f, session),
        Screen::Round => draw_round(f, session),
        Screen::Standings => draw_standings(f, session),
        Screen::Failed => draw_failed(f, session),
    }

    if session.show_quit_confirm {
        draw_quit_confirm(f);
    }
}

// ── Setup screen ─────────────────────────────────────────────────────────────

fn draw_setup(f: &mut Frame, session: &Session) {
    let area = f.area();
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);

    let title = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "S W I S S   P A I R I N G S",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let panel = center_rect(PANEL_WIDTH, chunks[1].height.min(26), chunks[1]);
    let block = Block::bordered()
        .title(" New tournament ")
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Cyan));

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Competitor name:",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  > ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                session.name_input.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "_".repeat(MAX_NAME_LEN.saturating_sub(session.name_input.chars().count())),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("  Roster ({})", session.roster.len()),
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            "  ──────────────────────────────",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if session.roster.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Nobody yet.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        // Newest names stay visible when the roster outgrows the panel.
        let room = (panel.height as usize).saturating_sub(lines.len() + 4).max(1);
        let skip = session.roster.len().saturating_sub(room);
        if skip > 0 {
            lines.push(Line::from(Span::styled(
                format!("  ... {} more", skip),
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (i, name) in session.roster.iter().enumerate().skip(skip) {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:>3}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(name.clone(), Style::default().fg(Color::Cyan)),
            ]));
        }
    }

    if session.roster.len() % 2 == 1 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Odd roster: \"{}\" will fill the gap.", session.config.bye_name),
            Style::default().fg(Color::Magenta),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, panel);

    draw_status(f, session, chunks[2]);
    draw_key_hints(
        f,
        chunks[3],
        &[
            ("Enter", "Add name / start"),
            ("Bksp", "Edit / remove last"),
            ("Esc", "Quit"),
        ],
    );
}

// ── Round screen ─────────────────────────────────────────────────────────────

fn draw_round(f: &mut Frame, session: &Session) {
    let area = f.area();
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);

    let Some(tournament) = session.tournament.as_ref() else {
        return;
    };

    let current = tournament.current_round();
    let round_state = match current {
        Some(r) if r == session.viewed_round => ("in progress", Color::Yellow),
        Some(r) if r < session.viewed_round => ("waiting", Color::DarkGray),
        _ => ("finished", Color::Green),
    };
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            tournament.name().to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("◄ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!(
                    "Round {} of {}",
                    session.viewed_round + 1,
                    session.round_count()
                ),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ►", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("  ({})", round_state.0),
                Style::default().fg(round_state.1),
            ),
        ]),
    ])
    .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let body = Layout::horizontal([Constraint::Min(0), Constraint::Length(30)]).split(chunks[1]);
    draw_matchups(f, session, body[0]);
    draw_side_standings(f, session, body[1]);

    draw_status(f, session, chunks[2]);
    draw_key_hints(
        f,
        chunks[3],
        &[
            ("↑↓", "Select"),
            ("←→", "Round"),
            ("l", "Left wins"),
            ("r", "Right wins"),
            ("d", "Draw"),
            ("s", "Standings"),
            ("q", "Quit"),
        ],
    );
}

fn draw_matchups(f: &mut Frame, session: &Session, area: Rect) {
    let block = Block::bordered()
        .title(" Matchups ")
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Cyan));

    let mut lines = vec![Line::from("")];
    for (slot, m) in session.matchups().iter().enumerate() {
        let is_selected = slot == session.selected;
        let prefix = if is_selected { "▸ " } else { "  " };
        let base = if is_selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let left = session.name_of(m.left);
        let right = session.name_of(m.right);
        let (left_style, right_style) = side_styles(m, base);

        let mut spans = vec![
            Span::styled(format!("{}{:>2}. ", prefix, slot + 1), base),
            Span::styled(format!("{:<20}", left), left_style),
            Span::styled(" vs ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:<20}", right), right_style),
        ];
        spans.push(result_span(m));
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, area);
}

fn side_styles(m: &Matchup, base: Style) -> (Style, Style) {
    let win = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);
    let loss = Style::default().fg(Color::DarkGray);
    match m.result.map(|r| r.outcome) {
        Some(Outcome::LeftWin) => (win, loss),
        Some(Outcome::RightWin) => (loss, win),
        _ => (base, base),
    }
}

fn result_span(m: &Matchup) -> Span<'static> {
    match m.result {
        None => Span::styled("  pending", Style::default().fg(Color::DarkGray)),
        Some(_) if m.is_bye() => Span::styled("  bye", Style::default().fg(Color::Magenta)),
        Some(MatchResult {
            outcome,
            left_change,
            right_change,
        }) => Span::styled(
            format!("  {}  {:+.1}/{:+.1}", outcome.label(), left_change, right_change),
            Style::default().fg(Color::Gray),
        ),
    }
}

fn draw_side_standings(f: &mut Frame, session: &Session, area: Rect) {
    let block = Block::bordered()
        .title(" Ratings ")
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Green));

    let visible = (area.height as usize).saturating_sub(3);
    let mut lines = vec![Line::from("")];
    for s in session.standings().into_iter().take(visible) {
        let name = truncate(&s.name, 16);
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3} ", s.rank), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:<16}", name), Style::default().fg(Color::Cyan)),
            Span::styled(format!("{:>7.1}", s.rating), Style::default().fg(Color::Green)),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, area);
}

// ── Standings screen ─────────────────────────────────────────────────────────

fn draw_standings(f: &mut Frame, session: &Session) {
    let area = f.area();

    let bg = Paragraph::new("").style(Style::default().bg(Color::Black));
    f.render_widget(bg, area);

    let popup = center_rect(PANEL_WIDTH, 30, area);
    f.render_widget(Clear, popup);

    let title = if session.is_complete() {
        " Final standings "
    } else {
        " Standings "
    };
    let block = Block::bordered()
        .title(title)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Yellow));

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "    #  Competitor            Rating    W   D   L  Bye",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  ─────────────────────────────────────────────────────",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let standings = session.standings();
    let start = session.standings_scroll.min(standings.len());
    let end = (start + STANDINGS_VISIBLE).min(standings.len());
    for s in &standings[start..end] {
        let rank_color = match s.rank {
            1 => Color::Yellow,
            2 => Color::White,
            3 => Color::Rgb(205, 127, 50),
            _ => Color::DarkGray,
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:>3}", s.rank),
                Style::default()
                    .fg(rank_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {:<20}", truncate(&s.name, 20)),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(format!("{:>7.1}", s.rating), Style::default().fg(Color::Green)),
            Span::styled(
                format!(
                    "  {:>3} {:>3} {:>3}  {:>3}",
                    s.tally.wins, s.tally.draws, s.tally.losses, s.tally.byes
                ),
                Style::default().fg(Color::Gray),
            ),
        ]));
    }

    if standings.len() > STANDINGS_VISIBLE {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "  Showing {}-{} of {}  (↑/↓ to scroll)",
                start + 1,
                end,
                standings.len()
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    let footer = if session.is_complete() {
        "  n New tournament   q Quit"
    } else {
        "  Esc Back to round   n New tournament   q Quit"
    };
    lines.push(Line::from(Span::styled(
        footer,
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, popup);
}

// ── Failure screen ───────────────────────────────────────────────────────────

fn draw_failed(f: &mut Frame, session: &Session) {
    let area = f.area();
    let popup = center_rect(52, 11, area);
    f.render_widget(Clear, popup);

    let block = Block::bordered()
        .title(" No schedule ")
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Red));

    let reason = session
        .failure
        .clone()
        .unwrap_or_else(|| "Pairing failed".to_string());
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "The roster cannot be scheduled without repeats.",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(reason, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter Edit roster   q Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(block)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(text, popup);
}

// ── Status line and key hints ────────────────────────────────────────────────

fn draw_status(f: &mut Frame, session: &Session, area: Rect) {
    let Some(msg) = &session.status else {
        return;
    };
    let line = Paragraph::new(Line::from(Span::styled(
        format!(" {}", msg),
        Style::default().fg(Color::Yellow),
    )));
    f.render_widget(line, area);
}

fn draw_key_hints(f: &mut Frame, area: Rect, keys: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(keys.len() * 2);
    for (key, action) in keys {
        spans.push(Span::styled(format!(" {}", key), Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(format!(" {} ", action), Style::default().fg(Color::Gray)));
    }
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(bar, area);
}

// ── Quit confirmation dialog ─────────────────────────────────────────────────

fn draw_quit_confirm(f: &mut Frame) {
    let area = f.area();
    let popup = center_rect(40, 8, area);

    f.render_widget(Clear, popup);

    let block = Block::bordered()
        .title(" Quit? ")
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Red));

    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Progress is saved. Quit now?",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "Y",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("/", Style::default().fg(Color::Gray)),
            Span::styled(
                "Enter",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Yes   ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Any key",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" No", Style::default().fg(Color::Gray)),
        ]),
    ])
    .block(block)
    .alignment(Alignment::Center);

    f.render_widget(text, popup);
}

// ── Layout helpers ───────────────────────────────────────────────────────────

fn center_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vert = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(height),
        Constraint::Min(0),
    ])
    .split(area);

    let horiz = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(width),
        Constraint::Min(0),
    ])
    .split(vert[1]);

    horiz[1]
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() > width {
        let cut: String = name.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        name.to_string()
    }
}
