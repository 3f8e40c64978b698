//! TUI rendering: orchestrates all panes.

pub mod detail;
pub mod graph;
pub mod people_list;

use chrono::Local;
use kinmap_core::store::EntityStore;
use kinmap_layout::Rgb;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Mode};

// ─── Layout ───────────────────────────────────────────────────────────────────

pub struct Panes {
  pub header: Rect,
  pub list:   Rect,
  pub graph:  Rect,
  pub detail: Rect,
  pub status: Rect,
}

/// Split the frame: header, three body columns, status bar.
pub fn panes(area: Rect) -> Panes {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage(22),
      Constraint::Percentage(53),
      Constraint::Percentage(25),
    ])
    .split(rows[1]);

  Panes {
    header: rows[0],
    list:   cols[0],
    graph:  cols[1],
    detail: cols[2],
    status: rows[2],
  }
}

/// Where the graph canvas lands inside a frame of `area`.
pub fn graph_inner(area: Rect) -> Rect { pane_block("").inner(panes(area).graph) }

pub(crate) fn pane_block(title: &str) -> Block<'_> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

pub(crate) fn rgb(c: Rgb) -> Color { Color::Rgb(c.0, c.1, c.2) }

/// Terminal color for a stored hex string.
pub(crate) fn hex(s: &str) -> Color { rgb(Rgb::parse_or_unmatched(s)) }

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: EntityStore>(f: &mut Frame, app: &App<S>) {
  let p = panes(f.area());
  draw_header(f, p.header, app);
  people_list::draw(f, p.list, app);
  graph::draw(f, p.graph, app);
  detail::draw(f, p.detail, app);
  draw_status(f, p.status, app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S: EntityStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    format!(" kinmap  {} people  {} types", app.people.len(), app.types.len()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{date} "),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S: EntityStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, hints) = match app.mode {
    Mode::Search => ("SEARCH", "Type to filter  Enter select match  Esc clear"),
    Mode::ConfirmDelete => ("DELETE", "y confirm  any other key cancels"),
    Mode::Normal => (
      "NORMAL",
      "↑↓/jk select  / search  +/- zoom  HJKL pan  0 reset  d delete  q quit",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::Gray),
  );

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
