//! Detail pane: right panel, the selected person.

use kinmap_core::{defaults::SELF_TAG, store::EntityStore};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};

use super::{hex, pane_block};
use crate::app::App;

pub fn draw<S: EntityStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(person) = app.selected() else {
    let block = pane_block(" Detail ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("Select a person with ↑↓ or a click.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true }),
      inner,
    );
    return;
  };

  let title = if person.tags.iter().any(|t| t == SELF_TAG) {
    format!(" {} (you) ", person.name)
  } else {
    format!(" {} ", person.name)
  };
  let block = pane_block(&title);
  let inner = block.inner(area);

  let label = |s: &str| {
    Span::styled(
      format!("{s:<10}"),
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    )
  };
  let colored = |name: &str| {
    let c = app.type_color(name).map_or(Color::Gray, hex);
    Span::styled(name.to_owned(), Style::default().fg(c))
  };

  let mut lines = vec![Line::from(vec![label("primary"), colored(&person.primary_relationship)])];
  if !person.aliases.is_empty() {
    lines.push(Line::from(vec![label("aliases"), Span::raw(person.aliases.join(", "))]));
  }
  if !person.tags.is_empty() {
    lines.push(Line::from(vec![label("tags"), Span::raw(person.tags.join(", "))]));
  }
  for (name, value) in [("location", &person.location), ("blood", &person.blood_group)] {
    if let Some(v) = value {
      lines.push(Line::from(vec![label(name), Span::raw(v.clone())]));
    }
  }

  lines.push(Line::from(""));
  if person.relationships.is_empty() {
    lines.push(Line::styled("No relationships.", Style::default().fg(Color::DarkGray)));
  }
  for rel in &person.relationships {
    let other = match app.person(&rel.connected_to_id) {
      Some(p) => Span::raw(p.name.clone()),
      None => Span::styled(
        format!("{} (missing)", rel.connected_to_id),
        Style::default().fg(Color::Red),
      ),
    };
    lines.push(Line::from(vec![Span::raw("→ "), other, Span::raw("  "), colored(&rel.kind)]));
  }

  if let Some(notes) = &person.notes {
    lines.push(Line::from(""));
    lines.push(Line::styled(notes.clone(), Style::default().fg(Color::Gray)));
  }

  f.render_widget(block, area);
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
