//! People list pane: left panel.

use kinmap_core::store::EntityStore;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};

use super::{hex, pane_block};
use crate::app::{App, Mode};

/// Render the people list into `area`.
pub fn draw<S: EntityStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let filtered = app.filtered();
  let total = app.people.len();
  let searching = app.mode == Mode::Search || !app.search.is_empty();

  let title = if searching {
    format!(" People ({}/{}) ", filtered.len(), total)
  } else {
    format!(" People ({total}) ")
  };
  let block = pane_block(&title);

  let focus = app.scene.focus();
  let items: Vec<ListItem> = filtered
    .iter()
    .map(|p| {
      let dot = app.type_color(&p.primary_relationship).map_or(Color::Gray, hex);
      let mut style = Style::default();
      if focus.highlighted.as_deref() == Some(p.id.as_str()) {
        style = style.fg(Color::LightBlue);
      }
      if focus.selected.as_deref() == Some(p.id.as_str()) {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
      }
      ListItem::new(Line::from(vec![
        Span::styled("● ", Style::default().fg(dot)),
        Span::styled(p.name.clone(), style),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Search bar on the last inner row.
  if searching && inner_area.height > 2 {
    let bar = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let text = if app.mode == Mode::Search {
      format!("/{}_", app.search)
    } else {
      format!("/{}", app.search)
    };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Yellow)), bar);
  }

  let mut state = ListState::default();
  state.select((!filtered.is_empty()).then_some(app.cursor));

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
      .highlight_symbol(""),
    inner_area,
    &mut state,
  );
}
