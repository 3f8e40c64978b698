//! Application state machine and event dispatcher for the terminal UI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use kinmap_core::{
  boundary::Boundary,
  model::{Person, RelationshipType},
  search::{filter_people, highlight_target},
  store::EntityStore,
};
use kinmap_layout::{ForceConfig, Scene, Viewport};
use ratatui::layout::{Position, Rect};

/// Layout units per terminal cell. Cells are roughly twice as tall as wide.
pub const CELL_W: f64 = 8.0;
pub const CELL_H: f64 = 16.0;

const ZOOM_STEP: f64 = 1.25;
const PAN_STEP: f64 = 40.0;
const TICKS_PER_FRAME: usize = 2;

// ─── Mode ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  /// Typing a search term; the graph follows every keystroke.
  Search,
  /// Waiting for `y` to delete the selected person.
  ConfirmDelete,
}

// ─── App ──────────────────────────────────────────────────────────────────────

pub struct App<S> {
  pub boundary:   Boundary<S>,
  pub mode:       Mode,
  pub people:     Vec<Person>,
  pub types:      Vec<RelationshipType>,
  pub scene:      Scene,
  pub viewport:   Viewport,
  pub search:     String,
  /// Cursor position within the *filtered* people list.
  pub cursor:     usize,
  pub status_msg: String,
  /// Inner area of the graph pane as last laid out.
  pub graph_area: Rect,
}

impl<S: EntityStore> App<S> {
  pub fn new(boundary: Boundary<S>, forces: ForceConfig) -> Self {
    Self {
      boundary,
      mode: Mode::Normal,
      people: Vec::new(),
      types: Vec::new(),
      scene: Scene::new(forces, (0.0, 0.0)),
      viewport: Viewport::default(),
      search: String::new(),
      cursor: 0,
      status_msg: String::new(),
      graph_area: Rect::default(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Re-read both collections and rebuild every derived view.
  pub async fn reload(&mut self) -> anyhow::Result<()> {
    let snapshot = self.boundary.engine().load_all().await?;
    self.people = snapshot.people;
    self.types = snapshot.relationship_types;
    if self.people.is_empty() {
      self.status_msg = "No people yet. Run `kinmap onboard <NAME>` to begin.".into();
    }
    self.refresh_view();
    Ok(())
  }

  /// Recompute the filtered list, the graph, and the search highlight.
  fn refresh_view(&mut self) {
    let filtered = filter_people(&self.people, &self.search);
    let target = highlight_target(&filtered, &self.search).map(str::to_owned);
    self.scene.sync(filtered.iter().copied(), &self.types);
    self.scene.highlight(target);

    let len = filtered.len();
    if self.cursor >= len {
      self.cursor = len.saturating_sub(1);
    }

    let selected = self.scene.focus().selected.clone();
    if let Some(id) = selected
      && !self.people.iter().any(|p| p.id == id)
    {
      self.scene.forget(&id);
    }
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  pub fn filtered(&self) -> Vec<&Person> { filter_people(&self.people, &self.search) }

  pub fn person(&self, id: &str) -> Option<&Person> { self.people.iter().find(|p| p.id == id) }

  pub fn selected(&self) -> Option<&Person> {
    self.scene.focus().selected.as_deref().and_then(|id| self.person(id))
  }

  pub fn type_color(&self, name: &str) -> Option<&str> {
    self
      .types
      .iter()
      .find(|t| t.name == name)
      .map(|t| t.color.as_str())
  }

  fn select_id(&mut self, id: Option<String>) {
    let index = id
      .as_deref()
      .and_then(|id| self.filtered().iter().position(|p| p.id == id));
    if let Some(i) = index {
      self.cursor = i;
    }
    self.scene.select(id);
  }

  fn select_cursor(&mut self) {
    let id = self.filtered().get(self.cursor).map(|p| p.id.clone());
    self.scene.select(id);
  }

  // ── Animation ─────────────────────────────────────────────────────────────

  pub fn is_animating(&self) -> bool { !self.scene.is_settled() }

  pub fn tick(&mut self) {
    for _ in 0..TICKS_PER_FRAME {
      self.scene.tick();
    }
  }

  // ── Coordinates ───────────────────────────────────────────────────────────

  fn pane_size(&self) -> (f64, f64) {
    (
      self.graph_area.width as f64 * CELL_W,
      self.graph_area.height as f64 * CELL_H,
    )
  }

  /// Layout space to pane units, origin at the pane's top-left, y down.
  pub fn to_screen(&self, world: (f64, f64)) -> (f64, f64) {
    let (w, h) = self.pane_size();
    let (x, y) = self.viewport.apply(world);
    (x + w / 2.0, y + h / 2.0)
  }

  /// The layout-space point under a terminal cell, if it is in the pane.
  pub fn to_world(&self, column: u16, row: u16) -> Option<(f64, f64)> {
    if !self.graph_area.contains(Position { x: column, y: row }) {
      return None;
    }
    let (w, h) = self.pane_size();
    let sx = (column - self.graph_area.x) as f64 * CELL_W + CELL_W / 2.0;
    let sy = (row - self.graph_area.y) as f64 * CELL_H + CELL_H / 2.0;
    Some(self.viewport.invert((sx - w / 2.0, sy - h / 2.0)))
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    match self.mode {
      Mode::Search => self.handle_search_key(key),
      Mode::ConfirmDelete => self.handle_confirm_key(key).await,
      Mode::Normal => Ok(self.handle_normal_key(key)),
    }
  }

  fn handle_search_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.search.clear();
        self.refresh_view();
      }
      KeyCode::Enter => {
        self.mode = Mode::Normal;
        let target = self.scene.focus().highlighted.clone();
        if target.is_some() {
          self.select_id(target);
        }
      }
      KeyCode::Backspace => {
        self.search.pop();
        self.cursor = 0;
        self.refresh_view();
      }
      KeyCode::Char(c) => {
        self.search.push(c);
        self.cursor = 0;
        self.refresh_view();
      }
      _ => {}
    }
    Ok(true)
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    self.mode = Mode::Normal;
    if key.code == KeyCode::Char('y') {
      self.delete_selected().await;
    } else {
      self.status_msg = "Delete cancelled".into();
    }
    Ok(true)
  }

  fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered().len();
        if len > 0 && self.cursor + 1 < len {
          self.cursor += 1;
        }
        self.select_cursor();
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
        self.select_cursor();
      }
      KeyCode::Esc => self.scene.select(None),

      KeyCode::Char('/') => {
        self.mode = Mode::Search;
        self.search.clear();
        self.cursor = 0;
        self.refresh_view();
      }

      KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom_by(ZOOM_STEP, (0.0, 0.0)),
      KeyCode::Char('-') => self.viewport.zoom_by(1.0 / ZOOM_STEP, (0.0, 0.0)),
      KeyCode::Char('H') => self.viewport.pan(PAN_STEP, 0.0),
      KeyCode::Char('L') => self.viewport.pan(-PAN_STEP, 0.0),
      KeyCode::Char('K') => self.viewport.pan(0.0, PAN_STEP),
      KeyCode::Char('J') => self.viewport.pan(0.0, -PAN_STEP),
      KeyCode::Char('0') => self.viewport.reset(),

      KeyCode::Char('d') => match self.selected() {
        Some(p) => {
          self.status_msg = format!("Delete {}? [y/N]", p.name);
          self.mode = Mode::ConfirmDelete;
        }
        None => self.status_msg = "Nothing selected".into(),
      },

      _ => {}
    }
    true
  }

  // ── Mouse handling ────────────────────────────────────────────────────────

  pub fn handle_mouse(&mut self, ev: MouseEvent) {
    match ev.kind {
      MouseEventKind::Down(MouseButton::Left) => {
        let Some(point) = self.to_world(ev.column, ev.row) else { return };
        if let Some(id) = self.scene.begin_drag(point) {
          self.select_id(Some(id));
        }
      }
      MouseEventKind::Drag(MouseButton::Left) => {
        if let Some(point) = self.to_world(ev.column, ev.row) {
          self.scene.drag_to(point);
        }
      }
      MouseEventKind::Up(MouseButton::Left) => self.scene.end_drag(),
      MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
        let Some(world) = self.to_world(ev.column, ev.row) else { return };
        let factor = if ev.kind == MouseEventKind::ScrollUp { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        let anchor = self.viewport.apply(world);
        self.viewport.zoom_by(factor, anchor);
      }
      _ => {}
    }
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  async fn delete_selected(&mut self) {
    let Some((id, name)) = self.selected().map(|p| (p.id.clone(), p.name.clone())) else {
      return;
    };
    match self.boundary.engine().delete_person(&id).await {
      Ok(people) => {
        self.scene.forget(&id);
        self.people = people;
        self.refresh_view();
        self.status_msg = format!("Deleted {name}");
      }
      Err(e) => {
        tracing::error!(error = %e, "delete failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }
}
