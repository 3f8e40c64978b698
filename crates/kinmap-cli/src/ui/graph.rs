//! Graph pane: the force layout drawn on a braille canvas.

use kinmap_core::store::EntityStore;
use kinmap_layout::Rgb;
use ratatui::{
  Frame,
  layout::Rect,
  style::Style,
  symbols::Marker,
  text::Span,
  widgets::canvas::{Canvas, Circle, Line as Segment, Points},
};

use super::{pane_block, rgb};
use crate::app::{App, CELL_H, CELL_W};

/// Label baseline below the node center, in layout units.
const LABEL_OFFSET: f64 = 35.0;
/// Spacing of the dots that fill a node.
const FILL_STEP: f64 = 3.0;

pub fn draw<S: EntityStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let mut title = format!(" Graph {:.0}% ", app.viewport.k * 100.0);
  if app.is_animating() {
    title.push_str("· settling ");
  }
  let block = pane_block(&title);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let (w, h) = (inner.width as f64 * CELL_W, inner.height as f64 * CELL_H);
  let k = app.viewport.k;
  // Canvas y grows upward.
  let place = |world: (f64, f64)| {
    let (x, y) = app.to_screen(world);
    (x, h - y)
  };

  let canvas = Canvas::default()
    .marker(Marker::Braille)
    .x_bounds([0.0, w])
    .y_bounds([0.0, h])
    .paint(move |ctx| {
      for (a, b) in app.scene.links() {
        let ((x1, y1), (x2, y2)) = (place(a), place(b));
        ctx.draw(&Segment { x1, y1, x2, y2, color: rgb(Rgb::EDGE) });
      }
      ctx.layer();

      for d in app.scene.nodes() {
        let (x, y) = place((d.body.x, d.body.y));
        let r = d.style.radius * k;
        ctx.draw(&Points { coords: &disc(x, y, r), color: rgb(d.node.color) });
        if let Some(outline) = d.style.outline {
          let radius = r + d.style.outline_width * k / 2.0;
          ctx.draw(&Circle { x, y, radius, color: rgb(outline) });
        }
      }
      ctx.layer();

      for d in app.scene.nodes() {
        let (x, y) = place((d.body.x, d.body.y));
        let half = d.node.label.chars().count() as f64 * CELL_W / 2.0;
        ctx.print(
          x - half,
          y - LABEL_OFFSET * k,
          Span::styled(d.node.label.clone(), Style::default().fg(rgb(Rgb::LABEL))),
        );
      }
    });

  f.render_widget(canvas, inner);
}

/// Grid points covering a filled circle.
fn disc(cx: f64, cy: f64, r: f64) -> Vec<(f64, f64)> {
  let steps = (r / FILL_STEP).ceil() as i32;
  let mut coords = Vec::new();
  for i in -steps..=steps {
    for j in -steps..=steps {
      let (dx, dy) = (i as f64 * FILL_STEP, j as f64 * FILL_STEP);
      if dx * dx + dy * dy <= r * r {
        coords.push((cx + dx, cy + dy));
      }
    }
  }
  coords
}
