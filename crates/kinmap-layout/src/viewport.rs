//! Pan and zoom. A [`Viewport`] maps layout space to screen space and never
//! touches node positions.

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 4.0;

/// `screen = world * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub k: f64,
  pub x: f64,
  pub y: f64,
}

impl Default for Viewport {
  fn default() -> Self { Self::IDENTITY }
}

impl Viewport {
  pub const IDENTITY: Viewport = Viewport { k: 1.0, x: 0.0, y: 0.0 };

  pub fn apply(&self, (wx, wy): (f64, f64)) -> (f64, f64) {
    (wx * self.k + self.x, wy * self.k + self.y)
  }

  pub fn invert(&self, (sx, sy): (f64, f64)) -> (f64, f64) {
    ((sx - self.x) / self.k, (sy - self.y) / self.k)
  }

  /// Scale by `factor`, clamped to [`MIN_SCALE`]..=[`MAX_SCALE`], keeping the
  /// layout point under the screen point `anchor` fixed.
  pub fn zoom_by(&mut self, factor: f64, anchor: (f64, f64)) {
    let world = self.invert(anchor);
    self.k = (self.k * factor).clamp(MIN_SCALE, MAX_SCALE);
    self.x = anchor.0 - world.0 * self.k;
    self.y = anchor.1 - world.1 * self.k;
  }

  /// Shift by a screen-space delta.
  pub fn pan(&mut self, dx: f64, dy: f64) {
    self.x += dx;
    self.y += dy;
  }

  pub fn reset(&mut self) { *self = Self::IDENTITY; }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
  }

  #[test]
  fn zoom_keeps_anchor_fixed() {
    let mut v = Viewport::default();
    v.pan(30.0, -10.0);
    let anchor = (200.0, 150.0);
    let under = v.invert(anchor);

    v.zoom_by(2.5, anchor);
    assert!(close(v.apply(under), anchor));
    assert!(close(v.invert(v.apply((7.0, 9.0))), (7.0, 9.0)));
  }

  #[test]
  fn scale_is_clamped() {
    let mut v = Viewport::default();
    for _ in 0..20 {
      v.zoom_by(2.0, (0.0, 0.0));
    }
    assert_eq!(v.k, MAX_SCALE);
    for _ in 0..40 {
      v.zoom_by(0.5, (0.0, 0.0));
    }
    assert_eq!(v.k, MIN_SCALE);
  }

  #[test]
  fn reset_restores_identity() {
    let mut v = Viewport::default();
    v.zoom_by(3.0, (10.0, 10.0));
    v.pan(5.0, 5.0);
    v.reset();
    assert_eq!(v, Viewport::IDENTITY);
  }
}
