//! A velocity-Verlet force simulation in the style of d3-force.
//!
//! Four forces act on every tick, in order:
//!
//! - **link**: springs along each [`Link`] toward `link_distance`, weighted
//!   by endpoint degree so hubs move less.
//! - **charge**: pairwise repulsion between all bodies (exact, no quadtree).
//! - **center**: translates the whole layout so its mean sits on the center.
//! - **collide**: pushes apart bodies closer than twice `collide_radius`.
//!
//! The simulation cools as `alpha` decays toward `alpha_target`, and is at
//! rest once `alpha` drops below [`ALPHA_MIN`] with nothing holding it warm.
//! Dragging raises the target so the graph keeps reacting until release.

use std::f64::consts::PI;

use serde::Deserialize;

use crate::graph::Link;

pub const ALPHA_MIN: f64 = 0.001;
pub const VELOCITY_DECAY: f64 = 0.4;
pub const DRAG_ALPHA_TARGET: f64 = 0.3;

const INITIAL_RADIUS: f64 = 10.0;
const MIN_DISTANCE_SQ: f64 = 1.0;

/// Roughly 300 ticks from a cold start to rest.
fn alpha_decay() -> f64 { 1.0 - ALPHA_MIN.powf(1.0 / 300.0) }

/// Force tuning. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
  pub link_distance:   f64,
  pub charge_strength: f64,
  pub center_strength: f64,
  pub collide_radius:  f64,
}

impl Default for ForceConfig {
  fn default() -> Self {
    Self {
      link_distance:   100.0,
      charge_strength: -300.0,
      center_strength: 1.0,
      collide_radius:  30.0,
    }
  }
}

/// Position and velocity of one node. `fx`/`fy` pin it in place.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
  pub x:  f64,
  pub y:  f64,
  pub vx: f64,
  pub vy: f64,
  pub fx: Option<f64>,
  pub fy: Option<f64>,
}

impl Body {
  pub fn is_pinned(&self) -> bool { self.fx.is_some() || self.fy.is_some() }
}

/// Linear congruential generator for the sub-pixel jitter that separates
/// coincident bodies. Seeded identically for every simulation.
#[derive(Debug, Clone)]
struct Lcg(u64);

impl Lcg {
  const A: u64 = 1_664_525;
  const C: u64 = 1_013_904_223;
  const M: u64 = 1 << 32;

  fn new() -> Self { Self(1) }

  fn next_f64(&mut self) -> f64 {
    self.0 = (Self::A * self.0 + Self::C) % Self::M;
    self.0 as f64 / Self::M as f64
  }

  fn jiggle(&mut self) -> f64 { (self.next_f64() - 0.5) * 1e-6 }
}

#[derive(Debug, Clone)]
pub struct Simulation {
  bodies:       Vec<Body>,
  links:        Vec<Link>,
  strengths:    Vec<f64>,
  bias:         Vec<f64>,
  config:       ForceConfig,
  center:       (f64, f64),
  alpha:        f64,
  alpha_target: f64,
  alpha_decay:  f64,
  rng:          Lcg,
  ticks:        u64,
}

impl Simulation {
  /// Place `count` bodies on a phyllotaxis spiral around `center`.
  ///
  /// Links with an endpoint out of range are ignored.
  pub fn new(count: usize, links: &[Link], config: ForceConfig, center: (f64, f64)) -> Self {
    let golden = PI * (3.0 - 5f64.sqrt());
    let bodies = (0..count)
      .map(|i| {
        let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
        let angle = i as f64 * golden;
        Body {
          x: center.0 + radius * angle.cos(),
          y: center.1 + radius * angle.sin(),
          ..Body::default()
        }
      })
      .collect();

    let links: Vec<Link> = links
      .iter()
      .copied()
      .filter(|l| l.source < count && l.target < count && l.source != l.target)
      .collect();

    let mut degree = vec![0usize; count];
    for l in &links {
      degree[l.source] += 1;
      degree[l.target] += 1;
    }
    let strengths = links
      .iter()
      .map(|l| 1.0 / degree[l.source].min(degree[l.target]) as f64)
      .collect();
    let bias = links
      .iter()
      .map(|l| {
        let (s, t) = (degree[l.source] as f64, degree[l.target] as f64);
        s / (s + t)
      })
      .collect();

    Self {
      bodies,
      links,
      strengths,
      bias,
      config,
      center,
      alpha: 1.0,
      alpha_target: 0.0,
      alpha_decay: alpha_decay(),
      rng: Lcg::new(),
      ticks: 0,
    }
  }

  pub fn bodies(&self) -> &[Body] { &self.bodies }

  pub fn body(&self, index: usize) -> Option<&Body> { self.bodies.get(index) }

  pub fn links(&self) -> &[Link] { &self.links }

  pub fn alpha(&self) -> f64 { self.alpha }

  pub fn ticks(&self) -> u64 { self.ticks }

  pub fn config(&self) -> &ForceConfig { &self.config }

  /// Nothing left to animate: cooled down and nobody holding it warm.
  pub fn is_settled(&self) -> bool {
    self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
  }

  pub fn set_center(&mut self, center: (f64, f64)) { self.center = center; }

  /// Warm the simulation back up to `alpha`.
  pub fn reheat(&mut self, alpha: f64) { self.alpha = self.alpha.max(alpha); }

  /// Advance one step.
  pub fn tick(&mut self) {
    self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
    let alpha = self.alpha;

    self.apply_links(alpha);
    self.apply_charge(alpha);
    self.apply_center();
    self.apply_collide();

    let keep = 1.0 - VELOCITY_DECAY;
    for b in &mut self.bodies {
      match b.fx {
        Some(fx) => {
          b.x = fx;
          b.vx = 0.0;
        }
        None => {
          b.vx *= keep;
          b.x += b.vx;
        }
      }
      match b.fy {
        Some(fy) => {
          b.y = fy;
          b.vy = 0.0;
        }
        None => {
          b.vy *= keep;
          b.y += b.vy;
        }
      }
    }
    self.ticks += 1;
  }

  /// Tick until settled or `max_ticks` have run. Returns the ticks taken.
  pub fn run_to_rest(&mut self, max_ticks: usize) -> usize {
    let mut n = 0;
    while n < max_ticks && !self.is_settled() {
      self.tick();
      n += 1;
    }
    n
  }

  // ── Dragging ──────────────────────────────────────────────────────────

  /// Pin `index` where it is and keep the simulation warm.
  pub fn drag_start(&mut self, index: usize) {
    let Some(b) = self.bodies.get_mut(index) else { return };
    b.fx = Some(b.x);
    b.fy = Some(b.y);
    self.alpha_target = DRAG_ALPHA_TARGET;
  }

  /// Move the pin of `index` to the pointer.
  pub fn drag_to(&mut self, index: usize, x: f64, y: f64) {
    let Some(b) = self.bodies.get_mut(index) else { return };
    b.fx = Some(x);
    b.fy = Some(y);
  }

  /// Release `index` back into the simulation and let it cool.
  pub fn drag_end(&mut self, index: usize) {
    if let Some(b) = self.bodies.get_mut(index) {
      b.fx = None;
      b.fy = None;
    }
    self.alpha_target = 0.0;
  }

  // ── Forces ────────────────────────────────────────────────────────────

  fn apply_links(&mut self, alpha: f64) {
    for (i, link) in self.links.iter().enumerate() {
      let (s, t) = (self.bodies[link.source], self.bodies[link.target]);
      let mut x = t.x + t.vx - s.x - s.vx;
      let mut y = t.y + t.vy - s.y - s.vy;
      if x == 0.0 {
        x = self.rng.jiggle();
      }
      if y == 0.0 {
        y = self.rng.jiggle();
      }
      let l = (x * x + y * y).sqrt();
      let l = (l - self.config.link_distance) / l * alpha * self.strengths[i];
      let (x, y) = (x * l, y * l);

      let b = self.bias[i];
      let target = &mut self.bodies[link.target];
      target.vx -= x * b;
      target.vy -= y * b;
      let source = &mut self.bodies[link.source];
      source.vx += x * (1.0 - b);
      source.vy += y * (1.0 - b);
    }
  }

  fn apply_charge(&mut self, alpha: f64) {
    let strength = self.config.charge_strength;
    let n = self.bodies.len();
    for i in 0..n {
      let (xi, yi) = (self.bodies[i].x, self.bodies[i].y);
      let (mut dvx, mut dvy) = (0.0, 0.0);
      for j in 0..n {
        if i == j {
          continue;
        }
        let mut x = self.bodies[j].x - xi;
        let mut y = self.bodies[j].y - yi;
        let mut l = x * x + y * y;
        if x == 0.0 {
          x = self.rng.jiggle();
          l += x * x;
        }
        if y == 0.0 {
          y = self.rng.jiggle();
          l += y * y;
        }
        if l < MIN_DISTANCE_SQ {
          l = (MIN_DISTANCE_SQ * l).sqrt();
        }
        dvx += x * strength * alpha / l;
        dvy += y * strength * alpha / l;
      }
      self.bodies[i].vx += dvx;
      self.bodies[i].vy += dvy;
    }
  }

  fn apply_center(&mut self) {
    let n = self.bodies.len();
    if n == 0 {
      return;
    }
    let (sx, sy) = self
      .bodies
      .iter()
      .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
    let k = self.config.center_strength;
    let dx = (sx / n as f64 - self.center.0) * k;
    let dy = (sy / n as f64 - self.center.1) * k;
    for b in &mut self.bodies {
      b.x -= dx;
      b.y -= dy;
    }
  }

  fn apply_collide(&mut self) {
    let r = self.config.collide_radius;
    let reach = r + r;
    let n = self.bodies.len();
    for i in 0..n {
      let node = self.bodies[i];
      let (xi, yi) = (node.x + node.vx, node.y + node.vy);
      for j in (i + 1)..n {
        let other = self.bodies[j];
        let mut x = xi - other.x - other.vx;
        let mut y = yi - other.y - other.vy;
        let mut l = x * x + y * y;
        if l >= reach * reach {
          continue;
        }
        if x == 0.0 {
          x = self.rng.jiggle();
          l += x * x;
        }
        if y == 0.0 {
          y = self.rng.jiggle();
          l += y * y;
        }
        let d = l.sqrt();
        let push = (reach - d) / d;
        // Equal radii: each side takes half.
        let (x, y) = (x * push * 0.5, y * push * 0.5);
        self.bodies[i].vx += x;
        self.bodies[i].vy += y;
        self.bodies[j].vx -= x;
        self.bodies[j].vy -= y;
      }
    }
  }
}
