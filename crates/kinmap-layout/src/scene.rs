//! [`Scene`] is the live layout a frontend draws from.
//!
//! A scene owns one [`Simulation`] at a time. [`Scene::sync`] starts a fresh
//! one only when the set of drawn people or linked pairs changes; renames and
//! recolors are applied in place, and focus changes never touch the physics.

use kinmap_core::model::{Person, RelationshipType};

use crate::{
  graph::{GraphData, Node, Signature},
  simulation::{Body, ForceConfig, Simulation},
  style::{Focus, NodeStyle},
};

/// A node ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawNode<'a> {
  pub node:  &'a Node,
  pub body:  &'a Body,
  pub style: NodeStyle,
}

#[derive(Debug, Clone)]
pub struct Scene {
  config:     ForceConfig,
  center:     (f64, f64),
  graph:      GraphData,
  signature:  Signature,
  sim:        Simulation,
  generation: u64,
  focus:      Focus,
  dragging:   Option<usize>,
}

impl Scene {
  pub fn new(config: ForceConfig, center: (f64, f64)) -> Self {
    Self {
      config,
      center,
      graph: GraphData::default(),
      signature: Signature::default(),
      sim: Simulation::new(0, &[], config, center),
      generation: 0,
      focus: Focus::default(),
      dragging: None,
    }
  }

  /// Bring the scene up to date with the visible people. Returns `true` when
  /// the simulation was rebuilt from scratch.
  pub fn sync<'a, I>(&mut self, visible: I, types: &[RelationshipType]) -> bool
  where
    I: IntoIterator<Item = &'a Person>,
  {
    let graph = GraphData::build(visible, types);
    let signature = graph.signature();

    if signature == self.signature && self.generation > 0 {
      self.graph = graph;
      return false;
    }

    self.sim = Simulation::new(graph.nodes.len(), &graph.links, self.config, self.center);
    self.graph = graph;
    self.signature = signature;
    self.generation += 1;
    self.dragging = None;
    tracing::debug!(
      generation = self.generation,
      nodes = self.graph.nodes.len(),
      links = self.graph.links.len(),
      "rebuilt layout"
    );
    true
  }

  /// Bumped on every rebuild.
  pub fn generation(&self) -> u64 { self.generation }

  pub fn graph(&self) -> &GraphData { &self.graph }

  pub fn simulation(&self) -> &Simulation { &self.sim }

  pub fn is_settled(&self) -> bool { self.sim.is_settled() }

  /// Step the physics unless it is at rest. Returns whether it moved.
  pub fn tick(&mut self) -> bool {
    if self.sim.is_settled() {
      return false;
    }
    self.sim.tick();
    true
  }

  /// Run to rest, bounded by `max_ticks`.
  pub fn settle(&mut self, max_ticks: usize) -> usize { self.sim.run_to_rest(max_ticks) }

  pub fn set_center(&mut self, center: (f64, f64)) {
    self.center = center;
    self.sim.set_center(center);
  }

  // ── Focus ─────────────────────────────────────────────────────────────

  pub fn focus(&self) -> &Focus { &self.focus }

  pub fn select(&mut self, id: Option<String>) { self.focus.selected = id; }

  pub fn highlight(&mut self, id: Option<String>) { self.focus.highlighted = id; }

  /// See [`Focus::forget`].
  pub fn forget(&mut self, id: &str) -> bool { self.focus.forget(id) }

  // ── Drawing ───────────────────────────────────────────────────────────

  pub fn nodes(&self) -> impl Iterator<Item = DrawNode<'_>> {
    self
      .graph
      .nodes
      .iter()
      .zip(self.sim.bodies())
      .map(|(node, body)| DrawNode { node, body, style: self.focus.style_for(&node.id) })
  }

  /// Link endpoints in layout space.
  pub fn links(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
    let bodies = self.sim.bodies();
    self.graph.links.iter().filter_map(move |l| {
      let (s, t) = (bodies.get(l.source)?, bodies.get(l.target)?);
      Some(((s.x, s.y), (t.x, t.y)))
    })
  }

  pub fn position(&self, id: &str) -> Option<(f64, f64)> {
    let b = self.sim.body(self.graph.index_of(id)?)?;
    Some((b.x, b.y))
  }

  // ── Pointer ───────────────────────────────────────────────────────────

  /// The topmost node whose circle contains the layout-space `point`.
  pub fn node_at(&self, (px, py): (f64, f64)) -> Option<&str> {
    self
      .nodes()
      .filter(|d| {
        let (dx, dy) = (d.body.x - px, d.body.y - py);
        dx * dx + dy * dy <= d.style.radius * d.style.radius
      })
      .last()
      .map(|d| d.node.id.as_str())
  }

  /// Pin the node under `point` to the pointer. Returns its id.
  pub fn begin_drag(&mut self, point: (f64, f64)) -> Option<String> {
    let id = self.node_at(point)?.to_owned();
    let index = self.graph.index_of(&id)?;
    self.sim.drag_start(index);
    self.sim.drag_to(index, point.0, point.1);
    self.dragging = Some(index);
    Some(id)
  }

  pub fn drag_to(&mut self, (x, y): (f64, f64)) {
    if let Some(index) = self.dragging {
      self.sim.drag_to(index, x, y);
    }
  }

  pub fn end_drag(&mut self) {
    if let Some(index) = self.dragging.take() {
      self.sim.drag_end(index);
    }
  }

  pub fn is_dragging(&self) -> bool { self.dragging.is_some() }
}

#[cfg(test)]
mod tests {
  use kinmap_core::defaults::default_relationship_types;

  use super::*;
  use crate::{color::Rgb, style::EMPHASIZED_RADIUS};

  fn people() -> Vec<Person> {
    let mut a = Person::new("A", "Alice").with_primary("Friend");
    let mut b = Person::new("B", "Bob").with_primary("Friend");
    let c = Person::new("C", "Cara");
    a.link("Friend", "B");
    b.link("Friend", "A");
    vec![a, b, c]
  }

  fn synced() -> Scene {
    let mut scene = Scene::new(ForceConfig::default(), (0.0, 0.0));
    assert!(scene.sync(&people(), &default_relationship_types()));
    scene.settle(1_000);
    scene
  }

  #[test]
  fn same_graph_does_not_rebuild() {
    let mut scene = synced();
    let before = scene.position("A");
    assert!(!scene.sync(&people(), &default_relationship_types()));
    assert_eq!(scene.generation(), 1);
    assert_eq!(scene.position("A"), before);
  }

  #[test]
  fn relabel_and_recolor_apply_in_place() {
    let mut scene = synced();
    let before = scene.position("A");
    let mut changed = people();
    changed[0].name = "Alicia".into();
    changed[0].primary_relationship = "Nemesis".into();

    assert!(!scene.sync(&changed, &default_relationship_types()));
    let a = &scene.graph().nodes[0];
    assert_eq!((a.label.as_str(), a.color), ("Alicia", Rgb::UNMATCHED));
    assert_eq!(scene.position("A"), before);
  }

  #[test]
  fn new_edge_rebuilds_from_scratch() {
    let mut scene = synced();
    let mut changed = people();
    changed[2].link("Friend", "A");

    assert!(scene.sync(&changed, &default_relationship_types()));
    assert_eq!(scene.generation(), 2);
    assert_eq!(scene.simulation().ticks(), 0);
    assert_eq!(scene.links().count(), 2);
  }

  #[test]
  fn filtered_subset_drops_hidden_endpoints() {
    let mut scene = synced();
    let all = people();
    assert!(scene.sync(all.iter().filter(|p| p.id != "B"), &[]));
    assert_eq!(scene.graph().nodes.len(), 2);
    assert_eq!(scene.links().count(), 0);
  }

  #[test]
  fn focus_changes_restyle_without_rebuild() {
    let mut scene = synced();
    let ticks = scene.simulation().ticks();
    scene.select(Some("A".into()));
    scene.highlight(Some("C".into()));

    let styles: Vec<_> = scene.nodes().map(|d| (d.node.id.clone(), d.style)).collect();
    assert_eq!(styles[0].1.outline, Some(Rgb::SELECTED));
    assert_eq!(styles[1].1, NodeStyle::PLAIN);
    assert_eq!(styles[2].1.outline, Some(Rgb::HIGHLIGHTED));
    assert_eq!(styles[2].1.radius, EMPHASIZED_RADIUS);
    assert_eq!(scene.generation(), 1);
    assert_eq!(scene.simulation().ticks(), ticks);
  }

  #[test]
  fn hit_test_and_drag_pin_node() {
    let mut scene = synced();
    let at = scene.position("C").unwrap();
    assert_eq!(scene.node_at((at.0 + 5.0, at.1 - 5.0)), Some("C"));
    assert_eq!(scene.node_at((at.0 + 500.0, at.1)), None);

    assert_eq!(scene.begin_drag(at).as_deref(), Some("C"));
    assert!(!scene.is_settled());
    scene.drag_to((300.0, 300.0));
    for _ in 0..10 {
      scene.tick();
    }
    assert_eq!(scene.position("C"), Some((300.0, 300.0)));

    scene.end_drag();
    assert!(!scene.is_dragging());
    scene.settle(10_000);
    assert!(scene.is_settled());
    assert!(!scene.tick());
  }

  #[test]
  fn forgetting_selection_is_reported() {
    let mut scene = synced();
    scene.select(Some("B".into()));
    assert!(scene.forget("B"));
    assert_eq!(scene.focus().selected, None);
  }
}
