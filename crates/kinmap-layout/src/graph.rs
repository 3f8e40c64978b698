//! Drawable nodes and links derived from a people snapshot.

use std::collections::{HashMap, HashSet};

use kinmap_core::model::{Person, RelationshipType};

use crate::color::Rgb;

/// One drawn person.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub id:    String,
  pub label: String,
  pub color: Rgb,
}

/// An undirected drawn line between two node indices, `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
  pub source: usize,
  pub target: usize,
}

/// Identity of a graph: which people are drawn and which pairs are linked.
/// Labels and colors are not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
  nodes: Vec<String>,
  links: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphData {
  pub nodes: Vec<Node>,
  pub links: Vec<Link>,
}

impl GraphData {
  /// Build from the visible people.
  ///
  /// Each node is filled with the color of its primary relationship type,
  /// or [`Rgb::UNMATCHED`]. Edges collapse to one link per unordered pair,
  /// whatever their direction, type, or multiplicity. Edges to people outside
  /// `visible` and edges from a person to itself are not drawn.
  pub fn build<'a, I>(visible: I, types: &[RelationshipType]) -> Self
  where
    I: IntoIterator<Item = &'a Person>,
  {
    let colors: HashMap<&str, &str> = types
      .iter()
      .map(|t| (t.name.as_str(), t.color.as_str()))
      .collect();

    let people: Vec<&Person> = visible.into_iter().collect();
    let index: HashMap<&str, usize> = people
      .iter()
      .enumerate()
      .map(|(i, p)| (p.id.as_str(), i))
      .collect();

    let nodes = people
      .iter()
      .map(|p| Node {
        id:    p.id.clone(),
        label: p.name.clone(),
        color: colors
          .get(p.primary_relationship.as_str())
          .map_or(Rgb::UNMATCHED, |c| Rgb::parse_or_unmatched(c)),
      })
      .collect();

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for (source, person) in people.iter().enumerate() {
      for rel in &person.relationships {
        let Some(&target) = index.get(rel.connected_to_id.as_str()) else {
          continue;
        };
        if target == source {
          continue;
        }
        let link = Link { source: source.min(target), target: source.max(target) };
        if seen.insert(link) {
          links.push(link);
        }
      }
    }

    Self { nodes, links }
  }

  pub fn signature(&self) -> Signature {
    let id = |i: usize| self.nodes[i].id.clone();
    let mut links: Vec<_> = self
      .links
      .iter()
      .map(|l| {
        let (a, b) = (id(l.source), id(l.target));
        if a <= b { (a, b) } else { (b, a) }
      })
      .collect();
    links.sort();
    Signature { nodes: self.nodes.iter().map(|n| n.id.clone()).collect(), links }
  }

  pub fn index_of(&self, id: &str) -> Option<usize> {
    self.nodes.iter().position(|n| n.id == id)
  }
}

#[cfg(test)]
mod tests {
  use kinmap_core::defaults::default_relationship_types;
  use proptest::prelude::*;

  use super::*;

  fn linked(id: &str, targets: &[&str]) -> Person {
    let mut p = Person::new(id, id.to_lowercase()).with_primary("Friend");
    for t in targets {
      p.link("Friend", *t);
    }
    p
  }

  #[test]
  fn colors_follow_primary_type() {
    let mut stranger = Person::new("S", "Stranger");
    stranger.primary_relationship = "Nemesis".into();
    let people = [linked("A", &[]), stranger];

    let g = GraphData::build(&people, &default_relationship_types());
    assert_eq!(g.nodes[0].color, Rgb(0x22, 0xc5, 0x5e));
    assert_eq!(g.nodes[1].color, Rgb::UNMATCHED);
    assert_eq!(g.nodes[1].label, "Stranger");
  }

  #[test]
  fn both_directions_collapse_to_one_link() {
    let people = [linked("A", &["B", "B"]), linked("B", &["A"])];
    let g = GraphData::build(&people, &[]);
    assert_eq!(g.links, vec![Link { source: 0, target: 1 }]);
  }

  #[test]
  fn hidden_targets_and_self_loops_are_skipped() {
    let people = [linked("A", &["A", "B", "ghost"]), linked("B", &["A"])];
    let only_a = GraphData::build(people.iter().take(1), &[]);
    assert_eq!(only_a.nodes.len(), 1);
    assert!(only_a.links.is_empty());
  }

  #[test]
  fn signature_ignores_labels_and_colors() {
    let before = [linked("A", &["B"]), linked("B", &["A"])];
    let mut after = before.clone();
    after[0].name = "Renamed".into();
    after[0].primary_relationship = "Parent".into();

    let types = default_relationship_types();
    let (g1, g2) = (GraphData::build(&before, &types), GraphData::build(&after, &types));
    assert_ne!(g1, g2);
    assert_eq!(g1.signature(), g2.signature());

    let unlinked = [linked("A", &[]), linked("B", &[])];
    assert_ne!(g1.signature(), GraphData::build(&unlinked, &types).signature());
  }

  proptest! {
    #[test]
    fn links_are_unique_unordered_pairs(
      edges in prop::collection::vec((0usize..6, 0usize..6), 0..40),
    ) {
      let ids = ["A", "B", "C", "D", "E", "F"];
      let mut people: Vec<Person> = ids.iter().map(|id| linked(id, &[])).collect();
      for &(from, to) in &edges {
        people[from].link("Friend", ids[to]);
      }

      let g = GraphData::build(&people, &[]);
      let mut pairs = HashSet::new();
      for l in &g.links {
        prop_assert!(l.source < l.target);
        prop_assert!(pairs.insert((l.source, l.target)));
      }

      let expected: HashSet<_> = edges
        .iter()
        .filter(|(a, b)| a != b)
        .map(|&(a, b)| (a.min(b), a.max(b)))
        .collect();
      prop_assert_eq!(pairs, expected);
    }
  }
}
