//! Record types: people, the half-edges between them, and the relationship
//! types that label those edges.
//!
//! Field names on the wire match the backup documents written by earlier
//! releases (`primaryRelationship`, `bloodGroup`, `connected_to_id`), so old
//! exports import unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Relationship ────────────────────────────────────────────────────────────

/// A directed half-edge stored on the person it originates from. The other
/// endpoint is expected to carry the mirror edge with the same `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
  /// Name of a [`RelationshipType`]; copied verbatim onto the reciprocal
  /// edge, never inverted.
  #[serde(rename = "type")]
  pub kind:            String,
  pub connected_to_id: String,
}

impl Relationship {
  pub fn new(kind: impl Into<String>, connected_to_id: impl Into<String>) -> Self {
    Self { kind: kind.into(), connected_to_id: connected_to_id.into() }
  }
}

// ─── RelationshipType ────────────────────────────────────────────────────────

/// A named edge label with a display color. `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipType {
  pub name:  String,
  pub color: String,
}

impl RelationshipType {
  pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
    Self { name: name.into(), color: color.into() }
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// One node of the relationship graph.
///
/// List fields always exist (empty when absent in an imported document), so
/// no caller needs to special-case a missing array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  /// Opaque identity key; never changes after creation.
  pub id:                   String,
  pub name:                 String,
  #[serde(default)]
  pub aliases:              Vec<String>,
  #[serde(default)]
  pub tags:                 Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:                Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub blood_group:          Option<String>,
  /// Name of a [`RelationshipType`] used for the node color. Not an edge.
  #[serde(default)]
  pub primary_relationship: String,
  #[serde(default)]
  pub relationships:        Vec<Relationship>,
}

impl Person {
  /// A person with the given id and name and every other field empty.
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id:                   id.into(),
      name:                 name.into(),
      aliases:              Vec::new(),
      tags:                 Vec::new(),
      location:             None,
      notes:                None,
      blood_group:          None,
      primary_relationship: String::new(),
      relationships:        Vec::new(),
    }
  }

  /// Generate a fresh opaque id for a person about to be created.
  pub fn fresh_id() -> String { Uuid::new_v4().to_string() }

  /// Builder-style helper for tests and the CLI.
  pub fn with_primary(mut self, primary: impl Into<String>) -> Self {
    self.primary_relationship = primary.into();
    self
  }

  /// Whether any outgoing edge targets `id`.
  pub fn is_linked_to(&self, id: &str) -> bool {
    self.relationships.iter().any(|r| r.connected_to_id == id)
  }

  /// Append an edge. Duplicates are allowed, matching the stored model.
  pub fn link(&mut self, kind: impl Into<String>, id: impl Into<String>) {
    self.relationships.push(Relationship::new(kind, id));
  }

  /// Drop every edge targeting `id`. Returns `true` if anything was removed.
  pub fn unlink(&mut self, id: &str) -> bool {
    let before = self.relationships.len();
    self.relationships.retain(|r| r.connected_to_id != id);
    self.relationships.len() != before
  }

  /// Change the type on every edge targeting `id`. Returns `true` if any
  /// edge changed. The neighbor's reciprocal edge is left alone.
  pub fn retype(&mut self, id: &str, kind: &str) -> bool {
    let mut changed = false;
    for rel in self.relationships.iter_mut().filter(|r| r.connected_to_id == id) {
      if rel.kind != kind {
        rel.kind = kind.to_owned();
        changed = true;
      }
    }
    changed
  }

  /// Rewrite `old` to `new` in `primary_relationship` and every edge type.
  /// Returns `true` if the record changed.
  pub fn rename_type(&mut self, old: &str, new: &str) -> bool {
    let mut changed = false;
    if self.primary_relationship == old {
      self.primary_relationship = new.to_owned();
      changed = true;
    }
    for rel in self.relationships.iter_mut().filter(|r| r.kind == old) {
      rel.kind = new.to_owned();
      changed = true;
    }
    changed
  }

  /// Number of references this person makes to the type `name`, counting the
  /// primary relationship and each edge separately.
  pub fn type_references(&self, name: &str) -> usize {
    usize::from(self.primary_relationship == name)
      + self.relationships.iter().filter(|r| r.kind == name).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_lists_deserialize_empty() {
    let p: Person =
      serde_json::from_str(r#"{"id":"1","name":"Ann","primaryRelationship":"Friend"}"#)
        .unwrap();
    assert!(p.aliases.is_empty());
    assert!(p.tags.is_empty());
    assert!(p.relationships.is_empty());
    assert_eq!(p.blood_group, None);
  }

  #[test]
  fn wire_names_match_backup_format() {
    let mut p = Person::new("1", "Ann").with_primary("Friend");
    p.blood_group = Some("O+".into());
    p.link("Friend", "2");
    let v = serde_json::to_value(&p).unwrap();
    assert_eq!(v["primaryRelationship"], "Friend");
    assert_eq!(v["bloodGroup"], "O+");
    assert_eq!(v["relationships"][0]["type"], "Friend");
    assert_eq!(v["relationships"][0]["connected_to_id"], "2");
    assert!(v.get("location").is_none());
  }

  #[test]
  fn unlink_removes_all_edges_to_target() {
    let mut p = Person::new("1", "Ann");
    p.link("Friend", "2");
    p.link("Neighbor", "2");
    p.link("Friend", "3");
    assert!(p.unlink("2"));
    assert_eq!(p.relationships, vec![Relationship::new("Friend", "3")]);
    assert!(!p.unlink("2"));
  }

  #[test]
  fn rename_type_touches_primary_and_edges() {
    let mut p = Person::new("1", "Ann").with_primary("Friend");
    p.link("Friend", "2");
    p.link("Parent", "3");
    assert!(p.rename_type("Friend", "Buddy"));
    assert_eq!(p.primary_relationship, "Buddy");
    assert_eq!(p.relationships[0].kind, "Buddy");
    assert_eq!(p.relationships[1].kind, "Parent");
    assert!(!p.rename_type("Friend", "Buddy"));
  }

  #[test]
  fn type_references_counts_each_use() {
    let mut p = Person::new("1", "Ann").with_primary("Friend");
    p.link("Friend", "2");
    p.link("Friend", "3");
    assert_eq!(p.type_references("Friend"), 3);
    assert_eq!(p.type_references("Parent"), 0);
  }
}
