//! The relationship types seeded into a freshly created store.

use crate::model::RelationshipType;

/// Type assigned to the onboarding "self" person and used as the fallback
/// primary relationship for new people.
pub const UNCLASSIFIED: &str = "Unknown/Unclassified";

/// Tag carried by the onboarding "self" person.
pub const SELF_TAG: &str = "me";

/// `(name, color)` pairs, in display order.
pub const DEFAULT_RELATIONSHIP_TYPES: &[(&str, &str)] = &[
  ("Parent", "#e11d48"),
  ("Child", "#f43f5e"),
  ("Sibling", "#fb7185"),
  ("Spouse", "#ec4899"),
  ("Grandparent", "#be123c"),
  ("Grandchild", "#fda4af"),
  ("Aunt/Uncle", "#f97316"),
  ("Cousin", "#fb923c"),
  ("Niece/Nephew", "#fdba74"),
  ("Sister-in-law", "#d946ef"),
  ("Brother-in-law", "#c026d3"),
  ("Mother-in-law", "#a21caf"),
  ("Father-in-law", "#86198f"),
  ("Friend", "#22c55e"),
  ("Romantic", "#db2777"),
  ("Professional/Work", "#3b82f6"),
  ("Neighbor", "#8b5cf6"),
  ("Event-based", "#a16207"),
  (UNCLASSIFIED, "#a3a3a3"),
];

pub fn default_relationship_types() -> Vec<RelationshipType> {
  DEFAULT_RELATIONSHIP_TYPES
    .iter()
    .map(|(name, color)| RelationshipType::new(*name, *color))
    .collect()
}
