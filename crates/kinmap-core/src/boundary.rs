//! Checks that run before an intent reaches the engine.
//!
//! Names are validated here (empty, duplicate, case-insensitive collision)
//! and relationship-type deletion is guarded by a live usage count. A
//! rejected intent never touches the store.

use std::collections::BTreeMap;

use crate::{
  Result, ValidationError,
  defaults::{SELF_TAG, UNCLASSIFIED},
  engine::GraphEngine,
  model::{Person, RelationshipType},
  store::EntityStore,
};

// ─── Pure checks ─────────────────────────────────────────────────────────────

/// Number of references to each type name. Each person's primary
/// relationship counts once and each edge counts once. Every known type is
/// present (possibly with zero); names people use without a matching type
/// record are present too.
pub fn usage_counts(
  people: &[Person],
  types: &[RelationshipType],
) -> BTreeMap<String, usize> {
  let mut usage: BTreeMap<String, usize> =
    types.iter().map(|t| (t.name.clone(), 0)).collect();
  for p in people {
    *usage.entry(p.primary_relationship.clone()).or_default() += 1;
    for rel in &p.relationships {
      *usage.entry(rel.kind.clone()).or_default() += 1;
    }
  }
  usage
}

/// References to `name` across `people`.
pub fn usage_of(people: &[Person], name: &str) -> usize {
  people.iter().map(|p| p.type_references(name)).sum()
}

/// Case-insensitive name equality over full Unicode case folding.
fn same_name(a: &str, b: &str) -> bool { a.to_lowercase() == b.to_lowercase() }

/// Check a name for a new type. Returns the trimmed name.
pub fn validate_new_type(
  name: &str,
  existing: &[RelationshipType],
) -> Result<String, ValidationError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(ValidationError::EmptyTypeName);
  }
  if existing.iter().any(|t| same_name(&t.name, name)) {
    return Err(ValidationError::DuplicateTypeName(name.to_owned()));
  }
  Ok(name.to_owned())
}

/// Check the new name for an edited type currently called `old`. Changing
/// only the case of the name is allowed. Returns the trimmed name.
pub fn validate_rename(
  old: &str,
  new: &str,
  existing: &[RelationshipType],
) -> Result<String, ValidationError> {
  let new = new.trim();
  if new.is_empty() {
    return Err(ValidationError::EmptyTypeName);
  }
  if !same_name(new, old) && existing.iter().any(|t| same_name(&t.name, new))
  {
    return Err(ValidationError::DuplicateTypeName(new.to_owned()));
  }
  Ok(new.to_owned())
}

pub fn validate_person(person: &Person) -> Result<(), ValidationError> {
  if person.name.trim().is_empty() {
    return Err(ValidationError::EmptyName);
  }
  Ok(())
}

/// The bootstrap "self" person created at onboarding.
pub fn self_person(name: &str) -> Result<Person, ValidationError> {
  let name = name.trim();
  if name.is_empty() {
    return Err(ValidationError::EmptyName);
  }
  let mut me = Person::new(Person::fresh_id(), name).with_primary(UNCLASSIFIED);
  me.tags = vec![SELF_TAG.to_owned()];
  me.notes = Some("This is the root node representing the user.".to_owned());
  Ok(me)
}

// ─── Guarded entry points ────────────────────────────────────────────────────

/// The engine behind the presentation-level checks.
#[derive(Debug)]
pub struct Boundary<S> {
  engine: GraphEngine<S>,
}

impl<S: EntityStore> Boundary<S> {
  pub fn new(engine: GraphEngine<S>) -> Self { Self { engine } }

  pub fn engine(&self) -> &GraphEngine<S> { &self.engine }

  pub fn into_engine(self) -> GraphEngine<S> { self.engine }

  /// Onboarding is offered only while nobody has been recorded.
  pub async fn needs_onboarding(&self) -> Result<bool> {
    Ok(self.engine.people().await?.is_empty())
  }

  /// Create the bootstrap "self" person.
  pub async fn onboard(&self, name: &str) -> Result<Person> {
    let me = self_person(name)?;
    if !self.needs_onboarding().await? {
      return Err(ValidationError::AlreadyOnboarded.into());
    }
    self.engine.save_person(me.clone()).await?;
    Ok(me)
  }

  /// Save a person after trimming and checking the name.
  pub async fn save_person(&self, mut person: Person) -> Result<Vec<Person>> {
    validate_person(&person)?;
    person.name = person.name.trim().to_owned();
    self.engine.save_person(person).await
  }

  pub async fn add_relationship_type(
    &self,
    name: &str,
    color: &str,
  ) -> Result<Vec<RelationshipType>> {
    let existing = self.engine.relationship_types().await?;
    let name = validate_new_type(name, &existing)?;
    self
      .engine
      .save_relationship_type(RelationshipType::new(name, color), None)
      .await
  }

  /// Recolor and/or rename the type currently called `old_name`.
  pub async fn update_relationship_type(
    &self,
    old_name: &str,
    new_name: &str,
    color: &str,
  ) -> Result<Vec<RelationshipType>> {
    let existing = self.engine.relationship_types().await?;
    let name = validate_rename(old_name, new_name, &existing)?;
    self
      .engine
      .save_relationship_type(RelationshipType::new(name, color), Some(old_name))
      .await
  }

  /// Delete a type only when no person references it.
  pub async fn delete_relationship_type(&self, name: &str) -> Result<Vec<RelationshipType>> {
    let uses = usage_of(&self.engine.people().await?, name);
    if uses > 0 {
      return Err(ValidationError::TypeInUse { name: name.to_owned(), uses }.into());
    }
    self.engine.delete_relationship_type(name).await
  }
}
