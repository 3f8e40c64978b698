//! The `EntityStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `kinmap-store-sqlite`
//! and [`crate::memory::MemoryStore`]). It is plain keyed CRUD over two
//! independent collections: people keyed by `id` and relationship types keyed
//! by `name`. Business rules live in [`crate::engine::GraphEngine`], never
//! here.

use std::future::Future;

use crate::model::{Person, RelationshipType};

/// Abstraction over a kinmap storage backend.
///
/// Every read must observe every committed write; backends keep no cache.
/// `put_*` is a full overwrite keyed by identity, never a merge. Deleting an
/// absent key is a no-op.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded async runtime.
pub trait EntityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  /// Every person, in storage order.
  fn all_people(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Point lookup. `None` is a normal outcome.
  fn get_person<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// Insert or fully overwrite the person with `person.id`.
  fn put_person(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_person<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Relationship types ────────────────────────────────────────────────

  /// Every relationship type, in storage order.
  fn all_relationship_types(
    &self,
  ) -> impl Future<Output = Result<Vec<RelationshipType>, Self::Error>> + Send + '_;

  fn get_relationship_type<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<RelationshipType>, Self::Error>> + Send + 'a;

  /// Insert or fully overwrite the type with `rel_type.name`.
  fn put_relationship_type(
    &self,
    rel_type: RelationshipType,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_relationship_type<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Whole-store operations ────────────────────────────────────────────

  /// Empty both collections. Readers see either everything or nothing.
  fn clear_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the entire contents with the given records. Readers never
  /// observe a mix of old and new records.
  fn bulk_replace(
    &self,
    people: Vec<Person>,
    types: Vec<RelationshipType>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
