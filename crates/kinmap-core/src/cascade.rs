//! [`Cascade`] is the unit of work behind every multi-record mutation.
//!
//! The engine plans a mutation by staging writes into a cascade, reading
//! neighbors *through* it so later steps see earlier staged writes, and then
//! commits the writes to the store one at a time, in staging order. There is
//! no transaction spanning records: a failure mid-commit leaves the earlier
//! writes applied and the rest unapplied.

use crate::{
  Error, Result,
  model::{Person, RelationshipType},
  store::EntityStore,
};

/// One pending store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
  PutPerson(Person),
  DeletePerson(String),
  PutRelationshipType(RelationshipType),
  DeleteRelationshipType(String),
}

impl Write {
  fn person_key(&self) -> Option<&str> {
    match self {
      Self::PutPerson(p) => Some(&p.id),
      Self::DeletePerson(id) => Some(id),
      _ => None,
    }
  }

  fn type_key(&self) -> Option<&str> {
    match self {
      Self::PutRelationshipType(t) => Some(&t.name),
      Self::DeleteRelationshipType(name) => Some(name),
      _ => None,
    }
  }
}

/// An ordered, coalesced set of pending writes.
///
/// Staging a second write for a key already staged replaces the first one in
/// place, so each record is written at most once per commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
  writes: Vec<Write>,
}

impl Cascade {
  pub fn new() -> Self { Self::default() }

  pub fn writes(&self) -> &[Write] { &self.writes }

  pub fn len(&self) -> usize { self.writes.len() }

  pub fn is_empty(&self) -> bool { self.writes.is_empty() }

  /// Number of staged writes touching people other than `id`.
  pub fn neighbor_writes(&self, id: &str) -> usize {
    self
      .writes
      .iter()
      .filter_map(Write::person_key)
      .filter(|key| *key != id)
      .count()
  }

  // ── Staging ───────────────────────────────────────────────────────────

  pub fn put_person(&mut self, person: Person) {
    let id = person.id.clone();
    self.stage_person(&id, Write::PutPerson(person));
  }

  pub fn delete_person(&mut self, id: &str) {
    self.stage_person(id, Write::DeletePerson(id.to_owned()));
  }

  pub fn put_relationship_type(&mut self, rel_type: RelationshipType) {
    let name = rel_type.name.clone();
    self.stage_type(&name, Write::PutRelationshipType(rel_type));
  }

  pub fn delete_relationship_type(&mut self, name: &str) {
    self.stage_type(name, Write::DeleteRelationshipType(name.to_owned()));
  }

  fn stage_person(&mut self, id: &str, write: Write) {
    match self.writes.iter_mut().find(|w| w.person_key() == Some(id)) {
      Some(slot) => *slot = write,
      None => self.writes.push(write),
    }
  }

  fn stage_type(&mut self, name: &str, write: Write) {
    match self.writes.iter_mut().find(|w| w.type_key() == Some(name)) {
      Some(slot) => *slot = write,
      None => self.writes.push(write),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The staged state of person `id`: `Some(Some(_))` for a staged put,
  /// `Some(None)` for a staged delete, `None` if nothing is staged.
  pub fn staged_person(&self, id: &str) -> Option<Option<&Person>> {
    self.writes.iter().find_map(|w| match w {
      Write::PutPerson(p) if p.id == id => Some(Some(p)),
      Write::DeletePerson(key) if key == id => Some(None),
      _ => None,
    })
  }

  /// Read person `id` as it will be after this cascade commits: the staged
  /// state if any, otherwise the store's.
  pub async fn read_person<S: EntityStore>(
    &self,
    store: &S,
    id: &str,
  ) -> Result<Option<Person>> {
    if let Some(staged) = self.staged_person(id) {
      return Ok(staged.cloned());
    }
    store.get_person(id).await.map_err(Error::storage)
  }

  // ── Commit ────────────────────────────────────────────────────────────

  /// Apply every staged write in order, stopping at the first failure.
  /// Returns the number of writes applied.
  pub async fn commit<S: EntityStore>(self, store: &S) -> Result<usize> {
    let total = self.writes.len();
    for (applied, write) in self.writes.into_iter().enumerate() {
      let outcome = match write {
        Write::PutPerson(p) => store.put_person(p).await,
        Write::DeletePerson(id) => store.delete_person(&id).await,
        Write::PutRelationshipType(t) => store.put_relationship_type(t).await,
        Write::DeleteRelationshipType(name) => store.delete_relationship_type(&name).await,
      };
      if let Err(e) = outcome {
        tracing::warn!(applied, total, "cascade aborted by storage failure");
        return Err(Error::storage(e));
      }
    }
    Ok(total)
  }
}
