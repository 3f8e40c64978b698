//! [`MemoryStore`] is a non-durable [`EntityStore`] for tests and throwaway
//! sessions.

use std::{
  convert::Infallible,
  sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
  model::{Person, RelationshipType},
  store::EntityStore,
};

#[derive(Debug, Default)]
struct Collections {
  people: Vec<Person>,
  types:  Vec<RelationshipType>,
}

/// An in-process store. Records keep insertion order; an overwrite keeps the
/// record's original position.
#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: Mutex<Collections>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// A store pre-populated with `people` and `types`.
  pub fn with_records(people: Vec<Person>, types: Vec<RelationshipType>) -> Self {
    Self { inner: Mutex::new(Collections { people, types }) }
  }

  fn lock(&self) -> MutexGuard<'_, Collections> {
    // Poisoning is ignored; every write replaces whole records.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn upsert<T>(items: &mut Vec<T>, item: T, same_key: impl Fn(&T) -> bool) {
  match items.iter_mut().find(|existing| same_key(existing)) {
    Some(slot) => *slot = item,
    None => items.push(item),
  }
}

impl EntityStore for MemoryStore {
  type Error = Infallible;

  async fn all_people(&self) -> Result<Vec<Person>, Infallible> {
    Ok(self.lock().people.clone())
  }

  async fn get_person(&self, id: &str) -> Result<Option<Person>, Infallible> {
    Ok(self.lock().people.iter().find(|p| p.id == id).cloned())
  }

  async fn put_person(&self, person: Person) -> Result<(), Infallible> {
    let id = person.id.clone();
    upsert(&mut self.lock().people, person, |p| p.id == id);
    Ok(())
  }

  async fn delete_person(&self, id: &str) -> Result<(), Infallible> {
    self.lock().people.retain(|p| p.id != id);
    Ok(())
  }

  async fn all_relationship_types(&self) -> Result<Vec<RelationshipType>, Infallible> {
    Ok(self.lock().types.clone())
  }

  async fn get_relationship_type(
    &self,
    name: &str,
  ) -> Result<Option<RelationshipType>, Infallible> {
    Ok(self.lock().types.iter().find(|t| t.name == name).cloned())
  }

  async fn put_relationship_type(&self, rel_type: RelationshipType) -> Result<(), Infallible> {
    let name = rel_type.name.clone();
    upsert(&mut self.lock().types, rel_type, |t| t.name == name);
    Ok(())
  }

  async fn delete_relationship_type(&self, name: &str) -> Result<(), Infallible> {
    self.lock().types.retain(|t| t.name != name);
    Ok(())
  }

  async fn clear_all(&self) -> Result<(), Infallible> {
    let mut inner = self.lock();
    inner.people.clear();
    inner.types.clear();
    Ok(())
  }

  async fn bulk_replace(
    &self,
    people: Vec<Person>,
    types: Vec<RelationshipType>,
  ) -> Result<(), Infallible> {
    let mut inner = self.lock();
    inner.people.clear();
    inner.types.clear();
    for person in people {
      let id = person.id.clone();
      upsert(&mut inner.people, person, |p| p.id == id);
    }
    for rel_type in types {
      let name = rel_type.name.clone();
      upsert(&mut inner.types, rel_type, |t| t.name == name);
    }
    Ok(())
  }
}
