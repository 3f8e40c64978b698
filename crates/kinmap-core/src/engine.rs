//! [`GraphEngine`] is the only component that mutates more than one record in
//! response to a single intent.
//!
//! Invariants maintained across the store:
//!
//! - **Symmetry.** When a person gains an edge to an existing neighbor, the
//!   neighbor gains the mirror edge with the same type string.
//! - **No dangling after delete.** Deleting a person strips every edge that
//!   points at it.
//! - **Type references follow renames.** Renaming a relationship type rewrites
//!   the name wherever people use it, then removes the old type record.
//!
//! Each mutation is planned into a [`Cascade`] first (reads only) and then
//! committed write by write. The `plan_*` methods expose the cascade so
//! callers and tests can inspect exactly what a mutation will write.

use std::collections::HashSet;

use crate::{
  Error, Result,
  cascade::Cascade,
  model::{Person, RelationshipType},
  snapshot::Snapshot,
  store::EntityStore,
};

/// The consistency engine over a store handle it owns for its lifetime.
#[derive(Debug)]
pub struct GraphEngine<S> {
  store: S,
}

impl<S: EntityStore> GraphEngine<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Give the store handle back, e.g. to close it at shutdown.
  pub fn into_store(self) -> S { self.store }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Full snapshot of both collections.
  pub async fn load_all(&self) -> Result<Snapshot> {
    Ok(Snapshot {
      people:             self.people().await?,
      relationship_types: self.relationship_types().await?,
    })
  }

  pub async fn people(&self) -> Result<Vec<Person>> {
    self.store.all_people().await.map_err(Error::storage)
  }

  pub async fn relationship_types(&self) -> Result<Vec<RelationshipType>> {
    self.store.all_relationship_types().await.map_err(Error::storage)
  }

  pub async fn person(&self, id: &str) -> Result<Option<Person>> {
    self.store.get_person(id).await.map_err(Error::storage)
  }

  // ── People ────────────────────────────────────────────────────────────

  /// Plan saving `person` as the new authoritative state of its record.
  ///
  /// The cascade puts `person`, appends a reciprocal edge (same type) to each
  /// existing neighbor that does not already link back, and strips the edges
  /// pointing back from neighbors that `person` no longer targets. Edges to
  /// unknown ids stay on `person` untouched. Changing the type of an edge to a
  /// neighbor that is still targeted does not touch that neighbor.
  pub async fn plan_save_person(&self, person: Person) -> Result<Cascade> {
    let prior = self.person(&person.id).await?;
    let id = person.id.clone();
    let mut cascade = Cascade::new();
    cascade.put_person(person.clone());

    for rel in &person.relationships {
      match cascade.read_person(&self.store, &rel.connected_to_id).await? {
        Some(mut neighbor) => {
          if !neighbor.is_linked_to(&id) {
            neighbor.link(rel.kind.clone(), id.clone());
            cascade.put_person(neighbor);
          }
        }
        None => {
          tracing::warn!(
            person = %id,
            target = %rel.connected_to_id,
            "keeping edge to unknown person"
          );
        }
      }
    }

    if let Some(prior) = prior {
      let kept: HashSet<&str> = person
        .relationships
        .iter()
        .map(|r| r.connected_to_id.as_str())
        .collect();
      let mut visited = HashSet::new();

      for rel in &prior.relationships {
        let target = rel.connected_to_id.as_str();
        if kept.contains(target) || !visited.insert(target) {
          continue;
        }
        if let Some(mut neighbor) = cascade.read_person(&self.store, target).await?
          && neighbor.unlink(&id)
        {
          cascade.put_person(neighbor);
        }
      }
    }

    Ok(cascade)
  }

  /// Save `person` with its reciprocal-edge cascade and return every person
  /// as re-read after the writes.
  pub async fn save_person(&self, person: Person) -> Result<Vec<Person>> {
    let id = person.id.clone();
    let cascade = self.plan_save_person(person).await?;
    tracing::debug!(person = %id, neighbors = cascade.neighbor_writes(&id), "saving person");
    cascade.commit(&self.store).await?;
    self.people().await
  }

  /// Plan deleting person `id`. Empty when the person does not exist.
  ///
  /// Every neighbor reached through an outgoing edge loses its edges back to
  /// `id`. People that still point at `id` without a matching outgoing edge
  /// (possible after importing asymmetric data) are cleaned up as well.
  pub async fn plan_delete_person(&self, id: &str) -> Result<Cascade> {
    let mut cascade = Cascade::new();
    let Some(person) = self.person(id).await? else {
      return Ok(cascade);
    };

    for rel in person.relationships.iter().filter(|r| r.connected_to_id != id) {
      if let Some(mut neighbor) =
        cascade.read_person(&self.store, &rel.connected_to_id).await?
        && neighbor.unlink(id)
      {
        cascade.put_person(neighbor);
      }
    }

    for mut other in self.people().await? {
      if other.id == id || cascade.staged_person(&other.id).is_some() {
        continue;
      }
      if other.unlink(id) {
        tracing::warn!(person = %other.id, deleted = %id, "stripping one-sided edge");
        cascade.put_person(other);
      }
    }

    cascade.delete_person(id);
    Ok(cascade)
  }

  /// Delete person `id` and its reciprocal edges. Deleting an unknown id is
  /// a successful no-op.
  pub async fn delete_person(&self, id: &str) -> Result<Vec<Person>> {
    let cascade = self.plan_delete_person(id).await?;
    if !cascade.is_empty() {
      tracing::debug!(person = %id, writes = cascade.len(), "deleting person");
      cascade.commit(&self.store).await?;
    }
    self.people().await
  }

  // ── Relationship types ────────────────────────────────────────────────

  /// Plan saving `rel_type`, renaming from `old_name` when it differs.
  ///
  /// A rename rewrites the old name in every person's primary relationship
  /// and edge types (only changed records are staged), then removes the old
  /// type record.
  pub async fn plan_save_relationship_type(
    &self,
    rel_type: RelationshipType,
    old_name: Option<&str>,
  ) -> Result<Cascade> {
    let new_name = rel_type.name.clone();
    let mut cascade = Cascade::new();
    cascade.put_relationship_type(rel_type);

    if let Some(old) = old_name.filter(|old| *old != new_name) {
      for mut person in self.people().await? {
        if person.rename_type(old, &new_name) {
          cascade.put_person(person);
        }
      }
      cascade.delete_relationship_type(old);
    }

    Ok(cascade)
  }

  /// Save (and possibly rename) a relationship type, returning every type as
  /// re-read after the writes.
  pub async fn save_relationship_type(
    &self,
    rel_type: RelationshipType,
    old_name: Option<&str>,
  ) -> Result<Vec<RelationshipType>> {
    let name = rel_type.name.clone();
    let cascade = self.plan_save_relationship_type(rel_type, old_name).await?;
    if let Some(old) = old_name.filter(|old| *old != name) {
      tracing::info!(from = %old, to = %name, people = cascade.len() - 2, "renaming relationship type");
    }
    cascade.commit(&self.store).await?;
    self.relationship_types().await
  }

  /// Delete a relationship type. Usage is not re-checked here; see
  /// [`crate::boundary::Boundary::delete_relationship_type`] for the guarded
  /// entry point.
  pub async fn delete_relationship_type(&self, name: &str) -> Result<Vec<RelationshipType>> {
    self
      .store
      .delete_relationship_type(name)
      .await
      .map_err(Error::storage)?;
    self.relationship_types().await
  }

  // ── Whole store ───────────────────────────────────────────────────────

  /// Snapshot for backup. Identical to [`Self::load_all`].
  pub async fn export_snapshot(&self) -> Result<Snapshot> { self.load_all().await }

  /// Validate a backup document and, only if it is well formed, replace the
  /// whole store with its contents. Returns the reloaded snapshot.
  pub async fn import_snapshot(&self, doc: &str) -> Result<Snapshot> {
    let snapshot = Snapshot::from_document(doc)?;
    self.replace_all(snapshot).await?;
    self.load_all().await
  }

  /// Replace the whole store with an already-validated snapshot.
  pub async fn replace_all(&self, snapshot: Snapshot) -> Result<()> {
    tracing::info!(
      people = snapshot.people.len(),
      types = snapshot.relationship_types.len(),
      "replacing store contents"
    );
    self
      .store
      .bulk_replace(snapshot.people, snapshot.relationship_types)
      .await
      .map_err(Error::storage)
  }

  pub async fn clear_all(&self) -> Result<()> {
    tracing::info!("clearing all data");
    self.store.clear_all().await.map_err(Error::storage)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use proptest::prelude::*;

  use super::*;
  use crate::{cascade::Write, memory::MemoryStore, model::Relationship};

  fn engine() -> GraphEngine<MemoryStore> { GraphEngine::new(MemoryStore::new()) }

  fn find<'a>(people: &'a [Person], id: &str) -> &'a Person {
    people.iter().find(|p| p.id == id).expect("person present")
  }

  fn person(id: &str, name: &str, edges: &[(&str, &str)]) -> Person {
    let mut p = Person::new(id, name).with_primary("Friend");
    for (kind, target) in edges {
      p.link(*kind, *target);
    }
    p
  }

  async fn alice_and_bob(e: &GraphEngine<MemoryStore>) {
    e.save_person(person("A", "Alice", &[])).await.unwrap();
    e.save_person(person("B", "Bob", &[("Friend", "A")])).await.unwrap();
  }

  // ─── Save ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn save_adds_reciprocal_edge() {
    let e = engine();
    alice_and_bob(&e).await;

    let people = e.people().await.unwrap();
    assert_eq!(find(&people, "A").relationships, vec![Relationship::new("Friend", "B")]);
  }

  #[tokio::test]
  async fn reciprocal_copies_type_without_inversion() {
    let e = engine();
    e.save_person(person("A", "Alice", &[])).await.unwrap();
    let people = e
      .save_person(person("B", "Bob", &[("Parent", "A")]))
      .await
      .unwrap();
    assert_eq!(find(&people, "A").relationships, vec![Relationship::new("Parent", "B")]);
  }

  #[tokio::test]
  async fn resave_with_same_edges_writes_only_self() {
    let e = engine();
    alice_and_bob(&e).await;

    let bob = e.person("B").await.unwrap().unwrap();
    let cascade = e.plan_save_person(bob).await.unwrap();
    assert_eq!(cascade.len(), 1);
    assert_eq!(cascade.neighbor_writes("B"), 0);
  }

  #[tokio::test]
  async fn removing_edge_strips_reciprocal() {
    let e = engine();
    alice_and_bob(&e).await;

    let people = e.save_person(person("B", "Bob", &[])).await.unwrap();
    assert!(find(&people, "A").relationships.is_empty());
  }

  #[tokio::test]
  async fn retyping_kept_edge_does_not_touch_neighbor() {
    let e = engine();
    alice_and_bob(&e).await;

    let people = e
      .save_person(person("B", "Bob", &[("Sibling", "A")]))
      .await
      .unwrap();
    assert_eq!(find(&people, "B").relationships[0].kind, "Sibling");
    assert_eq!(find(&people, "A").relationships[0].kind, "Friend");
  }

  #[tokio::test]
  async fn edge_to_unknown_person_is_kept() {
    let e = engine();
    let people = e
      .save_person(person("A", "Alice", &[("Friend", "ghost")]))
      .await
      .unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].relationships, vec![Relationship::new("Friend", "ghost")]);
  }

  #[tokio::test]
  async fn duplicate_edges_add_one_reciprocal() {
    let e = engine();
    e.save_person(person("A", "Alice", &[])).await.unwrap();
    let people = e
      .save_person(person("B", "Bob", &[("Friend", "A"), ("Neighbor", "A")]))
      .await
      .unwrap();
    assert_eq!(find(&people, "A").relationships, vec![Relationship::new("Friend", "B")]);
  }

  #[tokio::test]
  async fn self_edge_needs_no_reciprocal() {
    let e = engine();
    let people = e
      .save_person(person("A", "Alice", &[("Friend", "A")]))
      .await
      .unwrap();
    assert_eq!(people[0].relationships.len(), 1);
  }

  #[tokio::test]
  async fn save_fans_out_to_many_neighbors() {
    let e = engine();
    for id in ["B", "C", "D"] {
      e.save_person(person(id, id, &[])).await.unwrap();
    }
    let cascade = e
      .plan_save_person(person("A", "Alice", &[("Friend", "B"), ("Friend", "C"), ("Friend", "D")]))
      .await
      .unwrap();
    assert_eq!(cascade.neighbor_writes("A"), 3);
    assert!(matches!(&cascade.writes()[0], Write::PutPerson(p) if p.id == "A"));
  }

  // ─── Delete ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_removes_person_and_reciprocals() {
    let e = engine();
    alice_and_bob(&e).await;

    let people = e.delete_person("A").await.unwrap();
    assert_eq!(people.len(), 1);
    assert!(find(&people, "B").relationships.is_empty());

    let snap = e.load_all().await.unwrap();
    assert!(snap.person("A").is_none());
  }

  #[tokio::test]
  async fn delete_unknown_is_noop() {
    let e = engine();
    alice_and_bob(&e).await;
    assert!(e.plan_delete_person("nobody").await.unwrap().is_empty());
    assert_eq!(e.delete_person("nobody").await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn delete_sweeps_one_sided_edges() {
    // C points at A but A has no edge to C, as an import might leave it.
    let store = MemoryStore::with_records(
      vec![
        person("A", "Alice", &[]),
        person("C", "Carol", &[("Friend", "A")]),
      ],
      vec![],
    );
    let e = GraphEngine::new(store);

    let people = e.delete_person("A").await.unwrap();
    assert!(find(&people, "C").relationships.is_empty());
  }

  // ─── Relationship types ───────────────────────────────────────────────────

  #[tokio::test]
  async fn rename_cascades_into_people() {
    let e = engine();
    e.save_relationship_type(RelationshipType::new("Friend", "#22c55e"), None)
      .await
      .unwrap();
    alice_and_bob(&e).await;

    let types = e
      .save_relationship_type(RelationshipType::new("Buddy", "#000"), Some("Friend"))
      .await
      .unwrap();
    assert!(types.iter().all(|t| t.name != "Friend"));
    assert!(types.iter().any(|t| t.name == "Buddy"));

    let people = e.people().await.unwrap();
    let bob = find(&people, "B");
    assert_eq!(bob.relationships[0].kind, "Buddy");
    assert_eq!(bob.primary_relationship, "Buddy");
    assert!(people.iter().all(|p| p.type_references("Friend") == 0));
  }

  #[tokio::test]
  async fn rename_stages_only_changed_people() {
    let e = engine();
    alice_and_bob(&e).await;
    e.save_person(Person::new("C", "Carol").with_primary("Parent"))
      .await
      .unwrap();

    let cascade = e
      .plan_save_relationship_type(RelationshipType::new("Buddy", "#000"), Some("Friend"))
      .await
      .unwrap();
    // put Buddy, put A, put B, delete Friend
    assert_eq!(cascade.len(), 4);
    assert_eq!(cascade.staged_person("C"), None);
    assert!(matches!(cascade.writes().last(), Some(Write::DeleteRelationshipType(n)) if n == "Friend"));
  }

  #[tokio::test]
  async fn color_change_is_not_a_rename() {
    let e = engine();
    e.save_relationship_type(RelationshipType::new("Friend", "#fff"), None)
      .await
      .unwrap();
    let types = e
      .save_relationship_type(RelationshipType::new("Friend", "#000"), Some("Friend"))
      .await
      .unwrap();
    assert_eq!(types, vec![RelationshipType::new("Friend", "#000")]);
  }

  #[tokio::test]
  async fn engine_deletes_type_without_usage_check() {
    let e = engine();
    e.save_relationship_type(RelationshipType::new("Friend", "#fff"), None)
      .await
      .unwrap();
    alice_and_bob(&e).await;

    let types = e.delete_relationship_type("Friend").await.unwrap();
    assert!(types.is_empty());
    assert_eq!(find(&e.people().await.unwrap(), "B").relationships[0].kind, "Friend");
  }

  // ─── Import / export ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn import_of_export_restores_state() {
    let e = engine();
    e.save_relationship_type(RelationshipType::new("Friend", "#fff"), None)
      .await
      .unwrap();
    alice_and_bob(&e).await;
    let before = e.export_snapshot().await.unwrap();
    let doc = before.to_document().unwrap();

    e.clear_all().await.unwrap();
    assert_eq!(e.load_all().await.unwrap(), Snapshot::default());

    let after = e.import_snapshot(&doc).await.unwrap();
    assert_eq!(after, before);
  }

  #[tokio::test]
  async fn malformed_import_leaves_store_untouched() {
    let e = engine();
    alice_and_bob(&e).await;

    let err = e.import_snapshot(r#"{"people": []}"#).await.unwrap_err();
    assert!(matches!(err, Error::ImportFormat(_)));
    assert_eq!(e.people().await.unwrap().len(), 2);
  }

  // ─── Storage faults ───────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("disk full")]
  struct DiskFull;

  /// Delegates to a [`MemoryStore`] but fails every person write after the
  /// first `budget` of them.
  struct FlakyStore {
    inner:  MemoryStore,
    budget: AtomicUsize,
  }

  impl FlakyStore {
    fn spend(&self) -> Result<(), DiskFull> {
      self
        .budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |b| b.checked_sub(1))
        .map(|_| ())
        .map_err(|_| DiskFull)
    }
  }

  impl EntityStore for FlakyStore {
    type Error = DiskFull;

    async fn all_people(&self) -> Result<Vec<Person>, DiskFull> {
      Ok(self.inner.all_people().await.unwrap_or_else(|e| match e {}))
    }

    async fn get_person(&self, id: &str) -> Result<Option<Person>, DiskFull> {
      Ok(self.inner.get_person(id).await.unwrap_or_else(|e| match e {}))
    }

    async fn put_person(&self, person: Person) -> Result<(), DiskFull> {
      self.spend()?;
      self.inner.put_person(person).await.unwrap_or_else(|e| match e {});
      Ok(())
    }

    async fn delete_person(&self, id: &str) -> Result<(), DiskFull> {
      self.spend()?;
      self.inner.delete_person(id).await.unwrap_or_else(|e| match e {});
      Ok(())
    }

    async fn all_relationship_types(&self) -> Result<Vec<RelationshipType>, DiskFull> {
      Ok(self.inner.all_relationship_types().await.unwrap_or_else(|e| match e {}))
    }

    async fn get_relationship_type(
      &self,
      name: &str,
    ) -> Result<Option<RelationshipType>, DiskFull> {
      Ok(self.inner.get_relationship_type(name).await.unwrap_or_else(|e| match e {}))
    }

    async fn put_relationship_type(&self, t: RelationshipType) -> Result<(), DiskFull> {
      self.inner.put_relationship_type(t).await.unwrap_or_else(|e| match e {});
      Ok(())
    }

    async fn delete_relationship_type(&self, name: &str) -> Result<(), DiskFull> {
      self.inner.delete_relationship_type(name).await.unwrap_or_else(|e| match e {});
      Ok(())
    }

    async fn clear_all(&self) -> Result<(), DiskFull> { Err(DiskFull) }

    async fn bulk_replace(
      &self,
      _people: Vec<Person>,
      _types: Vec<RelationshipType>,
    ) -> Result<(), DiskFull> {
      Err(DiskFull)
    }
  }

  #[tokio::test]
  async fn storage_fault_aborts_rest_of_cascade() {
    let store = FlakyStore {
      inner:  MemoryStore::with_records(
        vec![person("B", "Bob", &[]), person("C", "Carol", &[])],
        vec![],
      ),
      budget: AtomicUsize::new(2),
    };
    let e = GraphEngine::new(store);

    let err = e
      .save_person(person("A", "Alice", &[("Friend", "B"), ("Friend", "C")]))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    // A and B were written before the budget ran out; C was not.
    let people = e.people().await.unwrap();
    assert!(find(&people, "B").is_linked_to("A"));
    assert!(!find(&people, "C").is_linked_to("A"));
  }

  #[tokio::test]
  async fn storage_fault_on_clear_surfaces() {
    let e = GraphEngine::new(FlakyStore {
      inner:  MemoryStore::new(),
      budget: AtomicUsize::new(0),
    });
    assert!(matches!(e.clear_all().await.unwrap_err(), Error::Storage(_)));
  }

  // ─── Properties ───────────────────────────────────────────────────────────

  #[derive(Debug, Clone)]
  enum Op {
    Save { who: u8, targets: Vec<u8> },
    Delete { who: u8 },
  }

  fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
      3 => (0u8..6, proptest::collection::vec(0u8..6, 0..4))
        .prop_map(|(who, targets)| Op::Save { who, targets }),
      1 => (0u8..6).prop_map(|who| Op::Delete { who }),
    ]
  }

  /// Both endpoints of a pair always agree on the type, so symmetry can be
  /// checked including the type string.
  fn pair_type(a: u8, b: u8) -> &'static str {
    if (a.min(b) + a.max(b)) % 2 == 0 { "Friend" } else { "Sibling" }
  }

  async fn apply(e: &GraphEngine<MemoryStore>, op: &Op) {
    match op {
      Op::Save { who, targets } => {
        let id = who.to_string();
        let mut p = e
          .person(&id)
          .await
          .unwrap()
          .unwrap_or_else(|| Person::new(id.clone(), format!("P{who}")));
        p.relationships.clear();
        for t in targets {
          let target = t.to_string();
          if *t == *who || e.person(&target).await.unwrap().is_some() {
            p.link(pair_type(*who, *t), target);
          }
        }
        e.save_person(p).await.unwrap();
      }
      Op::Delete { who } => {
        let id = who.to_string();
        let people = e.delete_person(&id).await.unwrap();
        assert!(people.iter().all(|p| !p.is_linked_to(&id)));
      }
    }
  }

  fn assert_symmetric(people: &[Person]) {
    for p in people {
      for rel in &p.relationships {
        let q = people
          .iter()
          .find(|q| q.id == rel.connected_to_id)
          .expect("no dangling edges");
        assert!(
          q.relationships.contains(&Relationship::new(rel.kind.clone(), p.id.clone())),
          "{} -> {} ({}) has no mirror",
          p.id,
          q.id,
          rel.kind
        );
      }
    }
  }

  proptest! {
    #[test]
    fn edges_stay_symmetric(ops in proptest::collection::vec(op(), 1..40)) {
      let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
      rt.block_on(async {
        let e = engine();
        for op in &ops {
          apply(&e, op).await;
          assert_symmetric(&e.people().await.unwrap());
        }
      });
    }
  }
}
