//! [`SqliteStore`] is the SQLite implementation of [`EntityStore`].

use std::path::Path;

use kinmap_core::{
  defaults::DEFAULT_RELATIONSHIP_TYPES,
  model::{Person, RelationshipType},
  store::EntityStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawPerson, type_from_row},
  schema::{
    PERSON_COLUMNS, PRAGMAS, SCHEMA_VERSION, SEED_TYPE, UPSERT_TYPE, V1_PEOPLE,
    V2_RELATIONSHIP_TYPES,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A kinmap entity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Close the connection, flushing outstanding work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// The schema version recorded in the file.
  pub async fn schema_version(&self) -> Result<i64> {
    Ok(
      self
        .conn
        .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
        .await?,
    )
  }

  async fn migrate(&self) -> Result<()> {
    let found = self.schema_version().await?;
    if found > SCHEMA_VERSION {
      return Err(Error::UnsupportedVersion { found, supported: SCHEMA_VERSION });
    }

    self
      .conn
      .call(move |conn| {
        conn.execute_batch(PRAGMAS)?;
        if found < 1 {
          conn.execute_batch(V1_PEOPLE)?;
        }
        if found < 2 {
          let tx = conn.transaction()?;
          tx.execute_batch(V2_RELATIONSHIP_TYPES)?;
          {
            let mut stmt = tx.prepare(SEED_TYPE)?;
            for (name, color) in DEFAULT_RELATIONSHIP_TYPES {
              stmt.execute(rusqlite::params![name, color])?;
            }
          }
          tx.commit()?;
        }
        Ok(())
      })
      .await?;

    if found < SCHEMA_VERSION {
      tracing::debug!(from = found, to = SCHEMA_VERSION, "migrated store schema");
    }
    Ok(())
  }
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn all_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn get_person(&self, id: &str) -> Result<Option<Person>> {
    let id = id.to_owned();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1"),
              rusqlite::params![id],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn put_person(&self, person: Person) -> Result<()> {
    let raw = RawPerson::from_person(person)?;
    self
      .conn
      .call(move |conn| {
        raw.upsert(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_person(&self, id: &str) -> Result<()> {
    let id = id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM people WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Relationship types ────────────────────────────────────────────────────

  async fn all_relationship_types(&self) -> Result<Vec<RelationshipType>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt =
            conn.prepare("SELECT name, color FROM relationship_types ORDER BY rowid")?;
          let rows = stmt
            .query_map([], type_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn get_relationship_type(&self, name: &str) -> Result<Option<RelationshipType>> {
    let name = name.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT name, color FROM relationship_types WHERE name = ?1",
                rusqlite::params![name],
                type_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn put_relationship_type(&self, rel_type: RelationshipType) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(UPSERT_TYPE, rusqlite::params![rel_type.name, rel_type.color])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_relationship_type(&self, name: &str) -> Result<()> {
    let name = name.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM relationship_types WHERE name = ?1",
          rusqlite::params![name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Whole store ───────────────────────────────────────────────────────────

  async fn clear_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch("DELETE FROM people; DELETE FROM relationship_types;")?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn bulk_replace(
    &self,
    people: Vec<Person>,
    types: Vec<RelationshipType>,
  ) -> Result<()> {
    let raws = people
      .into_iter()
      .map(RawPerson::from_person)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch("DELETE FROM people; DELETE FROM relationship_types;")?;
        for raw in &raws {
          raw.upsert(&tx)?;
        }
        for t in &types {
          tx.execute(UPSERT_TYPE, rusqlite::params![t.name, t.color])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
