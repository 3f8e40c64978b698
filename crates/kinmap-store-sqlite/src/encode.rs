//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! String lists and relationship lists are stored as compact JSON.

use kinmap_core::model::{Person, Relationship, RelationshipType};

use crate::Result;

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_strings(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_strings(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_relationships(rels: &[Relationship]) -> Result<String> {
  Ok(serde_json::to_string(rels)?)
}

pub fn decode_relationships(s: &str) -> Result<Vec<Relationship>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values of a `people` row, in [`crate::schema::PERSON_COLUMNS`]
/// order.
pub struct RawPerson {
  pub id:                   String,
  pub name:                 String,
  pub aliases:              String,
  pub tags:                 String,
  pub location:             Option<String>,
  pub notes:                Option<String>,
  pub blood_group:          Option<String>,
  pub primary_relationship: String,
  pub relationships:        String,
}

impl RawPerson {
  pub fn from_person(p: Person) -> Result<Self> {
    Ok(Self {
      aliases:              encode_strings(&p.aliases)?,
      tags:                 encode_strings(&p.tags)?,
      relationships:        encode_relationships(&p.relationships)?,
      id:                   p.id,
      name:                 p.name,
      location:             p.location,
      notes:                p.notes,
      blood_group:          p.blood_group,
      primary_relationship: p.primary_relationship,
    })
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      name:                 row.get(1)?,
      aliases:              row.get(2)?,
      tags:                 row.get(3)?,
      location:             row.get(4)?,
      notes:                row.get(5)?,
      blood_group:          row.get(6)?,
      primary_relationship: row.get(7)?,
      relationships:        row.get(8)?,
    })
  }

  /// Bind parameters for [`crate::schema::UPSERT_PERSON`].
  pub fn upsert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      crate::schema::UPSERT_PERSON,
      rusqlite::params![
        self.id,
        self.name,
        self.aliases,
        self.tags,
        self.location,
        self.notes,
        self.blood_group,
        self.primary_relationship,
        self.relationships,
      ],
    )?;
    Ok(())
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      aliases:              decode_strings(&self.aliases)?,
      tags:                 decode_strings(&self.tags)?,
      relationships:        decode_relationships(&self.relationships)?,
      id:                   self.id,
      name:                 self.name,
      location:             self.location,
      notes:                self.notes,
      blood_group:          self.blood_group,
      primary_relationship: self.primary_relationship,
    })
  }
}

pub fn type_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RelationshipType> {
  Ok(RelationshipType { name: row.get(0)?, color: row.get(1)? })
}
