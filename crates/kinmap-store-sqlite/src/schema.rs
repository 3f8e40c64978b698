//! SQL schema for the kinmap SQLite store.
//!
//! Migrations are gated on `PRAGMA user_version`. Each step runs once, in
//! order, when the file's version is below the step's version.

/// The version a fully migrated file reports.
pub const SCHEMA_VERSION: i64 = 2;

/// Connection settings applied on every open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

/// Version 1: the people collection.
///
/// List fields are JSON arrays. Upserts use `ON CONFLICT ... DO UPDATE` so a
/// row keeps its rowid, and reads order by rowid to return storage order.
pub const V1_PEOPLE: &str = "
CREATE TABLE IF NOT EXISTS people (
    id                   TEXT PRIMARY KEY,
    name                 TEXT NOT NULL,
    aliases              TEXT NOT NULL DEFAULT '[]',
    tags                 TEXT NOT NULL DEFAULT '[]',
    location             TEXT,
    notes                TEXT,
    blood_group          TEXT,
    primary_relationship TEXT NOT NULL DEFAULT '',
    relationships        TEXT NOT NULL DEFAULT '[]'   -- [{type, connected_to_id}]
);

PRAGMA user_version = 1;
";

/// Version 2: the relationship-type collection. The default types are
/// seeded in the same transaction.
pub const V2_RELATIONSHIP_TYPES: &str = "
CREATE TABLE IF NOT EXISTS relationship_types (
    name  TEXT PRIMARY KEY,
    color TEXT NOT NULL
);

PRAGMA user_version = 2;
";

pub const SEED_TYPE: &str =
  "INSERT OR IGNORE INTO relationship_types (name, color) VALUES (?1, ?2)";

pub const PERSON_COLUMNS: &str = "id, name, aliases, tags, location, notes, \
                                  blood_group, primary_relationship, relationships";

pub const UPSERT_PERSON: &str = "
INSERT INTO people (
    id, name, aliases, tags, location, notes,
    blood_group, primary_relationship, relationships
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
ON CONFLICT (id) DO UPDATE SET
    name                 = excluded.name,
    aliases              = excluded.aliases,
    tags                 = excluded.tags,
    location             = excluded.location,
    notes                = excluded.notes,
    blood_group          = excluded.blood_group,
    primary_relationship = excluded.primary_relationship,
    relationships        = excluded.relationships
";

pub const UPSERT_TYPE: &str = "
INSERT INTO relationship_types (name, color) VALUES (?1, ?2)
ON CONFLICT (name) DO UPDATE SET color = excluded.color
";
