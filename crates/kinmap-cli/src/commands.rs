//! One-shot subcommands. Each reads what it needs, performs a single intent
//! through the boundary, and prints the outcome.

use std::{io::Write, path::PathBuf};

use anyhow::{Context as _, bail};
use chrono::Local;
use clap::{Args, Subcommand};
use kinmap_core::{
  boundary::{Boundary, usage_counts},
  defaults::UNCLASSIFIED,
  model::Person,
  search::{filter_people, highlight_target},
  store::EntityStore,
};
use kinmap_layout::Scene;
use serde::Serialize;

use crate::settings::Settings;

// ─── Command tree ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create the root person representing you. Only works on an empty store.
  Onboard { name: String },

  /// Add, edit, delete, or inspect people.
  #[command(subcommand)]
  Person(PersonCommand),

  /// Connect two people. Both sides get an edge of the same type.
  Link {
    a:    String,
    b:    String,
    #[arg(long = "type", short = 't')]
    kind: String,
  },

  /// Disconnect two people on both sides.
  Unlink { a: String, b: String },

  /// Manage relationship types.
  #[command(subcommand)]
  Type(TypeCommand),

  /// Write a JSON backup of everything.
  Export {
    /// Defaults to `kinmap-backup-YYYY-MM-DD.json`.
    file: Option<PathBuf>,
  },

  /// Replace everything with the contents of a backup.
  Import {
    file: PathBuf,
    /// Confirm that existing data will be discarded.
    #[arg(long)]
    yes:  bool,
  },

  /// Delete every person and relationship type.
  Clear {
    #[arg(long)]
    yes: bool,
  },

  /// Run the force layout to rest and print node positions.
  Layout {
    #[arg(long, default_value_t = 1_000)]
    max_ticks: usize,
    /// Print JSON instead of a table.
    #[arg(long)]
    json:      bool,
  },
}

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
  Add(PersonFields),
  /// Change fields of an existing person. Omitted fields are kept.
  Edit {
    person: String,
    #[command(flatten)]
    fields: PersonFields,
  },
  Delete { person: String },
  Show { person: String },
  List {
    /// Only people whose name, alias, or tag contains this.
    #[arg(long, short)]
    search: Option<String>,
  },
}

#[derive(Args, Debug, Default)]
pub struct PersonFields {
  #[arg(long)]
  pub name:        Option<String>,
  #[arg(long)]
  pub primary:     Option<String>,
  /// Repeatable. Replaces all aliases when given.
  #[arg(long = "alias")]
  pub aliases:     Vec<String>,
  /// Repeatable. Replaces all tags when given.
  #[arg(long = "tag")]
  pub tags:        Vec<String>,
  #[arg(long)]
  pub location:    Option<String>,
  #[arg(long)]
  pub notes:       Option<String>,
  #[arg(long)]
  pub blood_group: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TypeCommand {
  /// List types with their colors and how many references each has.
  List,
  Add {
    name:  String,
    #[arg(long, default_value = "#a3a3a3")]
    color: String,
  },
  /// Rename a type, or recolor it with `--color`. People follow the rename.
  Rename {
    old:   String,
    new:   String,
    #[arg(long)]
    color: Option<String>,
  },
  /// Delete a type nobody references.
  Delete { name: String },
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

pub async fn run<S: EntityStore>(
  command: Command,
  boundary: &Boundary<S>,
  settings: &Settings,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  let engine = boundary.engine();
  match command {
    Command::Onboard { name } => {
      let me = boundary.onboard(&name).await?;
      writeln!(out, "Welcome, {} ({})", me.name, me.id)?;
    }

    Command::Person(cmd) => person(cmd, boundary, out).await?,

    Command::Link { a, b, kind } => {
      let people = engine.people().await?;
      let mut from = resolve(&people, &a)?.clone();
      let to = resolve(&people, &b)?;
      if from.id == to.id {
        bail!("cannot link {} to themselves", from.name);
      }
      if from.is_linked_to(&to.id) {
        from.retype(&to.id, &kind);
        writeln!(
          out,
          "Retyped {} -> {} as {kind}; {}'s side keeps its type",
          from.name, to.name, to.name
        )?;
      } else {
        from.link(&kind, &to.id);
        writeln!(out, "Linked {} <-> {} as {kind}", from.name, to.name)?;
      }
      boundary.save_person(from).await?;
    }

    Command::Unlink { a, b } => {
      let people = engine.people().await?;
      let mut from = resolve(&people, &a)?.clone();
      let to = resolve(&people, &b)?;
      if !from.unlink(&to.id) {
        bail!("{} is not linked to {}", from.name, to.name);
      }
      writeln!(out, "Unlinked {} and {}", from.name, to.name)?;
      boundary.save_person(from).await?;
    }

    Command::Type(cmd) => relationship_type(cmd, boundary, out).await?,

    Command::Export { file } => {
      let path = file.unwrap_or_else(backup_file_name);
      let doc = engine.export_snapshot().await?.to_document()?;
      std::fs::write(&path, doc).with_context(|| format!("writing {}", path.display()))?;
      writeln!(out, "Exported to {}", path.display())?;
    }

    Command::Import { file, yes } => {
      let doc = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
      if !yes {
        bail!("import replaces all existing data; pass --yes to continue");
      }
      let snapshot = engine.import_snapshot(&doc).await?;
      writeln!(
        out,
        "Imported {} people and {} relationship types",
        snapshot.people.len(),
        snapshot.relationship_types.len()
      )?;
    }

    Command::Clear { yes } => {
      if !yes {
        bail!("clear deletes everything; pass --yes to continue");
      }
      engine.clear_all().await?;
      writeln!(out, "Cleared all data")?;
    }

    Command::Layout { max_ticks, json } => {
      let snapshot = engine.load_all().await?;
      let mut scene = Scene::new(settings.forces, (0.0, 0.0));
      scene.sync(&snapshot.people, &snapshot.relationship_types);
      let ticks = scene.settle(max_ticks);
      tracing::debug!(ticks, settled = scene.is_settled(), "layout finished");
      print_layout(&scene, json, out)?;
    }
  }
  Ok(())
}

async fn person<S: EntityStore>(
  cmd: PersonCommand,
  boundary: &Boundary<S>,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  let engine = boundary.engine();
  match cmd {
    PersonCommand::Add(fields) => {
      let Some(name) = fields.name.clone() else {
        bail!("--name is required");
      };
      let mut p = Person::new(Person::fresh_id(), name).with_primary(UNCLASSIFIED);
      fields.apply(&mut p);
      let id = p.id.clone();
      boundary.save_person(p).await?;
      writeln!(out, "Added {id}")?;
    }

    PersonCommand::Edit { person, fields } => {
      let people = engine.people().await?;
      let mut p = resolve(&people, &person)?.clone();
      fields.apply(&mut p);
      boundary.save_person(p).await?;
      writeln!(out, "Saved {person}")?;
    }

    PersonCommand::Delete { person } => {
      let people = engine.people().await?;
      let p = resolve(&people, &person)?;
      let (id, name) = (p.id.clone(), p.name.clone());
      engine.delete_person(&id).await?;
      writeln!(out, "Deleted {name}")?;
    }

    PersonCommand::Show { person } => {
      let people = engine.people().await?;
      let p = resolve(&people, &person)?;
      show(p, &people, out)?;
    }

    PersonCommand::List { search } => {
      let people = engine.people().await?;
      let term = search.unwrap_or_default();
      let hits = filter_people(&people, &term);
      let target = highlight_target(&hits, &term);
      for p in &hits {
        let mark = if Some(p.id.as_str()) == target { '*' } else { ' ' };
        writeln!(out, "{mark} {:<36}  {:<24}  {}", p.id, p.name, p.primary_relationship)?;
      }
    }
  }
  Ok(())
}

async fn relationship_type<S: EntityStore>(
  cmd: TypeCommand,
  boundary: &Boundary<S>,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  let engine = boundary.engine();
  match cmd {
    TypeCommand::List => {
      let snapshot = engine.load_all().await?;
      let usage = usage_counts(&snapshot.people, &snapshot.relationship_types);
      for t in &snapshot.relationship_types {
        let uses = usage.get(&t.name).copied().unwrap_or_default();
        writeln!(out, "{:<24}  {}  {uses}", t.name, t.color)?;
      }
    }

    TypeCommand::Add { name, color } => {
      boundary.add_relationship_type(&name, &color).await?;
      writeln!(out, "Added type {}", name.trim())?;
    }

    TypeCommand::Rename { old, new, color } => {
      let Some(current) = engine.load_all().await?.relationship_type(&old).cloned() else {
        bail!("no relationship type named {old:?}");
      };
      let color = color.unwrap_or(current.color);
      boundary.update_relationship_type(&old, &new, &color).await?;
      writeln!(out, "Saved type {}", new.trim())?;
    }

    TypeCommand::Delete { name } => {
      boundary.delete_relationship_type(&name).await?;
      writeln!(out, "Deleted type {name}")?;
    }
  }
  Ok(())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

impl PersonFields {
  fn apply(self, p: &mut Person) {
    if let Some(name) = self.name {
      p.name = name;
    }
    if let Some(primary) = self.primary {
      p.primary_relationship = primary;
    }
    if !self.aliases.is_empty() {
      p.aliases = self.aliases;
    }
    if !self.tags.is_empty() {
      p.tags = self.tags;
    }
    let set = |slot: &mut Option<String>, v: Option<String>| {
      if let Some(v) = v {
        *slot = (!v.is_empty()).then_some(v);
      }
    };
    set(&mut p.location, self.location);
    set(&mut p.notes, self.notes);
    set(&mut p.blood_group, self.blood_group);
  }
}

/// Find a person by exact id, else by name ignoring case.
pub fn resolve<'a>(people: &'a [Person], key: &str) -> anyhow::Result<&'a Person> {
  if let Some(p) = people.iter().find(|p| p.id == key) {
    return Ok(p);
  }
  let wanted = key.trim().to_lowercase();
  let mut named = people.iter().filter(|p| p.name.to_lowercase() == wanted);
  match (named.next(), named.next()) {
    (Some(p), None) => Ok(p),
    (Some(_), Some(_)) => bail!("more than one person is named {key:?}; use the id"),
    (None, _) => bail!("no person with id or name {key:?}"),
  }
}

pub fn backup_file_name() -> PathBuf {
  PathBuf::from(format!("kinmap-backup-{}.json", Local::now().format("%Y-%m-%d")))
}

fn show(p: &Person, people: &[Person], out: &mut impl Write) -> anyhow::Result<()> {
  writeln!(out, "{} ({})", p.name, p.id)?;
  writeln!(out, "  primary:     {}", p.primary_relationship)?;
  if !p.aliases.is_empty() {
    writeln!(out, "  aliases:     {}", p.aliases.join(", "))?;
  }
  if !p.tags.is_empty() {
    writeln!(out, "  tags:        {}", p.tags.join(", "))?;
  }
  for (label, value) in [
    ("location", &p.location),
    ("blood group", &p.blood_group),
    ("notes", &p.notes),
  ] {
    if let Some(v) = value {
      writeln!(out, "  {:<12} {v}", format!("{label}:"))?;
    }
  }
  for rel in &p.relationships {
    let other = people
      .iter()
      .find(|q| q.id == rel.connected_to_id)
      .map_or("(missing)", |q| q.name.as_str());
    writeln!(out, "  -> {other} [{}]", rel.kind)?;
  }
  Ok(())
}

#[derive(Serialize)]
struct Placed<'a> {
  id:   &'a str,
  name: &'a str,
  x:    f64,
  y:    f64,
}

fn print_layout(scene: &Scene, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
  let placed: Vec<Placed> = scene
    .nodes()
    .map(|d| Placed { id: &d.node.id, name: &d.node.label, x: d.body.x, y: d.body.y })
    .collect();
  if json {
    serde_json::to_writer_pretty(&mut *out, &placed)?;
    writeln!(out)?;
  } else {
    for p in &placed {
      writeln!(out, "{:<24} {:>9.1} {:>9.1}", p.name, p.x, p.y)?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use kinmap_core::{
    Error as CoreError, ValidationError, defaults::default_relationship_types,
    engine::GraphEngine, memory::MemoryStore,
  };

  use super::*;

  fn settings() -> Settings {
    let dir = tempfile::tempdir().unwrap();
    Settings::load(&dir.path().join("none.toml"), Some(Path::new("/unused.db"))).unwrap()
  }

  fn boundary() -> Boundary<MemoryStore> {
    Boundary::new(GraphEngine::new(MemoryStore::with_records(
      vec![],
      default_relationship_types(),
    )))
  }

  async fn exec(b: &Boundary<MemoryStore>, command: Command) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run(command, b, &settings(), &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
  }

  fn add(name: &str) -> Command {
    Command::Person(PersonCommand::Add(PersonFields {
      name: Some(name.into()),
      ..PersonFields::default()
    }))
  }

  async fn seeded() -> Boundary<MemoryStore> {
    let b = boundary();
    exec(&b, Command::Onboard { name: "Me".into() }).await.unwrap();
    exec(&b, add("Alice")).await.unwrap();
    exec(&b, add("Bob")).await.unwrap();
    b
  }

  #[tokio::test]
  async fn link_by_name_is_symmetric() {
    let b = seeded().await;
    let out = exec(&b, Command::Link { a: "bob".into(), b: "Alice".into(), kind: "Friend".into() })
      .await
      .unwrap();
    assert!(out.contains("Linked Bob <-> Alice"));

    let people = b.engine().people().await.unwrap();
    let alice = resolve(&people, "Alice").unwrap();
    let bob = resolve(&people, "Bob").unwrap();
    assert!(alice.is_linked_to(&bob.id));
    assert_eq!(alice.relationships[0].kind, "Friend");

    exec(&b, Command::Unlink { a: "Alice".into(), b: "Bob".into() }).await.unwrap();
    let people = b.engine().people().await.unwrap();
    assert!(people.iter().all(|p| p.relationships.is_empty()));
  }

  #[tokio::test]
  async fn onboarding_twice_is_rejected() {
    let b = seeded().await;
    let err = exec(&b, Command::Onboard { name: "Me again".into() }).await.unwrap_err();
    assert!(matches!(
      err.downcast_ref::<CoreError>(),
      Some(CoreError::Validation(ValidationError::AlreadyOnboarded))
    ));
  }

  #[tokio::test]
  async fn type_in_use_cannot_be_deleted() {
    let b = seeded().await;
    exec(&b, Command::Link { a: "Alice".into(), b: "Bob".into(), kind: "Friend".into() })
      .await
      .unwrap();
    let err = exec(&b, Command::Type(TypeCommand::Delete { name: "Friend".into() }))
      .await
      .unwrap_err();
    assert!(err.to_string().contains("in use by 2"));

    let listed = exec(&b, Command::Type(TypeCommand::List)).await.unwrap();
    assert!(listed.lines().any(|l| l.starts_with("Friend") && l.ends_with(" 2")));
  }

  #[tokio::test]
  async fn rename_keeps_color_unless_given() {
    let b = seeded().await;
    exec(
      &b,
      Command::Type(TypeCommand::Rename { old: "Friend".into(), new: "Buddy".into(), color: None }),
    )
    .await
    .unwrap();
    let types = b.engine().relationship_types().await.unwrap();
    let buddy = types.iter().find(|t| t.name == "Buddy").unwrap();
    assert_eq!(buddy.color, "#22c55e");
    assert!(types.iter().all(|t| t.name != "Friend"));
  }

  #[tokio::test]
  async fn destructive_commands_need_yes() {
    let b = seeded().await;
    assert!(exec(&b, Command::Clear { yes: false }).await.is_err());
    assert_eq!(b.engine().people().await.unwrap().len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("backup.json");
    exec(&b, Command::Export { file: Some(file.clone()) }).await.unwrap();
    assert!(exec(&b, Command::Import { file: file.clone(), yes: false }).await.is_err());

    exec(&b, Command::Clear { yes: true }).await.unwrap();
    assert!(b.engine().people().await.unwrap().is_empty());

    let out = exec(&b, Command::Import { file, yes: true }).await.unwrap();
    assert!(out.contains("Imported 3 people"));
  }

  #[tokio::test]
  async fn edit_keeps_omitted_fields() {
    let b = seeded().await;
    exec(
      &b,
      Command::Person(PersonCommand::Edit {
        person: "Alice".into(),
        fields: PersonFields {
          location: Some("Porto".into()),
          tags: vec!["climbing".into()],
          ..PersonFields::default()
        },
      }),
    )
    .await
    .unwrap();

    let out = exec(&b, Command::Person(PersonCommand::Show { person: "alice".into() }))
      .await
      .unwrap();
    assert!(out.starts_with("Alice ("));
    assert!(out.contains("location:    Porto"));
    assert!(out.contains("tags:        climbing"));

    let listed = exec(&b, Command::Person(PersonCommand::List { search: Some("climb".into()) }))
      .await
      .unwrap();
    assert_eq!(listed.lines().count(), 1);
    assert!(listed.starts_with('*'));
  }

  #[tokio::test]
  async fn layout_prints_every_person() {
    let b = seeded().await;
    let out = exec(&b, Command::Layout { max_ticks: 400, json: true }).await.unwrap();
    let placed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(placed.as_array().unwrap().len(), 3);
  }

  #[test]
  fn resolve_rejects_ambiguous_names() {
    let people = [Person::new("1", "Sam"), Person::new("2", "sam")];
    assert!(resolve(&people, "SAM").is_err());
    assert_eq!(resolve(&people, "2").unwrap().name, "sam");
    assert!(resolve(&people, "nobody").is_err());
  }

  #[test]
  fn resolve_folds_non_ascii_case() {
    let people = [Person::new("1", "Élodie"), Person::new("2", "Øystein")];
    assert_eq!(resolve(&people, "élodie").unwrap().id, "1");
    assert_eq!(resolve(&people, " ØYSTEIN ").unwrap().id, "2");
  }

  #[test]
  fn backup_name_is_dated() {
    let name = backup_file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("kinmap-backup-20"));
    assert!(name.ends_with(".json"));
  }
}
