//! Full point-in-time reads of both collections, and the backup document
//! format used by export and import.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Error, Result,
  model::{Person, RelationshipType},
};

/// Both collections as of one read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
  pub people:             Vec<Person>,
  pub relationship_types: Vec<RelationshipType>,
}

impl Snapshot {
  pub fn person(&self, id: &str) -> Option<&Person> {
    self.people.iter().find(|p| p.id == id)
  }

  pub fn relationship_type(&self, name: &str) -> Option<&RelationshipType> {
    self.relationship_types.iter().find(|t| t.name == name)
  }

  /// Serialise as a pretty-printed backup document.
  pub fn to_document(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Parse and validate a backup document.
  ///
  /// Both `people` and `relationshipTypes` must be present and be arrays, and
  /// every record must decode; anything else is [`Error::ImportFormat`].
  pub fn from_document(doc: &str) -> Result<Self> {
    let value: Value = serde_json::from_str(doc)
      .map_err(|e| Error::ImportFormat(format!("not a JSON document: {e}")))?;
    Self::from_value(value)
  }

  /// Validate an already-parsed backup document.
  pub fn from_value(value: Value) -> Result<Self> {
    let Value::Object(mut fields) = value else {
      return Err(Error::ImportFormat("top level must be an object".into()));
    };

    let people = take_array(&mut fields, "people")?;
    let types = take_array(&mut fields, "relationshipTypes")?;

    let people = people
      .into_iter()
      .enumerate()
      .map(|(i, v)| {
        serde_json::from_value::<Person>(v)
          .map_err(|e| Error::ImportFormat(format!("people[{i}]: {e}")))
      })
      .collect::<Result<Vec<_>>>()?;

    let relationship_types = types
      .into_iter()
      .enumerate()
      .map(|(i, v)| {
        serde_json::from_value::<RelationshipType>(v)
          .map_err(|e| Error::ImportFormat(format!("relationshipTypes[{i}]: {e}")))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self { people, relationship_types })
  }
}

fn take_array(
  fields: &mut serde_json::Map<String, Value>,
  key: &str,
) -> Result<Vec<Value>> {
  match fields.remove(key) {
    Some(Value::Array(items)) => Ok(items),
    Some(_) => Err(Error::ImportFormat(format!("`{key}` must be an array"))),
    None => Err(Error::ImportFormat(format!("missing `{key}`"))),
  }
}
