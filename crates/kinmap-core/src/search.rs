//! Search over a people snapshot: the visible subset and the person to
//! highlight. Recomputed from scratch on every reload; nothing is indexed.

use crate::model::Person;

fn matches(person: &Person, needle: &str) -> bool {
  let hit = |s: &str| s.to_lowercase().contains(needle);
  hit(&person.name)
    || person.aliases.iter().any(|a| hit(a))
    || person.tags.iter().any(|t| hit(t))
}

/// People whose name, any alias, or any tag contains `term`, ignoring case.
/// An empty term keeps everyone.
pub fn filter_people<'a>(people: &'a [Person], term: &str) -> Vec<&'a Person> {
  if term.is_empty() {
    return people.iter().collect();
  }
  let needle = term.to_lowercase();
  people.iter().filter(|p| matches(p, &needle)).collect()
}

/// The id to emphasize for `term`: an exact (case-insensitive) name match
/// among `filtered`, else the first filtered person.
pub fn highlight_target<'a>(filtered: &[&'a Person], term: &str) -> Option<&'a str> {
  if term.is_empty() {
    return None;
  }
  let needle = term.to_lowercase();
  filtered
    .iter()
    .find(|p| p.name.to_lowercase() == needle)
    .or_else(|| filtered.first())
    .map(|p| p.id.as_str())
}
