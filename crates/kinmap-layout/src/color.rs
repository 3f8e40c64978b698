//! Hex colors as stored on relationship types.

use std::{fmt, str::FromStr};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
  /// Fill for people whose primary relationship names no known type.
  pub const UNMATCHED: Rgb = Rgb(0xa3, 0xa3, 0xa3);
  /// Outline of the selected node.
  pub const SELECTED: Rgb = Rgb(0xff, 0xff, 0xff);
  /// Outline of the search-highlighted node.
  pub const HIGHLIGHTED: Rgb = Rgb(0x3b, 0x82, 0xf6);
  pub const EDGE: Rgb = Rgb(0x44, 0x44, 0x44);
  pub const LABEL: Rgb = Rgb(0xf0, 0xf0, 0xf0);

  /// Parse `s`, falling back to [`Rgb::UNMATCHED`].
  pub fn parse_or_unmatched(s: &str) -> Rgb { s.parse().unwrap_or(Rgb::UNMATCHED) }
}

impl FromStr for Rgb {
  type Err = Error;

  /// Accepts `#rgb` and `#rrggbb`, case-insensitive.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bad = || Error::InvalidColor(s.to_owned());
    let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
    if !hex.is_ascii() {
      return Err(bad());
    }
    let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());

    match hex.len() {
      3 => {
        let mut c = [0u8; 3];
        for (i, slot) in c.iter_mut().enumerate() {
          let v = channel(&hex[i..i + 1])?;
          *slot = v * 0x11;
        }
        Ok(Rgb(c[0], c[1], c[2]))
      }
      6 => Ok(Rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
      _ => Err(bad()),
    }
  }
}

impl fmt::Display for Rgb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_long_and_short_forms() {
    assert_eq!("#22c55e".parse::<Rgb>().unwrap(), Rgb(0x22, 0xc5, 0x5e));
    assert_eq!("#FFF".parse::<Rgb>().unwrap(), Rgb::SELECTED);
    assert_eq!("#000".parse::<Rgb>().unwrap(), Rgb(0, 0, 0));
  }

  #[test]
  fn rejects_garbage() {
    for s in ["", "22c55e", "#12345", "#ggg", "#ééé"] {
      assert!(s.parse::<Rgb>().is_err(), "{s:?} should not parse");
    }
    assert_eq!(Rgb::parse_or_unmatched("red"), Rgb::UNMATCHED);
  }

  #[test]
  fn displays_as_lower_hex() {
    assert_eq!(Rgb::HIGHLIGHTED.to_string(), "#3b82f6");
  }
}
