//! Selection and search emphasis.

use crate::color::Rgb;

pub const NODE_RADIUS: f64 = 20.0;
pub const EMPHASIZED_RADIUS: f64 = 25.0;
pub const OUTLINE_WIDTH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
  pub radius:        f64,
  pub outline:       Option<Rgb>,
  pub outline_width: f64,
}

impl NodeStyle {
  pub const PLAIN: NodeStyle =
    NodeStyle { radius: NODE_RADIUS, outline: None, outline_width: 0.0 };

  pub fn is_emphasized(&self) -> bool { self.outline.is_some() }
}

/// Which node is selected and which one search points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
  pub selected:    Option<String>,
  pub highlighted: Option<String>,
}

impl Focus {
  /// Selected styling wins when a node is both selected and highlighted.
  pub fn style_for(&self, id: &str) -> NodeStyle {
    let is = |slot: &Option<String>| slot.as_deref() == Some(id);
    let outline = if is(&self.selected) {
      Rgb::SELECTED
    } else if is(&self.highlighted) {
      Rgb::HIGHLIGHTED
    } else {
      return NodeStyle::PLAIN;
    };
    NodeStyle { radius: EMPHASIZED_RADIUS, outline: Some(outline), outline_width: OUTLINE_WIDTH }
  }

  /// Drop every reference to a person that no longer exists. Returns whether
  /// the selection was cleared.
  pub fn forget(&mut self, id: &str) -> bool {
    if self.highlighted.as_deref() == Some(id) {
      self.highlighted = None;
    }
    if self.selected.as_deref() == Some(id) {
      self.selected = None;
      return true;
    }
    false
  }
}
