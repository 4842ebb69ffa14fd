use std::{ops::Deref, rc::Rc};

use crate::node::Node;

/// An ordered bottom-to-top stack of `Node`s, bounded by the board's
/// `capacity`. Cheap to clone: successor `Game`s share the `Rc` for every
/// tube a move didn't touch, and only allocate a fresh `Vec` for the one or
/// two tubes a pour actually changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tube(Rc<Vec<Node>>);

impl Tube {
  pub fn new(nodes: Vec<Node>) -> Self {
    Self(Rc::new(nodes))
  }

  pub fn top(&self) -> Option<&Node> {
    self.0.last()
  }

  pub fn bottom(&self) -> Option<&Node> {
    self.0.first()
  }

  pub fn as_slice(&self) -> &[Node] {
    &self.0
  }

  /// `true` iff every node is `KNOWN` and shares one color.
  pub fn is_uniform_known_color(&self) -> bool {
    match self.0.split_first() {
      None => false,
      Some((first, rest)) => {
        first.is_known() && rest.iter().all(|n| n.color() == first.color())
      }
    }
  }

  pub fn is_completed(&self, capacity: usize) -> bool {
    self.0.len() == capacity
      && self.is_uniform_known_color()
  }
}

impl Deref for Tube {
  type Target = [Node];

  fn deref(&self) -> &[Node] {
    &self.0
  }
}
