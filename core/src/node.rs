use crate::color::Color;

/// `(col, row)`, the slot a node originates from on the input board. This is
/// the identity that lets `Undo` and reveal-tracking tell hidden slots apart
/// even though their color is unknown.
pub type Pos = (u32, u32);

/// A single unit in a tube. `EMPTY` only ever appears transiently while
/// parsing raw input; a canonicalized `Game` never contains one (trailing
/// `EMPTY`s are trimmed during construction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Node {
  Empty { pos: Pos },
  Known { pos: Pos, color: Color },
  Unknown { pos: Pos },
  UnknownRevealed { pos: Pos },
}

impl Node {
  pub fn pos(&self) -> Pos {
    match *self {
      Node::Empty { pos }
      | Node::Known { pos, .. }
      | Node::Unknown { pos }
      | Node::UnknownRevealed { pos } => pos,
    }
  }

  pub fn color(&self) -> Option<Color> {
    match *self {
      Node::Known { color, .. } => Some(color),
      _ => None,
    }
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, Node::Empty { .. })
  }

  pub fn is_known(&self) -> bool {
    matches!(self, Node::Known { .. })
  }

  pub fn is_unknown(&self) -> bool {
    matches!(self, Node::Unknown { .. })
  }

  pub fn is_unknown_revealed(&self) -> bool {
    matches!(self, Node::UnknownRevealed { .. })
  }

  pub fn is_hidden(&self) -> bool {
    self.is_unknown() || self.is_unknown_revealed()
  }

  /// Reinterprets this node as `UNKNOWN_REVEALED`, keeping its `original_pos`.
  pub fn reveal(&self) -> Node {
    Node::UnknownRevealed { pos: self.pos() }
  }
}
