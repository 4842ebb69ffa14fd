use std::collections::BTreeSet;

use crate::{color::Color, node::Node, node::Pos};

/// A node stripped down to the parts that matter for structural comparison.
/// `KNOWN` nodes are fungible between slots of the same color, so their
/// position is dropped; hidden nodes are distinguished by `original_pos`
/// since that's the only thing that tells two still-unknown slots apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeDescriptor {
  Known(Color),
  Unknown(Pos),
  UnknownRevealed(Pos),
}

impl From<&Node> for NodeDescriptor {
  fn from(node: &Node) -> Self {
    match *node {
      Node::Known { color, .. } => NodeDescriptor::Known(color),
      Node::Unknown { pos } => NodeDescriptor::Unknown(pos),
      Node::UnknownRevealed { pos } => NodeDescriptor::UnknownRevealed(pos),
      Node::Empty { .. } => unreachable!("EMPTY never appears in a canonicalized tube"),
    }
  }
}

/// The order-independent board key used for cycle detection and dominance
/// pruning. Tubes contribute their descriptor sequence to a *set*, not a
/// multiset: two tubes with identical contents collapse to a single entry,
/// matching `Game._to_frozensets` in the original prototype (`frozenset(...)`
/// over tube tuples). This is a faithfully-reproduced quirk, not a design
/// choice made here: see DESIGN.md.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructuralKey(BTreeSet<Vec<NodeDescriptor>>);

impl StructuralKey {
  pub fn from_tubes<'a>(tubes: impl IntoIterator<Item = &'a [Node]>) -> Self {
    Self(
      tubes
        .into_iter()
        .map(|tube| tube.iter().map(NodeDescriptor::from).collect())
        .collect(),
    )
  }
}
