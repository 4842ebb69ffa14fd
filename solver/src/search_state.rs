use std::{cmp::Ordering, rc::Rc};

use tubes_core::{Game, Operation};

#[derive(Debug)]
enum PathNode {
  Nil,
  Cons(Operation, Rc<PathNode>),
}

/// An immutable, shareable move path. Extending one only allocates a single
/// new cell and bumps a refcount on the shared tail, rather than copying the
/// whole path on every expansion -- the same "owning predecessor link" idiom
/// `Game` itself uses for its move history.
#[derive(Clone, Debug)]
pub struct Path {
  head: Rc<PathNode>,
  len: usize,
}

impl Path {
  pub fn new() -> Self {
    Self {
      head: Rc::new(PathNode::Nil),
      len: 0,
    }
  }

  pub fn pushed(&self, op: Operation) -> Self {
    Self {
      head: Rc::new(PathNode::Cons(op, self.head.clone())),
      len: self.len + 1,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn to_vec(&self) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(self.len);
    let mut node = &self.head;
    loop {
      match node.as_ref() {
        PathNode::Nil => break,
        PathNode::Cons(op, rest) => {
          ops.push(*op);
          node = rest;
        }
      }
    }
    ops.reverse();
    ops
  }
}

impl Default for Path {
  fn default() -> Self {
    Self::new()
  }
}

/// A process-wide (here: per-solve-call) monotonic counter, used only to
/// break ties in the search queue's priority order. Safe as a plain counter
/// since the solver never runs concurrently (see spec's single-threaded
/// resource model).
#[derive(Default)]
pub struct InstanceIdGen(u64);

impl InstanceIdGen {
  pub fn next(&mut self) -> u64 {
    let id = self.0;
    self.0 += 1;
    id
  }
}

/// A node in the search frontier: a board state plus the path that reached
/// it and its FIFO tie-break id.
#[derive(Clone)]
pub struct SearchState {
  game: Rc<Game>,
  path: Path,
  instance_id: u64,
}

impl SearchState {
  pub fn new(game: Rc<Game>, path: Path, instance_id: u64) -> Self {
    Self {
      game,
      path,
      instance_id,
    }
  }

  pub fn game(&self) -> &Rc<Game> {
    &self.game
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn instance_id(&self) -> u64 {
    self.instance_id
  }
}

/// Priority tuple for boards with no hidden units: `(path_length, segments,
/// completed_group_count, instance_id)`, lower is better.
pub type NoUnknownKey = (usize, usize, usize, u64);

pub fn no_unknown_key(state: &SearchState) -> NoUnknownKey {
  let game = state.game();
  (
    state.path().len(),
    game.segments(),
    game.completed_group_count(),
    state.instance_id(),
  )
}

/// Priority tuple for boards with hidden units. The first three fields are
/// negated/inverted so that "more revealed", "more revealable next", and
/// "just revealed" all sort as smaller (better).
pub type WithUnknownKey = (i64, i64, u8, usize, usize, usize, u64);

pub fn with_unknown_key(state: &SearchState) -> WithUnknownKey {
  let game = state.game();
  (
    -(game.unknown_revealed_count() as i64),
    -(game.revealable_in_one() as i64),
    if game.revealed_new() { 0 } else { 1 },
    state.path().len(),
    game.segments(),
    game.completed_group_count(),
    state.instance_id(),
  )
}

/// Wraps a `SearchState` with a precomputed priority key so it can sit in a
/// `BinaryHeap`, which is a max-heap; reversing the key comparison turns it
/// into the min-heap the search wants.
pub struct HeapItem<K> {
  pub key: K,
  pub state: SearchState,
}

impl<K: Eq> PartialEq for HeapItem<K> {
  fn eq(&self, other: &Self) -> bool {
    self.key == other.key
  }
}

impl<K: Eq> Eq for HeapItem<K> {}

impl<K: Ord> PartialOrd for HeapItem<K> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl<K: Ord> Ord for HeapItem<K> {
  fn cmp(&self, other: &Self) -> Ordering {
    other.key.cmp(&self.key)
  }
}
