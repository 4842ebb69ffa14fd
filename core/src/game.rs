use std::{
  cell::OnceCell,
  collections::BTreeSet,
  hash::{Hash, Hasher},
  rc::Rc,
};

use crate::{
  color::Color,
  error::{TubesError, TubesResult},
  mode::GameMode,
  node::{Node, Pos},
  op::Operation,
  structural_key::StructuralKey,
  tube::Tube,
};

#[derive(Clone, Default)]
struct Derived {
  structural_key: OnceCell<StructuralKey>,
  is_winning_state: OnceCell<bool>,
  unknown_count: OnceCell<usize>,
  unknown_revealed_nodes: OnceCell<Rc<Vec<(Node, usize, usize)>>>,
  segments: OnceCell<usize>,
  completed_group_count: OnceCell<usize>,
  is_meaningful_state: OnceCell<bool>,
  revealable_in_one: OnceCell<usize>,
}

/// An immutable board. Every move produces a brand new `Game`; the
/// predecessor is reachable through `previous_state` for `Undo` and for
/// reconstructing the intermediate states of a solved path.
#[derive(Clone)]
pub struct Game {
  tubes: Vec<Tube>,
  capacity: usize,
  mode: GameMode,
  undo_count: u32,
  contains_unknown: bool,
  previous_state: Option<Rc<Game>>,
  all_revealed: Rc<BTreeSet<Pos>>,
  revealed_new: bool,
  derived: Derived,
}

impl Game {
  /// Builds a canonicalized `Game` from raw, possibly ragged tubes: trims
  /// trailing `EMPTY`s, rejects an `EMPTY` below a non-empty node, checks
  /// the count invariants from spec §3, and runs the best-effort
  /// auto-completion pass. `capacity` is inferred from the tubes' common
  /// length when `None`.
  pub fn new(
    tubes_raw: Vec<Vec<Node>>,
    capacity: Option<usize>,
    mode: GameMode,
    undo_count: u32,
  ) -> TubesResult<Self> {
    let trimmed: Vec<Vec<Node>> = tubes_raw
      .into_iter()
      .map(Self::trim_tube)
      .collect::<TubesResult<_>>()?;

    let capacity = match capacity {
      Some(c) => c,
      None => {
        let mut lengths = trimmed.iter().map(Vec::len);
        let first = lengths.next().ok_or_else(|| {
          TubesError::InvalidBoard("board has no tubes".to_string())
        })?;
        if lengths.any(|len| len != first) {
          return Err(TubesError::InvalidBoard(
            "all tubes must have the same length when capacity is not given".to_string(),
          ));
        }
        first
      }
    };
    if capacity == 0 {
      return Err(TubesError::InvalidBoard("capacity must be positive".to_string()));
    }

    Self::validate_counts(&trimmed, capacity)?;
    let trimmed = Self::auto_complete(trimmed, capacity);

    let contains_unknown = trimmed.iter().any(|tube| tube.iter().any(Node::is_hidden));
    let tubes = trimmed.into_iter().map(Tube::new).collect();

    Ok(Self {
      tubes,
      capacity,
      mode,
      undo_count,
      contains_unknown,
      previous_state: None,
      all_revealed: Rc::new(BTreeSet::new()),
      revealed_new: false,
      derived: Derived::default(),
    })
  }

  fn with_history(
    mut self,
    previous_state: Option<Rc<Game>>,
    all_revealed: Rc<BTreeSet<Pos>>,
    revealed_new: bool,
  ) -> Self {
    self.previous_state = previous_state;
    self.all_revealed = all_revealed;
    self.revealed_new = revealed_new;
    self
  }

  fn trim_tube(raw: Vec<Node>) -> TubesResult<Vec<Node>> {
    let mut kept_reversed = Vec::with_capacity(raw.len());
    let mut empty_ended = false;
    for node in raw.into_iter().rev() {
      if node.is_empty() {
        if empty_ended {
          return Err(TubesError::InvalidBoard(
            "EMPTY node lies below a non-empty node".to_string(),
          ));
        }
      } else {
        empty_ended = true;
        kept_reversed.push(node);
      }
    }
    kept_reversed.reverse();
    Ok(kept_reversed)
  }

  fn validate_counts(tubes: &[Vec<Node>], capacity: usize) -> TubesResult<()> {
    use std::collections::HashMap;

    if tubes.iter().any(|tube| tube.len() > capacity) {
      return Err(TubesError::InvalidBoard(
        "a tube's length exceeds capacity".to_string(),
      ));
    }

    let mut known_counts: HashMap<Color, usize> = HashMap::new();
    let mut hidden_total = 0usize;
    for tube in tubes {
      for node in tube {
        match node {
          Node::Known { color, .. } => *known_counts.entry(*color).or_insert(0) += 1,
          Node::Unknown { .. } | Node::UnknownRevealed { .. } => hidden_total += 1,
          Node::Empty { .. } => unreachable!("tubes are already trimmed"),
        }
      }
    }
    for (color, count) in &known_counts {
      if *count > capacity {
        return Err(TubesError::InvalidBoard(format!(
          "color {color} appears {count} times, more than capacity {capacity}"
        )));
      }
    }
    let known_total: usize = known_counts.values().sum();
    if (known_total + hidden_total) % capacity != 0 {
      return Err(TubesError::InvalidBoard(
        "total unit count is not a multiple of capacity".to_string(),
      ));
    }
    Ok(())
  }

  /// Best-effort: if exactly one color is short of a full quota and the
  /// hidden units on the board exactly cover that shortfall, every hidden
  /// node is known to be that color. Leaves the board untouched otherwise;
  /// this can never fail loudly by construction (see spec §7, "fail-open").
  fn auto_complete(tubes: Vec<Vec<Node>>, capacity: usize) -> Vec<Vec<Node>> {
    use std::collections::HashMap;

    let mut known_counts: HashMap<Color, usize> = HashMap::new();
    let mut hidden_total = 0usize;
    for tube in &tubes {
      for node in tube {
        match node {
          Node::Known { color, .. } => *known_counts.entry(*color).or_insert(0) += 1,
          Node::Unknown { .. } | Node::UnknownRevealed { .. } => hidden_total += 1,
          Node::Empty { .. } => {}
        }
      }
    }

    let mut partial_colors = known_counts
      .iter()
      .filter(|&(_, &count)| count > 0 && count < capacity);
    let only_partial = match (partial_colors.next(), partial_colors.next()) {
      (Some((&color, &count)), None) if hidden_total == capacity - count => color,
      _ => return tubes,
    };

    tubes
      .into_iter()
      .map(|tube| {
        tube
          .into_iter()
          .map(|node| match node {
            Node::Unknown { pos } | Node::UnknownRevealed { pos } => Node::Known {
              pos,
              color: only_partial,
            },
            other => other,
          })
          .collect()
      })
      .collect()
  }

  pub fn tubes(&self) -> &[Tube] {
    &self.tubes
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn mode(&self) -> GameMode {
    self.mode
  }

  pub fn undo_count(&self) -> u32 {
    self.undo_count
  }

  pub fn contains_unknown(&self) -> bool {
    self.contains_unknown
  }

  pub fn revealed_new(&self) -> bool {
    self.revealed_new
  }

  pub fn all_revealed(&self) -> &BTreeSet<Pos> {
    &self.all_revealed
  }

  pub fn previous_state(&self) -> Option<&Rc<Game>> {
    self.previous_state.as_ref()
  }

  pub fn structural_key(&self) -> &StructuralKey {
    self
      .derived
      .structural_key
      .get_or_init(|| StructuralKey::from_tubes(self.tubes.iter().map(Tube::as_slice)))
  }

  /// Legal moves from this state; see spec §4.1.
  pub fn ops(&self) -> Vec<Operation> {
    let mut available_dests = Vec::new();
    let mut seen_empty_dest = false;
    for (i, tube) in self.tubes.iter().enumerate() {
      if tube.len() < self.capacity {
        if tube.is_empty() {
          if seen_empty_dest {
            continue;
          }
          seen_empty_dest = true;
        }
        available_dests.push(i);
      }
    }

    let mut result = Vec::new();
    for (src, src_tube) in self.tubes.iter().enumerate() {
      if src_tube.is_empty() || src_tube.is_completed(self.capacity) {
        continue;
      }
      let op_item = *self.operative_item(src_tube);

      let mut temp_result = Vec::new();
      for &dst in &available_dests {
        if src == dst {
          continue;
        }
        let dst_tube = &self.tubes[dst];

        if op_item.is_known() && src_tube.is_uniform_known_color() && dst_tube.is_empty() {
          continue;
        }

        if op_item.is_known()
          && !dst_tube.is_empty()
          && dst_tube.top().and_then(Node::color) == op_item.color()
          && dst_tube.is_uniform_known_color()
        {
          temp_result = vec![Operation::StepForward { src, dst }];
          break;
        }

        if dst_tube.is_empty() {
          temp_result.push(Operation::StepForward { src, dst });
          continue;
        }

        if dst_tube.top().is_some_and(Node::is_known)
          && dst_tube.top().and_then(Node::color) == op_item.color()
        {
          temp_result.push(Operation::StepForward { src, dst });
        }
      }
      result.extend(temp_result);
    }

    if self.contains_unknown && self.previous_state.is_some() && self.undo_count > 0 {
      result.push(Operation::Undo);
    }

    result
  }

  fn operative_item<'a>(&self, tube: &'a Tube) -> &'a Node {
    match self.mode {
      GameMode::Queue => tube.bottom(),
      GameMode::Normal | GameMode::NoCombo => tube.top(),
    }
    .expect("operative tube is non-empty")
  }

  /// Applies a single operation, producing the successor state. See spec
  /// §4.2. Applying a `StepForward` not present in `ops()` is a programmer
  /// error (debug-checked, not a recoverable `Err`); applying `Undo` with no
  /// predecessor is the one case the caller can legitimately trigger, and is
  /// reported as `TubesError::InvalidOperation`.
  pub fn apply_op(&self, op: Operation) -> TubesResult<Game> {
    match op {
      Operation::Undo => self.apply_undo(),
      Operation::StepForward { src, dst } => self.apply_step_forward(src, dst),
    }
  }

  fn apply_undo(&self) -> TubesResult<Game> {
    let prev = self.previous_state.as_ref().ok_or_else(|| {
      TubesError::InvalidOperation("Undo has no predecessor state".to_string())
    })?;

    let new_tubes: Vec<Vec<Node>> = prev
      .tubes
      .iter()
      .map(|tube| {
        tube
          .iter()
          .map(|node| {
            if self.all_revealed.contains(&node.pos()) {
              Node::UnknownRevealed { pos: node.pos() }
            } else {
              *node
            }
          })
          .collect()
      })
      .collect();

    let new_state = Game::new(
      new_tubes,
      Some(self.capacity),
      self.mode,
      self.undo_count.saturating_sub(1),
    )?;
    Ok(new_state.with_history(
      prev.previous_state.clone(),
      self.all_revealed.clone(),
      false,
    ))
  }

  fn apply_step_forward(&self, src: usize, dst: usize) -> TubesResult<Game> {
    debug_assert_ne!(src, dst, "StepForward must move between distinct tubes");
    let mut new_tubes: Vec<Vec<Node>> = self.tubes.iter().map(|t| t.to_vec()).collect();

    let op_item = match self.mode {
      GameMode::Queue => new_tubes[src].first().copied(),
      GameMode::Normal | GameMode::NoCombo => new_tubes[src].last().copied(),
    }
    .expect("apply_step_forward called on an empty source tube");

    match op_item {
      Node::UnknownRevealed { .. } => {
        let moved = match self.mode {
          GameMode::Queue => new_tubes[src].remove(0),
          GameMode::Normal | GameMode::NoCombo => {
            new_tubes[src].pop().expect("checked non-empty above")
          }
        };
        new_tubes[dst].push(moved);
      }
      Node::Known { color, .. } => match self.mode {
        GameMode::NoCombo => {
          let moved = new_tubes[src].pop().expect("checked non-empty above");
          new_tubes[dst].push(moved);
        }
        GameMode::Normal => {
          while new_tubes[dst].len() < self.capacity {
            let matches = new_tubes[src]
              .last()
              .is_some_and(|n| n.is_known() && n.color() == Some(color));
            if !matches {
              break;
            }
            let moved = new_tubes[src].pop().unwrap();
            new_tubes[dst].push(moved);
          }
        }
        GameMode::Queue => {
          while new_tubes[dst].len() < self.capacity {
            let matches = new_tubes[src]
              .first()
              .is_some_and(|n| n.is_known() && n.color() == Some(color));
            if !matches {
              break;
            }
            let moved = new_tubes[src].remove(0);
            new_tubes[dst].push(moved);
          }
        }
      },
      Node::Unknown { .. } => {
        // Neither tube changes: a still-hidden operative item can only target
        // an empty destination, and nothing is committed until it's revealed.
        // The reveal step below then flips it to UNKNOWN_REVEALED in place.
      }
      Node::Empty { .. } => {
        unreachable!("ops() never yields a move whose operative item is EMPTY")
      }
    }

    let revealed_pos = new_tubes[src].last().and_then(|node| {
      node.is_unknown().then(|| node.pos())
    });
    if let Some(pos) = revealed_pos {
      *new_tubes[src].last_mut().unwrap() = Node::UnknownRevealed { pos };
    }

    let new_state = Game::new(new_tubes, Some(self.capacity), self.mode, self.undo_count)?;

    let mut all_revealed = (*self.all_revealed).clone();
    let revealed_new = if let Some(pos) = revealed_pos {
      all_revealed.insert(pos);
      true
    } else {
      false
    };

    Ok(new_state.with_history(
      Some(Rc::new(self.clone())),
      Rc::new(all_revealed),
      revealed_new,
    ))
  }

  pub fn is_winning_state(&self) -> bool {
    *self.derived.is_winning_state.get_or_init(|| {
      self
        .tubes
        .iter()
        .all(|tube| tube.is_empty() || tube.is_completed(self.capacity))
    })
  }

  pub fn unknown_count(&self) -> usize {
    *self.derived.unknown_count.get_or_init(|| {
      self
        .tubes
        .iter()
        .flat_map(|t| t.iter())
        .filter(|n| n.is_unknown())
        .count()
    })
  }

  /// `(node, tube_index, height_from_top)` for every `UNKNOWN_REVEALED` node.
  pub fn unknown_revealed_nodes(&self) -> Rc<Vec<(Node, usize, usize)>> {
    self
      .derived
      .unknown_revealed_nodes
      .get_or_init(|| {
        let mut result = Vec::new();
        for (group_num, tube) in self.tubes.iter().enumerate() {
          for (node_index, node) in tube.iter().enumerate() {
            if node.is_unknown_revealed() {
              let height_from_top = self.capacity - node_index - 1;
              result.push((*node, group_num, height_from_top));
            }
          }
        }
        Rc::new(result)
      })
      .clone()
  }

  pub fn unknown_revealed_count(&self) -> usize {
    self.unknown_revealed_nodes().len()
  }

  pub fn is_meaningful_state(&self) -> bool {
    *self.derived.is_meaningful_state.get_or_init(|| {
      self.revealed_new
        && self
          .tubes
          .iter()
          .any(|tube| tube.iter().any(Node::is_unknown_revealed))
    })
  }

  pub fn segments(&self) -> usize {
    *self.derived.segments.get_or_init(|| {
      let mut segments = 0;
      for tube in &self.tubes {
        let mut last: Option<Node> = None;
        for (i, &node) in tube.iter().enumerate() {
          if i == 0 {
            segments += 1;
          } else {
            let last_node = last.unwrap();
            if std::mem::discriminant(&last_node) != std::mem::discriminant(&node) {
              segments += 1;
            } else if node.is_hidden() {
              segments += 1;
            } else if node.color() != last_node.color() {
              segments += 1;
            }
          }
          last = Some(node);
        }
      }
      segments
    })
  }

  pub fn completed_group_count(&self) -> usize {
    *self.derived.completed_group_count.get_or_init(|| {
      self
        .tubes
        .iter()
        .filter(|tube| tube.is_completed(self.capacity))
        .count()
    })
  }

  pub fn heuristic(&self) -> (usize, usize) {
    (self.segments(), self.completed_group_count())
  }

  /// Count of enumerated operations whose successor state reveals at least
  /// one previously-hidden node.
  pub fn revealable_in_one(&self) -> usize {
    *self.derived.revealable_in_one.get_or_init(|| {
      self
        .ops()
        .into_iter()
        .filter(|op| matches!(op, Operation::StepForward { .. }))
        .filter(|&op| {
          self
            .apply_op(op)
            .map(|g| g.revealed_new)
            .unwrap_or(false)
        })
        .count()
    })
  }
}

impl PartialEq for Game {
  fn eq(&self, other: &Self) -> bool {
    self.undo_count == other.undo_count && self.structural_key() == other.structural_key()
  }
}

impl Eq for Game {}

impl Hash for Game {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.structural_key().hash(state);
    self.undo_count.hash(state);
  }
}

#[cfg(test)]
mod tests {
  use googletest::prelude::*;
  use rstest::rstest;

  use super::*;
  use crate::test_util::game_from_tubes;

  #[test]
  fn trivial_board_is_already_winning() {
    let game = game_from_tubes(&["RR", "BB"], 2, GameMode::Normal).unwrap();
    assert!(game.is_winning_state());
    assert!(game.ops().is_empty());
  }

  #[test]
  fn empty_tube_symmetry_keeps_only_the_first_empty_destination() {
    let game = game_from_tubes(&["RB", "BR", "", ""], 2, GameMode::Normal).unwrap();
    let empty_dests: Vec<_> = game
      .ops()
      .into_iter()
      .filter_map(|op| match op {
        Operation::StepForward { src: 0, dst } if game.tubes[dst].is_empty() => Some(dst),
        _ => None,
      })
      .collect();
    assert_eq!(empty_dests, vec![2]);
  }

  #[test]
  fn uniform_source_into_empty_is_never_enumerated() {
    let game = game_from_tubes(&["RR", ""], 2, GameMode::Normal).unwrap();
    assert!(game.ops().is_empty());
  }

  #[test]
  fn dedicated_destination_short_circuits_other_candidates() {
    // Tube 0 is a single red unit; tube 1 is red-topped-and-uniform, tube 2 is empty.
    // Tube 0's only candidate should be the dedicated destination (tube 1), not tube 2.
    let game = game_from_tubes(&["R", "RR", ""], 3, GameMode::Normal).unwrap();
    let from_zero: Vec<_> = game
      .ops()
      .into_iter()
      .filter(|op| matches!(op, Operation::StepForward { src: 0, .. }))
      .collect();
    assert_eq!(from_zero, vec![Operation::StepForward { src: 0, dst: 1 }]);
  }

  #[test]
  fn apply_op_preserves_construction_invariants_and_changes_structural_key() {
    let game = game_from_tubes(&["RRB", "BBR", ""], 3, GameMode::Normal).unwrap();
    for op in game.ops() {
      let next = game.apply_op(op).expect("ops() only yields legal moves");
      assert!(next.tubes().iter().all(|t| t.len() <= next.capacity()));
      if !matches!(op, Operation::StepForward { .. }) {
        continue;
      }
      assert_ne!(next.structural_key(), game.structural_key());
    }
  }

  #[rstest]
  #[case::no_combo_moves_exactly_one_unit(GameMode::NoCombo, 1)]
  #[case::normal_stops_at_the_top_color_run(GameMode::Normal, 1)]
  fn pouring_a_non_uniform_source_respects_mode(#[case] mode: GameMode, #[case] expected_dst_len: usize) {
    // Top run is a single B (the R beneath it differs in color), so both
    // modes agree here; they diverge once the top run is longer than one
    // (see `normal_mode_pours_a_maximal_run_of_more_than_one`).
    let game = game_from_tubes(&["RRB", ""], 3, mode).unwrap();
    let next = game
      .apply_op(Operation::StepForward { src: 0, dst: 1 })
      .unwrap();
    assert_eq!(next.tubes()[1].len(), expected_dst_len);
  }

  #[test]
  fn normal_mode_pours_a_maximal_run_of_more_than_one() {
    let game = game_from_tubes(&["BRR", ""], 3, GameMode::Normal).unwrap();
    let next = game
      .apply_op(Operation::StepForward { src: 0, dst: 1 })
      .unwrap();
    assert_eq!(next.tubes()[1].len(), 2);
  }

  #[test]
  fn queue_mode_pours_from_the_bottom() {
    let game = game_from_tubes(&["RRB", ""], 3, GameMode::Queue).unwrap();
    let next = game
      .apply_op(Operation::StepForward { src: 0, dst: 1 })
      .unwrap();
    assert_eq!(
      next.tubes()[1].get(0).unwrap().color(),
      Some(Color::new(220, 20, 60))
    );
  }

  #[test]
  fn reveal_then_undo_restores_shape_but_keeps_unknown_revealed() {
    // Two partial colors keep this ambiguous for auto-completion, so the
    // unknowns stay unknown; the empty tube is the only legal destination
    // for either hidden top.
    let game = game_from_tubes_with_undo(&["R.", "G.", ""], 2, GameMode::Normal, 1).unwrap();
    assert!(game.contains_unknown());

    // A still-hidden operative item can only be attempted against an empty
    // tube, and that attempt reveals it in place without moving anything.
    let after_first = game
      .apply_op(Operation::StepForward { src: 0, dst: 2 })
      .unwrap();
    assert!(after_first.revealed_new());
    assert!(after_first.tubes()[0]
      .iter()
      .any(|n| n.is_unknown_revealed() && n.pos() == (0, 1)));
    assert!(after_first.tubes()[2].is_empty());

    // Now that it's revealed, the same move actually transfers one unit.
    let after_second = after_first
      .apply_op(Operation::StepForward { src: 0, dst: 2 })
      .unwrap();
    assert!(!after_second.revealed_new());
    assert_eq!(after_second.tubes()[0].len(), 1);
    assert_eq!(after_second.tubes()[2].len(), 1);
    assert!(after_second.all_revealed().contains(&(0, 1)));

    let undone = after_second.apply_op(Operation::Undo).unwrap();
    assert_eq!(undone.tubes()[0].len(), after_first.tubes()[0].len());
    assert!(undone.tubes()[0]
      .iter()
      .any(|n| n.is_unknown_revealed() && n.pos() == (0, 1)));
    assert_eq!(undone.undo_count(), 0);
    assert!(undone.all_revealed().contains(&(0, 1)));
  }

  #[test]
  fn undo_without_a_predecessor_is_invalid_operation() {
    let game = game_from_tubes(&["R.", "G.", ""], 2, GameMode::Normal).unwrap();
    assert!(matches!(
      game.apply_op(Operation::Undo),
      Err(TubesError::InvalidOperation(_))
    ));
  }

  #[test]
  fn auto_completion_fills_the_lone_partial_color() {
    // Capacity 2: one R known, one slot short; the single unknown must be R.
    let game = game_from_tubes(&["R.", ""], 2, GameMode::Normal).unwrap();
    assert!(!game.contains_unknown());
    assert_eq!(
      game.tubes()[0].get(1).unwrap().color(),
      Some(Color::new(220, 20, 60))
    );
  }

  #[test]
  fn auto_completion_is_a_no_op_when_ambiguous() {
    // Two colors both partial: R has 1/2, G has 1/2, with two unknowns -- ambiguous.
    let game = game_from_tubes(&["R.", "G."], 2, GameMode::Normal).unwrap();
    assert!(game.contains_unknown());
  }

  #[gtest]
  fn winning_state_has_no_step_forward_ops() -> googletest::Result<()> {
    let game = game_from_tubes(&["RR", "BB", ""], 2, GameMode::Normal).unwrap();
    expect_true!(game.is_winning_state());
    expect_that!(
      game.ops(),
      not(contains(matches_pattern!(Operation::StepForward { .. })))
    );
    Ok(())
  }

  #[gtest]
  fn structural_key_ignores_tube_order() -> googletest::Result<()> {
    let a = game_from_tubes(&["RR", "BB"], 2, GameMode::Normal).unwrap();
    let b = game_from_tubes(&["BB", "RR"], 2, GameMode::Normal).unwrap();
    expect_eq!(a.structural_key(), b.structural_key());
    Ok(())
  }

  #[test]
  fn segments_counts_hidden_nodes_individually() {
    // Two partial colors keep auto-completion from collapsing the unknowns.
    let game = game_from_tubes(&["RG..", ""], 4, GameMode::Normal).unwrap();
    // R run (1) + G run (1) + two individually-counted unknowns (2).
    assert_eq!(game.segments(), 4);
  }
}
