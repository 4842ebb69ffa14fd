use std::{collections::BTreeSet, fmt, rc::Rc};

use tubes_core::{Game, Pos, TubesResult};
use tubes_solver::{solve, SolverOptions};

/// The printable result of solving a board, per spec §6's "Plan output"
/// rule: a flat list of lines, either the winning move list or the
/// not-yet-winning preface plus interleaved "Update node" instructions.
#[derive(Clone, Debug)]
pub struct PlanReport {
  winning: bool,
  lines: Vec<String>,
}

impl PlanReport {
  pub fn is_winning(&self) -> bool {
    self.winning
  }

  pub fn lines(&self) -> &[String] {
    &self.lines
  }
}

impl fmt::Display for PlanReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, line) in self.lines.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{line}")?;
    }
    Ok(())
  }
}

/// Solves `game` and turns the result into a `PlanReport`. Mirrors
/// `solve_and_print`: for fully-known boards `solve` only ever returns a
/// winning state (or the `Unsolvable` error, which propagates); for
/// hidden-unit boards it always succeeds with the best candidate found,
/// which may or may not be winning.
pub fn run_and_report(game: Game, options: SolverOptions) -> TubesResult<PlanReport> {
  let result = solve(Rc::new(game.clone()), options)?;
  let winning = result.game().is_winning_state();

  let mut lines = Vec::new();
  if winning {
    for op in result.path().to_vec() {
      lines.push(op.to_string());
    }
  } else {
    lines.push("Follow the steps, update the blocks, and run again:".to_string());
    let mut cursor = game;
    for op in result.path().to_vec() {
      // solve()'s returned path always spans all the way back to the board
      // passed in here, including through Regime B's frontier reseeds, so
      // replaying it from `game` never hits a move illegal against `cursor`.
      let next = cursor
        .apply_op(op)
        .expect("a solved path only ever replays moves legal against its own states");
      lines.push(op.to_string());
      if next.unknown_revealed_count() > cursor.unknown_revealed_count() {
        if let Some(pos) = newly_revealed_pos(&cursor, &next) {
          lines.push(format!("Update node at column {}, row {}", pos.0 + 1, pos.1 + 1));
        }
      }
      cursor = next;
    }
  }

  Ok(PlanReport { winning, lines })
}

fn newly_revealed_pos(before: &Game, after: &Game) -> Option<Pos> {
  let before_positions: BTreeSet<Pos> = before.unknown_revealed_nodes().iter().map(|(n, _, _)| n.pos()).collect();
  after
    .unknown_revealed_nodes()
    .iter()
    .map(|(n, _, _)| n.pos())
    .find(|pos| !before_positions.contains(pos))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tubes_core::test_util::game_from_tubes;
  use tubes_core::GameMode;

  #[test]
  fn winning_board_reports_a_plain_move_list() {
    let game = game_from_tubes(&["RB", "BR", ""], 2, GameMode::Normal).unwrap();
    let report = run_and_report(game, SolverOptions::default()).unwrap();
    assert!(report.is_winning());
    assert!(!report.lines().is_empty());
    assert!(report.lines().iter().all(|l| l.contains("->")));
  }

  #[test]
  fn hidden_unit_board_prefaces_with_follow_the_steps() {
    let game = game_from_tubes(&["R.", "G.", ""], 2, GameMode::Normal).unwrap();
    let report = run_and_report(game, SolverOptions::default()).unwrap();
    if !report.is_winning() {
      assert_eq!(report.lines()[0], "Follow the steps, update the blocks, and run again:");
    }
  }
}
