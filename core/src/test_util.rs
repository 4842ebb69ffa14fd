//! Compact board notation for tests. Mirrors the teacher's
//! `BOARD_POSITIONS`-style string boards: terse enough to read a whole test
//! case at a glance, explicit enough to pin down exact positions.

use crate::{color::Color, error::TubesResult, game::Game, mode::GameMode, node::Node};

/// A small fixed palette so test boards can spell colors as single letters.
/// `.` is reserved for `UNKNOWN` and is not a color.
fn letter_color(c: char) -> Option<Color> {
  Some(match c {
    'R' => Color::new(220, 20, 60),
    'G' => Color::new(34, 139, 34),
    'B' => Color::new(30, 60, 220),
    'Y' => Color::new(230, 200, 30),
    'O' => Color::new(230, 120, 20),
    'P' => Color::new(140, 40, 180),
    'C' => Color::new(30, 180, 180),
    'M' => Color::new(200, 30, 160),
    _ => return None,
  })
}

/// Builds a board from one string per tube, bottom-to-top, one character per
/// unit: a palette letter for `KNOWN`, `.` for `UNKNOWN`. Tubes shorter than
/// `capacity` are simply shorter strings; there is no `EMPTY` notation here
/// since a canonicalized board never holds one. `Pos` for unit `i` of tube
/// `t` is `(t, i)`, so tests can assert on positions directly.
///
/// ```ignore
/// game_from_tubes(&["RRGG", "GGRR", "....", "...."], 4, GameMode::Normal)
/// ```
pub fn game_from_tubes(tubes: &[&str], capacity: usize, mode: GameMode) -> TubesResult<Game> {
  game_from_tubes_with_undo(tubes, capacity, mode, 0)
}

pub fn game_from_tubes_with_undo(
  tubes: &[&str],
  capacity: usize,
  mode: GameMode,
  undo_count: u32,
) -> TubesResult<Game> {
  let raw: Vec<Vec<Node>> = tubes
    .iter()
    .enumerate()
    .map(|(tube_index, spec)| {
      spec
        .chars()
        .enumerate()
        .map(|(unit_index, c)| {
          let pos = (tube_index as u32, unit_index as u32);
          match c {
            '.' => Node::Unknown { pos },
            _ => Node::Known {
              pos,
              color: letter_color(c).unwrap_or_else(|| panic!("unknown test color letter {c:?}")),
            },
          }
        })
        .collect()
    })
    .collect();
  Game::new(raw, Some(capacity), mode, undo_count)
}
