use std::path::Path;

use log::debug;
use tubes_core::{Color, Game, GameMode, Node, TubesError, TubesResult};

const SCAN_LIMIT: u32 = 255;
const BORDER: (u8, u8, u8) = (0, 0, 0);
const EMPTY_COLOR: (u8, u8, u8) = (255, 255, 255);

/// Abstracts over "a grid of colored cells" so the border-scan and
/// board-reading logic below can be unit-tested without a real spreadsheet.
pub trait CellGrid {
  fn rgb_at(&self, col: u32, row: u32) -> (u8, u8, u8);
}

/// Locates the board's data region by scanning for a black border cell down
/// the first column and across the first row, same as the original
/// `identify_range`. Returns `(rows, cols)` of the data region, excluding
/// the border itself.
pub fn identify_range(grid: &dyn CellGrid) -> TubesResult<(u32, u32)> {
  let mut row = 0u32;
  loop {
    if grid.rgb_at(0, row) == BORDER {
      break;
    }
    row += 1;
    if row > SCAN_LIMIT {
      return Err(TubesError::AdapterFailure(
        "sheet border row not found within scan bound".to_string(),
      ));
    }
  }

  let mut col = 0u32;
  loop {
    if grid.rgb_at(col, 0) == BORDER {
      break;
    }
    col += 1;
    if col > SCAN_LIMIT {
      return Err(TubesError::AdapterFailure(
        "sheet border column not found within scan bound".to_string(),
      ));
    }
  }

  debug!("identified board data region: {row} rows x {col} cols");
  Ok((row, col))
}

/// Reads the board out of `grid`'s `(rows, cols)` data region. Tubes are
/// columns, scanned top-to-bottom on screen; a white cell below a
/// known-colored cell in the same column is a still-hidden unit rather than
/// genuinely empty space. Each column is reversed at the end to land in the
/// bottom-to-top order `Game` expects.
pub fn read_board(grid: &dyn CellGrid, dims: (u32, u32), mode: GameMode, undo_count: u32) -> TubesResult<Game> {
  let (rows, cols) = dims;
  let mut groups = Vec::with_capacity(cols as usize);
  for c in 0..cols {
    let mut after_known = false;
    let mut column = Vec::with_capacity(rows as usize);
    for r in 0..rows {
      let rgb = grid.rgb_at(c, r);
      let pos = (c, r);
      if rgb == EMPTY_COLOR {
        if after_known {
          column.push(Node::Unknown { pos });
        } else {
          column.push(Node::Empty { pos });
        }
      } else {
        after_known = true;
        column.push(Node::Known {
          pos,
          color: Color::new(rgb.0, rgb.1, rgb.2),
        });
      }
    }
    column.reverse();
    groups.push(column);
  }
  Game::new(groups, None, mode, undo_count)
}

/// `CellGrid` backed by an open `umya_spreadsheet` worksheet.
pub struct WorksheetGrid<'a> {
  sheet: &'a umya_spreadsheet::Worksheet,
}

impl<'a> WorksheetGrid<'a> {
  pub fn new(sheet: &'a umya_spreadsheet::Worksheet) -> Self {
    Self { sheet }
  }
}

impl CellGrid for WorksheetGrid<'_> {
  fn rgb_at(&self, col: u32, row: u32) -> (u8, u8, u8) {
    let argb = self
      .sheet
      .get_cell((col + 1, row + 1))
      .and_then(|cell| cell.get_style().get_background_color())
      .map(|color| color.get_argb().to_string())
      .unwrap_or_else(|| "FFFFFFFF".to_string());
    argb_to_rgb(&argb)
  }
}

fn argb_to_rgb(argb: &str) -> (u8, u8, u8) {
  let s = argb.trim_start_matches('#');
  let hex = if s.len() >= 8 { &s[2..8] } else { s };
  let byte = |i: usize| -> u8 { u8::from_str_radix(hex.get(i..i + 2).unwrap_or("ff"), 16).unwrap_or(255) };
  (byte(0), byte(2), byte(4))
}

/// Opens an `.xlsx` workbook from disk. The original prototype attached to a
/// live Excel COM instance; that's Windows-only automation with no sensible
/// Rust-ecosystem equivalent, so this crate reads the saved file instead.
pub fn load_workbook(path: &Path) -> TubesResult<umya_spreadsheet::Spreadsheet> {
  umya_spreadsheet::reader::xlsx::read(path)
    .map_err(|e| TubesError::AdapterFailure(format!("failed to open spreadsheet: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  struct FakeGrid {
    cells: Vec<Vec<(u8, u8, u8)>>,
  }

  impl CellGrid for FakeGrid {
    fn rgb_at(&self, col: u32, row: u32) -> (u8, u8, u8) {
      self.cells[col as usize][row as usize]
    }
  }

  fn white() -> (u8, u8, u8) {
    (255, 255, 255)
  }
  fn black() -> (u8, u8, u8) {
    (0, 0, 0)
  }
  fn red() -> (u8, u8, u8) {
    (255, 0, 0)
  }

  #[test]
  fn identify_range_locates_the_black_border() {
    // 2 data rows, 2 data cols, border one past each.
    let grid = FakeGrid {
      cells: vec![
        vec![red(), red(), black()],
        vec![white(), red(), black()],
        vec![black(), black(), black()],
      ],
    };
    assert_eq!(identify_range(&grid).unwrap(), (2, 2));
  }

  #[test]
  fn identify_range_errors_when_no_border_is_found() {
    let grid = FakeGrid {
      cells: vec![vec![white(); (SCAN_LIMIT as usize) + 2]; (SCAN_LIMIT as usize) + 2],
    };
    assert!(matches!(
      identify_range(&grid),
      Err(TubesError::AdapterFailure(_))
    ));
  }

  #[test]
  fn white_cell_scanned_after_a_known_cell_is_unknown_not_empty() {
    // Column 0, screen top-to-bottom: red, white, white. After reversal to
    // bottom-to-top order the known cell lands on top and the two trailing
    // whites -- scanned after it, hence hidden rather than empty -- sit
    // underneath it.
    let grid = FakeGrid {
      cells: vec![vec![red(), white(), white()]],
    };
    let game = read_board(&grid, (3, 1), GameMode::Normal, 5).unwrap();
    let tube = &game.tubes()[0];
    assert!(tube.bottom().unwrap().is_hidden());
    assert!(tube.top().unwrap().is_known());
  }

  #[test]
  fn white_cell_with_nothing_known_above_it_is_genuinely_empty() {
    let grid = FakeGrid {
      cells: vec![vec![white(), white(), red()]],
    };
    let game = read_board(&grid, (3, 1), GameMode::Normal, 5).unwrap();
    assert_eq!(game.tubes()[0].as_slice().len(), 1);
  }
}
