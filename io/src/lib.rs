mod cli;
mod json;
mod plan;
mod spreadsheet;

pub use cli::BoardSource;
pub use json::{game_from_json, game_to_json, parse_board_json};
pub use plan::{run_and_report, PlanReport};
pub use spreadsheet::{identify_range, load_workbook, read_board, CellGrid, WorksheetGrid};
