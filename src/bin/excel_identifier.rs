use std::{io::stdin, process::ExitCode};

use tubes_core::GameMode;
use tubes_io::{identify_range, load_workbook, read_board, run_and_report, BoardSource, WorksheetGrid};
use tubes_solver::SolverOptions;

fn prompt_game_mode() -> GameMode {
  println!("Game Mode (0: Normal, 1: No combo move, 2: Queue output): ");
  let mut line = String::new();
  if stdin().read_line(&mut line).is_err() {
    return GameMode::default();
  }
  GameMode::from_prompt(&line)
}

fn main() -> ExitCode {
  env_logger::init();

  let args: Vec<String> = std::env::args().skip(1).collect();
  let source = match BoardSource::from_excel_identifier_args(&args) {
    Some(source) => source,
    None => {
      eprintln!("usage: excel_identifier <workbook.xlsx>");
      return ExitCode::FAILURE;
    }
  };
  let BoardSource::Spreadsheet(path) = source else {
    unreachable!("from_excel_identifier_args only ever produces Spreadsheet")
  };

  let book = match load_workbook(&path) {
    Ok(book) => book,
    Err(e) => {
      eprintln!("{e}");
      return ExitCode::FAILURE;
    }
  };
  let sheet = match book.get_active_sheet() {
    Some(sheet) => sheet,
    None => {
      eprintln!("no active sheet in {}", path.display());
      return ExitCode::FAILURE;
    }
  };
  let grid = WorksheetGrid::new(sheet);

  let dims = match identify_range(&grid) {
    Ok(dims) => dims,
    Err(e) => {
      eprintln!("{e}");
      return ExitCode::FAILURE;
    }
  };

  let mode = prompt_game_mode();
  let game = match read_board(&grid, dims, mode, 5) {
    Ok(game) => game,
    Err(e) => {
      eprintln!("{e}");
      return ExitCode::FAILURE;
    }
  };

  match run_and_report(game, SolverOptions::default()) {
    Ok(report) => {
      println!("{report}");
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("{e}");
      ExitCode::FAILURE
    }
  }
}
