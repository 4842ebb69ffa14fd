use std::{fs, process::ExitCode};

use tubes_io::{parse_board_json, run_and_report, BoardSource};
use tubes_solver::SolverOptions;

fn main() -> ExitCode {
  env_logger::init();

  let args: Vec<String> = std::env::args().skip(1).collect();
  let source = match BoardSource::from_json_identifier_args(&args) {
    Some(source) => source,
    None => {
      eprintln!("usage: json_identifier <puzzle.json>");
      return ExitCode::FAILURE;
    }
  };
  let BoardSource::JsonFile(path) = source else {
    unreachable!("from_json_identifier_args only ever produces JsonFile")
  };

  let text = match fs::read_to_string(&path) {
    Ok(text) => text,
    Err(e) => {
      eprintln!("failed to read {}: {e}", path.display());
      return ExitCode::FAILURE;
    }
  };

  let game = match parse_board_json(&text) {
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
