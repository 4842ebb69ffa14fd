use std::path::PathBuf;

/// Which board source the CLI layer should read from, chosen from
/// `std::env::args` before any solving happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoardSource {
  JsonFile(PathBuf),
  Spreadsheet(PathBuf),
}

impl BoardSource {
  /// `json_identifier <puzzle.json>`: exactly one positional argument.
  pub fn from_json_identifier_args(args: &[String]) -> Option<Self> {
    match args {
      [path] => Some(BoardSource::JsonFile(PathBuf::from(path))),
      _ => None,
    }
  }

  /// `excel_identifier <workbook.xlsx>`: exactly one positional argument.
  pub fn from_excel_identifier_args(args: &[String]) -> Option<Self> {
    match args {
      [path] => Some(BoardSource::Spreadsheet(PathBuf::from(path))),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_identifier_requires_exactly_one_path() {
    assert!(BoardSource::from_json_identifier_args(&[]).is_none());
    assert_eq!(
      BoardSource::from_json_identifier_args(&["puzzle.json".to_string()]),
      Some(BoardSource::JsonFile(PathBuf::from("puzzle.json")))
    );
  }
}
