use thiserror::Error;

/// The four error kinds from the puzzle's error taxonomy. `InvalidBoard` and
/// `AdapterFailure` surface at a boundary (parsing, adapter IO);
/// `InvalidOperation` indicates a programmer error (an operation was applied
/// that `ops()` never would have produced); `Unsolvable` is a normal, if
/// disappointing, return for fully-known boards whose frontier was
/// exhausted without reaching a winning state.
#[derive(Debug, Error)]
pub enum TubesError {
  #[error("invalid board: {0}")]
  InvalidBoard(String),

  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  #[error("adapter failure: {0}")]
  AdapterFailure(String),

  #[error("no solution found")]
  Unsolvable,
}

pub type TubesResult<T> = Result<T, TubesError>;
