use std::fmt::{self, Display};

/// A legal action against a `Game`. `Undo` is a distinguished singleton with
/// no payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
  StepForward { src: usize, dst: usize },
  Undo,
}

impl Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Operation::StepForward { src, dst } => write!(f, "{} -> {}", src + 1, dst + 1),
      Operation::Undo => write!(f, "Undo"),
    }
  }
}
