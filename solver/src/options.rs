/// Tunables for `solve`. The only one the puzzle spec actually calls out is
/// the starting recursion depth for Regime B; the rest have fixed, obvious
/// defaults and are here so callers can override them in tests without
/// touching the search loop.
#[derive(Clone, Copy, Debug)]
pub struct SolverOptions {
  /// Initial `depth` passed to `solve_with_unknown` when the board has
  /// hidden units.
  pub initial_hidden_depth: u32,
}

impl SolverOptions {
  pub fn with_initial_hidden_depth(&self, initial_hidden_depth: u32) -> Self {
    Self {
      initial_hidden_depth,
      ..*self
    }
  }
}

impl Default for SolverOptions {
  fn default() -> Self {
    Self {
      initial_hidden_depth: 8,
    }
  }
}
