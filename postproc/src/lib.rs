//! Turns a raw solved move path into something a player can follow: a
//! dependency-respecting reschedule that groups same-tube pours together,
//! plus a batched human-readable summary of the result.

mod graph;
mod summary;
mod topo;

use std::rc::Rc;

use tubes_core::{Game, Operation};

pub use graph::{build_dag, replay_path, Dag, DagNode, Step};
pub use summary::{batch_steps, summarize, BatchedStep};
pub use topo::{priority_topo_sort, YieldedStep};

/// Rebuilds a solved, fully-known path into the scheduler's preferred order.
/// The end state is unchanged -- only the order (and grouping) of the same
/// moves differs.
pub fn reorder_solved_path(initial_game: Rc<Game>, final_game: &Rc<Game>, path: &[Operation]) -> Vec<Operation> {
  let games = replay_path(final_game, path.len());
  let dag = build_dag(&games, path);
  priority_topo_sort(&dag, initial_game)
    .into_iter()
    .map(|step| Operation::StepForward {
      src: step.src,
      dst: step.dst,
    })
    .collect()
}

/// Runs the full post-processing pipeline and returns batched, human
/// readable move summaries in scheduled order.
pub fn summarize_solved_path(initial_game: Rc<Game>, final_game: &Rc<Game>, path: &[Operation]) -> Vec<String> {
  let games = replay_path(final_game, path.len());
  let dag = build_dag(&games, path);
  let order = priority_topo_sort(&dag, initial_game);
  summarize(&order)
}
