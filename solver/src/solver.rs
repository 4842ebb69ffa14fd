use std::{cmp::Ordering, collections::HashMap, rc::Rc};

use log::debug;
use tubes_core::{Game, GameMode, Operation, TubesError, TubesResult};
use tubes_postproc::reorder_solved_path;

use crate::{
  options::SolverOptions,
  search_state::{no_unknown_key, with_unknown_key, HeapItem, InstanceIdGen, Path, SearchState},
};

/// Dominance record for the closed set: a structural key is "beaten" once
/// it's been seen with an `undo_count` at least as generous as the one a
/// newly popped state carries, since a lower `undo_count` can never do
/// anything a higher one couldn't.
type ClosedSet = HashMap<tubes_core::StructuralKey, u32>;

fn already_dominated(closed: &ClosedSet, game: &Game) -> bool {
  closed
    .get(game.structural_key())
    .is_some_and(|&seen_undo_count| seen_undo_count >= game.undo_count())
}

fn record(closed: &mut ClosedSet, game: &Game) {
  closed.insert(game.structural_key().clone(), game.undo_count());
}

/// Best-first search over fully-known boards. Returns the first winning
/// state popped off the heap, which the heap's ordering guarantees is
/// optimal (shortest path, then fewest segments, then fewest completed
/// groups -- see [`no_unknown_key`]).
fn solve_no_unknown(start: Rc<Game>) -> TubesResult<SearchState> {
  let mut ids = InstanceIdGen::default();
  let mut heap = std::collections::BinaryHeap::new();
  let mut closed: ClosedSet = ClosedSet::new();
  let mut best_solution_length = usize::MAX;

  let start_state = SearchState::new(start, Path::new(), ids.next());
  heap.push(HeapItem {
    key: no_unknown_key(&start_state),
    state: start_state,
  });

  while let Some(HeapItem { state, .. }) = heap.pop() {
    if state.path().len() >= best_solution_length {
      continue;
    }
    if already_dominated(&closed, state.game()) {
      continue;
    }
    if state.game().is_winning_state() {
      debug!("solve_no_unknown: found solution of length {}", state.path().len());
      return Ok(state);
    }
    record(&mut closed, state.game());

    for op in state.game().ops() {
      let next_game = Rc::new(state.game().apply_op(op)?);
      let next_path = state.path().pushed(op);
      if next_path.len() >= best_solution_length {
        continue;
      }
      let next_state = SearchState::new(next_game, next_path, ids.next());
      heap.push(HeapItem {
        key: no_unknown_key(&next_state),
        state: next_state,
      });
    }
  }

  Err(TubesError::Unsolvable)
}

/// Ordering used to pick the best-so-far candidate while a hidden-unit
/// search still has unexplored depth left: more revealed units wins, then
/// more one-move-revealable units, then a shorter path, then fewer segments.
fn is_more_valuable(a: &SearchState, b: &SearchState) -> bool {
  let a_game = a.game();
  let b_game = b.game();
  match a_game.unknown_revealed_count().cmp(&b_game.unknown_revealed_count()) {
    Ordering::Greater => return true,
    Ordering::Less => return false,
    Ordering::Equal => {}
  }
  match a_game.revealable_in_one().cmp(&b_game.revealable_in_one()) {
    Ordering::Greater => return true,
    Ordering::Less => return false,
    Ordering::Equal => {}
  }
  match a.path().len().cmp(&b.path().len()) {
    Ordering::Less => return true,
    Ordering::Greater => return false,
    Ordering::Equal => {}
  }
  a_game.segments() < b_game.segments()
}

/// Once depth runs out, the candidate rule simplifies to "fewer segments
/// wins" and the search stops trying to go deeper.
fn has_fewer_segments(a: &SearchState, b: &SearchState) -> bool {
  a.game().segments() < b.game().segments()
}

/// Search over boards with hidden units. Unlike [`solve_no_unknown`], this
/// never fails: it always returns the best candidate found, defaulting to
/// the start state itself if nothing better turned up.
///
/// The reference algorithm recurses (re-running itself from the current
/// best candidate, with one less `depth`, whenever the frontier has grown
/// to twice the size it was when that candidate was set) every time the
/// search count doubles past the candidate's. That recursion is flattened
/// here into a loop that reseeds the frontier with the candidate and
/// decrements `depth`, sharing one [`InstanceIdGen`] across reseeds so
/// instance ids stay monotonic for the whole call. The candidate's `Path`
/// is carried into the reseeded frontier too, not just its `Game`, so the
/// path on the eventual return still spans every move back to `start`.
fn solve_with_unknown(start: Rc<Game>, mut depth: u32) -> SearchState {
  let mut ids = InstanceIdGen::default();

  let mut frontier_seed = start.clone();
  let mut frontier_seed_path = Path::new();
  loop {
    let mut heap = std::collections::BinaryHeap::new();
    let mut closed: ClosedSet = ClosedSet::new();
    let mut candidate: Option<SearchState> = None;
    let mut searched_state_count: u64 = 0;
    let mut candidate_search_state_count: u64 = 0;

    let seed_state = SearchState::new(frontier_seed.clone(), frontier_seed_path.clone(), ids.next());
    heap.push(HeapItem {
      key: with_unknown_key(&seed_state),
      state: seed_state,
    });

    let mut reseed: Option<(Rc<Game>, Path, u32)> = None;

    while let Some(HeapItem { state, .. }) = heap.pop() {
      if already_dominated(&closed, state.game()) {
        continue;
      }
      searched_state_count += 1;

      if depth == 0 {
        let beats_candidate = match candidate.as_ref() {
          None => true,
          Some(c) => has_fewer_segments(&state, c),
        };
        if beats_candidate {
          candidate = Some(state.clone());
        }
      } else if state.game().is_meaningful_state() {
        let first_candidate = candidate.is_none() && searched_state_count > 1;
        if first_candidate || candidate.as_ref().is_some_and(|c| is_more_valuable(&state, c)) {
          candidate = Some(state.clone());
          candidate_search_state_count = searched_state_count;
        }
      }

      if depth > 0 {
        if let Some(c) = &candidate {
          if searched_state_count > 2 * candidate_search_state_count {
            reseed = Some((c.game().clone(), c.path().clone(), depth - 1));
            break;
          }
        }
      }

      record(&mut closed, state.game());
      for op in state.game().ops() {
        let next_game = Rc::new(
          state
            .game()
            .apply_op(op)
            .expect("ops() only ever yields moves legal against its own game"),
        );
        let next_path = state.path().pushed(op);
        let next_state = SearchState::new(next_game, next_path, ids.next());
        heap.push(HeapItem {
          key: with_unknown_key(&next_state),
          state: next_state,
        });
      }
    }

    match reseed {
      Some((game, path, next_depth)) => {
        frontier_seed = game;
        frontier_seed_path = path;
        depth = next_depth;
        continue;
      }
      None => {
        return candidate.unwrap_or_else(|| SearchState::new(start.clone(), Path::new(), ids.next()));
      }
    }
  }
}

/// Solves `start` and, for fully-known `Normal`/`NoCombo` boards, reschedules
/// the winning path through the post-processor so the reported moves group
/// naturally. Hidden-unit boards and `Queue` boards are returned as found.
pub fn solve(start: Rc<Game>, options: SolverOptions) -> TubesResult<SearchState> {
  if start.contains_unknown() {
    return Ok(solve_with_unknown(start, options.initial_hidden_depth));
  }

  let solved = solve_no_unknown(start.clone())?;
  if matches!(start.mode(), GameMode::Normal | GameMode::NoCombo) {
    let path = solved.path().to_vec();
    let reordered = reorder_solved_path(start, solved.game(), &path);
    let mut optimized_path = Path::new();
    for op in reordered {
      optimized_path = optimized_path.pushed(op);
    }
    return Ok(SearchState::new(
      solved.game().clone(),
      optimized_path,
      solved.instance_id(),
    ));
  }
  Ok(solved)
}
