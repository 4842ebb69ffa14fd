use tubes_core::Color;

use crate::topo::YieldedStep;

/// A run of consecutive yielded steps collapsed into one human-readable
/// line, grouped by whichever of spec §4.5's two criteria ran longer: a
/// *merge* (same color, same destination) or an *empty* (same source).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchedStep {
  Merge {
    color: Color,
    srcs: Vec<usize>,
    dst: usize,
    completes_tube: bool,
  },
  Empty {
    src: usize,
    dsts: Vec<usize>,
    completes_tube: bool,
  },
}

impl BatchedStep {
  /// 1-based tube indices, matching how the board is shown to a player.
  pub fn describe(&self) -> String {
    let (action, completes_tube) = match self {
      BatchedStep::Merge {
        color,
        srcs,
        dst,
        completes_tube,
      } => (
        format!("Merge {color} from tubes {} into tube {}", format_indices(srcs), dst + 1),
        *completes_tube,
      ),
      BatchedStep::Empty {
        src,
        dsts,
        completes_tube,
      } => (
        format!("Empty tube {} into tubes {}", src + 1, format_indices(dsts)),
        *completes_tube,
      ),
    };
    if completes_tube {
      format!("{action} (completes tube)")
    } else {
      action
    }
  }
}

fn format_indices(indices: &[usize]) -> String {
  indices
    .iter()
    .map(|i| (i + 1).to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Length of the longest prefix of `steps[start..]` that shares `key(first)`.
fn run_length<K: PartialEq>(steps: &[YieldedStep], start: usize, key: impl Fn(&YieldedStep) -> K) -> usize {
  let first_key = key(&steps[start]);
  steps[start..].iter().take_while(|s| key(s) == first_key).count()
}

/// Distinct values of `project` across `steps[start..start + len]`, in
/// order of first appearance.
fn distinct<T: PartialEq>(steps: &[YieldedStep], start: usize, len: usize, project: impl Fn(&YieldedStep) -> T) -> Vec<T> {
  let mut values: Vec<T> = Vec::new();
  for step in &steps[start..start + len] {
    let value = project(step);
    if !values.contains(&value) {
      values.push(value);
    }
  }
  values
}

/// Collapses a scheduled order into batched summary lines, per spec §4.5:
/// walk linearly, and at each position group consecutive steps by whichever
/// of a merge run (same color, same dst) or an empty run (same src) is
/// longer. Ties favor the merge run, since it pins down both a color and a
/// destination rather than just a source. A group completes its tube if
/// any step within it does.
pub fn batch_steps(order: &[YieldedStep]) -> Vec<BatchedStep> {
  let mut batched = Vec::new();
  let mut i = 0;
  while i < order.len() {
    let merge_len = run_length(order, i, |s| (s.color, s.dst));
    let empty_len = run_length(order, i, |s| s.src);

    let completes_tube_over = |len: usize| order[i..i + len].iter().any(|s| s.completes_tube);

    if merge_len >= empty_len {
      let srcs = distinct(order, i, merge_len, |s| s.src);
      batched.push(BatchedStep::Merge {
        color: order[i].color,
        srcs,
        dst: order[i].dst,
        completes_tube: completes_tube_over(merge_len),
      });
      i += merge_len;
    } else {
      let dsts = distinct(order, i, empty_len, |s| s.dst);
      batched.push(BatchedStep::Empty {
        src: order[i].src,
        dsts,
        completes_tube: completes_tube_over(empty_len),
      });
      i += empty_len;
    }
  }
  batched
}

pub fn summarize(order: &[YieldedStep]) -> Vec<String> {
  batch_steps(order).iter().map(BatchedStep::describe).collect()
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  fn step(step_index: usize, src: usize, dst: usize, color: Color, completes_tube: bool) -> YieldedStep {
    YieldedStep {
      step_index,
      src,
      dst,
      color,
      completes_tube,
    }
  }

  fn red() -> Color {
    Color::new(255, 0, 0)
  }

  #[test]
  fn merge_run_collapses_same_color_same_dst_pours_into_one_batch() {
    // Two different sources, both red, both landing in tube 2 -- a merge run.
    let order = vec![step(0, 0, 2, red(), false), step(1, 1, 2, red(), true)];
    let batched = batch_steps(&order);
    assert_eq!(
      batched,
      vec![BatchedStep::Merge {
        color: red(),
        srcs: vec![0, 1],
        dst: 2,
        completes_tube: true,
      }]
    );
  }

  #[test]
  fn empty_run_collapses_same_src_pours_into_one_batch() {
    // Same source tube pouring into two different destinations -- an empty run.
    let blue = Color::new(0, 0, 255);
    let order = vec![step(0, 0, 1, red(), false), step(1, 0, 2, blue, false)];
    let batched = batch_steps(&order);
    assert_eq!(
      batched,
      vec![BatchedStep::Empty {
        src: 0,
        dsts: vec![1, 2],
        completes_tube: false,
      }]
    );
  }

  #[test]
  fn a_single_step_that_is_both_is_grouped_as_a_merge_on_the_tie() {
    // Same src AND same (color, dst) for exactly one step -- run lengths tie
    // at 1, which favors the merge interpretation.
    let order = vec![step(0, 0, 1, red(), false)];
    let batched = batch_steps(&order);
    assert_eq!(
      batched,
      vec![BatchedStep::Merge {
        color: red(),
        srcs: vec![0],
        dst: 1,
        completes_tube: false,
      }]
    );
  }

  #[test]
  fn different_pairs_stay_separate_batches() {
    let blue = Color::new(0, 0, 255);
    let order = vec![step(0, 0, 1, red(), false), step(1, 2, 3, blue, false)];
    assert_eq!(batch_steps(&order).len(), 2);
  }

  #[rstest]
  #[case::merge_one_source(
    BatchedStep::Merge { color: red(), srcs: vec![0], dst: 2, completes_tube: true },
    "Merge #ff0000 from tubes 1 into tube 3 (completes tube)"
  )]
  #[case::merge_two_sources(
    BatchedStep::Merge { color: red(), srcs: vec![0, 1], dst: 2, completes_tube: false },
    "Merge #ff0000 from tubes 1, 2 into tube 3"
  )]
  #[case::empty_two_destinations(
    BatchedStep::Empty { src: 0, dsts: vec![1, 2], completes_tube: false },
    "Empty tube 1 into tubes 2, 3"
  )]
  fn describe_formats_one_based_indices_and_completion_suffix(#[case] batched: BatchedStep, #[case] expected: &str) {
    assert_eq!(batched.describe(), expected);
  }
}
