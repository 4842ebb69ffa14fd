use std::{collections::HashMap, rc::Rc};

use petgraph::{graph::NodeIndex, Direction::Incoming};
use tubes_core::{Color, Game, Operation};

use crate::graph::{Dag, DagNode};

/// One pour as it comes out of the scheduler: which step it was in the
/// original solved path, the tubes and color it moves, and whether applying
/// it finishes a tube.
#[derive(Clone, Copy, Debug)]
pub struct YieldedStep {
  pub step_index: usize,
  pub src: usize,
  pub dst: usize,
  pub color: Color,
  pub completes_tube: bool,
}

/// Streams a topological order off the reduced DAG, at each choice point
/// picking whichever ready step scores highest under spec §4.5's heuristic:
/// +8 for completing a tube, +4 for continuing the same color as the
/// previous pour, +2 for matching the color the previous pour just exposed,
/// +1 for touching a tube the previous pour also touched. Ties favor the
/// step that appeared earliest in the original solved path, to keep the
/// reordering as close to the original as the scores allow.
pub fn priority_topo_sort(dag: &Dag, initial_game: Rc<Game>) -> Vec<YieldedStep> {
  let graph = &dag.graph;
  let mut indegree: HashMap<NodeIndex, usize> = graph
    .node_indices()
    .map(|n| (n, graph.neighbors_directed(n, Incoming).count()))
    .collect();

  let total = graph.node_count();
  let mut processed = 0usize;
  let mut order = Vec::with_capacity(dag.steps.len());

  let mut cursor = initial_game;
  let mut prev_color: Option<Color> = None;
  let mut prev_revealing_color: Option<Color> = None;
  let mut prev_tubes: Option<(usize, usize)> = None;

  // `start` always begins as the sole in-degree-0 node (every real step has
  // an edge either from a prior toucher or from `start`), so it's always
  // picked first and never needs scoring.
  indegree.remove(&dag.start);
  processed += 1;
  for neighbor in graph.neighbors(dag.start) {
    if let Some(deg) = indegree.get_mut(&neighbor) {
      *deg -= 1;
    }
  }

  while processed < total {
    let ready: Vec<NodeIndex> = indegree
      .iter()
      .filter(|&(_, &deg)| deg == 0)
      .map(|(&n, _)| n)
      .collect();

    struct Candidate {
      node: NodeIndex,
      step_index: usize,
      score: i32,
      next_cursor: Rc<Game>,
    }

    let mut best: Option<Candidate> = None;
    for &node in &ready {
      let DagNode::Step(i) = graph[node] else {
        continue;
      };
      let step = dag.steps[i];
      let next_cursor = Rc::new(
        cursor
          .apply_op(Operation::StepForward {
            src: step.src,
            dst: step.dst,
          })
          .expect("the reduced DAG only ever replays legal moves"),
      );
      let mut score = 0i32;
      if next_cursor.tubes()[step.dst].is_completed(next_cursor.capacity()) {
        score += 8;
      }
      if prev_color == Some(step.color) {
        score += 4;
      }
      if prev_revealing_color == Some(step.color) {
        score += 2;
      }
      if let Some((ps, pd)) = prev_tubes {
        if step.src == ps || step.src == pd || step.dst == ps || step.dst == pd {
          score += 1;
        }
      }

      // Prefer strictly higher score; break ties by earliest original index.
      if best
        .as_ref()
        .map(|b| score > b.score || (score == b.score && i < b.step_index))
        .unwrap_or(true)
      {
        best = Some(Candidate {
          node,
          step_index: i,
          score,
          next_cursor,
        });
      }
    }

    let chosen_node = match best {
      Some(c) => {
        order.push(YieldedStep {
          step_index: c.step_index,
          src: dag.steps[c.step_index].src,
          dst: dag.steps[c.step_index].dst,
          color: dag.steps[c.step_index].color,
          completes_tube: c
            .next_cursor
            .tubes()[dag.steps[c.step_index].dst]
            .is_completed(c.next_cursor.capacity()),
        });
        prev_color = Some(dag.steps[c.step_index].color);
        prev_revealing_color = dag.steps[c.step_index].revealing_color;
        prev_tubes = Some((dag.steps[c.step_index].src, dag.steps[c.step_index].dst));
        cursor = c.next_cursor;
        c.node
      }
      None => {
        // Nothing scoreable is ready: only `end` can be, since every step
        // node always lands on some score. This is the final pick.
        *ready
          .iter()
          .find(|&&n| matches!(graph[n], DagNode::End))
          .expect("topo sort exhausted without reaching the sink")
      }
    };

    processed += 1;
    indegree.remove(&chosen_node);
    for neighbor in graph.neighbors(chosen_node) {
      if let Some(deg) = indegree.get_mut(&neighbor) {
        *deg -= 1;
      }
    }
  }

  order
}
