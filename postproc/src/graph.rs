use std::{collections::HashMap, rc::Rc};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use tubes_core::{Color, Game, Node, Operation};

/// A node in the step-dependency DAG: either a real pour (indexing into
/// [`Dag::steps`]) or one of the two sentinels spec §4.5 calls `s` and `t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DagNode {
  Start,
  Step(usize),
  End,
}

/// The per-step facts the scheduler and the summarizer need: which tubes it
/// touches, the color poured, and the color left exposed on `src` once the
/// pour lands (if any) -- the "revealing color" from spec §4.5.
#[derive(Clone, Copy, Debug)]
pub struct Step {
  pub src: usize,
  pub dst: usize,
  pub color: Color,
  pub revealing_color: Option<Color>,
}

pub struct Dag {
  pub graph: DiGraph<DagNode, ()>,
  pub start: NodeIndex,
  pub end: NodeIndex,
  pub steps: Vec<Step>,
  pub step_nodes: Vec<NodeIndex>,
}

/// Reconstructs the `path.len() + 1` intermediate boards along a solved path
/// by walking `previous_state` back from the final state and reversing. Only
/// meaningful for fully-known, `Undo`-free paths: that's the only case the
/// post-processor ever runs on.
pub fn replay_path(final_game: &Rc<Game>, path_len: usize) -> Vec<Rc<Game>> {
  let mut games = Vec::with_capacity(path_len + 1);
  let mut cursor = final_game.clone();
  games.push(cursor.clone());
  for _ in 0..path_len {
    let prev = cursor
      .previous_state()
      .expect("a solved path should have exactly path_len predecessors")
      .clone();
    games.push(prev.clone());
    cursor = prev;
  }
  games.reverse();
  games
}

fn step_from(pre: &Game, post: &Game, src: usize, dst: usize) -> Step {
  let color = pre.tubes()[src]
    .top()
    .and_then(Node::color)
    .expect("a no-unknown solved path only ever pours a known top");
  let revealing_color = post.tubes()[src].top().and_then(Node::color);
  Step {
    src,
    dst,
    color,
    revealing_color,
  }
}

/// Builds the dependency DAG over a solved move path (spec §4.5) and takes
/// its transitive reduction.
pub fn build_dag(games: &[Rc<Game>], path: &[Operation]) -> Dag {
  let mut graph = DiGraph::new();
  let start = graph.add_node(DagNode::Start);
  let end = graph.add_node(DagNode::End);

  let mut last_touch: HashMap<usize, NodeIndex> = HashMap::new();
  let mut step_nodes = Vec::with_capacity(path.len());
  let mut steps = Vec::with_capacity(path.len());

  for (i, op) in path.iter().enumerate() {
    let Operation::StepForward { src, dst } = *op else {
      unreachable!("the post-processor only runs on fully-known, Undo-free paths")
    };
    let node = graph.add_node(DagNode::Step(i));
    step_nodes.push(node);
    steps.push(step_from(&games[i], &games[i + 1], src, dst));

    let src_prev = last_touch.get(&src).copied();
    let dst_prev = last_touch.get(&dst).copied();
    if src_prev.is_none() && dst_prev.is_none() {
      graph.add_edge(start, node, ());
    } else {
      if let Some(p) = src_prev {
        graph.add_edge(p, node, ());
      }
      if let Some(p) = dst_prev {
        if dst_prev != src_prev {
          graph.add_edge(p, node, ());
        }
      }
    }
    last_touch.insert(src, node);
    last_touch.insert(dst, node);
  }

  for &node in &step_nodes {
    if graph.neighbors(node).next().is_none() {
      graph.add_edge(node, end, ());
    }
  }

  transitive_reduce(&mut graph);

  Dag {
    graph,
    start,
    end,
    steps,
    step_nodes,
  }
}

/// Removes every edge `(u, v)` for which some other out-neighbor of `u`
/// already reaches `v`, i.e. every edge implied by a longer path. Computed
/// against the original reachability relation so earlier removals in the
/// same pass can't shadow a later one.
fn transitive_reduce(graph: &mut DiGraph<DagNode, ()>) {
  use std::collections::HashSet;

  let nodes: Vec<NodeIndex> = graph.node_indices().collect();
  let mut reach: HashMap<NodeIndex, HashSet<NodeIndex>> = HashMap::new();
  for &u in &nodes {
    let mut visited = HashSet::new();
    let mut stack: Vec<NodeIndex> = graph.neighbors(u).collect();
    while let Some(w) = stack.pop() {
      if visited.insert(w) {
        stack.extend(graph.neighbors(w));
      }
    }
    reach.insert(u, visited);
  }

  let mut redundant: Vec<EdgeIndex> = Vec::new();
  for edge in graph.edge_indices() {
    let (u, v) = graph.edge_endpoints(edge).unwrap();
    let is_redundant = graph.neighbors(u).any(|w| w != v && reach[&w].contains(&v));
    if is_redundant {
      redundant.push(edge);
    }
  }
  // `remove_edge` swap-removes, so work back-to-front to keep not-yet-removed
  // indices stable.
  redundant.sort_by_key(|e| std::cmp::Reverse(e.index()));
  for edge in redundant {
    graph.remove_edge(edge);
  }
}
