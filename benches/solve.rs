use std::{rc::Rc, time::Duration};

use criterion::{criterion_group, criterion_main, Criterion};
use tubes_core::{test_util::game_from_tubes, GameMode};
use tubes_solver::{solve, SolverOptions};

fn solve_fully_known(c: &mut Criterion) {
  let mut group = c.benchmark_group("solve");
  group.measurement_time(Duration::from_secs(10));

  group.bench_function("fully known board", |b| {
    b.iter(|| {
      let game = game_from_tubes(&["RRB", "BBR", "GGG", ""], 3, GameMode::Normal).unwrap();
      solve(Rc::new(game), SolverOptions::default()).unwrap();
    })
  });

  group.bench_function("hidden unit board", |b| {
    b.iter(|| {
      let game = game_from_tubes(&["R..", "G..", "B..", ""], 3, GameMode::Normal).unwrap();
      solve(Rc::new(game), SolverOptions::default()).unwrap();
    })
  });

  group.finish();
}

criterion_group!(solve_benches, solve_fully_known);
criterion_main!(solve_benches);
