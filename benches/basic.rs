use std::iter;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fadraw::config::demo_dfa;
use fadraw::Nfa;

fn haystack_same(letter: char, len: usize) -> String {
    iter::repeat(letter).take(len).collect()
}

// A chain of epsilon edges s0 -> s1 -> ... with a back edge, so every closure
// is the whole chain.
fn epsilon_ring(n: usize) -> Nfa {
    let mut builder = Nfa::builder();
    builder.symbol("a");
    for i in 0..n {
        builder.state(format!("s{}", i));
    }
    for i in 0..n {
        builder.epsilon(format!("s{}", i), vec![format!("s{}", (i + 1) % n)]);
        builder.transition(format!("s{}", i), "a", vec![format!("s{}", (i * 7 + 3) % n)]);
    }
    builder.start("s0").accept(format!("s{}", n - 1));
    builder.build().unwrap()
}

fn bench_simulate(c: &mut Criterion) {
    let dfa = demo_dfa().into_dfa().unwrap();
    let mut group = c.benchmark_group("simulate");
    for &len in &[10usize, 1000, 100_000] {
        let ones = haystack_same('1', len);
        group.bench_with_input(BenchmarkId::new("mod3", len), &ones, |b, input| {
            b.iter(|| dfa.simulate_str(black_box(input)))
        });
    }
    // stops at the first character
    let stuck = haystack_same('z', 100_000);
    group.bench_function("mod3_stuck", |b| b.iter(|| dfa.simulate_str(black_box(&stuck))));
    group.finish();
}

fn bench_closures(c: &mut Criterion) {
    let mut group = c.benchmark_group("epsilon_closures");
    for &n in &[8usize, 64, 256] {
        let nfa = epsilon_ring(n);
        group.bench_with_input(BenchmarkId::new("ring", n), &nfa, |b, nfa| {
            b.iter(|| nfa.compute_epsilon_closures())
        });
    }
    group.finish();
}

fn bench_subset_construction(c: &mut Criterion) {
    let nfa = epsilon_ring(64);
    c.bench_function("to_dfa/ring_64", |b| b.iter(|| nfa.to_dfa().unwrap()));
}

criterion_group!(benches, bench_simulate, bench_closures, bench_subset_construction);
criterion_main!(benches);
