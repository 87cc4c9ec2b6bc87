use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use node_register::{IdSlot, NodeId, NodeRef, NodeRegister, Ref, RegisterNode};

struct BenchNode {
    slot: IdSlot,
}

impl RegisterNode for BenchNode {
    fn id_slot(&self) -> &IdSlot {
        &self.slot
    }
}

fn node() -> NodeRef {
    Ref::new(BenchNode {
        slot: IdSlot::new(),
    })
    .erased()
}

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("register_insert_10k", |b| {
        b.iter_batched(
            || {
                let nodes: Vec<NodeRef> = (0..10_000).map(|_| node()).collect();
                (NodeRegister::new(), nodes)
            },
            |(mut reg, nodes)| {
                for n in &nodes {
                    reg.insert(n).unwrap();
                }
                black_box((reg, nodes))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("register_get_hit", |b| {
        let mut reg = NodeRegister::new();
        // Hold the nodes so every lookup resolves.
        let held: Vec<NodeRef> = (0..10_000).map(|_| node()).collect();
        let ids: Vec<NodeId> = held.iter().map(|n| reg.insert(n).unwrap()).collect();
        let picks: Vec<usize> = lcg(7).take(1_000).map(|x| x as usize % ids.len()).collect();

        b.iter(|| {
            let mut found = 0usize;
            for &i in &picks {
                if reg.get(black_box(ids[i])).is_some() {
                    found += 1;
                }
            }
            black_box(found)
        })
    });
}

fn bench_get_stale(c: &mut Criterion) {
    c.bench_function("register_get_stale", |b| {
        let mut reg = NodeRegister::new();
        let nodes: Vec<NodeRef> = (0..1_000).map(|_| node()).collect();
        let stale: Vec<NodeId> = nodes.iter().map(|n| reg.insert(n).unwrap()).collect();
        for n in &nodes {
            reg.remove(n);
        }
        // Refill the slots so every stale probe hits a reused, occupied slot.
        let refill: Vec<NodeRef> = (0..1_000).map(|_| node()).collect();
        for n in &refill {
            reg.insert(n).unwrap();
        }

        b.iter(|| {
            let mut misses = 0usize;
            for &id in &stale {
                if reg.get(black_box(id)).is_none() {
                    misses += 1;
                }
            }
            black_box(misses)
        })
    });
}

// Worst case for the free-slot hint: interleaved remove/insert at low
// indices forces a forward scan on every reuse.
fn bench_low_index_churn(c: &mut Criterion) {
    c.bench_function("register_low_index_churn", |b| {
        b.iter_batched(
            || {
                let mut reg = NodeRegister::new();
                let held: Vec<NodeRef> = (0..1_024).map(|_| node()).collect();
                for n in &held {
                    reg.insert(n).unwrap();
                }
                let churn: Vec<NodeRef> = (0..256).map(|_| node()).collect();
                (reg, held, churn)
            },
            |(mut reg, held, churn)| {
                for (i, fresh) in churn.iter().enumerate() {
                    reg.remove(&held[i]);
                    reg.insert(fresh).unwrap();
                }
                black_box((reg, held, churn))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_get_hit,
    bench_get_stale,
    bench_low_index_churn
);
criterion_main!(benches);
