//! Storage benchmarks using tango-bench for paired comparison testing.

use std::hint::black_box;

use irr_data::{DataArray, DataList, Id, IdList};
use tango_bench::{IntoBenchmarks, benchmark_fn, tango_benchmarks, tango_main};

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

fn position(i: usize) -> Position {
    Position {
        x: i as f32,
        y: 0.0,
        z: 0.0,
    }
}

fn alloc_benchmarks() -> impl IntoBenchmarks {
    [
        benchmark_fn("alloc/100", |b| {
            b.iter(|| {
                let mut pool = DataArray::<Position>::with_capacity(100).unwrap();
                for i in 0..100 {
                    black_box(pool.alloc(position(i)).unwrap());
                }
            })
        }),
        benchmark_fn("alloc/10000", |b| {
            b.iter(|| {
                let mut pool = DataArray::<Position>::with_capacity(10_000).unwrap();
                for i in 0..10_000 {
                    black_box(pool.alloc(position(i)).unwrap());
                }
            })
        }),
        benchmark_fn("alloc_free_cycle/1000", |b| {
            b.iter(|| {
                let mut pool = DataArray::<Position>::with_capacity(1000).unwrap();
                let handles: Vec<Id> = (0..1000).map(|i| pool.alloc(position(i)).unwrap()).collect();
                for handle in handles {
                    pool.free(handle);
                }
                for i in 0..1000 {
                    black_box(pool.alloc(position(i)).unwrap());
                }
            })
        }),
    ]
}

fn lookup_benchmarks() -> impl IntoBenchmarks {
    [benchmark_fn("try_to_get/1000", |b| {
        let mut pool = DataArray::<Position>::with_capacity(1000).unwrap();
        let handles: Vec<Id> = (0..1000).map(|i| pool.alloc(position(i)).unwrap()).collect();
        b.iter(move || {
            let mut sum = 0.0;
            for &handle in &handles {
                if let Some(p) = pool.try_to_get(handle) {
                    sum += p.x + p.y + p.z;
                }
            }
            black_box(sum)
        })
    })]
}

fn relation_benchmarks() -> impl IntoBenchmarks {
    [benchmark_fn("list_prune_half/1000", |b| {
        b.iter(|| {
            let mut pool = DataArray::<Position>::with_capacity(1000).unwrap();
            let mut nodes = DataList::with_capacity(1000).unwrap();
            let mut list = IdList::new();
            for i in 0..1000 {
                let handle = pool.alloc(position(i)).unwrap();
                list.push_back(&mut nodes, handle).unwrap();
                if i % 2 == 0 {
                    pool.free(handle);
                }
            }
            black_box(list.prune(&mut nodes, &pool))
        })
    })]
}

tango_benchmarks!(
    alloc_benchmarks(),
    lookup_benchmarks(),
    relation_benchmarks()
);
tango_main!();
