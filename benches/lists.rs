use criterion::*;
use listd::Store;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

/// Runs `op` from `num_threads` threads until `iters` calls have been made
/// in total, returning the wall time.
fn run_threads<F>(store: &Arc<Store>, keys: &[String], iters: u64, op: F) -> Duration
where
    F: Fn(&Store, &str) + Send + Sync + Copy + 'static,
{
    let start = Instant::now();

    let countdown = Arc::new(AtomicU64::new(iters));
    let handles = keys
        .iter()
        .cloned()
        .map(|key| {
            let store = store.clone();
            let countdown = countdown.clone();
            std::thread::spawn(move || {
                loop {
                    // counts down from iters to 1, then wraps past it
                    let left = countdown.fetch_sub(1, Ordering::AcqRel);
                    if left == 0 || left > iters {
                        break;
                    }
                    op(&store, &key)
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap()
    }

    start.elapsed()
}

fn fill(store: &Store, keys: &[String], per_key: u64) {
    for key in keys {
        for i in 0..per_key {
            store.append(key, i as i32);
        }
    }
}

fn list_ops(c: &mut Criterion) {
    for num_threads in (0..10)
        .map(|p| 2usize.pow(p))
        .take_while(|p| *p <= num_cpus::get())
    {
        let mut group = c.benchmark_group(&format!("list ops, {} threads", num_threads));

        let own_keys = (0..num_threads)
            .map(|i| format!("list-{}", i))
            .collect::<Vec<_>>();
        let shared_keys = vec!["shared".to_string(); num_threads];

        group.bench_function("append, one list per thread", |b| {
            b.iter_custom(|iters| {
                let store = Arc::new(Store::new());
                run_threads(&store, &own_keys, iters, |store, key| {
                    store.append(key, 1);
                })
            })
        });

        group.bench_function("append, one shared list", |b| {
            b.iter_custom(|iters| {
                let store = Arc::new(Store::new());
                run_threads(&store, &shared_keys, iters, |store, key| {
                    store.append(key, 1);
                })
            })
        });

        group.bench_function("remove after append, one list per thread", |b| {
            b.iter_custom(|iters| {
                let store = Arc::new(Store::new());
                fill(&store, &own_keys, iters);
                run_threads(&store, &own_keys, iters, |store, key| {
                    store.remove(key).expect("failed to remove");
                })
            })
        });

        group.bench_function("remove after append, one shared list", |b| {
            b.iter_custom(|iters| {
                let store = Arc::new(Store::new());
                fill(&store, &shared_keys[..1], iters);
                run_threads(&store, &shared_keys, iters, |store, key| {
                    store.remove(key).expect("failed to remove");
                })
            })
        });

        group.bench_function("get and size, one shared list", |b| {
            b.iter_custom(|iters| {
                let store = Arc::new(Store::new());
                fill(&store, &shared_keys[..1], 1024);
                run_threads(&store, &shared_keys, iters, |store, key| {
                    let size = store.size(key);
                    black_box(store.get(key, (size / 2) as i32).expect("failed to get"));
                })
            })
        });

        group.finish();
    }
}

criterion_group!(lists, list_ops);
criterion_main!(lists);
