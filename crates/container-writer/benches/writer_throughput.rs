//! Writer throughput benchmarks.
//!
//! Measures end-to-end commit rate for a batch of containers pushed through
//! the transfer queue, for both wait strategies.
//!
//! Run with:
//! ```bash
//! cargo bench --bench writer_throughput
//! ```

#![allow(clippy::expect_used)]

use container_writer::{
    Container, ContainerWriter, FailurePolicy, TransferQueue, WaitStrategy, WriterConfig,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::PathBuf;
use std::sync::Arc;

const CONTAINER_SIZE: usize = 64 * 1024;
const BATCH: usize = 64;

fn bench_commit_batch(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create benchmark directory");
    let mut root = dir.path().as_os_str().to_os_string();
    root.push("/");
    let body = vec![0x5au8; CONTAINER_SIZE];

    let mut group = c.benchmark_group("commit_batch");
    group.throughput(Throughput::Bytes((CONTAINER_SIZE * BATCH) as u64));

    for strategy in [WaitStrategy::Blocking, WaitStrategy::Poll] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{strategy:?}")),
            &strategy,
            |b, &strategy| {
                b.iter(|| {
                    let config = WriterConfig::new(PathBuf::from(&root), ".bench")
                        .with_queue_capacity(16)
                        .with_wait_strategy(strategy)
                        .with_failure_policy(FailurePolicy::Propagate);
                    let queue = Arc::new(TransferQueue::new(config.queue_capacity));
                    let handle = ContainerWriter::new(config)
                        .expect("Failed to create writer")
                        .spawn(Arc::clone(&queue))
                        .expect("Failed to spawn writer");

                    for i in 0..BATCH {
                        let id = format!("{i:08}").into_bytes();
                        let container = Container::new(id, body.clone(), CONTAINER_SIZE)
                            .expect("Failed to build container");
                        queue.push(container).expect("Failed to push container");
                    }
                    queue.set_done();

                    let stats = handle
                        .join()
                        .expect("Writer thread panicked")
                        .expect("Writer failed");
                    black_box(stats)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_commit_batch);
criterion_main!(benches);
