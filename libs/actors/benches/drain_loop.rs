//! Benchmark for the mailbox drain loop
//!
//! Enqueue a burst, then run the scheduled work until the actor is idle.
//! Compares batch sizes and local vs serialized delivery.

use actor_kernel::{
    Actor, ActorBase, ActorConfig, ActorId, ActorPid, HandlerBase, LocalRuntime, ManualScheduler, MessagePayload,
    NoTransport, Runtime, RuntimeSettings,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const BURST: u64 = 1024;

struct Tally;

#[derive(Debug, Serialize, Deserialize)]
struct Add(u64);

impl ActorConfig for Tally {
    type State = u64;
    type Message = Add;
    const TYPE_NAME: &'static str = "Tally";

    fn handle<R: Runtime>(mut handler: HandlerBase<'_, R, u64>, message: Add) -> u64 {
        handler.state = handler.state.wrapping_add(message.0);
        handler.into_state()
    }
}

fn tally(batch_size: usize) -> (Arc<ManualScheduler>, Arc<Actor<LocalRuntime, Tally>>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let runtime = LocalRuntime::new(
        RuntimeSettings::default().with_server("bench"),
        scheduler.clone(),
        Arc::new(NoTransport),
    );
    let pid = ActorPid::new("bench", "_system", ActorId::new(1));
    let actor = Actor::<LocalRuntime, Tally>::with_options(pid, runtime, 0, None, batch_size);
    (scheduler, actor)
}

fn bench_local_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_burst");
    group.throughput(Throughput::Elements(BURST));
    let sender = ActorPid::new("bench", "_system", ActorId::new(2));

    for batch_size in [1, 16, 256] {
        let (scheduler, actor) = tally(batch_size);
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, _| {
            b.iter(|| {
                for n in 0..BURST {
                    actor.process(sender.clone(), MessagePayload::message(Add(n)));
                }
                criterion::black_box(scheduler.run_until_idle());
            })
        });
    }
    group.finish();
}

fn bench_serialized_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialized_burst");
    group.throughput(Throughput::Elements(BURST));
    let sender = ActorPid::new("remote", "_system", ActorId::new(2));
    let payloads: Vec<Vec<u8>> = (0..BURST)
        .map(|n| serde_json::to_vec(&Add(n)).unwrap())
        .collect();

    let (scheduler, actor) = tally(16);
    group.bench_function("batch_16", |b| {
        b.iter(|| {
            for payload in &payloads {
                actor.process_serialized(sender.clone(), payload);
            }
            criterion::black_box(scheduler.run_until_idle());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_local_burst, bench_serialized_burst);
criterion_main!(benches);
