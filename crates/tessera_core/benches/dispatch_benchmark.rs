//! # Dispatch Benchmark
//!
//! - Registration throughput
//! - Lazy vs always-resort dispatch over 10k subscribers
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::cell::Cell;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{
    Component, ComponentHandle, DistributorLink, DistributorPolicy, EntityEvent, EntityId,
    EventDistributor, EventKind, EventPriority, ResortPolicy,
};

/// Subscriber count for dispatch benchmarks.
const SUBSCRIBERS: u32 = 10_000;

struct Tick {
    priority: i32,
    ticks: Cell<u64>,
}

impl Component for Tick {
    fn process_event(&self, event: &EntityEvent) {
        self.ticks.set(self.ticks.get() + event.n_param[0].unsigned_abs());
    }

    fn event_priority(&self, _kind: EventKind) -> EventPriority {
        EventPriority(self.priority)
    }

    fn set_distributor(&self, _link: Option<DistributorLink>) {}
}

fn populate(distributor: &EventDistributor, count: u32) -> Vec<ComponentHandle> {
    (1..=count)
        .map(|raw| {
            let handle = ComponentHandle::new(Tick {
                priority: (raw % 7) as i32,
                ticks: Cell::new(0),
            });
            distributor.register_event(EntityId::from_raw(raw), &handle, EventKind::Timer, true);
            handle
        })
        .collect()
}

/// Benchmark: register subscribers into a fresh distributor.
fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    for count in [1_000, SUBSCRIBERS] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let distributor = EventDistributor::default();
                black_box(populate(&distributor, count).len())
            });
        });
    }

    group.finish();
}

/// Benchmark: dispatch one event kind under both resort policies.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_10k");

    for (name, resort) in [("lazy", ResortPolicy::Lazy), ("always", ResortPolicy::Always)] {
        let distributor = EventDistributor::new(DistributorPolicy::default().with_resort(resort));
        let _handles = populate(&distributor, SUBSCRIBERS);
        let event = EntityEvent::new(EventKind::Timer).with_int(0, 1);

        group.bench_function(name, |b| {
            b.iter(|| distributor.send_event(black_box(&event)));
        });
    }

    group.finish();
}

/// Benchmark: alternating kinds defeats the last-sorted marker.
fn bench_alternating_kinds(c: &mut Criterion) {
    let distributor = EventDistributor::default();
    let handles = populate(&distributor, SUBSCRIBERS);
    for (raw, handle) in (1..=SUBSCRIBERS).zip(&handles) {
        distributor.register_event(EntityId::from_raw(raw), handle, EventKind::Hide, true);
    }
    let timer = EntityEvent::new(EventKind::Timer);
    let hide = EntityEvent::new(EventKind::Hide);

    c.bench_function("dispatch_alternating_10k", |b| {
        b.iter(|| {
            distributor.send_event(black_box(&timer));
            distributor.send_event(black_box(&hide));
        });
    });
}

criterion_group!(benches, bench_registration, bench_dispatch, bench_alternating_kinds);
criterion_main!(benches);
