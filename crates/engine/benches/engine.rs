use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quay_core::types::{
    CargoId, LocationId, LocationType, QueueZone, TruckId, YardLocation,
};
use quay_engine::{GateQueue, ManualClock, NoopRecorder, SlotAllocator};
use quay_store::{LockRegistry, MemoryStore};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn seed_yard(store: &MemoryStore, n: usize) {
    for i in 0..n {
        store
            .insert_location(YardLocation {
                id: LocationId::from(format!("Z{i:04}").as_str()),
                zone: "Z1".into(),
                block: format!("B{:02}", i % 10),
                row: format!("R{:02}", i % 5),
                tier: "T1".into(),
                location_type: LocationType::Container,
                capacity_teu: 2,
                occupied: false,
                occupant: None,
                active: true,
            })
            .unwrap();
    }
}

// ---------------------------------------------------------------------------
// Benchmark: allocate/release cycle
// ---------------------------------------------------------------------------

fn bench_allocate_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_release");
    for count in [100usize, 500, 1000] {
        let store = Arc::new(MemoryStore::new());
        seed_yard(&store, count);
        let allocator = SlotAllocator::new(store, Arc::new(LockRegistry::new()));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                for i in 0..count {
                    let id = LocationId::from(format!("Z{i:04}").as_str());
                    allocator
                        .allocate(&id, &CargoId::from(format!("C{i}").as_str()))
                        .unwrap();
                    allocator.release(&id).unwrap();
                }
                black_box(())
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: queue statistics over waiting entries
// ---------------------------------------------------------------------------

fn bench_queue_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_statistics");
    for count in [50usize, 200, 1000] {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap(),
        ));
        let queue = GateQueue::new(store, Arc::new(NoopRecorder), clock.clone());

        for i in 0..count {
            queue
                .enqueue(
                    &TruckId::from(format!("T{i}").as_str()),
                    None,
                    QueueZone::Pregate,
                    "bench",
                )
                .unwrap();
            clock.advance(Duration::seconds(30));
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(queue.statistics(QueueZone::Pregate).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_allocate_release, bench_queue_statistics);
criterion_main!(benches);
