//! End-to-end flow against the in-memory store: queue at the gate,
//! validate admission, place and move cargo, verify the seal, consume the
//! exit permit, dispatch -- with the audit channel draining to NDJSON.

use chrono::{Duration, TimeZone, Utc};
use quay_core::types::{
    AccessPermit, Appointment, AppointmentId, CargoId, CargoItem, CargoStatus, DigitalPass,
    GateAction, LocationId, LocationType, MovementType, PassId, PassStatus, PassType, PermitId,
    PermitStatus, PermitType, QueueZone, SealCondition, TruckId, VerificationType, YardLocation,
};
use quay_engine::audit::ChannelRecorder;
use quay_engine::sink::{json_stream::JsonStreamSink, spawn_drain};
use quay_engine::{
    AdmissionValidator, Clock, GateQueue, ManualClock, MovementRequest, MovementTracker,
    PermitConsumer, SlotAllocator,
};
use quay_store::{CargoStore, LocationStore, LockRegistry, MemoryStore, QueueStore};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// `Write` target the test can inspect after the drain task finishes.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn yard_location(id: &str) -> YardLocation {
    YardLocation {
        id: LocationId::from(id),
        zone: "Z1".into(),
        block: "B01".into(),
        row: "R01".into(),
        tier: "T1".into(),
        location_type: LocationType::Container,
        capacity_teu: 2,
        occupied: false,
        occupant: None,
        active: true,
    }
}

fn seed_fixture(store: &MemoryStore, now: chrono::DateTime<Utc>) {
    for id in ["Z101", "Z102", "GATE-1"] {
        store.insert_location(yard_location(id)).unwrap();
    }

    store
        .insert_cargo(CargoItem {
            id: CargoId::from("CNT-100"),
            manifest_ref: "MAN-2026-001".into(),
            bill_of_lading: Some("BL-4471".into()),
            status: CargoStatus::InTransit,
            location_ref: None,
            seal_number: Some("SL-1".into()),
        })
        .unwrap();

    store
        .insert_pass(DigitalPass {
            id: PassId::from("P-TRK"),
            pass_code: "QP-0042".into(),
            pass_type: PassType::Vehicular,
            holder: "TRK-1".into(),
            valid_from: now - Duration::hours(1),
            valid_until: now + Duration::hours(12),
            status: PassStatus::Active,
        })
        .unwrap();

    for (id, permit_type) in [
        ("PRM-IN", PermitType::Entry),
        ("PRM-OUT", PermitType::Exit),
    ] {
        store
            .insert_permit(AccessPermit {
                id: PermitId::from(id),
                permit_type,
                pass_ref: PassId::from("P-TRK"),
                cargo_ref: Some(CargoId::from("CNT-100")),
                status: PermitStatus::Pending,
            })
            .unwrap();
    }

    store
        .insert_appointment(Appointment {
            id: AppointmentId::from("APT-1"),
            pass_ref: PassId::from("P-TRK"),
            truck_ref: TruckId::from("TRK-1"),
            scheduled_at: now + Duration::minutes(30),
        })
        .unwrap();
}

/// Occupancy invariant: a location is occupied iff exactly one
/// non-dispatched cargo item references it.
fn assert_occupancy_invariant(store: &MemoryStore) {
    let cargo = store.all_cargo().unwrap();
    for location in store.all_locations().unwrap() {
        let referents = cargo
            .iter()
            .filter(|c| c.in_yard() && c.location_ref.as_ref() == Some(&location.id))
            .count();
        assert_eq!(
            location.occupied,
            referents == 1,
            "invariant broken at {}: occupied={} referents={}",
            location.id,
            location.occupied,
            referents
        );
    }
}

#[tokio::test]
async fn full_terminal_flow() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

    let store = Arc::new(MemoryStore::new());
    seed_fixture(&store, now);

    let clock = Arc::new(ManualClock::at(now));
    let locks = Arc::new(LockRegistry::new());

    let buf = SharedBuf::default();
    let (recorder, rx) = ChannelRecorder::bounded(64);
    let recorder = Arc::new(recorder);
    let drain = spawn_drain(rx, JsonStreamSink::new(buf.clone()));

    let allocator = SlotAllocator::new(store.clone(), locks.clone());
    let tracker = MovementTracker::new(
        store.clone(),
        SlotAllocator::new(store.clone(), locks.clone()),
        locks.clone(),
        recorder.clone(),
        clock.clone(),
    );
    let validator = AdmissionValidator::new(store.clone(), clock.clone());
    let queue = GateQueue::new(store.clone(), recorder.clone(), clock.clone());
    let consumer = PermitConsumer::new(store.clone(), recorder.clone(), clock.clone());

    // 1. Truck arrives and waits at the pre-gate.
    let truck = TruckId::from("TRK-1");
    let entry_id = queue
        .enqueue(&truck, Some(AppointmentId::from("APT-1")), QueueZone::Pregate, "gate")
        .unwrap();
    assert!(queue.enqueue(&truck, None, QueueZone::Zoe, "gate").is_err());

    // 2. Gate entry is validated: active pass, pending entry permit,
    //    appointment in 30 minutes -- clean decision.
    let decision = validator
        .validate(&PassId::from("P-TRK"), GateAction::Entry, None)
        .unwrap();
    assert!(decision.valid(), "entry denied: {:?}", decision.errors());
    assert!(decision.warnings.is_empty());

    // 3. Authorized out of the queue after 25 minutes.
    clock.advance(Duration::minutes(25));
    queue.authorize(&entry_id, "gate").unwrap();
    let entry = store.entry(&entry_id).unwrap().unwrap();
    assert_eq!(queue.waiting_time_minutes(&entry), 25);

    // 4. Container placed in the yard, then shuffled to a second slot.
    let cargo_id = CargoId::from("CNT-100");
    let status = tracker
        .move_cargo(MovementRequest {
            cargo_id: cargo_id.clone(),
            destination_id: LocationId::from("Z101"),
            origin_id: None,
            movement_type: MovementType::Traction,
            date: clock.now(),
            notes: Some("gate-in placement".into()),
            actor: "yard-op".into(),
        })
        .unwrap();
    assert_eq!(status, CargoStatus::Stored);
    assert_occupancy_invariant(&store);

    let status = tracker
        .move_cargo(MovementRequest {
            cargo_id: cargo_id.clone(),
            destination_id: LocationId::from("Z102"),
            origin_id: Some(LocationId::from("Z101")),
            movement_type: MovementType::Transfer,
            date: clock.now(),
            notes: None,
            actor: "yard-op".into(),
        })
        .unwrap();
    assert_eq!(status, CargoStatus::Stored);
    assert!(!store.location(&LocationId::from("Z101")).unwrap().unwrap().occupied);
    assert!(store.location(&LocationId::from("Z102")).unwrap().unwrap().occupied);
    assert_occupancy_invariant(&store);

    // The occupied slot is exclusive against direct allocation too.
    assert!(matches!(
        allocator.allocate(&LocationId::from("Z102"), &CargoId::from("CNT-999")),
        Err(quay_core::QuayError::AlreadyOccupied(_))
    ));

    // 5. Outbound inspection replaces the seal.
    tracker
        .verify_seal(
            &cargo_id,
            "SL-9",
            SealCondition::Replaced,
            VerificationType::GateOut,
            "inspector",
        )
        .unwrap();
    assert_eq!(
        store.cargo(&cargo_id).unwrap().unwrap().seal_number.as_deref(),
        Some("SL-9")
    );

    // 6. Gate exit validated against the cargo, then the permit is burned.
    let decision = validator
        .validate(&PassId::from("P-TRK"), GateAction::Exit, Some(&cargo_id))
        .unwrap();
    assert!(decision.valid(), "exit denied: {:?}", decision.errors());

    let used = consumer.consume(&PermitId::from("PRM-OUT"), "gate").unwrap();
    assert_eq!(used.status, PermitStatus::Used);
    assert!(consumer.consume(&PermitId::from("PRM-OUT"), "gate").is_err());

    // 7. Dispatch: the destination is recorded but never occupied.
    let status = tracker
        .move_cargo(MovementRequest {
            cargo_id: cargo_id.clone(),
            destination_id: LocationId::from("GATE-1"),
            origin_id: None,
            movement_type: MovementType::Dispatch,
            date: clock.now(),
            notes: Some("departure".into()),
            actor: "yard-op".into(),
        })
        .unwrap();
    assert_eq!(status, CargoStatus::Dispatched);
    let gate = store.location(&LocationId::from("GATE-1")).unwrap().unwrap();
    assert!(!gate.occupied);
    let cargo = store.cargo(&cargo_id).unwrap().unwrap();
    assert_eq!(cargo.location_ref, Some(LocationId::from("GATE-1")));
    assert_occupancy_invariant(&store);

    // 8. A second truck keeps the queue statistics honest.
    queue
        .enqueue(&TruckId::from("TRK-2"), None, QueueZone::Pregate, "gate")
        .unwrap();
    clock.advance(Duration::minutes(10));
    let stats = queue.statistics(QueueZone::Pregate).unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.max_wait_minutes, 10);

    // 9. The audit channel saw every mutation exactly once:
    //    enqueue, authorize, 2 moves, seal, permit, dispatch, enqueue.
    drop(queue);
    drop(tracker);
    drop(consumer);
    drop(recorder);

    let written = drain.await.unwrap();
    assert_eq!(written, 8);

    let bytes = buf.0.lock().unwrap().clone();
    let output = String::from_utf8(bytes).unwrap();
    let actions: Vec<String> = output
        .trim()
        .lines()
        .map(|l| {
            let row: serde_json::Value = serde_json::from_str(l).unwrap();
            row["action"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        actions,
        [
            "QUEUE_ENTERED",
            "QUEUE_AUTHORIZED",
            "CARGO_MOVED",
            "CARGO_MOVED",
            "SEAL_VERIFIED",
            "PERMIT_CONSUMED",
            "CARGO_MOVED",
            "QUEUE_ENTERED",
        ]
    );
}
