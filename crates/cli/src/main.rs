//! CLI for the quay terminal engine.
//!
//! Pipeline: seed terminal -> queue trucks -> validate admissions -> move
//! cargo -> dispatch -> report.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use quay_core::types::{
    AccessPermit, Appointment, AppointmentId, CargoId, CargoItem, CargoStatus, DigitalPass,
    GateAction, LocationId, LocationType, MovementType, PassId, PassStatus, PassType, PermitId,
    PermitStatus, PermitType, QueueZone, SealCondition, TruckId, VerificationType, YardLocation,
};
use quay_engine::reporter::TerminalReport;
use quay_engine::sink::{json_stream::JsonStreamSink, spawn_drain};
use quay_engine::{
    AdmissionValidator, AllocatorConfig, ChannelRecorder, GateQueue, MovementRequest,
    MovementTracker, PermitConsumer, SlotAllocator, SystemClock,
};
use quay_store::{LockRegistry, MemoryStore};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "quay", version, about = "Terminal yard, gate, and queue engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scripted terminal day against the in-memory store.
    Simulate {
        /// Number of trucks arriving at the gate.
        #[arg(short, long, default_value_t = 4, env = "QUAY_TRUCKS")]
        trucks: usize,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// Fail releases of unoccupied locations instead of ignoring them.
        #[arg(long, default_value_t = false)]
        strict_release: bool,

        /// Sink output: "ndjson" writes audit NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long)]
        sink: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            trucks,
            json,
            strict_release,
            sink,
        } => simulate(trucks, json, strict_release, sink).await,
    }
}

async fn simulate(
    trucks: usize,
    json: bool,
    strict_release: bool,
    sink: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    seed_terminal(&store, trucks, now)?;

    tracing::info!(trucks, strict_release, "starting simulation");

    let clock = Arc::new(SystemClock);
    let locks = Arc::new(LockRegistry::new());
    let (recorder, rx) = ChannelRecorder::bounded(256);
    let recorder: Arc<ChannelRecorder> = Arc::new(recorder);

    let drain = match sink.as_deref() {
        Some("ndjson") => Some(spawn_drain(rx, JsonStreamSink::stdout())),
        Some(sink_spec) => match sink_spec.strip_prefix("ndjson:") {
            Some(path) => {
                let file = std::fs::File::create(path)?;
                Some(spawn_drain(rx, JsonStreamSink::new(file)))
            }
            None => {
                eprintln!("Unknown sink: {sink_spec}. Use 'ndjson' or 'ndjson:/path'");
                None
            }
        },
        None => None,
    };

    let allocator_config = AllocatorConfig {
        allow_release_of_unrelated: !strict_release,
    };
    let tracker = MovementTracker::new(
        store.clone(),
        SlotAllocator::with_config(store.clone(), locks.clone(), allocator_config),
        locks.clone(),
        recorder.clone(),
        clock.clone(),
    );
    let validator = AdmissionValidator::new(store.clone(), clock.clone());
    let queue = GateQueue::new(store.clone(), recorder.clone(), clock.clone());
    let consumer = PermitConsumer::new(store.clone(), recorder.clone(), clock.clone());

    // 1. Trucks line up, alternating between the two waiting zones.
    let mut entries = Vec::with_capacity(trucks);
    for i in 0..trucks {
        let zone = if i % 2 == 0 {
            QueueZone::Pregate
        } else {
            QueueZone::Zoe
        };
        let truck = TruckId::from(format!("TRK-{i}").as_str());
        let entry_id = queue.enqueue(
            &truck,
            Some(AppointmentId::from(format!("APT-{i}").as_str())),
            zone,
            "gate",
        )?;
        entries.push((i, truck, entry_id));
    }

    let pregate = queue.statistics(QueueZone::Pregate)?;
    let zoe = queue.statistics(QueueZone::Zoe)?;
    tracing::info!(
        pregate = pregate.count,
        zoe = zoe.count,
        "queues filled"
    );

    // 2. Validate each truck's entry; authorize or reject accordingly.
    let mut admitted = 0usize;
    for (i, truck, entry_id) in &entries {
        let pass_id = PassId::from(format!("P-{i}").as_str());
        let decision = validator.validate(&pass_id, GateAction::Entry, None)?;
        for warning in decision.warning_messages() {
            tracing::warn!(truck = %truck, warning, "admission warning");
        }
        if decision.valid() {
            queue.authorize(entry_id, "gate")?;
            admitted += 1;
        } else {
            tracing::info!(truck = %truck, errors = ?decision.errors(), "entry denied");
            queue.reject(entry_id, "gate")?;
        }
    }
    tracing::info!(admitted, rejected = entries.len() - admitted, "gate decisions done");

    // 3. Yard work: place every container, then shuffle the first one.
    for i in 0..3usize {
        tracker.move_cargo(MovementRequest {
            cargo_id: CargoId::from(format!("CNT-{i}").as_str()),
            destination_id: LocationId::from(format!("Z10{}", i + 1).as_str()),
            origin_id: None,
            movement_type: MovementType::Traction,
            date: now,
            notes: Some("gate-in placement".into()),
            actor: "yard-op".into(),
        })?;
    }
    tracker.move_cargo(MovementRequest {
        cargo_id: CargoId::from("CNT-0"),
        destination_id: LocationId::from("Z108"),
        origin_id: Some(LocationId::from("Z101")),
        movement_type: MovementType::Transfer,
        date: now,
        notes: None,
        actor: "yard-op".into(),
    })?;

    // 4. Outbound: seal check, exit validation, permit burn, dispatch.
    // Needs at least one truck's pass and exit permit in the fixture.
    if trucks > 0 {
        let outbound = CargoId::from("CNT-0");
        tracker.verify_seal(
            &outbound,
            "SL-9000",
            SealCondition::Replaced,
            VerificationType::GateOut,
            "inspector",
        )?;

        let exit = validator.validate(&PassId::from("P-0"), GateAction::Exit, Some(&outbound))?;
        if exit.valid() {
            consumer.consume(&PermitId::from("PRM-EXIT-0"), "gate")?;
            let status = tracker.move_cargo(MovementRequest {
                cargo_id: outbound.clone(),
                destination_id: LocationId::from("GATE-OUT"),
                origin_id: None,
                movement_type: MovementType::Dispatch,
                date: now,
                notes: Some("departure".into()),
                actor: "yard-op".into(),
            })?;
            tracing::info!(cargo = %outbound, status = %status, "outbound dispatched");
        } else {
            tracing::warn!(errors = ?exit.errors(), "exit denied, cargo stays in the yard");
        }
    }

    // 5. Report.
    let report = TerminalReport::build(
        &store.all_locations()?,
        &store.all_cargo()?,
        vec![
            queue.statistics(QueueZone::Pregate)?,
            queue.statistics(QueueZone::Zoe)?,
        ],
    );

    // Close the audit channel before awaiting the drain.
    drop(queue);
    drop(tracker);
    drop(consumer);
    drop(recorder);
    if let Some(drain) = drain {
        let rows = drain.await?;
        tracing::info!(rows, "audit sink drained");
        // Keep the report visible alongside stdout NDJSON.
        eprint!("{}", report.render());
    } else if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }

    Ok(())
}

/// Seeds yard slots, cargo, and one pass/permit/appointment set per truck.
/// The last truck's pass is expired, so its entry is denied.
fn seed_terminal(
    store: &MemoryStore,
    trucks: usize,
    now: chrono::DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    for i in 1..=8usize {
        store.insert_location(YardLocation {
            id: LocationId::from(format!("Z10{i}").as_str()),
            zone: "Z1".into(),
            block: format!("B{:02}", (i - 1) / 4 + 1),
            row: format!("R{:02}", (i - 1) % 4 + 1),
            tier: "T1".into(),
            location_type: LocationType::Container,
            capacity_teu: 2,
            occupied: false,
            occupant: None,
            active: true,
        })?;
    }
    store.insert_location(YardLocation {
        id: LocationId::from("GATE-OUT"),
        zone: "GATE".into(),
        block: "OUT".into(),
        row: "R01".into(),
        tier: "T1".into(),
        location_type: LocationType::General,
        capacity_teu: 0,
        occupied: false,
        occupant: None,
        active: true,
    })?;

    for i in 0..3usize {
        store.insert_cargo(CargoItem {
            id: CargoId::from(format!("CNT-{i}").as_str()),
            manifest_ref: format!("MAN-2026-{i:03}"),
            bill_of_lading: Some(format!("BL-{:04}", 4000 + i)),
            status: CargoStatus::InTransit,
            location_ref: None,
            seal_number: Some(format!("SL-{i}")),
        })?;
    }

    for i in 0..trucks {
        let pass_id = PassId::from(format!("P-{i}").as_str());
        let expired = i + 1 == trucks && trucks > 1;
        store.insert_pass(DigitalPass {
            id: pass_id.clone(),
            pass_code: format!("QP-{i:04}"),
            pass_type: PassType::Vehicular,
            holder: format!("TRK-{i}"),
            valid_from: now - Duration::days(1),
            valid_until: if expired {
                now - Duration::hours(1)
            } else {
                now + Duration::hours(12)
            },
            status: PassStatus::Active,
        })?;

        store.insert_permit(AccessPermit {
            id: PermitId::from(format!("PRM-ENTRY-{i}").as_str()),
            permit_type: PermitType::Entry,
            pass_ref: pass_id.clone(),
            cargo_ref: None,
            status: PermitStatus::Pending,
        })?;
        store.insert_permit(AccessPermit {
            id: PermitId::from(format!("PRM-EXIT-{i}").as_str()),
            permit_type: PermitType::Exit,
            pass_ref: pass_id.clone(),
            cargo_ref: Some(CargoId::from(format!("CNT-{i}").as_str())),
            status: PermitStatus::Pending,
        })?;

        // Half the fleet shows up with a near-term appointment; the rest
        // trigger the no-appointment warning.
        if i % 2 == 0 {
            store.insert_appointment(Appointment {
                id: AppointmentId::from(format!("APT-{i}").as_str()),
                pass_ref: pass_id,
                truck_ref: TruckId::from(format!("TRK-{i}").as_str()),
                scheduled_at: now + Duration::minutes(30),
            })?;
        }
    }

    Ok(())
}
