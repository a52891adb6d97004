//! Terminal status report generator.
//!
//! Takes a snapshot of yard, cargo, and queue state and produces a
//! human-readable summary with occupancy and wait-time statistics.

use crate::queue::QueueStatistics;
use quay_core::types::{CargoItem, CargoStatus, YardLocation};
use serde::Serialize;

/// Point-in-time summary of the terminal.
#[derive(Debug, Serialize)]
pub struct TerminalReport {
    pub total_locations: usize,
    pub occupied_locations: usize,
    pub inactive_locations: usize,
    /// Occupied share of active locations, in percent.
    pub yard_utilization_pct: f64,
    pub cargo_in_transit: usize,
    pub cargo_stored: usize,
    pub cargo_dispatched: usize,
    pub queues: Vec<QueueStatistics>,
}

impl TerminalReport {
    pub fn build(
        locations: &[YardLocation],
        cargo: &[CargoItem],
        queues: Vec<QueueStatistics>,
    ) -> Self {
        let total_locations = locations.len();
        let occupied_locations = locations.iter().filter(|l| l.occupied).count();
        let inactive_locations = locations.iter().filter(|l| !l.active).count();

        let active = total_locations - inactive_locations;
        let yard_utilization_pct = if active == 0 {
            0.0
        } else {
            (occupied_locations as f64 / active as f64 * 10_000.0).round() / 100.0
        };

        let count_status = |status: CargoStatus| cargo.iter().filter(|c| c.status == status).count();

        TerminalReport {
            total_locations,
            occupied_locations,
            inactive_locations,
            yard_utilization_pct,
            cargo_in_transit: count_status(CargoStatus::InTransit),
            cargo_stored: count_status(CargoStatus::Stored),
            cargo_dispatched: count_status(CargoStatus::Dispatched),
            queues,
        }
    }

    /// Render the report as a formatted string.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str("║                    QUAY TERMINAL STATUS                      ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str(&format!(
            "║  Yard locations:     {:>38} ║\n",
            self.total_locations
        ));
        out.push_str(&format!(
            "║  Occupied:           {:>38} ║\n",
            self.occupied_locations
        ));
        out.push_str(&format!(
            "║  Inactive:           {:>38} ║\n",
            self.inactive_locations
        ));
        out.push_str(&format!(
            "║  Utilization:        {:>37}% ║\n",
            self.yard_utilization_pct
        ));
        out.push_str(&format!(
            "║  Cargo in transit:   {:>38} ║\n",
            self.cargo_in_transit
        ));
        out.push_str(&format!(
            "║  Cargo stored:       {:>38} ║\n",
            self.cargo_stored
        ));
        out.push_str(&format!(
            "║  Cargo dispatched:   {:>38} ║\n",
            self.cargo_dispatched
        ));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.queues.is_empty() {
            out.push_str("║  No waiting zones reported.                                  ║\n");
        } else {
            out.push_str("║  WAITING ZONES                                               ║\n");
            for q in &self.queues {
                out.push_str(&format!(
                    "║    {:<8} trucks: {:>3}  avg wait: {:>6.1}m  max: {:>5}m     ║\n",
                    q.zone.to_string(),
                    q.count,
                    q.avg_wait_minutes,
                    q.max_wait_minutes
                ));
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}
