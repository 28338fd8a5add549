//! Metrics collection and exposition.
//!
//! # Metrics
//! - `larvnet_config_reloads_total` (counter): reload attempts by outcome
//!   (`success`, `rejected`, `fatal`)
//! - `larvnet_config_entities` (gauge): entity counts of the active generation by kind
//! - `larvnet_state_transplanted_total` (counter): machines and printers whose runtime
//!   state survived a reload
//! - `larvnet_resources_released_total` (counter): printer connections and timers
//!   released with superseded generations
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::config::cleanup::ReleasedResources;
use crate::config::merge::MergeSummary;
use crate::config::schema::Configuration;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reload(outcome: &'static str) {
    counter!("larvnet_config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_topology(config: &Configuration) {
    let kinds = [
        ("arch", config.arches().len()),
        ("cluster", config.clusters().len()),
        ("printer", config.printers().len()),
        ("machine", config.machines().len()),
        ("cgroup", config.cgroups().len()),
    ];
    for (kind, count) in kinds {
        gauge!("larvnet_config_entities", "kind" => kind).set(count as f64);
    }
}

pub fn record_transplanted(merged: &MergeSummary) {
    counter!("larvnet_state_transplanted_total", "kind" => "machine").increment(merged.machines as u64);
    counter!("larvnet_state_transplanted_total", "kind" => "printer").increment(merged.printers as u64);
}

pub fn record_released(released: &ReleasedResources) {
    counter!("larvnet_resources_released_total", "resource" => "connection")
        .increment(released.connections as u64);
    counter!("larvnet_resources_released_total", "resource" => "timer")
        .increment(released.timers as u64);
}
