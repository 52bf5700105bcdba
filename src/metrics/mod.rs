use metrics::{counter, histogram};
use std::time::Duration;

// Metric names
pub const METRIC_STAKING_TICKS: &str = "staking_ticks_total";
pub const METRIC_STAKING_SETUP_FAILURES: &str = "staking_setup_failures_total";
pub const METRIC_SOURCE_FAILURES: &str = "collectible_source_failures_total";
pub const METRIC_ITEMS_FETCHED: &str = "collectible_items_fetched_total";
pub const METRIC_FETCH_DURATION: &str = "collectible_fetch_duration_seconds";

pub fn record_staking_tick(network: &str) {
    counter!(METRIC_STAKING_TICKS, 1, "network" => network.to_string());
}

pub fn record_setup_failure(network: &str) {
    counter!(METRIC_STAKING_SETUP_FAILURES, 1, "network" => network.to_string());
}

pub fn record_source_failure(source_name: &str) {
    counter!(METRIC_SOURCE_FAILURES, 1, "source" => source_name.to_string());
}

pub fn record_fetch(items: usize, elapsed: Duration) {
    counter!(METRIC_ITEMS_FETCHED, items as u64);
    histogram!(METRIC_FETCH_DURATION, elapsed.as_secs_f64());
}
