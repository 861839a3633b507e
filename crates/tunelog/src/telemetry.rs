use metrics::Unit;

pub const PLAY_COUNT_INCREMENTS_TOTAL: &str = "tunelog_play_count_increments_total";
pub const STORE_QUERY_DURATION_SECONDS: &str = "tunelog_store_query_duration_seconds";

/// Histogram buckets for [`STORE_QUERY_DURATION_SECONDS`]
pub const STORE_QUERY_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Registers the help text of the metrics emitted by this crate.
/// Should be called once after the metrics recorder is installed.
pub fn describe_metrics() {
    metrics::describe_counter!(
        PLAY_COUNT_INCREMENTS_TOTAL,
        "Number of attempts to record a track start, labeled with the result"
    );
    metrics::describe_histogram!(
        STORE_QUERY_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of play count storage operations"
    );
}

pub(crate) fn record_increment(result: &'static str) {
    metrics::counter!(PLAY_COUNT_INCREMENTS_TOTAL, 1, "result" => result);
}

pub(crate) fn record_store_query(op: &'static str, result: &'static str, seconds: f64) {
    metrics::histogram!(STORE_QUERY_DURATION_SECONDS, seconds, "op" => op, "result" => result);
}
