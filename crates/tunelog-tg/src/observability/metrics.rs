use super::GLOBAL_LABELS;
use crate::config::from_env_or_panic;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use serde::Deserialize;

pub(crate) const TG_UPDATES_TOTAL: &str = "tg_updates_total";
pub(crate) const TG_UPDATES_SKIPPED_TOTAL: &str = "tg_updates_skipped_total";

#[derive(Deserialize)]
struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    metrics_port: u16,
}

fn default_metrics_port() -> u16 {
    2000
}

pub fn init_metrics() {
    let config: MetricsConfig = from_env_or_panic("");

    let mut builder = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .set_buckets_for_metric(
            Matcher::Full(tunelog::STORE_QUERY_DURATION_SECONDS.to_owned()),
            tunelog::STORE_QUERY_DURATION_BUCKETS,
        )
        .expect("BUG: store query duration buckets must not be empty");

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    builder
        .install()
        .expect("BUG: failed to initialize the metrics listener");

    describe_metrics();
}

fn describe_metrics() {
    tunelog::describe_metrics();

    metrics::describe_counter!(TG_UPDATES_TOTAL, "Number of updates received from Telegram");
    metrics::describe_counter!(
        TG_UPDATES_SKIPPED_TOTAL,
        "Number of updates received from Telegram, that were skipped by the bot"
    );
}
