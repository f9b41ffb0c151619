use chrono::{DateTime, Utc};
use serde::Serialize;

/// One service metric data point, as Mackerel's tsdb endpoint expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub name: String,
    pub time: i64,
    pub value: u64,
}

impl MetricValue {
    pub fn new(prefix: &str, target_name: &str, time: DateTime<Utc>, value: u64) -> Self {
        Self {
            name: format!("{}.{}", prefix, target_name),
            time: time.timestamp(),
            value,
        }
    }
}
