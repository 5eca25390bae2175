use price_feed::metrics::MetricsSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub running: bool,
    pub subscribers: usize,
    pub tick_interval_ms: u64,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}
