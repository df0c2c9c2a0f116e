use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub fanout_total: IntCounterVec,
    pub fanout_jobs_in_queue: IntGauge,
    pub fanout_latency_seconds: HistogramVec,
    pub notifications_persisted_total: IntCounter,
    pub push_sends_total: IntCounterVec,
    pub device_tokens_deactivated_total: IntCounter,
    pub claims_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let fanout_total = IntCounterVec::new(
            Opts::new("fanout_total", "Fanout jobs processed by outcome"),
            &["outcome"],
        )
        .expect("valid fanout_total metric");

        let fanout_jobs_in_queue =
            IntGauge::new("fanout_jobs_in_queue", "Fanout jobs currently queued")
                .expect("valid fanout_jobs_in_queue metric");

        let fanout_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "fanout_latency_seconds",
                "Latency of one fanout job in seconds",
            ),
            &["outcome"],
        )
        .expect("valid fanout_latency_seconds metric");

        let notifications_persisted_total = IntCounter::new(
            "notifications_persisted_total",
            "Durable notification rows written",
        )
        .expect("valid notifications_persisted_total metric");

        let push_sends_total = IntCounterVec::new(
            Opts::new("push_sends_total", "Push multicast sends by outcome"),
            &["outcome"],
        )
        .expect("valid push_sends_total metric");

        let device_tokens_deactivated_total = IntCounter::new(
            "device_tokens_deactivated_total",
            "Device tokens deactivated after permanent push failures",
        )
        .expect("valid device_tokens_deactivated_total metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Order claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        registry
            .register(Box::new(fanout_total.clone()))
            .expect("register fanout_total");
        registry
            .register(Box::new(fanout_jobs_in_queue.clone()))
            .expect("register fanout_jobs_in_queue");
        registry
            .register(Box::new(fanout_latency_seconds.clone()))
            .expect("register fanout_latency_seconds");
        registry
            .register(Box::new(notifications_persisted_total.clone()))
            .expect("register notifications_persisted_total");
        registry
            .register(Box::new(push_sends_total.clone()))
            .expect("register push_sends_total");
        registry
            .register(Box::new(device_tokens_deactivated_total.clone()))
            .expect("register device_tokens_deactivated_total");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");

        Self {
            registry,
            fanout_total,
            fanout_jobs_in_queue,
            fanout_latency_seconds,
            notifications_persisted_total,
            push_sends_total,
            device_tokens_deactivated_total,
            claims_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
