use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub transitions_total: IntCounterVec,
    pub claims_total: IntCounterVec,
    pub claim_distance_km: Histogram,
    pub location_pings_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "transitions_total",
                "Suborder status transitions by target and outcome",
            ),
            &["target", "outcome"],
        )
        .expect("valid transitions_total metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Rider claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let claim_distance_km = Histogram::with_opts(
            HistogramOpts::new(
                "claim_distance_km",
                "Rider-to-pickup distance of successful claims in km",
            )
            .buckets(vec![0.5, 1.0, 2.0, 3.0, 5.0, 7.5, 10.0]),
        )
        .expect("valid claim_distance_km metric");

        let location_pings_total = IntCounter::new(
            "location_pings_total",
            "Accepted rider position reports",
        )
        .expect("valid location_pings_total metric");

        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(claim_distance_km.clone()))
            .expect("register claim_distance_km");
        registry
            .register(Box::new(location_pings_total.clone()))
            .expect("register location_pings_total");

        Self {
            registry,
            transitions_total,
            claims_total,
            claim_distance_km,
            location_pings_total,
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
