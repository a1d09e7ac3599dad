use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_total: IntCounterVec,
    pub booking_transitions_total: IntCounterVec,
    pub active_bookings: IntGauge,
    pub match_latency_seconds: HistogramVec,
    pub route_fallbacks_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Bookings by final outcome"),
            &["outcome"],
        )
        .expect("valid bookings_total metric");

        let booking_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_transitions_total",
                "Successful lifecycle transitions by target state",
            ),
            &["to"],
        )
        .expect("valid booking_transitions_total metric");

        let active_bookings = IntGauge::new(
            "active_bookings",
            "Bookings currently in a non-terminal state",
        )
        .expect("valid active_bookings metric");

        let match_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "match_latency_seconds",
                "Latency of nearby-driver matching in seconds",
            ),
            &["outcome"],
        )
        .expect("valid match_latency_seconds metric");

        let route_fallbacks_total = IntCounter::new(
            "route_fallbacks_total",
            "Route provider failures substituted with the haversine estimate",
        )
        .expect("valid route_fallbacks_total metric");

        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(booking_transitions_total.clone()))
            .expect("register booking_transitions_total");
        registry
            .register(Box::new(active_bookings.clone()))
            .expect("register active_bookings");
        registry
            .register(Box::new(match_latency_seconds.clone()))
            .expect("register match_latency_seconds");
        registry
            .register(Box::new(route_fallbacks_total.clone()))
            .expect("register route_fallbacks_total");

        Self {
            registry,
            bookings_total,
            booking_transitions_total,
            active_bookings,
            match_latency_seconds,
            route_fallbacks_total,
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
