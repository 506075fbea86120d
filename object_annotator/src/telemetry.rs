use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    annotation_counter: Counter<u64>,
    drawn_detections: Counter<u64>,
    annotation_duration: Histogram<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("object_annotator");
        global::set_meter_provider(provider);

        let annotation_counter = meter
            .u64_counter("annotations_total")
            .with_description("Total number of annotation requests by outcome")
            .build();

        let drawn_detections = meter
            .u64_counter("drawn_detections_total")
            .with_description("Total number of bounding boxes drawn")
            .build();

        let boundaries = generate_boundaries(&[(0, 50, 5), (50, 200, 25), (200, 1000, 100)]);

        let annotation_duration = meter
            .u64_histogram("annotation_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of decode, annotate and encode in milliseconds")
            .build();

        Ok(Metrics {
            annotation_counter,
            drawn_detections,
            annotation_duration,
            registry,
        })
    }

    pub fn record_annotation(&self, outcome: &str) {
        let attributes = vec![KeyValue::new("outcome", outcome.to_string())];
        self.annotation_counter.add(1, &attributes);
    }

    pub fn record_drawn_detections(&self, count: usize) {
        self.drawn_detections.add(count as u64, &[]);
    }

    pub fn record_annotation_duration(&self, duration_ms: u64) {
        self.annotation_duration.record(duration_ms, &[]);
    }
}

/// Histogram bucket boundaries from `(start, end, step)` ranges, deduplicated
/// where ranges meet.
fn generate_boundaries(ranges: &[(u32, u32, usize)]) -> Vec<f64> {
    let mut seen = HashSet::new();
    ranges
        .iter()
        .flat_map(|&(start, end, step)| (start..=end).step_by(step.max(1)))
        .filter(|&x| seen.insert(x))
        .map(f64::from)
        .collect()
}
