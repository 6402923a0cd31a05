use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("store-diagnosis"));

// --- Upstream Provider Metrics ---

pub static DIRECTORY_CANDIDATES: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("directory.search.candidates")
        .with_description("Number of candidate records returned per directory search")
        .with_unit("{candidate}")
        .build()
});

pub static UPSTREAM_ERROR_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("upstream.error.count")
        .with_description("Number of failed upstream provider calls")
        .with_unit("{error}")
        .build()
});

pub static DETAIL_FALLBACK_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("directory.detail.fallback.count")
        .with_description("Number of reports built from the search record alone")
        .with_unit("{fallback}")
        .build()
});

pub static MENTION_STATUS_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("mentions.status.count")
        .with_description("External mention lookups by resulting status")
        .with_unit("{lookup}")
        .build()
});

pub static NOTIFICATION_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("notification.dispatch.count")
        .with_description("Notification dispatches by outcome")
        .with_unit("{notification}")
        .build()
});

// --- Domain Metrics ---

pub static DIAGNOSIS_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("diagnosis.generation.duration")
        .with_description("Total diagnosis report generation duration in seconds")
        .with_unit("s")
        .build()
});

pub static DIAGNOSIS_COMPETITORS: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("diagnosis.competitors")
        .with_description("Number of competitors listed per report")
        .with_unit("{competitor}")
        .build()
});

// --- HTTP Metrics ---

pub static HTTP_REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("http.requests.total")
        .with_description("Total number of HTTP requests")
        .with_unit("{request}")
        .build()
});

pub static HTTP_REQUEST_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("http.request.duration")
        .with_description("HTTP request duration in milliseconds")
        .with_unit("ms")
        .with_boundaries(vec![
            1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
        ])
        .build()
});
