//! Process-wide counters, exposed in Prometheus text format on `/metrics`

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Global metrics registry
pub static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Counter for tracking event counts
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct EndpointCounts {
    total: u64,
    errors: u64,
}

#[derive(Debug)]
pub struct MetricsRegistry {
    // Coordinator
    pub chunkservers_registered: Counter,
    pub upload_plans: Counter,
    pub chunk_acks: Counter,
    pub read_plans: Counter,
    pub read_plans_unavailable: Counter,

    // Chunkserver
    pub chunks_stored: Counter,
    pub chunk_bytes_stored: Counter,
    pub chunks_served: Counter,
    pub ack_failures: Counter,

    // HTTP, keyed by path
    endpoints: Mutex<BTreeMap<String, EndpointCounts>>,

    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            chunkservers_registered: Counter::new(),
            upload_plans: Counter::new(),
            chunk_acks: Counter::new(),
            read_plans: Counter::new(),
            read_plans_unavailable: Counter::new(),
            chunks_stored: Counter::new(),
            chunk_bytes_stored: Counter::new(),
            chunks_served: Counter::new(),
            ack_failures: Counter::new(),
            endpoints: Mutex::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one HTTP request
    pub fn record_request(&self, path: &str, success: bool) {
        let mut endpoints = match self.endpoints.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let counts = endpoints.entry(path.to_string()).or_default();
        counts.total += 1;
        if !success {
            counts.errors += 1;
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-compatible metrics output
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();

        let counters: [(&str, &str, &Counter); 9] = [
            (
                "minidfs_chunkservers_registered_total",
                "Chunkserver registrations received",
                &self.chunkservers_registered,
            ),
            (
                "minidfs_upload_plans_total",
                "Upload plans issued",
                &self.upload_plans,
            ),
            (
                "minidfs_chunk_acks_total",
                "Chunk upload acknowledgements recorded",
                &self.chunk_acks,
            ),
            (
                "minidfs_read_plans_total",
                "Read plans issued",
                &self.read_plans,
            ),
            (
                "minidfs_read_plans_unavailable_total",
                "Read plans refused because chunks had no replica",
                &self.read_plans_unavailable,
            ),
            (
                "minidfs_chunks_stored_total",
                "Chunks written to local storage",
                &self.chunks_stored,
            ),
            (
                "minidfs_chunk_bytes_stored_total",
                "Bytes written to local chunk storage",
                &self.chunk_bytes_stored,
            ),
            (
                "minidfs_chunks_served_total",
                "Chunks streamed back to clients",
                &self.chunks_served,
            ),
            (
                "minidfs_ack_failures_total",
                "Upload notifications the coordinator never received",
                &self.ack_failures,
            ),
        ];

        for (name, help, counter) in counters {
            let _ = writeln!(out, "# HELP {} {}", name, help);
            let _ = writeln!(out, "# TYPE {} counter", name);
            let _ = writeln!(out, "{} {}", name, counter.get());
        }

        let _ = writeln!(out, "# HELP minidfs_uptime_seconds Process uptime in seconds");
        let _ = writeln!(out, "# TYPE minidfs_uptime_seconds gauge");
        let _ = writeln!(out, "minidfs_uptime_seconds {}", self.uptime_seconds());

        let endpoints = match self.endpoints.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let _ = writeln!(
            out,
            "# HELP minidfs_http_requests_total HTTP requests per path"
        );
        let _ = writeln!(out, "# TYPE minidfs_http_requests_total counter");
        for (path, counts) in &endpoints {
            let _ = writeln!(
                out,
                "minidfs_http_requests_total{{path=\"{}\"}} {}",
                path, counts.total
            );
        }
        let _ = writeln!(
            out,
            "# HELP minidfs_http_errors_total HTTP error responses per path"
        );
        let _ = writeln!(out, "# TYPE minidfs_http_errors_total counter");
        for (path, counts) in &endpoints {
            let _ = writeln!(
                out,
                "minidfs_http_errors_total{{path=\"{}\"}} {}",
                path, counts.errors
            );
        }

        out
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.inc();
        counter.add(4);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn test_prometheus_output() {
        let registry = MetricsRegistry::new();
        registry.upload_plans.inc();
        registry.record_request("/upload", true);
        registry.record_request("/upload", false);

        let out = registry.to_prometheus();
        assert!(out.contains("minidfs_upload_plans_total 1"));
        assert!(out.contains("minidfs_http_requests_total{path=\"/upload\"} 2"));
        assert!(out.contains("minidfs_http_errors_total{path=\"/upload\"} 1"));
        assert!(out.contains("# TYPE minidfs_chunks_stored_total counter"));
    }
}
