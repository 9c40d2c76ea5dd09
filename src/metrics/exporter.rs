use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::CounterMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for counter metrics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// directly or forwarded to an OpenTelemetry collector. Write errors are
/// dropped; metrics are best-effort.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_sample(&self, kind: &str, name: &str, value: u64) {
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_sample("counter", &self.metric_name(suffix), value);
    }

    fn write_gauge(&self, suffix: &str, value: u64) {
        self.write_sample("gauge", &self.metric_name(suffix), value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<CounterMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &CounterMetricsSnapshot) {
        self.write_counter("increment_calls_total", snapshot.increment_calls);
        self.write_counter("increment_new_keys_total", snapshot.increment_new_keys);
        self.write_counter("increment_saturated_total", snapshot.increment_saturated);
        self.write_counter("decrement_calls_total", snapshot.decrement_calls);
        self.write_counter("decrement_missing_total", snapshot.decrement_missing);
        self.write_counter(
            "decrement_dropped_keys_total",
            snapshot.decrement_dropped_keys,
        );
        self.write_counter("remove_calls_total", snapshot.remove_calls);
        self.write_counter("remove_found_total", snapshot.remove_found);
        self.write_counter("bucket_allocs_total", snapshot.bucket_allocs);
        self.write_counter("bucket_frees_total", snapshot.bucket_frees);
        self.write_counter("max_key_calls_total", snapshot.max_key_calls);
        self.write_counter("max_key_found_total", snapshot.max_key_found);
        self.write_counter("min_key_calls_total", snapshot.min_key_calls);
        self.write_counter("min_key_found_total", snapshot.min_key_found);
        self.write_counter("clear_calls_total", snapshot.clear_calls);
        self.write_gauge("keys", snapshot.len as u64);
        self.write_gauge("buckets", snapshot.bucket_count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_prefixed_prometheus_text() {
        let exporter = PrometheusTextExporter::new("tally", Vec::new());
        let snapshot = CounterMetricsSnapshot {
            increment_calls: 3,
            len: 2,
            ..Default::default()
        };
        exporter.export(&snapshot);

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("# TYPE tally_increment_calls_total counter\n"));
        assert!(text.contains("tally_increment_calls_total 3\n"));
        assert!(text.contains("# TYPE tally_keys gauge\n"));
        assert!(text.contains("tally_keys 2\n"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        exporter.export(&CounterMetricsSnapshot::default());

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("\nbuckets 0\n"));
        assert!(!text.contains("_buckets"));
    }
}
