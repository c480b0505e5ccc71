//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for the detection pipeline:
//! - Analyze request counts and latency by language
//! - Results by entity type and by recognizer
//! - Anonymize requests and operator applications
//! - Spans dropped during conflict resolution

use prometheus::{CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for the analyzer and anonymizer
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    // Analyzer
    /// Analyze calls by language
    pub analyze_requests_total: CounterVec,
    /// Analyze latency by language
    pub analyze_duration_seconds: HistogramVec,
    /// Returned results by entity type
    pub analyze_results_total: CounterVec,
    /// Raw results by recognizer, before de-duplication
    pub recognizer_results_total: CounterVec,

    // Anonymizer
    /// Anonymize calls
    pub anonymize_requests_total: IntCounter,
    /// Operator applications by operator and entity type
    pub anonymize_operations_total: CounterVec,
    /// Spans removed by merging or conflict resolution
    pub anonymize_conflicts_dropped_total: IntCounter,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let analyze_requests_total = CounterVec::new(
            Opts::new("veil_analyze_requests_total", "Total number of analyze requests"),
            &["language"],
        )?;

        let analyze_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "veil_analyze_duration_seconds",
                "Analyze request duration in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]),
            &["language"],
        )?;

        let analyze_results_total = CounterVec::new(
            Opts::new(
                "veil_analyze_results_total",
                "Total number of results returned by analyze",
            ),
            &["entity_type"],
        )?;

        let recognizer_results_total = CounterVec::new(
            Opts::new(
                "veil_recognizer_results_total",
                "Total number of raw results produced per recognizer",
            ),
            &["recognizer"],
        )?;

        let anonymize_requests_total = IntCounter::with_opts(Opts::new(
            "veil_anonymize_requests_total",
            "Total number of anonymize requests",
        ))?;

        let anonymize_operations_total = CounterVec::new(
            Opts::new(
                "veil_anonymize_operations_total",
                "Total number of operator applications",
            ),
            &["operator", "entity_type"],
        )?;

        let anonymize_conflicts_dropped_total = IntCounter::with_opts(Opts::new(
            "veil_anonymize_conflicts_dropped_total",
            "Total number of spans removed by merging or conflict resolution",
        ))?;

        registry.register(Box::new(analyze_requests_total.clone()))?;
        registry.register(Box::new(analyze_duration_seconds.clone()))?;
        registry.register(Box::new(analyze_results_total.clone()))?;
        registry.register(Box::new(recognizer_results_total.clone()))?;
        registry.register(Box::new(anonymize_requests_total.clone()))?;
        registry.register(Box::new(anonymize_operations_total.clone()))?;
        registry.register(Box::new(anonymize_conflicts_dropped_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            analyze_requests_total,
            analyze_duration_seconds,
            analyze_results_total,
            recognizer_results_total,
            anonymize_requests_total,
            anonymize_operations_total,
            anonymize_conflicts_dropped_total,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed analyze call and its results
    pub fn record_analyze<'a>(
        &self,
        language: &str,
        duration_secs: f64,
        entity_types: impl IntoIterator<Item = &'a str>,
    ) {
        self.analyze_requests_total
            .with_label_values(&[language])
            .inc();
        self.analyze_duration_seconds
            .with_label_values(&[language])
            .observe(duration_secs);
        for entity_type in entity_types {
            self.analyze_results_total
                .with_label_values(&[entity_type])
                .inc();
        }
    }

    /// Record raw results from one recognizer
    pub fn record_recognizer_results(&self, recognizer: &str, count: usize) {
        self.recognizer_results_total
            .with_label_values(&[recognizer])
            .inc_by(count as f64);
    }

    pub fn record_anonymize(&self, dropped_spans: usize) {
        self.anonymize_requests_total.inc();
        self.anonymize_conflicts_dropped_total
            .inc_by(dropped_spans as u64);
    }

    pub fn record_operation(&self, operator: &str, entity_type: &str) {
        self.anonymize_operations_total
            .with_label_values(&[operator, entity_type])
            .inc();
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &PipelineMetrics, name: &str) -> f64 {
        let gathered = metrics.registry().gather();
        let family = gathered
            .iter()
            .find(|m| m.name() == name)
            .unwrap_or_else(|| panic!("{name} metric not found"));
        family
            .metric
            .iter()
            .map(|m| m.counter.as_ref().unwrap().value.unwrap())
            .sum()
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = PipelineMetrics::new().unwrap();
        metrics.record_anonymize(0);
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_analyze() {
        let metrics = PipelineMetrics::new().unwrap();
        metrics.record_analyze("en", 0.002, ["PERSON", "PERSON", "US_SSN"]);

        assert_eq!(counter_value(&metrics, "veil_analyze_requests_total"), 1.0);
        assert_eq!(counter_value(&metrics, "veil_analyze_results_total"), 3.0);
    }

    #[test]
    fn test_record_recognizer_results() {
        let metrics = PipelineMetrics::new().unwrap();
        metrics.record_recognizer_results("UsSsnRecognizer", 4);
        assert_eq!(counter_value(&metrics, "veil_recognizer_results_total"), 4.0);
    }

    #[test]
    fn test_record_anonymize() {
        let metrics = PipelineMetrics::new().unwrap();
        metrics.record_anonymize(2);
        metrics.record_operation("mask", "CREDIT_CARD");
        metrics.record_operation("replace", "PERSON");

        assert_eq!(counter_value(&metrics, "veil_anonymize_requests_total"), 1.0);
        assert_eq!(
            counter_value(&metrics, "veil_anonymize_conflicts_dropped_total"),
            2.0
        );
        assert_eq!(counter_value(&metrics, "veil_anonymize_operations_total"), 2.0);
    }
}
