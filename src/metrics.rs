//! Prometheus metrics collection for tempvoice.
//!
//! Exposed on the `/metrics` HTTP endpoint (see [`crate::http`]).
//!
//! - `tempvoice_active_channels` - Live temporary channels (gauge)
//! - `tempvoice_provisions_total{outcome}` - Lobby joins by outcome
//! - `tempvoice_evictions_total{reason}` - Records removed by reconciliation
//! - `tempvoice_gateway_errors_total{op,error}` - Failed platform calls
//! - `tempvoice_gateway_duration_seconds{op}` - Platform call latency
//!
//! Every helper is a no-op until [`init`] has run, so library code and tests
//! can record freely.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Gauges
// ========================================================================

/// Records currently held in the lifecycle store.
pub static ACTIVE_CHANNELS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Counters
// ========================================================================

/// Provisioning attempts by outcome (created, at_capacity, create_failed).
pub static PROVISIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Evicted records by reason (drift, empty).
pub static EVICTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Gateway call failures by operation and error code.
pub static GATEWAY_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Gateway call latency by operation.
pub static GATEWAY_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before serving `/metrics`. Repeat calls are harmless.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    if ACTIVE_CHANNELS.get().is_some() {
        return;
    }

    register!(ACTIVE_CHANNELS, IntGauge::new("tempvoice_active_channels", "Live temporary channels"));
    register!(PROVISIONS, IntCounterVec::new(Opts::new("tempvoice_provisions_total", "Lobby joins by provisioning outcome"), &["outcome"]));
    register!(EVICTIONS, IntCounterVec::new(Opts::new("tempvoice_evictions_total", "Temporary channel records evicted"), &["reason"]));
    register!(GATEWAY_ERRORS, IntCounterVec::new(Opts::new("tempvoice_gateway_errors_total", "Failed platform calls"), &["op", "error"]));
    register!(GATEWAY_LATENCY, HistogramVec::new(
        HistogramOpts::new("tempvoice_gateway_duration_seconds", "Platform call latency by operation")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["op"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

#[inline]
pub fn set_active_channels(count: usize) {
    if let Some(g) = ACTIVE_CHANNELS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn record_provision(outcome: &str) {
    if let Some(c) = PROVISIONS.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_eviction(reason: &str) {
    if let Some(c) = EVICTIONS.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_gateway_error(op: &str, error: &str) {
    if let Some(c) = GATEWAY_ERRORS.get() {
        c.with_label_values(&[op, error]).inc();
    }
}

#[inline]
pub fn record_gateway_latency(op: &str, duration_secs: f64) {
    if let Some(h) = GATEWAY_LATENCY.get() {
        h.with_label_values(&[op]).observe(duration_secs);
    }
}
