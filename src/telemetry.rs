//! Telemetry utilities: subscriber setup, gateway call timing, spans.

use crate::config::LogFormat;
use crate::error::GatewayError;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Guard for timing one gateway call.
///
/// Records latency when dropped; call [`fail`](Self::fail) to also count
/// the error.
pub struct GatewayTimer {
    op: &'static str,
    start: Instant,
}

impl GatewayTimer {
    /// Start timing a gateway operation.
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
        }
    }

    /// Count a failed call against this operation.
    pub fn fail(&self, error: &GatewayError) {
        crate::metrics::record_gateway_error(self.op, error.error_code());
    }
}

impl Drop for GatewayTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_gateway_latency(self.op, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one lobby join being provisioned.
    pub fn provision(guild: &str, user: &str) -> Span {
        info_span!("provision", guild = %guild, user = %user)
    }

    /// Span for one sweeper tick.
    pub fn sweep(tracked: usize) -> Span {
        info_span!("sweep", tracked = tracked)
    }
}
