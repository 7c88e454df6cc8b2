//! Log-based telemetry sink adapter.
//!
//! Implements [`TelemetrySink`] by writing each data point as one JSON
//! line to the logger (UART / USB-CDC in production).  A network
//! transport for the remote channel would implement the same trait.

use log::{info, warn};

use crate::app::ports::TelemetrySink;
use crate::config::TelemetrySettings;
use crate::telemetry::DataPoint;

/// Adapter that logs every [`DataPoint`] to the serial console.
#[derive(Debug, Default)]
pub struct LogTelemetrySink {
    sent: u32,
}

impl LogTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data points handed over so far.
    pub fn sent(&self) -> u32 {
        self.sent
    }
}

impl TelemetrySink for LogTelemetrySink {
    fn log(&mut self, zone: usize, remote: &TelemetrySettings, point: &DataPoint) -> bool {
        if !remote.is_configured() {
            return false;
        }
        match serde_json::to_string(point) {
            Ok(json) => {
                info!("TELEM | zone={} channel={} | {}", zone, remote.channel_id, json);
                self.sent += 1;
                true
            }
            Err(e) => {
                warn!("TELEM | zone={} encode failed: {}", zone, e);
                false
            }
        }
    }
}
