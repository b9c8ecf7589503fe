use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};

/// One-shot events reported after each preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TelemetryEvent {
    FilePreviewed,
    FilePreviewError { message: String },
}

impl TelemetryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::FilePreviewed => "PhotoGeoPreviewHandler_FilePreviewed",
            TelemetryEvent::FilePreviewError { .. } => "PhotoGeoPreviewHandler_FilePreviewError",
        }
    }
}

/// Destination for telemetry events
pub trait TelemetrySink {
    fn write_event(&self, event: &TelemetryEvent) -> anyhow::Result<()>;
}

/// Writes events as structured records on the `telemetry` log target
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn write_event(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(target: "telemetry", event = event.name(), payload = %payload, "Telemetry event");
        Ok(())
    }
}

/// Send an event, swallowing errors and panics from the sink
pub fn emit_best_effort(sink: &dyn TelemetrySink, event: TelemetryEvent) {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.write_event(&event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::debug!(target: "telemetry", event = event.name(), error = %e, "Dropping telemetry event");
        }
        Err(_) => {
            tracing::debug!(target: "telemetry", event = event.name(), "Telemetry sink panicked");
        }
    }
}
