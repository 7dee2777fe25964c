use nubrick_protocol::TrackCrashEvent;
use serde_json::Value;

use super::BridgeManager;

impl BridgeManager {
	/// Parses raw exception records and forwards them to the SDK.
	///
	/// Malformed records are dropped one by one. Nothing is sent when no record
	/// survives or no SDK is installed. Returns whether a report was sent.
	pub fn record_crash(
		&self,
		records: &[Value],
		sdk_version: Option<String>,
		severity: Option<&str>,
	) -> bool {
		let Some(event) = TrackCrashEvent::from_records(
			records,
			self.inner.config.crash_platform.as_str(),
			sdk_version,
			severity,
		) else {
			tracing::debug!(records = records.len(), "No usable crash records");
			return false;
		};
		let dropped = records.len() - event.exceptions.len();
		if dropped > 0 {
			tracing::debug!(dropped, "Malformed crash records skipped");
		}
		let Some(sdk) = self.sdk() else {
			tracing::debug!("Crash report dropped, no SDK client");
			return false;
		};
		sdk.send_crash(event);
		true
	}
}
