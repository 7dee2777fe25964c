//! Crash report value objects.
//!
//! The shell sends a list of loosely typed exception records. Parsing is
//! lenient and per-record: a malformed record is dropped without affecting
//! the rest of the batch, and wrongly typed optional fields on a stack frame
//! simply become `None`.
//!
//! A record is malformed when it is not a JSON object, when `type` or
//! `message` is present but neither `null` nor a string, or when
//! `callStacks` is present but neither `null` nor an array.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Platform tag attached to crash events coming from the shell.
pub const DEFAULT_CRASH_PLATFORM: &str = "flutter";

/// One frame of a reported call stack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
	pub file_name: Option<String>,
	pub class_name: Option<String>,
	pub method_name: Option<String>,
	pub line_number: Option<i64>,
}

impl StackFrame {
	/// Parses a frame; returns `None` if `value` is not an object.
	pub fn from_json(value: &Value) -> Option<Self> {
		let frame = value.as_object()?;
		Some(Self {
			file_name: lenient_string(frame, "fileName"),
			class_name: lenient_string(frame, "className"),
			method_name: lenient_string(frame, "methodName"),
			line_number: frame.get("lineNumber").and_then(number_as_i64),
		})
	}
}

/// A single exception with its call stack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionRecord {
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub message: Option<String>,
	pub call_stacks: Option<Vec<StackFrame>>,
}

impl ExceptionRecord {
	/// Parses a record, returning `None` when it is malformed.
	pub fn from_json(value: &Value) -> Option<Self> {
		let record = value.as_object()?;
		let kind = strict_string(record, "type")?;
		let message = strict_string(record, "message")?;
		let call_stacks = match record.get("callStacks") {
			None | Some(Value::Null) => None,
			Some(Value::Array(frames)) => {
				Some(frames.iter().filter_map(StackFrame::from_json).collect())
			}
			Some(_) => return None,
		};
		Some(Self {
			kind,
			message,
			call_stacks,
		})
	}
}

/// Parses a batch, silently dropping malformed records.
pub fn parse_exception_records(values: &[Value]) -> Vec<ExceptionRecord> {
	values.iter().filter_map(ExceptionRecord::from_json).collect()
}

/// Severity of a crash event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrashSeverity {
	Crash,
	Warning,
	#[default]
	Unknown,
}

impl CrashSeverity {
	/// Maps `"crash"` and `"warning"`; anything else is [`CrashSeverity::Unknown`].
	pub fn from_wire(value: Option<&str>) -> Self {
		match value {
			Some("crash") => CrashSeverity::Crash,
			Some("warning") => CrashSeverity::Warning,
			_ => CrashSeverity::Unknown,
		}
	}
}

/// A crash event ready to hand to the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCrashEvent {
	pub exceptions: Vec<ExceptionRecord>,
	pub platform: String,
	pub flutter_sdk_version: Option<String>,
	pub severity: CrashSeverity,
}

impl TrackCrashEvent {
	/// Builds an event from raw records.
	///
	/// Returns `None` when no record survives parsing; an empty crash event is
	/// never produced.
	pub fn from_records(
		records: &[Value],
		platform: impl Into<String>,
		flutter_sdk_version: Option<String>,
		severity: Option<&str>,
	) -> Option<Self> {
		let exceptions = parse_exception_records(records);
		if exceptions.is_empty() {
			return None;
		}
		Some(Self {
			exceptions,
			platform: platform.into(),
			flutter_sdk_version,
			severity: CrashSeverity::from_wire(severity),
		})
	}
}

/// `Some(None)` for absent or null, `Some(Some(s))` for strings, `None` otherwise.
fn strict_string(map: &Map<String, Value>, key: &str) -> Option<Option<String>> {
	match map.get(key) {
		None | Some(Value::Null) => Some(None),
		Some(Value::String(s)) => Some(Some(s.clone())),
		Some(_) => None,
	}
}

fn lenient_string(map: &Map<String, Value>, key: &str) -> Option<String> {
	map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn number_as_i64(value: &Value) -> Option<i64> {
	match value {
		Value::Number(number) => number
			.as_i64()
			.or_else(|| number.as_f64().map(|f| f as i64)),
		_ => None,
	}
}
