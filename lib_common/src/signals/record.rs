//! # Signal Record
//!
//! The immutable unit of data flowing through the relay. A `SignalRecord` wraps
//! an arbitrary JSON payload received from an upstream alerting source (e.g. a
//! TradingView webhook) together with two timestamps injected at ingest time.
//!
//! ## Core Design Principles:
//!
//! 1.  **Opaque Payload**: The sender's fields are forwarded untouched as a
//!     `serde_json::Map`. No schema is imposed; a signal may carry any mix of
//!     objects, arrays, strings, numbers, booleans, and nulls at any depth.
//!
//! 2.  **Single Clock Read**: `timestamp` (RFC 3339, UTC) and `received_at`
//!     (human-readable local time) are derived from one `Utc::now()` call, so
//!     the two fields can never disagree about when a signal arrived.
//!
//! 3.  **Flat Serialization**: The record serializes as a single JSON object,
//!     payload keys at the top level next to the injected fields. Injected
//!     fields win on a key collision with sender-supplied data.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `strftime` layout for the human-readable `received_at` field.
const RECEIVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// # Signal Record
///
/// A single buffered trading signal. Constructed once at ingest and never
/// mutated afterwards; the buffer stores and hands out records by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// The sender-supplied payload, flattened into the top level of the
    /// serialized record.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    /// ISO-8601 / RFC 3339 instant (UTC) assigned when the signal was ingested.
    pub timestamp: String,
    /// Human-readable local-time rendering of the same instant.
    pub received_at: String,
}

impl SignalRecord {
    /// # From Payload
    ///
    /// Builds a record from any JSON value and stamps it with the current time.
    ///
    /// A JSON object is taken as-is. Anything else (bare string, number,
    /// array, bool, null) is wrapped as `{"message": <value>, "raw": true}`
    /// so that no sender data is ever dropped due to format ambiguity.
    ///
    /// Sender-supplied `timestamp` / `received_at` keys are discarded; the
    /// injected values are authoritative.
    pub fn from_payload(payload: Value) -> Self {
        // One clock read for both fields.
        let now = Utc::now();

        let mut map = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("message".to_string(), other);
                map.insert("raw".to_string(), Value::Bool(true));
                map
            }
        };

        // Flattened serialization would otherwise emit duplicate keys.
        map.remove("timestamp");
        map.remove("received_at");

        Self {
            payload: map,
            timestamp: now.to_rfc3339(),
            received_at: now
                .with_timezone(&Local)
                .format(RECEIVED_AT_FORMAT)
                .to_string(),
        }
    }

    /// # From Raw Text
    ///
    /// Wraps an unparseable request body as a text signal. Equivalent to
    /// `from_payload(Value::String(text))`.
    pub fn from_raw_text(text: impl Into<String>) -> Self {
        Self::from_payload(Value::String(text.into()))
    }

    /// Returns the payload value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_payload_is_kept_verbatim() {
        let record = SignalRecord::from_payload(json!({
            "action": "BUY",
            "symbol": "BTCUSDT",
            "price": 45000
        }));

        assert_eq!(record.get("action"), Some(&json!("BUY")));
        assert_eq!(record.get("symbol"), Some(&json!("BTCUSDT")));
        assert_eq!(record.get("price"), Some(&json!(45000)));
        assert!(!record.timestamp.is_empty());
        assert!(!record.received_at.is_empty());
    }

    #[test]
    fn non_object_payload_is_wrapped_as_raw() {
        let record = SignalRecord::from_raw_text("buy the dip");

        assert_eq!(record.get("message"), Some(&json!("buy the dip")));
        assert_eq!(record.get("raw"), Some(&json!(true)));
    }

    #[test]
    fn bare_array_is_wrapped_as_raw() {
        let record = SignalRecord::from_payload(json!([1, 2, 3]));

        assert_eq!(record.get("message"), Some(&json!([1, 2, 3])));
        assert_eq!(record.get("raw"), Some(&json!(true)));
    }

    #[test]
    fn injected_fields_override_sender_supplied_ones() {
        let record = SignalRecord::from_payload(json!({
            "action": "SELL",
            "timestamp": "1970-01-01T00:00:00Z",
            "received_at": "never"
        }));

        // The sender's clock is not trusted.
        assert_ne!(record.timestamp, "1970-01-01T00:00:00Z");
        assert_ne!(record.received_at, "never");
        assert!(record.payload.get("timestamp").is_none());

        // Serialized form carries exactly one copy of each injected field.
        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(serialized["action"], json!("SELL"));
        assert_eq!(serialized["timestamp"], json!(record.timestamp));
    }

    #[test]
    fn serializes_flat_and_round_trips() {
        let record = SignalRecord::from_payload(json!({"symbol": "ETHUSDT", "nested": {"a": [1, null]}}));

        let serialized = serde_json::to_string(&record).unwrap();
        let parsed: SignalRecord = serde_json::from_str(&serialized).unwrap();

        assert_eq!(parsed, record);
        // Payload keys live at the top level, not under a "payload" wrapper.
        let value: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(value["symbol"], json!("ETHUSDT"));
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn timestamp_parses_as_rfc3339() {
        let record = SignalRecord::from_payload(json!({"x": 1}));
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }
}
