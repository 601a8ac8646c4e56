//! Shared types for the parcel tracking gateway

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status reported before the first successful refresh, and whenever the
/// carrier omits a status code.
pub const STATUS_UNKNOWN: &str = "unknown";

/// Icon token exposed on every tracking entity.
pub const ICON: &str = "mdi:package-variant-closed";

/// Namespace prefix for entity display handles.
const HANDLE_PREFIX: &str = "sensor.dhl_";

/// Newtype wrapper for tracking identifiers.
///
/// Identifiers are case-normalized to uppercase at construction; storage,
/// lookup, and handle derivation all operate on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct TrackingId(String);

impl TrackingId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name shown for the entity.
    pub fn display_name(&self) -> String {
        format!("DHL Package {}", self.0)
    }

    /// Display handle used by the host to address and remove the entity.
    pub fn handle(&self) -> String {
        format!("{}{}", HANDLE_PREFIX, self.0.to_lowercase())
    }
}

impl From<String> for TrackingId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response body of the carrier's tracking endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingResponse {
    #[serde(default)]
    pub shipments: Vec<ShipmentRecord>,
}

/// One shipment record as returned by the carrier.
///
/// Kept as a raw JSON object so arbitrary carrier fields survive and can be
/// exposed on the entity's attribute mapping unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentRecord(pub Map<String, Value>);

impl ShipmentRecord {
    /// Status code at `status.statusCode`, if present.
    pub fn status_code(&self) -> Option<&str> {
        self.0.get("status")?.get("statusCode")?.as_str()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_id_normalizes_to_uppercase() {
        assert_eq!(TrackingId::new("abc123").as_str(), "ABC123");
        assert_eq!(TrackingId::new("  AbC123 ").as_str(), "ABC123");
        assert_eq!(TrackingId::new("abc123"), TrackingId::new("ABC123"));
    }

    #[test]
    fn test_display_name_and_handle() {
        let id = TrackingId::new("abc123");
        assert_eq!(id.display_name(), "DHL Package ABC123");
        assert_eq!(id.handle(), "sensor.dhl_abc123");
    }

    #[test]
    fn test_tracking_id_deserialize_normalizes() {
        let id: TrackingId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id.as_str(), "ABC123");
    }

    #[test]
    fn test_parse_tracking_response() {
        let body = r#"{"shipments":[{"status":{"statusCode":"delivered"},"origin":"X"}]}"#;
        let response: TrackingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.shipments.len(), 1);

        let shipment = &response.shipments[0];
        assert_eq!(shipment.status_code(), Some("delivered"));
        assert_eq!(shipment.get("origin"), Some(&Value::String("X".to_string())));
    }

    #[test]
    fn test_parse_response_without_shipments_field() {
        let response: TrackingResponse = serde_json::from_str("{}").unwrap();
        assert!(response.shipments.is_empty());
    }

    #[test]
    fn test_status_code_missing() {
        let body = r#"{"origin":"X"}"#;
        let shipment: ShipmentRecord = serde_json::from_str(body).unwrap();
        assert_eq!(shipment.status_code(), None);

        let body = r#"{"status":{}}"#;
        let shipment: ShipmentRecord = serde_json::from_str(body).unwrap();
        assert_eq!(shipment.status_code(), None);
    }
}
