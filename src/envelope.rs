//! JSON envelope produced by the log collector.
//!
//! ```json
//! {
//!   "services": { "eds": { "data": "IN :1804 Live\n...", "is_down": false } },
//!   "vendors":  { "tfd": { "data": "...", "message": "optional text" } }
//! }
//! ```
//!
//! Each `services` entry becomes sensor `HM-{network}-{hostname}` and each
//! `vendors` entry becomes `Debit-{network}-{hostname}`.

use crate::error::{MonitorError, Result};
use log::debug;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Sensor token prefix for `services` entries.
pub const SERVICE_PREFIX: &str = "HM";

/// Sensor token prefix for `vendors` entries.
pub const VENDOR_PREFIX: &str = "Debit";

/// Raw batch as it appears in the envelope.
#[derive(Debug, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_down: Option<bool>,
}

/// Top-level envelope document.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub services: Option<BTreeMap<String, RawBatch>>,
    #[serde(default)]
    pub vendors: Option<BTreeMap<String, RawBatch>>,
}

/// Lines for one vendor, split and ready for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorBatch {
    pub vendor: String,
    pub lines: Vec<String>,
    /// Replaces the sensor message when present and non-empty.
    pub message: Option<String>,
    /// Only meaningful when `lines` is empty.
    pub is_down: bool,
}

impl VendorBatch {
    fn from_raw(vendor: &str, raw: RawBatch) -> Self {
        let lines = raw
            .data
            .as_deref()
            .map(|data| data.lines().map(str::to_string).collect())
            .unwrap_or_default();

        VendorBatch {
            vendor: vendor.to_string(),
            lines,
            message: raw.message.filter(|m| !m.is_empty()),
            is_down: raw.is_down.unwrap_or(false),
        }
    }
}

/// All vendor batches reported to one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorBatch {
    pub sensor: String,
    pub vendors: Vec<VendorBatch>,
}

/// Builds the sensor token for a network.
pub fn sensor_token(prefix: &str, network: &str, hostname: &str) -> String {
    format!("{}-{}-{}", prefix, network, hostname)
}

/// Collapses runs of spaces to one space and trims the document.
pub fn collapse_spaces(input: &str) -> Result<String> {
    let spaces = Regex::new("[ ]+")?;
    Ok(spaces.replace_all(input, " ").trim().to_string())
}

impl Envelope {
    /// Parses an envelope document after collapsing repeated spaces.
    pub fn parse_str(input: &str) -> Result<Self> {
        let clean = collapse_spaces(input)?;
        debug!("Envelope received: {}", clean);
        Ok(serde_json::from_str(&clean)?)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Self::parse_str(&input)
    }

    /// Splits the envelope into per-sensor batches, services first.
    pub fn into_sensors(self, hostname: &str) -> Result<Vec<SensorBatch>> {
        if self.services.is_none() && self.vendors.is_none() {
            return Err(MonitorError::MissingEnvelope);
        }

        let groups = [
            (SERVICE_PREFIX, self.services),
            (VENDOR_PREFIX, self.vendors),
        ];

        let mut sensors = Vec::new();
        for (prefix, group) in groups {
            for (network, raw) in group.unwrap_or_default() {
                sensors.push(SensorBatch {
                    sensor: sensor_token(prefix, &network, hostname),
                    vendors: vec![VendorBatch::from_raw(&network, raw)],
                });
            }
        }
        Ok(sensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("  a   b \n  c  ").unwrap(), "a b \n c");
        assert_eq!(collapse_spaces("IN :1804    Live").unwrap(), "IN :1804 Live");
        // tabs are not spaces
        assert_eq!(collapse_spaces("IN\t\tLive").unwrap(), "IN\t\tLive");
    }

    #[test]
    fn test_sensors_from_services_and_vendors() {
        let input = r#"{
            "services": {"eds": {"data": "IN :1804   Live\nIN :1804 ST&F", "is_down": false}},
            "vendors": {
                "tfd": {"data": "IN,0900,foo,Live", "message": "hello"},
                "cop": {"data": "", "is_down": true}
            }
        }"#;

        let sensors = Envelope::parse_str(input)
            .unwrap()
            .into_sensors("host01")
            .unwrap();

        let names: Vec<_> = sensors.iter().map(|s| s.sensor.as_str()).collect();
        assert_eq!(names, vec!["HM-eds-host01", "Debit-cop-host01", "Debit-tfd-host01"]);

        let eds = &sensors[0].vendors[0];
        assert_eq!(eds.vendor, "eds");
        assert_eq!(eds.lines, vec!["IN :1804 Live", "IN :1804 ST&F"]);

        let cop = &sensors[1].vendors[0];
        assert!(cop.lines.is_empty());
        assert!(cop.is_down);

        let tfd = &sensors[2].vendors[0];
        assert_eq!(tfd.message.as_deref(), Some("hello"));
        assert!(!tfd.is_down);
    }

    #[test]
    fn test_null_group_is_skipped() {
        let input = r#"{"services": null, "vendors": {"ofx": {"data": "IN,Live"}}}"#;
        let sensors = Envelope::parse_str(input)
            .unwrap()
            .into_sensors("h")
            .unwrap();

        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].sensor, "Debit-ofx-h");
    }

    #[test]
    fn test_empty_message_is_ignored() {
        let input = r#"{"vendors": {"ofx": {"data": "IN,Live", "message": ""}}}"#;
        let sensors = Envelope::parse_str(input)
            .unwrap()
            .into_sensors("h")
            .unwrap();

        assert_eq!(sensors[0].vendors[0].message, None);
    }

    #[test]
    fn test_missing_groups_is_an_error() {
        let envelope = Envelope::parse_str("{}").unwrap();
        assert!(matches!(
            envelope.into_sensors("h"),
            Err(MonitorError::MissingEnvelope)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Envelope::parse_str("not json"),
            Err(MonitorError::Json(_))
        ));
    }
}
