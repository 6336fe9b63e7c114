//! Vendor profiles: how each network adapter writes its transaction log.
//!
//! A profile says which literal marks a handshake line, where that literal
//! sits, and how a raw line is split into fields. Profiles are plain data;
//! new vendors are added to the built-in table or through a CSV override
//! file rather than through code.

use crate::error::{MonitorError, Result};
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// Identifier of the fallback profile.
pub const DEFAULT_VENDOR: &str = "default";

/// How a raw log line is split into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitRule {
    /// Split on every comma.
    Comma,

    /// Split on runs of whitespace.
    Whitespace,

    /// Split on whitespace when the line contains any of the markers,
    /// otherwise on commas.
    WhitespaceWhenMarked(Vec<String>),
}

impl SplitRule {
    /// Splits `line` into fields according to this rule.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            SplitRule::Comma => line.split(',').collect(),
            SplitRule::Whitespace => line.split_whitespace().collect(),
            SplitRule::WhitespaceWhenMarked(markers) => {
                if markers.iter().any(|m| line.contains(m.as_str())) {
                    line.split_whitespace().collect()
                } else {
                    line.split(',').collect()
                }
            }
        }
    }
}

/// Literal that identifies a handshake line and the field it appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub literal: String,
    pub field_index: usize,
}

/// Classification parameters for one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorProfile {
    /// Vendor identifier, e.g. `tfd`.
    pub id: String,

    /// Handshake marker. `None` means every transaction-bearing line counts.
    pub handshake: Option<Handshake>,

    /// Line-splitting rule.
    pub split_rule: SplitRule,
}

impl VendorProfile {
    /// Creates a profile without a handshake literal that splits on commas.
    pub fn plain(id: &str) -> Self {
        VendorProfile {
            id: id.to_string(),
            handshake: None,
            split_rule: SplitRule::Comma,
        }
    }

    /// Creates a comma-split profile with a handshake literal at `field_index`.
    pub fn with_handshake(id: &str, literal: &str, field_index: usize) -> Self {
        VendorProfile {
            id: id.to_string(),
            handshake: Some(Handshake {
                literal: literal.to_string(),
                field_index,
            }),
            split_rule: SplitRule::Comma,
        }
    }

    /// Replaces the split rule.
    pub fn split_by(mut self, rule: SplitRule) -> Self {
        self.split_rule = rule;
        self
    }
}

/// Raw vendor table row as read from CSV.
#[derive(Debug, Deserialize)]
pub struct VendorRecord {
    pub vendor: String,
    pub handshake: Option<String>,
    pub index: Option<usize>,
    pub split: Option<String>,
    pub markers: Option<String>,
}

impl VendorRecord {
    /// Validates the row and turns it into a profile.
    pub fn parse(&self) -> std::result::Result<VendorProfile, String> {
        let id = self.vendor.trim().to_lowercase();
        if id.is_empty() {
            return Err("empty vendor identifier".to_string());
        }

        let handshake = match non_empty(&self.handshake) {
            Some(literal) => {
                let field_index = self
                    .index
                    .ok_or_else(|| format!("handshake '{}' without index", literal))?;
                Some(Handshake {
                    literal: literal.to_string(),
                    field_index,
                })
            }
            None => None,
        };

        let split = non_empty(&self.split).unwrap_or("comma").to_lowercase();
        let split_rule = match split.as_str() {
            "comma" => SplitRule::Comma,
            "whitespace" => SplitRule::Whitespace,
            "marked" => {
                let markers: Vec<String> = non_empty(&self.markers)
                    .map(|m| m.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                if markers.is_empty() {
                    return Err("split rule 'marked' requires markers".to_string());
                }
                SplitRule::WhitespaceWhenMarked(markers)
            }
            other => return Err(format!("unknown split rule '{}'", other)),
        };

        Ok(VendorProfile {
            id,
            handshake,
            split_rule,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Read-only mapping from vendor identifier to profile.
#[derive(Debug, Clone)]
pub struct VendorRegistry {
    profiles: HashMap<String, VendorProfile>,
    default: VendorProfile,
}

impl VendorRegistry {
    /// Creates a registry holding only the default profile.
    pub fn empty() -> Self {
        VendorRegistry {
            profiles: HashMap::new(),
            default: VendorProfile::plain(DEFAULT_VENDOR),
        }
    }

    /// Creates the registry with every known network adapter.
    pub fn builtin() -> Self {
        let iso_markers = vec!["ISOIN:".to_string(), "ISOOUT:".to_string()];

        let mut registry = Self::empty();
        for profile in [
            VendorProfile::with_handshake("tfd", "0800", 2),
            VendorProfile::with_handshake("sfd", "0312", 2),
            VendorProfile::with_handshake("tfnd", "0800", 2),
            VendorProfile::with_handshake("fis", "0800", 2),
            VendorProfile::with_handshake("cop", "0800", 2)
                .split_by(SplitRule::WhitespaceWhenMarked(iso_markers)),
            VendorProfile::plain("eds").split_by(SplitRule::Whitespace),
            VendorProfile::plain("shz"),
            VendorProfile::with_handshake("cusc", "0800", 1),
            VendorProfile::with_handshake("ngn", "0800", 2),
            VendorProfile::plain("stp"),
            VendorProfile::plain("mba"),
            VendorProfile::plain("art"),
            VendorProfile::plain("ofxapi"),
            VendorProfile::plain("ofx"),
            VendorProfile::plain("eln"),
        ] {
            registry.insert(profile);
        }
        registry
    }

    /// Adds or replaces a profile. A profile named `default` replaces the fallback.
    pub fn insert(&mut self, profile: VendorProfile) {
        if profile.id == DEFAULT_VENDOR {
            self.default = profile;
        } else {
            self.profiles.insert(profile.id.clone(), profile);
        }
    }

    /// Adds or replaces profiles from a CSV vendor table.
    ///
    /// Unlike transaction lines, a bad table row is fatal: a half-loaded
    /// table would silently misclassify a vendor.
    pub fn extend_from_csv<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut loaded = 0;
        for (row_idx, result) in csv_reader.deserialize::<VendorRecord>().enumerate() {
            let row = row_idx + 2; // 1-indexed, accounting for header row
            let record = result?;
            let profile = record
                .parse()
                .map_err(|message| MonitorError::InvalidVendorRecord { row, message })?;
            debug!("Row {}: loaded vendor profile {:?}", row, profile);
            self.insert(profile);
            loaded += 1;
        }

        info!("Loaded {} vendor profiles from table", loaded);
        Ok(loaded)
    }

    /// Looks up a vendor without falling back.
    pub fn try_lookup(&self, vendor_id: &str) -> Result<&VendorProfile> {
        if vendor_id == DEFAULT_VENDOR {
            return Ok(&self.default);
        }
        self.profiles
            .get(vendor_id)
            .ok_or_else(|| MonitorError::UnknownVendor(vendor_id.to_string()))
    }

    /// Looks up a vendor, falling back to the default profile.
    pub fn lookup(&self, vendor_id: &str) -> &VendorProfile {
        match self.try_lookup(vendor_id) {
            Ok(profile) => profile,
            Err(e) => {
                debug!("{}, using default profile", e);
                &self.default
            }
        }
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
