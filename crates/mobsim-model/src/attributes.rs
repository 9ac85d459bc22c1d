//! Scenario-wide scalar attributes.
//!
//! This module provides:
//! - [`AttributeValue`] - the dynamic scalar value type
//! - [`AttributeDef`] - const metadata for the attributes the engines read
//! - [`GlobalAttributes`] - the per-scenario name to value map

use mobsim_common::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

// ============================================================================
// Attribute Value
// ============================================================================

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value (i64).
    Integer(i64),
    /// Floating point value (f64).
    Float(f64),
    /// String value.
    String(String),
}

impl AttributeValue {
    /// Convert to f64 if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Convert to i64 if possible. Floats must be integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            AttributeValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Convert to u64 if possible.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    /// Convert to bool if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Float(_) => "float",
            AttributeValue::String(_) => "string",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(v) => write!(f, "{}", v),
            AttributeValue::Integer(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Integer(i64::from(v))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

// ============================================================================
// Attribute Definitions
// ============================================================================

/// The value kind a known attribute accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Any numeric value.
    Float,
    /// An integral value.
    Integer,
    /// A non-negative integral value.
    Unsigned,
}

impl AttributeKind {
    fn accepts(self, value: &AttributeValue) -> bool {
        match self {
            AttributeKind::Float => value.as_f64().is_some(),
            AttributeKind::Integer => value.as_i64().is_some(),
            AttributeKind::Unsigned => value.as_u64().is_some(),
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Float => write!(f, "float"),
            AttributeKind::Integer => write!(f, "integer"),
            AttributeKind::Unsigned => write!(f, "unsigned integer"),
        }
    }
}

/// The default value for an attribute, usable in const contexts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeDefault {
    /// Floating point value.
    Float(f64),
    /// Integer value.
    Integer(i64),
}

impl AttributeDefault {
    /// Convert to an [`AttributeValue`].
    pub fn to_value(self) -> AttributeValue {
        match self {
            AttributeDefault::Float(v) => AttributeValue::Float(v),
            AttributeDefault::Integer(v) => AttributeValue::Integer(v),
        }
    }
}

/// Metadata for an attribute read by the engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeDef {
    /// Attribute name as used in scenario files.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Accepted value kind.
    pub kind: AttributeKind,
    /// Value used when the scenario does not set one.
    pub default: AttributeDefault,
    /// Optional unit string (e.g., "dBm", "Hz").
    pub unit: Option<&'static str>,
}

impl AttributeDef {
    /// Get the default value as an [`AttributeValue`].
    pub fn default_value(&self) -> AttributeValue {
        self.default.to_value()
    }
}

/// Receiver noise floor.
pub const NOISE_FLOOR_DBM: AttributeDef = AttributeDef {
    name: "noise_floor_dbm",
    description: "Receiver noise floor",
    kind: AttributeKind::Float,
    default: AttributeDefault::Float(-100.0),
    unit: Some("dBm"),
};

/// Channel bandwidth used for capacity.
pub const BANDWIDTH_HZ: AttributeDef = AttributeDef {
    name: "bandwidth_hz",
    description: "Channel bandwidth used for Shannon capacity",
    kind: AttributeKind::Float,
    default: AttributeDefault::Float(1e6),
    unit: Some("Hz"),
};

/// SNR needed for reliable decoding.
pub const SNR_THRESHOLD_DB: AttributeDef = AttributeDef {
    name: "snr_threshold_db",
    description: "SNR required for reliable decoding",
    kind: AttributeKind::Float,
    default: AttributeDefault::Float(10.0),
    unit: Some("dB"),
};

/// Packet size used for packet error probability.
pub const PACKET_SIZE_BITS: AttributeDef = AttributeDef {
    name: "packet_size_bits",
    description: "Packet size used for packet error probability",
    kind: AttributeKind::Unsigned,
    default: AttributeDefault::Integer(1024),
    unit: Some("bits"),
};

/// Highest acceptable packet error probability.
pub const ERROR_THRESHOLD: AttributeDef = AttributeDef {
    name: "error_threshold",
    description: "Highest acceptable packet error probability",
    kind: AttributeKind::Float,
    default: AttributeDefault::Float(0.1),
    unit: None,
};

/// Seed for the shadowing random source.
pub const SHADOWING_SEED: AttributeDef = AttributeDef {
    name: "shadowing_seed",
    description: "Seed for the shadowing random source",
    kind: AttributeKind::Unsigned,
    default: AttributeDefault::Integer(0),
    unit: None,
};

/// All known attributes.
pub const ALL_ATTRIBUTES: &[AttributeDef] = &[
    NOISE_FLOOR_DBM,
    BANDWIDTH_HZ,
    SNR_THRESHOLD_DB,
    PACKET_SIZE_BITS,
    ERROR_THRESHOLD,
    SHADOWING_SEED,
];

fn known_attribute(name: &str) -> Option<&'static AttributeDef> {
    ALL_ATTRIBUTES.iter().find(|def| def.name == name)
}

// ============================================================================
// Global Attributes
// ============================================================================

/// Scenario-wide attributes.
///
/// Known attributes are type-checked on write and fall back to their declared
/// default on read. Any other name is stored as a free scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalAttributes {
    values: BTreeMap<String, AttributeValue>,
}

impl GlobalAttributes {
    /// Creates an empty attribute map (all known attributes at their defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses attributes from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, AttributeValue> = serde_json::from_str(json).map_err(SimError::parse)?;
        let mut attributes = Self::new();
        attributes.extend(raw)?;
        Ok(attributes)
    }

    /// Loads attributes from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading global attributes from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Sets an attribute.
    ///
    /// Known attributes reject values of the wrong kind.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        if let Some(def) = known_attribute(&name) {
            if !def.kind.accepts(&value) {
                return Err(SimError::validation(format!(
                    "Attribute '{}' expects a {} value, got {} '{}'",
                    name,
                    def.kind,
                    value.type_name(),
                    value
                )));
            }
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// Sets every attribute from `values`; nothing is written if any is rejected.
    pub fn extend(&mut self, values: impl IntoIterator<Item = (String, AttributeValue)>) -> Result<()> {
        let mut staged = self.clone();
        for (name, value) in values {
            staged.set(name, value)?;
        }
        *self = staged;
        Ok(())
    }

    /// Returns the explicitly set value, or the default for a known attribute.
    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        self.values
            .get(name)
            .cloned()
            .or_else(|| known_attribute(name).map(AttributeDef::default_value))
    }

    /// Returns true if the attribute was explicitly set.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over explicitly set attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn float(&self, def: &AttributeDef) -> f64 {
        self.values
            .get(def.name)
            .and_then(AttributeValue::as_f64)
            .or_else(|| def.default_value().as_f64())
            .unwrap_or_default()
    }

    fn unsigned(&self, def: &AttributeDef) -> u64 {
        self.values
            .get(def.name)
            .and_then(AttributeValue::as_u64)
            .or_else(|| def.default_value().as_u64())
            .unwrap_or_default()
    }

    /// Receiver noise floor in dBm.
    pub fn noise_floor_dbm(&self) -> f64 {
        self.float(&NOISE_FLOOR_DBM)
    }

    /// Channel bandwidth in Hz.
    pub fn bandwidth_hz(&self) -> f64 {
        self.float(&BANDWIDTH_HZ)
    }

    /// SNR threshold in dB.
    pub fn snr_threshold_db(&self) -> f64 {
        self.float(&SNR_THRESHOLD_DB)
    }

    /// Packet size in bits, saturated to `u32`.
    pub fn packet_size_bits(&self) -> u32 {
        u32::try_from(self.unsigned(&PACKET_SIZE_BITS)).unwrap_or(u32::MAX)
    }

    /// Highest acceptable packet error probability.
    pub fn error_threshold(&self) -> f64 {
        self.float(&ERROR_THRESHOLD)
    }

    /// Seed for the shadowing random source.
    pub fn shadowing_seed(&self) -> u64 {
        self.unsigned(&SHADOWING_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let attrs = GlobalAttributes::new();
        assert_eq!(attrs.noise_floor_dbm(), -100.0);
        assert_eq!(attrs.bandwidth_hz(), 1e6);
        assert_eq!(attrs.snr_threshold_db(), 10.0);
        assert_eq!(attrs.packet_size_bits(), 1024);
        assert_eq!(attrs.error_threshold(), 0.1);
        assert_eq!(attrs.shadowing_seed(), 0);
        assert_eq!(attrs.get("noise_floor_dbm"), Some(AttributeValue::Float(-100.0)));
        assert!(!attrs.is_set("noise_floor_dbm"));
    }

    #[test]
    fn test_set_known_and_free() {
        let mut attrs = GlobalAttributes::new();
        attrs.set("noise_floor_dbm", -95i64).unwrap();
        assert_eq!(attrs.noise_floor_dbm(), -95.0);
        attrs.set("weather", "rain").unwrap();
        assert_eq!(attrs.get("weather").unwrap().as_str(), Some("rain"));
        assert_eq!(attrs.get("missing"), None);
    }

    #[test]
    fn test_type_checked_set() {
        let mut attrs = GlobalAttributes::new();
        let err = attrs.set("bandwidth_hz", "wide").unwrap_err();
        assert!(err.is_validation());
        assert!(attrs.set("packet_size_bits", 12.5).is_err());
        assert!(attrs.set("shadowing_seed", -1i64).is_err());
        attrs.set("packet_size_bits", 2048.0).unwrap();
        assert_eq!(attrs.packet_size_bits(), 2048);
    }

    #[test]
    fn test_from_json() {
        let attrs = GlobalAttributes::from_json_str(
            r#"{"noise_floor_dbm": -90.5, "shadowing_seed": 7, "night": true}"#,
        )
        .unwrap();
        assert_eq!(attrs.noise_floor_dbm(), -90.5);
        assert_eq!(attrs.shadowing_seed(), 7);
        assert_eq!(attrs.get("night"), Some(AttributeValue::Bool(true)));
        assert_eq!(attrs.iter().count(), 3);
    }

    #[test]
    fn test_from_json_rejects_atomically() {
        let err = GlobalAttributes::from_json_str(r#"{"bandwidth_hz": "x"}"#).unwrap_err();
        assert!(err.is_validation());

        let mut attrs = GlobalAttributes::new();
        let result = attrs.extend(vec![
            ("weather".to_string(), AttributeValue::from("fog")),
            ("bandwidth_hz".to_string(), AttributeValue::from(false)),
        ]);
        assert!(result.is_err());
        assert!(!attrs.is_set("weather"));
    }

    #[test]
    fn test_untagged_parse_order() {
        let v: AttributeValue = serde_json::from_str("5").unwrap();
        assert_eq!(v, AttributeValue::Integer(5));
        let v: AttributeValue = serde_json::from_str("5.5").unwrap();
        assert_eq!(v, AttributeValue::Float(5.5));
        let v: AttributeValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, AttributeValue::Bool(false));
    }
}
