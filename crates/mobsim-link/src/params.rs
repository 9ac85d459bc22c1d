//! Link parameter records.

use mobsim_common::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Path Loss Parameters
// ============================================================================

/// Parameters of the log-distance path-loss model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLossParams {
    /// Transmit power `P_t` in dBm.
    pub tx_power_dbm: f64,
    /// Path loss `K` at the reference distance, in dB.
    pub reference_loss_db: f64,
    /// Path-loss exponent `n`.
    pub path_loss_exponent: f64,
    /// Reference distance `d_0`.
    pub reference_distance: f64,
    /// Standard deviation of the shadowing term, in dB.
    pub shadowing_sigma_db: f64,
}

impl PathLossParams {
    /// Checks that the parameters describe a physical model.
    pub fn validate(&self) -> Result<()> {
        if !self.reference_distance.is_finite() || self.reference_distance <= 0.0 {
            return Err(SimError::domain(format!(
                "Reference distance must be positive, got {}",
                self.reference_distance
            )));
        }
        if !self.shadowing_sigma_db.is_finite() || self.shadowing_sigma_db < 0.0 {
            return Err(SimError::domain(format!(
                "Shadowing sigma must be non-negative, got {}",
                self.shadowing_sigma_db
            )));
        }
        if !self.tx_power_dbm.is_finite()
            || !self.reference_loss_db.is_finite()
            || !self.path_loss_exponent.is_finite()
        {
            return Err(SimError::domain("Path loss parameters must be finite"));
        }
        Ok(())
    }
}

// ============================================================================
// Link Parameter Record
// ============================================================================

/// Flat link configuration record.
///
/// Field names on the wire match the scenario link file:
///
/// ```json
/// { "P_t": 20, "K": 40, "n": 3, "d": 100, "d_0": 1, "sigma": 4,
///   "snr_threshold": 10, "Bandwidth": 1e6, "packet_size": 1024,
///   "error_threshold": 0.1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkParams {
    /// Transmit power in dBm.
    #[serde(rename = "P_t")]
    pub tx_power_dbm: f64,
    /// Path loss at the reference distance, in dB.
    #[serde(rename = "K")]
    pub reference_loss_db: f64,
    /// Path-loss exponent.
    #[serde(rename = "n")]
    pub path_loss_exponent: f64,
    /// Nominal link distance, used when no unit geometry is involved.
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Reference distance.
    #[serde(rename = "d_0")]
    pub reference_distance: f64,
    /// Shadowing standard deviation in dB.
    #[serde(rename = "sigma")]
    pub shadowing_sigma_db: f64,
    /// SNR needed for reliable reception, in dB.
    #[serde(rename = "snr_threshold")]
    pub snr_threshold_db: f64,
    /// Channel bandwidth in Hz.
    #[serde(rename = "Bandwidth", alias = "bandwidth")]
    pub bandwidth_hz: f64,
    /// Packet size in bits.
    #[serde(rename = "packet_size")]
    pub packet_size_bits: u32,
    /// Highest packet error probability considered acceptable.
    pub error_threshold: f64,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            tx_power_dbm: 20.0,
            reference_loss_db: 40.0,
            path_loss_exponent: 3.0,
            distance: None,
            reference_distance: 1.0,
            shadowing_sigma_db: 0.0,
            snr_threshold_db: 10.0,
            bandwidth_hz: 1e6,
            packet_size_bits: 1024,
            error_threshold: 0.1,
        }
    }
}

impl LinkParams {
    /// Parses a link record from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: LinkParams = serde_json::from_str(json).map_err(SimError::parse)?;
        params.validate()?;
        Ok(params)
    }

    /// Loads a link record from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// The path-loss part of the record.
    pub fn path_loss(&self) -> PathLossParams {
        PathLossParams {
            tx_power_dbm: self.tx_power_dbm,
            reference_loss_db: self.reference_loss_db,
            path_loss_exponent: self.path_loss_exponent,
            reference_distance: self.reference_distance,
            shadowing_sigma_db: self.shadowing_sigma_db,
        }
    }

    /// Checks every field for physical validity.
    pub fn validate(&self) -> Result<()> {
        self.path_loss().validate()?;
        if !self.bandwidth_hz.is_finite() || self.bandwidth_hz <= 0.0 {
            return Err(SimError::domain(format!(
                "Bandwidth must be positive, got {}",
                self.bandwidth_hz
            )));
        }
        if let Some(d) = self.distance {
            if !d.is_finite() || d < 0.0 {
                return Err(SimError::domain(format!(
                    "Distance must be non-negative, got {}",
                    d
                )));
            }
        }
        if !self.snr_threshold_db.is_finite() {
            return Err(SimError::domain("SNR threshold must be finite"));
        }
        if !(0.0..=1.0).contains(&self.error_threshold) {
            return Err(SimError::domain(format!(
                "Error threshold must be within [0, 1], got {}",
                self.error_threshold
            )));
        }
        Ok(())
    }
}
