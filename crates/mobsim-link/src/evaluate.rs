//! Full link evaluation from a parameter record.

use crate::{
    capacity_from_snr, error_probability, path_loss_db, LinkParams, Shadowing, ShadowingSource,
};
use mobsim_common::{Result, SimError};
use serde::Serialize;

/// Link quality status, classified by SNR margin over the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Excellent link with >10 dB margin.
    Excellent,
    /// Good link with >5 dB margin.
    Good,
    /// Marginal link with 0-5 dB margin.
    Marginal,
    /// Unreliable link with negative margin.
    Unreliable,
}

impl LinkStatus {
    /// Classify a link by its SNR margin in dB.
    pub fn from_margin(margin_db: f64) -> Self {
        if margin_db > 10.0 {
            LinkStatus::Excellent
        } else if margin_db > 5.0 {
            LinkStatus::Good
        } else if margin_db > 0.0 {
            LinkStatus::Marginal
        } else {
            LinkStatus::Unreliable
        }
    }

    /// Returns a human-readable description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            LinkStatus::Excellent => "Excellent (>10 dB margin)",
            LinkStatus::Good => "Good (>5 dB margin)",
            LinkStatus::Marginal => "Marginal (0-5 dB margin)",
            LinkStatus::Unreliable => "UNRELIABLE (negative margin)",
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Result of evaluating a link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkEvaluation {
    /// Distance between the link ends.
    pub distance: f64,
    /// Shadowing term applied (dB).
    pub shadowing_db: f64,
    /// Total path loss (dB).
    pub path_loss_db: f64,
    /// Received SNR (dB).
    pub snr_db: f64,
    /// SNR minus the configured threshold (dB).
    pub margin_db: f64,
    /// Shannon capacity (bits/s).
    pub capacity_bps: f64,
    /// Packet error probability for the configured packet size.
    pub error_probability: f64,
    /// Whether the error probability is within the configured threshold.
    pub acceptable: bool,
    /// Margin classification.
    pub status: LinkStatus,
}

/// Evaluate a link of length `distance` under `params`.
///
/// # Arguments
///
/// * `params` - Link parameter record
/// * `distance` - Distance between the link ends
/// * `shadowing` - Explicit shadowing sample or a request to draw one
/// * `noise_floor_dbm` - Noise reference
/// * `source` - Scenario shadowing generator
pub fn evaluate_link(
    params: &LinkParams,
    distance: f64,
    shadowing: Shadowing,
    noise_floor_dbm: f64,
    source: &mut ShadowingSource,
) -> Result<LinkEvaluation> {
    params.validate()?;
    if !noise_floor_dbm.is_finite() {
        return Err(SimError::domain("Noise floor must be finite"));
    }
    let path = params.path_loss();
    let shadowing_db = source.resolve(shadowing, path.shadowing_sigma_db)?;
    let path_loss_db = path_loss_db(&path, distance, shadowing_db)?;
    let snr_db = path.tx_power_dbm - path_loss_db - noise_floor_dbm;
    let capacity_bps = capacity_from_snr(snr_db, params.bandwidth_hz)?;
    let error_probability =
        error_probability(snr_db, params.snr_threshold_db, params.packet_size_bits)?;
    let margin_db = snr_db - params.snr_threshold_db;

    Ok(LinkEvaluation {
        distance,
        shadowing_db,
        path_loss_db,
        snr_db,
        margin_db,
        capacity_bps,
        error_probability,
        acceptable: error_probability <= params.error_threshold,
        status: LinkStatus::from_margin(margin_db),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_link_status_classification() {
        assert_eq!(LinkStatus::from_margin(15.0), LinkStatus::Excellent);
        assert_eq!(LinkStatus::from_margin(7.0), LinkStatus::Good);
        assert_eq!(LinkStatus::from_margin(2.0), LinkStatus::Marginal);
        assert_eq!(LinkStatus::from_margin(0.0), LinkStatus::Unreliable);
        assert_eq!(LinkStatus::from_margin(-3.0), LinkStatus::Unreliable);
    }

    #[test]
    fn test_evaluate_short_link() {
        let params = LinkParams::default();
        let mut source = ShadowingSource::new(0);
        let eval = evaluate_link(&params, 100.0, Shadowing::Draw, -100.0, &mut source).unwrap();
        assert_relative_eq!(eval.path_loss_db, 100.0);
        assert_relative_eq!(eval.snr_db, 20.0);
        assert_relative_eq!(eval.margin_db, 10.0);
        assert_eq!(eval.error_probability, 0.0);
        assert!(eval.acceptable);
        assert_eq!(eval.status, LinkStatus::Good);
        assert_relative_eq!(eval.capacity_bps, 1e6 * 101f64.log2(), max_relative = 1e-12);
    }

    #[test]
    fn test_evaluate_long_link_is_unreliable() {
        let params = LinkParams::default();
        let mut source = ShadowingSource::new(0);
        let eval = evaluate_link(&params, 5_000.0, Shadowing::NONE, -100.0, &mut source).unwrap();
        assert_eq!(eval.capacity_bps, 0.0);
        assert!(eval.error_probability > 0.99);
        assert!(!eval.acceptable);
        assert_eq!(eval.status, LinkStatus::Unreliable);
    }

    #[test]
    fn test_evaluate_rejects_negative_distance() {
        let params = LinkParams::default();
        let mut source = ShadowingSource::new(0);
        let err = evaluate_link(&params, -1.0, Shadowing::NONE, -100.0, &mut source).unwrap_err();
        assert!(err.is_domain());
    }
}
