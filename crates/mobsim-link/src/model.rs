//! Path loss, Shannon capacity and packet error probability.

use crate::{PathLossParams, Shadowing, ShadowingSource};
use mobsim_common::{Result, SimError};
use statrs::function::erf::erfc;

/// SNR gap above threshold (dB) at which a packet is considered error free.
pub const ERROR_FREE_MARGIN_DB: f64 = 10.0;

/// Width (dB) of the bit-error transition around the SNR threshold.
pub const BIT_ERROR_SPREAD_DB: f64 = 1.0;

/// Log-distance path loss in dB.
///
/// `PL(d) = K + 10·n·log10(d/d0) + shadowing`. Distances below the reference
/// distance are treated as the reference distance.
pub fn path_loss_db(params: &PathLossParams, distance: f64, shadowing_db: f64) -> Result<f64> {
    params.validate()?;
    if distance.is_nan() || distance < 0.0 {
        return Err(SimError::domain(format!(
            "Distance must be non-negative, got {}",
            distance
        )));
    }
    if distance.is_infinite() {
        return Err(SimError::domain("Distance must be finite"));
    }
    let d = distance.max(params.reference_distance);
    Ok(params.reference_loss_db
        + 10.0 * params.path_loss_exponent * (d / params.reference_distance).log10()
        + shadowing_db)
}

/// Received SNR in dB against the given noise floor.
pub fn snr_db(
    params: &PathLossParams,
    distance: f64,
    shadowing_db: f64,
    noise_floor_dbm: f64,
) -> Result<f64> {
    if !noise_floor_dbm.is_finite() {
        return Err(SimError::domain("Noise floor must be finite"));
    }
    let loss = path_loss_db(params, distance, shadowing_db)?;
    Ok(params.tx_power_dbm - loss - noise_floor_dbm)
}

/// Shannon capacity in bits per second for an SNR given in dB.
///
/// A non-positive SNR (in dB) yields zero capacity.
pub fn capacity_from_snr(snr_db: f64, bandwidth_hz: f64) -> Result<f64> {
    if !bandwidth_hz.is_finite() || bandwidth_hz <= 0.0 {
        return Err(SimError::domain(format!(
            "Bandwidth must be positive, got {}",
            bandwidth_hz
        )));
    }
    if snr_db.is_nan() {
        return Err(SimError::domain("SNR must not be NaN"));
    }
    if snr_db <= 0.0 {
        return Ok(0.0);
    }
    let snr_linear = 10f64.powf(snr_db / 10.0);
    Ok(bandwidth_hz * snr_linear.ln_1p() / std::f64::consts::LN_2)
}

/// Shannon capacity of a link at `distance`.
///
/// The shadowing term is either the supplied sample or a fresh draw from
/// `source` with the sigma in `params`.
pub fn capacity(
    params: &PathLossParams,
    distance: f64,
    shadowing: Shadowing,
    noise_floor_dbm: f64,
    bandwidth_hz: f64,
    source: &mut ShadowingSource,
) -> Result<f64> {
    if !bandwidth_hz.is_finite() || bandwidth_hz <= 0.0 {
        return Err(SimError::domain(format!(
            "Bandwidth must be positive, got {}",
            bandwidth_hz
        )));
    }
    params.validate()?;
    let shadowing_db = source.resolve(shadowing, params.shadowing_sigma_db)?;
    let snr = snr_db(params, distance, shadowing_db, noise_floor_dbm)?;
    capacity_from_snr(snr, bandwidth_hz)
}

/// Probability that a packet of `packet_size_bits` is corrupted.
///
/// The per-bit error probability is `½·erfc(g / (√2·s))`, where `g` is the
/// SNR gap to `snr_threshold_db` and `s` is [`BIT_ERROR_SPREAD_DB`]; bits fail
/// independently. At or beyond [`ERROR_FREE_MARGIN_DB`] above threshold the
/// result is exactly zero.
pub fn error_probability(snr_db: f64, snr_threshold_db: f64, packet_size_bits: u32) -> Result<f64> {
    if snr_db.is_nan() {
        return Err(SimError::domain("SNR must not be NaN"));
    }
    if !snr_threshold_db.is_finite() {
        return Err(SimError::domain("SNR threshold must be finite"));
    }
    if packet_size_bits == 0 {
        return Ok(0.0);
    }

    let gap = snr_db - snr_threshold_db;
    if gap >= ERROR_FREE_MARGIN_DB {
        return Ok(0.0);
    }
    if gap == f64::NEG_INFINITY {
        return Ok(1.0);
    }

    let bit_error = (0.5 * erfc(gap / (std::f64::consts::SQRT_2 * BIT_ERROR_SPREAD_DB)))
        .clamp(0.0, 1.0);
    // 1 - (1 - p)^n without cancellation for tiny p
    let log_success = f64::from(packet_size_bits) * (-bit_error).ln_1p();
    Ok((-log_success.exp_m1()).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn params() -> PathLossParams {
        PathLossParams {
            tx_power_dbm: 20.0,
            reference_loss_db: 40.0,
            path_loss_exponent: 3.0,
            reference_distance: 1.0,
            shadowing_sigma_db: 0.0,
        }
    }

    #[test]
    fn test_path_loss_closed_form() {
        assert_relative_eq!(path_loss_db(&params(), 100.0, 0.0).unwrap(), 100.0);
        assert_relative_eq!(path_loss_db(&params(), 10.0, 2.5).unwrap(), 72.5);
    }

    #[test]
    fn test_path_loss_clamps_below_reference() {
        let p = PathLossParams {
            reference_distance: 10.0,
            ..params()
        };
        assert_eq!(path_loss_db(&p, 0.0, 0.0).unwrap(), 40.0);
        assert_eq!(path_loss_db(&p, 5.0, 0.0).unwrap(), 40.0);
        assert_eq!(path_loss_db(&p, 10.0, 0.0).unwrap(), 40.0);
    }

    #[test]
    fn test_negative_distance_is_domain_error() {
        assert!(path_loss_db(&params(), -1.0, 0.0).unwrap_err().is_domain());
    }

    #[test]
    fn test_capacity_closed_form() {
        // 20 dBm - 100 dB + 100 dBm noise floor = 20 dB SNR
        let mut source = ShadowingSource::new(0);
        let c = capacity(&params(), 100.0, Shadowing::Draw, -100.0, 1e6, &mut source).unwrap();
        assert_relative_eq!(c, 1e6 * 101f64.log2(), max_relative = 1e-12);
        assert_eq!(source.draws(), 0);

        let with_sample =
            capacity(&params(), 100.0, Shadowing::NONE, -100.0, 1e6, &mut source).unwrap();
        assert_eq!(c, with_sample);
    }

    #[test]
    fn test_capacity_zero_when_snr_not_positive() {
        let mut source = ShadowingSource::new(0);
        // SNR exactly 0 dB
        let c = capacity(&params(), 100.0, Shadowing::NONE, -80.0, 1e6, &mut source).unwrap();
        assert_eq!(c, 0.0);
        let c = capacity(&params(), 10_000.0, Shadowing::NONE, -100.0, 1e6, &mut source).unwrap();
        assert_eq!(c, 0.0);
    }

    #[test]
    fn test_capacity_rejects_bad_bandwidth() {
        let mut source = ShadowingSource::new(0);
        for bw in [0.0, -5.0, f64::NAN] {
            let err = capacity(&params(), 10.0, Shadowing::NONE, -100.0, bw, &mut source);
            assert!(err.unwrap_err().is_domain());
        }
    }

    #[test]
    fn test_capacity_with_shadowing_is_reproducible() {
        let p = PathLossParams {
            shadowing_sigma_db: 8.0,
            ..params()
        };
        let mut a = ShadowingSource::new(11);
        let mut b = ShadowingSource::new(11);
        for d in [5.0, 50.0, 150.0] {
            let ca = capacity(&p, d, Shadowing::Draw, -100.0, 1e6, &mut a).unwrap();
            let cb = capacity(&p, d, Shadowing::Draw, -100.0, 1e6, &mut b).unwrap();
            assert_eq!(ca, cb);
        }
        assert_eq!(a.draws(), 3);
    }

    #[test]
    fn test_error_probability_boundaries() {
        assert_eq!(error_probability(30.0, 10.0, 1024).unwrap(), 0.0);
        assert_eq!(error_probability(20.0, 10.0, 1024).unwrap(), 0.0);
        assert_relative_eq!(error_probability(-50.0, 10.0, 1024).unwrap(), 1.0);
        assert_eq!(error_probability(f64::NEG_INFINITY, 10.0, 8).unwrap(), 1.0);
        assert_eq!(error_probability(5.0, 10.0, 0).unwrap(), 0.0);
        assert!(error_probability(f64::NAN, 10.0, 8).is_err());
    }

    #[test]
    fn test_error_probability_at_threshold_single_bit() {
        // Half of all bits fail exactly at threshold.
        assert_relative_eq!(error_probability(10.0, 10.0, 1).unwrap(), 0.5, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn prop_capacity_non_decreasing_in_power(
            p1 in -30.0f64..60.0, delta in 0.0f64..30.0, d in 0.0f64..5_000.0
        ) {
            let mut source = ShadowingSource::new(0);
            let low = PathLossParams { tx_power_dbm: p1, ..params() };
            let high = PathLossParams { tx_power_dbm: p1 + delta, ..params() };
            let c_low = capacity(&low, d, Shadowing::NONE, -100.0, 1e6, &mut source).unwrap();
            let c_high = capacity(&high, d, Shadowing::NONE, -100.0, 1e6, &mut source).unwrap();
            prop_assert!(c_high >= c_low);
        }

        #[test]
        fn prop_capacity_non_increasing_in_distance(
            d1 in 1.0f64..5_000.0, delta in 0.0f64..5_000.0
        ) {
            let mut source = ShadowingSource::new(0);
            let near = capacity(&params(), d1, Shadowing::NONE, -100.0, 1e6, &mut source).unwrap();
            let far = capacity(&params(), d1 + delta, Shadowing::NONE, -100.0, 1e6, &mut source).unwrap();
            prop_assert!(far <= near);
            prop_assert!(far >= 0.0);
        }

        #[test]
        fn prop_error_probability_non_increasing_in_snr(
            snr in -40.0f64..40.0, delta in 0.0f64..20.0, bits in 1u32..4096
        ) {
            let worse = error_probability(snr, 10.0, bits).unwrap();
            let better = error_probability(snr + delta, 10.0, bits).unwrap();
            prop_assert!(better <= worse + 1e-12);
            prop_assert!((0.0..=1.0).contains(&worse));
        }

        #[test]
        fn prop_error_probability_non_decreasing_in_size(
            snr in -40.0f64..40.0, bits in 1u32..4096, extra in 0u32..4096
        ) {
            let small = error_probability(snr, 10.0, bits).unwrap();
            let large = error_probability(snr, 10.0, bits + extra).unwrap();
            prop_assert!(large + 1e-12 >= small);
        }
    }
}
