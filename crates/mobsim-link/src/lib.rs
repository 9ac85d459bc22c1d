//! # mobsim-link
//!
//! Radio link quality for MobSim scenarios.
//!
//! This crate computes how good a single radio link is, given the distance
//! between its ends and a log-distance path-loss model with log-normal
//! shadowing.
//!
//! ## Features
//!
//! - **Path Loss**: `PL(d) = K + 10·n·log10(d/d0) + X_sigma`, clamped below the reference distance
//! - **Shannon Capacity**: `B·log2(1 + SNR)`, zero when the SNR is not positive in dB
//! - **Packet Error Probability**: erfc-shaped bit error curve keyed on the SNR gap to threshold
//! - **Reproducible Shadowing**: seeded [`ShadowingSource`] owned by the scenario
//! - **Parameter Records**: [`LinkParams`] loaded from the scenario's JSON link file

mod evaluate;
mod model;
mod params;
mod shadowing;

pub use evaluate::{evaluate_link, LinkEvaluation, LinkStatus};
pub use model::{
    capacity, capacity_from_snr, error_probability, path_loss_db, snr_db,
    BIT_ERROR_SPREAD_DB, ERROR_FREE_MARGIN_DB,
};
pub use params::{LinkParams, PathLossParams};
pub use shadowing::{Shadowing, ShadowingSource};
