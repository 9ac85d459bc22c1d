//! # mobsim-runner
//!
//! Scenario context, delayed-instruction scheduler and authoring front ends
//! for MobSim.
//!
//! This crate provides:
//! - [`EventScheduler`] - time-ordered queue of delayed instructions
//! - [`Scenario`] - owns all per-scenario state and answers unit/link queries
//! - [`ScenarioBuilder`] - programmatic authoring
//! - [`ScenarioDefinition`] - declarative YAML/JSON authoring
//! - [`run`] - fixed-step driver used by the `mobsim` binary

mod builder;
pub mod definition;
mod error;
pub mod run;
mod scenario;
pub mod scheduler;

pub use builder::ScenarioBuilder;
pub use definition::{LinkTarget, ScenarioDefinition};
pub use error::{Result, RunnerError};
pub use run::{run, RunOptions, RunReport, StepReport};
pub use scenario::{LinkEndpoint, LinkReport, Scenario, UnitStatus};
pub use scheduler::{
    DelayedInstruction, EventScheduler, InstructionId, InstructionKind, InstructionState,
};
