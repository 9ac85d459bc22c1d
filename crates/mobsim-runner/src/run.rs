//! Fixed-step scenario driver.

use crate::definition::LinkTarget;
use crate::error::{Result, RunnerError};
use crate::scenario::{LinkEndpoint, LinkReport, Scenario, UnitStatus};
use crate::scheduler::DelayedInstruction;
use mobsim_common::SimTime;
use mobsim_link::{LinkParams, Shadowing};
use serde::Serialize;
use tracing::{debug, info};

/// Stepping configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Last time to report.
    pub until: SimTime,
    /// Step length in seconds.
    pub step_secs: f64,
    /// Link parameters; defaults to those derived from the global attributes.
    pub link_params: Option<LinkParams>,
    /// Shadowing applied to every link evaluation.
    pub shadowing: Shadowing,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            until: SimTime::from_secs(60),
            step_secs: 1.0,
            link_params: None,
            shadowing: Shadowing::Draw,
        }
    }
}

/// Everything observed at one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Step time.
    pub time: SimTime,
    /// Instructions fired while advancing to `time`.
    pub fired: Vec<DelayedInstruction>,
    /// Status of every unit.
    pub units: Vec<UnitStatus>,
    /// Requested link evaluations.
    pub links: Vec<LinkReport>,
}

/// A whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Shadowing seed the run started from.
    pub seed: u64,
    /// Per-step observations.
    pub steps: Vec<StepReport>,
}

/// Steps `scenario` from its current time to `options.until`.
///
/// The first step reports the current time itself; the last step lands
/// exactly on `until`.
pub fn run(scenario: &mut Scenario, links: &[LinkTarget], options: &RunOptions) -> Result<RunReport> {
    if !options.step_secs.is_finite() || SimTime::from_secs_f64(options.step_secs) == SimTime::ZERO {
        return Err(RunnerError::Config(format!(
            "Step must be a positive number of seconds, got {}",
            options.step_secs
        )));
    }
    if options.until.is_unbounded() {
        return Err(RunnerError::Config("Run end must be a finite time".to_string()));
    }
    if options.until < scenario.now() {
        return Err(RunnerError::Config(format!(
            "Run end {} is before the scenario time {}",
            options.until,
            scenario.now()
        )));
    }

    let params = options
        .link_params
        .clone()
        .unwrap_or_else(|| scenario.default_link_params());
    params.validate()?;

    let seed = scenario.shadowing().seed();
    info!(until = %options.until, step = options.step_secs, links = links.len(), "Run started");

    let mut steps = Vec::new();
    let mut time = scenario.now();
    loop {
        let fired = scenario.advance_to(time)?;
        for instruction in &fired {
            info!(
                id = %instruction.id,
                kind = instruction.kind.label(),
                units = instruction.unit_keys.len(),
                "Instruction fired at {}",
                instruction.fire_time
            );
        }

        let units = scenario.unit_statuses()?;
        let mut link_reports = Vec::with_capacity(links.len());
        for link in links {
            let report = match &link.to {
                LinkEndpoint::Unit(to) => {
                    scenario.link_between(link.from.as_str(), to.as_str(), &params, options.shadowing)?
                }
                LinkEndpoint::Point(point) => {
                    scenario.link_to_point(link.from.as_str(), *point, &params, options.shadowing)?
                }
            };
            link_reports.push(report);
        }
        debug!(time = %time, units = units.len(), links = link_reports.len(), "Step complete");

        steps.push(StepReport {
            time,
            fired,
            units,
            links: link_reports,
        });

        if time >= options.until {
            break;
        }
        time = time.saturating_add_secs(options.step_secs).min(options.until);
    }

    info!(steps = steps.len(), "Run finished");
    Ok(RunReport { seed, steps })
}
