//! MobSim CLI
//!
//! Loads a scenario file, steps it forward and reports unit and link state.

use clap::{Parser, Subcommand};
use mobsim_common::SimTime;
use mobsim_link::{LinkParams, Shadowing};
use mobsim_runner::{run, RunOptions, RunReport, RunnerError, ScenarioDefinition};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mobsim")]
#[command(about = "Evaluate mobility and communication scenarios", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Step a scenario and report unit and link state
    Run {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,

        /// Link parameter file (JSON); defaults come from the scenario attributes
        #[arg(long)]
        link_params: Option<PathBuf>,

        /// Simulated seconds to run
        #[arg(long, default_value = "60")]
        until: f64,

        /// Step length in seconds
        #[arg(long, default_value = "1")]
        step: f64,

        /// Shadowing seed, overriding the scenario's `shadowing_seed`
        #[arg(short, long)]
        seed: Option<u64>,

        /// Use a fixed shadowing sample in dB instead of drawing one per link
        #[arg(long)]
        shadowing_db: Option<f64>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a scenario file and print a summary
    Check {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(report: &RunReport) {
    for step in &report.steps {
        println!("t={:.3}s", step.time.as_secs_f64());
        for unit in &step.units {
            println!(
                "  {:<16} pos={} equipment=[{}] coverage={}{}",
                unit.key,
                unit.position,
                unit.equipment,
                unit.in_coverage,
                if unit.stopped { " stopped" } else { "" }
            );
        }
        for link in &step.links {
            let to = match &link.to {
                mobsim_runner::LinkEndpoint::Unit(key) => key.to_string(),
                mobsim_runner::LinkEndpoint::Point(point) => point.to_string(),
            };
            let medium = link.medium.map_or("none", |m| m.name());
            let status = link
                .evaluation
                .as_ref()
                .map_or_else(|| "no medium".to_string(), |e| e.status.to_string());
            println!(
                "  link {} -> {} via {}: d={:.1} capacity={:.0} bps PER={:.4} {}",
                link.from, to, medium, link.distance, link.capacity_bps, link.error_probability, status
            );
        }
    }
}

fn run_command(
    scenario_path: PathBuf,
    link_params: Option<PathBuf>,
    until: f64,
    step: f64,
    seed: Option<u64>,
    shadowing_db: Option<f64>,
    json: bool,
) -> Result<(), RunnerError> {
    let definition = ScenarioDefinition::from_file(&scenario_path)?;
    let mut builder = definition.to_builder()?;
    if let Some(seed) = seed {
        let seed = i64::try_from(seed)
            .map_err(|_| RunnerError::Config(format!("Seed {} is out of range", seed)))?;
        builder.set_attribute("shadowing_seed", seed)?;
    }
    let mut scenario = builder.build();
    let links = definition.link_targets(&scenario)?;

    let link_params = match link_params {
        Some(path) => Some(LinkParams::from_json_file(path)?),
        None => None,
    };
    let until = SimTime::try_from_secs_f64(until)?;
    let options = RunOptions {
        until,
        step_secs: step,
        link_params,
        shadowing: shadowing_db.map_or(Shadowing::Draw, Shadowing::Sample),
    };

    let report = run(&mut scenario, &links, &options)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn check_command(scenario_path: PathBuf) -> Result<(), RunnerError> {
    let definition = ScenarioDefinition::from_file(&scenario_path)?;
    let scenario = definition.build()?;
    let links = definition.link_targets(&scenario)?;
    println!(
        "{}: OK",
        definition.name.as_deref().unwrap_or(&scenario_path.display().to_string())
    );
    println!("  units:        {}", scenario.mobility().len());
    println!("  unit types:   {}", scenario.mobility().unit_types().len());
    println!("  zones:        {}", scenario.coverage().len());
    println!("  instructions: {}", scenario.scheduler().pending_count());
    println!("  links:        {}", links.len());
    println!("  seed:         {}", scenario.shadowing().seed());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    mobsim_metrics::describe_metrics();

    let result = match cli.command {
        Command::Run {
            scenario,
            link_params,
            until,
            step,
            seed,
            shadowing_db,
            json,
        } => run_command(scenario, link_params, until, step, seed, shadowing_db, json),
        Command::Check { scenario } => check_command(scenario),
    };

    match result {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
