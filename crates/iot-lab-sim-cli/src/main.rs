mod report;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use iot_lab_abstract::scenario::{
    DEFAULT_DRAIN_INTERVALS, DEFAULT_EDGE_DEVICES, DEFAULT_FOG_NODES, DEFAULT_QUEUE_CAPACITIES,
};
use iot_lab_abstract::{ExperimentPlan, SimConfig};
use iot_lab_simulator::scenario_runner;
use iot_lab_simulator::{Execution, ExperimentOutcome, run_plan};

/// Task count of the single-tier delay and buffer labs.
const SINGLE_TIER_TASKS: usize = 30;

#[derive(Parser, Debug)]
#[command(author, version, about = "Edge/fog/cloud latency lab simulator")]
struct Args {
    /// Run a scenario file (TOML) and check its assertions.
    #[arg(long, conflicts_with = "experiment")]
    scenario: Option<PathBuf>,

    /// Built-in experiment to run when no scenario is given.
    #[arg(long, value_enum, default_value_t = Experiment::All)]
    experiment: Experiment,

    /// Base configuration (TOML); missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    tasks: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    drain_interval: Option<u64>,
    #[arg(long)]
    fog_nodes: Option<usize>,
    #[arg(long)]
    queue_capacity: Option<u32>,

    /// Use the tuned link profile for mobile devices.
    #[arg(long, default_value_t = false)]
    mobile_optimized: bool,

    /// Run the configurations of a sweep concurrently.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Print every per-task sample, not only the aggregates.
    #[arg(long, default_value_t = false)]
    series: bool,

    /// Write the results as JSON.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Experiment {
    Delay,
    Buffer,
    Scale,
    Fog,
    Mobile,
    Queue,
    All,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();
    info!("iot-lab starting…");

    let base = args.base_config()?;
    let execution = if args.parallel {
        Execution::Parallel
    } else {
        Execution::Sequential
    };

    if let Some(path) = &args.scenario {
        let report = scenario_runner::run_scenario_file(path, base, execution)?;
        report::print_outcome(&report.name, &report.outcome, args.series);
        if let Some(trace_path) = &args.trace_out {
            write_trace(trace_path, &report)?;
        }
        if !report.passed() {
            anyhow::bail!(
                "scenario '{}' failed {} assertion(s):\n{}",
                report.name,
                report.failures.len(),
                report.failures.join("\n")
            );
        }
        info!("Scenario '{}' passed.", report.name);
        return Ok(());
    }

    let mut outcomes: Vec<ExperimentOutcome> = Vec::new();
    for (title, plan, config) in args.plans(base) {
        let outcome = run_plan(&plan, &config, execution)
            .with_context(|| format!("Experiment '{title}' failed"))?;
        report::print_outcome(title, &outcome, args.series);
        outcomes.push(outcome);
    }

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &outcomes)?;
    }
    Ok(())
}

impl Args {
    /// Defaults, then the config file, then command line flags.
    fn base_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => SimConfig::default(),
        };
        if let Some(v) = self.tasks {
            config.tasks = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.drain_interval {
            config.buffer.drain_interval = v;
        }
        if let Some(v) = self.fog_nodes {
            config.pipeline.topology.fog_nodes = v;
        }
        if let Some(v) = self.queue_capacity {
            config.pipeline.queue.capacity = v;
        }
        if self.mobile_optimized {
            config.pipeline.mobile_optimized = true;
        }
        Ok(config)
    }

    /// The single-tier labs run 30 tasks unless a task count was given.
    fn single_tier(&self, base: SimConfig) -> SimConfig {
        let explicit = self.tasks.is_some() || self.config.is_some();
        SimConfig {
            tasks: if explicit { base.tasks } else { SINGLE_TIER_TASKS },
            ..base
        }
    }

    fn plans(&self, base: SimConfig) -> Vec<(&'static str, ExperimentPlan, SimConfig)> {
        let single_tier = self.single_tier(base);
        let buffer = match self.drain_interval {
            Some(_) => ExperimentPlan::Buffer,
            None => ExperimentPlan::BufferSweep {
                intervals: DEFAULT_DRAIN_INTERVALS.to_vec(),
            },
        };

        let all = [
            (
                Experiment::Delay,
                ("End-to-end delay optimization", ExperimentPlan::DelayComparison, single_tier),
            ),
            (Experiment::Buffer, ("Smartphone buffer", buffer, single_tier)),
            (
                Experiment::Scale,
                (
                    "Scaling the edge fleet",
                    ExperimentPlan::ScaleSweep {
                        edge_devices: DEFAULT_EDGE_DEVICES.to_vec(),
                    },
                    base,
                ),
            ),
            (
                Experiment::Fog,
                (
                    "Scaling the fog tier",
                    ExperimentPlan::FogSweep {
                        nodes: DEFAULT_FOG_NODES.to_vec(),
                    },
                    base,
                ),
            ),
            (
                Experiment::Mobile,
                ("Mobile vs stationary devices", ExperimentPlan::MobileComparison, base),
            ),
            (
                Experiment::Queue,
                (
                    "Fog queue capacity",
                    ExperimentPlan::QueueSweep {
                        capacities: DEFAULT_QUEUE_CAPACITIES.to_vec(),
                    },
                    base,
                ),
            ),
        ];

        all.into_iter()
            .filter(|(kind, _)| self.experiment == Experiment::All || self.experiment == *kind)
            .map(|(_, plan)| plan)
            .collect()
    }
}

fn load_config(path: &Path) -> Result<SimConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SimConfig = toml::from_str(&content).context("Failed to parse config file")?;
    Ok(config)
}

fn write_trace<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    info!("Trace written to {}", path.display());
    Ok(())
}
