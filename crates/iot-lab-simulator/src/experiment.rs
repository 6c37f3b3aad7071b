//! Lab experiments: each one builds a handful of configs from a base config
//! and runs the engine once per config. No state is carried between runs.

use iot_lab_abstract::{ExperimentPlan, SimConfig, StageRanges};
use serde::Serialize;
use std::thread;
use tracing::info;

use crate::buffer::simulate_buffer;
use crate::error::Result;
use crate::latency::simulate_delay;
use crate::pipeline::simulate_pipeline;
use crate::stats::reduction_percent;
use crate::trace::{BufferReport, DelayReport, PipelineReport, SweepPoint};

/// How the runs of a sweep are scheduled. Both modes yield the same results
/// in the same order since every run owns its random stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    Sequential,
    Parallel,
}

/// Run `job` over every config, keeping results in input order.
pub fn run_all<T, F>(configs: &[SimConfig], execution: Execution, job: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&SimConfig) -> Result<T> + Sync,
{
    match execution {
        Execution::Sequential => configs.iter().map(&job).collect(),
        Execution::Parallel => thread::scope(|scope| {
            let handles: Vec<_> = configs
                .iter()
                .map(|config| {
                    let job = &job;
                    scope.spawn(move || job(config))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        }),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DelayComparison {
    pub baseline: DelayReport,
    pub optimized: DelayReport,
    pub reduction_percent: f64,
}

/// Baseline stage ranges against the narrowed fog range, same seed and task count.
pub fn delay_comparison(base: &SimConfig) -> Result<DelayComparison> {
    let baseline = simulate_delay(base)?;
    let optimized = simulate_delay(&SimConfig {
        stages: StageRanges {
            fog: StageRanges::optimized().fog,
            ..base.stages
        },
        ..*base
    })?;
    let reduction_percent = reduction_percent(baseline.latency.mean, optimized.latency.mean)?;
    info!(
        baseline = baseline.latency.mean,
        optimized = optimized.latency.mean,
        reduction_percent,
        "delay comparison complete"
    );
    Ok(DelayComparison {
        baseline,
        optimized,
        reduction_percent,
    })
}

pub fn buffer_sweep(
    base: &SimConfig,
    intervals: &[u64],
    execution: Execution,
) -> Result<Vec<BufferReport>> {
    let configs: Vec<SimConfig> = intervals
        .iter()
        .map(|interval| {
            let mut config = *base;
            config.buffer.drain_interval = *interval;
            config
        })
        .collect();
    run_all(&configs, execution, simulate_buffer)
}

fn pipeline_sweep(
    labelled: Vec<(String, SimConfig)>,
    execution: Execution,
) -> Result<Vec<SweepPoint>> {
    let configs: Vec<SimConfig> = labelled.iter().map(|(_, config)| *config).collect();
    let reports = run_all(&configs, execution, simulate_pipeline)?;
    Ok(labelled
        .into_iter()
        .zip(reports)
        .map(|((label, config), report)| SweepPoint::from_report(label, config, &report))
        .collect())
}

/// Grow the edge fleet while the fog tier stays as configured.
pub fn scale_sweep(
    base: &SimConfig,
    edge_devices: &[u32],
    execution: Execution,
) -> Result<Vec<SweepPoint>> {
    let labelled = edge_devices
        .iter()
        .map(|edge| {
            let mut config = *base;
            config.pipeline.topology.edge_devices = *edge;
            (format!("Edge: {edge}"), config)
        })
        .collect();
    pipeline_sweep(labelled, execution)
}

/// Vary the number of fog nodes with task count and capacity fixed.
pub fn fog_sweep(
    base: &SimConfig,
    nodes: &[usize],
    execution: Execution,
) -> Result<Vec<SweepPoint>> {
    let labelled = nodes
        .iter()
        .map(|n| {
            let mut config = *base;
            config.pipeline.topology.fog_nodes = *n;
            (format!("Fog: {n}"), config)
        })
        .collect();
    pipeline_sweep(labelled, execution)
}

pub fn queue_sweep(
    base: &SimConfig,
    capacities: &[u32],
    execution: Execution,
) -> Result<Vec<SweepPoint>> {
    let labelled = capacities
        .iter()
        .map(|capacity| {
            let mut config = *base;
            config.pipeline.queue.capacity = *capacity;
            (format!("Queue: {capacity}"), config)
        })
        .collect();
    pipeline_sweep(labelled, execution)
}

#[derive(Debug, Clone, Serialize)]
pub struct MobileComparison {
    pub baseline: PipelineReport,
    pub optimized: PipelineReport,
    pub reduction_percent: f64,
}

/// The same pipeline with and without the mobile-tuned link profile.
pub fn mobile_comparison(base: &SimConfig) -> Result<MobileComparison> {
    let mut baseline_config = *base;
    baseline_config.pipeline.mobile_optimized = false;
    let mut optimized_config = *base;
    optimized_config.pipeline.mobile_optimized = true;

    let baseline = simulate_pipeline(&baseline_config)?;
    let optimized = simulate_pipeline(&optimized_config)?;
    let reduction_percent = reduction_percent(baseline.latency.mean, optimized.latency.mean)?;
    Ok(MobileComparison {
        baseline,
        optimized,
        reduction_percent,
    })
}

/// Result of one [`ExperimentPlan`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "experiment", rename_all = "snake_case")]
pub enum ExperimentOutcome {
    Delay(DelayReport),
    DelayComparison(DelayComparison),
    Buffer(BufferReport),
    BufferSweep { runs: Vec<BufferReport> },
    Pipeline(PipelineReport),
    Sweep { points: Vec<SweepPoint> },
    MobileComparison(MobileComparison),
}

pub fn run_plan(
    plan: &ExperimentPlan,
    config: &SimConfig,
    execution: Execution,
) -> Result<ExperimentOutcome> {
    Ok(match plan {
        ExperimentPlan::Delay => ExperimentOutcome::Delay(simulate_delay(config)?),
        ExperimentPlan::DelayComparison => {
            ExperimentOutcome::DelayComparison(delay_comparison(config)?)
        }
        ExperimentPlan::Buffer => ExperimentOutcome::Buffer(simulate_buffer(config)?),
        ExperimentPlan::BufferSweep { intervals } => ExperimentOutcome::BufferSweep {
            runs: buffer_sweep(config, intervals, execution)?,
        },
        ExperimentPlan::Pipeline => ExperimentOutcome::Pipeline(simulate_pipeline(config)?),
        ExperimentPlan::ScaleSweep { edge_devices } => ExperimentOutcome::Sweep {
            points: scale_sweep(config, edge_devices, execution)?,
        },
        ExperimentPlan::FogSweep { nodes } => ExperimentOutcome::Sweep {
            points: fog_sweep(config, nodes, execution)?,
        },
        ExperimentPlan::MobileComparison => {
            ExperimentOutcome::MobileComparison(mobile_comparison(config)?)
        }
        ExperimentPlan::QueueSweep { capacities } => ExperimentOutcome::Sweep {
            points: queue_sweep(config, capacities, execution)?,
        },
    })
}
