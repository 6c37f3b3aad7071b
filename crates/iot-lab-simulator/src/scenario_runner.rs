use anyhow::{Context, Result};
use iot_lab_abstract::{LabAssertion, LabScenario, SimConfig};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::experiment::{Execution, ExperimentOutcome, run_plan};

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub description: String,
    pub config: SimConfig,
    pub outcome: ExperimentOutcome,
    /// One message per assertion that did not hold.
    pub failures: Vec<String>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn parse_scenario(content: &str) -> Result<LabScenario> {
    toml::from_str(content).context("Failed to parse scenario file")
}

pub fn load_scenario(path: &Path) -> Result<LabScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    parse_scenario(&content)
}

/// Apply the scenario's overrides to `base`, run its experiment and check
/// every assertion against the outcome.
pub fn run_scenario(
    scenario: &LabScenario,
    base: SimConfig,
    execution: Execution,
) -> Result<ScenarioReport> {
    let mut config = base;
    scenario.config.apply_to(&mut config);
    info!(name = %scenario.name, "running scenario");

    let outcome = run_plan(&scenario.experiment, &config, execution)
        .with_context(|| format!("Scenario '{}' failed to run", scenario.name))?;

    let failures: Vec<String> = scenario
        .assertions
        .iter()
        .filter_map(|assertion| check(assertion, &outcome).err())
        .collect();
    for failure in &failures {
        warn!(name = %scenario.name, "{failure}");
    }

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        description: scenario.description.clone(),
        config,
        outcome,
        failures,
    })
}

pub fn run_scenario_file(
    path: &Path,
    base: SimConfig,
    execution: Execution,
) -> Result<ScenarioReport> {
    let scenario = load_scenario(path)?;
    run_scenario(&scenario, base, execution)
}

/// Mean latency of every run in the outcome, labelled.
fn mean_latencies(outcome: &ExperimentOutcome) -> Vec<(String, f64)> {
    match outcome {
        ExperimentOutcome::Delay(report) => vec![("run".into(), report.latency.mean)],
        ExperimentOutcome::DelayComparison(c) => vec![
            ("baseline".into(), c.baseline.latency.mean),
            ("optimized".into(), c.optimized.latency.mean),
        ],
        ExperimentOutcome::Pipeline(report) => vec![("run".into(), report.latency.mean)],
        ExperimentOutcome::Sweep { points } => points
            .iter()
            .map(|p| (p.label.clone(), p.mean_latency))
            .collect(),
        ExperimentOutcome::MobileComparison(c) => vec![
            ("baseline".into(), c.baseline.latency.mean),
            ("optimized".into(), c.optimized.latency.mean),
        ],
        ExperimentOutcome::Buffer(_) | ExperimentOutcome::BufferSweep { .. } => Vec::new(),
    }
}

fn check(assertion: &LabAssertion, outcome: &ExperimentOutcome) -> Result<(), String> {
    match assertion {
        LabAssertion::MeanLatencyAtMost { ms } => {
            let means = mean_latencies(outcome);
            if means.is_empty() {
                return Err("mean_latency_at_most: experiment has no latency runs".into());
            }
            for (label, mean) in means {
                if mean > *ms {
                    return Err(format!(
                        "mean_latency_at_most: {label} mean {mean:.2} ms exceeds {ms} ms"
                    ));
                }
            }
            Ok(())
        }
        LabAssertion::ReductionAtLeast { percent } => {
            let reduction = match outcome {
                ExperimentOutcome::DelayComparison(c) => c.reduction_percent,
                ExperimentOutcome::MobileComparison(c) => c.reduction_percent,
                _ => return Err("reduction_at_least: experiment is not a comparison".into()),
            };
            if reduction < *percent {
                return Err(format!(
                    "reduction_at_least: reduction {reduction:.2}% is below {percent}%"
                ));
            }
            Ok(())
        }
        LabAssertion::BufferPeakAtMost { size } => {
            let peaks: Vec<(u64, u32)> = match outcome {
                ExperimentOutcome::Buffer(report) => vec![(report.drain_interval, report.peak)],
                ExperimentOutcome::BufferSweep { runs } => {
                    runs.iter().map(|r| (r.drain_interval, r.peak)).collect()
                }
                _ => return Err("buffer_peak_at_most: experiment has no buffer runs".into()),
            };
            for (interval, peak) in peaks {
                if peak > *size {
                    return Err(format!(
                        "buffer_peak_at_most: peak {peak} with {interval} ms drain exceeds {size}"
                    ));
                }
            }
            Ok(())
        }
        LabAssertion::OverflowCountAtMost { count } => {
            let counts: Vec<(String, usize)> = match outcome {
                ExperimentOutcome::Pipeline(report) => vec![("run".into(), report.overflow_count)],
                ExperimentOutcome::Sweep { points } => points
                    .iter()
                    .map(|p| (p.label.clone(), p.overflow_count))
                    .collect(),
                ExperimentOutcome::MobileComparison(c) => vec![
                    ("baseline".into(), c.baseline.overflow_count),
                    ("optimized".into(), c.optimized.overflow_count),
                ],
                _ => {
                    return Err("overflow_count_at_most: experiment has no pipeline runs".into());
                }
            };
            for (label, overflowed) in counts {
                if overflowed > *count {
                    return Err(format!(
                        "overflow_count_at_most: {label} had {overflowed} overflows, limit {count}"
                    ));
                }
            }
            Ok(())
        }
        LabAssertion::QueueDelayNonIncreasing { tolerance } => {
            let ExperimentOutcome::Sweep { points } = outcome else {
                return Err("queue_delay_non_increasing: experiment is not a sweep".into());
            };
            for pair in points.windows(2) {
                if pair[1].mean_queue_delay > pair[0].mean_queue_delay + tolerance {
                    return Err(format!(
                        "queue_delay_non_increasing: {} -> {} rose from {:.2} to {:.2} ms",
                        pair[0].label,
                        pair[1].label,
                        pair[0].mean_queue_delay,
                        pair[1].mean_queue_delay
                    ));
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str) -> ScenarioReport {
        let scenario = parse_scenario(content).unwrap();
        run_scenario(&scenario, SimConfig::default(), Execution::Sequential).unwrap()
    }

    #[test]
    fn bundled_scenarios_pass() {
        for content in [
            include_str!("../../../scenarios/delay_optimization.toml"),
            include_str!("../../../scenarios/smartphone_buffer.toml"),
            include_str!("../../../scenarios/edge_scaling.toml"),
            include_str!("../../../scenarios/fog_scaling.toml"),
            include_str!("../../../scenarios/mobile_devices.toml"),
            include_str!("../../../scenarios/queue_capacity.toml"),
        ] {
            let report = run(content);
            assert!(report.passed(), "{}: {:?}", report.name, report.failures);
        }
    }

    #[test]
    fn overrides_reach_the_run() {
        let report = run(r#"
            name = "small"

            [config]
            tasks = 12
            seed = 7

            [experiment]
            type = "delay"
            "#);
        assert_eq!(report.config.tasks, 12);
        let ExperimentOutcome::Delay(delay) = &report.outcome else {
            panic!("expected a delay outcome");
        };
        assert_eq!(delay.seed, 7);
        assert_eq!(delay.latency.len(), 12);
    }

    #[test]
    fn failing_assertions_are_reported() {
        let report = run(r#"
            name = "strict"

            [experiment]
            type = "pipeline"

            [[assertions]]
            type = "mean_latency_at_most"
            ms = 1.0

            [[assertions]]
            type = "reduction_at_least"
            percent = 10.0
            "#);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].starts_with("mean_latency_at_most"));
        assert!(report.failures[1].contains("not a comparison"));
    }

    #[test]
    fn invalid_config_fails_the_scenario() {
        let scenario = parse_scenario(
            r#"
            name = "broken"

            [config]
            drain_interval = 0

            [experiment]
            type = "buffer"
            "#,
        )
        .unwrap();
        let err = run_scenario(&scenario, SimConfig::default(), Execution::Sequential).unwrap_err();
        assert!(format!("{err:#}").contains("drain interval"));
    }

    #[test]
    fn unknown_experiment_is_a_parse_error() {
        assert!(parse_scenario("name = \"x\"\n[experiment]\ntype = \"teleport\"\n").is_err());
    }
}
