use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Closed interval of whole milliseconds a stage delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.min <= value && value <= self.max
    }

    fn check(&self, stage: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                stage,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Delay ranges of the single-tier sensor -> fog -> courier chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRanges {
    pub sensor: DelayRange,
    pub fog: DelayRange,
    pub courier: DelayRange,
}

impl StageRanges {
    /// Same chain with the narrowed fog range of the optimized deployment.
    pub fn optimized() -> Self {
        Self {
            fog: DelayRange::new(10, 40),
            ..Self::default()
        }
    }
}

impl Default for StageRanges {
    fn default() -> Self {
        Self {
            sensor: DelayRange::new(20, 60),
            fog: DelayRange::new(30, 80),
            courier: DelayRange::new(10, 40),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Gap between two consecutive arrivals.
    pub inter_arrival: DelayRange,
    /// Period at which the consumer empties the buffer, in ms.
    pub drain_interval: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            inter_arrival: DelayRange::new(80, 120),
            drain_interval: 120,
        }
    }
}

/// Device counts per tier. Only `fog_nodes` drives the queue model; the
/// other two describe the deployment a run stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub edge_devices: u32,
    pub fog_nodes: usize,
    pub cloud_nodes: u32,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            edge_devices: 100,
            fog_nodes: 5,
            cloud_nodes: 2,
        }
    }
}

/// Edge and network jitter ranges applied to one class of device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkProfile {
    pub edge: DelayRange,
    pub jitter: DelayRange,
}

impl LinkProfile {
    pub const fn new(edge: DelayRange, jitter: DelayRange) -> Self {
        Self { edge, jitter }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Load at which a fog node stops queueing and applies the overflow penalty.
    pub capacity: u32,
    /// Queueing delay contributed by each task already on the node, in ms.
    pub unit_delay: f64,
    /// Delay charged to a task that hits a full node, in ms.
    pub overflow_penalty: f64,
    /// Chance that a node finishes one task right after admitting another.
    pub release_probability: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            unit_delay: 0.5,
            overflow_penalty: 100.0,
            release_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub topology: Topology,
    /// Probability that a task originates from a mobile device.
    pub mobile_probability: f64,
    /// Switch mobile devices to the `mobile_tuned` profile.
    pub mobile_optimized: bool,
    pub stationary: LinkProfile,
    pub mobile: LinkProfile,
    pub mobile_tuned: LinkProfile,
    pub fog_processing: DelayRange,
    pub cloud_processing: DelayRange,
    pub queue: QueueConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topology: Topology::default(),
            mobile_probability: 0.3,
            mobile_optimized: false,
            stationary: LinkProfile::new(DelayRange::new(20, 60), DelayRange::new(5, 15)),
            mobile: LinkProfile::new(DelayRange::new(25, 70), DelayRange::new(8, 20)),
            mobile_tuned: LinkProfile::new(DelayRange::new(20, 60), DelayRange::new(5, 15)),
            fog_processing: DelayRange::new(10, 30),
            cloud_processing: DelayRange::new(50, 100),
            queue: QueueConfig::default(),
        }
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tasks: usize,
    pub seed: u64,
    pub stages: StageRanges,
    pub buffer: BufferConfig,
    pub pipeline: PipelineConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tasks: 200,
            seed: 42,
            stages: StageRanges::default(),
            buffer: BufferConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl SimConfig {
    /// Check every invariant a run relies on. Models call this before their
    /// first draw, so an invalid config never yields partial results.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks == 0 {
            return Err(ConfigError::NoTasks);
        }

        self.stages.sensor.check("sensor")?;
        self.stages.fog.check("fog")?;
        self.stages.courier.check("courier")?;

        self.buffer.inter_arrival.check("inter_arrival")?;
        if self.buffer.drain_interval == 0 {
            return Err(ConfigError::ZeroDrainInterval);
        }

        let pipeline = &self.pipeline;
        if pipeline.topology.fog_nodes == 0 {
            return Err(ConfigError::NoFogNodes);
        }
        check_probability("mobile_probability", pipeline.mobile_probability)?;
        pipeline.stationary.edge.check("stationary.edge")?;
        pipeline.stationary.jitter.check("stationary.jitter")?;
        pipeline.mobile.edge.check("mobile.edge")?;
        pipeline.mobile.jitter.check("mobile.jitter")?;
        pipeline.mobile_tuned.edge.check("mobile_tuned.edge")?;
        pipeline.mobile_tuned.jitter.check("mobile_tuned.jitter")?;
        pipeline.fog_processing.check("fog_processing")?;
        pipeline.cloud_processing.check("cloud_processing")?;

        let queue = &pipeline.queue;
        if queue.capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        check_delay("unit_delay", queue.unit_delay)?;
        check_delay("overflow_penalty", queue.overflow_penalty)?;
        check_probability("release_probability", queue.release_probability)?;

        self.check_worst_case_sums()
    }

    /// Reject ranges whose largest draws would overflow a `u64` once summed.
    fn check_worst_case_sums(&self) -> Result<(), ConfigError> {
        let stages = &self.stages;
        sum_of_maxima("single-tier latency", &[stages.sensor, stages.fog, stages.courier])?;

        let last_arrival = u64::try_from(self.tasks)
            .ok()
            .and_then(|tasks| tasks.checked_mul(self.buffer.inter_arrival.max));
        if last_arrival.is_none() {
            return Err(ConfigError::DelayOverflow {
                what: "arrival timestamp",
            });
        }

        let pipeline = &self.pipeline;
        for profile in [pipeline.stationary, pipeline.mobile, pipeline.mobile_tuned] {
            sum_of_maxima(
                "pipeline latency",
                &[
                    profile.edge,
                    profile.jitter,
                    pipeline.fog_processing,
                    pipeline.cloud_processing,
                ],
            )?;
        }
        Ok(())
    }
}

fn sum_of_maxima(what: &'static str, ranges: &[DelayRange]) -> Result<u64, ConfigError> {
    ranges
        .iter()
        .try_fold(0u64, |acc, range| acc.checked_add(range.max))
        .ok_or(ConfigError::DelayOverflow { what })
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ProbabilityOutOfRange { name, value });
    }
    Ok(())
}

fn check_delay(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidDelay { name, value });
    }
    Ok(())
}
