use crate::config::{DelayRange, SimConfig};
use serde::{Deserialize, Serialize};

/// Drain intervals of the fast and slow consumer in the buffer lab.
pub const DEFAULT_DRAIN_INTERVALS: [u64; 2] = [60, 200];
/// Edge fleet sizes of the sensitivity sweep: base, +25%, +50%, +75%, +100%.
pub const DEFAULT_EDGE_DEVICES: [u32; 5] = [100, 125, 150, 175, 200];
pub const DEFAULT_FOG_NODES: [usize; 4] = [1, 2, 5, 10];
pub const DEFAULT_QUEUE_CAPACITIES: [u32; 4] = [20, 50, 100, 200];

#[derive(Deserialize, Debug, Clone)]
pub struct LabScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: SimConfigOverride,
    pub experiment: ExperimentPlan,
    #[serde(default)]
    pub assertions: Vec<LabAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SimConfigOverride {
    pub tasks: Option<usize>,
    pub seed: Option<u64>,
    pub sensor: Option<DelayRange>,
    pub fog: Option<DelayRange>,
    pub courier: Option<DelayRange>,
    pub inter_arrival: Option<DelayRange>,
    pub drain_interval: Option<u64>,
    pub edge_devices: Option<u32>,
    pub fog_nodes: Option<usize>,
    pub cloud_nodes: Option<u32>,
    pub mobile_probability: Option<f64>,
    pub mobile_optimized: Option<bool>,
    pub fog_processing: Option<DelayRange>,
    pub cloud_processing: Option<DelayRange>,
    pub queue_capacity: Option<u32>,
    pub unit_delay: Option<f64>,
    pub overflow_penalty: Option<f64>,
    pub release_probability: Option<f64>,
}

impl SimConfigOverride {
    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.tasks {
            config.tasks = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.sensor {
            config.stages.sensor = v;
        }
        if let Some(v) = self.fog {
            config.stages.fog = v;
        }
        if let Some(v) = self.courier {
            config.stages.courier = v;
        }
        if let Some(v) = self.inter_arrival {
            config.buffer.inter_arrival = v;
        }
        if let Some(v) = self.drain_interval {
            config.buffer.drain_interval = v;
        }

        let pipeline = &mut config.pipeline;
        if let Some(v) = self.edge_devices {
            pipeline.topology.edge_devices = v;
        }
        if let Some(v) = self.fog_nodes {
            pipeline.topology.fog_nodes = v;
        }
        if let Some(v) = self.cloud_nodes {
            pipeline.topology.cloud_nodes = v;
        }
        if let Some(v) = self.mobile_probability {
            pipeline.mobile_probability = v;
        }
        if let Some(v) = self.mobile_optimized {
            pipeline.mobile_optimized = v;
        }
        if let Some(v) = self.fog_processing {
            pipeline.fog_processing = v;
        }
        if let Some(v) = self.cloud_processing {
            pipeline.cloud_processing = v;
        }
        if let Some(v) = self.queue_capacity {
            pipeline.queue.capacity = v;
        }
        if let Some(v) = self.unit_delay {
            pipeline.queue.unit_delay = v;
        }
        if let Some(v) = self.overflow_penalty {
            pipeline.queue.overflow_penalty = v;
        }
        if let Some(v) = self.release_probability {
            pipeline.queue.release_probability = v;
        }
    }
}

/// Which experiment a scenario runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExperimentPlan {
    /// One single-tier run with the configured stage ranges
    Delay,
    /// Baseline stage ranges against the narrowed fog range
    DelayComparison,
    /// One buffer run with the configured drain interval
    Buffer,
    /// Buffer runs for several drain intervals
    BufferSweep {
        #[serde(default = "default_drain_intervals")]
        intervals: Vec<u64>,
    },
    /// One multi-tier pipeline run
    Pipeline,
    /// Pipeline runs for growing edge fleets
    ScaleSweep {
        #[serde(default = "default_edge_devices")]
        edge_devices: Vec<u32>,
    },
    /// Pipeline runs for a growing number of fog nodes
    FogSweep {
        #[serde(default = "default_fog_nodes")]
        nodes: Vec<usize>,
    },
    /// Pipeline with and without the mobile-tuned profile
    MobileComparison,
    /// Pipeline runs for several fog queue capacities
    QueueSweep {
        #[serde(default = "default_queue_capacities")]
        capacities: Vec<u32>,
    },
}

fn default_drain_intervals() -> Vec<u64> {
    DEFAULT_DRAIN_INTERVALS.to_vec()
}

fn default_edge_devices() -> Vec<u32> {
    DEFAULT_EDGE_DEVICES.to_vec()
}

fn default_fog_nodes() -> Vec<usize> {
    DEFAULT_FOG_NODES.to_vec()
}

fn default_queue_capacities() -> Vec<u32> {
    DEFAULT_QUEUE_CAPACITIES.to_vec()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabAssertion {
    /// Every run's mean end-to-end latency stays at or below `ms`
    MeanLatencyAtMost { ms: f64 },
    /// The optimized run cuts mean latency by at least `percent`
    ReductionAtLeast { percent: f64 },
    /// No buffer run ever holds more than `size` messages
    BufferPeakAtMost { size: u32 },
    /// No pipeline run sends more than `count` tasks to the overflow path
    OverflowCountAtMost { count: usize },
    /// Along a sweep, mean queue delay never rises by more than `tolerance` ms
    QueueDelayNonIncreasing {
        #[serde(default)]
        tolerance: f64,
    },
}
