use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Stationary,
}

impl DeviceClass {
    pub fn is_mobile(&self) -> bool {
        matches!(self, DeviceClass::Mobile)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Mobile => f.pad("Mobile"),
            DeviceClass::Stationary => f.pad("Stationary"),
        }
    }
}

/// Per-stage delays applied to one task, in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskDelays {
    /// Sensor/device production and transmission.
    pub edge: u64,
    /// Network jitter on the edge uplink.
    pub jitter: u64,
    /// Waiting time on the fog node (or the overflow penalty).
    pub queue: f64,
    pub fog_processing: u64,
    pub cloud: u64,
}

impl TaskDelays {
    pub fn sum(&self) -> f64 {
        (self.edge + self.jitter + self.fog_processing + self.cloud) as f64 + self.queue
    }
}

/// One unit of work pushed through the edge -> fog -> cloud pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 1-based position in the run.
    pub seq: usize,
    pub class: DeviceClass,
    pub arrival_ms: u64,
    pub fog_node: usize,
    /// The fog node was full and the overflow penalty replaced queueing.
    pub overflowed: bool,
    pub delays: TaskDelays,
    /// End-to-end latency, always `delays.sum()`.
    pub latency_ms: f64,
}

impl Task {
    pub fn new(
        seq: usize,
        class: DeviceClass,
        arrival_ms: u64,
        fog_node: usize,
        overflowed: bool,
        delays: TaskDelays,
    ) -> Self {
        Self {
            seq,
            class,
            arrival_ms,
            fog_node,
            overflowed,
            latency_ms: delays.sum(),
            delays,
        }
    }
}
