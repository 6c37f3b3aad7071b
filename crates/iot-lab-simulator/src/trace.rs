use iot_lab_abstract::{DeviceClass, QueueConfig, SimConfig, StageRanges, Task, Topology};
use serde::Serialize;

use crate::error::Result;
use crate::stats::{Summary, mean};

/// Ordered per-task observations with their mean.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSeries {
    pub label: String,
    pub samples: Vec<f64>,
    pub mean: f64,
}

impl ResultSeries {
    pub fn new(label: impl Into<String>, samples: Vec<f64>) -> Result<Self> {
        let mean = mean(&samples)?;
        Ok(Self {
            label: label.into(),
            samples,
            mean,
        })
    }

    /// `(task number, value)` pairs, numbered from 1.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.samples.iter().enumerate().map(|(i, v)| (i + 1, *v))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The three draws that make up one single-tier latency sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageSample {
    pub sensor: u64,
    pub fog: u64,
    pub courier: u64,
}

impl StageSample {
    pub fn total(&self) -> u64 {
        self.sensor + self.fog + self.courier
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DelayReport {
    pub seed: u64,
    pub stages: StageRanges,
    pub samples: Vec<StageSample>,
    pub latency: ResultSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct BufferReport {
    pub seed: u64,
    pub drain_interval: u64,
    pub arrivals: Vec<u64>,
    pub occupancy: ResultSeries,
    pub peak: u32,
    /// Drain checkpoints passed over the whole run.
    pub drains: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassBreakdown {
    pub mobile: Option<Summary>,
    pub stationary: Option<Summary>,
}

impl ClassBreakdown {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let latencies = |class: DeviceClass| -> Vec<f64> {
            tasks
                .iter()
                .filter(|t| t.class == class)
                .map(|t| t.latency_ms)
                .collect()
        };
        Self {
            mobile: Summary::of(&latencies(DeviceClass::Mobile)).ok(),
            stationary: Summary::of(&latencies(DeviceClass::Stationary)).ok(),
        }
    }

    pub fn get(&self, class: DeviceClass) -> Option<&Summary> {
        match class {
            DeviceClass::Mobile => self.mobile.as_ref(),
            DeviceClass::Stationary => self.stationary.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub seed: u64,
    pub topology: Topology,
    pub queue: QueueConfig,
    pub mobile_optimized: bool,
    pub tasks: Vec<Task>,
    pub latency: ResultSeries,
    pub by_class: ClassBreakdown,
    pub mean_queue_delay: f64,
    pub overflow_count: usize,
    /// Load left on each fog node when the run ended.
    pub final_loads: Vec<u32>,
}

impl PipelineReport {
    /// Device class of each task, in task order.
    pub fn classes(&self) -> impl Iterator<Item = DeviceClass> + '_ {
        self.tasks.iter().map(|t| t.class)
    }
}

/// Mean latency of one configuration in a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub label: String,
    pub config: SimConfig,
    pub mean_latency: f64,
    pub mean_queue_delay: f64,
    pub overflow_count: usize,
}

impl SweepPoint {
    pub fn from_report(
        label: impl Into<String>,
        config: SimConfig,
        report: &PipelineReport,
    ) -> Self {
        Self {
            label: label.into(),
            config,
            mean_latency: report.latency.mean,
            mean_queue_delay: report.mean_queue_delay,
            overflow_count: report.overflow_count,
        }
    }
}
