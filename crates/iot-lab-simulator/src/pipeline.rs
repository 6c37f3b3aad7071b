//! Multi-tier edge -> fog -> cloud pipeline.
//!
//! Every task issues its draws in this order, on one code path:
//!
//! 1. inter-arrival gap
//! 2. device class (`unit() < mobile_probability` means mobile)
//! 3. edge delay from the class profile
//! 4. jitter from the class profile
//! 5. fog node index
//! 6. release coin, only when the node admits the task
//! 7. fog processing delay
//! 8. cloud processing delay

use iot_lab_abstract::{DeviceClass, LinkProfile, SimConfig, Task, TaskDelays};
use tracing::{debug, info};

use crate::buffer::ArrivalClock;
use crate::error::Result;
use crate::fog::FogCluster;
use crate::rng::RandomStream;
use crate::stats::mean;
use crate::trace::{ClassBreakdown, PipelineReport, ResultSeries};

pub struct Pipeline {
    config: SimConfig,
    stream: RandomStream,
    clock: ArrivalClock,
    fog: FogCluster,
    tasks: Vec<Task>,
}

impl Pipeline {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = &config.pipeline;
        Ok(Self {
            stream: RandomStream::seeded(config.seed),
            clock: ArrivalClock::new(config.buffer.inter_arrival),
            fog: FogCluster::new(pipeline.topology.fog_nodes, pipeline.queue)?,
            tasks: Vec::with_capacity(config.tasks),
            config,
        })
    }

    fn profile(&self, class: DeviceClass) -> LinkProfile {
        let pipeline = &self.config.pipeline;
        match class {
            DeviceClass::Stationary => pipeline.stationary,
            DeviceClass::Mobile if pipeline.mobile_optimized => pipeline.mobile_tuned,
            DeviceClass::Mobile => pipeline.mobile,
        }
    }

    /// Push the next task through the pipeline. Returns `None` once the
    /// configured number of tasks has been produced.
    pub fn step(&mut self) -> Option<&Task> {
        if self.tasks.len() >= self.config.tasks {
            return None;
        }

        let arrival_ms = self.clock.tick(&mut self.stream);
        let class = if self.stream.chance(self.config.pipeline.mobile_probability) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Stationary
        };

        let profile = self.profile(class);
        let edge = self.stream.int_in(profile.edge);
        let jitter = self.stream.int_in(profile.jitter);

        let dispatch = self.fog.dispatch(&mut self.stream);
        let fog_processing = self.stream.int_in(self.config.pipeline.fog_processing);
        let cloud = self.stream.int_in(self.config.pipeline.cloud_processing);

        let delays = TaskDelays {
            edge,
            jitter,
            queue: dispatch.admission.queue_delay(),
            fog_processing,
            cloud,
        };
        let task = Task::new(
            self.tasks.len() + 1,
            class,
            arrival_ms,
            dispatch.node,
            dispatch.admission.is_overflow(),
            delays,
        );
        debug!(
            seq = task.seq,
            class = %task.class,
            node = task.fog_node,
            queue_delay = task.delays.queue,
            overflowed = task.overflowed,
            latency = task.latency_ms,
            "task composed"
        );

        self.tasks.push(task);
        self.tasks.last()
    }

    pub fn run_until_complete(&mut self) {
        while self.step().is_some() {}
    }

    pub fn fog(&self) -> &FogCluster {
        &self.fog
    }

    pub fn export_report(&self) -> Result<PipelineReport> {
        let latencies = self.tasks.iter().map(|t| t.latency_ms).collect();
        let latency = ResultSeries::new("end-to-end latency", latencies)?;
        let queue_delays: Vec<f64> = self.tasks.iter().map(|t| t.delays.queue).collect();
        let mean_queue_delay = mean(&queue_delays)?;
        let overflow_count = self.tasks.iter().filter(|t| t.overflowed).count();

        info!(
            tasks = latency.len(),
            fog_nodes = self.config.pipeline.topology.fog_nodes,
            capacity = self.config.pipeline.queue.capacity,
            mean = latency.mean,
            mean_queue_delay,
            overflow_count,
            "pipeline run complete"
        );

        Ok(PipelineReport {
            seed: self.config.seed,
            topology: self.config.pipeline.topology,
            queue: self.config.pipeline.queue,
            mobile_optimized: self.config.pipeline.mobile_optimized,
            by_class: ClassBreakdown::from_tasks(&self.tasks),
            tasks: self.tasks.clone(),
            latency,
            mean_queue_delay,
            overflow_count,
            final_loads: self.fog.loads(),
        })
    }
}

pub fn simulate_pipeline(config: &SimConfig) -> Result<PipelineReport> {
    let mut pipeline = Pipeline::new(*config)?;
    pipeline.run_until_complete();
    pipeline.export_report()
}
