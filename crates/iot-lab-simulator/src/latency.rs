//! Single-tier end-to-end latency: sensor + fog + courier.

use iot_lab_abstract::{SimConfig, StageRanges};
use tracing::{debug, info};

use crate::error::Result;
use crate::rng::RandomStream;
use crate::trace::{DelayReport, ResultSeries, StageSample};

pub struct DelayComposer {
    seed: u64,
    tasks: usize,
    stages: StageRanges,
    stream: RandomStream,
    samples: Vec<StageSample>,
}

impl DelayComposer {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            seed: config.seed,
            tasks: config.tasks,
            stages: config.stages,
            stream: RandomStream::seeded(config.seed),
            samples: Vec::with_capacity(config.tasks),
        })
    }

    /// Compose the next task. Draws sensor, fog and courier, in that order.
    pub fn step(&mut self) -> Option<StageSample> {
        if self.samples.len() >= self.tasks {
            return None;
        }

        let sample = StageSample {
            sensor: self.stream.int_in(self.stages.sensor),
            fog: self.stream.int_in(self.stages.fog),
            courier: self.stream.int_in(self.stages.courier),
        };
        debug!(
            task = self.samples.len() + 1,
            sensor = sample.sensor,
            fog = sample.fog,
            courier = sample.courier,
            "composed latency"
        );

        self.samples.push(sample);
        Some(sample)
    }

    pub fn run_until_complete(&mut self) {
        while self.step().is_some() {}
    }

    pub fn export_report(&self) -> Result<DelayReport> {
        let latencies = self.samples.iter().map(|s| s.total() as f64).collect();
        let latency = ResultSeries::new("end-to-end latency", latencies)?;
        info!(tasks = latency.len(), mean = latency.mean, "delay run complete");

        Ok(DelayReport {
            seed: self.seed,
            stages: self.stages,
            samples: self.samples.clone(),
            latency,
        })
    }
}

pub fn simulate_delay(config: &SimConfig) -> Result<DelayReport> {
    let mut composer = DelayComposer::new(*config)?;
    composer.run_until_complete();
    composer.export_report()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use iot_lab_abstract::{ConfigError, DelayRange};

    fn config(tasks: usize, stages: StageRanges) -> SimConfig {
        SimConfig {
            tasks,
            stages,
            ..Default::default()
        }
    }

    #[test]
    fn one_sample_per_task_and_sums_match() {
        let report = simulate_delay(&config(30, StageRanges::default())).unwrap();
        assert_eq!(report.samples.len(), 30);
        assert_eq!(report.latency.len(), 30);
        for (sample, latency) in report.samples.iter().zip(&report.latency.samples) {
            assert_eq!(sample.total() as f64, *latency);
        }
    }

    #[test]
    fn samples_stay_in_configured_ranges() {
        let stages = StageRanges::default();
        let report = simulate_delay(&config(10_000, stages)).unwrap();
        for s in &report.samples {
            assert!(stages.sensor.contains(s.sensor));
            assert!(stages.fog.contains(s.fog));
            assert!(stages.courier.contains(s.courier));
        }
        let lo = (stages.sensor.min + stages.fog.min + stages.courier.min) as f64;
        let hi = (stages.sensor.max + stages.fog.max + stages.courier.max) as f64;
        assert!(report.latency.mean > lo && report.latency.mean < hi);
    }

    #[test]
    fn deterministic_for_a_seed() {
        let a = simulate_delay(&config(30, StageRanges::default())).unwrap();
        let b = simulate_delay(&config(30, StageRanges::default())).unwrap();
        assert_eq!(a.samples, b.samples);

        let mut other = config(30, StageRanges::default());
        other.seed = 7;
        let c = simulate_delay(&other).unwrap();
        assert_ne!(a.samples, c.samples);
    }

    #[test]
    fn narrower_fog_range_lowers_the_mean() {
        let base = simulate_delay(&config(30, StageRanges::default())).unwrap();
        let opt = simulate_delay(&config(30, StageRanges::optimized())).unwrap();
        assert!(opt.latency.mean < base.latency.mean);
    }

    #[test]
    fn fixed_ranges_give_exact_latency() {
        let stages = StageRanges {
            sensor: DelayRange::new(20, 20),
            fog: DelayRange::new(15, 15),
            courier: DelayRange::new(5, 5),
        };
        let report = simulate_delay(&config(4, stages)).unwrap();
        assert_eq!(report.latency.samples, vec![40.0; 4]);
        assert_eq!(report.latency.mean, 40.0);
    }

    #[test]
    fn invalid_config_produces_nothing() {
        let mut stages = StageRanges::default();
        stages.courier = DelayRange::new(40, 10);
        assert!(matches!(
            DelayComposer::new(config(30, stages)),
            Err(SimError::Config(ConfigError::InvalidRange { stage: "courier", .. }))
        ));
        assert!(matches!(
            DelayComposer::new(config(0, StageRanges::default())),
            Err(SimError::Config(ConfigError::NoTasks))
        ));
    }

    #[test]
    fn stage_maxima_that_overflow_are_rejected() {
        let stages = StageRanges {
            sensor: DelayRange::new(u64::MAX, u64::MAX),
            fog: DelayRange::new(1, 1),
            ..StageRanges::default()
        };
        assert!(matches!(
            simulate_delay(&config(30, stages)),
            Err(SimError::Config(ConfigError::DelayOverflow { .. }))
        ));
    }
}
