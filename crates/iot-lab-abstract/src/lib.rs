pub mod config;
pub mod error;
pub mod scenario;
pub mod task;

pub use config::{
    BufferConfig, DelayRange, LinkProfile, PipelineConfig, QueueConfig, SimConfig, StageRanges,
    Topology,
};
pub use error::ConfigError;
pub use scenario::{ExperimentPlan, LabAssertion, LabScenario, SimConfigOverride};
pub use task::{DeviceClass, Task, TaskDelays};
