pub mod buffer;
pub mod error;
pub mod experiment;
pub mod fog;
pub mod latency;
pub mod pipeline;
pub mod rng;
pub mod scenario_runner;
pub mod stats;
pub mod trace;

pub use buffer::{BufferModel, BufferState, simulate_buffer};
pub use error::SimError;
pub use experiment::{Execution, ExperimentOutcome, run_plan};
pub use fog::{Admission, FogCluster, FogNode};
pub use latency::{DelayComposer, simulate_delay};
pub use pipeline::{Pipeline, simulate_pipeline};
pub use rng::RandomStream;
pub use trace::{BufferReport, DelayReport, PipelineReport, ResultSeries, SweepPoint};
