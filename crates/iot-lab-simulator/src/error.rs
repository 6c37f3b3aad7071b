use iot_lab_abstract::ConfigError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot aggregate an empty series")]
    EmptySeries,
    #[error("baseline mean is zero, reduction is undefined")]
    ZeroBaseline,
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
