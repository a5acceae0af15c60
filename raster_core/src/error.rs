use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    #[error("invalid well address: {0}")]
    InvalidAddress(String),
    #[error("no wells selected")]
    NoWellsSelected,
    #[error("degenerate timing: {0}")]
    DegenerateTiming(String),
    #[error("method file error: {0}")]
    MethodFile(String),
    #[error("motion driver error: {0}")]
    MotionDriver(String),
    #[error("acquisition error: {0}")]
    Acquisition(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motion driver")]
    MissingDriver,
    #[error("missing method file updater")]
    MissingMethodUpdater,
    #[error("missing run")]
    MissingRun,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
