use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("stage fault: {0}")]
    Fault(String),
    #[error("position ({0}, {1}) outside stage travel")]
    OutOfTravel(i64, i64),
    #[error("acquisition queue: {0}")]
    Queue(String),
    #[error("stop command failed: {0}")]
    StopCommand(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
