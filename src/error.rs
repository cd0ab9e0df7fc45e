// Error module
// Failure kinds surfaced by the compositing core

pub type AlphaResult<T> = Result<T, AlphaError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AlphaError {
    #[error("pixel ({x}, {y}) is outside a {width}x{height} buffer")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("opacity {0} is outside [0, 1]")]
    OutOfRange(f32),

    #[error("invalid state: {0} requires a loaded image")]
    InvalidState(&'static str),

    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("export worker exited before producing a result")]
    ExportAborted,
}

impl AlphaError {
    pub fn invalid_state(operation: &'static str) -> Self {
        Self::InvalidState(operation)
    }

    pub fn invalid_buffer(msg: impl Into<String>) -> Self {
        Self::InvalidBuffer(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
