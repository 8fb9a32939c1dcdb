// One error type for the whole crate.
// Every variant states *where* things went wrong; the worker turns them into
// plain messages on its event channel.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// No surface or no buffer to work on. Public operations report this as
    /// `Outcome::Ignored` instead of failing.
    #[error("Unbound: {0}")]
    Unbound(&'static str),

    /// Seed coordinate outside the buffer.
    #[error("Point ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds { x: i32, y: i32, width: usize, height: usize },

    /// Density of 0, negative radius and friends.
    #[error("Invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// The surface refused a read or a write.
    #[error("Surface error: {0}")]
    Surface(String),

    /// A buffer, snapshot or surface disagree on size.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch { expected: (usize, usize), actual: (usize, usize) },

    /// Bad engine config (TOML parse failure or out-of-range value).
    #[error("Config error: {0}")]
    Config(String),

    /// The background worker is gone; the command was not delivered.
    #[error("Worker stopped")]
    WorkerStopped,

    /// Creating or updating the demo window failed.
    #[error("Window error: {0}")]
    Window(String),

    /// Opening/decoding a picture failed.
    #[error("Image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(name: &'static str, value: impl ToString) -> Self {
        Error::InvalidParameter { name, value: value.to_string() }
    }
}
