use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-2xx status.
    Status(u16),
    /// Connect/read timeout or any other transport failure.
    Transport(String),
    Decode(String),
    UnsupportedSize {
        width: u32,
        height: u32,
    },
    Registration(String),
    /// The worker thread could not be started.
    Spawn(String),
}

impl FetchError {
    /// Only network failures are worth another attempt.
    #[inline(always)]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Status(_) | Self::Transport(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP response code: {code}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(msg) => write!(f, "skin image could not be decoded: {msg}"),
            Self::UnsupportedSize { width, height } => {
                write!(f, "unsupported skin size {width}x{height}")
            }
            Self::Registration(msg) => write!(f, "texture registration failed: {msg}"),
            Self::Spawn(msg) => write!(f, "failed to start fetch worker: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}
