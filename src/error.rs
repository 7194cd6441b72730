use thiserror::*;

#[derive(Error, Debug)]
pub enum Error {
    #[error("index {index} out of bounds for list {list:?}")]
    Index { list: String, index: i32 },
    #[error("list {0:?} does not exist or is empty")]
    EmptyOrUnknown(String),
    #[error("remote call failed: {0}")]
    Remote(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// True when the store rejected the call itself, as opposed to the call
    /// never reaching it. Over the wire every rejection arrives as `Remote`.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Error::Transport(_))
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("no service bound under {0:?}")]
    NotBound(String),
    #[error("connection closed by peer")]
    Closed,
    #[error("frame exceeds {0} bytes")]
    FrameTooLarge(usize),
    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
