use thiserror::Error;

/// Errors raised while parsing or synthesizing DNS messages.
///
/// All of these are recoverable: the caller drops the packet or forwards
/// it verbatim. Nothing here is fatal to the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("read past end of message at offset {0}")]
    OutOfBounds(usize),

    #[error("malformed message: {0}")]
    Malformed(&'static str),

    #[error("CNAME chain exceeds maximum depth")]
    ChainTooDeep,
}
