//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to a SWARM node
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The byte stream was closed or failed. Ends the producer loop.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A counted header without a usable line count. Recoverable.
    #[error("Invalid frame header: {0:?}")]
    InvalidFrameHeader(String),

    /// Address text that is not 12 hex digits
    #[error("Invalid node address '{0}': expected 12 hex digits")]
    InvalidAddress(String),

    /// Command the node never answers was sent as a query
    #[error("Command '{0}' has no response")]
    NoResponse(String),

    /// Opening or configuring the port failed
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// No such serial device
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the error means the byte stream is gone for good
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Transport(_) | ProtocolError::Io(_))
    }
}
