//! Serial Protocol Communication
//!
//! Implements the SWARM node text protocol: command lines out, framed text
//! responses in.

pub mod commands;
mod error;
pub mod frame;
pub mod serial;
pub mod stream;

pub use commands::{Command, NodeAddress};
pub use error::ProtocolError;
pub use frame::{read_frame, FrameKind, FrameReader, ResponseFrame};
pub use serial::{list_ports, open_port, open_split, PortInfo};
pub use stream::{ChannelTransport, CommunicationChannel, SerialChannel, SerialTransport, Transport};

/// Default baud rate for SWARM nodes
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Serial read poll interval in milliseconds
pub const POLL_TIMEOUT_MS: u64 = 100;

/// Line terminator used in both directions
pub const LINE_TERMINATOR: &str = "\r\n";
