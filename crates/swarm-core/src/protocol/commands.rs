//! Node commands
//!
//! SWARM nodes accept short ASCII commands terminated by `\r\n`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ProtocolError, LINE_TERMINATOR};

/// Address of a SWARM node: 12 hexadecimal digits (e.g. `00006A0F3FFC`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Number of hex digits in an address
    pub const LEN: usize = 12;

    /// Address text, uppercase
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NodeAddress {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(NodeAddress(s.to_ascii_uppercase()))
        } else {
            Err(ProtocolError::InvalidAddress(s.to_string()))
        }
    }
}

impl TryFrom<String> for NodeAddress {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeAddress> for String {
    fn from(addr: NodeAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commands understood by a SWARM node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Range to another node (`RATO`)
    Ranging {
        /// Target node
        address: NodeAddress,
        /// Ask the node to apply its ranging timeout (`RATO 1`) instead of
        /// answering immediately (`RATO 0`)
        with_timeout: bool,
    },

    /// Read current settings (`GSET`)
    GetSettings,

    /// Reset settings to factory defaults (`RSET`)
    ResetSettings,

    /// Persist current settings (`SSET`)
    SaveSettings,

    /// Query the node's own id (`GNID`)
    GetNodeId,
}

impl Command {
    /// Command text without the line terminator
    pub fn text(&self) -> String {
        match self {
            Command::Ranging {
                address,
                with_timeout,
            } => format!("RATO {} {}", u8::from(*with_timeout), address),
            Command::GetSettings => "GSET".to_string(),
            Command::ResetSettings => "RSET".to_string(),
            Command::SaveSettings => "SSET".to_string(),
            Command::GetNodeId => "GNID".to_string(),
        }
    }

    /// Bytes as sent on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.text().into_bytes();
        bytes.extend_from_slice(LINE_TERMINATOR.as_bytes());
        bytes
    }

    /// Check if the node answers this command with a frame of its own
    pub fn expects_response(&self) -> bool {
        matches!(self, Command::GetSettings | Command::GetNodeId)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
