//! Serial port handling
//!
//! Port discovery and opening for SWARM nodes attached over USB serial.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::stream::{ChannelTransport, CommunicationChannel, SerialChannel, SerialTransport};
use super::{ProtocolError, DEFAULT_BAUD_RATE, POLL_TIMEOUT_MS};

/// Port name prefixes a node usually shows up under, most likely first
const NODE_PORT_PREFIXES: [&str; 5] = ["ttyACM", "ttyUSB", "cu.usbmodem", "cu.usbserial", "COM"];

/// Information about an available serial port
#[derive(Debug, Clone, Default)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyACM0" or "COM7")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// One-line description for port pickers
    pub fn description(&self) -> String {
        match (&self.manufacturer, &self.product) {
            (Some(m), Some(p)) => format!("{} {}", m, p),
            (None, Some(p)) => p.clone(),
            (Some(m), None) => m.clone(),
            (None, None) => match (self.vid, self.pid) {
                (Some(v), Some(p)) => format!("USB {:04x}:{:04x}", v, p),
                _ => "n/a".to_string(),
            },
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let mut port = PortInfo::named(info.port_name);
        if let SerialPortType::UsbPort(usb) = info.port_type {
            port.vid = Some(usb.vid);
            port.pid = Some(usb.pid);
            port.manufacturer = usb.manufacturer;
            port.product = usb.product;
        }
        port
    }
}

/// Rank by known node prefix, then by numeric suffix, then by name
fn port_rank(name: &str) -> (usize, u64, String) {
    let base = name.rsplit('/').next().unwrap_or(name);
    NODE_PORT_PREFIXES
        .iter()
        .enumerate()
        .find_map(|(rank, prefix)| {
            let suffix: u64 = base.strip_prefix(*prefix)?.parse().ok()?;
            Some((rank, suffix, base.to_string()))
        })
        .unwrap_or((NODE_PORT_PREFIXES.len(), 0, base.to_string()))
}

/// Device nodes the enumeration API can miss on Linux
#[cfg(target_os = "linux")]
fn dev_fallback_ports() -> Vec<PortInfo> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("ttyACM") || name.starts_with("ttyUSB"))
        .map(|name| PortInfo::named(format!("/dev/{}", name)))
        .collect()
}

#[cfg(not(target_os = "linux"))]
fn dev_fallback_ports() -> Vec<PortInfo> {
    Vec::new()
}

fn rank_ports(ports: impl IntoIterator<Item = PortInfo>) -> Vec<PortInfo> {
    let mut by_name: HashMap<String, PortInfo> = HashMap::new();
    for port in ports {
        by_name.entry(port.name.clone()).or_insert(port);
    }
    let mut ranked: Vec<PortInfo> = by_name.into_values().collect();
    ranked.sort_by_key(|p| port_rank(&p.name));
    ranked
}

/// Serial ports in a stable order, likely node ports first
pub fn list_ports() -> Vec<PortInfo> {
    let enumerated = serialport::available_ports().unwrap_or_else(|e| {
        warn!("serial port enumeration failed: {}", e);
        Vec::new()
    });
    // Enumerated entries come first so their USB details win over bare names
    rank_ports(
        enumerated
            .into_iter()
            .map(PortInfo::from)
            .chain(dev_fallback_ports()),
    )
}

/// Open a serial port configured 8N1 without flow control
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.filter(|&b| b != 0).unwrap_or(DEFAULT_BAUD_RATE);

    let port = serialport::new(name, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(POLL_TIMEOUT_MS))
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(name.to_string()),
            _ => ProtocolError::SerialError(e.to_string()),
        })?;

    debug!(port = name, baud, "serial port opened");
    Ok(port)
}

/// Open a port and split it into two transports over the same device: one
/// for commands, one for the frame reader
pub fn open_split(
    name: &str,
    baud_rate: Option<u32>,
) -> Result<(SerialTransport, SerialTransport), ProtocolError> {
    let port = open_port(name, baud_rate)?;
    let mut channel: Box<dyn CommunicationChannel> = Box::new(SerialChannel::new(port));
    channel.clear_input_buffer()?;
    let reader = channel.try_clone()?;
    Ok((ChannelTransport::new(channel), ChannelTransport::new(reader)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ports: Vec<PortInfo>) -> Vec<String> {
        ports.into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_list_ports_is_ranked() {
        let ports = list_ports();
        let ranks: Vec<_> = ports.iter().map(|p| port_rank(&p.name)).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_node_ports_ranked_first() {
        let ports = [
            "/dev/ttyS0",
            "/dev/ttyUSB3",
            "COM12",
            "/dev/cu.usbmodem14101",
            "/dev/ttyACM2",
            "COM7",
            "/dev/ttyACM0",
            "/dev/cu.Bluetooth-Incoming-Port",
        ]
        .into_iter()
        .map(PortInfo::named);

        assert_eq!(
            names(rank_ports(ports)),
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM2",
                "/dev/ttyUSB3",
                "/dev/cu.usbmodem14101",
                "COM7",
                "COM12",
                "/dev/cu.Bluetooth-Incoming-Port",
                "/dev/ttyS0",
            ]
        );
    }

    #[test]
    fn test_enumerated_entry_wins_over_bare_duplicate() {
        let detailed = PortInfo {
            product: Some("SWARM node".into()),
            ..PortInfo::named("/dev/ttyACM0")
        };
        let ranked = rank_ports([detailed, PortInfo::named("/dev/ttyACM0")]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].description(), "SWARM node");
    }

    #[test]
    fn test_description_fallbacks() {
        let mut p = PortInfo::named("COM7");
        assert_eq!(p.description(), "n/a");
        p.vid = Some(0x10c4);
        p.pid = Some(0xea60);
        assert_eq!(p.description(), "USB 10c4:ea60");
        p.manufacturer = Some("Silicon Labs".into());
        assert_eq!(p.description(), "Silicon Labs");
        p.product = Some("CP2102".into());
        assert_eq!(p.description(), "Silicon Labs CP2102");
    }

    #[test]
    fn test_open_missing_port() {
        assert!(open_port("/dev/does-not-exist-swarm", None).is_err());
    }
}
