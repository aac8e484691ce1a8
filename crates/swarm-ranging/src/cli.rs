//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use swarm_core::config::RangingConfig;

/// Range against a SWARM node and print the averaged distance.
#[derive(Parser, Debug)]
#[command(name = "swarm-ranging", version, about = "Periodic ranging with a SWARM UWB node")]
pub struct Cli {
    /// Configuration file (defaults to the platform config dir)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Serial port the node is attached to; prompts when omitted
    #[arg(long, short)]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// Address of the node to range against (12 hex digits)
    #[arg(long, short)]
    pub address: Option<String>,

    /// Seconds between ranging commands
    #[arg(long, short)]
    pub interval: Option<f64>,

    /// Milliseconds between processing ticks
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Send `RATO 1` (ranging with timeout)
    #[arg(long)]
    pub with_timeout: bool,

    /// File receiving raw RATO frames
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// File receiving the latest distance line
    #[arg(long)]
    pub current_file: Option<PathBuf>,

    /// Do not print the distance line
    #[arg(long)]
    pub no_display: bool,

    /// Also write notification frames to the output file
    #[arg(long)]
    pub forward_notifications: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Query node id and settings, print them and exit
    #[arg(long)]
    pub info: bool,

    /// Use a simulated node instead of a serial port
    #[arg(long)]
    pub demo: bool,

    /// Simulated distance in centimeters for --demo
    #[arg(long, default_value_t = 250)]
    pub demo_distance: i64,

    /// Debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Apply flags on top of file configuration
    pub fn apply(&self, config: &mut RangingConfig) {
        if let Some(port) = &self.port {
            config.node.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.node.baud_rate = baud;
        }
        if let Some(address) = &self.address {
            config.target_address = address.clone();
        }
        if let Some(secs) = self.interval {
            config.ranging_interval_ms = (secs * 1000.0).round().max(0.0) as u64;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_ms = ms;
        }
        if self.with_timeout {
            config.ranging_with_timeout = true;
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(current) = &self.current_file {
            config.current_distance_path = Some(current.clone());
        }
        if self.no_display {
            config.pipeline.display_distances = false;
        }
        if self.forward_notifications {
            config.pipeline.forward_notifications = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "swarm-ranging",
            "--port",
            "/dev/ttyUSB1",
            "--interval",
            "0.25",
            "--address",
            "00006A0F0001",
            "--no-display",
        ]);
        let mut config = RangingConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.node.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.ranging_interval_ms, 250);
        assert_eq!(config.target_address, "00006A0F0001");
        assert!(!config.pipeline.display_distances);
        assert_eq!(config.tick_interval_ms, 1000);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["swarm-ranging"]);
        let mut config = RangingConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, RangingConfig::default());
    }
}
