//! SWARM ranging CLI
//!
//! Opens a node, sends a ranging command on a fixed schedule, and once per
//! tick prints the averaged RATO and RRN distances while appending raw RATO
//! frames to an output file.
//!
//! Usage:
//!   cargo run -p swarm-ranging -- --port /dev/ttyACM0 --address 00006A0F3FFC
//!   cargo run -p swarm-ranging -- --demo

mod cli;
mod session;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use swarm_core::demo::{self, DemoConfig};
use swarm_core::prelude::*;
use swarm_core::protocol::{list_ports, PortInfo};

use cli::Cli;
use session::Schedule;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_ports(ports: &[PortInfo]) {
    for (i, port) in ports.iter().enumerate() {
        println!("{} - PORT: {}, DESCRIPTION: {}", i, port.name, port.description());
    }
}

/// Ask on stdin which of the available ports to use
fn choose_port() -> Result<String> {
    let ports = list_ports();
    if ports.is_empty() {
        bail!("No serial ports found");
    }
    print_ports(&ports);
    print!("Select port [0-{}]: ", ports.len() - 1);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read port selection")?;
    let index: usize = answer
        .trim()
        .parse()
        .with_context(|| format!("Invalid port selection: {:?}", answer.trim()))?;
    match ports.into_iter().nth(index) {
        Some(port) => Ok(port.name),
        None => bail!("Port index {} out of range", index),
    }
}

fn load_config(cli: &Cli) -> Result<RangingConfig> {
    let path: PathBuf = match &cli.config {
        Some(path) => path.clone(),
        None => RangingConfig::default_path()?,
    };
    let mut config = RangingConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn open_sink(config: &RangingConfig) -> Result<FileSink> {
    let mut sink = FileSink::create(&config.output_path)
        .with_context(|| format!("Failed to create {}", config.output_path.display()))?
        .with_console(config.pipeline.display_distances);
    if let Some(current) = &config.current_distance_path {
        sink = sink.with_current_file(current);
    }
    Ok(sink)
}

/// Print node id and settings, then return
fn show_info(node: &mut SwarmNode<impl Transport>) -> Result<()> {
    let id = node.node_id().context("GNID failed")?;
    println!("Node id: {}", id.payload_text().trim_end());
    let settings = node.settings().context("GSET failed")?;
    for line in settings.payload() {
        println!("  {}", line.trim_end());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_ports {
        print_ports(&list_ports());
        return Ok(());
    }

    let mut config = load_config(&cli)?;
    let schedule = Schedule {
        target: config.target()?,
        with_timeout: config.ranging_with_timeout,
        ranging_every: Duration::from_millis(config.ranging_interval_ms),
        tick_every: Duration::from_millis(config.tick_interval_ms),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;

    if cli.demo {
        if cli.info {
            bail!("--info needs a serial node");
        }
        let demo_config = DemoConfig {
            distance_cm: cli.demo_distance,
            ..DemoConfig::default()
        };
        let (commands, responses) = demo::link(demo_config, None);
        let node = SwarmNode::new(commands, config.pipeline).with_label("demo");
        let sink = open_sink(&config)?;
        info!(output = %config.output_path.display(), "running against simulated node");
        return runtime.block_on(session::run(
            node,
            FrameReader::new(responses),
            schedule,
            sink,
        ));
    }

    if config.node.port.is_none() {
        config.node.port = Some(choose_port()?);
    }
    let (mut node, reader) =
        SwarmNode::open(&config.node, config.pipeline).context("Failed to open node")?;

    if cli.info {
        return show_info(&mut node);
    }

    let sink = open_sink(&config)?;
    info!(output = %config.output_path.display(), "writing RATO frames");
    runtime.block_on(session::run(node, reader, schedule, sink))
}
