//! # SWARM Core Library
//!
//! Core functionality for ranging with SWARM ultra-wideband sensor nodes.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial transport and response framing for the SWARM text protocol
//! - Node commands (`RATO`, `GNID`, `GSET`, ...)
//! - A producer/consumer ranging pipeline: continuous frame ingestion,
//!   periodic classification, parsing and distance averaging
//! - Output sinks and configuration
//! - A simulated node for demo mode
//!
//! ## Example
//!
//! ```rust,ignore
//! use swarm_core::prelude::*;
//! use std::thread;
//!
//! let config = RangingConfig::load_or_default("ranging.json")?;
//! let (mut node, mut reader) = SwarmNode::open(&config.node, config.pipeline)?;
//!
//! // Producer: runs until the port closes
//! let buffer = node.buffer();
//! thread::spawn(move || run_producer(&mut reader, &buffer));
//!
//! // Consumer: called by the caller's scheduler
//! node.ranging(&config.target()?)?;
//! let report = node.process_buffer(&mut ConsoleSink)?;
//! println!("{}", report.result.display_line());
//! ```

pub mod config;
pub mod demo;
pub mod node;
pub mod protocol;
pub mod ranging;
pub mod sink;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigError, NodeConfig, RangingConfig};
    pub use crate::node::SwarmNode;
    pub use crate::protocol::{
        Command, FrameReader, NodeAddress, ProtocolError, ResponseFrame, Transport,
    };
    pub use crate::ranging::{
        run_producer, AggregateResult, IngestionBuffer, PipelineOptions, RangingPipeline,
        TickReport,
    };
    pub use crate::sink::{ConsoleSink, FileSink, MemorySink, RangingSink};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
