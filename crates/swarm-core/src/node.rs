//! SWARM node handle
//!
//! A [`SwarmNode`] owns the command side of one node's transport together with
//! that node's ingestion buffer and processing pipeline. Every node keeps its
//! own buffers, so several nodes can be driven from one process without
//! seeing each other's frames.

use std::io;
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::protocol::{
    open_split, read_frame, Command, FrameReader, NodeAddress, ProtocolError, ResponseFrame,
    SerialTransport, Transport,
};
use crate::ranging::{IngestionBuffer, PipelineOptions, RangingPipeline, TickReport};
use crate::sink::RangingSink;

/// Handle on one SWARM node
pub struct SwarmNode<T: Transport> {
    transport: T,
    buffer: IngestionBuffer<ResponseFrame>,
    pipeline: RangingPipeline,
    label: String,
}

impl SwarmNode<SerialTransport> {
    /// Open the node's serial port
    ///
    /// Returns the node (command side) and a frame reader over a second handle
    /// on the same port, meant for the producer thread.
    pub fn open(
        config: &NodeConfig,
        options: PipelineOptions,
    ) -> Result<(Self, FrameReader<SerialTransport>), ProtocolError> {
        let port = config
            .port
            .as_deref()
            .ok_or_else(|| ProtocolError::PortNotFound("no port configured".to_string()))?;
        let (commands, responses) = open_split(port, Some(config.baud_rate))?;
        info!(port, baud = config.baud_rate, "node port opened");

        let node = SwarmNode::new(commands, options).with_label(port);
        Ok((node, FrameReader::new(responses)))
    }
}

impl<T: Transport> SwarmNode<T> {
    /// Wrap an already open command transport
    pub fn new(transport: T, options: PipelineOptions) -> Self {
        Self {
            transport,
            buffer: IngestionBuffer::new(),
            pipeline: RangingPipeline::new(options),
            label: String::from("node"),
        }
    }

    /// Name used in log output (usually the port name)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Name used in log output
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Producer handle on this node's buffer
    pub fn buffer(&self) -> IngestionBuffer<ResponseFrame> {
        self.buffer.clone()
    }

    /// Write `command`; any answer arrives through the producer
    pub fn send_command(&mut self, command: &Command) -> Result<(), ProtocolError> {
        debug!(node = %self.label, command = %command, "sending command");
        self.transport.write_bytes(&command.to_bytes())
    }

    /// Ask the node to range to `address`, answering immediately
    pub fn ranging(&mut self, address: &NodeAddress) -> Result<(), ProtocolError> {
        self.send_command(&Command::Ranging {
            address: address.clone(),
            with_timeout: false,
        })
    }

    /// Ask the node to range to `address` using its ranging timeout
    pub fn ranging_with_timeout(&mut self, address: &NodeAddress) -> Result<(), ProtocolError> {
        self.send_command(&Command::Ranging {
            address: address.clone(),
            with_timeout: true,
        })
    }

    /// Send `command` and read the answer from this node's own transport
    ///
    /// Only meaningful while no producer is reading the same port, e.g. before
    /// the producer thread starts. Commands without an answer are refused
    /// before anything is written.
    pub fn query(&mut self, command: &Command) -> Result<ResponseFrame, ProtocolError> {
        if !command.expects_response() {
            return Err(ProtocolError::NoResponse(command.text()));
        }
        self.send_command(command)?;
        read_frame(&mut self.transport)
    }

    /// `GNID`
    pub fn node_id(&mut self) -> Result<ResponseFrame, ProtocolError> {
        self.query(&Command::GetNodeId)
    }

    /// `GSET`: counted frame, one setting per line
    pub fn settings(&mut self) -> Result<ResponseFrame, ProtocolError> {
        self.query(&Command::GetSettings)
    }

    /// `RSET`
    pub fn reset_settings(&mut self) -> Result<(), ProtocolError> {
        self.send_command(&Command::ResetSettings)
    }

    /// `SSET`
    pub fn save_settings(&mut self) -> Result<(), ProtocolError> {
        self.send_command(&Command::SaveSettings)
    }

    /// Run one processing tick over whatever the producer buffered
    pub fn process_buffer<S: RangingSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<TickReport> {
        self.pipeline.tick(&self.buffer, sink)
    }

    /// Close the command side. Frames still buffered are returned so the
    /// caller can run a final tick or discard them.
    pub fn close(self) -> Vec<ResponseFrame> {
        info!(node = %self.label, "node closed");
        self.buffer.drain()
    }
}
