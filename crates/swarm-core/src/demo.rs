//! Demo Mode - Simulated SWARM node for running without hardware
//!
//! [`link`] returns two transports joined by a channel, the same shape as a
//! serial port split into a command handle and a reader handle. The simulated
//! node answers ranging commands with noisy RATO responses around a fixed
//! distance and now and then emits an RRN notification.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

use crate::protocol::{ProtocolError, Transport, LINE_TERMINATOR};

/// Behaviour of the simulated node
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Id the node reports for itself
    pub node_id: String,
    /// True distance to every ranged node
    pub distance_cm: i64,
    /// Uniform noise added to each sample, +/-
    pub noise_cm: i64,
    /// Probability that a RATO answer carries an error code
    pub error_rate: f64,
    /// Emit one RRN notification every this many ranging commands (0 = never)
    pub notification_every: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            node_id: "00006A0F1234".to_string(),
            distance_cm: 250,
            noise_cm: 15,
            error_rate: 0.1,
            notification_every: 4,
        }
    }
}

/// Generates the node's answers to command lines
pub struct DemoSimulator {
    config: DemoConfig,
    rng: StdRng,
    ranging_count: u32,
}

impl DemoSimulator {
    /// Seeded simulator; `None` seeds from entropy
    pub fn new(config: DemoConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            ranging_count: 0,
        }
    }

    fn sample_cm(&mut self) -> i64 {
        let noise = self.config.noise_cm.abs();
        (self.config.distance_cm + self.rng.gen_range(-noise..=noise)).max(0)
    }

    /// Raw response bytes for one command line (without terminator)
    pub fn respond(&mut self, command: &str) -> Vec<Vec<u8>> {
        let mut parts = command.split_whitespace();
        let frames = match parts.next() {
            Some("RATO") => {
                let target = parts.nth(1).unwrap_or("000000000000").to_string();
                self.ranging(&target)
            }
            Some("GNID") => vec![format!("={}{}", self.config.node_id, LINE_TERMINATOR)],
            Some("GSET") => {
                let lines = [
                    format!("ID {}", self.config.node_id),
                    "CHANNEL 1".to_string(),
                    "TXPWR 0".to_string(),
                ];
                let mut frame = format!("#{}{}", lines.len(), LINE_TERMINATOR);
                for line in &lines {
                    frame.push_str(line);
                    frame.push_str(LINE_TERMINATOR);
                }
                vec![frame]
            }
            Some("RSET") | Some("SSET") => Vec::new(),
            other => {
                debug!(command = ?other, "demo node ignoring unknown command");
                Vec::new()
            }
        };
        frames.into_iter().map(String::into_bytes).collect()
    }

    fn ranging(&mut self, target: &str) -> Vec<String> {
        self.ranging_count += 1;
        let mut frames = Vec::with_capacity(2);

        if self.rng.gen_bool(self.config.error_rate.clamp(0.0, 1.0)) {
            frames.push(format!("=1,0,0{}", LINE_TERMINATOR));
        } else {
            let rssi: i64 = self.rng.gen_range(-85..=-60);
            frames.push(format!("=0,{},{}{}", self.sample_cm(), rssi, LINE_TERMINATOR));
        }

        let every = self.config.notification_every;
        if every > 0 && self.ranging_count % every == 0 {
            let distance_cm = self.sample_cm();
            let cfg: u32 = self.rng.gen_range(0..16);
            let delta: u32 = self.rng.gen_range(0..4);
            frames.push(format!(
                "*RRN:{},{},0,{},{},{}{}",
                self.config.node_id, target, distance_cm, cfg, delta, LINE_TERMINATOR
            ));
        }
        frames
    }
}

enum Half {
    Commands {
        simulator: DemoSimulator,
        tx: Sender<Vec<u8>>,
        line: Vec<u8>,
    },
    Responses {
        rx: Receiver<Vec<u8>>,
        pending: VecDeque<u8>,
    },
}

/// One end of a simulated node link
pub struct DemoTransport {
    half: Half,
}

/// Create a linked (commands, responses) transport pair
pub fn link(config: DemoConfig, seed: Option<u64>) -> (DemoTransport, DemoTransport) {
    let (tx, rx) = mpsc::channel();
    let commands = DemoTransport {
        half: Half::Commands {
            simulator: DemoSimulator::new(config, seed),
            tx,
            line: Vec::new(),
        },
    };
    let responses = DemoTransport {
        half: Half::Responses {
            rx,
            pending: VecDeque::new(),
        },
    };
    (commands, responses)
}

impl Transport for DemoTransport {
    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        match &mut self.half {
            Half::Commands { .. } => Err(ProtocolError::Transport(
                "command half of a demo link cannot be read".to_string(),
            )),
            Half::Responses { rx, pending } => loop {
                if let Some(b) = pending.pop_front() {
                    return Ok(b);
                }
                // Blocks until the simulator answers; errors once the
                // command half is dropped
                let chunk = rx
                    .recv()
                    .map_err(|_| ProtocolError::Transport("demo node closed".to_string()))?;
                pending.extend(chunk);
            },
        }
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut line = Vec::new();
        loop {
            let b = self.read_byte()?;
            line.push(b);
            if b == b'\n' {
                return Ok(line);
            }
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        match &mut self.half {
            Half::Responses { .. } => Err(ProtocolError::Transport(
                "response half of a demo link cannot be written".to_string(),
            )),
            Half::Commands {
                simulator,
                tx,
                line,
            } => {
                for &b in data {
                    if b != b'\n' {
                        line.push(b);
                        continue;
                    }
                    let text = String::from_utf8_lossy(line).trim().to_string();
                    line.clear();
                    for frame in simulator.respond(&text) {
                        tx.send(frame).map_err(|_| {
                            ProtocolError::Transport("demo reader disconnected".to_string())
                        })?;
                    }
                }
                Ok(())
            }
        }
    }
}
