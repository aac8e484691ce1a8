//! Ranging session: producer thread plus the two periodic schedules

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use swarm_core::prelude::*;
use swarm_core::protocol::NodeAddress;
use swarm_core::ranging::ProducerStats;

/// Timing and target for one session
#[derive(Debug, Clone)]
pub struct Schedule {
    pub target: NodeAddress,
    pub with_timeout: bool,
    pub ranging_every: Duration,
    pub tick_every: Duration,
}

/// Run until Ctrl-C, or until the producer stops and its frames are consumed
pub async fn run<T, R, S>(
    mut node: SwarmNode<T>,
    mut reader: FrameReader<R>,
    schedule: Schedule,
    mut sink: S,
) -> Result<()>
where
    T: Transport,
    R: Transport + 'static,
    S: RangingSink,
{
    let buffer = node.buffer();
    let producer = thread::Builder::new()
        .name(format!("producer-{}", node.label()))
        .spawn(move || run_producer(&mut reader, &buffer))
        .context("Failed to spawn producer thread")?;

    let mut ranging = interval(schedule.ranging_every);
    ranging.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticker = interval(schedule.tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        node = %node.label(),
        target = %schedule.target,
        ranging_ms = schedule.ranging_every.as_millis() as u64,
        tick_ms = schedule.tick_every.as_millis() as u64,
        "ranging started"
    );

    let mut command_failed = false;
    loop {
        tokio::select! {
            _ = ranging.tick() => {
                let sent = if schedule.with_timeout {
                    node.ranging_with_timeout(&schedule.target)
                } else {
                    node.ranging(&schedule.target)
                };
                match sent {
                    Ok(()) => command_failed = false,
                    // Log once per failure streak
                    Err(e) if !command_failed => {
                        warn!("ranging command failed: {}", e);
                        command_failed = true;
                    }
                    Err(_) => {}
                }
            }
            _ = ticker.tick() => {
                let report = node
                    .process_buffer(&mut sink)
                    .context("Failed to write ranging output")?;
                if producer.is_finished() && node.buffer().is_empty() {
                    warn!(frames = report.frames, "node stopped responding, ending session");
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    // Final tick over anything the producer delivered since the last one
    let report = node
        .process_buffer(&mut sink)
        .context("Failed to write ranging output")?;
    debug!(frames = report.frames, "final tick");
    let leftovers = node.close();
    if !leftovers.is_empty() {
        debug!(count = leftovers.len(), "discarding frames received after final tick");
    }
    sink.flush().context("Failed to flush ranging output")?;

    // A serial producer holds its own port handle and only ends with the port
    if producer.is_finished() {
        if let Ok(ProducerStats { frames, skipped }) = producer.join() {
            info!(frames, skipped, "producer finished");
        }
    }
    Ok(())
}
