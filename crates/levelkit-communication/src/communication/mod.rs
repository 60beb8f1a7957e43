//! Command transports
//!
//! [`ChannelController`] implements [`MachineController`] by forwarding every
//! command into a tokio channel. Whatever owns the receiving end (a serial
//! writer task, a websocket bridge, a test) decides how commands reach the
//! machine.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use levelkit_core::{ControllerError, MachineCommand, MachineController, Result};

/// Controller that queues commands on an unbounded channel
#[derive(Debug)]
pub struct ChannelController {
    sender: mpsc::UnboundedSender<MachineCommand>,
    sent: AtomicUsize,
}

impl ChannelController {
    /// Create a controller and the receiver its commands arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MachineCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                sent: AtomicUsize::new(0),
            },
            receiver,
        )
    }

    /// Number of commands accepted so far
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    /// Whether the receiving side is still alive
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[async_trait]
impl MachineController for ChannelController {
    async fn send_command(&self, command: MachineCommand) -> Result<()> {
        tracing::debug!("Sending {}", command);
        self.sender
            .send(command)
            .map_err(|_| ControllerError::ChannelClosed)?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
