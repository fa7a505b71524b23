//! Message dispatch to named transports.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{PackagingError, Result};
use crate::messages::Message;

/// A message together with the transport it was sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub transport: String,
    pub message: Message,
}

/// Hands messages to a transport for asynchronous handling.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn dispatch(&self, message: Message, transport: &str) -> Result<()>;
}

/// In-process dispatcher backed by an unbounded tokio channel.
///
/// The receiving half is usually drained by a [`crate::worker::PackagingWorker`].
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<Dispatched>,
}

impl ChannelDispatcher {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Dispatched>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl MessageDispatcher for ChannelDispatcher {
    #[tracing::instrument(skip(self), fields(package_id = %message.package_id()))]
    async fn dispatch(&self, message: Message, transport: &str) -> Result<()> {
        self.sender
            .send(Dispatched {
                transport: transport.to_string(),
                message,
            })
            .map_err(|_| PackagingError::Dispatch {
                transport: transport.to_string(),
                reason: "receiver dropped".to_string(),
            })
    }
}
