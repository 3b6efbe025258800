// ── Publisher seam ──
//
// The bus transport lives outside the core. The poll loop hands each
// fact to a `Publisher`; `ChannelPublisher` fans them out in-process.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::PublishError;
use crate::facts::Fact;

const FACT_CHANNEL_SIZE: usize = 256;

/// Receives derived facts and emits them on the message bus.
///
/// The poll loop awaits each call before handing over the next fact, so
/// a transport with a bounded queue may wait here for room instead of
/// dropping the fact.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, fact: &Fact) -> Result<(), PublishError>;
}

/// Broadcasts facts to any number of in-process subscribers.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: broadcast::Sender<Arc<Fact>>,
}

impl Default for ChannelPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FACT_CHANNEL_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Fact>> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, fact: &Fact) -> Result<(), PublishError> {
        // No subscribers is not an error: nobody is listening yet.
        let _ = self.tx.send(Arc::new(fact.clone()));
        Ok(())
    }
}
