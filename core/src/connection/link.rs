//! Write side of a live peer connection

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

/// Upper bound on how long a close waits behind an in-flight write
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

type FrameSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Shared handle to a peer's outgoing frame sink.
///
/// Writes are serialized by the inner mutex, so a send that returns has been
/// flushed before the next send to the same peer starts. Cancelling the
/// token stops the connection's receive loop.
#[derive(Clone)]
pub struct PeerLink {
    sink: Arc<Mutex<FrameSink>>,
    token: CancellationToken,
}

impl PeerLink {
    pub fn new<S>(sink: S, token: CancellationToken) -> Self
    where
        S: Sink<Message, Error = WsError> + Send + 'static,
    {
        Self {
            sink: Arc::new(Mutex::new(Box::pin(sink))),
            token,
        }
    }

    /// Write one text frame and flush it
    pub async fn send_text(&self, text: String) -> Result<(), WsError> {
        self.sink.lock().await.send(Message::text(text)).await
    }

    /// Stop the receive loop and close the socket
    pub async fn close(&self) {
        self.token.cancel();
        let sink = self.sink.clone();
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, async move {
            let _ = sink.lock().await.close().await;
        })
        .await;
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// In-memory link whose frames land in the returned receiver
#[cfg(test)]
pub(crate) fn test_link() -> (PeerLink, futures::channel::mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = futures::channel::mpsc::unbounded();
    let sink = tx.sink_map_err(|_| WsError::ConnectionClosed);
    (PeerLink::new(sink, CancellationToken::new()), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_send_preserves_order() {
        let (link, mut rx) = test_link();
        link.send_text("one".to_string()).await.unwrap();
        link.send_text("two".to_string()).await.unwrap();

        assert_eq!(rx.next().await, Some(Message::text("one")));
        assert_eq!(rx.next().await, Some(Message::text("two")));
    }

    #[tokio::test]
    async fn test_close_cancels_token_and_rejects_writes() {
        let (link, _rx) = test_link();
        link.close().await;

        assert!(link.is_closed());
        assert!(link.send_text("late".to_string()).await.is_err());
    }
}
