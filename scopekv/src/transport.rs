//! Message transport abstraction and reconnect-with-backoff.

use std::convert::Infallible;
use std::future::Future;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};

use crate::{
    errors::{RetryError, TransportError},
    retry::Backoff,
};

/// A typed frame exchanged over a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_type: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(message_type: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            message_type: message_type.into(),
            payload: payload.into(),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, message: Message) -> Result<(), TransportError>;

    /// Waits for the next message. Fails with [`TransportError::Closed`] once
    /// either side has closed.
    async fn receive(&self) -> Result<Message, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;

    fn closed(&self) -> bool;
}

/// Establishes a transport with `connector`, retrying every failure under
/// `backoff` until it connects, attempts run out, or `cancel` completes.
pub async fn reconnect<T, C, Fut, S>(mut connector: C, backoff: &Backoff, cancel: S) -> Result<T, TransportError>
where
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
    S: Future<Output = ()>,
{
    let connected = OnceLock::new();
    let outcome = backoff
        .retry_until(
            |attempt| {
                let fut = connector();
                let connected = &connected;
                async move {
                    match fut.await {
                        Ok(transport) => {
                            let _ = connected.set(transport);
                            Ok::<_, Infallible>(true)
                        }
                        Err(err) => {
                            warn!("connection attempt {attempt} failed: {err}");
                            Ok(false)
                        }
                    }
                }
            },
            cancel,
        )
        .await;

    match outcome {
        Ok(()) => {
            info!("transport connected");
            connected.into_inner().ok_or(TransportError::Closed)
        }
        Err(RetryError::Aborted(never)) => match never {},
        Err(RetryError::MaxRetryAttempts { attempts }) => Err(TransportError::MaxRetryAttempts { attempts }),
        Err(RetryError::Cancelled) => Err(TransportError::Cancelled),
    }
}

/// In-process transport backed by a pair of tokio channels.
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<Message>,
    inbound: Mutex<mpsc::UnboundedReceiver<Message>>,
    closed: AtomicBool,
}

impl ChannelTransport {
    /// Two connected ends; what one sends the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::from_parts(a_tx, b_rx), Self::from_parts(b_tx, a_rx))
    }

    fn from_parts(outbound: mpsc::UnboundedSender<Message>, inbound: mpsc::UnboundedReceiver<Message>) -> Self {
        Self {
            outbound,
            inbound: Mutex::new(inbound),
            closed: AtomicBool::new(false),
        }
    }
}

impl Transport for ChannelTransport {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.closed() {
            return Err(TransportError::Closed);
        }
        self.outbound.send(message).map_err(|_| TransportError::Closed)
    }

    async fn receive(&self) -> Result<Message, TransportError> {
        if self.closed() {
            return Err(TransportError::Closed);
        }
        self.inbound.lock().await.recv().await.ok_or(TransportError::Closed)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        self.inbound.lock().await.close();
        Ok(())
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.outbound.is_closed()
    }
}
