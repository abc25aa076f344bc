//! Key Iterator Module
//!
//! Lazy, single-pass key enumeration. A background producer pushes keys into a
//! bounded channel; the consumer pulls them with [`KeyIter::next`] until the
//! terminal [`KvsError::Closed`] condition is returned.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{KvsError, Result};

/// Number of keys buffered between producer and consumer.
pub const KEY_BUFFER: usize = 100;

// == Key Iterator ==
/// Consumer half of a key enumeration.
#[derive(Debug)]
pub struct KeyIter {
    rx: mpsc::Receiver<Result<String>>,
    cancel: CancellationToken,
}

// == Key Sink ==
/// Producer half of a key enumeration.
///
/// Dropping the sink closes the sequence.
#[derive(Debug, Clone)]
pub struct KeySink {
    tx: mpsc::Sender<Result<String>>,
    cancel: CancellationToken,
}

impl KeyIter {
    /// Creates a connected producer/consumer pair bound to `cancel`.
    pub fn channel(cancel: CancellationToken) -> (KeySink, KeyIter) {
        let (tx, rx) = mpsc::channel(KEY_BUFFER);
        (
            KeySink {
                tx,
                cancel: cancel.clone(),
            },
            KeyIter { rx, cancel },
        )
    }

    /// Spawns a producer that streams `keys` through the filter `keep`.
    pub fn spawn<I, F>(cancel: CancellationToken, keys: I, keep: F) -> KeyIter
    where
        I: IntoIterator<Item = String> + Send + 'static,
        I::IntoIter: Send,
        F: Fn(&str) -> bool + Send + 'static,
    {
        let (sink, iter) = Self::channel(cancel);
        tokio::spawn(async move {
            for key in keys {
                if keep(key.as_str()) && !sink.send(Ok(key)).await {
                    break;
                }
            }
        });
        iter
    }

    /// Returns the next key, or [`KvsError::Closed`] once the producer is done.
    ///
    /// Callers must stop pulling after `Closed` (or any other error).
    pub async fn next(&mut self) -> Result<String> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(KvsError::Cancelled),
            item = self.rx.recv() => item.unwrap_or(Err(KvsError::Closed)),
        }
    }

    /// Drains the remaining keys into a vector.
    pub async fn collect(mut self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        loop {
            match self.next().await {
                Ok(key) => keys.push(key),
                Err(KvsError::Closed) => return Ok(keys),
                Err(err) => return Err(err),
            }
        }
    }
}

impl KeySink {
    /// Hands one item to the consumer.
    ///
    /// Returns false when the consumer is gone or the enumeration was
    /// cancelled; the producer should stop.
    pub async fn send(&self, item: Result<String>) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            res = self.tx.send(item) => res.is_ok(),
        }
    }
}
