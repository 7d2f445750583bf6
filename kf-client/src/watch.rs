//! Watch subscriptions with guaranteed release
use futures::{pin_mut, Stream, StreamExt};
use kf_core::WatchEvent;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::trace;

/// Events the producer may read ahead of the consumer
///
/// The underlying connection buffers the rest.
const EVENT_BUFFER: usize = 16;

/// A single-consumer, ordered stream of [`WatchEvent`]s for one resource kind
///
/// Created with [`Watch::spawn`], which moves the raw stream into a producer task.
/// The stream ends when the underlying connection ends, or once the watch has been
/// stopped. Stopping is idempotent and can happen through [`Watch::stop`], any
/// [`StopHandle`] cloned off the watch, or by dropping the `Watch`.
///
/// After a stop the producer task exits on its own, even if it was blocked reading
/// the connection, and no further events are handed out.
pub struct Watch<K> {
    events: mpsc::Receiver<WatchEvent<K>>,
    stop: StopHandle,
}

impl<K: Send + 'static> Watch<K> {
    /// Start forwarding `events` on a producer task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(events: S) -> Self
    where
        S: Stream<Item = WatchEvent<K>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let stop = StopHandle::new();
        let stopped = stop.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = stopped.cancelled() => trace!("watch producer released"),
                () = forward(events, tx) => trace!("watch producer reached end of stream"),
            }
        });
        Watch { events: rx, stop }
    }
}

impl<K> Watch<K> {
    /// A handle that can stop this watch from anywhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Release the subscription
    pub fn stop(&self) {
        self.stop.stop();
    }
}

async fn forward<K, S>(events: S, tx: mpsc::Sender<WatchEvent<K>>)
where
    S: Stream<Item = WatchEvent<K>>,
{
    pin_mut!(events);
    while let Some(event) = events.next().await {
        if tx.send(event).await.is_err() {
            // consumer is gone
            return;
        }
    }
}

impl<K> Stream for Watch<K> {
    type Item = WatchEvent<K>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.stop.is_stopped() {
            return Poll::Ready(None);
        }
        self.events.poll_recv(cx)
    }
}

impl<K> Drop for Watch<K> {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// Releases a [`Watch`], safe to use any number of times and from any task
#[derive(Clone, Debug)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Release the watch this handle belongs to
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether the watch has been released
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Release the watch once the returned guard goes out of scope
    pub fn stop_on_drop(self) -> StopGuard {
        StopGuard {
            _guard: self.token.drop_guard(),
        }
    }
}

/// Releases a [`Watch`] when dropped
#[must_use = "the watch is released as soon as the guard is dropped"]
pub struct StopGuard {
    _guard: DropGuard,
}
