//! Live config stream publishing.
//!
//! One [`StreamPublisher`] exists per open streaming reply. Callers receive a
//! [`ConfigStream`] handle in the `BucketStreamingResponse` and call
//! [`ConfigStream::subscribe`] to get a [`Subscription`].
//!
//! Delivery is hot broadcast, not a queue:
//! - a push with no subscriber attached is dropped
//! - a subscription sees only documents pushed after it was created, except
//!   that the handler parks one receiver at header time for the first
//!   subscriber, so a document sent right behind the header is not lost
//! - a subscriber that falls more than `capacity` documents behind skips the
//!   oldest ones instead of blocking the connection
//! - after [`StreamPublisher::complete`] every subscription drains what it has
//!   and then ends
//!
//! # Example
//!
//! ```
//! use configwire_client::handler::StreamPublisher;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut publisher = StreamPublisher::new(16);
//! let stream = publisher.handle();
//!
//! publisher.push("dropped, nobody listening".to_string());
//!
//! let mut sub = stream.subscribe();
//! publisher.push("{\"rev\":1}".to_string());
//! publisher.complete();
//!
//! assert_eq!(sub.next().await.as_deref(), Some("{\"rev\":1}"));
//! assert_eq!(sub.next().await, None);
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

struct Slot {
    sender: Option<broadcast::Sender<String>>,
    /// Receiver handed to the first subscriber, if one was parked.
    parked: Option<broadcast::Receiver<String>>,
}

type SharedSlot = Arc<Mutex<Slot>>;

fn lock(shared: &SharedSlot) -> MutexGuard<'_, Slot> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Producer side of one config stream.
///
/// Owned by the connection's handler. Dropping it completes the stream.
pub struct StreamPublisher {
    shared: SharedSlot,
}

impl StreamPublisher {
    /// Create an active publisher buffering up to `capacity` documents per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            shared: Arc::new(Mutex::new(Slot {
                sender: Some(sender),
                parked: None,
            })),
        }
    }

    /// Attach a receiver now and hand it to the first [`ConfigStream::subscribe`] call.
    ///
    /// Documents pushed between this call and the first subscribe are kept
    /// for that subscriber, up to the channel capacity. Later subscribers
    /// only see documents pushed after they subscribe.
    pub fn park_first_subscriber(&self) {
        let mut slot = lock(&self.shared);
        if slot.parked.is_none() {
            slot.parked = slot.sender.as_ref().map(broadcast::Sender::subscribe);
        }
    }

    /// Get a subscribable handle for callers.
    pub fn handle(&self) -> ConfigStream {
        ConfigStream {
            shared: Some(self.shared.clone()),
        }
    }

    /// Deliver one config document to the current subscribers.
    ///
    /// Returns the number of subscribers that received it; 0 means the
    /// document was dropped (no subscriber, or the stream already completed).
    pub fn push(&self, document: String) -> usize {
        match lock(&self.shared).sender.as_ref() {
            Some(sender) => sender.send(document).unwrap_or(0),
            None => 0,
        }
    }

    /// Mark the stream finished. Idempotent.
    ///
    /// A parked first subscription still drains what it buffered.
    pub fn complete(&mut self) {
        lock(&self.shared).sender.take();
    }

    /// Check if the stream still accepts documents.
    pub fn is_active(&self) -> bool {
        lock(&self.shared).sender.is_some()
    }

    /// Number of subscriptions currently attached, a parked one included.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared)
            .sender
            .as_ref()
            .map_or(0, |sender| sender.receiver_count())
    }
}

impl Drop for StreamPublisher {
    fn drop(&mut self) {
        self.complete();
    }
}

impl fmt::Debug for StreamPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamPublisher")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Caller-facing handle to a config stream.
///
/// Cheap to clone. A handle from a failed streaming request is inactive and
/// every subscription to it ends immediately.
#[derive(Clone, Default)]
pub struct ConfigStream {
    shared: Option<SharedSlot>,
}

impl ConfigStream {
    /// A handle that never emits documents.
    pub fn inactive() -> Self {
        Self { shared: None }
    }

    /// Attach a new subscription.
    ///
    /// The first call takes over a parked receiver, if the publisher parked
    /// one, and sees everything pushed since. Otherwise the subscription only
    /// observes documents pushed from now on.
    pub fn subscribe(&self) -> Subscription {
        let receiver = self.shared.as_ref().and_then(|shared| {
            let mut slot = lock(shared);
            slot.parked
                .take()
                .or_else(|| slot.sender.as_ref().map(broadcast::Sender::subscribe))
        });
        Subscription { receiver }
    }

    /// Check if the stream is still open.
    pub fn is_active(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| lock(shared).sender.is_some())
    }
}

impl fmt::Debug for ConfigStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStream")
            .field("active", &self.is_active())
            .finish()
    }
}

/// One subscriber's view of a config stream.
pub struct Subscription {
    receiver: Option<broadcast::Receiver<String>>,
}

impl Subscription {
    /// Wait for the next config document.
    ///
    /// Returns `None` once the stream has completed and every document
    /// delivered to this subscription has been read.
    pub async fn next(&mut self) -> Option<String> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(document) => return Some(document),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Config stream subscriber lagged, skipped {} documents",
                        skipped
                    );
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Check if this subscription has observed completion.
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_none()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
