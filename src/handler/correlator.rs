//! Request/reply correlation for one pipelined connection.
//!
//! Replies arrive in the order requests were sent, so the head of a FIFO
//! queue is the request the current reply belongs to. Streaming requests
//! break that rule: their reply never finishes the normal way, so the head
//! is removed as soon as the streaming header arrives and parked in a
//! carry-over slot. Body chunks that arrive after the queue head has moved on
//! still resolve to the streaming request through that slot.
//!
//! ```text
//! submit S, N     queue [S, N]   carried -
//! header for S    queue [N]      carried S
//! body chunk      queue [N]      carried -    resolves S
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use crate::message::ConfigRequest;

/// FIFO of outstanding requests plus the streaming carry-over slot.
#[derive(Debug, Default)]
pub struct RequestCorrelator {
    queue: VecDeque<Arc<ConfigRequest>>,
    carried_over: Option<Arc<ConfigRequest>>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request at send time.
    pub fn submit(&mut self, request: Arc<ConfigRequest>) {
        self.queue.push_back(request);
    }

    /// Peek the request the reply in progress belongs to.
    pub fn current(&self) -> Option<&Arc<ConfigRequest>> {
        self.queue.front()
    }

    /// Remove the head for a streaming header and park it in the carry-over slot.
    pub fn dequeue_for_streaming_header(&mut self) -> Option<Arc<ConfigRequest>> {
        let request = self.queue.pop_front()?;
        self.carried_over = Some(request.clone());
        Some(request)
    }

    /// Resolve the request a streaming body chunk is attributed to.
    ///
    /// If a carried-over request is parked and the queue head is absent or a
    /// different request, the carried-over request is returned and the slot
    /// cleared. Otherwise the queue head is returned.
    pub fn resolve_stream_chunk(&mut self) -> Option<Arc<ConfigRequest>> {
        if let Some(carried) = self.carried_over.take() {
            let head_is_carried = self
                .queue
                .front()
                .is_some_and(|head| Arc::ptr_eq(head, &carried));
            if !head_is_carried {
                return Some(carried);
            }
        }
        self.queue.front().cloned()
    }

    /// Pop the head once its reply has produced a typed response.
    pub fn complete_current(&mut self) -> Option<Arc<ConfigRequest>> {
        self.queue.pop_front()
    }

    /// Release the carry-over slot once its stream has ended.
    pub fn clear_carried_over(&mut self) {
        self.carried_over = None;
    }

    /// Carried-over streaming request, if one is parked.
    pub fn carried_over(&self) -> Option<&Arc<ConfigRequest>> {
        self.carried_over.as_ref()
    }

    /// Number of requests awaiting a reply.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Check if no request is awaiting a reply.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Discard all outstanding requests, returning them in submission order.
    pub fn drain(&mut self) -> Vec<Arc<ConfigRequest>> {
        self.carried_over = None;
        self.queue.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming() -> Arc<ConfigRequest> {
        Arc::new(ConfigRequest::bucket_streaming("default", ""))
    }

    fn config() -> Arc<ConfigRequest> {
        Arc::new(ConfigRequest::bucket_config("default", ""))
    }

    #[test]
    fn test_fifo_order() {
        let mut correlator = RequestCorrelator::new();
        let a = config();
        let b = Arc::new(ConfigRequest::flush("default", ""));
        correlator.submit(a.clone());
        correlator.submit(b.clone());

        assert!(Arc::ptr_eq(correlator.current().unwrap(), &a));
        assert!(Arc::ptr_eq(&correlator.complete_current().unwrap(), &a));
        assert!(Arc::ptr_eq(correlator.current().unwrap(), &b));
        assert_eq!(correlator.pending(), 1);
    }

    #[test]
    fn test_current_is_a_peek() {
        let mut correlator = RequestCorrelator::new();
        correlator.submit(config());
        correlator.current();
        correlator.current();
        assert_eq!(correlator.pending(), 1);
    }

    #[test]
    fn test_carry_over_resolves_to_streaming_request() {
        let mut correlator = RequestCorrelator::new();
        let s = streaming();
        let n = config();
        correlator.submit(s.clone());
        correlator.submit(n.clone());

        let dequeued = correlator.dequeue_for_streaming_header().unwrap();
        assert!(Arc::ptr_eq(&dequeued, &s));
        assert!(Arc::ptr_eq(correlator.current().unwrap(), &n));

        let resolved = correlator.resolve_stream_chunk().unwrap();
        assert!(Arc::ptr_eq(&resolved, &s));
        assert!(correlator.carried_over().is_none());
        assert!(Arc::ptr_eq(correlator.current().unwrap(), &n));
    }

    #[test]
    fn test_carry_over_with_empty_queue() {
        let mut correlator = RequestCorrelator::new();
        let s = streaming();
        correlator.submit(s.clone());

        correlator.dequeue_for_streaming_header();
        assert!(correlator.current().is_none());

        let resolved = correlator.resolve_stream_chunk().unwrap();
        assert!(Arc::ptr_eq(&resolved, &s));
        assert!(correlator.resolve_stream_chunk().is_none());
    }

    #[test]
    fn test_dequeue_on_empty_queue() {
        let mut correlator = RequestCorrelator::new();
        assert!(correlator.dequeue_for_streaming_header().is_none());
        assert!(correlator.carried_over().is_none());
    }

    #[test]
    fn test_drain() {
        let mut correlator = RequestCorrelator::new();
        correlator.submit(streaming());
        correlator.submit(config());
        correlator.dequeue_for_streaming_header();

        let drained = correlator.drain();
        assert_eq!(drained.len(), 1);
        assert!(correlator.is_empty());
        assert!(correlator.carried_over().is_none());
    }

    #[test]
    fn test_clear_carried_over() {
        let mut correlator = RequestCorrelator::new();
        let n = config();
        correlator.submit(streaming());
        correlator.submit(n.clone());
        correlator.dequeue_for_streaming_header();

        correlator.clear_carried_over();
        assert!(correlator.carried_over().is_none());
        assert!(Arc::ptr_eq(&correlator.resolve_stream_chunk().unwrap(), &n));
    }
}
