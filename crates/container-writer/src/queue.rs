//! Transfer queue between container assembly and the writer
//!
//! A bounded multi-producer hand-off with a monotonic done flag. The flag is
//! kept under the same lock as the items, so "done and empty" is observed
//! atomically and the consumer can never exit while an item is still
//! poppable.

use crate::container::Container;
use crate::error::QueueError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Consumer side of a container queue.
///
/// These are the only primitives the writer needs from its input.
pub trait ContainerSource {
    /// Pop the next container without waiting.
    fn try_pop(&self) -> Option<Container>;

    /// Whether no container is currently queued.
    fn is_empty(&self) -> bool;

    /// Whether producers have signaled that nothing more will arrive.
    fn is_done(&self) -> bool;

    /// Wait for the next container.
    ///
    /// Returns `None` once the source is done and drained. The default
    /// implementation polls, checking termination before each pop attempt
    /// and only stopping after a pass that was eligible and popped nothing.
    fn pop_blocking(&self) -> Option<Container> {
        loop {
            let eligible = self.is_done() && self.is_empty();
            if let Some(container) = self.try_pop() {
                return Some(container);
            }
            if eligible {
                return None;
            }
            std::thread::yield_now();
        }
    }
}

#[derive(Debug)]
struct QueueState {
    items: VecDeque<Container>,
    done: bool,
}

/// Bounded, thread-safe container queue with a done signal.
#[derive(Debug)]
pub struct TransferQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl TransferQueue {
    /// Create a queue holding at most `capacity` containers.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                done: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue a container, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] with the container if the queue is
    /// done, including when it becomes done while this call waits.
    pub fn push(&self, container: Container) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        loop {
            if state.done {
                return Err(QueueError::Closed(container));
            }
            if state.items.len() < self.capacity {
                break;
            }
            self.not_full.wait(&mut state);
        }

        state.items.push_back(container);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Enqueue a container without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the queue is done and
    /// [`QueueError::Full`] if it is at capacity.
    pub fn try_push(&self, container: Container) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.done {
            return Err(QueueError::Closed(container));
        }
        if state.items.len() >= self.capacity {
            return Err(QueueError::Full(container));
        }

        state.items.push_back(container);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Signal that no further containers will be enqueued.
    ///
    /// Idempotent. Wakes the consumer and any producer blocked on a full
    /// queue.
    pub fn set_done(&self) {
        let mut state = self.state.lock();
        state.done = true;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Number of queued containers.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether no container is currently queued.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Maximum number of queued containers.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ContainerSource for TransferQueue {
    fn try_pop(&self) -> Option<Container> {
        let mut state = self.state.lock();
        let container = state.items.pop_front();
        drop(state);
        if container.is_some() {
            self.not_full.notify_one();
        }
        container
    }

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn is_done(&self) -> bool {
        self.state.lock().done
    }

    fn pop_blocking(&self) -> Option<Container> {
        let mut state = self.state.lock();
        loop {
            if let Some(container) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(container);
            }
            if state.done {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }
}

impl<S: ContainerSource + ?Sized> ContainerSource for std::sync::Arc<S> {
    fn try_pop(&self) -> Option<Container> {
        (**self).try_pop()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn is_done(&self) -> bool {
        (**self).is_done()
    }

    fn pop_blocking(&self) -> Option<Container> {
        (**self).pop_blocking()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn container(id: &'static str) -> Container {
        Container::new(id, &b"x"[..], 16).expect("container")
    }

    #[test]
    fn test_fifo_single_producer() {
        let queue = TransferQueue::new(4);
        queue.push(container("A")).expect("push");
        queue.push(container("B")).expect("push");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_pop().expect("pop").id().as_bytes(), b"A");
        assert_eq!(queue.try_pop().expect("pop").id().as_bytes(), b"B");
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_push_after_done_returns_container() {
        let queue = TransferQueue::new(4);
        queue.set_done();

        let err = queue.push(container("A")).expect_err("closed");
        assert!(matches!(err, QueueError::Closed(_)));
        assert_eq!(err.into_container().id().as_bytes(), b"A");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_push_full() {
        let queue = TransferQueue::new(1);
        queue.try_push(container("A")).expect("push");
        let err = queue.try_push(container("B")).expect_err("full");
        assert!(matches!(err, QueueError::Full(_)));
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let queue = TransferQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.try_push(container("A")).expect("push");
        let err = queue.try_push(container("B")).expect_err("full");
        assert!(matches!(err, QueueError::Full(_)));
    }

    #[test]
    fn test_done_is_monotonic() {
        let queue = TransferQueue::new(1);
        assert!(!queue.is_done());
        queue.set_done();
        queue.set_done();
        assert!(queue.is_done());
    }

    #[test]
    fn test_pop_blocking_drains_before_none() {
        let queue = TransferQueue::new(4);
        queue.push(container("A")).expect("push");
        queue.push(container("B")).expect("push");
        queue.set_done();

        assert!(queue.pop_blocking().is_some());
        assert!(queue.pop_blocking().is_some());
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn test_pop_blocking_wakes_on_push() {
        let queue = Arc::new(TransferQueue::new(4));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push(container("late")).expect("push");
                queue.set_done();
            })
        };

        let popped = queue.pop_blocking().expect("container");
        assert_eq!(popped.id().as_bytes(), b"late");
        assert!(queue.pop_blocking().is_none());
        producer.join().expect("producer");
    }

    #[test]
    fn test_blocked_producer_released_by_done() {
        let queue = Arc::new(TransferQueue::new(1));
        queue.push(container("A")).expect("push");

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(container("B")))
        };

        thread::sleep(Duration::from_millis(20));
        queue.set_done();

        let result = producer.join().expect("producer");
        assert!(matches!(result, Err(QueueError::Closed(_))));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_default_polling_pop_blocking() {
        struct Polled(TransferQueue);

        impl ContainerSource for Polled {
            fn try_pop(&self) -> Option<Container> {
                self.0.try_pop()
            }
            fn is_empty(&self) -> bool {
                ContainerSource::is_empty(&self.0)
            }
            fn is_done(&self) -> bool {
                self.0.is_done()
            }
        }

        let source = Polled(TransferQueue::new(2));
        source.0.push(container("A")).expect("push");
        source.0.set_done();

        assert!(source.pop_blocking().is_some());
        assert!(source.pop_blocking().is_none());
    }
}
