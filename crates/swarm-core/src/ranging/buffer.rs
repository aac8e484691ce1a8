//! Ingestion buffer between the frame-reading producer and the periodic tick

use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::protocol::ResponseFrame;

/// Unbounded FIFO shared by one producer and one consumer
///
/// Cloning yields another handle on the same queue. The lock is held only to
/// append one item or to swap the whole queue out, so neither side waits on
/// the other's processing.
#[derive(Debug)]
pub struct IngestionBuffer<T = ResponseFrame> {
    queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for IngestionBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> Default for IngestionBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IngestionBuffer<T> {
    /// Empty buffer
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    // A panic while holding the lock cannot leave a half-pushed item behind,
    // so a poisoned queue is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one item
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Take everything pushed so far, in push order, leaving the buffer empty
    pub fn drain(&self) -> Vec<T> {
        let taken = mem::take(&mut *self.lock());
        taken.into()
    }

    /// Frames waiting to be drained
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
