// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The revocable queue: an unbounded FIFO whose entries can be withdrawn by
//! the producer any time before a consumer claims them.

use parking_lot::Mutex as ParkingMutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::trace;

pub(crate) mod entry;
mod waiter;

pub use entry::{RevokeHandle, ValueAccessor};
pub use waiter::NextValue;

use crate::error::Error;
use entry::EntrySlot;

/// Global pairing order. Every delivery to a waiter is stamped from this
/// counter, giving combinators a cross-queue arrival order to preserve.
static NEXT_DELIVERY_SEQ: AtomicU64 = AtomicU64::new(0);

/// An unbounded, FIFO, single-consumer-per-value queue with producer-side
/// revocation.
///
/// Handles are cheap to clone and share one underlying queue. Each value is
/// delivered to exactly one consumer; delivery hands out a
/// [`ValueAccessor`] rather than the value, so a producer can still revoke
/// up to the instant the consumer claims.
pub struct RevocableQueue<T> {
    state: Arc<ParkingMutex<QueueState<T>>>,
}

struct QueueState<T> {
    pending: VecDeque<Arc<EntrySlot<T>>>,
    waiting: VecDeque<oneshot::Sender<ValueAccessor<T>>>,
    closed: bool,
}

impl<T> RevocableQueue<T> {
    /// Create an empty open queue.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ParkingMutex::new(QueueState {
                pending: VecDeque::new(),
                waiting: VecDeque::new(),
                closed: false,
            })),
        }
    }

    /// Enqueue `value` at the back, returning its revocation handle.
    ///
    /// Pairing with the oldest outstanding waiter happens synchronously
    /// before this call returns.
    pub fn add(&self, value: T) -> Result<RevokeHandle<T>, Error> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::QueueClosed);
        }
        let slot = EntrySlot::new(value);
        state.pending.push_back(Arc::clone(&slot));
        Self::notify(&mut state);
        Ok(RevokeHandle::new(slot))
    }

    /// Enqueue `value` at the *front* of the pending sequence, so it is
    /// offered to the next consumer ahead of everything already queued.
    pub fn insert_first(&self, value: T) -> Result<RevokeHandle<T>, Error> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::QueueClosed);
        }
        let slot = EntrySlot::new(value);
        state.pending.push_front(Arc::clone(&slot));
        Self::notify(&mut state);
        Ok(RevokeHandle::new(slot))
    }

    /// Wait for the next claimable entry.
    pub fn next(&self) -> NextValue<T> {
        let mut state = self.state.lock();
        if state.closed {
            return NextValue::closed();
        }
        let (tx, rx) = oneshot::channel();
        state.waiting.push_back(tx);
        Self::notify(&mut state);
        NextValue::pending(rx)
    }

    /// Permanently close the queue. Idempotent.
    ///
    /// Remaining pending entries are discarded and every unmatched waiter
    /// fails with [`Error::QueueClosed`]. Accessors already delivered stay
    /// claimable.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let dropped_entries = state.pending.len();
        let failed_waiters = state.waiting.len();
        state.pending.clear();
        // Dropping the senders fails the paired NextValue futures.
        state.waiting.clear();
        trace!(dropped_entries, failed_waiters, "queue closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Pair pending entries with waiting consumers, oldest with oldest,
    /// until one side runs out.
    ///
    /// Revoked entries are discarded as they surface; the waiter they would
    /// have gone to stays queued for the next live entry, so a batch of
    /// revokes never stalls delivery. A waiter whose consumer dropped its
    /// future is likewise discarded, and the entry is offered to the next
    /// waiter in line.
    fn notify(state: &mut QueueState<T>) {
        while !state.pending.is_empty() && !state.waiting.is_empty() {
            let slot = state
                .pending
                .pop_front()
                .expect("pending checked non-empty above");
            if !slot.is_live() {
                continue;
            }
            let mut accessor = ValueAccessor::new(
                Arc::clone(&slot),
                NEXT_DELIVERY_SEQ.fetch_add(1, Ordering::Relaxed),
            );
            loop {
                match state.waiting.pop_front() {
                    Some(waiter) => match waiter.send(accessor) {
                        Ok(()) => break,
                        Err(returned) => accessor = returned,
                    },
                    None => {
                        state.pending.push_front(slot);
                        return;
                    }
                }
            }
        }
    }
}

impl<T> Clone for RevocableQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for RevocableQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
