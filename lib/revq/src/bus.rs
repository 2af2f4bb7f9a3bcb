// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The listener capability consumed by the gate and bridge, plus an
//! in-process implementation with synchronous dispatch.

use parking_lot::Mutex as ParkingMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked with each emitted payload.
pub type Handler<P> = Arc<dyn Fn(P) + Send + Sync>;

/// Identifies one subscription for later removal.
///
/// Handlers are closures and closures have no identity, so removal goes
/// through the id handed out at subscription time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Anything that can register and remove named-event handlers.
///
/// Emit semantics assumed by this crate: dispatch is synchronous to every
/// handler subscribed at emit time, and one handler cannot prevent the
/// others from running.
pub trait Listener<P>: Send + Sync {
    /// Register `handler` for `event`.
    fn subscribe(&self, event: &str, handler: Handler<P>) -> SubscriptionId;

    /// Remove the subscription; unknown or already-removed ids return
    /// `false` with no effect.
    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool;
}

/// In-process event bus with synchronous dispatch.
pub struct EventBus<P> {
    channels: ParkingMutex<HashMap<String, Vec<(SubscriptionId, Handler<P>)>>>,
    next_id: AtomicU64,
}

impl<P: Clone> EventBus<P> {
    /// Create a bus, shared by reference.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channels: ParkingMutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        })
    }

    /// Number of handlers currently subscribed to `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.channels
            .lock()
            .get(event)
            .map_or(0, |subs| subs.len())
    }

    /// Dispatch `payload` to every handler currently subscribed to
    /// `event`.
    ///
    /// The handler list is snapshotted before dispatch, so handlers may
    /// re-enter the bus; subscriptions made during dispatch only see later
    /// emits.
    pub fn emit(&self, event: &str, payload: P) {
        let handlers: Vec<Handler<P>> = {
            let channels = self.channels.lock();
            channels
                .get(event)
                .map(|subs| subs.iter().map(|(_, handler)| Arc::clone(handler)).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            handler(payload.clone());
        }
    }
}

impl<P> Listener<P> for EventBus<P>
where
    P: Clone + Send + Sync + 'static,
{
    fn subscribe(&self, event: &str, handler: Handler<P>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut channels = self.channels.lock();
        channels
            .entry(event.to_owned())
            .or_default()
            .push((id, handler));
        id
    }

    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut channels = self.channels.lock();
        match channels.get_mut(event) {
            Some(subs) => {
                let before = subs.len();
                subs.retain(|(sub_id, _)| *sub_id != id);
                subs.len() != before
            }
            None => false,
        }
    }
}

/// RAII wrapper around one subscription; unsubscribes exactly once on drop.
pub struct SubscriptionGuard<P> {
    listener: Arc<dyn Listener<P>>,
    event: String,
    id: Option<SubscriptionId>,
}

impl<P> SubscriptionGuard<P> {
    /// Subscribe `handler` to `event` and guard the registration.
    pub fn new(listener: Arc<dyn Listener<P>>, event: &str, handler: Handler<P>) -> Self {
        let id = listener.subscribe(event, handler);
        Self {
            listener,
            event: event.to_owned(),
            id: Some(id),
        }
    }
}

impl<P> Drop for SubscriptionGuard<P> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.listener.unsubscribe(&self.event, id);
        }
    }
}
