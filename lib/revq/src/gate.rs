// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! A gate future over a set of event-driven boolean conditions.

use futures::future::BoxFuture;
use futures::StreamExt;
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::bus::{Handler, Listener, SubscriptionGuard};
use crate::combine::lazy_zip;
use crate::error::Error;
use crate::queue::{RevocableQueue, RevokeHandle};

/// One gating condition: which events arm it, which events disarm it, and
/// whether it starts armed.
pub struct Segment<P> {
    /// Event source the segment subscribes to.
    pub listener: Arc<dyn Listener<P>>,
    /// Event names that arm the segment.
    pub activate: Vec<String>,
    /// Event names that disarm the segment, withdrawing a pending arm.
    pub deactivate: Vec<String>,
    /// Initial armed state, applied before any event is observed.
    pub status: bool,
}

impl<P> Segment<P> {
    /// Describe a segment of the gate.
    pub fn new<I, J, S>(listener: Arc<dyn Listener<P>>, activate: I, deactivate: J, status: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            listener,
            activate: activate.into_iter().map(Into::into).collect(),
            deactivate: deactivate.into_iter().map(Into::into).collect(),
            status,
        }
    }
}

/// Gate returned by [`event_state`].
///
/// [`wait`](Self::wait) resolves exactly when every segment is
/// simultaneously armed; [`GateCancel::cancel`] makes it fail with
/// [`Error::Cancelled`] instead. Either way, every listener subscription is
/// dropped exactly once. Cancelling after resolution has no effect.
pub struct EventGate {
    wait: BoxFuture<'static, Result<(), Error>>,
    token: CancellationToken,
}

impl EventGate {
    /// Wait until all segments are simultaneously armed.
    pub async fn wait(self) -> Result<(), Error> {
        self.wait.await
    }

    /// Obtain a detached cancellation handle.
    pub fn cancel_handle(&self) -> GateCancel {
        GateCancel {
            token: self.token.clone(),
        }
    }
}

/// Detached cancellation handle for an [`EventGate`].
#[derive(Clone)]
pub struct GateCancel {
    token: CancellationToken,
}

impl GateCancel {
    /// Fail the gate's `wait` with [`Error::Cancelled`] unless it already
    /// resolved.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Build a gate that resolves once every segment is simultaneously armed.
///
/// Each segment is backed by its own internal [`RevocableQueue`]: an
/// activate event enqueues an arm marker unless one is already pending, a
/// deactivate event revokes the pending marker, and `status: true` arms
/// the segment up front. All segments being armed at once is detected as
/// the first tuple of [`lazy_zip`](crate::lazy_zip) over the segment
/// queues.
pub fn event_state<P>(segments: Vec<Segment<P>>) -> EventGate
where
    P: Clone + Send + Sync + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let mut queues = Vec::with_capacity(segments.len());
    let mut guards = Vec::new();
    for segment in &segments {
        let queue = RevocableQueue::<bool>::new();
        let armed: Arc<ParkingMutex<Option<RevokeHandle<bool>>>> =
            Arc::new(ParkingMutex::new(None));

        let arm = {
            let queue = queue.clone();
            let armed = Arc::clone(&armed);
            move || {
                let mut armed = armed.lock();
                // Already armed (or contributed): nothing to add.
                if armed.is_none() {
                    if let Ok(revoke) = queue.add(true) {
                        *armed = Some(revoke);
                    }
                }
            }
        };
        let disarm = {
            let armed = Arc::clone(&armed);
            move || {
                if let Some(revoke) = armed.lock().take() {
                    revoke.revoke();
                }
            }
        };

        for event in &segment.activate {
            let arm = arm.clone();
            let handler: Handler<P> = Arc::new(move |_| arm());
            guards.push(SubscriptionGuard::new(
                Arc::clone(&segment.listener),
                event,
                handler,
            ));
        }
        for event in &segment.deactivate {
            let disarm = disarm.clone();
            let handler: Handler<P> = Arc::new(move |_| disarm());
            guards.push(SubscriptionGuard::new(
                Arc::clone(&segment.listener),
                event,
                handler,
            ));
        }
        if segment.status {
            arm();
        }
        queues.push(queue);
    }

    let wait = Box::pin(async move {
        let outcome = if queues.is_empty() {
            // No conditions: trivially all armed.
            Ok(())
        } else {
            let mut all_armed = lazy_zip(queues.clone());
            tokio::select! {
                // Resolution first: a gate whose conditions are already met
                // wins over a simultaneous cancel.
                biased;
                first = all_armed.next() => match first {
                    Some(_) => Ok(()),
                    None => Err(Error::QueueClosed),
                },
                _ = cancelled.cancelled() => Err(Error::Cancelled),
            }
        };
        for queue in &queues {
            queue.close();
        }
        drop(guards);
        trace!(?outcome, "gate torn down");
        outcome
    });

    EventGate { wait, token }
}
