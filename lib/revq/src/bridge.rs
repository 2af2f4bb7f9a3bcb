// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Adapter from one event subscription to a revocable-queue-backed stream.

use async_stream::stream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::bus::{Handler, Listener, SubscriptionGuard};
use crate::closeable::{guarded, Closeable};
use crate::queue::RevocableQueue;

/// Stream every payload emitted for `event` on `listener`.
///
/// Payloads are buffered in an internal [`RevocableQueue`], so emits are
/// never dropped while the consumer is slow. Closing the stream (or
/// dropping it) removes the subscription and closes the queue; payloads
/// emitted afterwards are not observed.
pub fn event_iterable<P>(listener: Arc<dyn Listener<P>>, event: &str) -> Closeable<P>
where
    P: Send + 'static,
{
    let queue = RevocableQueue::<P>::new();
    let feed: Handler<P> = {
        let queue = queue.clone();
        // Emits racing the close are dropped by the closed queue.
        Arc::new(move |payload| {
            let _ = queue.add(payload);
        })
    };
    let guard = SubscriptionGuard::new(listener, event, feed);

    let token = CancellationToken::new();
    let cancelled = token.clone();
    let stream = stream! {
        // The subscription lives exactly as long as the stream.
        let _guard = guard;
        loop {
            let accessor = match guarded(&cancelled, queue.next()).await {
                Ok(Ok(accessor)) => accessor,
                Ok(Err(_)) | Err(_) => break,
            };
            if let Some(payload) = accessor.take() {
                yield payload;
            }
        }
        queue.close();
    };
    Closeable::new(token, stream)
}
