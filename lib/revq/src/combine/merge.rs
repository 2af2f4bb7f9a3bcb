// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use async_stream::stream;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::poll_fn;
use std::task::Poll;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::closeable::{guarded, Closeable};
use crate::error::Error;
use crate::queue::{RevocableQueue, ValueAccessor};

/// One input's place in the race.
enum Input<T> {
    /// Wait for this input's next delivery.
    Waiting(BoxFuture<'static, Result<ValueAccessor<T>, Error>>),
    /// Delivered but not yet yielded; kept until it is the oldest arrival.
    Arrived(ValueAccessor<T>),
    /// Permanently exhausted and out of the race.
    Closed,
}

fn wait_next<T>(queue: &RevocableQueue<T>) -> Input<T>
where
    T: Send + 'static,
{
    let queue = queue.clone();
    Input::Waiting(async move { queue.next().await }.boxed())
}

/// Merge `inputs` into a single stream yielding each input's values as
/// they arrive, interleaved in arrival order.
///
/// One wait is kept in flight per input at all times. Arrivals are ordered
/// by their queue-pairing stamp, so values delivered from different inputs
/// between two polls still come out oldest first. An input that closes is
/// dropped from the race; the stream ends only when every input has
/// closed, or when the returned [`Closeable`] is closed.
pub fn lazy_merge<T>(inputs: Vec<RevocableQueue<T>>) -> Closeable<T>
where
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let guard = token.clone();
    let stream = stream! {
        let mut slots: Vec<Input<T>> = inputs.iter().map(wait_next).collect();
        loop {
            // Resolve in-flight waits until at least one arrival is
            // buffered, or every input is gone.
            let race = poll_fn(|cx| {
                for slot in slots.iter_mut() {
                    if let Input::Waiting(wait) = slot {
                        if let Poll::Ready(outcome) = wait.as_mut().poll(cx) {
                            *slot = match outcome {
                                Ok(accessor) => Input::Arrived(accessor),
                                Err(_) => Input::Closed,
                            };
                        }
                    }
                }
                let arrived = slots.iter().any(|slot| matches!(slot, Input::Arrived(_)));
                let exhausted = slots.iter().all(|slot| matches!(slot, Input::Closed));
                if arrived || exhausted {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            });
            if guarded(&guard, race).await.is_err() {
                break;
            }

            // Oldest buffered arrival goes first, wherever it came from.
            let oldest = slots
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| match slot {
                    Input::Arrived(accessor) => Some((idx, accessor.sequence())),
                    _ => None,
                })
                .min_by_key(|(_, sequence)| *sequence)
                .map(|(idx, _)| idx);
            let Some(idx) = oldest else {
                trace!("all merge inputs closed, ending stream");
                break;
            };

            let accessor = match std::mem::replace(&mut slots[idx], wait_next(&inputs[idx])) {
                Input::Arrived(accessor) => accessor,
                _ => unreachable!("slot selected as an arrival above"),
            };
            // A revoked arrival re-arms its input without a yield.
            if let Some(value) = accessor.take() {
                yield value;
            }
        }
    };
    Closeable::new(token, stream)
}
