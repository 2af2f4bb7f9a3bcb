// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use async_stream::stream;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::closeable::{guarded, Closeable};
use crate::queue::entry::claim_all;
use crate::queue::{RevocableQueue, ValueAccessor};

/// Zip `inputs` into a stream of tuples, one value per input in input
/// order, produced only when every input holds a live value simultaneously.
///
/// An accessor obtained in an earlier round is reused until consumed, so a
/// revocation in one input delays the tuple without discarding values that
/// already arrived in the others. The stream ends when any input closes, or
/// when the returned [`Closeable`] is closed.
pub fn lazy_zip<T>(inputs: Vec<RevocableQueue<T>>) -> Closeable<Vec<T>>
where
    T: Send + 'static,
{
    let token = CancellationToken::new();
    let guard = token.clone();
    let stream = stream! {
        let mut held: Vec<Option<ValueAccessor<T>>> = (0..inputs.len()).map(|_| None).collect();
        while !inputs.is_empty() {
            // Request fresh accessors only for slots not carried over from
            // the previous round, then wait for the full set.
            let requests: Vec<_> = inputs
                .iter()
                .enumerate()
                .filter(|(idx, _)| held[*idx].is_none())
                .map(|(idx, queue)| {
                    let wait = queue.next();
                    async move { wait.await.map(|accessor| (idx, accessor)) }
                })
                .collect();
            let resolved = match guarded(&guard, try_join_all(requests)).await {
                Ok(Ok(resolved)) => resolved,
                // Closed from outside, or an input closed mid-wait.
                Ok(Err(_)) | Err(_) => break,
            };
            for (idx, accessor) in resolved {
                held[idx] = Some(accessor);
            }

            // An input that closed after handing out its accessor still
            // ends the stream; its already-claimable value is abandoned.
            if inputs.iter().any(RevocableQueue::is_closed) {
                trace!("zip input closed, ending stream");
                break;
            }

            let all_live = held
                .iter()
                .all(|slot| slot.as_ref().is_some_and(ValueAccessor::is_live));
            if all_live {
                let accessors: Vec<_> = held
                    .iter_mut()
                    .map(|slot| slot.take().expect("all slots filled this round"))
                    .collect();
                // All-or-nothing: a revoke racing the claim declines the
                // whole tuple and every accessor is requested afresh.
                if let Some(tuple) = claim_all(&accessors) {
                    yield tuple;
                }
            } else {
                // Drop only the dead accessors; live ones carry over.
                for slot in held.iter_mut() {
                    if slot.as_ref().is_some_and(|accessor| !accessor.is_live()) {
                        *slot = None;
                    }
                }
            }
        }
    };
    Closeable::new(token, stream)
}
