// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Stream wrapper with an externally triggerable close signal.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// A stream that can be ended from the outside.
///
/// Production loops wrapped in a `Closeable` race every internal suspension
/// point against the close token (see [`guarded`]), so a close lands at the
/// current or next wait and never leaves the loop blocked. After
/// [`close`](Self::close) the stream yields `None`.
pub struct Closeable<T> {
    inner: Pin<Box<dyn Stream<Item = T> + Send>>,
    token: CancellationToken,
}

impl<T> Closeable<T> {
    pub(crate) fn new<S>(token: CancellationToken, stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            token,
        }
    }

    /// End the stream. In-flight waits inside the production loop abort at
    /// their current suspension point.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// A clonable handle that closes this stream from elsewhere.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            token: self.token.clone(),
        }
    }
}

impl<T> Stream for Closeable<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> Drop for Closeable<T> {
    fn drop(&mut self) {
        // A dropped stream is a closed stream; wake anything still racing
        // the token outside the production loop.
        self.token.cancel();
    }
}

/// Detached close handle for a [`Closeable`] stream.
#[derive(Clone)]
pub struct CloseHandle {
    token: CancellationToken,
}

impl CloseHandle {
    /// End the paired stream.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Whether the paired stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Race one suspension point against a close token.
///
/// Returns [`Error::StreamClosed`] when the token wins; the close arm is
/// polled first, so a stream that is closed while a value is also ready
/// still stops producing.
pub(crate) async fn guarded<F>(token: &CancellationToken, wait: F) -> Result<F::Output, Error>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::StreamClosed),
        out = wait => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn close_ends_an_in_flight_wait() {
        let token = CancellationToken::new();
        let guard = token.clone();
        let stream = async_stream::stream! {
            loop {
                match guarded(&guard, std::future::pending::<u32>()).await {
                    Ok(v) => yield v,
                    Err(_) => break,
                }
            }
        };
        let mut closeable = Closeable::new(token, stream);
        let handle = closeable.close_handle();

        let next = tokio::spawn(async move { closeable.next().await });
        tokio::task::yield_now().await;
        handle.close();

        assert_eq!(next.await.unwrap(), None);
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn guarded_prefers_close_over_ready_value() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = guarded(&token, std::future::ready(5)).await;
        assert_eq!(outcome, Err(Error::StreamClosed));
    }
}
