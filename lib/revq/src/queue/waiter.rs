// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::entry::ValueAccessor;
use crate::error::Error;

/// Future returned by [`next`](crate::RevocableQueue::next).
///
/// Resolves with a [`ValueAccessor`] once an entry is claimable. Fails with
/// [`Error::QueueClosed`] if the queue was already closed when `next` was
/// called, or closes while this wait is still unmatched. Usable inside
/// `tokio::select!`; dropping it simply abandons the wait.
pub struct NextValue<T> {
    rx: Option<oneshot::Receiver<ValueAccessor<T>>>,
}

impl<T> NextValue<T> {
    /// A wait that fails immediately because the queue is closed.
    pub(crate) fn closed() -> Self {
        Self { rx: None }
    }

    /// A wait resolved by `notify` pairing it with an entry.
    pub(crate) fn pending(rx: oneshot::Receiver<ValueAccessor<T>>) -> Self {
        Self { rx: Some(rx) }
    }
}

impl<T> Future for NextValue<T> {
    type Output = Result<ValueAccessor<T>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.rx.as_mut() {
            // The sender half is dropped exactly when the queue closes with
            // this waiter still unmatched.
            Some(rx) => Pin::new(rx)
                .poll(cx)
                .map(|resolved| resolved.map_err(|_| Error::QueueClosed)),
            None => Poll::Ready(Err(Error::QueueClosed)),
        }
    }
}
