// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Error types shared across the queue, combinators, and gate.

use thiserror::Error;

/// Errors surfaced by queue and stream operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The queue has been permanently closed; no further values will be
    /// added or delivered.
    #[error("Queue is closed")]
    QueueClosed,

    /// A closeable stream was closed while a wait was in flight. Raised
    /// internally to unwind the production loop; consumers observe the
    /// stream ending, not this error.
    #[error("Stream is closed")]
    StreamClosed,

    /// The event gate was cancelled before all of its conditions held.
    #[error("Event gate cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
