// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

// Core primitive
mod queue;

// Stream plumbing
mod closeable;
mod combine;

// Event-driven layers
mod bridge;
mod bus;
mod gate;

mod error;

// ── Re-exports ───────────────────────────────────────────────────────

pub use bridge::event_iterable;
pub use bus::{EventBus, Handler, Listener, SubscriptionGuard, SubscriptionId};
pub use closeable::{CloseHandle, Closeable};
pub use combine::{lazy_merge, lazy_zip};
pub use error::{Error, Result};
pub use gate::{event_state, EventGate, GateCancel, Segment};
pub use queue::{NextValue, RevocableQueue, RevokeHandle, ValueAccessor};
