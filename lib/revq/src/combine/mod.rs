// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Combinators composing multiple revocable queues into one stream.

mod merge;
mod zip;

pub use merge::lazy_merge;
pub use zip::lazy_zip;
