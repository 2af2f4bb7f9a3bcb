// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use parking_lot::Mutex as ParkingMutex;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Lifecycle of one queued value.
///
/// `Pending` is the only state a value can be observed or withdrawn in;
/// `Claimed` and `Revoked` are both terminal.
enum SlotState<T> {
    Pending(T),
    Claimed,
    Revoked,
}

/// Shared cell holding one value and its claim/revoke state.
pub(crate) struct EntrySlot<T> {
    state: ParkingMutex<SlotState<T>>,
}

impl<T> EntrySlot<T> {
    pub(crate) fn new(value: T) -> Arc<Self> {
        Arc::new(Self {
            state: ParkingMutex::new(SlotState::Pending(value)),
        })
    }

    pub(crate) fn is_live(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Pending(_))
    }

    fn claim(&self) -> Option<T> {
        let mut state = self.state.lock();
        match *state {
            SlotState::Pending(_) => match std::mem::replace(&mut *state, SlotState::Claimed) {
                SlotState::Pending(value) => Some(value),
                _ => unreachable!("state checked as pending under the same lock"),
            },
            _ => None,
        }
    }

    fn revoke(&self) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending(_)) {
            *state = SlotState::Revoked;
        }
    }
}

/// Producer-side handle returned by [`add`](crate::RevocableQueue::add).
///
/// Calling [`revoke`](Self::revoke) before the value is claimed silently
/// withdraws it; a consumer that already holds an accessor for the entry
/// observes it as not-live. Revoking after the claim, or more than once,
/// has no effect.
pub struct RevokeHandle<T> {
    slot: Arc<EntrySlot<T>>,
}

impl<T> RevokeHandle<T> {
    pub(crate) fn new(slot: Arc<EntrySlot<T>>) -> Self {
        Self { slot }
    }

    /// Withdraw the value if it is still unclaimed.
    pub fn revoke(&self) {
        self.slot.revoke();
    }
}

impl<T> Debug for RevokeHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevokeHandle")
            .field("live", &self.slot.is_live())
            .finish()
    }
}

/// Consumer-side handle resolved by [`next`](crate::RevocableQueue::next).
///
/// The accessor is the only way to observe or claim the paired value.
/// [`take`](Self::take) claims it exactly once; [`is_live`](Self::is_live)
/// peeks without claiming. `None` from `take` (and `false` from `is_live`)
/// is the empty marker for a revoked or already-claimed entry, and is
/// distinguishable by construction from any legitimate payload because the
/// accessor wraps the payload whole.
pub struct ValueAccessor<T> {
    slot: Arc<EntrySlot<T>>,
    sequence: u64,
}

impl<T> ValueAccessor<T> {
    pub(crate) fn new(slot: Arc<EntrySlot<T>>, sequence: u64) -> Self {
        Self { slot, sequence }
    }

    /// Position of this delivery in the global pairing order, used by the
    /// merge combinator to preserve arrival order across queues.
    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Claim the value. Returns `None` if the entry was revoked or the
    /// value was already claimed.
    pub fn take(&self) -> Option<T> {
        self.slot.claim()
    }

    /// Peek without claiming: `true` while an unclaimed, unrevoked value
    /// is present.
    pub fn is_live(&self) -> bool {
        self.slot.is_live()
    }
}

impl<T> Debug for ValueAccessor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueAccessor")
            .field("live", &self.slot.is_live())
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Claim every accessor of a candidate tuple, or none of them.
///
/// All slots are locked (in accessor order) before any liveness check, so a
/// revoke racing this call either lands before it — the whole tuple is
/// declined — or after it, once every value is already claimed. Accessors
/// must reference distinct entries.
pub(crate) fn claim_all<T>(accessors: &[ValueAccessor<T>]) -> Option<Vec<T>> {
    let mut guards: Vec<_> = accessors
        .iter()
        .map(|accessor| accessor.slot.state.lock())
        .collect();

    if !guards
        .iter()
        .all(|guard| matches!(**guard, SlotState::Pending(_)))
    {
        return None;
    }

    let values = guards
        .iter_mut()
        .map(
            |guard| match std::mem::replace(&mut **guard, SlotState::Claimed) {
                SlotState::Pending(value) => value,
                _ => unreachable!("all slots checked as pending under their locks"),
            },
        )
        .collect();
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exactly_once() {
        let slot = EntrySlot::new(7);
        let accessor = ValueAccessor::new(slot, 0);
        assert!(accessor.is_live());
        assert_eq!(accessor.take(), Some(7));
        assert!(!accessor.is_live());
        assert_eq!(accessor.take(), None);
    }

    #[test]
    fn revoke_before_claim_empties_the_slot() {
        let slot = EntrySlot::new("value");
        let revoke = RevokeHandle::new(Arc::clone(&slot));
        let accessor = ValueAccessor::new(slot, 0);

        revoke.revoke();
        assert!(!accessor.is_live());
        assert_eq!(accessor.take(), None);
    }

    #[test]
    fn revoke_after_claim_is_a_no_op() {
        let slot = EntrySlot::new(1);
        let revoke = RevokeHandle::new(Arc::clone(&slot));
        let accessor = ValueAccessor::new(slot, 0);

        assert_eq!(accessor.take(), Some(1));
        revoke.revoke();
        revoke.revoke();
        assert_eq!(accessor.take(), None);
    }

    #[test]
    fn claim_all_declines_when_any_slot_is_dead() {
        let live = ValueAccessor::new(EntrySlot::new(1), 0);
        let dead_slot = EntrySlot::new(2);
        let revoke = RevokeHandle::new(Arc::clone(&dead_slot));
        revoke.revoke();
        let dead = ValueAccessor::new(dead_slot, 0);

        assert_eq!(claim_all(&[live, dead]), None);
    }

    #[test]
    fn claim_all_takes_every_value() {
        let accessors = vec![
            ValueAccessor::new(EntrySlot::new(1), 0),
            ValueAccessor::new(EntrySlot::new(2), 1),
            ValueAccessor::new(EntrySlot::new(3), 2),
        ];
        assert_eq!(claim_all(&accessors), Some(vec![1, 2, 3]));
        assert!(accessors.iter().all(|a| !a.is_live()));
    }
}
