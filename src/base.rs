// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `BaseReactor` and `Reactor<T>` (spec §4.1), plus the shared commit-cache
//! bookkeeping every leaf-first combinator in this crate reuses.

use crate::{error::Expected, update::Update};
use std::{any::Any, cell::Cell};

/// The untyped reactor contract (spec §6 `BaseReactor`).
///
/// Object-safe so that heterogeneous children (e.g. `MultiReactor`'s dynamic
/// vector, spec §4.4/§9) can be held as `Rc<dyn BaseReactor>` and recovered by
/// typed downcast through [`eval_typed`].
pub trait BaseReactor: Any {
    /// True once the reactor has reached its terminal state (spec §3).
    fn is_complete(&self) -> bool;

    /// Drive the reactor's state up to `sequence` (spec §4.1).
    fn commit(&self, sequence: i32) -> Update;

    /// Support for the typed downcast used by `MultiReactor` (spec §9).
    fn as_any(&self) -> &dyn Any;
}

/// The typed extension of [`BaseReactor`] (spec §6 `Reactor<T>`).
pub trait Reactor<T>: BaseReactor {
    /// Read the reactor's current value. Only meaningful after a `commit`
    /// returned `Update::Eval` (or a terminal `Eval`); calling it earlier is
    /// a contract breach and returns `ReactorError::Unavailable` (spec §3
    /// invariant 3, §7.1).
    fn eval(&self) -> Expected<T>;
}

/// Recovers a typed value from a heterogeneous child handle, the Rust
/// analogue of the original's `dynamic_pointer_cast` in `MultiReactor`'s user
/// function (spec §9 "Dynamic child vectors").
///
/// Panics if `reactor` is not actually a `R` — a caller error, not a runtime
/// contract violation, so this is not folded into `Expected`.
pub fn eval_typed<R, T>(reactor: &dyn BaseReactor) -> Expected<T>
where
    R: Reactor<T> + 'static,
{
    reactor
        .as_any()
        .downcast_ref::<R>()
        .expect("MultiReactor child was not of the expected concrete type")
        .eval()
}

/// Shared `currentSequence` / cached-outcome / `hasValue` / `isComplete`
/// bookkeeping described once in spec §4.1 and reused, verbatim, by every
/// combinator in this crate (`Constant`, `Basic`, `Function`/`Multi`,
/// `Fold`). `FoldParameterReactor` does not use this: it has its own
/// dual-slot scheme (spec §4.5).
#[derive(Debug)]
pub(crate) struct CommitCache {
    current_sequence: Cell<i32>,
    current_update: Cell<Update>,
    has_value: Cell<bool>,
    is_complete: Cell<bool>,
}

impl Default for CommitCache {
    fn default() -> Self {
        Self {
            current_sequence: Cell::new(-1),
            current_update: Cell::new(Update::None),
            has_value: Cell::new(false),
            is_complete: Cell::new(false),
        }
    }
}

impl CommitCache {
    pub fn is_complete(&self) -> bool {
        self.is_complete.get()
    }

    pub fn has_value(&self) -> bool {
        self.has_value.get()
    }

    pub fn current_sequence(&self) -> i32 {
        self.current_sequence.get()
    }

    /// The first action of every `Commit(seq)` (spec §4.1). Returns `Some`
    /// with the outcome to short-circuit on, or `None` if the caller must
    /// compute a fresh outcome for `seq`.
    ///
    /// The `seq == 0 && current_sequence != -1` branch intentionally returns
    /// `Complete` (not `None`) when there's no value, matching the literal
    /// behaviour of the original `FoldReactor`/`MultiReactor` `Commit` rather
    /// than the looser prose in spec §3 invariant 4 — see spec §9's Open
    /// Questions and `DESIGN.md`.
    pub fn precheck(&self, seq: i32) -> Option<Update> {
        if seq == self.current_sequence.get() {
            return Some(self.current_update.get());
        }
        if seq == 0 && self.current_sequence.get() != -1 {
            return Some(if self.has_value.get() {
                Update::Eval
            } else {
                Update::Complete
            });
        }
        if self.is_complete.get() {
            return Some(Update::None);
        }
        None
    }

    /// Marks the reactor permanently complete without forcing *this* tick's
    /// returned `Update` to `Complete` — the "coincide" case from spec §3
    /// ("COMPLETE may coincide with a final EVAL... encoded as EVAL plus a
    /// sticky complete flag"). Used by `FunctionReactor`/`MultiReactor` when
    /// every child has gone permanently complete on the same tick that still
    /// reports a value.
    pub fn mark_complete(&self) {
        self.is_complete.set(true);
    }

    /// Cache a freshly computed outcome for `seq` (spec §4.1 "After
    /// computing a fresh outcome, set currentSequence = seq and cache").
    ///
    /// A `NONE` outcome is deliberately *not* cached: neither
    /// `MultiReactor.hpp` nor `FoldReactor.hpp` advances
    /// `m_currentSequenceNumber` on a `NONE` result (the original only
    /// assigns it alongside a real `EVAL`/`COMPLETE`, or in Fold's own seed
    /// step — see [`Self::record_seed`]). Advancing it here unconditionally
    /// would make a later `Commit(0)` late-subscriber probe see
    /// `current_sequence != -1` with `has_value` still false and
    /// (mis)report `COMPLETE` instead of `NONE` for a reactor that simply
    /// hasn't produced anything yet.
    pub fn record(&self, seq: i32, update: Update) {
        if update.is_none() {
            return;
        }
        debug_assert!(
            seq > self.current_sequence.get() || self.current_sequence.get() == -1,
            "Commit called with a non-increasing sequence number"
        );
        self.current_sequence.set(seq);
        self.current_update.set(update);
        if update.is_eval() {
            self.has_value.set(true);
        }
        if update.is_complete() {
            self.is_complete.set(true);
        }
    }

    /// Caches a `NONE` outcome at `seq` anyway — the one exception to
    /// [`Self::record`]'s rule, used solely by `FoldReactor`'s seed tick
    /// (spec §4.5 step 3), mirroring the original's explicit
    /// `m_currentSequenceNumber = sequenceNumber; m_update = NONE;`. Without
    /// this, a repeated `Commit` at the seed sequence would re-run the seed
    /// step as though it were the first real reduction, breaking the
    /// idempotence invariant (spec §8).
    pub fn record_seed(&self, seq: i32) {
        debug_assert!(
            seq > self.current_sequence.get() || self.current_sequence.get() == -1,
            "Commit called with a non-increasing sequence number"
        );
        self.current_sequence.set(seq);
        self.current_update.set(Update::None);
    }
}
