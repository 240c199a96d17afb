// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sequence issuance and root-walking glue (spec §5, §6, §9 "Global sequence
//! counter"): `Trigger` bumps a process-wide monotonic counter; `Driver` owns
//! a set of root reactors and pumps commits across them.
//!
//! The core itself never blocks or schedules (spec §5): everything here is a
//! thin, optional convenience for an enclosing application. Nothing in
//! `base`/`constant`/`basic`/`function`/`multi`/`fold` depends on this
//! module.

use crate::{base::BaseReactor, update::Update};
use std::{
    cell::RefCell,
    rc::Rc,
    sync::atomic::{AtomicI32, Ordering},
    sync::Arc,
};
use tracing::{debug_span, trace};

/// Issues sequence numbers for a single reactor graph. Sequence 0 is
/// reserved for the replay probe (spec §9), so the first real tick is 1.
///
/// Cloning a `Trigger` shares the same counter (backed by `Arc`, so it is
/// `Send`/`Sync`) — every producer thread that can reach a
/// `BasicReactor::update` should also hold a clone of the `Trigger` feeding
/// that graph's `Driver`, so it can wake the driver after enqueueing.
#[derive(Debug, Clone)]
pub struct Trigger {
    sequence: Arc<AtomicI32>,
}

impl Trigger {
    pub fn new() -> Self {
        Self {
            sequence: Arc::new(AtomicI32::new(0)),
        }
    }

    /// Bumps the global sequence and returns the new value to commit with
    /// (spec §6 `Trigger.SignalUpdate`).
    pub fn signal_update(&self) -> i32 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued sequence number (0 if none yet).
    pub fn current(&self) -> i32 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe variant of [`Trigger`]'s counter, for the rare case where a
/// driver itself is shared across threads rather than pumped by a single
/// owner thread. Most callers want [`Trigger`].
#[derive(Debug, Default)]
pub struct SharedSequenceCounter(AtomicI32);

impl SharedSequenceCounter {
    pub fn new() -> Self {
        Self(AtomicI32::new(0))
    }

    pub fn signal_update(&self) -> i32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Walks a fixed set of root reactors at each issued sequence (spec §2 "the
/// driver walks roots calling Commit(seq)").
///
/// `Driver` does not own a thread or a wake loop (spec §5 non-goal: "it does
/// not own threads"); `pump` is a synchronous, single call that an
/// enclosing application invokes from whatever loop or condition-variable
/// wait it prefers.
pub struct Driver {
    trigger: Trigger,
    roots: RefCell<Vec<Rc<dyn BaseReactor>>>,
}

impl Driver {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            roots: RefCell::new(Vec::new()),
        }
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    /// Registers a root reactor. Construction order determines commit order
    /// within a pump (spec §5 "a fixed order (construction order)").
    pub fn add_root(&self, root: Rc<dyn BaseReactor>) {
        self.roots.borrow_mut().push(root);
    }

    /// Commits every root at the next issued sequence number and returns the
    /// per-root outcomes in registration order.
    pub fn pump(&self) -> Vec<Update> {
        let sequence = self.trigger.signal_update();
        self.pump_at(sequence)
    }

    /// Commits every root at a caller-chosen sequence. Exposed directly so a
    /// late subscriber can issue the replay probe (`sequence == 0`) without
    /// perturbing the trigger's counter.
    pub fn pump_at(&self, sequence: i32) -> Vec<Update> {
        let span = debug_span!("reactor_pump", sequence);
        let _guard = span.enter();
        let roots = self.roots.borrow();
        roots
            .iter()
            .map(|root| {
                let update = root.commit(sequence);
                trace!(?update, "root committed");
                update
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantReactor;

    #[test]
    fn trigger_issues_increasing_sequences_starting_at_one() {
        let trigger = Trigger::new();
        assert_eq!(trigger.signal_update(), 1);
        assert_eq!(trigger.signal_update(), 2);
        assert_eq!(trigger.signal_update(), 3);
    }

    #[test]
    fn driver_pumps_roots_in_registration_order() {
        let trigger = Trigger::new();
        let driver = Driver::new(trigger);
        driver.add_root(ConstantReactor::new(1));
        driver.add_root(ConstantReactor::new(2));
        let updates = driver.pump();
        assert_eq!(updates, vec![Update::Eval, Update::Eval]);
    }

    #[test]
    fn replay_probe_does_not_consume_a_sequence_number() {
        let trigger = Trigger::new();
        let driver = Driver::new(trigger.clone());
        driver.add_root(ConstantReactor::new(1));
        driver.pump();
        assert_eq!(driver.pump_at(0), vec![Update::Eval]);
        assert_eq!(trigger.current(), 1);
    }
}
