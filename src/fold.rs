// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `FoldParameterReactor<T>` and `FoldReactor` (spec §4.5): the fold
//! subsystem, ported directly from
//! `examples/original_source/Beam/Include/Beam/Reactors/FoldReactor.hpp`.
//!
//! The fold is expressed as a sub-graph (`evaluation(left, right)`), not a
//! callback, so the reduction can itself be introspected and reused as an
//! ordinary reactor (spec §4.5 rationale).

use crate::{
    base::{BaseReactor, CommitCache, Reactor},
    error::{Expected, ReactorError},
    update::Update,
};
use std::{any::Any, cell::Cell, cell::RefCell, rc::Rc};

/// Internal placeholder fed by the owning `FoldReactor`, never externally
/// (spec §4.5). Permanently non-complete: a parameter lives as long as its
/// fold.
pub struct FoldParameterReactor<T> {
    value: RefCell<Expected<T>>,
    sequence: Cell<i32>,
    next_value: RefCell<Option<Expected<T>>>,
    next_sequence: Cell<i32>,
}

impl<T: Clone + 'static> FoldParameterReactor<T> {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(Err(ReactorError::Unavailable)),
            sequence: Cell::new(-1),
            next_value: RefCell::new(None),
            next_sequence: Cell::new(-1),
        })
    }

    /// Queues `value` to become current at `sequence` (spec §4.5 `Set`).
    /// Only the owning `FoldReactor` calls this.
    pub(crate) fn set(&self, value: Expected<T>, sequence: i32) {
        *self.next_value.borrow_mut() = Some(value);
        self.next_sequence.set(sequence);
    }
}

impl<T: Clone + 'static> BaseReactor for FoldParameterReactor<T> {
    fn is_complete(&self) -> bool {
        false
    }

    fn commit(&self, sequence: i32) -> Update {
        if sequence == self.sequence.get() {
            return Update::Eval;
        }
        if sequence == self.next_sequence.get() {
            if let Some(value) = self.next_value.borrow_mut().take() {
                *self.value.borrow_mut() = value;
            }
            self.sequence.set(sequence);
            self.next_sequence.set(-1);
            return Update::Eval;
        }
        Update::None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Clone + 'static> Reactor<T> for FoldParameterReactor<T> {
    fn eval(&self) -> Expected<T> {
        self.value.borrow().clone()
    }
}

/// Reduces a producer's stream using a user sub-graph reading `left`
/// (previous fold result) and `right` (current producer value), spec §4.5.
///
/// The first producer value is consumed as the seed and never itself
/// emitted (spec §4.5 step 3, §8 "Fold seeding").
pub struct FoldReactor<Ev, P, T> {
    evaluation: Rc<Ev>,
    left: Rc<FoldParameterReactor<T>>,
    right: Rc<FoldParameterReactor<T>>,
    producer: Rc<P>,
    cache: CommitCache,
    value: RefCell<Expected<T>>,
    previous_value: RefCell<Option<Expected<T>>>,
}

impl<Ev, P, T> FoldReactor<Ev, P, T>
where
    Ev: Reactor<T> + 'static,
    P: Reactor<T> + 'static,
    T: Clone + 'static,
{
    pub fn new(
        evaluation: Rc<Ev>,
        left: Rc<FoldParameterReactor<T>>,
        right: Rc<FoldParameterReactor<T>>,
        producer: Rc<P>,
    ) -> Rc<Self> {
        Rc::new(Self {
            evaluation,
            left,
            right,
            producer,
            cache: CommitCache::default(),
            value: RefCell::new(Err(ReactorError::Unavailable)),
            previous_value: RefCell::new(None),
        })
    }
}

/// Builds a `FoldReactor` the way spec §9's design note prescribes:
/// construct the parameters first, hand them to `build_evaluation` to get
/// the evaluation sub-graph, then assemble the fold around all three plus
/// the producer.
pub fn make_fold<Ev, P, T>(
    build_evaluation: impl FnOnce(Rc<FoldParameterReactor<T>>, Rc<FoldParameterReactor<T>>) -> Rc<Ev>,
    producer: Rc<P>,
) -> Rc<FoldReactor<Ev, P, T>>
where
    Ev: Reactor<T> + 'static,
    P: Reactor<T> + 'static,
    T: Clone + 'static,
{
    let left = FoldParameterReactor::new();
    let right = FoldParameterReactor::new();
    let evaluation = build_evaluation(left.clone(), right.clone());
    FoldReactor::new(evaluation, left, right, producer)
}

impl<Ev, P, T> BaseReactor for FoldReactor<Ev, P, T>
where
    Ev: Reactor<T> + 'static,
    P: Reactor<T> + 'static,
    T: Clone + 'static,
{
    fn is_complete(&self) -> bool {
        self.cache.is_complete()
    }

    fn commit(&self, sequence: i32) -> Update {
        if let Some(update) = self.cache.precheck(sequence) {
            return update;
        }
        let producer_update = self.producer.commit(sequence);
        match producer_update {
            Update::None => {
                self.cache.record(sequence, Update::None);
                Update::None
            },
            Update::Complete => {
                self.cache.record(sequence, Update::Complete);
                Update::Complete
            },
            Update::Eval => {
                if self.previous_value.borrow().is_none() {
                    // First tick: seed, emit nothing (spec §4.5 step 3). The
                    // seed sequence is still cached (unlike an ordinary
                    // `NONE`) so a repeat `Commit` at this sequence replays
                    // `NONE` instead of re-seeding as a reduction step.
                    *self.previous_value.borrow_mut() = Some(self.producer.eval());
                    self.cache.record_seed(sequence);
                    return Update::None;
                }
                let previous = self.previous_value.borrow().clone().unwrap();
                self.left.set(previous, sequence);
                let current = self.producer.eval();
                self.right.set(current, sequence);
                let eval_update = self.evaluation.commit(sequence);
                let outcome = match eval_update {
                    Update::Eval => {
                        let value = self.evaluation.eval();
                        *self.value.borrow_mut() = value.clone();
                        *self.previous_value.borrow_mut() = Some(value);
                        Update::Eval
                    },
                    Update::Complete => Update::Complete,
                    Update::None => Update::None,
                };
                self.cache.record(sequence, outcome);
                outcome
            },
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<Ev, P, T> Reactor<T> for FoldReactor<Ev, P, T>
where
    Ev: Reactor<T> + 'static,
    P: Reactor<T> + 'static,
    T: Clone + 'static,
{
    fn eval(&self) -> Expected<T> {
        if !self.cache.has_value() {
            return Err(ReactorError::Unavailable);
        }
        self.value.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{basic::BasicReactor, function::FunctionReactor2};

    fn sum_fold(producer: Rc<BasicReactor<i32>>) -> Rc<impl Reactor<i32>> {
        make_fold(
            |left, right| FunctionReactor2::new(|l: i32, r: i32| Ok(Some(l + r)), left, right),
            producer,
        )
    }

    #[test]
    fn sum_fold_seeds_then_reduces() {
        let (producer, handle) = BasicReactor::<i32>::new();
        let fold = sum_fold(producer);

        handle.update(1);
        assert_eq!(fold.commit(1), Update::None); // seed

        handle.update(2);
        assert_eq!(fold.commit(2), Update::Eval);
        assert_eq!(fold.eval().unwrap(), 3);

        handle.update(3);
        assert_eq!(fold.commit(3), Update::Eval);
        assert_eq!(fold.eval().unwrap(), 6);

        handle.update(4);
        assert_eq!(fold.commit(4), Update::Eval);
        assert_eq!(fold.eval().unwrap(), 10);
    }

    #[test]
    fn completes_before_any_seed_means_unavailable() {
        let (producer, handle) = BasicReactor::<i32>::new();
        let fold = sum_fold(producer);
        handle.set_complete();
        assert_eq!(fold.commit(1), Update::Complete);
        assert!(fold.is_complete());
        assert!(matches!(fold.eval(), Err(ReactorError::Unavailable)));
    }

    #[test]
    fn replay_at_zero_after_a_reduction() {
        let (producer, handle) = BasicReactor::<i32>::new();
        let fold = sum_fold(producer);
        handle.update(1);
        fold.commit(1);
        handle.update(2);
        assert_eq!(fold.commit(2), Update::Eval);
        assert_eq!(fold.commit(0), Update::Eval);
        assert_eq!(fold.eval().unwrap(), 3);
    }
}
