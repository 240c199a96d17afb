// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `MultiReactor<F>` (spec §4.4, §9 "Dynamic child vectors"): applies a
//! function over a runtime-sized vector of heterogeneous children.
//!
//! Grounded directly on
//! `examples/original_source/Beam/Include/Beam/Reactors/MultiReactor.hpp`:
//! children are held as `Rc<dyn BaseReactor>` (the Rust analogue of
//! `shared_ptr<BaseReactor>`), and the user function recovers concrete
//! values with [`crate::base::eval_typed`] rather than a C++
//! `dynamic_pointer_cast`.

use crate::{
    base::{BaseReactor, CommitCache, Reactor},
    error::{capture, Expected, ReactorError},
    update::Update,
};
use std::{any::Any, cell::Cell, cell::RefCell, rc::Rc};

/// Applies `function` whenever any child in `children` ticks (spec §4.4).
///
/// The empty-children case (spec §9/`SPEC_FULL.md` §E, present in the
/// original but not spelled out in spec.md's prose) is implemented exactly
/// as the original: an empty `MultiReactor` evaluates exactly once, on the
/// replay probe `Commit(0)`, and is `None` on every other sequence.
pub struct MultiReactor<F, T> {
    function: F,
    children: Vec<Rc<dyn BaseReactor>>,
    initialized: RefCell<Vec<bool>>,
    initialization_count: Cell<usize>,
    cache: CommitCache,
    value: RefCell<Expected<T>>,
}

impl<F, T> MultiReactor<F, T>
where
    F: Fn(&[Rc<dyn BaseReactor>]) -> anyhow::Result<Option<T>> + 'static,
    T: Clone + 'static,
{
    pub fn new(function: F, children: Vec<Rc<dyn BaseReactor>>) -> Rc<Self> {
        let initialized = vec![false; children.len()];
        Rc::new(Self {
            function,
            children,
            initialized: RefCell::new(initialized),
            initialization_count: Cell::new(0),
            cache: CommitCache::default(),
            value: RefCell::new(Err(ReactorError::Unavailable)),
        })
    }

    fn ensure_initialized(&self, sequence: i32) -> bool {
        if self.initialization_count.get() == self.children.len() {
            return true;
        }
        let mut flags = self.initialized.borrow_mut();
        let mut count = 0;
        for (child, flag) in self.children.iter().zip(flags.iter_mut()) {
            if !*flag && !child.commit(sequence).is_none() {
                *flag = true;
            }
            if *flag {
                count += 1;
            }
        }
        self.initialization_count.set(count);
        count == self.children.len()
    }
}

impl<F, T> BaseReactor for MultiReactor<F, T>
where
    F: Fn(&[Rc<dyn BaseReactor>]) -> anyhow::Result<Option<T>> + 'static,
    T: Clone + 'static,
{
    fn is_complete(&self) -> bool {
        self.cache.is_complete()
    }

    fn commit(&self, sequence: i32) -> Update {
        if let Some(update) = self.cache.precheck(sequence) {
            return update;
        }
        if self.children.is_empty() {
            let aggregated = if sequence == 0 {
                Update::Eval
            } else {
                Update::None
            };
            if aggregated.is_none() {
                self.cache.record(sequence, Update::None);
                return Update::None;
            }
            let outcome = self.evaluate_and_complete(aggregated, true, true);
            self.cache.record(sequence, outcome);
            return outcome;
        }
        if !self.ensure_initialized(sequence) {
            self.cache.record(sequence, Update::None);
            return Update::None;
        }
        let mut any_eval = false;
        for child in &self.children {
            let u = child.commit(sequence);
            any_eval |= u.is_eval();
        }
        // A child that went permanently complete on an earlier tick replays
        // `NONE` on every later commit (`CommitCache`'s `is_complete`
        // short-circuit), so termination must be read from each child's
        // sticky `is_complete()`, not from whether *this* tick's commit
        // literally returned `Complete` for every child at once —
        // independent children essentially never complete on the same
        // sequence.
        let all_children_complete = self.children.iter().all(|c| c.is_complete());
        let aggregated = if any_eval {
            Update::Eval
        } else if all_children_complete {
            Update::Complete
        } else {
            Update::None
        };
        if aggregated.is_none() {
            self.cache.record(sequence, Update::None);
            return Update::None;
        }
        let outcome = self.evaluate_and_complete(aggregated, false, all_children_complete);
        self.cache.record(sequence, outcome);
        outcome
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<F, T> MultiReactor<F, T>
where
    F: Fn(&[Rc<dyn BaseReactor>]) -> anyhow::Result<Option<T>> + 'static,
    T: Clone + 'static,
{
    /// Runs the function on an `Eval` aggregation, applies the
    /// optional-result filter, and checks whether every child has gone
    /// permanently complete (spec §4.4 rules 3-5). `all_children_complete`
    /// is computed by the caller (after committing every child for this
    /// tick) rather than recomputed here.
    fn evaluate_and_complete(
        &self,
        aggregated: Update,
        children_empty: bool,
        all_children_complete: bool,
    ) -> Update {
        let outcome = if aggregated.is_eval() {
            let children = &self.children;
            let result: Expected<Option<T>> = capture(|| (self.function)(children));
            match result {
                Ok(Some(value)) => {
                    *self.value.borrow_mut() = Ok(value);
                    Update::Eval
                },
                Ok(None) => {
                    if children_empty {
                        Update::Complete
                    } else {
                        Update::None
                    }
                },
                Err(error) => {
                    *self.value.borrow_mut() = Err(error);
                    Update::Eval
                },
            }
        } else {
            Update::Complete
        };
        if children_empty || all_children_complete {
            self.cache.mark_complete();
        }
        outcome
    }
}

impl<F, T> Reactor<T> for MultiReactor<F, T>
where
    F: Fn(&[Rc<dyn BaseReactor>]) -> anyhow::Result<Option<T>> + 'static,
    T: Clone + 'static,
{
    fn eval(&self) -> Expected<T> {
        if !self.cache.has_value() {
            return Err(ReactorError::Unavailable);
        }
        self.value.borrow().clone()
    }
}
