// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `ConstantReactor<T>` (spec §4.2): an immutable leaf.

use crate::{
    base::{BaseReactor, CommitCache, Reactor},
    error::{Expected, ReactorError},
    update::Update,
};
use std::{any::Any, rc::Rc};

/// Holds one value (or one pre-captured error) and ticks it exactly once.
///
/// The first `Commit` it ever sees returns `Eval`; every commit after that
/// returns `Complete` (then, per the shared commit cache, `None` forever
/// after). This is the choice spec §4.2 leaves open ("implementers may
/// choose"): it is also what makes the lift law testable (spec §8), since a
/// `FunctionReactor` needs at least one `Eval` tick from each child during
/// its initialization phase (spec §4.4).
pub struct ConstantReactor<T> {
    value: Expected<T>,
    cache: CommitCache,
}

impl<T: Clone + 'static> ConstantReactor<T> {
    pub fn new(value: T) -> Rc<Self> {
        Rc::new(Self {
            value: Ok(value),
            cache: CommitCache::default(),
        })
    }

    pub fn new_error(error: ReactorError) -> Rc<Self> {
        Rc::new(Self {
            value: Err(error),
            cache: CommitCache::default(),
        })
    }
}

impl<T: Clone + 'static> BaseReactor for ConstantReactor<T> {
    fn is_complete(&self) -> bool {
        self.cache.is_complete()
    }

    fn commit(&self, sequence: i32) -> Update {
        if let Some(update) = self.cache.precheck(sequence) {
            return update;
        }
        let update = if self.cache.current_sequence() == -1 {
            Update::Eval
        } else {
            Update::Complete
        };
        self.cache.record(sequence, update);
        update
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Clone + 'static> Reactor<T> for ConstantReactor<T> {
    fn eval(&self) -> Expected<T> {
        if !self.cache.has_value() {
            return Err(ReactorError::Unavailable);
        }
        self.value.clone()
    }
}
