// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `FunctionReactor` (spec §4.4): applies a user function over a fixed-arity
//! tuple of children, re-evaluating whenever any of them ticks.
//!
//! Rust has no variadic generics, so each arity is a distinct generated type
//! (`FunctionReactor1`, `FunctionReactor2`, `FunctionReactor3`) sharing one
//! macro body rather than the original's single variadic template. The
//! dynamic-arity case is [`crate::multi::MultiReactor`].
//!
//! The user function's signature is `Fn(T1, ..., Tn) -> anyhow::Result<Option<T>>`:
//! `Err` is the "function threw" case (spec §7.2, captured by
//! [`crate::error::capture`]); `Ok(None)` is the "optional-result" filter
//! (spec §4.4 rule 4, turning this tick into `Update::None`); `Ok(Some(v))`
//! is an ordinary emitted value.

use crate::{
    base::{BaseReactor, CommitCache, Reactor},
    error::{capture, Expected, ReactorError},
    update::Update,
};
use std::{any::Any, cell::Cell, cell::RefCell, rc::Rc};

macro_rules! impl_function_reactor {
    ($name:ident, $doc:literal; $($t:ident, $r:ident, $child:ident, $init:ident),+) => {
        #[doc = $doc]
        pub struct $name<F, $($t, $r,)+ T>
        where
            $($r: Reactor<$t> + 'static,)+
            F: Fn($($t),+) -> anyhow::Result<Option<T>>,
        {
            function: F,
            $($child: Rc<$r>,)+
            $($init: Cell<bool>,)+
            cache: CommitCache,
            value: RefCell<Expected<T>>,
        }

        impl<F, $($t, $r,)+ T> $name<F, $($t, $r,)+ T>
        where
            $($r: Reactor<$t> + 'static,)+
            F: Fn($($t),+) -> anyhow::Result<Option<T>>,
            T: Clone + 'static,
        {
            pub fn new(function: F, $($child: Rc<$r>),+) -> Rc<Self> {
                Rc::new(Self {
                    function,
                    $($child,)+
                    $($init: Cell::new(false),)+
                    cache: CommitCache::default(),
                    value: RefCell::new(Err(ReactorError::Unavailable)),
                })
            }

            /// Spec §4.4 rule 1: a child counts as initialized the first
            /// commit at `sequence` that returns anything other than
            /// `None`. See `DESIGN.md` for why this deliberately drops the
            /// original's extra `Commit(0)` probe before `Commit(seq)`.
            fn initialize(&self, sequence: i32) -> bool {
                $(
                    if !self.$init.get() && !self.$child.commit(sequence).is_none() {
                        self.$init.set(true);
                    }
                )+
                true $(&& self.$init.get())+
            }
        }

        impl<F, $($t: 'static, $r,)+ T> BaseReactor for $name<F, $($t, $r,)+ T>
        where
            $($r: Reactor<$t> + 'static,)+
            F: Fn($($t),+) -> anyhow::Result<Option<T>> + 'static,
            T: Clone + 'static,
        {
            fn is_complete(&self) -> bool {
                self.cache.is_complete()
            }

            fn commit(&self, sequence: i32) -> Update {
                if let Some(update) = self.cache.precheck(sequence) {
                    return update;
                }
                if !self.initialize(sequence) {
                    self.cache.record(sequence, Update::None);
                    return Update::None;
                }
                let mut any_eval = false;
                $(
                    let u = self.$child.commit(sequence);
                    any_eval |= u.is_eval();
                )+
                // A child that went permanently complete on an earlier tick
                // replays `NONE` on every later commit (`CommitCache`'s
                // `is_complete` short-circuit), so termination must be
                // read from each child's sticky `is_complete()`, not from
                // whether *this* tick's commit literally returned
                // `Complete` for every child at once — independent children
                // essentially never complete on the same sequence.
                let all_children_complete = true $(&& self.$child.is_complete())+;
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
                let outcome = if aggregated.is_eval() {
                    let result: Expected<Option<T>> = capture(|| {
                        $(
                            let $child = self.$child.eval().map_err(anyhow::Error::from)?;
                        )+
                        (self.function)($($child),+)
                    });
                    match result {
                        Ok(Some(value)) => {
                            *self.value.borrow_mut() = Ok(value);
                            Update::Eval
                        },
                        Ok(None) => Update::None,
                        Err(error) => {
                            *self.value.borrow_mut() = Err(error);
                            Update::Eval
                        },
                    }
                } else {
                    Update::Complete
                };
                if all_children_complete {
                    self.cache.mark_complete();
                }
                self.cache.record(sequence, outcome);
                outcome
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl<F, $($t: 'static, $r,)+ T> Reactor<T> for $name<F, $($t, $r,)+ T>
        where
            $($r: Reactor<$t> + 'static,)+
            F: Fn($($t),+) -> anyhow::Result<Option<T>> + 'static,
            T: Clone + 'static,
        {
            fn eval(&self) -> Expected<T> {
                if !self.cache.has_value() {
                    return Err(ReactorError::Unavailable);
                }
                self.value.borrow().clone()
            }
        }
    };
}

impl_function_reactor!(
    FunctionReactor1, "Applies a function to one child reactor.";
    T1, R1, child1, init1
);
impl_function_reactor!(
    FunctionReactor2, "Applies a function to two child reactors.";
    T1, R1, child1, init1,
    T2, R2, child2, init2
);
impl_function_reactor!(
    FunctionReactor3, "Applies a function to three child reactors.";
    T1, R1, child1, init1,
    T2, R2, child2, init2,
    T3, R3, child3, init3
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{basic::BasicReactor, constant::ConstantReactor};

    #[test]
    fn sum_fold_style_application_over_two_sources() {
        let (a, a_handle) = BasicReactor::<i32>::new();
        let (b, b_handle) = BasicReactor::<i32>::new();
        let reactor = FunctionReactor2::new(|x: i32, y: i32| Ok(Some(x * y)), a, b);

        a_handle.update(10);
        b_handle.update(1);
        assert_eq!(reactor.commit(1), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 10);

        a_handle.update(20);
        assert_eq!(reactor.commit(2), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 20);

        b_handle.update(2);
        assert_eq!(reactor.commit(3), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 40);

        b_handle.update(3);
        assert_eq!(reactor.commit(4), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 60);
    }

    #[test]
    fn error_from_user_function_propagates() {
        let constant = ConstantReactor::new(7);
        let reactor = FunctionReactor1::new(
            |_: i32| -> anyhow::Result<Option<i32>> { anyhow::bail!("boom") },
            constant,
        );
        assert_eq!(reactor.commit(1), Update::Eval);
        assert!(reactor.eval().is_err());
    }

    #[test]
    fn optional_filter_skips_odd_ticks() {
        let (producer, handle) = BasicReactor::<i32>::new();
        let reactor = FunctionReactor1::new(
            |x: i32| Ok(if x % 2 == 0 { Some(x) } else { None }),
            producer,
        );
        handle.update(1);
        assert_eq!(reactor.commit(1), Update::None);
        handle.update(2);
        assert_eq!(reactor.commit(2), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 2);
        handle.update(3);
        assert_eq!(reactor.commit(3), Update::None);
        handle.update(4);
        assert_eq!(reactor.commit(4), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 4);
    }

    #[test]
    fn completes_once_both_children_complete_even_at_different_sequences() {
        let (a, a_handle) = BasicReactor::<i32>::new();
        let (b, b_handle) = BasicReactor::<i32>::new();
        let reactor = FunctionReactor2::new(|x: i32, y: i32| Ok(Some(x + y)), a, b);

        a_handle.update(1);
        b_handle.update(2);
        assert_eq!(reactor.commit(1), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 3);

        // `a` completes first; `b` keeps ticking for a while longer.
        a_handle.set_complete();
        b_handle.update(5);
        assert_eq!(reactor.commit(2), Update::Eval);
        assert!(!reactor.is_complete());

        b_handle.update(6);
        assert_eq!(reactor.commit(3), Update::Eval);
        assert!(!reactor.is_complete());

        // Only once `b` also completes does the combined reactor terminate.
        b_handle.set_complete();
        assert_eq!(reactor.commit(4), Update::Complete);
        assert!(reactor.is_complete());
    }

    #[test]
    fn replay_after_a_none_tick_still_reports_the_last_value() {
        let (producer, handle) = BasicReactor::<i32>::new();
        let reactor = FunctionReactor1::new(
            |x: i32| Ok(if x % 2 == 0 { Some(x) } else { None }),
            producer,
        );
        handle.update(2);
        assert_eq!(reactor.commit(1), Update::Eval);
        handle.update(3);
        assert_eq!(reactor.commit(2), Update::None);
        // The `NONE` tick must not have been cached as the current sequence:
        // the replay probe still sees the last real value, not a spurious
        // "complete, no value" reply.
        assert_eq!(reactor.commit(0), Update::Eval);
        assert_eq!(reactor.eval().unwrap(), 2);
    }
}
