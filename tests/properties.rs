// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Quantified invariants from spec §8, checked with `proptest` over small
//! hand-rolled reactor graphs and randomized sequences of producer pushes.

use aptos_reactors::{
    lift, make_constant, make_fold, BaseReactor, BasicReactor, FunctionReactor1, FunctionReactor2,
    Reactor, Update,
};
use proptest::prelude::*;

proptest! {
    /// Idempotence: repeated `Commit(seq)` returns the same outcome and
    /// leaves `Eval` unchanged, for any sequence of pushed values and any
    /// point we choose to re-commit at.
    #[test]
    fn idempotent_commit(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        let (producer, handle) = BasicReactor::<i32>::new();
        let doubled = FunctionReactor1::new(|x: i32| Ok(Some(x.wrapping_mul(2))), producer);

        for (i, value) in values.iter().enumerate() {
            let seq = (i + 1) as i32;
            handle.update(*value);
            let first = doubled.commit(seq);
            let second = doubled.commit(seq);
            let third = doubled.commit(seq);
            prop_assert_eq!(first, second);
            prop_assert_eq!(second, third);
            if first.is_eval() {
                let eval_a = doubled.eval();
                let eval_b = doubled.eval();
                prop_assert_eq!(eval_a.ok(), eval_b.ok());
            }
        }
    }

    /// Monotonicity: once a reactor reports `Complete` at some sequence, no
    /// later sequence ever reports `Eval` again.
    #[test]
    fn monotonic_after_complete(values in proptest::collection::vec(any::<i32>(), 0..5), extra_ticks in 1..5i32) {
        let (producer, handle) = BasicReactor::<i32>::new();
        let doubled = FunctionReactor1::new(|x: i32| Ok(Some(x.wrapping_mul(2))), producer);

        let mut seq = 0;
        for value in &values {
            seq += 1;
            handle.update(*value);
            doubled.commit(seq);
        }
        seq += 1;
        handle.set_complete();
        let complete_update = doubled.commit(seq);
        prop_assert!(complete_update.is_complete() || !complete_update.is_eval());

        for _ in 0..extra_ticks {
            seq += 1;
            let update = doubled.commit(seq);
            prop_assert!(!update.is_eval());
        }
    }

    /// Replay: after `Commit(s) == Eval` with value `v`, `Commit(0)` returns
    /// `Eval` and `Eval() == v`.
    #[test]
    fn replay_matches_last_eval(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        let (producer, handle) = BasicReactor::<i32>::new();
        let doubled = FunctionReactor1::new(|x: i32| Ok(Some(x.wrapping_mul(2))), producer);

        let mut last_value = None;
        for (i, value) in values.iter().enumerate() {
            let seq = (i + 1) as i32;
            handle.update(*value);
            if doubled.commit(seq).is_eval() {
                last_value = Some(doubled.eval().unwrap());
            }
        }
        if let Some(expected) = last_value {
            prop_assert_eq!(doubled.commit(0), Update::Eval);
            prop_assert_eq!(doubled.eval().unwrap(), expected);
        }
    }

    /// Lift law: applying a function to a plain value and to
    /// `MakeConstant(value)` are observationally equal.
    #[test]
    fn lift_law_holds(value in any::<i32>()) {
        let via_lift = FunctionReactor1::new(|x: i32| Ok(Some(x)), lift(value));
        let via_constant = FunctionReactor1::new(|x: i32| Ok(Some(x)), make_constant(value));

        prop_assert_eq!(via_lift.commit(1), via_constant.commit(1));
        prop_assert_eq!(via_lift.eval().ok(), via_constant.eval().ok());
        prop_assert_eq!(via_lift.commit(2), via_constant.commit(2));
    }

    /// Fold seeding: the first producer value is always consumed as the
    /// seed, never emitted; the fold's observable outputs are the running
    /// sum of every value after the first.
    #[test]
    fn fold_never_emits_on_the_seed_tick(values in proptest::collection::vec(any::<i32>(), 1..10)) {
        let (producer, handle) = BasicReactor::<i32>::new();
        let fold = make_fold(
            |left, right| FunctionReactor2::new(|l: i32, r: i32| Ok(Some(l.wrapping_add(r))), left, right),
            producer,
        );

        handle.update(values[0]);
        prop_assert_eq!(fold.commit(1), Update::None);

        let mut running = values[0];
        for (i, value) in values.iter().enumerate().skip(1) {
            let seq = (i + 1) as i32;
            handle.update(*value);
            prop_assert_eq!(fold.commit(seq), Update::Eval);
            running = running.wrapping_add(*value);
            prop_assert_eq!(fold.eval().unwrap(), running);
        }
    }

    /// Optional filter: a function returning `None` on a given tick always
    /// converts that tick into `Update::None`, regardless of the input.
    #[test]
    fn optional_filter_always_suppresses_none_results(values in proptest::collection::vec(any::<i32>(), 1..8)) {
        let (producer, handle) = BasicReactor::<i32>::new();
        let evens_only = FunctionReactor1::new(
            |x: i32| Ok(if x % 2 == 0 { Some(x) } else { None }),
            producer,
        );

        for (i, value) in values.iter().enumerate() {
            let seq = (i + 1) as i32;
            handle.update(*value);
            let update = evens_only.commit(seq);
            if value % 2 == 0 {
                prop_assert_eq!(update, Update::Eval);
                prop_assert_eq!(evens_only.eval().unwrap(), *value);
            } else {
                prop_assert_eq!(update, Update::None);
            }
        }
    }
}
