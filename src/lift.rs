// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `Lift` (spec §4.6): coerce a plain value into a constant reactor so that
//! combinator factories can treat plain values and reactor children
//! uniformly.
//!
//! The original is a template-overloaded free function that inspects
//! whether its argument is already a Reactor. Rust has no specialization on
//! stable, so a blanket `impl<T> From<T> for Lifted<T>` alongside
//! `impl<T> From<Rc<dyn Reactor<T>>> for Lifted<T>` would conflict under
//! coherence (`Rc<dyn Reactor<T>>` also satisfies the fully generic `T`
//! bound). This crate keeps the same two cases spec §4.6 describes, just
//! spelled out explicitly: call `lift(v)` on a plain value before passing it
//! to a factory, and pass an existing `Rc<dyn Reactor<T>>` (or any concrete
//! reactor) unchanged.

use crate::constant::ConstantReactor;
use std::rc::Rc;

/// Wraps a plain value in a one-shot [`ConstantReactor`] (spec §4.6).
pub fn lift<T: Clone + 'static>(value: T) -> Rc<ConstantReactor<T>> {
    ConstantReactor::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{BaseReactor, Reactor};

    #[test]
    fn lift_law_matches_an_already_built_constant() {
        let lifted = lift(42);
        let built = ConstantReactor::new(42);
        assert_eq!(lifted.commit(1), built.commit(1));
        assert_eq!(lifted.eval().unwrap(), built.eval().unwrap());
    }
}
