// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Incremental, pull-driven, sequence-number-synchronised dataflow reactors.
//!
//! A [`Reactor`] is a node that, given a monotonically increasing sequence
//! number, reports whether it has a new value, is complete, or is unchanged,
//! and on demand produces its current value. A [`Driver`] issues sequence
//! numbers and walks root reactors; each reactor recursively commits its
//! children. See `DESIGN.md` for how each piece is grounded.
//!
//! ```
//! use aptos_reactors::{BasicReactor, FunctionReactor2, BaseReactor, Reactor as _};
//!
//! let (a, a_handle) = BasicReactor::<i32>::new();
//! let (b, b_handle) = BasicReactor::<i32>::new();
//! let product = FunctionReactor2::new(|x: i32, y: i32| Ok(Some(x * y)), a, b);
//!
//! a_handle.update(10);
//! b_handle.update(2);
//! assert!(product.commit(1).is_eval());
//! assert_eq!(product.eval().unwrap(), 20);
//! ```

mod base;
mod basic;
mod constant;
mod driver;
mod error;
mod fold;
mod function;
mod lift;
mod multi;
mod update;

pub use base::{eval_typed, BaseReactor, Reactor};
pub use basic::{BasicReactor, BasicReactorConfig, BasicReactorHandle};
pub use constant::ConstantReactor;
pub use driver::{Driver, SharedSequenceCounter, Trigger};
pub use error::{capture, CapturedError, Expected, ReactorError};
pub use fold::{make_fold, FoldParameterReactor, FoldReactor};
pub use function::{FunctionReactor1, FunctionReactor2, FunctionReactor3};
pub use lift::lift;
pub use multi::MultiReactor;
pub use update::Update;

/// `MakeConstant(v)` (spec §6): wraps a plain value in a one-shot reactor.
pub fn make_constant<T: Clone + 'static>(value: T) -> std::rc::Rc<ConstantReactor<T>> {
    ConstantReactor::new(value)
}

/// `MakeBasic<T>()` (spec §6): builds a buffered, externally fed source and
/// its producer-side handle.
pub fn make_basic<T: Clone + Send + 'static>() -> (std::rc::Rc<BasicReactor<T>>, BasicReactorHandle<T>)
{
    BasicReactor::new()
}

/// `MakeFoldParameter<T>()` (spec §6): builds an internal fold placeholder.
pub fn make_fold_parameter<T: Clone + 'static>() -> std::rc::Rc<FoldParameterReactor<T>> {
    FoldParameterReactor::new()
}
