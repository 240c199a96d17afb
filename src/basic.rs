// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! `BasicReactor<T>` (spec §4.3): a buffered source driven by producers on
//! any thread, committed by the single driver thread.

use crate::{
    base::{BaseReactor, CommitCache, Reactor},
    error::{CapturedError, Expected, ReactorError},
    update::Update,
};
use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    sync::Arc,
};

/// Governs `BasicReactor`'s internal producer→driver handover queue
/// (`SPEC_FULL.md` §C), grounded in the teacher's `channel` crate ("an
/// implementation of a channel with configurable QoS").
#[derive(Debug, Clone, Copy)]
pub struct BasicReactorConfig {
    capacity: Option<usize>,
}

impl BasicReactorConfig {
    /// The queue grows without bound (the default).
    pub fn unbounded() -> Self {
        Self { capacity: None }
    }

    /// Once `capacity` buffered items are pending, a further `update()` drops
    /// the oldest buffered item to make room for the newest. This never
    /// changes what `Commit` observes other than which values are skipped:
    /// it still dequeues exactly one item per tick, in order.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
        }
    }
}

impl Default for BasicReactorConfig {
    fn default() -> Self {
        Self::unbounded()
    }
}

enum Item<T> {
    Value(T),
    CompleteWithError(ReactorError),
    Complete,
}

struct Inner<T> {
    queue: parking_lot::Mutex<VecDeque<Item<T>>>,
    config: BasicReactorConfig,
}

impl<T> Inner<T> {
    fn push(&self, item: Item<T>) {
        let mut queue = self.queue.lock();
        queue.push_back(item);
        if let Some(capacity) = self.config.capacity {
            while queue.len() > capacity {
                queue.pop_front();
            }
        }
    }
}

/// A cheaply clonable, `Send + Sync` handle producers use to feed a
/// `BasicReactor` from any thread, independent of the `Rc`-held reactor node
/// itself (which the single-threaded driver owns). Mirrors the
/// sender/receiver split of the teacher's `channel` crate.
pub struct BasicReactorHandle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BasicReactorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> BasicReactorHandle<T> {
    /// Enqueues a new value (spec §4.3 `Update`).
    pub fn update(&self, value: T) {
        tracing::trace!(
            type_name = std::any::type_name::<T>(),
            "basic reactor value enqueued"
        );
        self.inner.push(Item::Value(value));
    }

    /// Enqueues a terminal marker with no final value (spec §4.3
    /// `SetComplete()`).
    pub fn set_complete(&self) {
        tracing::trace!("basic reactor completed without a final value");
        self.inner.push(Item::Complete);
    }

    /// Enqueues a terminal marker carrying an error as the final value
    /// (spec §4.3 `SetComplete(error)`, spec §7.3).
    pub fn set_complete_with_error(&self, error: impl Into<anyhow::Error>) {
        tracing::trace!("basic reactor completed with an error");
        self.inner.push(Item::CompleteWithError(ReactorError::Eval(
            CapturedError::new(error.into()),
        )));
    }
}

/// Buffered source fed externally (spec §4.3).
pub struct BasicReactor<T> {
    inner: Arc<Inner<T>>,
    current_value: RefCell<Expected<T>>,
    /// Set when a `CompleteWithError` item was just dequeued: the error was
    /// reported as this tick's `Eval`, so the *next* commit must report
    /// `Complete` unconditionally, without consulting the queue again (the
    /// same "one more tick" shape as `ConstantReactor`).
    pending_terminal: Cell<bool>,
    cache: CommitCache,
}

impl<T: Clone + Send + 'static> BasicReactor<T> {
    /// Builds an unbounded `BasicReactor` and its producer-side handle.
    pub fn new() -> (Rc<Self>, BasicReactorHandle<T>) {
        Self::with_config(BasicReactorConfig::default())
    }

    pub fn with_config(config: BasicReactorConfig) -> (Rc<Self>, BasicReactorHandle<T>) {
        let inner = Arc::new(Inner {
            queue: parking_lot::Mutex::new(VecDeque::new()),
            config,
        });
        let reactor = Rc::new(Self {
            inner: inner.clone(),
            current_value: RefCell::new(Err(ReactorError::Unavailable)),
            pending_terminal: Cell::new(false),
            cache: CommitCache::default(),
        });
        (reactor, BasicReactorHandle { inner })
    }

    /// Convenience mirroring spec §6's `BasicReactor<T>::Update`, for
    /// single-threaded callers that already hold the `Rc`.
    pub fn update(&self, value: T) {
        BasicReactorHandle {
            inner: self.inner.clone(),
        }
        .update(value);
    }

    pub fn set_complete(&self) {
        BasicReactorHandle {
            inner: self.inner.clone(),
        }
        .set_complete();
    }

    pub fn set_complete_with_error(&self, error: impl Into<anyhow::Error>) {
        BasicReactorHandle {
            inner: self.inner.clone(),
        }
        .set_complete_with_error(error);
    }
}

impl<T: Clone + Send + 'static> BaseReactor for BasicReactor<T> {
    fn is_complete(&self) -> bool {
        self.cache.is_complete()
    }

    fn commit(&self, sequence: i32) -> Update {
        if let Some(update) = self.cache.precheck(sequence) {
            return update;
        }
        if self.pending_terminal.replace(false) {
            self.cache.record(sequence, Update::Complete);
            return Update::Complete;
        }
        let item = self.inner.queue.lock().pop_front();
        let update = match item {
            None => Update::None,
            Some(Item::Value(value)) => {
                *self.current_value.borrow_mut() = Ok(value);
                Update::Eval
            },
            Some(Item::CompleteWithError(error)) => {
                *self.current_value.borrow_mut() = Err(error);
                self.pending_terminal.set(true);
                Update::Eval
            },
            Some(Item::Complete) => Update::Complete,
        };
        self.cache.record(sequence, update);
        update
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Clone + Send + 'static> Reactor<T> for BasicReactor<T> {
    fn eval(&self) -> Expected<T> {
        if !self.cache.has_value() {
            return Err(ReactorError::Unavailable);
        }
        self.current_value.borrow().clone()
    }
}
