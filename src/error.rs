// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the Reactors core (see spec §7 / `SPEC_FULL.md` §B).

use std::{panic::AssertUnwindSafe, sync::Arc};

/// The three error kinds a reactor can surface:
/// - a reactor with no value is read (`Unavailable`);
/// - a user-applied function raised an error or panicked;
/// - a producer explicitly completed a `BasicReactor` with an error.
///
/// The latter two are both represented by `Eval`: downstream of capture, a
/// user-function error and a producer error are indistinguishable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReactorError {
    #[error("reactor unavailable: no value has been committed yet")]
    Unavailable,
    #[error(transparent)]
    Eval(#[from] CapturedError),
}

/// An error captured from user code, shared via `Arc` so that replaying a
/// cached `EVAL` (via `Commit(0)` or repeated `Commit(seq)`) never re-runs or
/// discards the original failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error(transparent)]
pub struct CapturedError(Arc<anyhow::Error>);

impl CapturedError {
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

/// The result container stored inside every reactor (spec §3 `Expected<T>`).
pub type Expected<T> = Result<T, ReactorError>;

/// Runs a user closure, turning both a returned `Err` and an unwinding panic
/// into an `Expected`, per spec §9 "Exceptions-as-values". This is the single
/// try/capture boundary every combinator funnels user code through.
pub fn capture<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Expected<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            tracing::warn!(error = %error, "reactor function raised an error");
            Err(ReactorError::Eval(CapturedError::new(error)))
        },
        Err(panic) => {
            let message = panic_message(&panic);
            tracing::warn!(message = %message, "reactor function panicked");
            Err(ReactorError::Eval(CapturedError::new(anyhow::anyhow!(
                "reactor function panicked: {message}"
            ))))
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
