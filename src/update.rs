// Copyright © Aptos Foundation
// Parts of the project are originally copyright © Meta Platforms, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The tri-state outcome of a `Commit` (spec §3).

/// Outcome of committing a reactor to a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// No change at this sequence.
    None,
    /// A fresh value (or a newly captured error) is available via `Eval`.
    Eval,
    /// The reactor has terminated. A terminating tick that also carries a
    /// final value is still reported as `Eval`; `Complete` is only returned
    /// once the reactor has nothing further, ever, including on replay.
    Complete,
}

impl Update {
    pub fn is_none(self) -> bool {
        matches!(self, Update::None)
    }

    pub fn is_eval(self) -> bool {
        matches!(self, Update::Eval)
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Update::Complete)
    }
}
