// This code is modified from the original implementation of Zeth.
//
// Reference: https://github.com/risc0/zeth
//
// Copyright 2023 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

use alloy_primitives::B256;
use revm::db::InMemoryDB;
use tracing::{debug, enabled, info, Level};

use crate::db::InMemoryDBHelper;

/// The phases of a genesis build, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ProtocolState,
    ChainOwner,
    AddressTable,
    Retryables,
    Accounts,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ProtocolState => "protocol state",
            Phase::ChainOwner => "chain owner",
            Phase::AddressTable => "address table",
            Phase::Retryables => "retryables",
            Phase::Accounts => "accounts",
        };
        f.write_str(name)
    }
}

/// What an observer sees once a phase has completed.
pub struct PhaseReport<'a> {
    pub phase: Phase,
    db: &'a InMemoryDB,
}

impl<'a> PhaseReport<'a> {
    pub(crate) fn new(phase: Phase, db: &'a InMemoryDB) -> Self {
        Self { phase, db }
    }

    /// The number of accounts touched so far.
    pub fn touched_accounts(&self) -> usize {
        self.db.accounts.len()
    }

    /// Computes the root of the state built so far. This is a full trie hash and is not cached.
    pub fn intermediate_root(&self) -> B256 {
        self.db.state_root()
    }
}

/// Receives a report after each phase of a build.
pub trait PhaseObserver {
    fn on_phase(&mut self, report: &PhaseReport<'_>);
}

impl PhaseObserver for () {
    fn on_phase(&mut self, _report: &PhaseReport<'_>) {}
}

impl<F> PhaseObserver for F
where
    F: FnMut(&PhaseReport<'_>),
{
    fn on_phase(&mut self, report: &PhaseReport<'_>) {
        self(report)
    }
}

/// Logs each phase, and its intermediate root when debug logging is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PhaseObserver for TracingObserver {
    fn on_phase(&mut self, report: &PhaseReport<'_>) {
        info!(phase = %report.phase, accounts = report.touched_accounts(), "phase complete");
        if enabled!(Level::DEBUG) {
            debug!(phase = %report.phase, root = %report.intermediate_root(), "intermediate root");
        }
    }
}
