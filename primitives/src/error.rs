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

use alloy_primitives::Address;
use thiserror::Error;

/// Errors surfaced by an input record stream.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// A record could not be decoded.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// `get_next` was called on an exhausted stream.
    #[error("no more records")]
    Exhausted,

    /// The stream was used after it had been closed.
    #[error("reader already closed")]
    Closed,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A failure the genesis build cannot recover from. These indicate a broken environment rather
/// than bad input, and adapters report them through a separate channel.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("unsupported initial ArbOS version {version} (supported: 1..={max})")]
    UnsupportedArbosVersion { version: u64, max: u64 },

    #[error("init message chain id {message} does not match chain config chain id {config}")]
    ChainIdMismatch { message: u64, config: u64 },

    #[error("failed to initialize protocol state: {0}")]
    ProtocolState(String),
}

/// Errors returned by the genesis build.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("failed to read init data: {0}")]
    Reader(#[from] ReaderError),

    /// The environment handed us state that contradicts the build's preconditions.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("address table slot mismatch: expected {expected}, got {actual}")]
    SlotMismatch { expected: u64, actual: u64 },

    #[error("balance overflow crediting account {0}")]
    BalanceOverflow(Address),

    #[error("batch poster {0} already exists")]
    PosterExists(Address),

    #[error("batch poster {0} does not exist")]
    PosterNotFound(Address),

    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("fatal: {0}")]
    Fatal(#[from] FatalError),
}

impl GenesisError {
    /// Returns whether this error belongs to the unrecoverable setup channel.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenesisError::Fatal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_channel() {
        let err: GenesisError = FatalError::ChainIdMismatch {
            message: 1,
            config: 2,
        }
        .into();
        assert!(err.is_fatal());
        assert!(!GenesisError::SlotMismatch {
            expected: 0,
            actual: 1
        }
        .is_fatal());
        assert!(!GenesisError::from(ReaderError::Exhausted).is_fatal());
    }
}
