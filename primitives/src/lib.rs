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

pub mod arbos;
pub mod block;
pub mod chain_config;
pub mod db;
pub mod error;
pub mod genesis;
pub mod loader;
pub mod mpt;
pub mod observer;
pub mod processor;
pub mod reader;

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

pub use error::{FatalError, GenesisError, ReaderError};
pub use processor::{calculate_state_root, GenesisProcessor};

/// Code and storage of a contract account present at genesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    /// The deployed runtime bytecode.
    pub code: Bytes,

    /// The contract's storage slots. Zero values are allowed and leave the slot empty.
    #[serde(default)]
    pub storage: BTreeMap<B256, B256>,
}

/// Marks an account as a batch poster's aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorInfo {
    /// The address the poster's fees are paid to.
    pub fee_collector: Address,
}

/// An account present at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub address: Address,

    #[serde(default)]
    pub balance: U256,

    #[serde(default)]
    pub nonce: u64,

    #[serde(default)]
    pub contract_info: Option<ContractInfo>,

    #[serde(default)]
    pub aggregator_info: Option<AggregatorInfo>,
}

/// A retryable ticket carried over into the new chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryableRecord {
    /// The ticket id, compared as a big-endian integer when ordering tickets.
    pub id: B256,

    /// The timestamp the ticket expires at.
    pub timeout: u64,

    pub from: Address,

    /// The destination of the call. [None] and the zero address both mean contract creation.
    #[serde(default)]
    pub to: Option<Address>,

    #[serde(default)]
    pub callvalue: U256,

    /// Receives the call value if the ticket has already expired.
    pub beneficiary: Address,

    #[serde(default)]
    pub calldata: Bytes,
}

/// The in-memory form of a chain's initialization data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationInfo {
    pub chain_owner: Address,

    #[serde(default)]
    pub address_table: Vec<Address>,

    #[serde(default)]
    pub retryables: Vec<RetryableRecord>,

    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}
