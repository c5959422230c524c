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

use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use alloy_rlp_derive::RlpEncodable;
use serde::{Deserialize, Serialize};

use crate::arbos::l2_pricing::{GETH_BLOCK_GAS_LIMIT, INITIAL_BASE_FEE_WEI};
use crate::chain_config::ChainConfig;
use crate::mpt::{keccak, EMPTY_LIST_HASH, EMPTY_ROOT};

/// A block header as hashed by the chain. Field order is the RLP order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, RlpEncodable)]
#[serde(rename_all = "camelCase")]
pub struct GenesisHeader {
    pub parent_hash: B256,
    pub ommers_hash: B256,
    pub beneficiary: Address,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub mix_hash: B256,
    pub nonce: B64,
    pub base_fee_per_gas: u64,
}

impl GenesisHeader {
    /// Computes the block hash. Not cached.
    pub fn hash_slow(&self) -> B256 {
        keccak(alloy_rlp::encode(self))
    }
}

/// Rollup metadata carried in the `extra_data` and `mix_hash` fields of a header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    pub send_root: B256,
    pub send_count: u64,
    pub l1_block_number: u64,
    pub arbos_format_version: u64,
}

impl HeaderInfo {
    /// Packs the counters into a mix hash: send count, L1 block number and ArbOS version as
    /// big-endian words in the first 24 bytes.
    pub fn mix_hash(&self) -> B256 {
        let mut mix = B256::ZERO;
        mix[0..8].copy_from_slice(&self.send_count.to_be_bytes());
        mix[8..16].copy_from_slice(&self.l1_block_number.to_be_bytes());
        mix[16..24].copy_from_slice(&self.arbos_format_version.to_be_bytes());
        mix
    }

    pub fn apply(&self, header: &mut GenesisHeader) {
        header.extra_data = Bytes::copy_from_slice(self.send_root.as_slice());
        header.mix_hash = self.mix_hash();
    }

    /// Reads the info back out of a header, if it carries one.
    pub fn from_header(header: &GenesisHeader) -> Option<Self> {
        if header.extra_data.len() != 32 {
            return None;
        }
        let word = |range: std::ops::Range<usize>| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&header.mix_hash[range]);
            u64::from_be_bytes(bytes)
        };
        Some(Self {
            send_root: B256::from_slice(&header.extra_data),
            send_count: word(0..8),
            l1_block_number: word(8..16),
            arbos_format_version: word(16..24),
        })
    }
}

/// The genesis block. It carries no transactions, receipts or ommers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBlock {
    pub header: GenesisHeader,
}

impl GenesisBlock {
    pub fn hash(&self) -> B256 {
        self.header.hash_slow()
    }
}

/// Assembles the genesis block on top of `state_root`.
pub fn make_genesis_block(
    parent_hash: B256,
    block_number: u64,
    timestamp: u64,
    state_root: B256,
    chain_config: &ChainConfig,
) -> GenesisBlock {
    let mut header = GenesisHeader {
        parent_hash,
        ommers_hash: EMPTY_LIST_HASH,
        beneficiary: Address::ZERO,
        state_root,
        transactions_root: EMPTY_ROOT,
        receipts_root: EMPTY_ROOT,
        logs_bloom: Bloom::ZERO,
        difficulty: U256::from(1),
        number: block_number,
        gas_limit: GETH_BLOCK_GAS_LIMIT,
        gas_used: 0,
        timestamp,
        extra_data: Bytes::new(),
        mix_hash: B256::ZERO,
        // The genesis block reads the init message.
        nonce: B64::from(1u64.to_be_bytes()),
        base_fee_per_gas: INITIAL_BASE_FEE_WEI,
    };
    HeaderInfo {
        arbos_format_version: chain_config.arbitrum.initial_arbos_version,
        ..Default::default()
    }
    .apply(&mut header);
    GenesisBlock { header }
}
