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

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Default maximum contract code size, in bytes.
pub const DEFAULT_MAX_CODE_SIZE: u64 = 24 * 1024;

/// L1 base fee assumed by the init message when none is supplied, in wei.
pub const DEFAULT_INITIAL_L1_BASE_FEE: u64 = 100_000_000;

/// The chain configuration fields the genesis build reads. Other fields of a genesis `config`
/// object are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,

    #[serde(default)]
    pub arbitrum: ArbitrumChainParams,
}

/// Rollup specific chain parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrumChainParams {
    #[serde(rename = "EnableArbOS")]
    pub enable_arbos: bool,

    #[serde(rename = "AllowDebugPrecompiles")]
    pub allow_debug_precompiles: bool,

    #[serde(rename = "DataAvailabilityCommittee")]
    pub data_availability_committee: bool,

    #[serde(rename = "InitialArbOSVersion")]
    pub initial_arbos_version: u64,

    #[serde(rename = "InitialChainOwner")]
    pub initial_chain_owner: Address,

    #[serde(rename = "GenesisBlockNum")]
    pub genesis_block_num: u64,

    /// Zero selects [DEFAULT_MAX_CODE_SIZE].
    #[serde(rename = "MaxCodeSize")]
    pub max_code_size: u64,

    /// Zero selects twice the maximum code size.
    #[serde(rename = "MaxInitCodeSize")]
    pub max_init_code_size: u64,
}

impl ChainConfig {
    pub fn max_code_size(&self) -> u64 {
        match self.arbitrum.max_code_size {
            0 => DEFAULT_MAX_CODE_SIZE,
            size => size,
        }
    }

    pub fn max_init_code_size(&self) -> u64 {
        match self.arbitrum.max_init_code_size {
            0 => 2 * self.max_code_size(),
            size => size,
        }
    }

    /// Returns the canonical serialization stored in the protocol state.
    ///
    /// The field order is fixed, every fork is active from block zero, and consumers compare the
    /// bytes verbatim, so this must not go through a generic serializer.
    pub fn serialized(&self) -> String {
        let params = &self.arbitrum;
        format!(
            concat!(
                r#"{{"homesteadBlock":0,"daoForkBlock":null,"daoForkSupport":true,"#,
                r#""eip150Block":0,"eip150Hash":"0x0000000000000000000000000000000000000000000000000000000000000000","#,
                r#""eip155Block":0,"eip158Block":0,"byzantiumBlock":0,"constantinopleBlock":0,"#,
                r#""petersburgBlock":0,"istanbulBlock":0,"muirGlacierBlock":0,"berlinBlock":0,"#,
                r#""londonBlock":0,"clique":{{"period":0,"epoch":0}},"#,
                r#""arbitrum":{{"EnableArbOS":true,"AllowDebugPrecompiles":{},"#,
                r#""DataAvailabilityCommittee":{},"InitialArbOSVersion":{},"GenesisBlockNum":{},"#,
                r#""MaxCodeSize":{},"MaxInitCodeSize":{},"InitialChainOwner":"{}"}},"#,
                r#""chainId":{}}}"#,
            ),
            params.allow_debug_precompiles,
            params.data_availability_committee,
            params.initial_arbos_version,
            params.genesis_block_num,
            self.max_code_size(),
            self.max_init_code_size(),
            params.initial_chain_owner.to_checksum(None),
            self.chain_id,
        )
    }
}

/// The chain's initialization message, as read by the genesis block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInitMessage {
    pub chain_id: u64,
    pub initial_l1_base_fee: U256,
    pub chain_config: ChainConfig,
    pub serialized_chain_config: Bytes,
}

impl ParsedInitMessage {
    /// Builds the init message for `chain_config` with the default L1 base fee.
    pub fn new(chain_config: ChainConfig) -> Self {
        Self {
            chain_id: chain_config.chain_id,
            initial_l1_base_fee: U256::from(DEFAULT_INITIAL_L1_BASE_FEE),
            serialized_chain_config: Bytes::from(chain_config.serialized().into_bytes()),
            chain_config,
        }
    }
}
