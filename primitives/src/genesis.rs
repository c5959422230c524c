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

//! Reading go-ethereum style `genesis.json` descriptors.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::block::make_genesis_block;
use crate::chain_config::{ChainConfig, ParsedInitMessage};
use crate::error::GenesisError;
use crate::observer::PhaseObserver;
use crate::processor::GenesisProcessor;
use crate::reader::MemoryInitDataReader;
use crate::{AccountRecord, ContractInfo, InitializationInfo};

/// A chain's genesis descriptor. Quantities may be hex strings, decimal strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genesis {
    #[serde(default)]
    pub config: Option<ChainConfig>,

    #[serde(default, with = "quantity")]
    pub nonce: u64,

    #[serde(default, with = "quantity")]
    pub timestamp: u64,

    #[serde(default)]
    pub extra_data: Bytes,

    #[serde(default, with = "quantity")]
    pub gas_limit: u64,

    #[serde(default, with = "u256_quantity")]
    pub difficulty: U256,

    #[serde(default)]
    pub mix_hash: B256,

    #[serde(default)]
    pub coinbase: Address,

    #[serde(default)]
    pub alloc: BTreeMap<Address, GenesisAccount>,
}

/// An allocation in the genesis descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    #[serde(default, with = "u256_quantity")]
    pub balance: U256,

    #[serde(default, with = "quantity")]
    pub nonce: u64,

    #[serde(default)]
    pub code: Bytes,

    #[serde(default)]
    pub storage: BTreeMap<B256, B256>,
}

impl GenesisAccount {
    fn into_record(self, address: Address) -> AccountRecord {
        let contract_info = if self.code.is_empty() && self.storage.is_empty() {
            None
        } else {
            Some(ContractInfo {
                code: self.code,
                storage: self.storage,
            })
        };
        AccountRecord {
            address,
            balance: self.balance,
            nonce: self.nonce,
            contract_info,
            aggregator_info: None,
        }
    }
}

/// The two digests a genesis descriptor commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisRoots {
    pub state_root: B256,
    pub block_hash: B256,
}

impl Genesis {
    /// Returns the chain config, rejecting descriptors without one or without a chain owner.
    pub fn chain_config(&self) -> Result<&ChainConfig, GenesisError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| GenesisError::InvalidGenesis("genesis config is missing".into()))?;
        if config.arbitrum.initial_chain_owner.is_zero() {
            return Err(GenesisError::InvalidGenesis(
                "initial chain owner is missing in genesis config".into(),
            ));
        }
        Ok(config)
    }

    /// The init data described by `alloc`, in address order.
    pub fn initialization_info(&self) -> Result<InitializationInfo, GenesisError> {
        let config = self.chain_config()?;
        Ok(InitializationInfo {
            chain_owner: config.arbitrum.initial_chain_owner,
            address_table: Vec::new(),
            retryables: Vec::new(),
            accounts: self
                .alloc
                .iter()
                .map(|(address, account)| account.clone().into_record(*address))
                .collect(),
        })
    }
}

/// Computes the genesis state root and block hash of `genesis`.
pub fn state_and_block_root_from_genesis(genesis: &Genesis) -> Result<GenesisRoots, GenesisError> {
    state_and_block_root_with_observer(genesis, ())
}

/// Like [state_and_block_root_from_genesis], reporting each phase of the state build.
pub fn state_and_block_root_with_observer<O: PhaseObserver>(
    genesis: &Genesis,
    observer: O,
) -> Result<GenesisRoots, GenesisError> {
    let chain_config = genesis.chain_config()?;
    info!(
        chain_id = chain_config.chain_id,
        gas_limit = genesis.gas_limit,
        timestamp = genesis.timestamp,
        initial_arbos_version = chain_config.arbitrum.initial_arbos_version,
        initial_chain_owner = %chain_config.arbitrum.initial_chain_owner,
        accounts = genesis.alloc.len(),
        "parsed genesis"
    );

    let init_data = MemoryInitDataReader::new(genesis.initialization_info()?);
    let init_message = ParsedInitMessage::new(chain_config.clone());
    let state_root = GenesisProcessor::new(chain_config.clone(), init_message, genesis.timestamp)
        .with_observer(observer)
        .build(init_data)?;

    // The block is numbered 0 even when the protocol state records a later genesis block.
    let block = make_genesis_block(B256::ZERO, 0, 0, state_root, chain_config);
    Ok(GenesisRoots {
        state_root,
        block_hash: block.hash(),
    })
}

/// Serde helpers for `u64` quantities.
pub mod quantity {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{value:x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a u64 as a number, a decimal string or a 0x-prefixed hex string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
                Ok(value)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<u64, E> {
                u64::try_from(value)
                    .map_err(|_| de::Error::custom(format!("negative value not allowed: {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
                let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
                    Some("") => Ok(0),
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => value.parse(),
                };
                parsed.map_err(|err| de::Error::custom(format!("invalid quantity {value:?}: {err}")))
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// Serde helpers for `U256` quantities.
pub mod u256_quantity {
    use std::fmt;
    use std::str::FromStr;

    use alloy_primitives::U256;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{value:x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a U256 as a number, a decimal string or a 0x-prefixed hex string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<U256, E> {
                Ok(U256::from(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<U256, E> {
                u64::try_from(value)
                    .map(U256::from)
                    .map_err(|_| de::Error::custom(format!("negative value not allowed: {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<U256, E> {
                match value {
                    "0x" | "0X" => Ok(U256::ZERO),
                    _ => U256::from_str(value).map_err(|err| {
                        de::Error::custom(format!("invalid quantity {value:?}: {err}"))
                    }),
                }
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const OWNER: Address = address!("5E1497dD1f08C87b2d8FE23e9AAB6c1De833D927");

    fn genesis_json(owner: &str) -> String {
        format!(
            r#"{{
                "config": {{
                    "chainId": 412346,
                    "arbitrum": {{
                        "EnableArbOS": true,
                        "InitialArbOSVersion": 20,
                        "InitialChainOwner": "{owner}"
                    }}
                }},
                "nonce": "0x0",
                "timestamp": "0x64",
                "gasLimit": 1125899906842624,
                "difficulty": "0x1",
                "alloc": {{
                    "0x00000000000000000000000000000000000000bb": {{ "balance": "1000" }},
                    "0x00000000000000000000000000000000000000aa": {{
                        "balance": "0xde0b6b3a7640000",
                        "nonce": "0x1",
                        "code": "0x6000",
                        "storage": {{
                            "0x0000000000000000000000000000000000000000000000000000000000000001":
                            "0x0000000000000000000000000000000000000000000000000000000000000002"
                        }}
                    }}
                }}
            }}"#
        )
    }

    #[test]
    fn parses_mixed_quantities() {
        let genesis: Genesis = serde_json::from_str(&genesis_json(&OWNER.to_string())).unwrap();
        assert_eq!(genesis.timestamp, 100);
        assert_eq!(genesis.gas_limit, 1 << 50);
        assert_eq!(genesis.difficulty, U256::from(1));

        let config = genesis.chain_config().unwrap();
        assert_eq!(config.chain_id, 412346);
        assert_eq!(config.arbitrum.initial_chain_owner, OWNER);

        let funded = &genesis.alloc[&Address::with_last_byte(0xbb)];
        assert_eq!(funded.balance, U256::from(1000));
        let contract = &genesis.alloc[&Address::with_last_byte(0xaa)];
        assert_eq!(contract.balance, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(contract.nonce, 1);
        assert_eq!(contract.code, Bytes::from_static(&[0x60, 0x00]));
    }

    #[test]
    fn alloc_becomes_records_in_address_order() {
        let genesis: Genesis = serde_json::from_str(&genesis_json(&OWNER.to_string())).unwrap();
        let info = genesis.initialization_info().unwrap();
        assert_eq!(info.chain_owner, OWNER);

        let addresses: Vec<Address> = info.accounts.iter().map(|a| a.address).collect();
        assert_eq!(
            addresses,
            vec![Address::with_last_byte(0xaa), Address::with_last_byte(0xbb)]
        );
        assert!(info.accounts[0].contract_info.is_some());
        assert!(info.accounts[1].contract_info.is_none());
    }

    #[test]
    fn rejects_missing_config_and_owner() {
        let err = state_and_block_root_from_genesis(&Genesis::default()).unwrap_err();
        assert!(matches!(err, GenesisError::InvalidGenesis(_)));

        let genesis: Genesis =
            serde_json::from_str(&genesis_json(&Address::ZERO.to_string())).unwrap();
        let err = state_and_block_root_from_genesis(&genesis).unwrap_err();
        assert!(matches!(err, GenesisError::InvalidGenesis(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn roots_are_reproducible() {
        let genesis: Genesis = serde_json::from_str(&genesis_json(&OWNER.to_string())).unwrap();
        let first = state_and_block_root_from_genesis(&genesis).unwrap();
        let second = state_and_block_root_from_genesis(&genesis.clone()).unwrap();
        assert_eq!(first, second);
        assert_ne!(first.state_root, first.block_hash);
    }

    #[test]
    fn block_is_numbered_zero_for_any_genesis_block_num() {
        let mut genesis: Genesis =
            serde_json::from_str(&genesis_json(&OWNER.to_string())).unwrap();
        if let Some(config) = genesis.config.as_mut() {
            config.arbitrum.genesis_block_num = 7;
        }
        let config = genesis.chain_config().unwrap();
        let roots = state_and_block_root_from_genesis(&genesis).unwrap();

        let at_zero = make_genesis_block(B256::ZERO, 0, 0, roots.state_root, config);
        let at_seven = make_genesis_block(B256::ZERO, 7, 0, roots.state_root, config);
        assert_eq!(roots.block_hash, at_zero.hash());
        assert_ne!(roots.block_hash, at_seven.hash());
    }

    #[test]
    fn quantities_reject_garbage() {
        assert!(serde_json::from_str::<GenesisAccount>(r#"{"nonce": "0xzz"}"#).is_err());
        assert!(serde_json::from_str::<GenesisAccount>(r#"{"nonce": -1}"#).is_err());
        assert!(serde_json::from_str::<GenesisAccount>(r#"{"balance": "ten"}"#).is_err());
    }
}
