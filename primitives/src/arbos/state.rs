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

use alloy_primitives::{Address, Bytes, I256, U256};
use revm::db::InMemoryDB;
use tracing::debug;

use super::address_set::AddressSet;
use super::address_table::AddressTable;
use super::l1_pricing::{
    L1PricingState, BATCH_POSTER_ADDRESS, INITIAL_EQUILIBRATION_UNITS_V6,
    INITIAL_PER_BATCH_GAS_COST_V12, INITIAL_PER_BATCH_GAS_COST_V6, L1_PRICER_FUNDS_POOL_ADDRESS,
};
use super::l2_pricing::{
    L2PricingState, INITIAL_PER_BLOCK_GAS_LIMIT_V6, INITIAL_SPEED_LIMIT_PER_SECOND_V6,
};
use super::precompiles::{GENESIS_PRECOMPILES, PRECOMPILE_MARKER_CODE};
use super::retryables::RetryableState;
use super::storage::{Storage, ARBOS_STATE_ADDRESS};
use crate::chain_config::{ChainConfig, ParsedInitMessage};
use crate::db::InMemoryDBHelper;
use crate::error::{FatalError, GenesisError};

/// The newest ArbOS version a genesis can start at. Version 30 introduces Stylus program state,
/// which is not modelled. No precompile is added by the upgrades up to here.
pub const MAX_ARBOS_VERSION: u64 = 29;

const VERSION_OFFSET: u64 = 0;
const UPGRADE_VERSION_OFFSET: u64 = 1;
const UPGRADE_TIMESTAMP_OFFSET: u64 = 2;
const NETWORK_FEE_ACCOUNT_OFFSET: u64 = 3;
const CHAIN_ID_OFFSET: u64 = 4;
const GENESIS_BLOCK_NUM_OFFSET: u64 = 5;
const INFRA_FEE_ACCOUNT_OFFSET: u64 = 6;
const BROTLI_COMPRESSION_LEVEL_OFFSET: u64 = 7;

const L1_PRICING_SUBSPACE: &[u8] = &[0];
const L2_PRICING_SUBSPACE: &[u8] = &[1];
const RETRYABLES_SUBSPACE: &[u8] = &[2];
const ADDRESS_TABLE_SUBSPACE: &[u8] = &[3];
const CHAIN_OWNER_SUBSPACE: &[u8] = &[4];
const SEND_MERKLE_SUBSPACE: &[u8] = &[5];
const BLOCKHASHES_SUBSPACE: &[u8] = &[6];
const CHAIN_CONFIG_SUBSPACE: &[u8] = &[7];

/// The protocol state of the chain, rooted in the storage of [ARBOS_STATE_ADDRESS].
#[derive(Debug, Clone)]
pub struct ArbosState {
    storage: Storage,
    l1_pricing: L1PricingState,
    l2_pricing: L2PricingState,
    retryable_state: RetryableState,
    address_table: AddressTable,
    chain_owners: AddressSet,
}

impl ArbosState {
    /// Writes the initial protocol state into `db`.
    ///
    /// Failures here are fatal: the configuration is unusable rather than merely invalid.
    pub fn initialize(
        db: &mut InMemoryDB,
        chain_config: &ChainConfig,
        init_message: &ParsedInitMessage,
    ) -> Result<Self, GenesisError> {
        let params = &chain_config.arbitrum;
        let version = params.initial_arbos_version;
        if version == 0 || version > MAX_ARBOS_VERSION {
            return Err(FatalError::UnsupportedArbosVersion {
                version,
                max: MAX_ARBOS_VERSION,
            }
            .into());
        }
        if init_message.chain_id != chain_config.chain_id {
            return Err(FatalError::ChainIdMismatch {
                message: init_message.chain_id,
                config: chain_config.chain_id,
            }
            .into());
        }

        debug!(count = GENESIS_PRECOMPILES.len(), "installing precompile markers");
        for address in GENESIS_PRECOMPILES {
            db.set_code(*address, Bytes::from_static(PRECOMPILE_MARKER_CODE));
        }
        // Keeps the system account from being pruned as empty.
        db.set_nonce(ARBOS_STATE_ADDRESS, 1);

        let storage = Storage::arbos();
        let owner = params.initial_chain_owner;
        storage.set_u64(db, VERSION_OFFSET, 1);
        storage.set_u64(db, UPGRADE_VERSION_OFFSET, 0);
        storage.set_u64(db, UPGRADE_TIMESTAMP_OFFSET, 0);
        let network_fee_account = if version >= 2 { owner } else { Address::ZERO };
        storage.set_address(db, NETWORK_FEE_ACCOUNT_OFFSET, network_fee_account);
        storage.set_u256(db, CHAIN_ID_OFFSET, U256::from(chain_config.chain_id));
        storage
            .open_sub_storage(CHAIN_CONFIG_SUBSPACE)
            .set_bytes(db, &init_message.serialized_chain_config);
        storage.set_u64(db, GENESIS_BLOCK_NUM_OFFSET, params.genesis_block_num);
        storage.set_u64(db, BROTLI_COMPRESSION_LEVEL_OFFSET, 0);

        let rewards_recipient = if version >= 2 {
            owner
        } else {
            BATCH_POSTER_ADDRESS
        };
        L1PricingState::initialize(
            &storage.open_sub_storage(L1_PRICING_SUBSPACE),
            db,
            rewards_recipient,
            init_message.initial_l1_base_fee,
        )
        .map_err(|err| FatalError::ProtocolState(err.to_string()))?;
        L2PricingState::initialize(&storage.open_sub_storage(L2_PRICING_SUBSPACE), db);
        RetryableState::initialize(&storage.open_sub_storage(RETRYABLES_SUBSPACE), db);
        // Empty send merkle accumulator and L1 block hash history.
        storage
            .open_sub_storage(SEND_MERKLE_SUBSPACE)
            .set_u64(db, 0, 0);
        storage
            .open_sub_storage(BLOCKHASHES_SUBSPACE)
            .set_u64(db, 0, 0);

        let owners_storage = storage.open_sub_storage(CHAIN_OWNER_SUBSPACE);
        AddressSet::initialize(&owners_storage, db);
        if owner != Address::ZERO {
            AddressSet::open(owners_storage).add(db, owner);
        }

        let state = Self::open(storage);
        if version > 1 {
            state.upgrade_arbos_version(db, version);
        }
        Ok(state)
    }

    /// Steps the state from version 1 up to `upgrade_to`, then applies the parameters a chain
    /// created directly at that version starts with.
    fn upgrade_arbos_version(&self, db: &mut InMemoryDB, upgrade_to: u64) {
        let mut version = self.arbos_version(db);
        while version < upgrade_to {
            let next = version + 1;
            match next {
                2 => self.l1_pricing.set_last_surplus(db, I256::ZERO),
                3 => {
                    self.l1_pricing.set_per_batch_gas_cost(db, 0);
                    self.l1_pricing.set_amortized_cost_cap_bips(db, u64::MAX);
                }
                10 => {
                    let pooled = db.balance(L1_PRICER_FUNDS_POOL_ADDRESS);
                    self.l1_pricing.set_l1_fees_available(db, pooled);
                }
                11 => {
                    self.l1_pricing
                        .set_per_batch_gas_cost(db, INITIAL_PER_BATCH_GAS_COST_V12);
                    // Zero disables the cap.
                    if self.l1_pricing.amortized_cost_cap_bips(db) == u64::MAX {
                        self.l1_pricing.set_amortized_cost_cap_bips(db, 0);
                    }
                }
                20 => self.storage.set_u64(db, BROTLI_COMPRESSION_LEVEL_OFFSET, 1),
                // 12-19 and 21-29 are reserved for chain-specific upgrades.
                _ => {}
            }
            debug!(version = next, "applied arbos upgrade");
            version = next;
        }

        if upgrade_to >= 6 {
            if upgrade_to < 7 {
                self.l1_pricing
                    .set_per_batch_gas_cost(db, INITIAL_PER_BATCH_GAS_COST_V6);
            }
            self.l1_pricing
                .set_equilibration_units(db, INITIAL_EQUILIBRATION_UNITS_V6);
            self.l2_pricing
                .set_speed_limit_per_second(db, INITIAL_SPEED_LIMIT_PER_SECOND_V6);
            self.l2_pricing
                .set_max_per_block_gas_limit(db, INITIAL_PER_BLOCK_GAS_LIMIT_V6);
        }
        self.storage.set_u64(db, VERSION_OFFSET, version);
    }

    pub fn open(storage: Storage) -> Self {
        Self {
            l1_pricing: L1PricingState::open(storage.open_sub_storage(L1_PRICING_SUBSPACE)),
            l2_pricing: L2PricingState::open(storage.open_sub_storage(L2_PRICING_SUBSPACE)),
            retryable_state: RetryableState::open(storage.open_sub_storage(RETRYABLES_SUBSPACE)),
            address_table: AddressTable::open(storage.open_sub_storage(ADDRESS_TABLE_SUBSPACE)),
            chain_owners: AddressSet::open(storage.open_sub_storage(CHAIN_OWNER_SUBSPACE)),
            storage,
        }
    }

    pub fn arbos_version(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, VERSION_OFFSET)
    }

    pub fn chain_id(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, CHAIN_ID_OFFSET)
    }

    pub fn genesis_block_num(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, GENESIS_BLOCK_NUM_OFFSET)
    }

    pub fn network_fee_account(&self, db: &InMemoryDB) -> Address {
        self.storage.get_address(db, NETWORK_FEE_ACCOUNT_OFFSET)
    }

    pub fn infra_fee_account(&self, db: &InMemoryDB) -> Address {
        self.storage.get_address(db, INFRA_FEE_ACCOUNT_OFFSET)
    }

    pub fn brotli_compression_level(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, BROTLI_COMPRESSION_LEVEL_OFFSET)
    }

    /// The serialized chain config taken from the init message.
    pub fn chain_config(&self, db: &InMemoryDB) -> Bytes {
        self.storage
            .open_sub_storage(CHAIN_CONFIG_SUBSPACE)
            .get_bytes(db)
            .into()
    }

    pub fn l1_pricing(&self) -> &L1PricingState {
        &self.l1_pricing
    }

    pub fn l2_pricing(&self) -> &L2PricingState {
        &self.l2_pricing
    }

    pub fn retryable_state(&self) -> &RetryableState {
        &self.retryable_state
    }

    pub fn address_table(&self) -> &AddressTable {
        &self.address_table
    }

    pub fn chain_owners(&self) -> &AddressSet {
        &self.chain_owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbos::l1_pricing::INITIAL_EQUILIBRATION_UNITS_V0;
    use crate::arbos::l2_pricing::{
        INITIAL_BASE_FEE_WEI, INITIAL_PER_BLOCK_GAS_LIMIT_V0, INITIAL_SPEED_LIMIT_PER_SECOND_V0,
    };
    use crate::chain_config::ArbitrumChainParams;
    use crate::mpt::keccak;

    fn config(version: u64, owner: Address) -> ChainConfig {
        ChainConfig {
            chain_id: 412346,
            arbitrum: ArbitrumChainParams {
                enable_arbos: true,
                initial_arbos_version: version,
                initial_chain_owner: owner,
                ..Default::default()
            },
        }
    }

    #[test]
    fn initializes_protocol_state() {
        let owner = Address::repeat_byte(0x42);
        let config = config(20, owner);
        let message = ParsedInitMessage::new(config.clone());
        let mut db = InMemoryDB::default();
        let state = ArbosState::initialize(&mut db, &config, &message).unwrap();

        assert_eq!(state.arbos_version(&db), 20);
        assert_eq!(state.chain_id(&db), U256::from(412346));
        assert_eq!(state.genesis_block_num(&db), 0);
        assert_eq!(state.network_fee_account(&db), owner);
        assert_eq!(state.infra_fee_account(&db), Address::ZERO);
        assert_eq!(state.chain_config(&db), message.serialized_chain_config);
        assert_eq!(state.chain_owners().all_members(&db), vec![owner]);
        assert_eq!(state.address_table().size(&db), 0);
        assert!(state.retryable_state().timeout_queue().is_empty(&db));
        assert_eq!(state.l1_pricing().pay_rewards_to(&db), owner);
        assert!(state
            .l1_pricing()
            .batch_poster_table()
            .contains_poster(&db, BATCH_POSTER_ADDRESS));
        assert_eq!(state.l2_pricing().base_fee_wei(&db), INITIAL_BASE_FEE_WEI);
        assert_eq!(
            state.l2_pricing().per_block_gas_limit(&db),
            INITIAL_PER_BLOCK_GAS_LIMIT_V6
        );

        assert_eq!(db.nonce(ARBOS_STATE_ADDRESS), 1);
        for address in GENESIS_PRECOMPILES {
            assert_eq!(db.code_hash(*address), keccak(PRECOMPILE_MARKER_CODE));
        }
        // The reopened view reads the same state.
        assert_eq!(ArbosState::open(Storage::arbos()).arbos_version(&db), 20);
    }

    fn initialize_at(version: u64, db: &mut InMemoryDB) -> ArbosState {
        let config = config(version, Address::repeat_byte(0x42));
        let message = ParsedInitMessage::new(config.clone());
        ArbosState::initialize(db, &config, &message).unwrap()
    }

    #[test]
    fn version_one_keeps_first_parameters() {
        let mut db = InMemoryDB::default();
        let state = initialize_at(1, &mut db);
        let l1 = state.l1_pricing();
        assert_eq!(state.arbos_version(&db), 1);
        assert_eq!(l1.per_batch_gas_cost(&db), 0);
        assert_eq!(l1.amortized_cost_cap_bips(&db), 0);
        assert_eq!(
            l1.equilibration_units(&db),
            U256::from(INITIAL_EQUILIBRATION_UNITS_V0)
        );
        assert_eq!(
            state.l2_pricing().speed_limit_per_second(&db),
            INITIAL_SPEED_LIMIT_PER_SECOND_V0
        );
        assert_eq!(
            state.l2_pricing().per_block_gas_limit(&db),
            INITIAL_PER_BLOCK_GAS_LIMIT_V0
        );
        assert_eq!(state.brotli_compression_level(&db), 0);
    }

    #[test]
    fn version_three_sets_amortization_cap() {
        let mut db = InMemoryDB::default();
        let state = initialize_at(3, &mut db);
        assert_eq!(state.l1_pricing().last_surplus(&db), I256::ZERO);
        assert_eq!(state.l1_pricing().per_batch_gas_cost(&db), 0);
        assert_eq!(state.l1_pricing().amortized_cost_cap_bips(&db), u64::MAX);
        // Pricing parameters stay at their first values below version 6.
        assert_eq!(
            state.l2_pricing().speed_limit_per_second(&db),
            INITIAL_SPEED_LIMIT_PER_SECOND_V0
        );
    }

    #[test]
    fn version_six_raises_pricing_parameters() {
        let mut db = InMemoryDB::default();
        let state = initialize_at(6, &mut db);
        let l1 = state.l1_pricing();
        assert_eq!(l1.per_batch_gas_cost(&db), INITIAL_PER_BATCH_GAS_COST_V6);
        assert_eq!(l1.amortized_cost_cap_bips(&db), u64::MAX);
        assert_eq!(
            l1.equilibration_units(&db),
            U256::from(INITIAL_EQUILIBRATION_UNITS_V6)
        );
        assert_eq!(
            state.l2_pricing().speed_limit_per_second(&db),
            INITIAL_SPEED_LIMIT_PER_SECOND_V6
        );
        assert_eq!(
            state.l2_pricing().per_block_gas_limit(&db),
            INITIAL_PER_BLOCK_GAS_LIMIT_V6
        );
    }

    #[test]
    fn version_seven_keeps_batch_cost_from_upgrades() {
        let mut db = InMemoryDB::default();
        let state = initialize_at(7, &mut db);
        assert_eq!(state.l1_pricing().per_batch_gas_cost(&db), 0);
    }

    #[test]
    fn version_ten_records_pooled_fees() {
        let mut db = InMemoryDB::default();
        db.set_balance(L1_PRICER_FUNDS_POOL_ADDRESS, U256::from(777));
        let state = initialize_at(10, &mut db);
        assert_eq!(state.l1_pricing().l1_fees_available(&db), U256::from(777));
    }

    #[test]
    fn version_eleven_resets_batch_cost_and_cap() {
        let mut db = InMemoryDB::default();
        let state = initialize_at(11, &mut db);
        assert_eq!(
            state.l1_pricing().per_batch_gas_cost(&db),
            INITIAL_PER_BATCH_GAS_COST_V12
        );
        assert_eq!(state.l1_pricing().amortized_cost_cap_bips(&db), 0);
        assert_eq!(state.brotli_compression_level(&db), 0);
    }

    #[test]
    fn version_twenty_raises_compression_level() {
        let mut db = InMemoryDB::default();
        let state = initialize_at(20, &mut db);
        assert_eq!(state.brotli_compression_level(&db), 1);
        assert_eq!(state.arbos_version(&db), 20);
    }

    #[test]
    fn reserved_versions_change_only_the_version() {
        let owner = Address::repeat_byte(0x42);
        // Both chains store the same serialized config, so only the version slot can differ.
        let message = ParsedInitMessage::new(config(20, owner));
        let mut at_20 = InMemoryDB::default();
        ArbosState::initialize(&mut at_20, &config(20, owner), &message).unwrap();
        let mut at_29 = InMemoryDB::default();
        let state =
            ArbosState::initialize(&mut at_29, &config(MAX_ARBOS_VERSION, owner), &message)
                .unwrap();
        assert_eq!(state.arbos_version(&at_29), 29);

        state.storage.set_u64(&mut at_29, VERSION_OFFSET, 20);
        assert_eq!(at_29.state_root(), at_20.state_root());
    }

    #[test]
    fn version_one_pays_the_sequencer() {
        let config = config(1, Address::repeat_byte(0x42));
        let message = ParsedInitMessage::new(config.clone());
        let mut db = InMemoryDB::default();
        let state = ArbosState::initialize(&mut db, &config, &message).unwrap();
        assert_eq!(state.network_fee_account(&db), Address::ZERO);
        assert_eq!(state.l1_pricing().pay_rewards_to(&db), BATCH_POSTER_ADDRESS);
    }

    #[test]
    fn zero_owner_is_not_registered() {
        let config = config(20, Address::ZERO);
        let message = ParsedInitMessage::new(config.clone());
        let mut db = InMemoryDB::default();
        let state = ArbosState::initialize(&mut db, &config, &message).unwrap();
        assert_eq!(state.chain_owners().size(&db), 0);
    }

    #[test]
    fn unsupported_versions_are_fatal() {
        for version in [0, MAX_ARBOS_VERSION + 1] {
            let config = config(version, Address::repeat_byte(1));
            let message = ParsedInitMessage::new(config.clone());
            let err = ArbosState::initialize(&mut InMemoryDB::default(), &config, &message)
                .unwrap_err();
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn chain_id_mismatch_is_fatal() {
        let config = config(20, Address::repeat_byte(1));
        let mut message = ParsedInitMessage::new(config.clone());
        message.chain_id += 1;
        let err = ArbosState::initialize(&mut InMemoryDB::default(), &config, &message)
            .unwrap_err();
        assert!(matches!(
            err,
            GenesisError::Fatal(FatalError::ChainIdMismatch { .. })
        ));
    }
}
