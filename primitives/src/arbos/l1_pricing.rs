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

use alloy_primitives::{address, Address, I256, U256};
use revm::db::InMemoryDB;

use super::address_set::AddressSet;
use super::storage::Storage;
use crate::error::GenesisError;

/// The sequencer's batch poster, authorized at genesis.
pub const BATCH_POSTER_ADDRESS: Address = address!("A4B000000000000000000073657175656e636572");

/// Where fees owed to [BATCH_POSTER_ADDRESS] are paid initially.
pub const BATCH_POSTER_PAY_TO_ADDRESS: Address = BATCH_POSTER_ADDRESS;

/// Collects the L1 fees paid by transactions.
pub const L1_PRICER_FUNDS_POOL_ADDRESS: Address =
    address!("A4B00000000000000000000000000000000000f6");

pub const INITIAL_INERTIA: u64 = 10;
pub const INITIAL_PER_UNIT_REWARD: u64 = 10;
pub const INITIAL_EQUILIBRATION_UNITS_V0: u64 = 60 * 16 * 100_000;
pub const INITIAL_EQUILIBRATION_UNITS_V6: u64 = 16 * 10_000_000;
pub const INITIAL_PER_BATCH_GAS_COST_V6: u64 = 100_000;
pub const INITIAL_PER_BATCH_GAS_COST_V12: u64 = 210_000;

const BATCH_POSTER_TABLE_KEY: &[u8] = &[0];

const PAY_REWARDS_TO_OFFSET: u64 = 0;
const EQUILIBRATION_UNITS_OFFSET: u64 = 1;
const INERTIA_OFFSET: u64 = 2;
const PER_UNIT_REWARD_OFFSET: u64 = 3;
const FUNDS_DUE_FOR_REWARDS_OFFSET: u64 = 5;
const PRICE_PER_UNIT_OFFSET: u64 = 7;
const LAST_SURPLUS_OFFSET: u64 = 8;
const PER_BATCH_GAS_COST_OFFSET: u64 = 9;
const AMORTIZED_COST_CAP_BIPS_OFFSET: u64 = 10;
const L1_FEES_AVAILABLE_OFFSET: u64 = 11;

/// Parameters and accounting for charging L1 data costs.
#[derive(Debug, Clone)]
pub struct L1PricingState {
    storage: Storage,
    batch_poster_table: BatchPosterTable,
}

impl L1PricingState {
    /// Writes the first-version pricing state. Later versions adjust it through upgrades.
    pub fn initialize(
        storage: &Storage,
        db: &mut InMemoryDB,
        initial_rewards_recipient: Address,
        initial_l1_base_fee: U256,
    ) -> Result<(), GenesisError> {
        let table_storage = storage.open_sub_storage(BATCH_POSTER_TABLE_KEY);
        BatchPosterTable::initialize(&table_storage, db);
        BatchPosterTable::open(table_storage).add_poster(
            db,
            BATCH_POSTER_ADDRESS,
            BATCH_POSTER_PAY_TO_ADDRESS,
        )?;

        storage.set_address(db, PAY_REWARDS_TO_OFFSET, initial_rewards_recipient);
        storage.set_u64(db, EQUILIBRATION_UNITS_OFFSET, INITIAL_EQUILIBRATION_UNITS_V0);
        storage.set_u64(db, INERTIA_OFFSET, INITIAL_INERTIA);
        storage.set_u256(db, FUNDS_DUE_FOR_REWARDS_OFFSET, U256::ZERO);
        storage.set_u64(db, PER_UNIT_REWARD_OFFSET, INITIAL_PER_UNIT_REWARD);
        storage.set_u256(db, PRICE_PER_UNIT_OFFSET, initial_l1_base_fee);
        Ok(())
    }

    pub fn open(storage: Storage) -> Self {
        Self {
            batch_poster_table: BatchPosterTable::open(
                storage.open_sub_storage(BATCH_POSTER_TABLE_KEY),
            ),
            storage,
        }
    }

    pub fn batch_poster_table(&self) -> &BatchPosterTable {
        &self.batch_poster_table
    }

    pub fn pay_rewards_to(&self, db: &InMemoryDB) -> Address {
        self.storage.get_address(db, PAY_REWARDS_TO_OFFSET)
    }

    pub fn price_per_unit(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, PRICE_PER_UNIT_OFFSET)
    }

    pub fn equilibration_units(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, EQUILIBRATION_UNITS_OFFSET)
    }

    pub fn set_equilibration_units(&self, db: &mut InMemoryDB, units: u64) {
        self.storage.set_u64(db, EQUILIBRATION_UNITS_OFFSET, units)
    }

    pub fn last_surplus(&self, db: &InMemoryDB) -> I256 {
        I256::from_raw(self.storage.get_u256(db, LAST_SURPLUS_OFFSET))
    }

    /// Stored in two's complement.
    pub fn set_last_surplus(&self, db: &mut InMemoryDB, surplus: I256) {
        self.storage.set_u256(db, LAST_SURPLUS_OFFSET, surplus.into_raw())
    }

    pub fn per_batch_gas_cost(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, PER_BATCH_GAS_COST_OFFSET)
    }

    pub fn set_per_batch_gas_cost(&self, db: &mut InMemoryDB, cost: u64) {
        self.storage.set_u64(db, PER_BATCH_GAS_COST_OFFSET, cost)
    }

    pub fn amortized_cost_cap_bips(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, AMORTIZED_COST_CAP_BIPS_OFFSET)
    }

    pub fn set_amortized_cost_cap_bips(&self, db: &mut InMemoryDB, bips: u64) {
        self.storage.set_u64(db, AMORTIZED_COST_CAP_BIPS_OFFSET, bips)
    }

    pub fn l1_fees_available(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, L1_FEES_AVAILABLE_OFFSET)
    }

    pub fn set_l1_fees_available(&self, db: &mut InMemoryDB, fees: U256) {
        self.storage.set_u256(db, L1_FEES_AVAILABLE_OFFSET, fees)
    }
}

const POSTER_ADDRS_KEY: &[u8] = &[0];
const POSTER_INFO_KEY: &[u8] = &[1];
const TOTAL_FUNDS_DUE_OFFSET: u64 = 0;

/// The batch posters authorized to post data, each with the address its fees are paid to.
#[derive(Debug, Clone)]
pub struct BatchPosterTable {
    storage: Storage,
    poster_addrs: AddressSet,
    poster_info: Storage,
}

impl BatchPosterTable {
    pub fn initialize(storage: &Storage, db: &mut InMemoryDB) {
        storage.set_u256(db, TOTAL_FUNDS_DUE_OFFSET, U256::ZERO);
        AddressSet::initialize(&storage.open_sub_storage(POSTER_ADDRS_KEY), db);
    }

    pub fn open(storage: Storage) -> Self {
        Self {
            poster_addrs: AddressSet::open(storage.open_sub_storage(POSTER_ADDRS_KEY)),
            poster_info: storage.open_sub_storage(POSTER_INFO_KEY),
            storage,
        }
    }

    pub fn contains_poster(&self, db: &InMemoryDB, poster: Address) -> bool {
        self.poster_addrs.is_member(db, poster)
    }

    pub fn all_posters(&self, db: &InMemoryDB) -> Vec<Address> {
        self.poster_addrs.all_members(db)
    }

    pub fn total_funds_due(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, TOTAL_FUNDS_DUE_OFFSET)
    }

    /// Opens the state of `poster`, adding it with itself as fee recipient when it is missing
    /// and `create_if_missing` is set.
    pub fn open_poster(
        &self,
        db: &mut InMemoryDB,
        poster: Address,
        create_if_missing: bool,
    ) -> Result<BatchPoster, GenesisError> {
        if self.contains_poster(db, poster) {
            return Ok(self.poster_state(poster));
        }
        if !create_if_missing {
            return Err(GenesisError::PosterNotFound(poster));
        }
        self.add_poster(db, poster, poster)
    }

    pub fn add_poster(
        &self,
        db: &mut InMemoryDB,
        poster: Address,
        pay_to: Address,
    ) -> Result<BatchPoster, GenesisError> {
        if self.contains_poster(db, poster) {
            return Err(GenesisError::PosterExists(poster));
        }
        let state = self.poster_state(poster);
        state.storage.set_u256(db, FUNDS_DUE_OFFSET, U256::ZERO);
        state.set_pay_to(db, pay_to);
        self.poster_addrs.add(db, poster);
        Ok(state)
    }

    fn poster_state(&self, poster: Address) -> BatchPoster {
        BatchPoster {
            poster,
            storage: self.poster_info.open_sub_storage(poster.as_slice()),
        }
    }
}

const FUNDS_DUE_OFFSET: u64 = 0;
const PAY_TO_OFFSET: u64 = 1;

/// A single authorized batch poster.
#[derive(Debug, Clone)]
pub struct BatchPoster {
    poster: Address,
    storage: Storage,
}

impl BatchPoster {
    pub fn address(&self) -> Address {
        self.poster
    }

    pub fn funds_due(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, FUNDS_DUE_OFFSET)
    }

    pub fn pay_to(&self, db: &InMemoryDB) -> Address {
        self.storage.get_address(db, PAY_TO_OFFSET)
    }

    pub fn set_pay_to(&self, db: &mut InMemoryDB, pay_to: Address) {
        self.storage.set_address(db, PAY_TO_OFFSET, pay_to)
    }
}
