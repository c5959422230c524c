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

use revm::db::InMemoryDB;

use super::storage::Storage;

/// Gas limit written into block headers; execution is bounded by the pricing model instead.
pub const GETH_BLOCK_GAS_LIMIT: u64 = 1 << 50;

pub const INITIAL_SPEED_LIMIT_PER_SECOND_V0: u64 = 1_000_000;
pub const INITIAL_PER_BLOCK_GAS_LIMIT_V0: u64 = 20_000_000;
pub const INITIAL_SPEED_LIMIT_PER_SECOND_V6: u64 = 7_000_000;
pub const INITIAL_PER_BLOCK_GAS_LIMIT_V6: u64 = 32_000_000;
/// 0.1 gwei.
pub const INITIAL_MINIMUM_BASE_FEE_WEI: u64 = 100_000_000;
pub const INITIAL_BASE_FEE_WEI: u64 = INITIAL_MINIMUM_BASE_FEE_WEI;
pub const INITIAL_PRICING_INERTIA: u64 = 102;
pub const INITIAL_BACKLOG_TOLERANCE: u64 = 10;

const SPEED_LIMIT_PER_SECOND_OFFSET: u64 = 0;
const PER_BLOCK_GAS_LIMIT_OFFSET: u64 = 1;
const BASE_FEE_WEI_OFFSET: u64 = 2;
const MIN_BASE_FEE_WEI_OFFSET: u64 = 3;
const GAS_BACKLOG_OFFSET: u64 = 4;
const PRICING_INERTIA_OFFSET: u64 = 5;
const BACKLOG_TOLERANCE_OFFSET: u64 = 6;

/// Parameters of the L2 gas pricing model.
#[derive(Debug, Clone)]
pub struct L2PricingState {
    storage: Storage,
}

impl L2PricingState {
    pub fn initialize(storage: &Storage, db: &mut InMemoryDB) {
        storage.set_u64(db, SPEED_LIMIT_PER_SECOND_OFFSET, INITIAL_SPEED_LIMIT_PER_SECOND_V0);
        storage.set_u64(db, PER_BLOCK_GAS_LIMIT_OFFSET, INITIAL_PER_BLOCK_GAS_LIMIT_V0);
        storage.set_u64(db, BASE_FEE_WEI_OFFSET, INITIAL_BASE_FEE_WEI);
        storage.set_u64(db, MIN_BASE_FEE_WEI_OFFSET, INITIAL_MINIMUM_BASE_FEE_WEI);
        storage.set_u64(db, GAS_BACKLOG_OFFSET, 0);
        storage.set_u64(db, PRICING_INERTIA_OFFSET, INITIAL_PRICING_INERTIA);
        storage.set_u64(db, BACKLOG_TOLERANCE_OFFSET, INITIAL_BACKLOG_TOLERANCE);
    }

    pub fn open(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn base_fee_wei(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, BASE_FEE_WEI_OFFSET)
    }

    pub fn speed_limit_per_second(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, SPEED_LIMIT_PER_SECOND_OFFSET)
    }

    pub fn set_speed_limit_per_second(&self, db: &mut InMemoryDB, limit: u64) {
        self.storage.set_u64(db, SPEED_LIMIT_PER_SECOND_OFFSET, limit)
    }

    pub fn per_block_gas_limit(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, PER_BLOCK_GAS_LIMIT_OFFSET)
    }

    pub fn set_max_per_block_gas_limit(&self, db: &mut InMemoryDB, limit: u64) {
        self.storage.set_u64(db, PER_BLOCK_GAS_LIMIT_OFFSET, limit)
    }
}
