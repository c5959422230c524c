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

use alloy_primitives::{Address, Bytes, B256, U256};
use revm::db::InMemoryDB;

use super::storage::{Queue, Storage};
use crate::mpt::keccak;
use crate::RetryableRecord;

const TIMEOUT_QUEUE_KEY: &[u8] = &[0];
const CALLDATA_KEY: &[u8] = &[1];

const NUM_TRIES_OFFSET: u64 = 0;
const FROM_OFFSET: u64 = 1;
const TO_OFFSET: u64 = 2;
const CALLVALUE_OFFSET: u64 = 3;
const BENEFICIARY_OFFSET: u64 = 4;
const TIMEOUT_OFFSET: u64 = 5;
const TIMEOUT_WINDOWS_LEFT_OFFSET: u64 = 6;

/// Returns the account holding the call value of retryable `id` until it is redeemed or
/// expires.
pub fn retryable_escrow_address(id: B256) -> Address {
    let hash = keccak([b"retryable escrow".as_slice(), id.as_slice()].concat());
    Address::from_slice(&hash[12..])
}

/// The set of live retryables and the queue ordering them for expiry.
#[derive(Debug, Clone)]
pub struct RetryableState {
    retryables: Storage,
    timeout_queue: Queue,
}

impl RetryableState {
    pub fn initialize(storage: &Storage, db: &mut InMemoryDB) {
        Queue::initialize(&storage.open_sub_storage(TIMEOUT_QUEUE_KEY), db);
    }

    pub fn open(storage: Storage) -> Self {
        Self {
            timeout_queue: Queue::open(storage.open_sub_storage(TIMEOUT_QUEUE_KEY)),
            retryables: storage,
        }
    }

    /// The queue of retryable ids, in creation order.
    pub fn timeout_queue(&self) -> &Queue {
        &self.timeout_queue
    }

    /// Stores a new retryable and enqueues it for expiry. The escrowed call value is not moved
    /// here, callers credit [retryable_escrow_address] themselves.
    pub fn create_retryable(&self, db: &mut InMemoryDB, ticket: &RetryableRecord) -> Retryable {
        let storage = self.retryables.open_sub_storage(ticket.id.as_slice());
        storage.set_u64(db, NUM_TRIES_OFFSET, 0);
        storage.set_address(db, FROM_OFFSET, ticket.from);
        storage.set_address_or_nil(db, TO_OFFSET, ticket.to);
        storage.set_u256(db, CALLVALUE_OFFSET, ticket.callvalue);
        storage.set_address(db, BENEFICIARY_OFFSET, ticket.beneficiary);
        storage.set_u64(db, TIMEOUT_OFFSET, ticket.timeout);
        storage.set_u64(db, TIMEOUT_WINDOWS_LEFT_OFFSET, 0);
        storage
            .open_sub_storage(CALLDATA_KEY)
            .set_bytes(db, &ticket.calldata);
        self.timeout_queue.put(db, ticket.id);

        Retryable {
            id: ticket.id,
            storage,
        }
    }

    /// Opens a retryable that exists and has not timed out at `current_timestamp`.
    pub fn open_retryable(
        &self,
        db: &InMemoryDB,
        id: B256,
        current_timestamp: u64,
    ) -> Option<Retryable> {
        let storage = self.retryables.open_sub_storage(id.as_slice());
        let timeout = storage.get_u64(db, TIMEOUT_OFFSET);
        if timeout == 0 || timeout < current_timestamp {
            return None;
        }
        Some(Retryable { id, storage })
    }
}

/// A handle on a stored retryable.
#[derive(Debug, Clone)]
pub struct Retryable {
    id: B256,
    storage: Storage,
}

impl Retryable {
    pub fn id(&self) -> B256 {
        self.id
    }

    pub fn num_tries(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, NUM_TRIES_OFFSET)
    }

    pub fn from(&self, db: &InMemoryDB) -> Address {
        self.storage.get_address(db, FROM_OFFSET)
    }

    pub fn to(&self, db: &InMemoryDB) -> Option<Address> {
        self.storage.get_address_or_nil(db, TO_OFFSET)
    }

    pub fn callvalue(&self, db: &InMemoryDB) -> U256 {
        self.storage.get_u256(db, CALLVALUE_OFFSET)
    }

    pub fn beneficiary(&self, db: &InMemoryDB) -> Address {
        self.storage.get_address(db, BENEFICIARY_OFFSET)
    }

    pub fn timeout(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, TIMEOUT_OFFSET)
    }

    pub fn calldata(&self, db: &InMemoryDB) -> Bytes {
        self.storage
            .open_sub_storage(CALLDATA_KEY)
            .get_bytes(db)
            .into()
    }
}
