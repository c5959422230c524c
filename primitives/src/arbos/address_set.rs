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
use revm::db::InMemoryDB;

use super::storage::{hash_to_u64, u64_to_hash, Storage};

const SIZE_OFFSET: u64 = 0;
const BY_ADDRESS_KEY: &[u8] = &[0];

/// An insertion-ordered set of addresses. Members occupy offsets `1..=size`, and a reverse index
/// maps each member to its offset.
#[derive(Debug, Clone)]
pub struct AddressSet {
    backing_storage: Storage,
    by_address: Storage,
}

impl AddressSet {
    pub fn initialize(storage: &Storage, db: &mut InMemoryDB) {
        storage.set_u64(db, SIZE_OFFSET, 0);
    }

    pub fn open(storage: Storage) -> Self {
        Self {
            by_address: storage.open_sub_storage(BY_ADDRESS_KEY),
            backing_storage: storage,
        }
    }

    pub fn size(&self, db: &InMemoryDB) -> u64 {
        self.backing_storage.get_u64(db, SIZE_OFFSET)
    }

    pub fn is_member(&self, db: &InMemoryDB, address: Address) -> bool {
        !self.by_address.get(db, address.into_word()).is_zero()
    }

    /// Adds `address` unless it is already a member.
    pub fn add(&self, db: &mut InMemoryDB, address: Address) {
        if self.is_member(db, address) {
            return;
        }
        let slot = self.size(db) + 1;
        let word = address.into_word();
        self.backing_storage.set_by_u64(db, slot, word);
        self.by_address.set(db, word, u64_to_hash(slot));
        self.backing_storage.set_u64(db, SIZE_OFFSET, slot);
    }

    /// Returns the members in insertion order.
    pub fn all_members(&self, db: &InMemoryDB) -> Vec<Address> {
        (1..=self.size(db))
            .map(|slot| Address::from_word(self.backing_storage.get_by_u64(db, slot)))
            .collect()
    }

    /// The 1-based offset of `address`, if it is a member.
    pub fn position(&self, db: &InMemoryDB, address: Address) -> Option<u64> {
        match hash_to_u64(self.by_address.get(db, address.into_word())) {
            0 => None,
            slot => Some(slot),
        }
    }
}
