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

const NUM_ITEMS_OFFSET: u64 = 0;

/// Interns addresses into compact, sequential indices.
///
/// Entry `n` is stored at offset `n + 1`; the reverse index stores `n + 1` so that zero means
/// "not registered".
#[derive(Debug, Clone)]
pub struct AddressTable {
    backing_storage: Storage,
    by_address: Storage,
}

impl AddressTable {
    pub fn open(storage: Storage) -> Self {
        Self {
            by_address: storage.open_sub_storage(&[]),
            backing_storage: storage,
        }
    }

    pub fn size(&self, db: &InMemoryDB) -> u64 {
        self.backing_storage.get_u64(db, NUM_ITEMS_OFFSET)
    }

    /// Registers `address`, returning its index. An address that is already registered keeps
    /// its index.
    pub fn register(&self, db: &mut InMemoryDB, address: Address) -> u64 {
        if let Some(index) = self.lookup(db, address) {
            return index;
        }
        let word = address.into_word();
        let num_items = self.backing_storage.increment_u64(db, NUM_ITEMS_OFFSET);
        self.backing_storage.set_by_u64(db, num_items, word);
        self.by_address.set(db, word, u64_to_hash(num_items));
        num_items - 1
    }

    pub fn lookup(&self, db: &InMemoryDB, address: Address) -> Option<u64> {
        match hash_to_u64(self.by_address.get(db, address.into_word())) {
            0 => None,
            rev => Some(rev - 1),
        }
    }

    pub fn lookup_index(&self, db: &InMemoryDB, index: u64) -> Option<Address> {
        (index < self.size(db))
            .then(|| Address::from_word(self.backing_storage.get_by_u64(db, index + 1)))
    }
}
