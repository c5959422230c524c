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

//! Typed views over the storage of the ArbOS system account.
//!
//! Every structure lives under a storage key. Sub-storages derive their key by hashing the
//! parent key with an identifier, and slots are mapped so that the last byte of a key stays
//! adjacent, keeping small consecutive offsets in neighbouring slots.

use alloy_primitives::{address, Address, B256, U256};
use revm::db::InMemoryDB;

use crate::db::InMemoryDBHelper;
use crate::mpt::keccak;

/// The account whose storage holds all protocol state.
pub const ARBOS_STATE_ADDRESS: Address = address!("A4B05FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");

/// A handle on a storage subspace of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    account: Address,
    storage_key: Vec<u8>,
}

impl Storage {
    /// Opens the root storage of `account`.
    pub fn new(account: Address) -> Self {
        Self {
            account,
            storage_key: Vec::new(),
        }
    }

    /// Opens the root of the protocol state.
    pub fn arbos() -> Self {
        Self::new(ARBOS_STATE_ADDRESS)
    }

    pub fn open_sub_storage(&self, id: &[u8]) -> Self {
        Self {
            account: self.account,
            storage_key: keccak([self.storage_key.as_slice(), id].concat()).to_vec(),
        }
    }

    /// Maps a logical key to the account slot backing it.
    pub fn map_slot(&self, key: B256) -> U256 {
        let mut preimage = Vec::with_capacity(self.storage_key.len() + 31);
        preimage.extend_from_slice(&self.storage_key);
        preimage.extend_from_slice(&key[..31]);
        let hashed = keccak(preimage);

        let mut mapped = [0u8; 32];
        mapped[..31].copy_from_slice(&hashed[..31]);
        mapped[31] = key[31];
        U256::from_be_bytes(mapped)
    }

    pub fn get(&self, db: &InMemoryDB, key: B256) -> B256 {
        B256::from(db.storage(self.account, self.map_slot(key)).to_be_bytes::<32>())
    }

    pub fn set(&self, db: &mut InMemoryDB, key: B256, value: B256) {
        db.set_storage(
            self.account,
            self.map_slot(key),
            U256::from_be_bytes(value.0),
        );
    }

    pub fn get_by_u64(&self, db: &InMemoryDB, offset: u64) -> B256 {
        self.get(db, u64_to_hash(offset))
    }

    pub fn set_by_u64(&self, db: &mut InMemoryDB, offset: u64, value: B256) {
        self.set(db, u64_to_hash(offset), value)
    }

    pub fn get_u64(&self, db: &InMemoryDB, offset: u64) -> u64 {
        hash_to_u64(self.get_by_u64(db, offset))
    }

    pub fn set_u64(&self, db: &mut InMemoryDB, offset: u64, value: u64) {
        self.set_by_u64(db, offset, u64_to_hash(value))
    }

    /// Increments the counter at `offset`, returning the new value.
    pub fn increment_u64(&self, db: &mut InMemoryDB, offset: u64) -> u64 {
        let value = self.get_u64(db, offset) + 1;
        self.set_u64(db, offset, value);
        value
    }

    pub fn get_u256(&self, db: &InMemoryDB, offset: u64) -> U256 {
        U256::from_be_bytes(self.get_by_u64(db, offset).0)
    }

    pub fn set_u256(&self, db: &mut InMemoryDB, offset: u64, value: U256) {
        self.set_by_u64(db, offset, B256::from(value.to_be_bytes::<32>()))
    }

    pub fn get_address(&self, db: &InMemoryDB, offset: u64) -> Address {
        Address::from_word(self.get_by_u64(db, offset))
    }

    pub fn set_address(&self, db: &mut InMemoryDB, offset: u64, value: Address) {
        self.set_by_u64(db, offset, value.into_word())
    }

    /// Reads an optional address written by [Storage::set_address_or_nil].
    pub fn get_address_or_nil(&self, db: &InMemoryDB, offset: u64) -> Option<Address> {
        let word = self.get_by_u64(db, offset);
        (word != NIL_ADDRESS_REPRESENTATION).then(|| Address::from_word(word))
    }

    pub fn set_address_or_nil(&self, db: &mut InMemoryDB, offset: u64, value: Option<Address>) {
        let word = value.map_or(NIL_ADDRESS_REPRESENTATION, |address| address.into_word());
        self.set_by_u64(db, offset, word)
    }

    /// Reads a byte string stored as a length slot followed by 32-byte chunks.
    pub fn get_bytes(&self, db: &InMemoryDB) -> Vec<u8> {
        let mut remaining = self.get_u64(db, 0) as usize;
        let mut out = Vec::with_capacity(remaining);
        let mut offset = 1;
        while remaining >= 32 {
            out.extend_from_slice(self.get_by_u64(db, offset).as_slice());
            remaining -= 32;
            offset += 1;
        }
        if remaining > 0 {
            out.extend_from_slice(&self.get_by_u64(db, offset)[32 - remaining..]);
        }
        out
    }

    /// Stores a byte string, clearing any previous one. A trailing partial chunk is stored
    /// right-aligned.
    pub fn set_bytes(&self, db: &mut InMemoryDB, bytes: &[u8]) {
        self.clear_bytes(db);
        self.set_u64(db, 0, bytes.len() as u64);
        let mut rest = bytes;
        let mut offset = 1;
        while rest.len() >= 32 {
            self.set_by_u64(db, offset, B256::from_slice(&rest[..32]));
            rest = &rest[32..];
            offset += 1;
        }
        let mut word = [0u8; 32];
        word[32 - rest.len()..].copy_from_slice(rest);
        self.set_by_u64(db, offset, B256::from(word));
    }

    pub fn clear_bytes(&self, db: &mut InMemoryDB) {
        let len = self.get_u64(db, 0);
        for offset in 1..=len / 32 + 1 {
            self.set_by_u64(db, offset, B256::ZERO);
        }
        self.set_u64(db, 0, 0);
    }
}

/// Marker stored in place of an absent address, distinct from the zero address.
pub const NIL_ADDRESS_REPRESENTATION: B256 = B256::new({
    let mut word = [0u8; 32];
    word[0] = 0x80;
    word
});

pub fn u64_to_hash(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

pub fn hash_to_u64(hash: B256) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&hash[24..]);
    u64::from_be_bytes(buf)
}

/// A FIFO queue of words, laid out as two cursors followed by the entries.
#[derive(Debug, Clone)]
pub struct Queue {
    storage: Storage,
}

const NEXT_PUT_OFFSET: u64 = 0;
const NEXT_GET_OFFSET: u64 = 1;

impl Queue {
    pub fn initialize(storage: &Storage, db: &mut InMemoryDB) {
        storage.set_u64(db, NEXT_PUT_OFFSET, 2);
        storage.set_u64(db, NEXT_GET_OFFSET, 2);
    }

    pub fn open(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn put(&self, db: &mut InMemoryDB, value: B256) {
        let slot = self.storage.get_u64(db, NEXT_PUT_OFFSET);
        self.storage.set_u64(db, NEXT_PUT_OFFSET, slot + 1);
        self.storage.set_by_u64(db, slot, value);
    }

    pub fn size(&self, db: &InMemoryDB) -> u64 {
        self.storage.get_u64(db, NEXT_PUT_OFFSET) - self.storage.get_u64(db, NEXT_GET_OFFSET)
    }

    pub fn is_empty(&self, db: &InMemoryDB) -> bool {
        self.size(db) == 0
    }

    pub fn peek(&self, db: &InMemoryDB) -> Option<B256> {
        (!self.is_empty(db)).then(|| {
            self.storage
                .get_by_u64(db, self.storage.get_u64(db, NEXT_GET_OFFSET))
        })
    }

    /// Returns the queued entries, oldest first.
    pub fn items(&self, db: &InMemoryDB) -> Vec<B256> {
        let first = self.storage.get_u64(db, NEXT_GET_OFFSET);
        let end = self.storage.get_u64(db, NEXT_PUT_OFFSET);
        (first..end)
            .map(|slot| self.storage.get_by_u64(db, slot))
            .collect()
    }
}
