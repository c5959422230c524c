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

use crate::error::GenesisError;
use crate::mpt::keccak;
use crate::mpt::secure_trie_root;
use crate::mpt::StateAccount;
use crate::mpt::KECCAK_EMPTY;

use alloy_primitives::{Address, Bytes, B256, U256};
use revm::db::AccountState;
use revm::db::DbAccount;
use revm::db::InMemoryDB;
use revm::primitives::{AccountInfo, Bytecode, HashMap};

/// A helper trait to extend [InMemoryDB] into the state accumulator of a genesis build.
///
/// Every mutation marks the account as touched. Reads of missing accounts and slots return the
/// zero value.
pub trait InMemoryDBHelper {
    /// Get the balance of an account.
    fn balance(&self, address: Address) -> U256;

    /// Credit `amount` to an account.
    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), GenesisError>;

    /// Overwrite the balance of an account.
    fn set_balance(&mut self, address: Address, balance: U256);

    /// Get the nonce of an account.
    fn nonce(&self, address: Address) -> u64;

    /// Overwrite the nonce of an account.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Get the code hash of an account.
    fn code_hash(&self, address: Address) -> B256;

    /// Replace the code of an account.
    fn set_code(&mut self, address: Address, code: Bytes);

    /// Get the storage value of an address at an index.
    fn storage(&self, address: Address, index: U256) -> U256;

    /// Set the storage value of an address at an index.
    fn set_storage(&mut self, address: Address, index: U256, value: U256);

    /// Compute the state root over every touched account. Nothing is persisted, so this can be
    /// called at any point without affecting later mutations.
    fn state_root(&self) -> B256;
}

/// Returns the account at `address`, creating an empty one, and marks it as touched.
fn touch(db: &mut InMemoryDB, address: Address) -> &mut DbAccount {
    let account = db.accounts.entry(address).or_insert_with(|| DbAccount {
        info: empty_account_info(),
        account_state: AccountState::Touched,
        storage: HashMap::new(),
    });
    if account.account_state != AccountState::StorageCleared {
        account.account_state = AccountState::Touched;
    }
    account
}

fn empty_account_info() -> AccountInfo {
    AccountInfo {
        balance: U256::ZERO,
        nonce: 0,
        code_hash: KECCAK_EMPTY,
        code: Some(Bytecode::new()),
    }
}

impl InMemoryDBHelper for InMemoryDB {
    fn balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.info.balance)
            .unwrap_or_default()
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), GenesisError> {
        let account = touch(self, address);
        account.info.balance = account
            .info
            .balance
            .checked_add(amount)
            .ok_or(GenesisError::BalanceOverflow(address))?;
        Ok(())
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        touch(self, address).info.balance = balance;
    }

    fn nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|account| account.info.nonce)
            .unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        touch(self, address).info.nonce = nonce;
    }

    fn code_hash(&self, address: Address) -> B256 {
        self.accounts
            .get(&address)
            .map(|account| account.info.code_hash)
            .unwrap_or(KECCAK_EMPTY)
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        let code_hash = if code.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak(&code)
        };
        let bytecode = Bytecode::new_raw(code);
        self.contracts.insert(code_hash, bytecode.clone());
        let account = touch(self, address);
        account.info.code_hash = code_hash;
        account.info.code = Some(bytecode);
    }

    fn storage(&self, address: Address, index: U256) -> U256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&index).copied())
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, index: U256, value: U256) {
        touch(self, address).storage.insert(index, value);
    }

    fn state_root(&self) -> B256 {
        let mut leaves = Vec::with_capacity(self.accounts.len());
        for (address, account) in &self.accounts {
            // Ignore untouched accounts.
            if matches!(
                account.account_state,
                AccountState::None | AccountState::NotExisting
            ) {
                continue;
            }

            // Empty accounts are deleted on commit.
            let info = &account.info;
            if info.nonce == 0 && info.balance == U256::ZERO && info.code_hash == KECCAK_EMPTY {
                continue;
            }

            let storage_root = secure_trie_root(
                account
                    .storage
                    .iter()
                    .filter(|(_, value)| **value != U256::ZERO)
                    .map(|(key, value)| (key.to_be_bytes::<32>(), alloy_rlp::encode(value))),
            );
            let state_account = StateAccount {
                nonce: info.nonce,
                balance: info.balance,
                storage_root,
                code_hash: info.code_hash,
            };
            leaves.push((address.into_array(), alloy_rlp::encode(&state_account)));
        }
        secure_trie_root(leaves)
    }
}
