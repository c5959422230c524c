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

//! The phases that load init records into the state accumulator.

use std::cmp::Ordering;

use alloy_primitives::{Address, U256};
use revm::db::InMemoryDB;
use tracing::debug;

use crate::arbos::address_table::AddressTable;
use crate::arbos::retryables::{retryable_escrow_address, RetryableState};
use crate::arbos::ArbosState;
use crate::db::InMemoryDBHelper;
use crate::error::GenesisError;
use crate::reader::{consume, RecordReader};
use crate::{AccountRecord, RetryableRecord};

/// Registers every address of `reader` in the address table, in stream order.
///
/// The table must start empty so that entry `n` of the stream lands in slot `n`.
pub fn populate_address_table<R>(
    db: &mut InMemoryDB,
    table: &AddressTable,
    reader: R,
) -> Result<(), GenesisError>
where
    R: RecordReader<Item = Address>,
{
    consume(reader, |reader| {
        let size = table.size(db);
        if size != 0 {
            return Err(GenesisError::InvariantViolation(format!(
                "address table must be empty, found {size} entries"
            )));
        }

        let mut expected = 0;
        while reader.has_more() {
            let address = reader.get_next()?;
            let actual = table.register(db, address);
            if actual != expected {
                return Err(GenesisError::SlotMismatch { expected, actual });
            }
            debug!(%address, slot = actual, "registered address");
            expected += 1;
        }
        Ok(())
    })
}

/// The canonical retryable order: ascending timeout, then ascending numeric id.
pub fn compare_retryables(a: &RetryableRecord, b: &RetryableRecord) -> Ordering {
    a.timeout
        .cmp(&b.timeout)
        .then_with(|| U256::from_be_bytes(a.id.0).cmp(&U256::from_be_bytes(b.id.0)))
}

pub fn sort_retryables(retryables: &mut [RetryableRecord]) {
    retryables.sort_by(compare_retryables);
}

/// Loads the retryables of `reader`.
///
/// A retryable that timed out at or before `current_timestamp` pays its call value straight to
/// its beneficiary. The others are escrowed and stored in [compare_retryables] order, which
/// fixes their position in the timeout queue.
pub fn initialize_retryables<R>(
    db: &mut InMemoryDB,
    retryable_state: &RetryableState,
    reader: R,
    current_timestamp: u64,
) -> Result<(), GenesisError>
where
    R: RecordReader<Item = RetryableRecord>,
{
    consume(reader, |reader| {
        let mut live = Vec::new();
        while reader.has_more() {
            let retryable = reader.get_next()?;
            if retryable.timeout <= current_timestamp {
                db.add_balance(retryable.beneficiary, retryable.callvalue)?;
                debug!(
                    id = %retryable.id,
                    beneficiary = %retryable.beneficiary,
                    amount = %retryable.callvalue,
                    "paid out expired retryable"
                );
                continue;
            }
            live.push(retryable);
        }

        sort_retryables(&mut live);
        for mut retryable in live {
            retryable.to = retryable.to.filter(|to| !to.is_zero());
            let escrow = retryable_escrow_address(retryable.id);
            db.add_balance(escrow, retryable.callvalue)?;
            retryable_state.create_retryable(db, &retryable);
            debug!(
                id = %retryable.id,
                %escrow,
                timeout = retryable.timeout,
                "created retryable"
            );
        }
        Ok(())
    })
}

/// Loads the accounts of `reader`, in stream order.
pub fn initialize_accounts<R>(
    db: &mut InMemoryDB,
    arbos_state: &ArbosState,
    reader: R,
) -> Result<(), GenesisError>
where
    R: RecordReader<Item = AccountRecord>,
{
    consume(reader, |reader| {
        while reader.has_more() {
            let account = reader.get_next()?;
            initialize_account(db, arbos_state, &account)?;
        }
        Ok(())
    })
}

fn initialize_account(
    db: &mut InMemoryDB,
    arbos_state: &ArbosState,
    account: &AccountRecord,
) -> Result<(), GenesisError> {
    let address = account.address;
    if let Some(aggregator) = &account.aggregator_info {
        let poster_table = arbos_state.l1_pricing().batch_poster_table();
        if poster_table.contains_poster(db, address) {
            // Already authorized, only the fee collector changes.
            poster_table
                .open_poster(db, address, false)?
                .set_pay_to(db, aggregator.fee_collector);
        } else {
            debug!(%address, "ignoring aggregator info of an account that is not a batch poster");
        }
    }

    db.set_balance(address, account.balance);
    db.set_nonce(address, account.nonce);
    if let Some(contract) = &account.contract_info {
        db.set_code(address, contract.code.clone());
        for (slot, value) in &contract.storage {
            db.set_storage(
                address,
                U256::from_be_bytes(slot.0),
                U256::from_be_bytes(value.0),
            );
        }
    }
    debug!(%address, "initialized account");
    Ok(())
}
