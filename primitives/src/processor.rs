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

use alloy_primitives::{Address, B256};
use revm::db::InMemoryDB;
use tracing::{debug, info};

use crate::arbos::ArbosState;
use crate::chain_config::{ChainConfig, ParsedInitMessage};
use crate::db::InMemoryDBHelper;
use crate::error::GenesisError;
use crate::loader::{initialize_accounts, initialize_retryables, populate_address_table};
use crate::observer::{Phase, PhaseObserver, PhaseReport};
use crate::reader::InitDataReader;

/// Builds the genesis state of a chain and computes its root.
///
/// Each processor owns a fresh accumulator and is consumed by [GenesisProcessor::build], so a
/// partially built state never escapes.
pub struct GenesisProcessor<O = ()> {
    /// The chain the state is built for.
    pub chain_config: ChainConfig,

    /// The init message the chain starts from.
    pub init_message: ParsedInitMessage,

    /// Retryables timing out at or before this timestamp are paid out instead of created.
    pub timestamp: u64,

    /// Notified after every phase.
    pub observer: O,

    db: InMemoryDB,
}

impl GenesisProcessor {
    pub fn new(chain_config: ChainConfig, init_message: ParsedInitMessage, timestamp: u64) -> Self {
        Self {
            chain_config,
            init_message,
            timestamp,
            observer: (),
            db: InMemoryDB::default(),
        }
    }
}

impl<O: PhaseObserver> GenesisProcessor<O> {
    pub fn with_observer<P: PhaseObserver>(self, observer: P) -> GenesisProcessor<P> {
        GenesisProcessor {
            chain_config: self.chain_config,
            init_message: self.init_message,
            timestamp: self.timestamp,
            observer,
            db: self.db,
        }
    }

    /// Runs every phase over `init_data` and returns the state root.
    pub fn build<R: InitDataReader>(mut self, mut init_data: R) -> Result<B256, GenesisError> {
        info!(
            chain_id = self.chain_config.chain_id,
            arbos_version = self.chain_config.arbitrum.initial_arbos_version,
            "building genesis state"
        );

        let arbos_state = self.initialize()?;
        self.register_chain_owner(&arbos_state, init_data.chain_owner()?);

        let reader = init_data.address_table_reader()?;
        populate_address_table(&mut self.db, arbos_state.address_table(), reader)?;
        self.report(Phase::AddressTable);

        let reader = init_data.retryable_reader()?;
        initialize_retryables(
            &mut self.db,
            arbos_state.retryable_state(),
            reader,
            self.timestamp,
        )?;
        self.report(Phase::Retryables);

        let reader = init_data.account_reader()?;
        initialize_accounts(&mut self.db, &arbos_state, reader)?;
        self.report(Phase::Accounts);

        Ok(self.finalize())
    }

    /// Writes the protocol state. Must run before any account or retryable is loaded.
    fn initialize(&mut self) -> Result<ArbosState, GenesisError> {
        let state = ArbosState::initialize(&mut self.db, &self.chain_config, &self.init_message)?;
        self.report(Phase::ProtocolState);
        Ok(state)
    }

    fn register_chain_owner(&mut self, arbos_state: &ArbosState, owner: Address) {
        if owner.is_zero() {
            debug!("no chain owner to register");
        } else {
            arbos_state.chain_owners().add(&mut self.db, owner);
            debug!(%owner, "registered chain owner");
        }
        self.report(Phase::ChainOwner);
    }

    /// Commits the accumulator. Nothing is persisted.
    fn finalize(self) -> B256 {
        let root = self.db.state_root();
        info!(%root, accounts = self.db.accounts.len(), "computed genesis state root");
        root
    }

    fn report(&mut self, phase: Phase) {
        self.observer.on_phase(&PhaseReport::new(phase, &self.db));
    }
}

/// Computes the genesis state root for `init_data`.
pub fn calculate_state_root<R: InitDataReader>(
    init_data: R,
    chain_config: &ChainConfig,
    init_message: &ParsedInitMessage,
    timestamp: u64,
) -> Result<B256, GenesisError> {
    GenesisProcessor::new(chain_config.clone(), init_message.clone(), timestamp).build(init_data)
}
