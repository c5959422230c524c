use alloy_primitives::{address, Address, Bytes, B256, U256};
use arb_genesis_primitives::arbos::retryables::retryable_escrow_address;
use arb_genesis_primitives::arbos::ArbosState;
use arb_genesis_primitives::chain_config::{ArbitrumChainParams, ChainConfig, ParsedInitMessage};
use arb_genesis_primitives::db::InMemoryDBHelper;
use arb_genesis_primitives::loader::{initialize_retryables, populate_address_table};
use arb_genesis_primitives::reader::{InitDataReader, MemoryInitDataReader, MemoryReader, RecordReader};
use arb_genesis_primitives::{
    calculate_state_root, AccountRecord, GenesisError, InitializationInfo, ReaderError,
    RetryableRecord,
};
use revm::db::InMemoryDB;

const OWNER: Address = address!("5E1497dD1f08C87b2d8FE23e9AAB6c1De833D927");
const BENEFICIARY: Address = address!("00000000000000000000000000000000000000be");

fn chain_config() -> ChainConfig {
    ChainConfig {
        chain_id: 412346,
        arbitrum: ArbitrumChainParams {
            enable_arbos: true,
            initial_arbos_version: 20,
            initial_chain_owner: OWNER,
            ..Default::default()
        },
    }
}

fn build(info: InitializationInfo, timestamp: u64) -> Result<B256, GenesisError> {
    let config = chain_config();
    let message = ParsedInitMessage::new(config.clone());
    calculate_state_root(MemoryInitDataReader::new(info), &config, &message, timestamp)
}

fn owner_only() -> InitializationInfo {
    InitializationInfo {
        chain_owner: OWNER,
        ..Default::default()
    }
}

fn id(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

fn retryable(value: u64, timeout: u64, callvalue: u64) -> RetryableRecord {
    RetryableRecord {
        id: id(value),
        timeout,
        from: Address::with_last_byte(0xf0),
        to: Some(Address::with_last_byte(0x70)),
        callvalue: U256::from(callvalue),
        beneficiary: BENEFICIARY,
        calldata: Bytes::from_static(b"calldata"),
    }
}

fn protocol_state() -> (InMemoryDB, ArbosState) {
    let config = chain_config();
    let message = ParsedInitMessage::new(config.clone());
    let mut db = InMemoryDB::default();
    let state = ArbosState::initialize(&mut db, &config, &message).unwrap();
    (db, state)
}

#[test]
fn empty_init_data_commits_only_protocol_state() {
    let root = build(owner_only(), 0).unwrap();

    let (mut db, state) = protocol_state();
    state.chain_owners().add(&mut db, OWNER);
    assert_eq!(root, db.state_root());
    assert_eq!(state.chain_owners().all_members(&db), vec![OWNER]);
}

#[test]
fn funded_account_changes_the_root_reproducibly() {
    let empty = build(owner_only(), 0).unwrap();
    let funded = || InitializationInfo {
        accounts: vec![AccountRecord {
            address: Address::with_last_byte(0xaa),
            balance: U256::from(100),
            nonce: 1,
            contract_info: None,
            aggregator_info: None,
        }],
        ..owner_only()
    };

    let first = build(funded(), 0).unwrap();
    let second = build(funded(), 0).unwrap();
    assert_ne!(first, empty);
    assert_eq!(first, second);
}

#[test]
fn equal_timeouts_escrow_in_id_order() {
    let (mut db, state) = protocol_state();
    initialize_retryables(
        &mut db,
        state.retryable_state(),
        MemoryReader::new([retryable(5, 500, 1), retryable(2, 500, 1)]),
        100,
    )
    .unwrap();
    assert_eq!(
        state.retryable_state().timeout_queue().items(&db),
        vec![id(2), id(5)]
    );

    // Writing the tickets the other way round lays out the queue differently.
    let (mut reversed, state) = protocol_state();
    for value in [5, 2] {
        let ticket = retryable(value, 500, 1);
        reversed
            .add_balance(retryable_escrow_address(ticket.id), ticket.callvalue)
            .unwrap();
        state.retryable_state().create_retryable(&mut reversed, &ticket);
    }
    assert_ne!(db.state_root(), reversed.state_root());

    // Input order does not matter once the tickets are sorted.
    let forward = InitializationInfo {
        retryables: vec![retryable(2, 500, 1), retryable(5, 500, 1)],
        ..owner_only()
    };
    let backward = InitializationInfo {
        retryables: vec![retryable(5, 500, 1), retryable(2, 500, 1)],
        ..owner_only()
    };
    assert_eq!(build(forward, 100).unwrap(), build(backward, 100).unwrap());
}

#[test]
fn retryable_expiring_now_settles_to_the_beneficiary() {
    let (mut db, state) = protocol_state();
    initialize_retryables(
        &mut db,
        state.retryable_state(),
        MemoryReader::new([retryable(9, 1_000, 250)]),
        1_000,
    )
    .unwrap();

    assert_eq!(db.balance(BENEFICIARY), U256::from(250));
    assert!(state.retryable_state().open_retryable(&db, id(9), 0).is_none());
    assert_eq!(db.balance(retryable_escrow_address(id(9))), U256::ZERO);

    // The same state as simply funding the beneficiary.
    let expired = build(
        InitializationInfo {
            retryables: vec![retryable(9, 1_000, 250)],
            ..owner_only()
        },
        1_000,
    )
    .unwrap();
    let funded = build(
        InitializationInfo {
            accounts: vec![AccountRecord {
                address: BENEFICIARY,
                balance: U256::from(250),
                nonce: 0,
                contract_info: None,
                aggregator_info: None,
            }],
            ..owner_only()
        },
        1_000,
    )
    .unwrap();
    assert_eq!(expired, funded);
}

#[test]
fn address_table_order_is_committed() {
    let a = Address::with_last_byte(1);
    let b = Address::with_last_byte(2);
    let ab = build(
        InitializationInfo {
            address_table: vec![a, b],
            ..owner_only()
        },
        0,
    )
    .unwrap();
    let ba = build(
        InitializationInfo {
            address_table: vec![b, a],
            ..owner_only()
        },
        0,
    )
    .unwrap();
    assert_ne!(ab, ba);
}

#[test]
fn populated_address_table_is_rejected() {
    let (mut db, state) = protocol_state();
    state
        .address_table()
        .register(&mut db, Address::with_last_byte(1));
    let err = populate_address_table(
        &mut db,
        state.address_table(),
        MemoryReader::new([Address::with_last_byte(2)]),
    )
    .unwrap_err();
    assert!(matches!(err, GenesisError::InvariantViolation(_)));
}

#[test]
fn chain_id_mismatch_is_fatal() {
    let config = chain_config();
    let mut message = ParsedInitMessage::new(config.clone());
    message.chain_id = 1;
    let err =
        calculate_state_root(MemoryInitDataReader::new(owner_only()), &config, &message, 0)
            .unwrap_err();
    assert!(err.is_fatal());
}

/// Init data whose account stream cannot be decoded.
struct BrokenAccounts {
    inner: MemoryInitDataReader,
}

struct BrokenReader {
    closed: bool,
}

impl RecordReader for BrokenReader {
    type Item = AccountRecord;

    fn has_more(&self) -> bool {
        !self.closed
    }

    fn get_next(&mut self) -> Result<AccountRecord, ReaderError> {
        Err(ReaderError::Malformed("truncated account".into()))
    }

    fn close(&mut self) -> Result<(), ReaderError> {
        self.closed = true;
        Ok(())
    }
}

impl InitDataReader for BrokenAccounts {
    type AddressReader = MemoryReader<Address>;
    type RetryableReader = MemoryReader<RetryableRecord>;
    type AccountReader = BrokenReader;

    fn chain_owner(&self) -> Result<Address, ReaderError> {
        self.inner.chain_owner()
    }

    fn address_table_reader(&mut self) -> Result<Self::AddressReader, ReaderError> {
        self.inner.address_table_reader()
    }

    fn retryable_reader(&mut self) -> Result<Self::RetryableReader, ReaderError> {
        self.inner.retryable_reader()
    }

    fn account_reader(&mut self) -> Result<Self::AccountReader, ReaderError> {
        Ok(BrokenReader { closed: false })
    }
}

#[test]
fn reader_errors_abort_the_build() {
    let config = chain_config();
    let message = ParsedInitMessage::new(config.clone());
    let init_data = BrokenAccounts {
        inner: MemoryInitDataReader::new(owner_only()),
    };
    let err = calculate_state_root(init_data, &config, &message, 0).unwrap_err();
    assert!(matches!(
        err,
        GenesisError::Reader(ReaderError::Malformed(_))
    ));
    assert!(!err.is_fatal());
}
