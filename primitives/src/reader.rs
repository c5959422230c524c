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

//! Sequential record streams feeding the genesis build.

use std::collections::VecDeque;
use std::mem;

use alloy_primitives::Address;
use tracing::warn;

use crate::error::{GenesisError, ReaderError};
use crate::{AccountRecord, InitializationInfo, RetryableRecord};

/// A sequential, closable stream of init records. Records must be yielded in the order the
/// producer listed them.
pub trait RecordReader {
    type Item;

    /// Returns whether another record is available.
    fn has_more(&self) -> bool;

    /// Returns the next record.
    fn get_next(&mut self) -> Result<Self::Item, ReaderError>;

    /// Releases the stream. Called exactly once by the consumer.
    fn close(&mut self) -> Result<(), ReaderError>;
}

/// Access to the three record streams and the chain owner making up a genesis init data set.
pub trait InitDataReader {
    type AddressReader: RecordReader<Item = Address>;
    type RetryableReader: RecordReader<Item = RetryableRecord>;
    type AccountReader: RecordReader<Item = AccountRecord>;

    /// Returns the chain owner to register, the zero address meaning none.
    fn chain_owner(&self) -> Result<Address, ReaderError>;

    fn address_table_reader(&mut self) -> Result<Self::AddressReader, ReaderError>;

    fn retryable_reader(&mut self) -> Result<Self::RetryableReader, ReaderError>;

    fn account_reader(&mut self) -> Result<Self::AccountReader, ReaderError>;
}

/// A [RecordReader] over records held in memory.
#[derive(Debug, Clone)]
pub struct MemoryReader<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> MemoryReader<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            closed: false,
        }
    }
}

impl<T> RecordReader for MemoryReader<T> {
    type Item = T;

    fn has_more(&self) -> bool {
        !self.closed && !self.items.is_empty()
    }

    fn get_next(&mut self) -> Result<T, ReaderError> {
        if self.closed {
            return Err(ReaderError::Closed);
        }
        self.items.pop_front().ok_or(ReaderError::Exhausted)
    }

    fn close(&mut self) -> Result<(), ReaderError> {
        if self.closed {
            return Err(ReaderError::Closed);
        }
        self.closed = true;
        Ok(())
    }
}

/// An [InitDataReader] backed by an [InitializationInfo]. Each stream can be opened once, later
/// openings yield empty streams.
#[derive(Debug, Clone, Default)]
pub struct MemoryInitDataReader {
    info: InitializationInfo,
}

impl MemoryInitDataReader {
    pub fn new(info: InitializationInfo) -> Self {
        Self { info }
    }
}

impl InitDataReader for MemoryInitDataReader {
    type AddressReader = MemoryReader<Address>;
    type RetryableReader = MemoryReader<RetryableRecord>;
    type AccountReader = MemoryReader<AccountRecord>;

    fn chain_owner(&self) -> Result<Address, ReaderError> {
        Ok(self.info.chain_owner)
    }

    fn address_table_reader(&mut self) -> Result<Self::AddressReader, ReaderError> {
        Ok(MemoryReader::new(mem::take(&mut self.info.address_table)))
    }

    fn retryable_reader(&mut self) -> Result<Self::RetryableReader, ReaderError> {
        Ok(MemoryReader::new(mem::take(&mut self.info.retryables)))
    }

    fn account_reader(&mut self) -> Result<Self::AccountReader, ReaderError> {
        Ok(MemoryReader::new(mem::take(&mut self.info.accounts)))
    }
}

/// Runs `body` over `reader` and then closes it, whether or not `body` succeeded.
///
/// An error from `body` takes precedence over an error from closing.
pub fn consume<R, F>(mut reader: R, body: F) -> Result<(), GenesisError>
where
    R: RecordReader,
    F: FnOnce(&mut R) -> Result<(), GenesisError>,
{
    let result = body(&mut reader);
    let closed = reader.close();
    match (result, closed) {
        (Err(err), Err(close_err)) => {
            warn!(%close_err, "failed to close init data reader after error");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), closed) => closed.map_err(GenesisError::from),
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::ProbeReader;
    use super::*;

    fn drain<R: RecordReader>(reader: &mut R) -> Result<(), GenesisError> {
        while reader.has_more() {
            reader.get_next()?;
        }
        Ok(())
    }

    #[test]
    fn memory_reader_preserves_order() {
        let mut reader = MemoryReader::new([3, 1, 2]);
        let mut seen = Vec::new();
        while reader.has_more() {
            seen.push(reader.get_next().unwrap());
        }
        assert_eq!(seen, vec![3, 1, 2]);
        assert!(matches!(reader.get_next(), Err(ReaderError::Exhausted)));
        reader.close().unwrap();
        assert!(matches!(reader.close(), Err(ReaderError::Closed)));
        assert!(!reader.has_more());
    }

    #[test]
    fn consume_closes_once_on_success() {
        let reader = ProbeReader::new([1, 2, 3]);
        let closes = reader.closes.clone();
        consume(reader, drain).unwrap();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn consume_closes_once_on_error() {
        let reader = ProbeReader::new([1, 2, 3]).failing_at(1);
        let closes = reader.closes.clone();
        let err = consume(reader, drain).unwrap_err();
        assert!(matches!(err, GenesisError::Reader(ReaderError::Malformed(_))));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn consume_reports_close_failure() {
        let mut reader = ProbeReader::new([1]);
        reader.fail_close = true;
        let err = consume(reader, drain).unwrap_err();
        assert!(matches!(err, GenesisError::Reader(ReaderError::Malformed(msg)) if msg == "close"));
    }

    #[test]
    fn body_error_wins_over_close_error() {
        let mut reader = ProbeReader::new([1]).failing_at(0);
        reader.fail_close = true;
        let err = consume(reader, drain).unwrap_err();
        assert!(matches!(err, GenesisError::Reader(ReaderError::Malformed(msg)) if msg == "record 0"));
    }

    #[test]
    fn memory_init_data_streams_open_once() {
        let mut init = MemoryInitDataReader::new(InitializationInfo {
            address_table: vec![Address::repeat_byte(1)],
            ..Default::default()
        });
        assert!(init.address_table_reader().unwrap().has_more());
        assert!(!init.address_table_reader().unwrap().has_more());
    }
}
