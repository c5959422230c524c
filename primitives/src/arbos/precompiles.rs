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

use alloy_primitives::{address, Address};

/// Code installed at every precompile address so that the accounts are never empty. The single
/// `INVALID` opcode makes direct execution of the placeholder fail.
pub const PRECOMPILE_MARKER_CODE: &[u8] = &[0xfe];

/// Precompiles available from the first ArbOS version, in address order.
///
/// Debug-only precompiles are included: a chain that disallows them rejects calls at runtime,
/// their accounts exist either way.
pub const GENESIS_PRECOMPILES: &[Address] = &[
    // ArbSys
    address!("0000000000000000000000000000000000000064"),
    // ArbInfo
    address!("0000000000000000000000000000000000000065"),
    // ArbAddressTable
    address!("0000000000000000000000000000000000000066"),
    // ArbFunctionTable
    address!("0000000000000000000000000000000000000068"),
    // ArbosTest
    address!("0000000000000000000000000000000000000069"),
    // ArbOwnerPublic
    address!("000000000000000000000000000000000000006b"),
    // ArbGasInfo
    address!("000000000000000000000000000000000000006c"),
    // ArbAggregator
    address!("000000000000000000000000000000000000006d"),
    // ArbRetryableTx
    address!("000000000000000000000000000000000000006e"),
    // ArbStatistics
    address!("000000000000000000000000000000000000006f"),
    // ArbOwner
    address!("0000000000000000000000000000000000000070"),
    // ArbDebug
    address!("00000000000000000000000000000000000000ff"),
    // ArbosActs
    address!("00000000000000000000000000000000000a4b05"),
];
