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

//! The protocol state written at genesis.

pub mod address_set;
pub mod address_table;
pub mod l1_pricing;
pub mod l2_pricing;
pub mod precompiles;
pub mod retryables;
pub mod state;
pub mod storage;

pub use state::ArbosState;
pub use storage::ARBOS_STATE_ADDRESS;
