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

//! A minimal Merkle-Patricia trie root builder.
//!
//! The genesis build never needs proofs or lookups, only the commitment over a complete key set,
//! so the root is computed in one pass over the sorted leaves instead of through an incrementally
//! updated node graph.

use std::collections::BTreeMap;

use alloy_primitives::{b256, keccak256, B256, U256};
use alloy_rlp::{Encodable, Header, EMPTY_STRING_CODE};
use alloy_rlp_derive::RlpEncodable;
use serde::{Deserialize, Serialize};

/// Root hash of an empty trie.
pub const EMPTY_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Keccak-256 hash of the empty byte string, the code hash of accounts without code.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// Keccak-256 hash of the RLP encoding of an empty list, the ommers hash of a block without
/// uncles.
pub const EMPTY_LIST_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Computes the Keccak-256 hash of the given data.
#[inline]
pub fn keccak(data: impl AsRef<[u8]>) -> B256 {
    keccak256(data)
}

/// An account as it is stored in the state trie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, RlpEncodable)]
pub struct StateAccount {
    /// The number of transactions sent from this account.
    pub nonce: u64,
    /// The balance of the account in wei.
    pub balance: U256,
    /// Root of the account's storage trie.
    pub storage_root: B256,
    /// Hash of the account's code.
    pub code_hash: B256,
}

impl Default for StateAccount {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::ZERO,
            storage_root: EMPTY_ROOT,
            code_hash: KECCAK_EMPTY,
        }
    }
}

/// Computes the root of a trie holding the given key/value pairs.
///
/// Keys are used verbatim, callers that need a secure trie hash them first. When a key occurs
/// more than once the last value wins.
pub fn trie_root<K, V, I>(entries: I) -> B256
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let leaves: BTreeMap<Vec<u8>, Vec<u8>> = entries
        .into_iter()
        .map(|(key, value)| (to_nibs(key.as_ref()), value.as_ref().to_vec()))
        .collect();
    if leaves.is_empty() {
        return EMPTY_ROOT;
    }
    let leaves: Vec<(Vec<u8>, Vec<u8>)> = leaves.into_iter().collect();
    keccak(encode_node(&leaves, 0))
}

/// Computes the root of a secure trie, where every key is hashed before insertion.
pub fn secure_trie_root<K, V, I>(entries: I) -> B256
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    trie_root(
        entries
            .into_iter()
            .map(|(key, value)| (keccak(key).0, value)),
    )
}

/// Returns the RLP encoding of the node covering `leaves`, all of which share the first `depth`
/// nibbles. `leaves` must be sorted and non-empty.
fn encode_node(leaves: &[(Vec<u8>, Vec<u8>)], depth: usize) -> Vec<u8> {
    if let [(key, value)] = leaves {
        return encode_list(&[
            encode_bytes(&to_encoded_path(&key[depth..], true)),
            encode_bytes(value),
        ]);
    }

    // Sorted keys share a prefix with all others iff the first and the last do.
    let first = &leaves[0].0;
    let last = &leaves[leaves.len() - 1].0;
    let shared = first[depth..]
        .iter()
        .zip(&last[depth..])
        .take_while(|(a, b)| a == b)
        .count();
    if shared > 0 {
        let child = encode_node(leaves, depth + shared);
        return encode_list(&[
            encode_bytes(&to_encoded_path(&first[depth..depth + shared], false)),
            node_reference(child),
        ]);
    }

    let (value, mut rest) = if first.len() == depth {
        (Some(&leaves[0].1), &leaves[1..])
    } else {
        (None, leaves)
    };
    let mut items = Vec::with_capacity(17);
    for nibble in 0..16u8 {
        let count = rest
            .iter()
            .take_while(|(key, _)| key[depth] == nibble)
            .count();
        if count == 0 {
            items.push(vec![EMPTY_STRING_CODE]);
        } else {
            items.push(node_reference(encode_node(&rest[..count], depth + 1)));
            rest = &rest[count..];
        }
    }
    items.push(match value {
        Some(value) => encode_bytes(value),
        None => vec![EMPTY_STRING_CODE],
    });
    encode_list(&items)
}

/// Nodes shorter than a hash are embedded in their parent, all others are referenced by hash.
fn node_reference(node: Vec<u8>) -> Vec<u8> {
    if node.len() < 32 {
        node
    } else {
        encode_bytes(keccak(&node).as_slice())
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 5);
    Encodable::encode(bytes, &mut out);
    out
}

fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_length = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_length + 5);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Splits bytes into nibbles.
fn to_nibs(bytes: &[u8]) -> Vec<u8> {
    let mut nibs = Vec::with_capacity(2 * bytes.len());
    for byte in bytes {
        nibs.push(byte >> 4);
        nibs.push(byte & 0xf);
    }
    nibs
}

/// Hex-prefix encoding of a nibble path, flagging leaves and odd lengths in the first nibble.
fn to_encoded_path(nibs: &[u8], is_leaf: bool) -> Vec<u8> {
    let flag = if is_leaf { 0x20 } else { 0x00 };
    let mut path = Vec::with_capacity(nibs.len() / 2 + 1);
    let rest = if nibs.len() % 2 == 1 {
        path.push(flag | 0x10 | nibs[0]);
        &nibs[1..]
    } else {
        path.push(flag);
        nibs
    };
    for pair in rest.chunks(2) {
        path.push((pair[0] << 4) | pair[1]);
    }
    path
}
