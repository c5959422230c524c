//! A host bridge for computing genesis roots: a genesis descriptor goes in as JSON, a structured
//! result comes out.

use alloy_primitives::B256;
use arb_genesis_primitives::genesis::{state_and_block_root_from_genesis, Genesis};
use arb_genesis_primitives::GenesisError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The result handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        state_root: B256,
        block_hash: B256,
        /// Decimal string, the way hosts read big-integer chain ids.
        chain_id: String,
        /// Hex encoded, like the descriptor.
        gas_limit: String,
        timestamp: String,
        accounts: usize,
    },
    Error {
        error: String,
        /// Set when the build hit an unrecoverable setup failure.
        fatal: bool,
    },
}

impl BridgeResponse {
    fn failed(err: GenesisError) -> Self {
        warn!(%err, fatal = err.is_fatal(), "genesis build failed");
        Self::Error {
            fatal: err.is_fatal(),
            error: err.to_string(),
        }
    }

    /// The process exit code for this response: 0 on success, 1 on error, 2 on a fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success { .. } => 0,
            Self::Error { fatal: false, .. } => 1,
            Self::Error { fatal: true, .. } => 2,
        }
    }
}

/// Computes the genesis roots of the descriptor `genesis_json`.
pub fn calculate_state_root(genesis_json: &str) -> BridgeResponse {
    let genesis: Genesis = match serde_json::from_str(genesis_json) {
        Ok(genesis) => genesis,
        Err(err) => {
            return BridgeResponse::Error {
                error: format!("failed to parse genesis JSON: {err}"),
                fatal: false,
            }
        }
    };

    match state_and_block_root_from_genesis(&genesis) {
        Ok(roots) => BridgeResponse::Success {
            state_root: roots.state_root,
            block_hash: roots.block_hash,
            // A descriptor that built successfully always has a config.
            chain_id: genesis
                .config
                .as_ref()
                .map_or(0, |config| config.chain_id)
                .to_string(),
            gas_limit: format!("{:#x}", genesis.gas_limit),
            timestamp: format!("{:#x}", genesis.timestamp),
            accounts: genesis.alloc.len(),
        },
        Err(err) => BridgeResponse::failed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn genesis(version: u64, owner: &str) -> String {
        json!({
            "config": {
                "chainId": 412346,
                "arbitrum": {
                    "EnableArbOS": true,
                    "InitialArbOSVersion": version,
                    "InitialChainOwner": owner,
                },
            },
            "timestamp": "0x0",
            "gasLimit": "0x4000000000000",
            "alloc": {
                "0x3f1eae7d46d88f08fc2f8ed27fcb2ab183eb2d0e": { "balance": "0x100" },
            },
        })
        .to_string()
    }

    const OWNER: &str = "0x5E1497dD1f08C87b2d8FE23e9AAB6c1De833D927";

    #[test]
    fn success_reports_roots_and_metadata() {
        let response = calculate_state_root(&genesis(20, OWNER));
        assert_eq!(response.exit_code(), 0);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["chainId"], "412346");
        assert_eq!(value["gasLimit"], "0x4000000000000");
        assert_eq!(value["timestamp"], "0x0");
        assert_eq!(value["accounts"], 1);
        assert_eq!(value["stateRoot"].as_str().map(str::len), Some(66));
        assert_eq!(value["blockHash"].as_str().map(str::len), Some(66));
        assert!(value.get("error").is_none());

        assert_eq!(response, calculate_state_root(&genesis(20, OWNER)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let response = calculate_state_root("{ not json");
        assert!(matches!(response, BridgeResponse::Error { fatal: false, .. }));
        assert_eq!(response.exit_code(), 1);
    }

    #[test]
    fn missing_owner_is_an_error() {
        let response = calculate_state_root(&genesis(
            20,
            "0x0000000000000000000000000000000000000000",
        ));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["fatal"], false);
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("initial chain owner"));
    }

    #[test]
    fn unsupported_version_is_fatal() {
        let response = calculate_state_root(&genesis(1_000, OWNER));
        assert!(matches!(response, BridgeResponse::Error { fatal: true, .. }));
        assert_eq!(response.exit_code(), 2);
    }
}
