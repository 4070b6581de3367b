//! Registry of x402 v1 network names.
//!
//! The v1 protocol identifies chains by a human-readable network name
//! ("base-sepolia") rather than a numeric chain id. Signing an EIP-712
//! payment authorization needs the numeric EIP-155 chain id for the domain,
//! so this module keeps the mapping both ways.

/// A network the x402 v1 protocol knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Wire-level network name, e.g. `"base-sepolia"`.
    pub name: &'static str,
    /// Numeric EIP-155 chain id, e.g. `84532`.
    pub chain_id: u64,
}

/// EVM networks supported by the x402 v1 protocol.
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    // Base
    NetworkInfo { name: "base", chain_id: 8453 },
    NetworkInfo { name: "base-sepolia", chain_id: 84532 },
    // Polygon
    NetworkInfo { name: "polygon", chain_id: 137 },
    NetworkInfo { name: "polygon-amoy", chain_id: 80002 },
    // Avalanche
    NetworkInfo { name: "avalanche", chain_id: 43114 },
    NetworkInfo { name: "avalanche-fuji", chain_id: 43113 },
    // Sei
    NetworkInfo { name: "sei", chain_id: 1329 },
    NetworkInfo { name: "sei-testnet", chain_id: 1328 },
    // XDC
    NetworkInfo { name: "xdc", chain_id: 50 },
    // XRPL EVM
    NetworkInfo { name: "xrpl-evm", chain_id: 1440000 },
    // Peaq
    NetworkInfo { name: "peaq", chain_id: 3338 },
    // IoTeX
    NetworkInfo { name: "iotex", chain_id: 4689 },
    // Celo
    NetworkInfo { name: "celo", chain_id: 42220 },
    NetworkInfo { name: "celo-sepolia", chain_id: 11142220 },
];

/// Resolves a v1 network name to its EIP-155 chain id.
pub fn eip155_chain_id(network: &str) -> Option<u64> {
    KNOWN_NETWORKS
        .iter()
        .find(|n| n.name == network)
        .map(|n| n.chain_id)
}

/// Reverse lookup: the v1 network name for an EIP-155 chain id.
pub fn network_name(chain_id: u64) -> Option<&'static str> {
    KNOWN_NETWORKS
        .iter()
        .find(|n| n.chain_id == chain_id)
        .map(|n| n.name)
}
