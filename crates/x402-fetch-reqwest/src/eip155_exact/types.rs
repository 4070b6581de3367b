use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use x402_fetch_types::proto;
use x402_fetch_types::timestamp::UnixTimestamp;

/// Marker for the `exact` payment scheme.
///
/// Serializes as the string `"exact"` and deserializes only from it, so a
/// typed requirement can never hold a foreign scheme.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub enum ExactScheme {
    #[serde(rename = "exact")]
    Exact,
}

impl Display for ExactScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "exact")
    }
}

impl FromStr for ExactScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(ExactScheme::Exact),
            other => Err(format!("expected scheme 'exact', got '{other}'")),
        }
    }
}

/// EIP-712 domain name and version for the token contract, supplied by the
/// seller in the `extra` field of the requirements.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainExtra {
    pub name: String,
    pub version: String,
}

/// Payment requirements parsed into EVM types.
pub type PaymentRequirements = proto::PaymentRequirements<ExactScheme, U256, Address, DomainExtra>;

/// The v1 payment envelope with a typed `exact` EVM payload.
pub type PaymentPayload = proto::PaymentPayload<ExactScheme, ExactEvmPayload>;

/// Everything needed to authorize an ERC-3009 transfer:
/// the EIP-712 signature plus the struct that was signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    pub signature: Bytes,
    pub authorization: ExactEvmPayloadAuthorization,
}

/// The ERC-3009 authorization fields: who transfers how much to whom, and
/// within which validity window.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
}

sol! {
    /// Solidity-compatible struct for ERC-3009 `transferWithAuthorization`.
    ///
    /// The facilitator reconstructs this exact typed-data struct from the
    /// authorization fields to verify the signature, so the values signed
    /// here must match [`ExactEvmPayloadAuthorization`] field for field.
    #[derive(Serialize, Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}
