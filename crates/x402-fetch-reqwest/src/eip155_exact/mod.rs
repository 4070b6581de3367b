//! The x402 v1 `exact` payment scheme on EIP-155 (EVM) chains.
//!
//! Pays by signing an ERC-3009 `TransferWithAuthorization` struct via
//! EIP-712: the token contract is the verifying contract, the seller's
//! `extra` field supplies the domain name/version, and a random 32-byte
//! nonce makes each authorization single-use. No transaction is sent by the
//! client; the server (or its facilitator) settles the transfer on-chain
//! using the signature.

use alloy_primitives::{Address, B256, FixedBytes, Signature, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, eip712_domain};
use async_trait::async_trait;
use rand::{Rng, rng};
use std::sync::Arc;

use x402_fetch_types::networks;
use x402_fetch_types::proto::{self, X402Version1};
use x402_fetch_types::timestamp::UnixTimestamp;

use crate::error::X402Error;
use crate::scheme::{PaymentCandidate, PaymentCandidateSigner, X402SchemeClient};

pub mod types;

pub use types::{DomainExtra, ExactEvmPayload, ExactEvmPayloadAuthorization, ExactScheme};

use types::TransferWithAuthorization;

/// Authorizations are backdated this many seconds so a payment is valid
/// immediately despite clock skew between buyer, seller, and chain.
const VALID_AFTER_SKEW_SECS: u64 = 10 * 60;

/// Scheme client for `exact` payments on EVM chains.
///
/// Bids on every challenge entry whose scheme is `exact` and whose network
/// name resolves to a known EIP-155 chain id.
#[derive(Debug)]
pub struct Eip155ExactClient<S> {
    signer: S,
}

impl<S> Eip155ExactClient<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> X402SchemeClient for Eip155ExactClient<S>
where
    S: SignerLike + Clone + Send + Sync + 'static,
{
    fn namespace(&self) -> &str {
        "eip155"
    }

    fn scheme(&self) -> &str {
        "exact"
    }

    fn accept(&self, challenge: &proto::PaymentRequired) -> Vec<PaymentCandidate> {
        challenge
            .accepts
            .iter()
            .filter_map(|wire| {
                let requirements: types::PaymentRequirements = wire.as_concrete()?;
                let chain_id = networks::eip155_chain_id(&requirements.network)?;
                Some(PaymentCandidate {
                    scheme: requirements.scheme.to_string(),
                    network: requirements.network.clone(),
                    asset: requirements.asset.to_string(),
                    amount: requirements.max_amount_required,
                    pay_to: requirements.pay_to.to_string(),
                    requirements: wire.clone(),
                    signer: Box::new(PayloadSigner {
                        signer: self.signer.clone(),
                        chain_id,
                        requirements,
                    }),
                })
            })
            .collect()
    }
}

/// Parameters for signing one ERC-3009 authorization.
#[derive(Debug, Clone)]
pub struct SigningParams {
    /// Numeric EIP-155 chain id for the EIP-712 domain.
    pub chain_id: u64,
    /// Token contract address (the verifying contract).
    pub asset: Address,
    /// Transfer recipient.
    pub pay_to: Address,
    /// Transfer amount in token base units.
    pub amount: U256,
    /// Length of the validity window, in seconds.
    pub max_timeout_seconds: u64,
    /// EIP-712 domain name/version override from the seller.
    pub extra: Option<DomainExtra>,
}

/// Signs an ERC-3009 `TransferWithAuthorization` via EIP-712.
///
/// The authorization window is `[now - 600s, now + max_timeout_seconds]` and
/// the nonce is 32 random bytes, freshly drawn per call.
pub async fn sign_transfer_authorization<S: SignerLike + Sync>(
    signer: &S,
    params: &SigningParams,
) -> Result<ExactEvmPayload, X402Error> {
    let (name, version) = match &params.extra {
        None => (String::new(), String::new()),
        Some(extra) => (extra.name.clone(), extra.version.clone()),
    };
    let domain = eip712_domain! {
        name: name,
        version: version,
        chain_id: params.chain_id,
        verifying_contract: params.asset,
    };

    let now = UnixTimestamp::now();
    let valid_after = now.saturating_sub(VALID_AFTER_SKEW_SECS);
    // maxTimeoutSeconds comes from an untrusted challenge; clamp rather
    // than overflow on absurd values.
    let valid_before = now.saturating_add(params.max_timeout_seconds);
    let nonce: [u8; 32] = rng().random();
    let nonce = B256::from(nonce);

    let authorization = ExactEvmPayloadAuthorization {
        from: signer.address(),
        to: params.pay_to,
        value: params.amount,
        valid_after,
        valid_before,
        nonce,
    };

    // The facilitator rebuilds this struct from the authorization fields to
    // verify the signature; the two must match exactly.
    let transfer = TransferWithAuthorization {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value,
        validAfter: U256::from(authorization.valid_after.as_secs()),
        validBefore: U256::from(authorization.valid_before.as_secs()),
        nonce: authorization.nonce,
    };
    let eip712_hash = transfer.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&eip712_hash)
        .await
        .map_err(|e| X402Error::SigningError(e.to_string()))?;

    Ok(ExactEvmPayload {
        signature: signature.as_bytes().into(),
        authorization,
    })
}

struct PayloadSigner<S> {
    signer: S,
    chain_id: u64,
    requirements: types::PaymentRequirements,
}

#[async_trait]
impl<S> PaymentCandidateSigner for PayloadSigner<S>
where
    S: SignerLike + Send + Sync,
{
    async fn sign_payment(&self) -> Result<serde_json::Value, X402Error> {
        let params = SigningParams {
            chain_id: self.chain_id,
            asset: self.requirements.asset,
            pay_to: self.requirements.pay_to,
            amount: self.requirements.max_amount_required,
            max_timeout_seconds: self.requirements.max_timeout_seconds,
            extra: self.requirements.extra.clone(),
        };
        let payload = sign_transfer_authorization(&self.signer, &params).await?;
        let payment = types::PaymentPayload {
            x402_version: X402Version1,
            scheme: ExactScheme::Exact,
            network: self.requirements.network.clone(),
            payload,
        };
        serde_json::to_value(&payment).map_err(X402Error::JsonEncode)
    }
}

/// Signing capability over an immutable key.
///
/// Alloy's `Signer` trait is not implemented for `Arc<T>`, but signers are
/// usually shared via `Arc` since `PrivateKeySigner` is not `Clone`able into
/// multiple scheme clients otherwise. This trait papers over both forms.
#[async_trait]
pub trait SignerLike {
    /// The address derived from the signing key.
    fn address(&self) -> Address;

    /// Signs the given 32-byte hash.
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl SignerLike for Arc<PrivateKeySigner> {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self.as_ref())
    }

    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self.as_ref(), hash).await
    }
}
