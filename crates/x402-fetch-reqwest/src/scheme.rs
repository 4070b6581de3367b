//! The scheme-client plugin surface.
//!
//! A scheme client knows how to pay on one (scheme, chain family) pair. Given
//! a parsed challenge it bids with zero or more [`PaymentCandidate`]s; the
//! interceptor picks one via a [`crate::PaymentSelector`] and asks it to sign.

use alloy_primitives::U256;
use async_trait::async_trait;
use x402_fetch_types::proto;

use crate::error::X402Error;

/// One payment method a scheme client is able and willing to execute.
///
/// Carries enough metadata for selection (amount, asset, network) plus the
/// untyped requirements it was derived from, which the interceptor needs to
/// assemble a facilitator verify request.
pub struct PaymentCandidate {
    /// The payment scheme, e.g. `"exact"`.
    pub scheme: String,
    /// The network name, e.g. `"base-sepolia"`.
    pub network: String,
    /// The token asset address, as it appeared on the wire.
    pub asset: String,
    /// The amount that would be authorized, in token base units.
    pub amount: U256,
    /// The recipient address, as it appeared on the wire.
    pub pay_to: String,
    /// The wire-form requirements this candidate satisfies.
    pub requirements: proto::PaymentRequirements,
    /// Deferred signing for this candidate.
    pub signer: Box<dyn PaymentCandidateSigner>,
}

impl PaymentCandidate {
    /// Signs the payment authorization for this candidate.
    ///
    /// Returns the full v1 `PaymentPayload` as JSON, ready for base64 header
    /// encoding or facilitator verification.
    pub async fn sign(&self) -> Result<serde_json::Value, X402Error> {
        self.signer.sign_payment().await
    }
}

impl std::fmt::Debug for PaymentCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCandidate")
            .field("scheme", &self.scheme)
            .field("network", &self.network)
            .field("asset", &self.asset)
            .field("amount", &self.amount)
            .field("pay_to", &self.pay_to)
            .finish_non_exhaustive()
    }
}

/// Deferred construction and signing of a payment authorization.
///
/// Kept separate from [`PaymentCandidate`] so candidates can be ranked and
/// discarded without doing any cryptography. Signing is stateless; a fresh
/// nonce is generated per call.
#[async_trait]
pub trait PaymentCandidateSigner: Send + Sync {
    /// Builds and signs the payment payload, returned as JSON.
    async fn sign_payment(&self) -> Result<serde_json::Value, X402Error>;
}

/// A client-side payment scheme implementation.
///
/// Implementations inspect a challenge and return candidates for every
/// payment method they can execute. Returning an empty vector means "cannot
/// pay any of these", which is not an error.
pub trait X402SchemeClient: Send + Sync {
    /// Chain family namespace this client operates in, e.g. `"eip155"`.
    fn namespace(&self) -> &str;

    /// Scheme identifier this client implements, e.g. `"exact"`.
    fn scheme(&self) -> &str;

    /// Bids on a payment challenge.
    fn accept(&self, challenge: &proto::PaymentRequired) -> Vec<PaymentCandidate>;
}
