use alloy_primitives::U256;
use reqwest_middleware as rqm;

use crate::facilitator::FacilitatorClientError;

/// Errors raised while turning a 402 challenge into a paid retry.
#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    /// The response was a 402 but no scheme client was registered at all,
    /// so there is no signing capability to satisfy any challenge.
    #[error("no payment scheme clients registered; cannot satisfy a payment challenge")]
    NoSchemeClients,
    /// Scheme clients are registered, but none of them accepts any payment
    /// method offered by the challenge (unknown scheme or network), or the
    /// selector declined every candidate.
    #[error("no registered scheme client matches the payment challenge")]
    NoMatchingPaymentOption,
    /// The 402 response did not carry a parseable payment challenge.
    #[error("invalid 402 response: {0}")]
    ParseError(String),
    /// The selected payment exceeds the configured spend cap.
    /// Prevents accidental or malicious overspending.
    #[error("payment of {requested} exceeds the configured maximum of {allowed}")]
    AmountTooLarge { requested: U256, allowed: U256 },
    /// The signer failed to produce a payment authorization signature.
    #[error("failed to sign payment authorization: {0}")]
    SigningError(String),
    /// The original request cannot be cloned for the paid retry.
    /// Typically the body is a stream.
    #[error("request is not cloneable, cannot retry with payment; streaming body?")]
    RequestNotCloneable,
    /// Payment was made but rejected: either the retried request answered
    /// 402 again, or the facilitator preflight declared the authorization
    /// invalid. Never retried further.
    #[error("payment rejected: {}", .reason.as_deref().unwrap_or("server demanded payment again"))]
    PaymentRejected { reason: Option<String> },
    /// The signed payment payload could not be serialized to JSON.
    #[error("failed to encode payment payload to JSON")]
    JsonEncode(#[source] serde_json::Error),
    /// The base64 payment payload does not fit in an HTTP header.
    #[error("failed to encode payment payload into an HTTP header")]
    HeaderValueEncode(#[source] http::header::InvalidHeaderValue),
    /// Talking to the facilitator failed.
    #[error(transparent)]
    Facilitator(#[from] FacilitatorClientError),
}

impl From<X402Error> for rqm::Error {
    fn from(error: X402Error) -> Self {
        rqm::Error::Middleware(error.into())
    }
}
