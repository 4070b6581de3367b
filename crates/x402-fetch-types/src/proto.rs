//! x402 v1 protocol messages.
//!
//! V1 carries the payment challenge in the 402 response body as JSON, and
//! the signed authorization in the `X-Payment` request header as
//! base64-encoded JSON. Networks are identified by name (see
//! [`crate::networks`]).
//!
//! The scheme-specific part of a [`PaymentPayload`] stays opaque here
//! (`Box<RawValue>` by default); scheme implementations substitute their own
//! payload type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Version marker pinning every message to x402 protocol version 1.
///
/// Serializes as the JSON integer `1`; deserialization of any other version
/// fails, so version negotiation happens at parse time.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version1;

impl Serialize for X402Version1 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(1)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match u8::deserialize(deserializer)? {
            1 => Ok(X402Version1),
            other => Err(serde::de::Error::custom(format!(
                "unsupported x402 version {other}, this client speaks version 1"
            ))),
        }
    }
}

/// Payment terms set by the seller for one acceptable payment method.
///
/// Fields arrive as strings on the wire; [`PaymentRequirements::as_concrete`]
/// parses them into scheme-specific types (addresses, amounts) when a scheme
/// client decides whether it can satisfy the terms.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements<
    TScheme = String,
    TAmount = String,
    TAddress = String,
    TExtra = serde_json::Value,
> {
    /// The payment scheme, e.g. `"exact"`.
    pub scheme: TScheme,
    /// The network name, e.g. `"base-sepolia"`.
    pub network: String,
    /// The maximum amount the buyer authorizes, in token base units.
    pub max_amount_required: TAmount,
    /// The resource URL being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// Optional JSON schema for the resource output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// The recipient address.
    pub pay_to: TAddress,
    /// Validity window length for the authorization, in seconds.
    pub max_timeout_seconds: u64,
    /// The token asset address.
    pub asset: TAddress,
    /// Scheme-specific extra data, e.g. the EIP-712 domain name/version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<TExtra>,
}

impl PaymentRequirements {
    /// Parses the stringly wire form into concrete scheme types.
    ///
    /// Returns `None` when any field fails to parse; the scheme client then
    /// simply does not bid on this requirement.
    pub fn as_concrete<
        TScheme: FromStr,
        TAmount: FromStr,
        TAddress: FromStr,
        TExtra: DeserializeOwned,
    >(
        &self,
    ) -> Option<PaymentRequirements<TScheme, TAmount, TAddress, TExtra>> {
        let scheme = self.scheme.parse::<TScheme>().ok()?;
        let max_amount_required = self.max_amount_required.parse::<TAmount>().ok()?;
        let pay_to = self.pay_to.parse::<TAddress>().ok()?;
        let asset = self.asset.parse::<TAddress>().ok()?;
        let extra = self
            .extra
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Some(PaymentRequirements {
            scheme,
            network: self.network.clone(),
            max_amount_required,
            resource: self.resource.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            output_schema: self.output_schema.clone(),
            pay_to,
            max_timeout_seconds: self.max_timeout_seconds,
            asset,
            extra,
        })
    }
}

/// Body of an HTTP 402 response: the payment challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    pub x402_version: X402Version1,
    /// Acceptable payment methods, in the seller's order of preference.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Optional error message if a previous payment attempt was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The signed payment authorization a buyer attaches to a retried request.
///
/// Encoded as base64 JSON into the `X-Payment` header. `TPayload` is the
/// scheme-specific signed payload; it defaults to raw JSON so the envelope
/// can be inspected without knowing the scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TScheme = String, TPayload = Box<serde_json::value::RawValue>> {
    pub x402_version: X402Version1,
    /// The payment scheme, e.g. `"exact"`.
    pub scheme: TScheme,
    /// The network name, e.g. `"base-sepolia"`.
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: TPayload,
}

/// Request to a facilitator's `POST /verify` endpoint.
///
/// Pairs the signed payload with the requirements it is meant to satisfy.
/// `POST /settle` takes the same shape, see [`SettleRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest<TPayload = PaymentPayload, TRequirements = PaymentRequirements> {
    pub x402_version: X402Version1,
    pub payment_payload: TPayload,
    pub payment_requirements: TRequirements,
}

/// Request to a facilitator's `POST /settle` endpoint.
pub type SettleRequest<TPayload = PaymentPayload, TRequirements = PaymentRequirements> =
    VerifyRequest<TPayload, TRequirements>;

/// A facilitator's verdict on a payment authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResponse {
    /// The payload satisfies the requirements and passes all checks.
    Valid { payer: String },
    /// The payload was well-formed but failed verification.
    Invalid {
        reason: String,
        payer: Option<String>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default)]
    invalid_reason: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            VerifyResponse::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                payer: Some(payer.clone()),
                invalid_reason: None,
            },
            VerifyResponse::Invalid { reason, payer } => VerifyResponseWire {
                is_valid: false,
                payer: payer.clone(),
                invalid_reason: Some(reason.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        match wire.is_valid {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                Ok(VerifyResponse::Valid { payer })
            }
            false => {
                let reason = wire
                    .invalid_reason
                    .ok_or_else(|| serde::de::Error::missing_field("invalidReason"))?;
                Ok(VerifyResponse::Invalid {
                    reason,
                    payer: wire.payer,
                })
            }
        }
    }
}

/// One (version, scheme, network) combination a facilitator can settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKind {
    pub x402_version: X402Version1,
    pub scheme: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Response from a facilitator's `GET /supported` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedResponse {
    #[serde(default)]
    pub kinds: Vec<SupportedPaymentKind>,
}
