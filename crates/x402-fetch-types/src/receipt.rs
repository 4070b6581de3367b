//! Payment receipts: the settlement confirmation a resource server returns
//! in the `X-Payment-Response` header.
//!
//! The header value is base64-encoded JSON of the facilitator's settle
//! response. Decoding is pure: no network access, no side effects. A missing
//! or malformed header is a [`ReceiptDecodeError`], never a panic; callers
//! treat it as "no receipt available" since the receipt is informational.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::util::b64;

/// Outcome of settling a payment, decoded from `X-Payment-Response`.
///
/// Wire shape (camelCase JSON, base64-encoded in the header):
///
/// ```json
/// {"success":true,"payer":"0x...","transaction":"0x...","network":"base-sepolia"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentReceipt {
    /// Settlement succeeded on-chain.
    Settled {
        /// The address that paid.
        payer: String,
        /// The settlement transaction hash.
        transaction: String,
        /// The network where settlement occurred.
        network: String,
    },
    /// Settlement failed.
    Failed {
        /// The reason for failure.
        reason: String,
        /// The network where settlement was attempted.
        network: String,
    },
}

/// Failure to decode a payment receipt header.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptDecodeError {
    #[error("receipt header is not valid base64")]
    Base64(#[source] base64::DecodeError),
    #[error("receipt header is not a valid settle response")]
    Json(#[source] serde_json::Error),
}

impl PaymentReceipt {
    /// Decodes a receipt from raw `X-Payment-Response` header bytes.
    pub fn from_header_bytes(header: &[u8]) -> Result<Self, ReceiptDecodeError> {
        let json = b64::decode(header).map_err(ReceiptDecodeError::Base64)?;
        serde_json::from_slice(&json).map_err(ReceiptDecodeError::Json)
    }

    /// Encodes this receipt into an `X-Payment-Response` header value.
    ///
    /// The inverse of [`PaymentReceipt::from_header_bytes`]; used by tests
    /// and by anything acting as a resource server.
    pub fn to_header_value(&self) -> String {
        let json = serde_json::to_vec(self).expect("PaymentReceipt serialization failed");
        b64::encode(json)
    }

    /// Whether settlement succeeded.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentReceipt::Settled { .. })
    }

    /// The network the settlement happened (or was attempted) on.
    pub fn network(&self) -> &str {
        match self {
            PaymentReceipt::Settled { network, .. } => network,
            PaymentReceipt::Failed { network, .. } => network,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction: Option<String>,
    network: String,
}

impl Serialize for PaymentReceipt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            PaymentReceipt::Settled {
                payer,
                transaction,
                network,
            } => ReceiptWire {
                success: true,
                error_reason: None,
                payer: Some(payer.clone()),
                transaction: Some(transaction.clone()),
                network: network.clone(),
            },
            PaymentReceipt::Failed { reason, network } => ReceiptWire {
                success: false,
                error_reason: Some(reason.clone()),
                payer: None,
                transaction: None,
                network: network.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PaymentReceipt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ReceiptWire::deserialize(deserializer)?;
        match wire.success {
            true => {
                let payer = wire
                    .payer
                    .ok_or_else(|| serde::de::Error::missing_field("payer"))?;
                let transaction = wire
                    .transaction
                    .ok_or_else(|| serde::de::Error::missing_field("transaction"))?;
                Ok(PaymentReceipt::Settled {
                    payer,
                    transaction,
                    network: wire.network,
                })
            }
            false => {
                let reason = wire
                    .error_reason
                    .ok_or_else(|| serde::de::Error::missing_field("errorReason"))?;
                Ok(PaymentReceipt::Failed {
                    reason,
                    network: wire.network,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled() -> PaymentReceipt {
        PaymentReceipt::Settled {
            payer: "0x857b06519E91e3A54538791bDbb0E22373e36b66".to_string(),
            transaction: "0x1f1c".to_string(),
            network: "base-sepolia".to_string(),
        }
    }

    #[test]
    fn header_round_trip() {
        let receipt = settled();
        let header = receipt.to_header_value();
        let decoded = PaymentReceipt::from_header_bytes(header.as_bytes()).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn decodes_a_failed_settlement() {
        let json = r#"{"success":false,"errorReason":"invalid_signature","network":"base"}"#;
        let header = b64::encode(json);
        let decoded = PaymentReceipt::from_header_bytes(header.as_bytes()).unwrap();
        assert_eq!(
            decoded,
            PaymentReceipt::Failed {
                reason: "invalid_signature".to_string(),
                network: "base".to_string(),
            }
        );
        assert!(!decoded.is_settled());
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        let err = PaymentReceipt::from_header_bytes(b"%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, ReceiptDecodeError::Base64(_)));
    }

    #[test]
    fn valid_base64_of_garbage_is_a_json_error() {
        let header = b64::encode(b"not json at all");
        let err = PaymentReceipt::from_header_bytes(header.as_bytes()).unwrap_err();
        assert!(matches!(err, ReceiptDecodeError::Json(_)));
    }

    #[test]
    fn success_without_transaction_is_rejected() {
        let json = r#"{"success":true,"payer":"0xabc","network":"base"}"#;
        let header = b64::encode(json);
        assert!(PaymentReceipt::from_header_bytes(header.as_bytes()).is_err());
    }
}
