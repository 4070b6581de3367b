//! Wire types for the [x402 protocol](https://www.x402.org), client side.
//!
//! This crate defines the data that travels between a buyer, a payment-gated
//! resource server, and a facilitator:
//!
//! - [`proto`]: the 402 challenge body ([`proto::PaymentRequired`]), the
//!   seller's payment terms ([`proto::PaymentRequirements`]), the signed
//!   payment envelope ([`proto::PaymentPayload`]), and facilitator
//!   verify/settle messages.
//! - [`receipt`]: the settlement confirmation carried in the
//!   `X-Payment-Response` header, with pure encode/decode.
//! - [`networks`]: the registry of x402 v1 network names and their EIP-155
//!   chain ids.
//! - [`timestamp`]: string-serialized unix timestamps for authorization
//!   validity windows.
//! - [`util`]: base64 helpers shared by the header codecs.
//!
//! Everything here is transport-agnostic: no HTTP client types, no signing.
//! The `x402-fetch-reqwest` crate layers the interceptor and scheme signers
//! on top.

pub mod networks;
pub mod proto;
pub mod receipt;
pub mod timestamp;
pub mod util;

pub use receipt::{PaymentReceipt, ReceiptDecodeError};
