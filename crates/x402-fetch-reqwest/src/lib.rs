//! Reqwest middleware for automatic [x402](https://www.x402.org) payment handling.
//!
//! This crate provides an [`X402Client`] that plugs into `reqwest_middleware`
//! and turns `402 Payment Required` responses into paid retries: it parses
//! the payment challenge, signs an authorization with a registered scheme
//! client, and re-issues the original request once with the `X-Payment`
//! header attached. If the retry is rejected again, the call fails with
//! [`X402Error::PaymentRejected`]; a third request is never sent.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use alloy_signer_local::PrivateKeySigner;
//! use reqwest::Client;
//! use x402_fetch_reqwest::{Eip155ExactClient, ReqwestWithPayments, X402Client};
//!
//! let signer = Arc::new("PRIVATE_KEY".parse::<PrivateKeySigner>()?);
//! let x402_client = X402Client::new().register(Eip155ExactClient::new(signer));
//!
//! let http_client = Client::new().with_payments(x402_client);
//!
//! // Payments are handled transparently.
//! let response = http_client
//!     .get("https://api.example.com/weather")
//!     .send()
//!     .await?;
//! ```
//!
//! ## Scheme clients
//!
//! Payment signing is pluggable: anything implementing [`X402SchemeClient`]
//! can bid on a challenge. [`Eip155ExactClient`] covers the x402 v1 `exact`
//! scheme on EVM chains (ERC-3009 `TransferWithAuthorization` signed via
//! EIP-712). When a challenge offers several payment methods, a
//! [`PaymentSelector`] picks one; the default [`FirstMatch`] takes them in
//! scheme-registration order.
//!
//! ## Facilitator
//!
//! An optional [`FacilitatorClient`] lets the middleware preflight a signed
//! authorization against a facilitator's `/verify` endpoint before spending
//! the retry, and exposes `/settle` and `/supported` for direct use.

mod builder;
mod client;
mod error;
mod facilitator;
mod scheme;
mod selector;

pub mod eip155_exact;

pub use builder::ReqwestWithPayments;
pub use client::{X402Client, X_PAYMENT, X_PAYMENT_RESPONSE};
pub use eip155_exact::Eip155ExactClient;
pub use error::X402Error;
pub use facilitator::{FacilitatorClient, FacilitatorClientError};
pub use scheme::{PaymentCandidate, PaymentCandidateSigner, X402SchemeClient};
pub use selector::{FirstMatch, PaymentSelector};
