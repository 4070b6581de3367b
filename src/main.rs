//! x402 fetch CLI entrypoint.
//!
//! Fetches one paid HTTP resource: sends a GET, answers a `402 Payment
//! Required` challenge by signing an ERC-3009 transfer authorization, retries
//! once with the `X-Payment` header, prints the response body to stdout, and
//! logs the decoded `X-Payment-Response` settlement receipt.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `RESOURCE_SERVER_URL`, `ENDPOINT_PATH` locate the paid resource
//! - `PRIVATE_KEY` signs payment authorizations
//! - `FACILITATOR_URL` (optional) preflights payments before the retry
//! - `MAX_AMOUNT` (optional) caps the authorized amount in base units
//! - `RUST_LOG` controls log verbosity

mod config;

use alloy_primitives::U256;
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use x402_fetch_reqwest::{
    Eip155ExactClient, FacilitatorClient, ReqwestWithPayments, X402Client, X_PAYMENT_RESPONSE,
};
use x402_fetch_types::PaymentReceipt;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let url = config.endpoint()?;

    let signer: PrivateKeySigner = config.private_key.parse()?;
    tracing::info!(payer = %signer.address(), "signing payments");

    let mut x402_client = X402Client::new().register(Eip155ExactClient::new(signer));
    if let Some(facilitator_url) = &config.facilitator_url {
        let facilitator = FacilitatorClient::try_from(facilitator_url.as_str())?;
        tracing::info!(facilitator = %facilitator.base_url(), "verifying payments before retry");
        x402_client = x402_client.with_facilitator(facilitator);
    }
    if let Some(max_amount) = config.max_amount {
        x402_client = x402_client.with_max_amount(U256::from(max_amount));
    }

    let client = reqwest::Client::new().with_payments(x402_client);

    tracing::info!(%url, "fetching");
    let response = client.get(url).send().await?;
    let status = response.status();
    let receipt_header = response.headers().get(X_PAYMENT_RESPONSE).cloned();

    let body = response.text().await?;
    println!("{body}");

    // Receipt decoding is best-effort: the resource is already fetched, so a
    // bad header is worth a warning but not a failed exit.
    match receipt_header {
        Some(header) => match PaymentReceipt::from_header_bytes(header.as_bytes()) {
            Ok(PaymentReceipt::Settled {
                payer,
                transaction,
                network,
            }) => {
                tracing::info!(%payer, %transaction, %network, "payment settled");
            }
            Ok(PaymentReceipt::Failed { reason, network }) => {
                tracing::warn!(%reason, %network, "payment settlement failed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not decode X-Payment-Response header");
            }
        },
        None => {
            tracing::debug!("no X-Payment-Response header; the resource may have been free");
        }
    }

    if !status.is_success() {
        tracing::error!(%status, "request failed");
        std::process::exit(1);
    }
    Ok(())
}
