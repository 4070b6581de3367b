//! The payment interceptor: a [`reqwest_middleware::Middleware`] that turns
//! HTTP 402 challenges into paid retries.
//!
//! Flow per request: send as-is; on anything but 402, pass the response
//! through untouched. On 402, parse the challenge body, collect candidates
//! from the registered scheme clients, pick one, sign it, optionally
//! preflight it against a facilitator, attach the `X-Payment` header, and
//! retry exactly once. A second 402 is a hard [`X402Error::PaymentRejected`];
//! there is never a third request.

use alloy_primitives::U256;
use async_trait::async_trait;
use http::Extensions;
use http::header::HeaderValue;
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next};
use std::sync::Arc;

use x402_fetch_types::proto::{PaymentRequired, VerifyRequest, VerifyResponse, X402Version1};
use x402_fetch_types::util::b64;

use crate::error::X402Error;
use crate::facilitator::FacilitatorClient;
use crate::scheme::{PaymentCandidate, X402SchemeClient};
use crate::selector::{FirstMatch, PaymentSelector};

/// Request header carrying the base64-encoded signed payment payload.
pub const X_PAYMENT: &str = "X-Payment";
/// Response header carrying the base64-encoded settlement receipt.
pub const X_PAYMENT_RESPONSE: &str = "X-Payment-Response";

/// Middleware that answers 402 challenges with signed payments.
///
/// Scheme clients are consulted in registration order; among their combined
/// candidates the selector (default [`FirstMatch`]) picks the one to execute.
pub struct X402Client<TSelector = FirstMatch> {
    schemes: Vec<Arc<dyn X402SchemeClient>>,
    selector: TSelector,
    facilitator: Option<FacilitatorClient>,
    max_amount: Option<U256>,
}

impl X402Client<FirstMatch> {
    /// An interceptor with no scheme clients and the [`FirstMatch`] selector.
    pub fn new() -> Self {
        Self {
            schemes: Vec::new(),
            selector: FirstMatch,
            facilitator: None,
            max_amount: None,
        }
    }
}

impl Default for X402Client<FirstMatch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<TSelector> X402Client<TSelector> {
    /// Registers a scheme client. Registration order is selection order.
    pub fn register<T: X402SchemeClient + 'static>(mut self, scheme: T) -> Self {
        self.schemes.push(Arc::new(scheme));
        self
    }

    /// Replaces the candidate selection strategy.
    pub fn with_selector<T: PaymentSelector>(self, selector: T) -> X402Client<T> {
        X402Client {
            schemes: self.schemes,
            selector,
            facilitator: self.facilitator,
            max_amount: self.max_amount,
        }
    }

    /// Preflights every signed payment against this facilitator's
    /// `POST /verify` before spending the retry on it.
    pub fn with_facilitator(mut self, facilitator: FacilitatorClient) -> Self {
        self.facilitator = Some(facilitator);
        self
    }

    /// Caps the amount (in token base units) this client will ever
    /// authorize. A challenge demanding more fails with
    /// [`X402Error::AmountTooLarge`] instead of being paid.
    pub fn with_max_amount(mut self, max_amount: U256) -> Self {
        self.max_amount = Some(max_amount);
        self
    }
}

impl<TSelector: PaymentSelector> X402Client<TSelector> {
    /// Builds the `X-Payment` header value for a parsed challenge:
    /// candidates, selection, spend cap, signing, optional facilitator
    /// preflight, base64 encoding.
    async fn payment_header(
        &self,
        challenge: &PaymentRequired,
    ) -> Result<HeaderValue, X402Error> {
        if self.schemes.is_empty() {
            return Err(X402Error::NoSchemeClients);
        }
        let candidates: Vec<PaymentCandidate> = self
            .schemes
            .iter()
            .flat_map(|scheme| scheme.accept(challenge))
            .collect();
        let candidate = self
            .selector
            .select(&candidates)
            .ok_or(X402Error::NoMatchingPaymentOption)?;
        tracing::debug!(
            scheme = %candidate.scheme,
            network = %candidate.network,
            amount = %candidate.amount,
            "selected payment candidate"
        );
        if let Some(max_amount) = self.max_amount
            && candidate.amount > max_amount
        {
            return Err(X402Error::AmountTooLarge {
                requested: candidate.amount,
                allowed: max_amount,
            });
        }

        let payload = candidate.sign().await?;

        if let Some(facilitator) = &self.facilitator {
            let request = VerifyRequest::<serde_json::Value> {
                x402_version: X402Version1,
                payment_payload: payload.clone(),
                payment_requirements: candidate.requirements.clone(),
            };
            match facilitator.verify(&request).await? {
                VerifyResponse::Valid { payer } => {
                    tracing::debug!(%payer, "facilitator verified payment");
                }
                VerifyResponse::Invalid { reason, .. } => {
                    return Err(X402Error::PaymentRejected {
                        reason: Some(reason),
                    });
                }
            }
        }

        let json = serde_json::to_vec(&payload).map_err(X402Error::JsonEncode)?;
        HeaderValue::from_str(&b64::encode(json)).map_err(X402Error::HeaderValueEncode)
    }
}

#[async_trait]
impl<TSelector> Middleware for X402Client<TSelector>
where
    TSelector: PaymentSelector + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        // Cloned before the first send: the body is gone once the request
        // runs, and only a cloneable body can be retried with payment.
        let retry_req = req.try_clone();
        let response = next.clone().run(req, extensions).await?;
        if response.status() != StatusCode::PAYMENT_REQUIRED {
            return Ok(response);
        }
        let mut retry_req = retry_req.ok_or(X402Error::RequestNotCloneable)?;

        let challenge = response
            .json::<PaymentRequired>()
            .await
            .map_err(|e| X402Error::ParseError(e.to_string()))?;
        tracing::debug!(
            accepts = challenge.accepts.len(),
            "received 402 payment challenge"
        );
        let payment = self.payment_header(&challenge).await?;

        let headers = retry_req.headers_mut();
        headers.insert(X_PAYMENT, payment);
        // Lets browsers-adjacent CORS setups read the receipt header.
        headers.insert(
            http::header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(X_PAYMENT_RESPONSE),
        );

        let retried = next.run(retry_req, extensions).await?;
        if retried.status() == StatusCode::PAYMENT_REQUIRED {
            // One retry only. Surface the seller's reason when it sends one.
            let reason = retried
                .json::<PaymentRequired>()
                .await
                .ok()
                .and_then(|challenge| challenge.error);
            return Err(X402Error::PaymentRejected { reason }.into());
        }
        Ok(retried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ReqwestWithPayments;
    use crate::eip155_exact::Eip155ExactClient;
    use alloy_signer_local::PrivateKeySigner;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use x402_fetch_types::PaymentReceipt;
    use x402_fetch_types::proto::PaymentPayload;

    // Well-known dev key (anvil account #0), test use only.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn challenge_body(network: &str, scheme: &str, amount: &str) -> serde_json::Value {
        json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": scheme,
                "network": network,
                "maxAmountRequired": amount,
                "resource": "https://api.example.com/weather",
                "description": "Weather report",
                "mimeType": "application/json",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 300,
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "extra": { "name": "USDC", "version": "2" }
            }]
        })
    }

    fn paying_client(x402: X402Client) -> reqwest_middleware::ClientWithMiddleware {
        reqwest::Client::new().with_payments(x402)
    }

    fn exact_client() -> Eip155ExactClient<PrivateKeySigner> {
        Eip155ExactClient::new(DEV_KEY.parse().unwrap())
    }

    fn unwrap_x402(err: reqwest_middleware::Error) -> X402Error {
        match err {
            reqwest_middleware::Error::Middleware(inner) => inner
                .downcast::<X402Error>()
                .expect("middleware error should be an X402Error"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_402_responses_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("sunny"))
            .expect(1)
            .mount(&server)
            .await;

        let client = paying_client(X402Client::new().register(exact_client()));
        let response = client
            .get(format!("{}/weather", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "sunny");
    }

    #[tokio::test]
    async fn pays_a_402_challenge_and_retries_once() {
        let server = MockServer::start().await;
        let receipt = PaymentReceipt::Settled {
            payer: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            transaction: "0x1f1c4a1e".to_string(),
            network: "base-sepolia".to_string(),
        };
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(header_exists(X_PAYMENT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("sunny")
                    .insert_header(X_PAYMENT_RESPONSE, receipt.to_header_value().as_str()),
            )
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .with_priority(2)
            .mount(&server)
            .await;

        let client = paying_client(X402Client::new().register(exact_client()));
        let response = client
            .get(format!("{}/weather", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let receipt_header = response.headers().get(X_PAYMENT_RESPONSE).unwrap();
        let decoded_receipt =
            PaymentReceipt::from_header_bytes(receipt_header.as_bytes()).unwrap();
        match decoded_receipt {
            PaymentReceipt::Settled {
                payer,
                transaction,
                network,
            } => {
                assert_eq!(payer, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
                assert_eq!(transaction, "0x1f1c4a1e");
                assert_eq!(network, "base-sepolia");
            }
            other => panic!("unexpected receipt: {other:?}"),
        }

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].headers.contains_key(X_PAYMENT));
        let header = requests[1].headers.get(X_PAYMENT).unwrap();
        let decoded = b64::decode(header.as_bytes()).unwrap();
        let payload: PaymentPayload = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(payload.scheme, "exact");
        assert_eq!(payload.network, "base-sepolia");
    }

    #[tokio::test]
    async fn a_second_402_is_payment_rejected_with_no_third_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = paying_client(X402Client::new().register(exact_client()));
        let err = client
            .get(format!("{}/weather", server.uri()))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            unwrap_x402(err),
            X402Error::PaymentRejected { reason: None }
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejection_reason_comes_from_the_second_challenge() {
        let server = MockServer::start().await;
        let mut rejection = challenge_body("base-sepolia", "exact", "10000");
        rejection["error"] = json!("authorization expired");
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(header_exists(X_PAYMENT))
            .respond_with(ResponseTemplate::new(402).set_body_json(rejection))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .with_priority(2)
            .mount(&server)
            .await;

        let client = paying_client(X402Client::new().register(exact_client()));
        let err = client
            .get(format!("{}/weather", server.uri()))
            .send()
            .await
            .unwrap_err();
        match unwrap_x402(err) {
            X402Error::PaymentRejected { reason } => {
                assert_eq!(reason.as_deref(), Some("authorization expired"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unmatchable_challenge_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "stream", "10000")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = paying_client(X402Client::new().register(exact_client()));
        let err = client
            .get(format!("{}/weather", server.uri()))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            unwrap_x402(err),
            X402Error::NoMatchingPaymentOption
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_registered_schemes_is_its_own_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .mount(&server)
            .await;

        let client = paying_client(X402Client::new());
        let err = client.get(server.uri()).send().await.unwrap_err();
        assert!(matches!(unwrap_x402(err), X402Error::NoSchemeClients));
    }

    #[tokio::test]
    async fn spend_cap_blocks_large_payments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = paying_client(
            X402Client::new()
                .register(exact_client())
                .with_max_amount(U256::from(100u64)),
        );
        let err = client.get(server.uri()).send().await.unwrap_err();
        match unwrap_x402(err) {
            X402Error::AmountTooLarge { requested, allowed } => {
                assert_eq!(requested, U256::from(10_000u64));
                assert_eq!(allowed, U256::from(100u64));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn facilitator_preflight_rejection_prevents_the_retry() {
        let facilitator_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isValid": false,
                "invalidReason": "insufficient_funds"
            })))
            .expect(1)
            .mount(&facilitator_server)
            .await;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let facilitator = FacilitatorClient::try_from(facilitator_server.uri()).unwrap();
        let client = paying_client(
            X402Client::new()
                .register(exact_client())
                .with_facilitator(facilitator),
        );
        let err = client.get(server.uri()).send().await.unwrap_err();
        match unwrap_x402(err) {
            X402Error::PaymentRejected { reason } => {
                assert_eq!(reason.as_deref(), Some("insufficient_funds"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The retry was never sent.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn facilitator_preflight_pass_proceeds_to_the_retry() {
        let facilitator_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isValid": true,
                "payer": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            })))
            .expect(1)
            .mount(&facilitator_server)
            .await;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists(X_PAYMENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("sunny"))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(402)
                    .set_body_json(challenge_body("base-sepolia", "exact", "10000")),
            )
            .with_priority(2)
            .mount(&server)
            .await;

        let facilitator = FacilitatorClient::try_from(facilitator_server.uri()).unwrap();
        let client = paying_client(
            X402Client::new()
                .register(exact_client())
                .with_facilitator(facilitator),
        );
        let response = client.get(server.uri()).send().await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }
}
