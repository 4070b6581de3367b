//! Attaching the interceptor to a reqwest client.

use reqwest::Client;
use reqwest_middleware as rqm;

use crate::client::X402Client;
use crate::selector::PaymentSelector;

/// Wraps a [`reqwest::Client`] into a middleware client that answers 402
/// challenges with the given [`X402Client`].
///
/// For larger middleware stacks, install the interceptor by hand:
/// `reqwest_middleware::ClientBuilder::new(client).with(x402_client)`.
pub trait ReqwestWithPayments {
    fn with_payments<TSelector>(
        self,
        x402_client: X402Client<TSelector>,
    ) -> rqm::ClientWithMiddleware
    where
        TSelector: PaymentSelector + 'static;
}

impl ReqwestWithPayments for Client {
    fn with_payments<TSelector>(
        self,
        x402_client: X402Client<TSelector>,
    ) -> rqm::ClientWithMiddleware
    where
        TSelector: PaymentSelector + 'static,
    {
        rqm::ClientBuilder::new(self).with(x402_client).build()
    }
}
