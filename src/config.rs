//! Configuration module for the x402 fetch CLI.

use clap::Parser;
use url::Url;

/// CLI arguments, each overridable by an environment variable. A `.env` file
/// in the working directory is loaded before parsing.
#[derive(Parser, Debug)]
#[command(name = "x402-fetch")]
#[command(about = "Fetch a paid HTTP resource, answering x402 challenges automatically")]
pub struct Config {
    /// Base URL of the resource server
    #[arg(long, env = "RESOURCE_SERVER_URL")]
    pub resource_server_url: Url,

    /// Path of the paid endpoint, e.g. /weather
    #[arg(long, env = "ENDPOINT_PATH")]
    pub endpoint_path: String,

    /// Hex-encoded private key used to sign payment authorizations
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Optional facilitator base URL; payments are verified there before the
    /// paid retry is sent
    #[arg(long, env = "FACILITATOR_URL")]
    pub facilitator_url: Option<String>,

    /// Optional spend cap in token base units; challenges demanding more fail
    #[arg(long, env = "MAX_AMOUNT")]
    pub max_amount: Option<u128>,
}

impl Config {
    /// Resolves the endpoint path against the resource server base URL.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        self.resource_server_url.join(&self.endpoint_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let config = Config::parse_from([
            "x402-fetch",
            "--resource-server-url",
            "https://api.example.com",
            "--endpoint-path",
            "/weather",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ]);
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://api.example.com/weather"
        );
        assert!(config.facilitator_url.is_none());
        assert!(config.max_amount.is_none());
    }
}
