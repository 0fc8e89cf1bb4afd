//! Gateway bootstrap endpoints

use serde::Deserialize;

use crate::client::{HttpClient, RequestBody};
use crate::error::HttpError;
use crate::route::Route;

/// Gateway API version the URLs are pinned to
pub const GATEWAY_VERSION: u8 = 10;

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    url: String,
}

/// Session start limits returned with the bot gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    pub reset_after: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

fn default_max_concurrency() -> u32 {
    1
}

/// Result of `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotGateway {
    pub url: String,
    pub shards: u32,
    pub session_start_limit: Option<SessionStartLimit>,
}

#[derive(Debug, Deserialize)]
struct BotGatewayResponse {
    url: String,
    shards: u32,
    #[serde(default)]
    session_start_limit: Option<SessionStartLimit>,
}

/// Append the connection parameters to a gateway URL
pub fn gateway_url(base: &str, compress: bool) -> String {
    let mut url = format!("{base}?encoding=json&v={GATEWAY_VERSION}");
    if compress {
        url.push_str("&compress=zlib-stream");
    }
    url
}

impl HttpClient {
    /// Gateway URL ready to connect to
    pub async fn get_gateway(&self, compress: bool) -> Result<String, HttpError> {
        let response: GatewayResponse = self
            .request(Route::get("/gateway"), RequestBody::Empty)
            .await?;
        Ok(gateway_url(&response.url, compress))
    }

    /// Gateway URL plus the recommended shard count
    pub async fn get_bot_gateway(&self, compress: bool) -> Result<BotGateway, HttpError> {
        let response: BotGatewayResponse = self
            .request(Route::get("/gateway/bot"), RequestBody::Empty)
            .await?;
        Ok(BotGateway {
            url: gateway_url(&response.url, compress),
            shards: response.shards,
            session_start_limit: response.session_start_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_url() {
        assert_eq!(
            gateway_url("wss://gateway.discord.gg", false),
            "wss://gateway.discord.gg?encoding=json&v=10"
        );
        assert_eq!(
            gateway_url("wss://gateway.discord.gg", true),
            "wss://gateway.discord.gg?encoding=json&v=10&compress=zlib-stream"
        );
    }
}
