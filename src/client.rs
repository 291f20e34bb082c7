use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Proxy, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::dota2::opendota;

// we use separate error types for construction and request

#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("ProxyError: {0} from scheme: {1}.")]
    ProxyError(reqwest::Error, String),
    #[error("BuildError: {0}.")]
    BuildError(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Failed to retrive result from web API: {0}")]
    ConnectionError(#[from] reqwest::Error),
    #[error("Failed to decode web API response: {0}")]
    DecodeError(serde_json::Error, String),
    #[error("Too Many Requests")]
    TooManyRequests,
    #[error("Other Response: {0}")]
    OtherResponse(reqwest::StatusCode),
}

impl RequestError {
    /// Raw body of a response we failed to decode.
    pub fn undecoded_body(&self) -> Option<&str> {
        match self {
            RequestError::DecodeError(_, content) => Some(content),
            _ => None,
        }
    }
}

/// Read-only source of match data.
#[async_trait]
pub trait MatchSource: Send + Sync {
    async fn get_match(&self, match_id: u64) -> Result<opendota::Match, RequestError>;

    async fn get_public_matches(&self, min_rank: u32) -> Result<Vec<opendota::Match>, RequestError>;
}

pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    pub const URL_OPENDOTA: &'static str = "https://api.opendota.com/api";

    pub fn new(base_url: &str, proxy: Option<&str>) -> Result<Self, ConstructionError> {
        let builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(60));
        let builder = match proxy {
            Some(proxy) => {
                let proxy = Proxy::all(proxy)
                    .map_err(|err| ConstructionError::ProxyError(err, proxy.to_string()))?;
                builder.proxy(proxy)
            }
            None => builder,
        };
        let client = builder.build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn match_request(&self, match_id: u64) -> RequestBuilder {
        self.client
            .get(format!("{}/matches/{}", self.base_url, match_id))
    }

    fn public_matches_request(&self, min_rank: u32) -> RequestBuilder {
        self.client
            .get(format!("{}/publicMatches", self.base_url))
            .query(&[("min_rank", min_rank)])
    }

    async fn fetch<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, RequestError> {
        let resp = req.send().await?;
        match resp.status() {
            StatusCode::OK => {
                let content = resp.text().await?;
                serde_json::from_str(&content).map_err(|err| RequestError::DecodeError(err, content))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(RequestError::TooManyRequests),
            other => Err(RequestError::OtherResponse(other)),
        }
    }
}

#[async_trait]
impl MatchSource for Client {
    async fn get_match(&self, match_id: u64) -> Result<opendota::Match, RequestError> {
        log::debug!("requesting match {}", match_id);
        Self::fetch(self.match_request(match_id)).await
    }

    async fn get_public_matches(&self, min_rank: u32) -> Result<Vec<opendota::Match>, RequestError> {
        log::debug!("requesting public matches with min_rank {}", min_rank);
        Self::fetch(self.public_matches_request(min_rank)).await
    }
}
