use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::{Config, ConfigError};
use crate::error::{BotError, ShapeError};

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Source of homework status snapshots.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetch statuses changed since `from_date` (unix seconds).
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError>;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    pub fn new(token: String, endpoint: Url, timeout: Duration) -> Result<Self, BotError> {
        let http = Client::builder()
            .user_agent(concat!("homework-watchbot/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|source| BotError::Transport {
                url: endpoint.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, BotError> {
        let endpoint = Url::parse(&cfg.practicum.endpoint)
            .map_err(|_| ConfigError::Invalid("practicum.endpoint must be a valid URL"))?;
        Self::new(cfg.practicum.token.clone(), endpoint, cfg.request_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(&self, from_date: i64) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
    }

    async fn execute(&self, from_date: i64) -> Result<Value, BotError> {
        let url = self.endpoint.to_string();
        let transport = |source: reqwest::Error| BotError::Transport {
            url: url.clone(),
            source,
        };

        let request = self.build_request(from_date).map_err(transport)?;
        debug!(url=%request.url(), from_date, "requesting homework statuses");
        let res = self.http.execute(request).await.map_err(transport)?;
        check_status(&url, res.status())?;
        let body = res.text().await.map_err(transport)?;
        decode_body(&body)
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, BotError> {
        let res = self.execute(from_date).await;
        if let Err(err) = &res {
            error!(%err, "homework API request failed");
        }
        res
    }
}

/// Anything but `200 OK` is an error carrying the endpoint and status code.
pub fn check_status(url: &str, status: StatusCode) -> Result<(), BotError> {
    if status != StatusCode::OK {
        return Err(BotError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

pub fn decode_body(body: &str) -> Result<Value, BotError> {
    serde_json::from_str(body).map_err(BotError::Decode)
}

/// Classify a raw HTTP response. Only `200 OK` with a JSON body is accepted.
pub fn decode_response(url: &str, status: StatusCode, body: &str) -> Result<Value, BotError> {
    check_status(url, status)?;
    decode_body(body)
}

/// Check the decoded body has a `homeworks` list and return it.
/// An empty list is a valid "nothing changed" answer.
pub fn check_response(response: &Value) -> Result<&[Value], ShapeError> {
    let obj = response.as_object().ok_or(ShapeError::NotAMapping)?;
    let homeworks = obj.get("homeworks").ok_or(ShapeError::MissingHomeworks)?;
    homeworks
        .as_array()
        .map(Vec::as_slice)
        .ok_or(ShapeError::NotAList)
}
