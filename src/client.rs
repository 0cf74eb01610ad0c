use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

/// Fetch collaborator for the feed endpoint. It returns the raw body and
/// leaves parsing to the feed store, so a transport failure and a shape
/// failure stay distinguishable at the caller.
pub struct Client {
    http: HttpClient,
    user_agent: String,
    endpoint: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("feed client user agent required");
        }
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("feed endpoint is not a valid URL: {}", config.endpoint))?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn fetch_feed(&self) -> Result<String> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .context("request feed")?;

        if !response.status().is_success() {
            bail!("feed request failed with status {}", response.status());
        }

        response.text().context("read feed body")
    }
}
