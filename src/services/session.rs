// src/services/session.rs

//! Session provider over one warmed-up HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, SiteConfig};
use crate::utils::http::{create_client, read_body};

/// HTTP access through a single established session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fetch a page body.
    async fn get(&self, url: &Url) -> Result<String>;

    /// Submit a URL-encoded form and return the response body.
    async fn post_form(&self, url: &Url, fields: &[(String, String)]) -> Result<String>;
}

/// Cookie-backed session against the scheduling site.
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Build the client and establish session cookies with one warm-up request.
    pub async fn connect(crawler: &CrawlerConfig, site: &SiteConfig) -> Result<Self> {
        let client = create_client(crawler)?;
        let warmup = site.endpoint(&site.warmup_path)?;

        log::debug!("Warming up session at {}", warmup);
        let response = client
            .get(warmup.clone())
            .send()
            .await
            .map_err(|e| AppError::session(format!("warm-up request to {warmup} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::session(format!(
                "warm-up request to {warmup} returned {}",
                response.status()
            )));
        }

        log::info!("Session established with {}", site.base_url);
        Ok(Self { client })
    }
}

#[async_trait]
impl SessionProvider for HttpSession {
    async fn get(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        read_body(response).await
    }

    async fn post_form(&self, url: &Url, fields: &[(String, String)]) -> Result<String> {
        let response = self.client.post(url.clone()).form(fields).send().await?;
        read_body(response).await
    }
}
