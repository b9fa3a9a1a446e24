use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// GETs the pick'em page with browser-looking headers and a bounded timeout.
/// Never retries; fallback policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    http: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let timeout_secs = std::env::var("PICKEM_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(browser_headers())
            .build()
            .context("failed to build pickem http client")?;

        Ok(Self { http })
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("pickem page request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read pickem page body")?;
        if !status.is_success() {
            anyhow::bail!("pickem page HTTP {status}");
        }

        Ok(text)
    }
}

fn browser_headers() -> HeaderMap {
    // The upstream site serves a bot-interstitial to clients without
    // browser-looking headers. Accept-Encoding is left to reqwest: setting it
    // by hand disables automatic response decompression.
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        "Upgrade-Insecure-Requests",
        HeaderValue::from_static("1"),
    );
    headers
}
