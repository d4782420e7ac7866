// fetcher.rs
use crate::errors::ScraperError;
use crate::store::listing_key;
use rand::Rng;
use reqwest::blocking::Client;
use scraper::Html;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A page as the browser rendered it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub url: String,
    pub html: String,
}

impl RenderedDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Supplies rendered pages. Blocking; may fail per URL.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<RenderedDocument, ScraperError>;
}

/// Fetches pages over HTTP, through the ZenRows renderer when a key is configured.
pub struct HttpFetcher {
    client: Client,
    zenrows_api_key: Option<String>,
    render_wait: Duration,
}

impl HttpFetcher {
    pub fn new(zenrows_api_key: Option<String>, render_wait: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self {
            client,
            zenrows_api_key,
            render_wait,
        })
    }

    fn fetch_with_retry(&self, url: &str) -> Result<String, ScraperError> {
        const MAX_ATTEMPTS: u64 = 5;
        const MAX_BACKOFF_SECS: u64 = 10;
        const JITTER_MAX_SECS: u64 = 2;

        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let start = std::time::Instant::now();

            match self.try_fetch(url) {
                Ok(html) => {
                    info!(%url, attempt, elapsed = ?start.elapsed(), "page fetched");
                    return Ok(html);
                }
                Err(e) => {
                    warn!(%url, attempt, elapsed = ?start.elapsed(), error = %e, "fetch attempt failed");
                    last_err = Some(e);

                    if attempt < MAX_ATTEMPTS {
                        let base = std::cmp::min(2 * attempt, MAX_BACKOFF_SECS);
                        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
                        std::thread::sleep(Duration::from_secs(base + jitter));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("retry loop failed".into())))
    }

    fn try_fetch(&self, url: &str) -> Result<String, ScraperError> {
        let request = match &self.zenrows_api_key {
            Some(api_key) => {
                let mut params = HashMap::new();
                params.insert("url", url.to_string());
                params.insert("apikey", api_key.clone());
                params.insert("js_render", "true".to_string());
                params.insert("wait", self.render_wait.as_millis().to_string());
                params.insert("original_status", "true".to_string());
                self.client.get("https://api.zenrows.com/v1/").query(&params)
            }
            None => self.client.get(url),
        };

        let resp = request
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ScraperError::Network(format!("HTTP {status}: {text}")));
        }

        // ZenRows reports its own failures as a JSON body with a `code`.
        if text.starts_with('{') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                if json.get("code").is_some() {
                    return Err(ScraperError::Network(format!("ZenRows API error: {text}")));
                }
            }
        }

        Ok(text)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RenderedDocument, ScraperError> {
        self.fetch_with_retry(url)
            .map(|html| RenderedDocument::new(url, html))
            .map_err(|e| ScraperError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Saves every fetched page as `<dir>/<prefix>_<key>.html`.
pub struct ArchivingFetcher<F> {
    inner: F,
    html_dir: PathBuf,
    prefix: String,
}

impl<F: PageFetcher> ArchivingFetcher<F> {
    pub fn new(inner: F, html_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            html_dir: html_dir.into(),
            prefix: prefix.into(),
        }
    }

    fn archive(&self, page: &RenderedDocument) -> Result<PathBuf, ScraperError> {
        std::fs::create_dir_all(&self.html_dir)?;
        let key = listing_key(&page.url);
        let key = if key.is_empty() { "index" } else { key };
        let path = self.html_dir.join(format!("{}_{}.html", self.prefix, key));
        std::fs::write(&path, &page.html)?;
        Ok(path)
    }
}

impl<F: PageFetcher> PageFetcher for ArchivingFetcher<F> {
    fn fetch(&self, url: &str) -> Result<RenderedDocument, ScraperError> {
        let page = self.inner.fetch(url)?;
        match self.archive(&page) {
            Ok(path) => info!(path = %path.display(), "HTML saved"),
            Err(e) => warn!(%url, error = %e, "could not save HTML"),
        }
        Ok(page)
    }
}
