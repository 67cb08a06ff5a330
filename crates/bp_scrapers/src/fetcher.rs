use async_trait::async_trait;
use bp_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Desktop Chrome on Windows; the listing page serves bots a different layout.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// One GET, no retries. Any network failure or non-2xx status is `Error::Fetch`.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("{}: only http(s) is supported", url)));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("GET {} returned {}", url, status)));
        }
        Ok(response)
    }

    /// Raw bytes plus the origin's declared content type, for proxying images.
    pub async fn fetch_asset(&self, url: &str) -> Result<FetchedAsset> {
        let response = self.get(url).await?;
        let content_type = content_type(&response);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read body of {}: {}", url, e)))?;

        Ok(FetchedAsset {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self.get(url).await?;
        let content_type = content_type(&response);
        let body = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read body of {}: {}", url, e)))?;

        Ok(FetchedPage {
            url: url.to_string(),
            body,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(
                "/blog",
                get(|headers: HeaderMap| async move {
                    let agent = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    (
                        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                        format!("<html><body>{}</body></html>", agent),
                    )
                }),
            )
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route(
                "/thumb.png",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G']) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let base = spawn_server().await;
        let fetcher = HttpFetcher::new().unwrap();

        let page = fetcher.fetch(&format!("{}/blog", base)).await.unwrap();
        assert!(page.body.contains(BROWSER_USER_AGENT));
        assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let base = spawn_server().await;
        let fetcher = HttpFetcher::new().unwrap();

        let result = fetcher.fetch(&format!("{}/broken", base)).await;
        match result {
            Err(Error::Fetch(message)) => assert!(message.contains("500")),
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_error() {
        let base = spawn_server().await;
        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200)).unwrap();

        let result = fetcher.fetch(&format!("{}/slow", base)).await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_asset_keeps_content_type() {
        let base = spawn_server().await;
        let fetcher = HttpFetcher::new().unwrap();

        let asset = fetcher.fetch_asset(&format!("{}/thumb.png", base)).await.unwrap();
        assert_eq!(asset.content_type.as_deref(), Some("image/png"));
        assert_eq!(asset.bytes, vec![0x89u8, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_rejects_invalid_urls() {
        let fetcher = HttpFetcher::new().unwrap();
        assert!(matches!(fetcher.fetch("not a url").await, Err(Error::InvalidUrl(_))));
        assert!(matches!(fetcher.fetch("ftp://example.com/x").await, Err(Error::InvalidUrl(_))));
    }
}
