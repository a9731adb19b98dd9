// ABOUTME: Resource handling module for fetching listing and article pages.
// ABOUTME: Handles HTTP fetching with SSRF protection, content-length limits, status checks, and charset decoding.

use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ipnet::IpNet;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::HarvestError;
use crate::options::CrawlOptions;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Maximum number of redirects followed per request.
pub const MAX_REDIRECTS: usize = 5;

static PRIVATE_NETS: Lazy<Vec<IpNet>> = Lazy::new(|| {
    [
        // RFC1918
        "10.0.0.0/8",
        "172.16.0.0/12",
        "192.168.0.0/16",
        // Loopback
        "127.0.0.0/8",
        // Link-local
        "169.254.0.0/16",
        // IPv6 unique local and link-local
        "fc00::/7",
        "fe80::/10",
    ]
    .iter()
    .filter_map(|net| net.parse().ok())
    .collect()
});

/// Source of page markup. The crawler only ever talks to this trait.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns its decoded body.
    async fn fetch(&self, url: &str) -> Result<String, HarvestError>;
}

/// Options for fetching a resource.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: HashMap<String, String>,
    pub allow_private_networks: bool,
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as UTF-8 text, using charset hints from the content-type header.
    pub fn text_utf8(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Check if an IP address is in a private/reserved range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    if addr.is_loopback() {
        return true;
    }
    PRIVATE_NETS.iter().any(|net| net.contains(addr))
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

fn default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        443
    } else {
        80
    }
}

async fn check_host(url: &str, target: &url::Url, op: &str) -> Result<(), HarvestError> {
    let Some(host) = target.host_str() else {
        return Ok(());
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(HarvestError::ssrf(
                url,
                op,
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
        return Ok(());
    }

    let port = target.port().unwrap_or(default_port(target.scheme()));
    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        HarvestError::fetch(url, op, Some(anyhow::anyhow!("DNS lookup failed: {}", e)))
    })?;
    for socket_addr in addrs {
        if is_private_ip(&socket_addr.ip()) {
            return Err(HarvestError::ssrf(
                url,
                op,
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
    }
    Ok(())
}

/// Fetch a resource from the given URL.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, HarvestError> {
    if url.is_empty() {
        return Err(HarvestError::invalid_url(url, "Fetch", None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        HarvestError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(HarvestError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    if !opts.allow_private_networks {
        check_host(url, &parsed_url, "Fetch").await?;
    }

    let mut request = client.get(url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            HarvestError::timeout(url, "Fetch", Some(anyhow::Error::new(e)))
        } else {
            HarvestError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        }
    })?;

    // A redirect may have landed somewhere the first check never saw.
    if !opts.allow_private_networks {
        check_host(url, response.url(), "Fetch").await?;
    }

    let content_length = response.content_length().or_else(|| {
        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    });
    if let Some(len) = content_length {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(HarvestError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if !response.status().is_success() {
        return Err(HarvestError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    let body = response.bytes().await.map_err(|e| {
        HarvestError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("failed to read body: {}", e)),
        )
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(HarvestError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    Ok(FetchResult {
        status,
        content_type,
        body,
    })
}

/// The default [`Fetcher`]: a reqwest client with a per-request deadline.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    opts: FetchOptions,
    timeout: Duration,
}

impl HttpFetcher {
    /// Builds the HTTP client described by `options`, unless a custom client
    /// was supplied.
    pub fn new(options: &CrawlOptions) -> Result<Self, HarvestError> {
        let client = match &options.http_client {
            Some(client) => client.clone(),
            None => build_client(options)?,
        };
        Ok(Self {
            client,
            opts: FetchOptions {
                headers: options.headers.clone(),
                allow_private_networks: options.allow_private_networks,
            },
            timeout: options.timeout,
        })
    }
}

fn build_client(options: &CrawlOptions) -> Result<reqwest::Client, HarvestError> {
    let allow_private = options.allow_private_networks;
    let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        if !allow_private {
            let next = attempt.url().clone();
            if let Some(host) = next.host_str() {
                let host = host.trim_start_matches('[').trim_end_matches(']');
                if let Ok(ip) = host.parse::<IpAddr>() {
                    if is_private_ip(&ip) {
                        return attempt.error("redirect to private IP blocked");
                    }
                } else {
                    // The redirect policy is synchronous.
                    let port = next.port().unwrap_or(default_port(next.scheme()));
                    match (host, port).to_socket_addrs() {
                        Ok(addrs) => {
                            for sa in addrs {
                                if is_private_ip(&sa.ip()) {
                                    return attempt.error("redirect to private IP blocked");
                                }
                            }
                        }
                        Err(_) => return attempt.error("DNS lookup failed during redirect"),
                    }
                }
            }
        }
        attempt.follow()
    });

    reqwest::Client::builder()
        .redirect(redirect_policy)
        .user_agent(&options.user_agent)
        .timeout(options.timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| HarvestError::config("BuildHttpClient", Some(anyhow::Error::new(e))))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, HarvestError> {
        let result = tokio::time::timeout(self.timeout, fetch(&self.client, url, &self.opts))
            .await
            .map_err(|_| {
                HarvestError::timeout(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("no response within {:?}", self.timeout)),
                )
            })??;
        debug!(url, status = result.status, bytes = result.body.len(), "fetched");
        Ok(result.text_utf8())
    }
}
