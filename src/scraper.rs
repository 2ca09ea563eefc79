//! Page metadata scraper for URL records.
//!
//! Fetches a page over HTTP and scans the HTML for a usable title,
//! description and image. Plain string scanning is enough for the meta
//! tags this cares about; there is no HTML parser behind it.

use std::time::Duration;

use thiserror::Error;

/// Title and description length caps, matching what the record listings
/// can show without wrapping badly.
const TITLE_MAX_CHARS: usize = 60;
const DESCRIPTION_MAX_CHARS: usize = 150;

/// Icons at or above this declared size are wallpaper, not favicons.
const ICON_MAX_PX: u32 = 200;

const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

/// Errors that can occur while fetching page metadata.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout
    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP response
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// URL that cannot be parsed even after scheme normalization
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Metadata scraped from one page. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl PageMeta {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image.is_none()
    }
}

/// Fetches page metadata for a URL.
///
/// This trait enables stubbing the network in tests; the catalog facade
/// only ever depends on it.
pub trait MetaFetcher: Send + Sync {
    fn fetch_page_meta(&self, url: &str) -> Result<PageMeta, ScrapeError>;
}

/// The real fetcher: a synchronous HTTP client with desktop browser
/// headers, since a number of sites serve meta-less stubs to unknown
/// agents.
pub struct Scraper {
    client: reqwest::blocking::Client,
}

impl Scraper {
    pub fn new() -> Result<Self, ScrapeError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US"),
        );

        let client = reqwest::blocking::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ScrapeError::Network)?;

        Ok(Self { client })
    }
}

impl MetaFetcher for Scraper {
    fn fetch_page_meta(&self, url: &str) -> Result<PageMeta, ScrapeError> {
        let target = format_url(url);
        reqwest::Url::parse(&target)
            .map_err(|err| ScrapeError::InvalidUrl(format!("{target}: {err}")))?;

        let response = self.client.get(&target).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(request_error)?;
        Ok(extract_page_meta(&body))
    }
}

fn request_error(err: reqwest::Error) -> ScrapeError {
    if err.is_timeout() {
        ScrapeError::Timeout(err)
    } else {
        ScrapeError::Network(err)
    }
}

/// Prepends `https://` when the URL carries no scheme, so bare hostnames
/// can be stored as records and still scraped.
pub fn format_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Scans an HTML document for its metadata.
///
/// Title: `og:title`, else the `<title>` element, clipped to 60 chars.
/// Description: `og:description`, else `<meta name="description">`,
/// clipped to 150 chars. Image: `og:image`, else the largest declared
/// icon under 200px, else the first icon.
pub fn extract_page_meta(html: &str) -> PageMeta {
    let title = meta_content(html, "property", "og:title")
        .or_else(|| page_title(html))
        .map(|value| clip(value.trim(), TITLE_MAX_CHARS));
    let description = meta_content(html, "property", "og:description")
        .or_else(|| meta_content(html, "name", "description"))
        .map(|value| clip(value.trim(), DESCRIPTION_MAX_CHARS));
    let image = meta_content(html, "property", "og:image").or_else(|| page_icon(html));

    PageMeta {
        title,
        description,
        image,
    }
}

/// The content attribute of the first `<meta>` tag whose `key` attribute
/// equals `value`, case-insensitively.
fn meta_content(html: &str, key: &str, value: &str) -> Option<String> {
    for tag in scan_tags(html, "meta") {
        let matches = attr_value(tag, key).is_some_and(|v| v.eq_ignore_ascii_case(value));
        if matches {
            if let Some(content) = attr_value(tag, "content") {
                return Some(decode_entities(content));
            }
        }
    }
    None
}

fn page_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let after = &html[start..];
    let gt = after.find('>')?;
    let content = &after[gt + 1..];
    let end = content.to_ascii_lowercase().find("</title>")?;
    let title = content[..end].trim();
    if title.is_empty() {
        None
    } else {
        Some(decode_entities(title))
    }
}

fn page_icon(html: &str) -> Option<String> {
    let mut first_icon: Option<&str> = None;
    let mut largest: Option<(u32, &str)> = None;

    for tag in scan_tags(html, "link") {
        let Some(rel) = attr_value(tag, "rel") else {
            continue;
        };
        if !rel.to_ascii_lowercase().contains("icon") {
            continue;
        }
        let Some(href) = attr_value(tag, "href") else {
            continue;
        };
        if first_icon.is_none() {
            first_icon = Some(href);
        }

        let Some(sizes) = attr_value(tag, "sizes") else {
            continue;
        };
        let Some(px) = sizes
            .split(['x', 'X'])
            .next()
            .and_then(|n| n.trim().parse::<u32>().ok())
        else {
            continue;
        };
        if px < ICON_MAX_PX && largest.is_none_or(|(best, _)| px > best) {
            largest = Some((px, href));
        }
    }

    largest
        .map(|(_, href)| href)
        .or(first_icon)
        .map(decode_entities)
}

/// All `<name ...>` tag bodies in document order, scanned
/// case-insensitively. The returned slices keep their original casing.
fn scan_tags<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{name}");
    let mut tags = Vec::new();
    let mut from = 0;

    while let Some(found) = lower[from..].find(&open) {
        let start = from + found + open.len();
        // The tag name must end here, so "<meta" never matches "<metadata"
        match html[start..].chars().next() {
            Some(c) if c.is_ascii_whitespace() || c == '/' || c == '>' => {}
            _ => {
                from = start;
                continue;
            }
        }
        let Some(end) = html[start..].find('>') else {
            break;
        };
        tags.push(&html[start..start + end]);
        from = start + end + 1;
    }
    tags
}

/// The quoted value of `name` inside one tag body, allowing either quote
/// style and whitespace around `=`.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let mut from = 0;

    while let Some(found) = lower[from..].find(name) {
        let at = from + found;
        let boundary = tag[..at]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_ascii_whitespace());
        let rest = tag[at + name.len()..].trim_start();

        if boundary {
            if let Some(after_eq) = rest.strip_prefix('=') {
                let after_eq = after_eq.trim_start();
                for quote in ['"', '\''] {
                    if let Some(value) = after_eq.strip_prefix(quote) {
                        return value.find(quote).map(|end| &value[..end]);
                    }
                }
                return None;
            }
        }
        from = at + name.len();
    }
    None
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
}

fn clip(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
