// src/utils/http.rs

//! HTTP client utilities.

use std::sync::LazyLock;
use std::time::Duration;

use encoding_rs::{Encoding, WINDOWS_1252};
use regex::bytes::Regex;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;

use crate::error::Result;
use crate::models::{PortalConfig, ResultPage};

/// Charset assumed for `text/html` bodies that declare none.
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

/// Bytes scanned for a `<meta>` charset declaration.
const SNIFF_LIMIT: usize = 4096;

static RE_META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta\b[^>]*\bcharset\s*=\s*["']?([A-Za-z0-9._:-]+)"#)
        .expect("invalid regex: meta charset")
});

/// Create a blocking HTTP client that keeps session cookies.
pub fn create_client(config: &PortalConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .cookie_store(true);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Read and decode a response body.
///
/// Non-success statuses are errors.
pub fn read_page(response: Response) -> Result<ResultPage> {
    let response = response.error_for_status()?;
    let header_charset = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_of);
    let bytes = response.bytes()?;
    Ok(decode_page(&bytes, header_charset))
}

/// Decode a body with the first charset found in the header, then in a
/// `<meta>` tag, then [`DEFAULT_CHARSET`].
pub fn decode_page(bytes: &[u8], header_charset: Option<String>) -> ResultPage {
    let label = header_charset
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string());
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
        log::warn!("Unknown charset '{}', decoding as {}", label, DEFAULT_CHARSET);
        WINDOWS_1252
    });
    let (body, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::debug!("Malformed {} sequences replaced", encoding.name());
    }
    ResultPage {
        body: body.into_owned(),
        charset: Some(label),
    }
}

/// Charset declared by a `<meta>` tag near the start of the body.
fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
    RE_META_CHARSET
        .captures(head)
        .map(|caps| String::from_utf8_lossy(&caps[1]).into_owned())
}

/// Extract the `charset=` parameter of a content type.
pub fn charset_of(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_of() {
        assert_eq!(
            charset_of("text/html; charset=ISO-8859-1"),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(
            charset_of("text/html;Charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_of("text/html"), None);
    }

    #[test]
    fn test_decode_page_uses_meta_charset() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" \
            content=\"text/html; charset=ISO-8859-1\"></head><td>M\xE2con</td></html>";
        let page = decode_page(body, None);
        assert_eq!(page.charset.as_deref(), Some("ISO-8859-1"));
        assert!(page.body.contains("<td>Mâcon</td>"));
    }

    #[test]
    fn test_decode_page_header_wins() {
        let body = "<meta charset=\"ISO-8859-1\"><td>Mâcon</td>".as_bytes();
        let page = decode_page(body, Some("utf-8".to_string()));
        assert_eq!(page.charset.as_deref(), Some("utf-8"));
        assert!(page.body.contains("Mâcon"));
    }

    #[test]
    fn test_decode_page_defaults_to_latin1() {
        let page = decode_page(b"<td>Besan\xE7on</td>", None);
        assert_eq!(page.charset.as_deref(), Some(DEFAULT_CHARSET));
        assert_eq!(page.body, "<td>Besançon</td>");
    }

    #[test]
    fn test_decode_page_unknown_label_falls_back() {
        let page = decode_page(b"caf\xE9", Some("x-unknown".to_string()));
        assert_eq!(page.body, "café");
    }
}
