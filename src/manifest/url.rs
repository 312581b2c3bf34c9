//! Normalization of user-supplied addon URLs
//!
//! Addon links are pasted in several shapes: install links with the
//! `stremio://` scheme, base URLs without the manifest file name, or the full
//! manifest URL. All of them are turned into the canonical
//! `https://.../manifest.json` form before being used as a cache key.

use reqwest::Url;
use thiserror::Error;

/// File name every addon serves its manifest under
const MANIFEST_FILE: &str = "manifest.json";

/// Scheme used by Stremio install links
const STREMIO_SCHEME: &str = "stremio://";

/// Errors produced while normalizing an addon URL
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    /// The input was empty or only whitespace
    #[error("Addon URL is empty")]
    Empty,

    /// The input could not be parsed as a URL
    #[error("Invalid addon URL '{0}'")]
    Invalid(String),

    /// The URL uses a scheme other than http, https or stremio
    #[error("Unsupported URL scheme '{0}'; expected http, https or stremio")]
    UnsupportedScheme(String),
}

/// Turns an addon link into the manifest URL it refers to
///
/// # Arguments
/// * `input` - The URL as typed or pasted by a user
///
/// # Returns
/// * `Ok(String)` - An http(s) URL whose path ends in `/manifest.json`
/// * `Err(UrlError)` - If the input is empty, malformed, or uses another scheme
pub fn normalize_manifest_url(input: &str) -> Result<String, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    // The url crate refuses to switch a non-special scheme to https, so the
    // rewrite happens on the raw string.
    let rewritten = match trimmed.get(..STREMIO_SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(STREMIO_SCHEME) => {
            format!("https://{}", &trimmed[STREMIO_SCHEME.len()..])
        }
        _ => trimmed.to_string(),
    };

    let mut url = Url::parse(&rewritten).map_err(|_| UrlError::Invalid(trimmed.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::Invalid(trimmed.to_string()));
    }

    if !url.path().ends_with(&format!("/{MANIFEST_FILE}")) {
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{MANIFEST_FILE}"));
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_manifest_url_is_unchanged() {
        let url = "https://v3-cinemeta.strem.io/manifest.json";
        assert_eq!(normalize_manifest_url(url).unwrap(), url);
    }

    #[test]
    fn test_stremio_scheme_becomes_https() {
        assert_eq!(
            normalize_manifest_url("stremio://addon.example.com/manifest.json").unwrap(),
            "https://addon.example.com/manifest.json"
        );
        assert_eq!(
            normalize_manifest_url("STREMIO://addon.example.com/manifest.json").unwrap(),
            "https://addon.example.com/manifest.json"
        );
    }

    #[test]
    fn test_manifest_file_is_appended() {
        assert_eq!(
            normalize_manifest_url("https://addon.example.com").unwrap(),
            "https://addon.example.com/manifest.json"
        );
        assert_eq!(
            normalize_manifest_url("https://addon.example.com/config=abc/").unwrap(),
            "https://addon.example.com/config=abc/manifest.json"
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(
            normalize_manifest_url("  http://localhost:7000/manifest.json\n").unwrap(),
            "http://localhost:7000/manifest.json"
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(normalize_manifest_url(""), Err(UrlError::Empty));
        assert_eq!(normalize_manifest_url("   "), Err(UrlError::Empty));
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        assert_eq!(
            normalize_manifest_url("ftp://addon.example.com/manifest.json"),
            Err(UrlError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            normalize_manifest_url("not a url"),
            Err(UrlError::Invalid(_))
        ));
    }
}
