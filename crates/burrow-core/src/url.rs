//! URL canonicalization.
//!
//! The canonical form is the dedup key for shortening: two inputs that
//! canonicalize to the same string always map to the same short code.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write};
use ::url::Url;

/// A normalized absolute `http`/`https` URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Wraps an already canonical string without re-parsing it.
    ///
    /// Stores use this when decoding records they persisted themselves.
    pub fn new_unchecked(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes `raw` into its canonical form.
///
/// # Normalization Rules
///
/// 1. **Scheme**: only `http` and `https`, lowercased
/// 2. **Host**: required, lowercased
/// 3. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 4. **Path**: case preserved, a single trailing `/` removed
/// 5. **Query and fragment**: preserved
///
/// # Examples
///
/// ```
/// use burrow_core::url::canonicalize;
///
/// let url = canonicalize("https://Example.com/Path/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Path");
///
/// assert!(canonicalize("not-a-url").is_err());
/// ```
pub fn canonicalize(raw: &str) -> Result<CanonicalUrl, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| CoreError::InvalidUrl(format!("'{}' is not an absolute URL: {}", trimmed, e)))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(CoreError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            scheme
        )));
    }

    let host = match parsed.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => {
            return Err(CoreError::InvalidUrl(format!(
                "URL must have a host: {}",
                trimmed
            )))
        }
    };

    let mut canonical = String::with_capacity(trimmed.len());
    canonical.push_str(scheme);
    canonical.push_str("://");

    if !parsed.username().is_empty() {
        canonical.push_str(parsed.username());
        if let Some(password) = parsed.password() {
            canonical.push(':');
            canonical.push_str(password);
        }
        canonical.push('@');
    }

    canonical.push_str(&host);
    if let Some(port) = parsed.port() {
        // writing into a String cannot fail
        let _ = write!(canonical, ":{}", port);
    }

    let path = parsed.path();
    canonical.push_str(path.strip_suffix('/').unwrap_or(path));

    if let Some(query) = parsed.query() {
        canonical.push('?');
        canonical.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        canonical.push('#');
        canonical.push_str(fragment);
    }

    Ok(CanonicalUrl(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> String {
        canonicalize(raw).unwrap().into_string()
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(canon("HTTPS://EXAMPLE.COM/Path"), "https://example.com/Path");
        assert_eq!(canon("http://ExAmPlE.CoM/a/B"), "http://example.com/a/B");
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(canon("https://example.com/"), "https://example.com");
        assert_eq!(canon("https://example.com"), "https://example.com");
        assert_eq!(canon("https://Example.com/Path/"), "https://example.com/Path");
    }

    #[test]
    fn keeps_query_and_fragment() {
        assert_eq!(
            canon("https://example.com/search?q=Rust&Page=2#Results"),
            "https://example.com/search?q=Rust&Page=2#Results"
        );
        assert_eq!(canon("https://example.com/?a=1"), "https://example.com?a=1");
    }

    #[test]
    fn drops_default_port_keeps_custom_port() {
        assert_eq!(canon("https://example.com:443/x"), "https://example.com/x");
        assert_eq!(canon("http://example.com:8080/x"), "http://example.com:8080/x");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(canon("  https://example.com/a \n"), "https://example.com/a");
    }

    #[test]
    fn same_target_same_canonical_form() {
        assert_eq!(
            canonicalize("HTTPS://Example.com/Path/").unwrap(),
            canonicalize("https://example.com/Path").unwrap()
        );
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(canonicalize(""), Err(CoreError::InvalidUrl(_))));
        assert!(matches!(canonicalize("   "), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(matches!(canonicalize("not-a-url"), Err(CoreError::InvalidUrl(_))));
        assert!(matches!(canonicalize("example.com/path"), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(canonicalize("ftp://example.com/file").is_err());
        assert!(canonicalize("javascript:alert(1)").is_err());
        assert!(canonicalize("mailto:someone@example.com").is_err());
    }

    #[test]
    fn rejects_missing_host() {
        assert!(canonicalize("http://").is_err());
        assert!(canonicalize("https://").is_err());
    }
}
