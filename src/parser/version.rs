//! Apache version detection
//!
//! The balancer-manager page opens with a definition list whose first term
//! reads `Server Version: Apache/2.4.41 (Unix)`. Finding that term is also
//! how a page is recognized as a balancer-manager page at all.

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::parser::selectors::FIRST_DT;
use crate::utils::error::ParseError;

/// Dotted Apache httpd version, e.g. `2.4.41`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApacheVersion(String);

impl ApacheVersion {
    /// Wrap an already-extracted version string
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Component-wise prefix comparison
    ///
    /// `"2.4"` and `"2.4.41"` both match `2.4.41`; `"2.4.4"` does not.
    #[must_use]
    pub fn is(&self, prefix: &str) -> bool {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return false;
        }

        let mut own = self.0.split('.');
        prefix.split('.').all(|part| own.next() == Some(part))
    }
}

impl fmt::Display for ApacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read the Apache version from the first `dt` element
///
/// # Errors
///
/// Returns `ParseError::NotBalancerManager` if the document has no `dt`
/// element or its text does not carry an Apache server version.
pub fn detect(document: &Html) -> Result<ApacheVersion, ParseError> {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();

    let re = VERSION_RE.get_or_init(|| {
        Regex::new(r"^Server Version: Apache/([.0-9]*[0-9])").expect("Invalid regex pattern")
    });

    let text = document
        .select(&FIRST_DT)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or(ParseError::NotBalancerManager)?;

    re.captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| ApacheVersion::new(m.as_str()))
        .ok_or(ParseError::NotBalancerManager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page(dt: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><h1>Load Balancer Manager for lb</h1><dl><dt>{dt}</dt>\
             <dt>Server Built: Aug 12 2020</dt></dl></body></html>"
        ))
    }

    #[test]
    fn test_detect_2_4() {
        let doc = page("Server Version: Apache/2.4.41 (Ubuntu) OpenSSL/1.1.1f");
        let version = detect(&doc).unwrap();
        assert_eq!(version.as_str(), "2.4.41");
    }

    #[test]
    fn test_detect_2_2() {
        let version = detect(&page("Server Version: Apache/2.2.34 (Unix)")).unwrap();
        assert_eq!(version.as_str(), "2.2.34");
        assert!(version.is("2.2"));
        assert!(!version.is("2.4"));
    }

    #[test]
    fn test_detect_rejects_other_pages() {
        let doc = Html::parse_document("<html><body><p>It works!</p></body></html>");
        assert_eq!(detect(&doc), Err(ParseError::NotBalancerManager));

        assert_eq!(
            detect(&page("Server Version: nginx/1.25.3")),
            Err(ParseError::NotBalancerManager)
        );
    }

    #[test]
    fn test_prefix_is_component_wise() {
        let version = ApacheVersion::new("2.4.41");
        assert!(version.is("2"));
        assert!(version.is("2.4"));
        assert!(version.is("2.4.41"));
        assert!(!version.is("2.4.4"));
        assert!(!version.is("2.4.41.1"));
        assert!(!version.is(""));
    }

    proptest! {
        #[test]
        fn prop_version_matches_itself_only(
            major in 1u32..3, minor in 0u32..10, patch in 0u32..60, other in 0u32..60
        ) {
            let text = format!("{major}.{minor}.{patch}");
            let doc = page(&format!("Server Version: Apache/{text} (Unix)"));
            let version = detect(&doc).unwrap();

            prop_assert!(version.is(&text));
            prop_assume!(other != patch);
            let other_text = format!("{major}.{minor}.{other}");
            prop_assert!(!version.is(&other_text));
        }
    }
}
