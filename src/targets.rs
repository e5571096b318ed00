// src/targets.rs
// =============================================================================
// The fixed list of websites we count links on.
//
// Each target is identified by its position in the list (0, 1, 2, ...).
// The list is built once at startup, validated, and then only read.
//
// Rust concepts:
// - Newtype: Targets wraps a Vec so only validated lists can exist
// - Index / IntoIterator: Targets can be indexed and looped over like a slice
// =============================================================================

use std::ops::Index;
use thiserror::Error;
use url::Url;

/// The ten sites scanned when no --target flag is given.
pub const DEFAULT_TARGETS: &[&str] = &[
    "https://go.dev",
    "https://www.paradigmadigital.com",
    "https://www.realpython.com",
    "https://www.lapatilla.com",
    "https://www.facebook.com",
    "https://www.gitlab.com",
    "https://www.youtube.com",
    "https://www.mozilla.org",
    "https://www.github.com",
    "https://www.google.com",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid target URL '{address}': {reason}")]
    InvalidUrl { address: String, reason: String },

    #[error("target '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("the target list is empty")]
    Empty,
}

/// One website in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub index: usize,
    /// The address exactly as configured, used in reports
    pub address: String,
    pub url: Url,
}

/// The ordered, read-only target list.
#[derive(Debug, Clone)]
pub struct Targets(Vec<Target>);

impl Targets {
    /// Parses and validates a list of addresses, assigning indices in order.
    pub fn parse<S: AsRef<str>>(addresses: &[S]) -> Result<Self, TargetError> {
        if addresses.is_empty() {
            return Err(TargetError::Empty);
        }

        let mut targets = Vec::with_capacity(addresses.len());
        for (index, address) in addresses.iter().enumerate() {
            let address = address.as_ref().trim();
            let url = Url::parse(address).map_err(|e| TargetError::InvalidUrl {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(TargetError::UnsupportedScheme(address.to_string()));
            }

            targets.push(Target {
                index,
                address: address.to_string(),
                url,
            });
        }

        Ok(Self(targets))
    }

    /// The built-in list of ten sites.
    pub fn builtin() -> Self {
        // DEFAULT_TARGETS is a constant list of valid https URLs
        Self::parse(DEFAULT_TARGETS).expect("built-in targets are valid")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&Target> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.0.iter()
    }
}

impl Index<usize> for Targets {
    type Output = Target;

    fn index(&self, index: usize) -> &Target {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Targets {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_ten_contiguous_targets() {
        let targets = Targets::builtin();
        assert_eq!(targets.len(), 10);
        for (position, target) in targets.iter().enumerate() {
            assert_eq!(target.index, position);
        }
        assert_eq!(targets[0].address, "https://go.dev");
        assert_eq!(targets[9].address, "https://www.google.com");
    }

    #[test]
    fn test_parse_keeps_configured_address() {
        let targets = Targets::parse(&["  http://localhost:8080/page "]).unwrap();
        assert_eq!(targets[0].address, "http://localhost:8080/page");
        assert_eq!(targets[0].url.port(), Some(8080));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Targets::parse::<&str>(&[]).unwrap_err(), TargetError::Empty);
        assert!(matches!(
            Targets::parse(&["not a url"]),
            Err(TargetError::InvalidUrl { .. })
        ));
        assert_eq!(
            Targets::parse(&["ftp://files.example.com"]).unwrap_err(),
            TargetError::UnsupportedScheme("ftp://files.example.com".to_string())
        );
    }
}
