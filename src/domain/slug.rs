// Copyright (c) 2025 - Cowboy AI, Inc.
//! Slug Value Object
//!
//! NetBox identifies sites, device types, manufacturers and roles by slug.
//! Slugs are derived deterministically from names so that re-running the same
//! discovery batch always targets the same objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Slug derivation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("Name has no slug-able characters: {0:?}")]
    Empty(String),
}

/// NetBox slug
///
/// Invariants:
/// - Non-empty
/// - Only `[a-z0-9_-]`
/// - No leading, trailing or repeated hyphens
/// - At most 100 characters
///
/// # Examples
///
/// ```rust
/// use cim_netbox_reconciler::domain::Slug;
///
/// let slug = Slug::from_name("Catalyst 3850-48P").unwrap();
/// assert_eq!(slug.as_str(), "catalyst-3850-48p");
///
/// assert!(Slug::from_name("  !!  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length accepted by NetBox
    pub const MAX_LENGTH: usize = 100;

    /// Derive a slug from a display name
    pub fn from_name(name: impl AsRef<str>) -> Result<Self, SlugError> {
        let name = name.as_ref();
        let mut slug = String::with_capacity(name.len());
        let mut pending_separator = false;

        for ch in name.chars() {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_alphanumeric() || ch == '_' {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(ch);
            } else {
                pending_separator = true;
            }
        }

        // ASCII only at this point, byte truncation is safe
        slug.truncate(Self::MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }

        if slug.is_empty() {
            return Err(SlugError::Empty(name.to_string()));
        }

        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Slug {
    type Error = SlugError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_name(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_derivation() {
        assert_eq!(Slug::from_name("Core Router 01").unwrap().as_str(), "core-router-01");
        assert_eq!(Slug::from_name("ASR 1001-X").unwrap().as_str(), "asr-1001-x");
        assert_eq!(Slug::from_name("dc_east").unwrap().as_str(), "dc_east");
        assert_eq!(Slug::from_name("  --Edge   Switch--  ").unwrap().as_str(), "edge-switch");
        assert_eq!(Slug::from_name("Zürich DC").unwrap().as_str(), "z-rich-dc");
    }

    #[test]
    fn test_slug_empty() {
        assert!(Slug::from_name("").is_err());
        assert!(Slug::from_name("!!!").is_err());
        assert!(Slug::from_name(" - / - ").is_err());
    }

    #[test]
    fn test_slug_length_limit() {
        let long = "a".repeat(150);
        assert_eq!(Slug::from_name(&long).unwrap().as_str().len(), Slug::MAX_LENGTH);

        // Truncation must not leave a dangling separator
        let name = format!("{} b", "a".repeat(99));
        assert_eq!(Slug::from_name(&name).unwrap().as_str(), "a".repeat(99));
    }

    #[test]
    fn test_slug_is_deterministic() {
        let first = Slug::from_name("PowerEdge R750").unwrap();
        let second = Slug::from_name("PowerEdge R750").unwrap();
        assert_eq!(first, second);
    }
}
