//! Image references
//!
//! The store never holds image bytes. A reference is either an external URL
//! or a `local:<id>` marker pointing at content kept by the asset pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

const LOCAL_PREFIX: &str = "local:";

/// Opaque image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reference to locally stored content
    pub fn local(id: &str) -> Self {
        Self(format!("{LOCAL_PREFIX}{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Id of locally stored content, if this is a `local:` marker
    pub fn local_id(&self) -> Option<&str> {
        self.0.strip_prefix(LOCAL_PREFIX).filter(|id| !id.is_empty())
    }

    pub fn is_external(&self) -> bool {
        !self.is_empty() && self.local_id().is_none()
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Displayable form of an image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    /// Load directly from this URL
    Url(String),
    /// Inline content
    Bytes { mime: String, data: Vec<u8> },
}

/// Turns stored references into something the UI can display.
///
/// Implemented by the asset pipeline; the store only passes references through.
pub trait AssetResolver {
    fn resolve(&self, reference: &AssetRef) -> Option<ResolvedAsset>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<String, Vec<u8>>);

    impl AssetResolver for MapResolver {
        fn resolve(&self, reference: &AssetRef) -> Option<ResolvedAsset> {
            match reference.local_id() {
                Some(id) => self.0.get(id).map(|data| ResolvedAsset::Bytes {
                    mime: "image/webp".to_string(),
                    data: data.clone(),
                }),
                None if reference.is_external() => {
                    Some(ResolvedAsset::Url(reference.as_str().to_string()))
                }
                None => None,
            }
        }
    }

    #[test]
    fn test_local_marker() {
        let r = AssetRef::local("abc123");
        assert_eq!(r.as_str(), "local:abc123");
        assert_eq!(r.local_id(), Some("abc123"));
        assert!(!r.is_external());
        assert_eq!(AssetRef::new("local:").local_id(), None);
    }

    #[test]
    fn test_external_url() {
        let r = AssetRef::from("https://cdn.example.com/pizza.webp");
        assert!(r.is_external());
        assert_eq!(r.local_id(), None);
        assert!(!AssetRef::default().is_external());
    }

    #[test]
    fn test_serde_transparent() {
        let r = AssetRef::local("x");
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"local:x\"");
    }

    #[test]
    fn test_resolver_boundary() {
        let resolver = MapResolver(HashMap::from([("img1".to_string(), vec![1, 2, 3])]));
        assert!(matches!(
            resolver.resolve(&AssetRef::local("img1")),
            Some(ResolvedAsset::Bytes { .. })
        ));
        assert_eq!(resolver.resolve(&AssetRef::local("missing")), None);
        assert_eq!(
            resolver.resolve(&AssetRef::new("https://x/y.png")),
            Some(ResolvedAsset::Url("https://x/y.png".to_string()))
        );
    }
}
