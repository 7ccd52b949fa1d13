//! URL layout of a WFS3 service.
//!
//! Two conventions exist across the WFS3 drafts. Both put the OpenAPI
//! document at `/api`.
//!
//! Legacy:
//! - `/` collection info
//! - `/<collection>` collection items
//! - `/<collection>/<fid>` a single feature
//!
//! Current:
//! - `/collections` collection info
//! - `/collections/<collection>/items` collection items
//! - `/collections/<collection>/items/<fid>` a single feature
//!
//! Every URL produced here is absolute and ends with a trailing slash.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Which URL layout a service follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathConvention {
    #[default]
    Legacy,
    Current,
}

impl fmt::Display for PathConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathConvention::Legacy => f.write_str("legacy"),
            PathConvention::Current => f.write_str("current"),
        }
    }
}

/// Builds endpoint URLs for one service root under a fixed convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: Url,
    convention: PathConvention,
}

impl PathResolver {
    /// Parse `root`, appending a trailing slash when it is missing.
    pub fn new(root: &str, convention: PathConvention) -> Result<Self, url::ParseError> {
        let root = if root.ends_with('/') {
            Url::parse(root)?
        } else {
            Url::parse(&format!("{root}/"))?
        };
        if root.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(Self { root, convention })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn convention(&self) -> PathConvention {
        self.convention
    }

    /// The OpenAPI document.
    pub fn spec(&self) -> String {
        self.url(&["api"])
    }

    /// The aggregate collection metadata endpoint.
    pub fn collection_info(&self) -> String {
        match self.convention {
            PathConvention::Legacy => self.url(&[]),
            PathConvention::Current => self.url(&["collections"]),
        }
    }

    pub fn collection_items(&self, collection_id: &str) -> String {
        match self.convention {
            PathConvention::Legacy => self.url(&[collection_id]),
            PathConvention::Current => self.url(&["collections", collection_id, "items"]),
        }
    }

    pub fn collection_item(&self, collection_id: &str, feature_id: &str) -> String {
        match self.convention {
            PathConvention::Legacy => self.url(&[collection_id, feature_id]),
            PathConvention::Current => {
                self.url(&["collections", collection_id, "items", feature_id])
            }
        }
    }

    fn url(&self, segments: &[&str]) -> String {
        if segments.is_empty() {
            return self.root.to_string();
        }
        // "./" keeps a segment like "ns:roads" from parsing as a scheme
        let relative = format!("./{}/", segments.join("/"));
        self.root
            .join(&relative)
            .expect("root is checked to be a base URL in new()")
            .to_string()
    }
}
