//! Incoming module requests.

use crate::error::DevError;
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// Query parameter selecting a component's virtual module.
pub const VARIANT_PARAM: &str = "type";

/// A request for one module: decoded URL path plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Percent-decoded URL path, always starting with `/`.
    pub path: String,
    /// Decoded query parameters. A repeated key keeps its last value.
    pub query: BTreeMap<String, String>,
}

impl ModuleRequest {
    /// Build a request from a URL path with no query.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Build a request from the raw (still encoded) path and query string.
    #[must_use]
    pub fn from_raw(raw_path: &str, raw_query: Option<&str>) -> Self {
        let decoded = percent_decode_str(raw_path).decode_utf8_lossy();
        let path = if decoded.starts_with('/') {
            decoded.into_owned()
        } else {
            format!("/{decoded}")
        };
        let query = raw_query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self { path, query }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Extension of the last path segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let file = self.path.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext)
    }

    /// Which component sub-module this request addresses.
    pub fn variant(&self) -> Result<VirtualModuleVariant, DevError> {
        match self.query.get(VARIANT_PARAM).map(String::as_str) {
            None => Ok(VirtualModuleVariant::Main),
            Some("template") => Ok(VirtualModuleVariant::Template),
            Some(other) => Err(DevError::UnsupportedVariant {
                path: self.path.clone(),
                variant: other.to_string(),
            }),
        }
    }
}

/// The two virtual modules a component is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualModuleVariant {
    /// Component logic with the render function attached.
    Main,
    /// The compiled render function.
    Template,
}

impl VirtualModuleVariant {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Template => "template",
        }
    }
}
