//! Bare specifier resolution against installed dependency manifests.
//!
//! `vue` resolves to `/node_modules/vue/<module entry>`, read from
//! `node_modules/vue/package.json`. A sub-path (`lodash-es/debounce.js`)
//! resolves to the file under the package directory. Scoped packages
//! (`@scope/pkg`) count as one package name.

use crate::config::DevConfig;
use crate::error::DevError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Result of resolving one bare specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpecifier {
    pub package_name: String,
    pub subpath: Option<String>,
    /// Loader-fetchable URL path.
    pub url: String,
}

/// Resolves bare specifiers to URL paths under the dependency mount.
///
/// Results are memoised per resolver until [`SpecifierResolver::clear`].
pub struct SpecifierResolver {
    /// Absolute dependency directory.
    deps_path: PathBuf,
    /// URL prefix the dependency directory is served under.
    mount_prefix: String,
    /// Manifest field holding the module entry.
    entry_field: String,
    /// specifier → resolution; `None` when memoisation is off.
    memo: Option<RwLock<HashMap<String, ResolvedSpecifier>>>,
}

impl SpecifierResolver {
    #[must_use]
    pub fn new(config: &DevConfig) -> Self {
        Self {
            deps_path: config.deps_path(),
            mount_prefix: config.mount_prefix(),
            entry_field: config.entry_field.clone(),
            memo: config.resolve_cache.then(|| RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a bare specifier.
    pub fn resolve(&self, specifier: &str) -> Result<ResolvedSpecifier, DevError> {
        if let Some(hit) = self.cached(specifier) {
            return Ok(hit);
        }

        let resolved = self.resolve_uncached(specifier)?;

        if let Some(memo) = &self.memo {
            if let Ok(mut memo) = memo.write() {
                memo.insert(specifier.to_string(), resolved.clone());
            }
        }
        Ok(resolved)
    }

    /// Drop every memoised resolution.
    pub fn clear(&self) {
        if let Some(memo) = &self.memo {
            if let Ok(mut memo) = memo.write() {
                memo.clear();
            }
        }
    }

    /// Number of memoised resolutions.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.memo
            .as_ref()
            .and_then(|memo| memo.read().ok().map(|m| m.len()))
            .unwrap_or(0)
    }

    fn cached(&self, specifier: &str) -> Option<ResolvedSpecifier> {
        self.memo.as_ref()?.read().ok()?.get(specifier).cloned()
    }

    fn resolve_uncached(&self, specifier: &str) -> Result<ResolvedSpecifier, DevError> {
        let (package, subpath) = split_specifier(specifier);

        let manifest_path = vitelet_util::path::join_under_root(&self.deps_path, package)
            .map(|dir| dir.join("package.json"))
            .ok_or_else(|| DevError::ManifestNotFound {
                package: package.to_string(),
                path: self.deps_path.join(package),
            })?;
        let manifest = read_manifest(&manifest_path).ok_or_else(|| DevError::ManifestNotFound {
            package: package.to_string(),
            path: manifest_path.clone(),
        })?;

        let target = match subpath {
            Some(sub) => sub.to_string(),
            None => manifest
                .get(&self.entry_field)
                .and_then(Value::as_str)
                .map(|entry| entry.trim_start_matches("./").to_string())
                .filter(|entry| !entry.is_empty())
                .ok_or_else(|| DevError::EntryFieldMissing {
                    package: package.to_string(),
                    field: self.entry_field.clone(),
                })?,
        };

        Ok(ResolvedSpecifier {
            package_name: package.to_string(),
            subpath: subpath.map(str::to_string),
            url: format!("{}/{package}/{target}", self.mount_prefix),
        })
    }
}

/// Read and parse a `package.json`. `None` if absent or not JSON.
fn read_manifest(path: &std::path::Path) -> Option<Value> {
    let content = vitelet_util::fs::read_utf8(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// True for specifiers that name a package rather than a location.
#[must_use]
pub fn is_bare_specifier(spec: &str) -> bool {
    if spec.is_empty() || spec.starts_with('.') || spec.starts_with('/') {
        return false;
    }
    !(spec.contains("://") || spec.starts_with("data:"))
}

/// Split a bare specifier into package name and optional sub-path.
#[must_use]
pub fn split_specifier(spec: &str) -> (&str, Option<&str>) {
    // @scope/pkg or @scope/pkg/subpath
    if spec.starts_with('@') {
        let mut slash_count = 0;
        for (i, c) in spec.char_indices() {
            if c == '/' {
                slash_count += 1;
                if slash_count == 2 {
                    return (&spec[..i], Some(&spec[i + 1..]).filter(|s| !s.is_empty()));
                }
            }
        }
        return (spec, None);
    }

    match spec.find('/') {
        Some(pos) => (&spec[..pos], Some(&spec[pos + 1..]).filter(|s| !s.is_empty())),
        None => (spec, None),
    }
}
