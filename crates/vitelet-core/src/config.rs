//! Dev server configuration.
//!
//! A [`DevConfig`] is built explicitly (defaults, then an optional
//! `vitelet.json`, then CLI flags) and handed to
//! [`DevServer::new`](crate::dev::DevServer::new).
//!
//! ```json
//! {
//!   "server": { "host": "127.0.0.1", "port": 5137 },
//!   "entry": "index.html",
//!   "resolve": { "depsDir": "node_modules", "entryField": "module", "cache": true }
//! }
//! ```

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "vitelet.json";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5137;

/// Runtime configuration for the dev server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevConfig {
    /// Project root; every served path resolves under it.
    pub root: PathBuf,

    /// Address to bind.
    pub host: String,
    pub port: u16,

    /// Entry document, relative to the root.
    pub entry: String,

    /// Directory holding installed dependencies, relative to the root.
    pub deps_dir: String,

    /// Manifest field naming a package's browser module entry.
    pub entry_field: String,

    /// Memoise specifier resolution until the next reload.
    pub resolve_cache: bool,

    /// Extensions served through the import rewriter.
    pub script_extensions: Vec<String>,

    /// Extension of single-file components.
    pub component_extension: String,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            entry: "index.html".to_string(),
            deps_dir: "node_modules".to_string(),
            entry_field: "module".to_string(),
            resolve_cache: true,
            script_extensions: vec!["js".to_string(), "mjs".to_string()],
            component_extension: "vue".to_string(),
        }
    }
}

impl DevConfig {
    /// Create a new config rooted at the given directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    #[must_use]
    pub fn with_deps_dir(mut self, deps_dir: impl Into<String>) -> Self {
        self.deps_dir = deps_dir.into();
        self
    }

    #[must_use]
    pub fn with_entry_field(mut self, field: impl Into<String>) -> Self {
        self.entry_field = field.into();
        self
    }

    #[must_use]
    pub fn with_resolve_cache(mut self, enabled: bool) -> Self {
        self.resolve_cache = enabled;
        self
    }

    /// Overlay values present in a config file.
    #[must_use]
    pub fn with_file(mut self, file: &ConfigFile) -> Self {
        if let Some(host) = &file.server.host {
            self.host.clone_from(host);
        }
        if let Some(port) = file.server.port {
            self.port = port;
        }
        if let Some(entry) = &file.entry {
            self.entry.clone_from(entry);
        }
        if let Some(deps_dir) = &file.resolve.deps_dir {
            self.deps_dir.clone_from(deps_dir);
        }
        if let Some(field) = &file.resolve.entry_field {
            self.entry_field.clone_from(field);
        }
        if let Some(cache) = file.resolve.cache {
            self.resolve_cache = cache;
        }
        self
    }

    /// URL path of the entry document (`/index.html`).
    #[must_use]
    pub fn entry_path(&self) -> String {
        format!("/{}", self.entry.trim_start_matches(['/', '.']))
    }

    /// URL prefix dependencies are served under (`/node_modules`).
    #[must_use]
    pub fn mount_prefix(&self) -> String {
        let dir = self.deps_dir.replace('\\', "/");
        format!("/{}", dir.trim_matches('/'))
    }

    /// Absolute dependency directory.
    #[must_use]
    pub fn deps_path(&self) -> PathBuf {
        self.root.join(&self.deps_dir)
    }

    /// Listen address in `host:port` form.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// On-disk `vitelet.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub entry: Option<String>,
    #[serde(default)]
    pub resolve: ResolveSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveSection {
    pub deps_dir: Option<String>,
    pub entry_field: Option<String>,
    pub cache: Option<bool>,
}

/// Load the config file.
///
/// An explicit path must exist; otherwise `vitelet.json` in `root` is used
/// when present and `Ok(None)` is returned when it is not.
pub fn load_config_file(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<Option<(PathBuf, ConfigFile)>, Error> {
    let path = match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => {
            let candidate = root.join(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                return Ok(None);
            }
            candidate
        }
    };

    let source = vitelet_util::fs::read_utf8(&path).map_err(|source| Error::ConfigRead {
        path: path.clone(),
        source,
    })?;
    let file = serde_json::from_str(&source).map_err(|source| Error::ConfigParse {
        path: path.clone(),
        source,
    })?;
    Ok(Some((path, file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DevConfig::new(PathBuf::from("/project"));
        assert_eq!(config.port, 5137);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.entry_path(), "/index.html");
        assert_eq!(config.mount_prefix(), "/node_modules");
        assert_eq!(config.entry_field, "module");
        assert!(config.resolve_cache);
        assert_eq!(config.deps_path(), PathBuf::from("/project/node_modules"));
    }

    #[test]
    fn test_builder() {
        let config = DevConfig::new(PathBuf::from("/p"))
            .with_port(3000)
            .with_entry("./public/index.html")
            .with_deps_dir("vendor/")
            .with_resolve_cache(false);
        assert_eq!(config.addr(), "127.0.0.1:3000");
        assert_eq!(config.entry_path(), "/public/index.html");
        assert_eq!(config.mount_prefix(), "/vendor");
        assert!(!config.resolve_cache);
    }

    #[test]
    fn test_with_file_overlays_present_values() {
        let file: ConfigFile = serde_json::from_value(serde_json::json!({
            "server": { "port": 8080 },
            "resolve": { "entryField": "browser", "cache": false }
        }))
        .unwrap();
        let config = DevConfig::new(PathBuf::from("/p")).with_file(&file);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.entry_field, "browser");
        assert!(!config.resolve_cache);
    }

    #[test]
    fn test_load_config_file_absent() {
        let dir = tempdir().unwrap();
        assert!(load_config_file(dir.path(), None).unwrap().is_none());
    }

    #[test]
    fn test_load_config_file_found() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "entry": "app.html", "resolve": { "depsDir": "deps" } }"#,
        )
        .unwrap();
        let (path, file) = load_config_file(dir.path(), None).unwrap().unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert_eq!(file.entry.as_deref(), Some("app.html"));
        assert_eq!(file.resolve.deps_dir.as_deref(), Some("deps"));
    }

    #[test]
    fn test_load_config_file_explicit_missing() {
        let dir = tempdir().unwrap();
        let err = load_config_file(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_load_config_file_invalid_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ port: ").unwrap();
        let err = load_config_file(dir.path(), None).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
