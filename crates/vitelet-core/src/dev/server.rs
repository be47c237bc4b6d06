//! Request routing for the dev server.
//!
//! Each request is dispatched on its path: the entry document is served
//! raw, scripts go through the import rewriter, components are split into
//! their main or template module and then rewritten. Nothing is cached
//! between requests except specifier resolutions.

use crate::config::DevConfig;
use crate::dev::component::ComponentSplitter;
use crate::dev::request::{ModuleRequest, VirtualModuleVariant};
use crate::dev::resolve::SpecifierResolver;
use crate::dev::rewrite::ImportRewriter;
use crate::error::DevError;
use std::path::PathBuf;

pub const HTML_CONTENT_TYPE: &str = "text/html";
pub const JS_CONTENT_TYPE: &str = "application/javascript";

/// What a request was served as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Entry,
    Script,
    Component(VirtualModuleVariant),
}

impl ModuleKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Script => "script",
            Self::Component(VirtualModuleVariant::Main) => "component",
            Self::Component(VirtualModuleVariant::Template) => "component-template",
        }
    }
}

/// A successfully served module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedModule {
    pub kind: ModuleKind,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// On-demand module transform server.
///
/// `DevServer` is `Send + Sync`; one instance is shared by every request.
pub struct DevServer {
    config: DevConfig,
    resolver: SpecifierResolver,
    rewriter: ImportRewriter,
    splitter: ComponentSplitter,
}

impl DevServer {
    #[must_use]
    pub fn new(config: DevConfig) -> Self {
        let resolver = SpecifierResolver::new(&config);
        Self {
            config,
            resolver,
            rewriter: ImportRewriter::new(),
            splitter: ComponentSplitter::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &SpecifierResolver {
        &self.resolver
    }

    /// Forget memoised specifier resolutions, e.g. after dependencies change.
    pub fn reload(&self) {
        self.resolver.clear();
    }

    /// Serve one module request.
    pub fn handle(&self, request: &ModuleRequest) -> Result<ServedModule, DevError> {
        let entry_path = self.config.entry_path();
        if request.path == "/" || request.path == entry_path {
            let file = self.file_path(&entry_path)?;
            let body = vitelet_util::fs::read_file(&file).map_err(|_| DevError::FileNotFound {
                path: entry_path.clone(),
            })?;
            return Ok(ServedModule {
                kind: ModuleKind::Entry,
                content_type: HTML_CONTENT_TYPE,
                body,
            });
        }

        let kind = self.classify(request)?;
        let source = self.read_source(&request.path)?;

        let code = match kind {
            ModuleKind::Script | ModuleKind::Entry => source,
            ModuleKind::Component(VirtualModuleVariant::Main) => {
                self.splitter.main_module(&request.path, &source)?
            }
            ModuleKind::Component(VirtualModuleVariant::Template) => {
                self.splitter.template_module(&request.path, &source)?
            }
        };
        let code = self.rewriter.rewrite(&code, &self.resolver)?;

        Ok(ServedModule {
            kind,
            content_type: JS_CONTENT_TYPE,
            body: code.into_bytes(),
        })
    }

    /// Decide how a non-entry request is served from its extension and
    /// `type` query.
    fn classify(&self, request: &ModuleRequest) -> Result<ModuleKind, DevError> {
        let unsupported = || DevError::UnsupportedExtension {
            path: request.path.clone(),
        };
        let ext = request.extension().ok_or_else(unsupported)?;

        if self.config.script_extensions.iter().any(|e| e == ext) {
            Ok(ModuleKind::Script)
        } else if ext == self.config.component_extension {
            request.variant().map(ModuleKind::Component)
        } else {
            Err(unsupported())
        }
    }

    fn file_path(&self, url_path: &str) -> Result<PathBuf, DevError> {
        vitelet_util::path::join_under_root(&self.config.root, url_path).ok_or_else(|| {
            DevError::OutsideRoot {
                path: url_path.to_string(),
            }
        })
    }

    fn read_source(&self, url_path: &str) -> Result<String, DevError> {
        let file = self.file_path(url_path)?;
        vitelet_util::fs::read_utf8(&file).map_err(|_| DevError::FileNotFound {
            path: url_path.to_string(),
        })
    }
}
