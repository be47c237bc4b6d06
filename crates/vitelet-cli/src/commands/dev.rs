//! `vitelet dev` command implementation.
//!
//! Serves the project tree to the browser's native module loader without a
//! bundling step:
//!
//! ```text
//! Browser requests GET /src/App.vue?type=template
//!   → ModuleRequest (decoded path + query)
//!   → DevServer::handle (read, split component, rewrite bare imports)
//!   → 200 application/javascript, or 404 with an empty body
//! ```
//!
//! A watcher on the project root and the dependency directory clears the
//! resolver's memo table when dependencies are installed or removed.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use miette::{IntoDiagnostic, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use vitelet_core::{load_config_file, DevConfig, DevServer, ModuleRequest};

/// Files whose change may alter how bare specifiers resolve.
const RESOLUTION_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
];

/// Dev server action.
#[derive(Debug, Clone, Default)]
pub struct DevAction {
    /// Project root.
    pub cwd: PathBuf,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Host to bind to.
    pub host: Option<String>,
    /// Entry document, relative to the root.
    pub entry: Option<String>,
    /// Manifest field naming a package's module entry.
    pub entry_field: Option<String>,
    /// Re-read manifests on every resolution.
    pub no_resolve_cache: bool,
    /// Config file (overrides `vitelet.json` discovery).
    pub config: Option<PathBuf>,
}

impl DevAction {
    /// Defaults, then the config file, then flags.
    pub fn dev_config(&self) -> Result<DevConfig> {
        let mut config = DevConfig::new(self.cwd.clone());

        if let Some((path, file)) =
            load_config_file(&self.cwd, self.config.as_deref()).into_diagnostic()?
        {
            debug!(path = %path.display(), "loaded config file");
            config = config.with_file(&file);
        }

        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        if let Some(entry) = &self.entry {
            config = config.with_entry(entry.clone());
        }
        if let Some(field) = &self.entry_field {
            config = config.with_entry_field(field.clone());
        }
        if self.no_resolve_cache {
            config = config.with_resolve_cache(false);
        }
        Ok(config)
    }
}

/// Run the dev server until Ctrl+C.
pub async fn run(action: DevAction) -> Result<()> {
    let config = action.dev_config()?;
    let server = Arc::new(DevServer::new(config.clone()));

    // Dependency watcher
    let (change_tx, mut change_rx) = mpsc::channel::<Vec<PathBuf>>(16);
    let watch_root = config.root.clone();
    let watch_deps = config.deps_path();
    std::thread::spawn(move || {
        if let Err(e) = watch_dependencies(&watch_root, &watch_deps, &change_tx) {
            warn!("dependency watcher stopped: {e}");
        }
    });

    let reload_server = Arc::clone(&server);
    tokio::spawn(async move {
        while let Some(changed) = change_rx.recv().await {
            let dropped = reload_server.resolver().cached_len();
            reload_server.reload();
            info!(?changed, dropped, "dependencies changed, resolutions cleared");
        }
    });

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .into_diagnostic()?;
    let addr = listener.local_addr().into_diagnostic()?;
    info!(%addr, root = %config.root.display(), "dev server listening");

    println!();
    println!("  vitelet dev server running at http://{addr}");
    println!("  Entry: {}", config.entry_path());
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .into_diagnostic()?;

    Ok(())
}

/// HTTP routes: every GET goes through [`DevServer::handle`].
pub fn router(server: Arc<DevServer>) -> Router {
    Router::new()
        .route("/", get(serve_module))
        .route("/*path", get(serve_module))
        .with_state(server)
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn serve_module(State(server): State<Arc<DevServer>>, uri: Uri) -> Response {
    let request = ModuleRequest::from_raw(uri.path(), uri.query());

    match server.handle(&request) {
        Ok(module) => {
            debug!(
                path = %request.path,
                kind = module.kind.as_str(),
                status = 200,
                "served module"
            );
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, module.content_type)
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from(module.body))
                .unwrap_or_else(|_| not_found())
        }
        Err(err) => {
            error!(code = err.code(), path = %request.path, "{err}");
            not_found()
        }
    }
}

/// 404 with an empty body.
fn not_found() -> Response {
    (StatusCode::NOT_FOUND, [(header::CACHE_CONTROL, "no-cache")]).into_response()
}

// ============================================================================
// Dependency watching
// ============================================================================

/// Watch the root and dependency directory (non-recursively) and forward
/// changes that can affect resolution.
fn watch_dependencies(
    root: &Path,
    deps: &Path,
    change_tx: &mpsc::Sender<Vec<PathBuf>>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default()).into_diagnostic()?;
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .into_diagnostic()?;
    if deps.is_dir() {
        watcher
            .watch(deps, RecursiveMode::NonRecursive)
            .into_diagnostic()?;
    }

    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                let changed: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| affects_resolution(p, deps))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                if change_tx.blocking_send(changed).is_err() {
                    break;
                }
            }
            Ok(Err(e)) => warn!("watch error: {e}"),
            Err(_) => break,
        }
    }

    Ok(())
}

/// A manifest or lockfile, the dependency directory itself, or a package
/// directory directly inside it.
fn affects_resolution(path: &Path, deps: &Path) -> bool {
    if path == deps || path.parent() == Some(deps) {
        return true;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| RESOLUTION_FILES.contains(&name))
}
