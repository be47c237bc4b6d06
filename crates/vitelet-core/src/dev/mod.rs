//! Unbundled on-demand module serving.
//!
//! Each request runs the whole pipeline: locate the file under the root,
//! split components into virtual modules, rewrite bare imports to paths
//! under the dependency mount.

pub mod component;
pub mod request;
pub mod resolve;
pub mod rewrite;
pub mod server;

pub use component::{BuiltinCompiler, ComponentSplitter, FreshnessClock, SfcCompiler};
pub use request::{ModuleRequest, VirtualModuleVariant};
pub use resolve::{is_bare_specifier, split_specifier, ResolvedSpecifier, SpecifierResolver};
pub use rewrite::ImportRewriter;
pub use server::{DevServer, ModuleKind, ServedModule, HTML_CONTENT_TYPE, JS_CONTENT_TYPE};
