//! Single-file component splitting.
//!
//! A `.vue` file is served as two virtual modules on the same path:
//!
//! - **Main** (`/App.vue`): the component's script, with the render
//!   function imported from the template module and attached to the
//!   exported options object.
//! - **Template** (`/App.vue?type=template`): the compiled render function.
//!
//! The main module imports the template module with a freshness token
//! (`&d=<token>`) so the browser never reuses a stale render function.
//! Import rewriting of both modules is left to the caller.

use crate::error::DevError;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex_lite::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use vitelet_sfc::{CompileError, CompileOptions, ParseError, SfcDescriptor, TemplateMode};

/// Binding the component options object is held in.
pub const MAIN_BINDING: &str = "_sfc_main";

/// Local name of the imported render function.
pub const RENDER_BINDING: &str = "_sfc_render";

/// Characters escaped when a request path is written back into an import.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// First `export default` at a statement start.
const EXPORT_DEFAULT: &str = r"(?m)(?:^|;)[ \t]*(export\s+default)\b";

/// Component parsing and template compilation backend.
pub trait SfcCompiler: Send + Sync {
    /// Split component source into its blocks.
    fn parse(&self, source: &str) -> Result<SfcDescriptor, ParseError>;

    /// Compile template markup into render function code.
    fn compile_template(&self, markup: &str, mode: TemplateMode) -> Result<String, CompileError>;
}

/// The compiler backed by `vitelet-sfc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCompiler;

impl SfcCompiler for BuiltinCompiler {
    fn parse(&self, source: &str) -> Result<SfcDescriptor, ParseError> {
        vitelet_sfc::parse(source)
    }

    fn compile_template(&self, markup: &str, mode: TemplateMode) -> Result<String, CompileError> {
        vitelet_sfc::compile_template(markup, CompileOptions { mode }).map(|result| result.code)
    }
}

/// Source of freshness tokens.
///
/// Tokens are millisecond wall-clock values, bumped past the previous token
/// when the clock has not advanced, so every token is unique and tokens
/// increase within a process.
#[derive(Debug, Default)]
pub struct FreshnessClock {
    last: AtomicU64,
}

impl FreshnessClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next token.
    pub fn next_token(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev.saturating_add(1)))
            }) {
            Ok(prev) | Err(prev) => now.max(prev.saturating_add(1)),
        }
    }
}

/// Synthesizes the main and template modules of a component.
pub struct ComponentSplitter<C = BuiltinCompiler> {
    compiler: C,
    clock: FreshnessClock,
    export_default: Option<Regex>,
}

impl ComponentSplitter {
    /// Splitter using the built-in compiler.
    #[must_use]
    pub fn new() -> Self {
        Self::with_compiler(BuiltinCompiler)
    }
}

impl Default for ComponentSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SfcCompiler> ComponentSplitter<C> {
    /// Splitter using a custom compiler.
    pub fn with_compiler(compiler: C) -> Self {
        Self {
            compiler,
            clock: FreshnessClock::new(),
            export_default: Regex::new(EXPORT_DEFAULT).ok(),
        }
    }

    /// Parse a component. A file with neither a script nor a template is a
    /// parse failure.
    pub fn descriptor(&self, path: &str, source: &str) -> Result<SfcDescriptor, DevError> {
        let descriptor = self.compiler.parse(source).map_err(|err| {
            let (line, col) = vitelet_sfc::line_col(source, err.span.start);
            DevError::ParseFailure {
                path: path.to_string(),
                message: format!("{} ({line}:{col})", err.message),
            }
        })?;
        if descriptor.is_empty() {
            return Err(DevError::ParseFailure {
                path: path.to_string(),
                message: "component has no <script> or <template> block".to_string(),
            });
        }
        Ok(descriptor)
    }

    /// The main module for the component at URL `path`.
    pub fn main_module(&self, path: &str, source: &str) -> Result<String, DevError> {
        let descriptor = self.descriptor(path, source)?;
        let token = self.clock.next_token();
        let template_url = format!(
            "{}?type=template&d={token}",
            utf8_percent_encode(path, PATH_ENCODE_SET)
        );

        let mut code = format!("import {{ render as {RENDER_BINDING} }} from \"{template_url}\"\n");
        match &descriptor.script {
            Some(script) => code.push_str(&self.bind_default_export(&script.content)),
            None => {
                code.push_str(&format!("const {MAIN_BINDING} = {{}}"));
            }
        }
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&format!("{MAIN_BINDING}.render = {RENDER_BINDING}\n"));
        code.push_str(&format!("export default {MAIN_BINDING}\n"));
        Ok(code)
    }

    /// The template module for the component at URL `path`.
    pub fn template_module(&self, path: &str, source: &str) -> Result<String, DevError> {
        let descriptor = self.descriptor(path, source)?;
        let template = descriptor
            .template
            .filter(|t| !t.content.trim().is_empty())
            .ok_or_else(|| DevError::CompileFailure {
                path: path.to_string(),
                message: "component has no template".to_string(),
            })?;

        self.compiler
            .compile_template(&template.content, TemplateMode::Module)
            .map_err(|err| {
                let (line, col) =
                    vitelet_sfc::line_col(source, template.span.start + err.span.start);
                DevError::CompileFailure {
                    path: path.to_string(),
                    message: format!("{} ({line}:{col})", err.message),
                }
            })
    }

    /// Rewrite the first `export default` of a script into the options
    /// binding, or append an empty binding when there is none.
    fn bind_default_export(&self, script: &str) -> String {
        let found = self
            .export_default
            .as_ref()
            .and_then(|re| re.captures(script))
            .and_then(|caps| caps.get(1));
        match found {
            Some(m) => format!(
                "{}const {MAIN_BINDING} ={}",
                &script[..m.start()],
                &script[m.end()..]
            ),
            None => {
                let mut code = script.to_string();
                if !code.is_empty() && !code.ends_with('\n') {
                    code.push('\n');
                }
                code.push_str(&format!("const {MAIN_BINDING} = {{}}"));
                code
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = "<template>\n  <div/>\n</template>\n\n<script>\nexport default {\n  data() {\n    return {}\n  }\n}\n</script>\n";

    fn token_of(main: &str) -> u64 {
        let start = main.find("&d=").unwrap() + 3;
        let end = main[start..].find('"').unwrap() + start;
        main[start..end].parse().unwrap()
    }

    #[test]
    fn test_main_module_shape() {
        let splitter = ComponentSplitter::new();
        let main = splitter.main_module("/App.vue", APP).unwrap();
        assert!(main.starts_with(
            "import { render as _sfc_render } from \"/App.vue?type=template&d="
        ));
        assert!(main.contains("const _sfc_main = {\n  data() {"));
        assert!(!main.contains("export default {"));
        assert!(main.ends_with("_sfc_main.render = _sfc_render\nexport default _sfc_main\n"));
    }

    #[test]
    fn test_main_module_token_changes() {
        let splitter = ComponentSplitter::new();
        let first = token_of(&splitter.main_module("/App.vue", APP).unwrap());
        let second = token_of(&splitter.main_module("/App.vue", APP).unwrap());
        assert!(second > first);
    }

    #[test]
    fn test_main_module_encodes_path() {
        let splitter = ComponentSplitter::new();
        let main = splitter.main_module("/src/My App.vue", APP).unwrap();
        assert!(main.contains("from \"/src/My%20App.vue?type=template&d="));
    }

    #[test]
    fn test_main_module_without_script() {
        let splitter = ComponentSplitter::new();
        let main = splitter
            .main_module("/Hello.vue", "<template><p>hi</p></template>")
            .unwrap();
        let body: Vec<&str> = main.lines().skip(1).collect();
        assert_eq!(
            body,
            vec![
                "const _sfc_main = {}",
                "_sfc_main.render = _sfc_render",
                "export default _sfc_main",
            ]
        );
    }

    #[test]
    fn test_main_module_script_without_default_export() {
        let splitter = ComponentSplitter::new();
        let source = "<template><p/></template><script>\nconsole.log('loaded')\n</script>";
        let main = splitter.main_module("/A.vue", source).unwrap();
        assert!(main.contains("console.log('loaded')\nconst _sfc_main = {}\n"));
    }

    #[test]
    fn test_only_first_export_default_rewritten() {
        let splitter = ComponentSplitter::new();
        let script = "const note = 'export default is a keyword pair'\nexport default { name: 'A' }\n";
        let out = splitter.bind_default_export(script);
        assert_eq!(
            out,
            "const note = 'export default is a keyword pair'\nconst _sfc_main = { name: 'A' }\n"
        );
    }

    #[test]
    fn test_template_module() {
        let splitter = ComponentSplitter::new();
        let code = splitter.template_module("/App.vue", APP).unwrap();
        assert!(code.contains("from \"vue\""));
        assert!(code.contains("export function render(_ctx, _cache)"));
        assert!(code.contains("_createVNode(\"div\")"));
    }

    #[test]
    fn test_template_module_missing_template() {
        let splitter = ComponentSplitter::new();
        let err = splitter
            .template_module("/Logic.vue", "<script>export default {}</script>")
            .unwrap_err();
        assert_eq!(err.code(), "DEV_COMPILE_FAILURE");
    }

    #[test]
    fn test_template_module_blank_template() {
        let splitter = ComponentSplitter::new();
        let err = splitter
            .template_module("/Blank.vue", "<template>\n  \n</template>")
            .unwrap_err();
        assert!(matches!(err, DevError::CompileFailure { .. }));
    }

    #[test]
    fn test_template_compile_error_has_location() {
        let splitter = ComponentSplitter::new();
        let err = splitter
            .template_module("/Bad.vue", "<template>\n  <input v-model=\"x\">\n</template>")
            .unwrap_err();
        let DevError::CompileFailure { message, .. } = err else {
            panic!("expected compile failure");
        };
        assert!(message.contains("v-model"));
        assert!(message.contains("(2:"));
    }

    #[test]
    fn test_parse_failure() {
        let splitter = ComponentSplitter::new();
        let err = splitter
            .main_module("/Broken.vue", "<template><div></div>")
            .unwrap_err();
        assert_eq!(err.code(), "DEV_PARSE_FAILURE");
    }

    #[test]
    fn test_empty_component_is_parse_failure() {
        let splitter = ComponentSplitter::new();
        let err = splitter.main_module("/Empty.vue", "<style>p{}</style>").unwrap_err();
        assert!(matches!(err, DevError::ParseFailure { .. }));
    }

    struct FailingCompiler;

    impl SfcCompiler for FailingCompiler {
        fn parse(&self, source: &str) -> Result<SfcDescriptor, ParseError> {
            vitelet_sfc::parse(source)
        }

        fn compile_template(
            &self,
            _markup: &str,
            _mode: TemplateMode,
        ) -> Result<String, CompileError> {
            Err(CompileError::new("backend unavailable", vitelet_sfc::Span::default()))
        }
    }

    #[test]
    fn test_custom_compiler() {
        let splitter = ComponentSplitter::with_compiler(FailingCompiler);
        assert!(splitter.main_module("/App.vue", APP).is_ok());
        let err = splitter.template_module("/App.vue", APP).unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn test_freshness_clock_unique() {
        let clock = FreshnessClock::new();
        let tokens: Vec<u64> = (0..100).map(|_| clock.next_token()).collect();
        assert!(tokens.windows(2).all(|w| w[1] > w[0]));
    }
}
