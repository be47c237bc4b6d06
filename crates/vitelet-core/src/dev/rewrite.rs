//! Import rewriting for unbundled dev serving.
//!
//! Scans module source for static import/export statements and rewrites
//! bare specifiers to loader-fetchable paths:
//! - `import { ref } from "vue"` → `import { ref } from "/node_modules/vue/dist/vue.js"`
//! - `export * from "pkg/sub.js"` → `export * from "/node_modules/pkg/sub.js"`
//! - `import "side-effect"` → `import "/node_modules/side-effect/index.js"`
//!
//! Relative (`./`, `../`), absolute (`/`) and URL specifiers are left as they
//! are. Matching is anchored to statement starts (line start or after `;`),
//! so `from "x"` inside an ordinary expression is not touched. The quote
//! style of each literal is kept.

use crate::dev::resolve::{is_bare_specifier, SpecifierResolver};
use crate::error::DevError;
use regex_lite::{Captures, Regex};

/// `import … from "x"` / `export … from "x"`, possibly spanning lines.
const FROM_STATEMENT: &str =
    r#"(?m)(?:^|;)\s*(?:import|export)\b[^'";()=]*?\bfrom\s*(?:"([^"\n]*)"|'([^'\n]*)')"#;

/// `import "x"` with no bindings.
const SIDE_EFFECT_IMPORT: &str = r#"(?m)(?:^|;)\s*import\s*(?:"([^"\n]*)"|'([^'\n]*)')"#;

/// Import rewriter for dev server module serving.
pub struct ImportRewriter {
    from_statement: Option<Regex>,
    side_effect_import: Option<Regex>,
}

impl Default for ImportRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportRewriter {
    /// Create a new import rewriter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            from_statement: Regex::new(FROM_STATEMENT).ok(),
            side_effect_import: Regex::new(SIDE_EFFECT_IMPORT).ok(),
        }
    }

    /// Rewrite bare specifiers in `code` through `resolver`.
    ///
    /// The first resolution failure aborts the rewrite.
    pub fn rewrite(&self, code: &str, resolver: &SpecifierResolver) -> Result<String, DevError> {
        self.rewrite_with(code, |specifier| {
            resolver.resolve(specifier).map(|resolved| resolved.url)
        })
    }

    /// Rewrite bare specifiers in `code` with a custom resolution function.
    pub fn rewrite_with<F>(&self, code: &str, mut resolve: F) -> Result<String, DevError>
    where
        F: FnMut(&str) -> Result<String, DevError>,
    {
        let mut code = code.to_string();
        for re in [&self.from_statement, &self.side_effect_import]
            .into_iter()
            .flatten()
        {
            code = replace_specifiers(re, &code, &mut resolve)?;
        }
        Ok(code)
    }
}

/// Replace the specifier literal of every match of `re`.
///
/// Group 1 holds a double-quoted specifier, group 2 a single-quoted one.
fn replace_specifiers<F>(re: &Regex, code: &str, resolve: &mut F) -> Result<String, DevError>
where
    F: FnMut(&str) -> Result<String, DevError>,
{
    let mut result = String::with_capacity(code.len());
    let mut last = 0;

    for caps in re.captures_iter(code) {
        let Some(specifier) = specifier_group(&caps) else {
            continue;
        };
        if !is_bare_specifier(specifier.as_str()) {
            continue;
        }
        let rewritten = resolve(specifier.as_str())?;
        result.push_str(&code[last..specifier.start()]);
        result.push_str(&rewritten);
        last = specifier.end();
    }

    result.push_str(&code[last..]);
    Ok(result)
}

fn specifier_group<'h>(caps: &Captures<'h>) -> Option<regex_lite::Match<'h>> {
    caps.get(1).or_else(|| caps.get(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(code: &str) -> String {
        ImportRewriter::new()
            .rewrite_with(code, |spec| Ok(format!("/node_modules/{spec}/index.js")))
            .unwrap()
    }

    #[test]
    fn test_rewrite_bare_specifier() {
        assert_eq!(
            rewrite("import { ref } from \"vue\";\nconsole.log(ref)\n"),
            "import { ref } from \"/node_modules/vue/index.js\";\nconsole.log(ref)\n"
        );
    }

    #[test]
    fn test_rewrite_keeps_quote_style() {
        assert_eq!(
            rewrite("import Vue from 'vue'"),
            "import Vue from '/node_modules/vue/index.js'"
        );
    }

    #[test]
    fn test_rewrite_export_from() {
        assert_eq!(
            rewrite("export { a, b } from \"lib\"\nexport * from 'other'"),
            "export { a, b } from \"/node_modules/lib/index.js\"\nexport * from '/node_modules/other/index.js'"
        );
    }

    #[test]
    fn test_rewrite_multiline_import() {
        let code = "import {\n  ref,\n  computed,\n} from \"vue\"\n";
        assert_eq!(
            rewrite(code),
            "import {\n  ref,\n  computed,\n} from \"/node_modules/vue/index.js\"\n"
        );
    }

    #[test]
    fn test_rewrite_side_effect_import() {
        assert_eq!(
            rewrite("import 'polyfill'\nimport \"./local.js\""),
            "import '/node_modules/polyfill/index.js'\nimport \"./local.js\""
        );
    }

    #[test]
    fn test_rewrite_after_semicolon() {
        assert_eq!(
            rewrite("import a from \"a\"; import b from \"b\""),
            "import a from \"/node_modules/a/index.js\"; import b from \"/node_modules/b/index.js\""
        );
    }

    #[test]
    fn test_relative_and_absolute_untouched() {
        let code = "import App from './App.vue'\nimport u from \"../u.js\"\nimport x from \"/x.js\"\nimport y from \"https://esm.sh/y\"\n";
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn test_dot_prefixed_specifiers_untouched() {
        for code in [
            "import x from \".hidden\"",
            "import cfg from '.config/app.js'",
            "import \".env.local\"",
        ] {
            assert_eq!(rewrite(code), code);
        }
    }

    #[test]
    fn test_from_inside_expression_untouched() {
        let code = "const msg = greet(\"hi\", from \"x\")\nconst s = 'import a from \"vue\"'\n";
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn test_commented_import_untouched() {
        let code = "// import x from \"vue\"\n";
        assert_eq!(rewrite(code), code);
    }

    #[test]
    fn test_rewrite_error_propagates() {
        let err = ImportRewriter::new()
            .rewrite_with("import x from \"missing\"", |spec| {
                Err(DevError::ManifestNotFound {
                    package: spec.to_string(),
                    path: "node_modules/missing/package.json".into(),
                })
            })
            .unwrap_err();
        assert_eq!(err.code(), "DEV_MANIFEST_NOT_FOUND");
    }
}
