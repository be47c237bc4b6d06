//! Template compilation: markup in, render function out.

mod ast;
mod codegen;
mod expr;
mod parser;

pub use ast::{Attribute, Directive, Element, ElementKind, Interpolation, Node, Prop, Text};
pub use codegen::{js_string, CodegenResult, CompileOptions, TemplateMode, RUNTIME_MODULE};
pub use parser::{is_native_tag, parse_template};

use crate::error::CompileError;

/// Compile template markup into a render function.
///
/// # Errors
///
/// Returns a [`CompileError`] when the markup is malformed or uses a
/// directive the compiler does not support.
pub fn compile_template(
    source: &str,
    options: CompileOptions,
) -> Result<CodegenResult, CompileError> {
    let nodes = parse_template(source)?;
    codegen::generate(&nodes, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_template_module() {
        let result = compile_template("<div>{{ msg }}</div>", CompileOptions::default()).unwrap();
        assert!(result.code.starts_with("import {"));
        assert!(result.code.contains("from \"vue\""));
        assert!(result.code.contains("export function render(_ctx, _cache)"));
        assert!(result
            .code
            .contains("_createVNode(\"div\", null, _toDisplayString(_ctx.msg))"));
    }

    #[test]
    fn test_compile_template_reports_parse_errors() {
        let err = compile_template("<div><span></div>", CompileOptions::default()).unwrap_err();
        assert!(err.to_string().contains(" at "));
    }
}
