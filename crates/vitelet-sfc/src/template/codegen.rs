//! Render function generation.
//!
//! Turns a template [`Node`] tree into JavaScript that builds virtual nodes
//! through the framework runtime (`createVNode`, `toDisplayString`, ...).
//! Every vnode is created with `createVNode` and no patch flags, so the
//! runtime always performs a full diff; there is no block-tree optimisation.

use super::ast::{Directive, Element, ElementKind, Node, Prop};
use super::expr::{binding_names, is_function_expression, is_member_path, prefix_identifiers};
use crate::error::CompileError;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Module the runtime helpers are imported from.
pub const RUNTIME_MODULE: &str = "vue";

/// Shape of the generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateMode {
    /// An ES module: `import { ... } from "vue"` + `export function render`.
    #[default]
    Module,
    /// A function body: destructures helpers from a global `Vue` and
    /// `return`s the render function.
    Function,
}

/// Template compiler options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub mode: TemplateMode,
}

/// Output of the template compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenResult {
    /// Generated JavaScript.
    pub code: String,
    /// Runtime helpers the code uses, without the `_` alias prefix.
    pub helpers: Vec<&'static str>,
    /// Component names resolved at render time.
    pub components: Vec<String>,
}

/// Runtime helpers, in import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Helper {
    Fragment,
    ResolveComponent,
    ResolveDynamicComponent,
    RenderList,
    RenderSlot,
    WithCtx,
    ToDisplayString,
    MergeProps,
    NormalizeClass,
    NormalizeStyle,
    WithModifiers,
    WithKeys,
    CreateTextVNode,
    CreateCommentVNode,
    CreateVNode,
}

impl Helper {
    fn name(self) -> &'static str {
        match self {
            Self::Fragment => "Fragment",
            Self::ResolveComponent => "resolveComponent",
            Self::ResolveDynamicComponent => "resolveDynamicComponent",
            Self::RenderList => "renderList",
            Self::RenderSlot => "renderSlot",
            Self::WithCtx => "withCtx",
            Self::ToDisplayString => "toDisplayString",
            Self::MergeProps => "mergeProps",
            Self::NormalizeClass => "normalizeClass",
            Self::NormalizeStyle => "normalizeStyle",
            Self::WithModifiers => "withModifiers",
            Self::WithKeys => "withKeys",
            Self::CreateTextVNode => "createTextVNode",
            Self::CreateCommentVNode => "createCommentVNode",
            Self::CreateVNode => "createVNode",
        }
    }
}

/// Modifiers handled by `withModifiers` (event guards).
const GUARD_MODIFIERS: &[&str] = &[
    "stop", "prevent", "self", "ctrl", "shift", "alt", "meta", "exact", "left", "middle", "right",
];

/// Modifiers that become part of the listener name (`onClickOnce`).
const OPTION_MODIFIERS: &[&str] = &["once", "capture", "passive"];

type Scope = FxHashSet<String>;

/// Generate render code for parsed template nodes.
pub fn generate(nodes: &[Node], options: CompileOptions) -> Result<CodegenResult, CompileError> {
    let mut codegen = Codegen::default();
    let scope = Scope::default();

    let mut roots = codegen.children(nodes, &scope, 1)?;
    let root = match roots.len() {
        0 => "null".to_string(),
        1 => roots.remove(0),
        _ => {
            let fragment = codegen.helper(Helper::Fragment);
            let create = codegen.helper(Helper::CreateVNode);
            format!("{create}({fragment}, null, {})", array(roots, 1))
        }
    };

    let mut body = String::new();
    for component in &codegen.components {
        let _ = writeln!(
            body,
            "  const {} = _{}({})",
            component_var(component),
            Helper::ResolveComponent.name(),
            js_string(component)
        );
    }
    if !codegen.components.is_empty() {
        body.push('\n');
    }
    let _ = writeln!(body, "  return {root}");

    let helpers: Vec<&'static str> = codegen.helpers.iter().map(|h| h.name()).collect();
    let code = match options.mode {
        TemplateMode::Module => {
            let mut code = String::new();
            if !helpers.is_empty() {
                let imports: Vec<String> = helpers.iter().map(|h| format!("{h} as _{h}")).collect();
                let _ = writeln!(
                    code,
                    "import {{ {} }} from {}\n",
                    imports.join(", "),
                    js_string(RUNTIME_MODULE)
                );
            }
            let _ = write!(code, "export function render(_ctx, _cache) {{\n{body}}}\n");
            code
        }
        TemplateMode::Function => {
            let mut code = String::new();
            if !helpers.is_empty() {
                let bindings: Vec<String> = helpers.iter().map(|h| format!("{h}: _{h}")).collect();
                let _ = writeln!(code, "const {{ {} }} = Vue\n", bindings.join(", "));
            }
            let _ = write!(code, "return function render(_ctx, _cache) {{\n{body}}}\n");
            code
        }
    };

    Ok(CodegenResult {
        code,
        helpers,
        components: codegen.components,
    })
}

#[derive(Default)]
struct Codegen {
    helpers: BTreeSet<Helper>,
    components: Vec<String>,
}

impl Codegen {
    fn helper(&mut self, helper: Helper) -> String {
        self.helpers.insert(helper);
        format!("_{}", helper.name())
    }

    fn component(&mut self, tag: &str) -> String {
        self.helpers.insert(Helper::ResolveComponent);
        if !self.components.iter().any(|c| c == tag) {
            self.components.push(tag.to_string());
        }
        component_var(tag)
    }

    /// Generate a list of child vnode expressions, folding `v-if` chains and
    /// merging adjacent text into one text vnode.
    fn children(
        &mut self,
        nodes: &[Node],
        scope: &Scope,
        depth: usize,
    ) -> Result<Vec<String>, CompileError> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < nodes.len() {
            match &nodes[i] {
                Node::Element(el) if el.directive("if").is_some() => {
                    let mut branches = vec![el];
                    let mut next = i + 1;
                    loop {
                        let mut k = next;
                        while k < nodes.len() && nodes[k].is_whitespace() {
                            k += 1;
                        }
                        match nodes.get(k) {
                            Some(Node::Element(sibling)) if sibling.directive("else-if").is_some() => {
                                branches.push(sibling);
                                next = k + 1;
                            }
                            Some(Node::Element(sibling)) if sibling.directive("else").is_some() => {
                                branches.push(sibling);
                                next = k + 1;
                                break;
                            }
                            _ => break,
                        }
                    }
                    out.push(self.if_chain(&branches, scope, depth)?);
                    i = next;
                }
                Node::Element(el)
                    if el.directive("else-if").is_some() || el.directive("else").is_some() =>
                {
                    return Err(CompileError::new(
                        "v-else/v-else-if has no adjacent v-if or v-else-if",
                        el.span,
                    ));
                }
                Node::Element(el) => {
                    out.push(self.element(el, scope, depth)?);
                    i += 1;
                }
                Node::Text(_) | Node::Interpolation(_) => {
                    let start = i;
                    while i < nodes.len() && !matches!(nodes[i], Node::Element(_)) {
                        i += 1;
                    }
                    let text = self.text(&nodes[start..i], scope);
                    let create = self.helper(Helper::CreateTextVNode);
                    out.push(format!("{create}({text})"));
                }
            }
        }

        Ok(out)
    }

    /// Concatenate text and interpolation nodes into one string expression.
    fn text(&mut self, nodes: &[Node], scope: &Scope) -> String {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(text) => parts.push(js_string(&text.content)),
                Node::Interpolation(interp) => {
                    let display = self.helper(Helper::ToDisplayString);
                    parts.push(format!(
                        "{display}({})",
                        prefix_identifiers(&interp.expression, scope)
                    ));
                }
                Node::Element(_) => {}
            }
        }
        parts.join(" + ")
    }

    fn if_chain(
        &mut self,
        branches: &[&Element],
        scope: &Scope,
        depth: usize,
    ) -> Result<String, CompileError> {
        let Some((last, rest)) = branches.split_last() else {
            return Ok("null".to_string());
        };

        let mut conditional = Vec::with_capacity(branches.len());
        let mut fallback = if last.directive("else").is_some() {
            self.element(last, scope, depth + 1)?
        } else {
            conditional.push(*last);
            let comment = self.helper(Helper::CreateCommentVNode);
            format!("{comment}(\"v-if\", true)")
        };
        conditional.splice(0..0, rest.iter().copied());

        let pad = indent(depth + 1);
        for branch in conditional.iter().rev() {
            let dir = branch
                .directive("if")
                .or_else(|| branch.directive("else-if"))
                .ok_or_else(|| CompileError::new("Unexpected branch in v-if chain", branch.span))?;
            let Some(exp) = &dir.exp else {
                return Err(CompileError::new(
                    format!("v-{} is missing expression", dir.name),
                    dir.span,
                ));
            };
            let vnode = self.element(branch, scope, depth + 1)?;
            fallback = format!(
                "({})\n{pad}? {vnode}\n{pad}: {fallback}",
                prefix_identifiers(exp, scope)
            );
        }
        Ok(fallback)
    }

    /// An element, including its `v-for` wrapper when present.
    fn element(&mut self, el: &Element, scope: &Scope, depth: usize) -> Result<String, CompileError> {
        reject_dynamic_arguments(el)?;
        let Some(dir) = el.directive("for") else {
            return self.plain_element(el, scope, depth);
        };

        let exp = dir
            .exp
            .as_deref()
            .ok_or_else(|| CompileError::new("v-for is missing expression", dir.span))?;
        let (alias, source) = split_for_expression(exp)
            .ok_or_else(|| CompileError::new(format!("v-for has invalid expression: {exp}"), dir.span))?;

        let params = alias
            .strip_prefix('(')
            .and_then(|a| a.strip_suffix(')'))
            .unwrap_or(alias)
            .trim();
        let mut inner_scope = scope.clone();
        inner_scope.extend(binding_names(params));

        let item = self.plain_element(el, &inner_scope, depth + 1)?;
        let fragment = self.helper(Helper::Fragment);
        let render_list = self.helper(Helper::RenderList);
        let create = self.helper(Helper::CreateVNode);
        Ok(format!(
            "{create}({fragment}, null, {render_list}({}, ({params}) => {{\n{}return {item}\n{}}}))",
            prefix_identifiers(source, scope),
            indent(depth + 1),
            indent(depth)
        ))
    }

    fn plain_element(
        &mut self,
        el: &Element,
        scope: &Scope,
        depth: usize,
    ) -> Result<String, CompileError> {
        match el.kind {
            ElementKind::Template => {
                let children = self.children(&el.children, scope, depth)?;
                let fragment = self.helper(Helper::Fragment);
                let create = self.helper(Helper::CreateVNode);
                Ok(format!("{create}({fragment}, null, {})", array(children, depth)))
            }
            ElementKind::Slot => self.slot_outlet(el, scope, depth),
            ElementKind::Component => {
                let tag = if el.tag == "component" {
                    let is = el
                        .props
                        .iter()
                        .find_map(|prop| match prop {
                            Prop::Directive(d) if d.name == "bind" && d.arg.as_deref() == Some("is") => {
                                d.exp.as_deref().map(|exp| prefix_identifiers(exp, scope))
                            }
                            Prop::Attribute(a) if a.name == "is" => {
                                Some(js_string(a.value.as_deref().unwrap_or_default()))
                            }
                            _ => None,
                        })
                        .ok_or_else(|| CompileError::new("<component> is missing is", el.span))?;
                    let resolve = self.helper(Helper::ResolveDynamicComponent);
                    format!("{resolve}({is})")
                } else {
                    self.component(&el.tag)
                };
                let props = self.props(el, scope, depth, &["is"])?;
                let slots = self.slots(el, scope, depth)?;
                let create = self.helper(Helper::CreateVNode);
                Ok(call(&create, tag, props, slots))
            }
            ElementKind::Element => {
                let props = self.props(el, scope, depth, &[])?;
                let children = if let Some(dir) = el.directive("text") {
                    let exp = dir
                        .exp
                        .as_deref()
                        .ok_or_else(|| CompileError::new("v-text is missing expression", dir.span))?;
                    let display = self.helper(Helper::ToDisplayString);
                    Some(format!("{display}({})", prefix_identifiers(exp, scope)))
                } else if el.directive("html").is_some() || el.children.is_empty() {
                    None
                } else if el.children.iter().all(|c| !matches!(c, Node::Element(_))) {
                    Some(self.text(&el.children, scope))
                } else {
                    Some(array(self.children(&el.children, scope, depth)?, depth))
                };
                let create = self.helper(Helper::CreateVNode);
                Ok(call(&create, js_string(&el.tag), props, children))
            }
        }
    }

    /// `<slot name="x" :item="item">fallback</slot>`.
    fn slot_outlet(&mut self, el: &Element, scope: &Scope, depth: usize) -> Result<String, CompileError> {
        let name = el
            .props
            .iter()
            .find_map(|prop| match prop {
                Prop::Attribute(a) if a.name == "name" => {
                    Some(js_string(a.value.as_deref().unwrap_or("default")))
                }
                Prop::Directive(d) if d.name == "bind" && d.arg.as_deref() == Some("name") => {
                    d.exp.as_deref().map(|exp| prefix_identifiers(exp, scope))
                }
                _ => None,
            })
            .unwrap_or_else(|| js_string("default"));

        let props = self.props(el, scope, depth, &["name"])?;
        let fallback = if el.children.is_empty() {
            None
        } else {
            Some(format!("() => {}", array(self.children(&el.children, scope, depth)?, depth)))
        };

        let render_slot = self.helper(Helper::RenderSlot);
        let mut args = vec!["_ctx.$slots".to_string(), name];
        match (props, fallback) {
            (props, Some(fallback)) => {
                args.push(props.unwrap_or_else(|| "{}".to_string()));
                args.push(fallback);
            }
            (Some(props), None) => args.push(props),
            (None, None) => {}
        }
        Ok(format!("{render_slot}({})", args.join(", ")))
    }

    /// Slot functions for a component's children.
    fn slots(&mut self, el: &Element, scope: &Scope, depth: usize) -> Result<Option<String>, CompileError> {
        let own = el.directive("slot");
        let mut entries: Vec<String> = Vec::new();
        let mut default_children: Vec<Node> = Vec::new();

        for child in &el.children {
            match child {
                Node::Element(tpl) if own.is_none() && tpl.kind == ElementKind::Template => {
                    if let Some(dir) = tpl.directive("slot") {
                        reject_dynamic_arguments(tpl)?;
                        let name = dir.arg.clone().unwrap_or_else(|| "default".to_string());
                        entries.push(self.slot_fn(&name, dir, &tpl.children, scope, depth)?);
                        continue;
                    }
                    default_children.push(child.clone());
                }
                _ => default_children.push(child.clone()),
            }
        }

        if default_children.iter().any(|c| !c.is_whitespace()) {
            let entry = match own {
                Some(dir) => self.slot_fn("default", dir, &default_children, scope, depth)?,
                None => {
                    let children = self.children(&default_children, scope, depth + 1)?;
                    let with_ctx = self.helper(Helper::WithCtx);
                    format!("default: {with_ctx}(() => {})", array(children, depth + 1))
                }
            };
            entries.insert(0, entry);
        }

        if entries.is_empty() {
            return Ok(None);
        }
        entries.push("_: 1 /* STABLE */".to_string());
        Ok(Some(object(entries, depth)))
    }

    fn slot_fn(
        &mut self,
        name: &str,
        dir: &Directive,
        children: &[Node],
        scope: &Scope,
        depth: usize,
    ) -> Result<String, CompileError> {
        let params = dir.exp.as_deref().unwrap_or("").trim();
        let mut inner_scope = scope.clone();
        inner_scope.extend(binding_names(params));
        let children = self.children(children, &inner_scope, depth + 1)?;
        let with_ctx = self.helper(Helper::WithCtx);
        Ok(format!(
            "{}: {with_ctx}(({params}) => {})",
            object_key(name),
            array(children, depth + 1)
        ))
    }

    /// The props object of an element, or `None` when it has none.
    fn props(
        &mut self,
        el: &Element,
        scope: &Scope,
        depth: usize,
        skip: &[&str],
    ) -> Result<Option<String>, CompileError> {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut spreads: Vec<(usize, String)> = Vec::new();

        for prop in &el.props {
            match prop {
                Prop::Attribute(attr) => {
                    if skip.contains(&attr.name.as_str()) {
                        continue;
                    }
                    let value = js_string(attr.value.as_deref().unwrap_or_default());
                    self.push_prop(&mut entries, attr.name.clone(), value);
                }
                Prop::Directive(dir) => match dir.name.as_str() {
                    "bind" => match &dir.arg {
                        Some(arg) if skip.contains(&arg.as_str()) => {}
                        Some(arg) => {
                            let key = if dir.modifiers.iter().any(|m| m == "camel") {
                                camelize(arg)
                            } else {
                                arg.clone()
                            };
                            // `:id` is shorthand for `:id="id"`.
                            let exp = dir.exp.clone().unwrap_or_else(|| camelize(arg));
                            let value = prefix_identifiers(&exp, scope);
                            self.push_prop(&mut entries, key, value);
                        }
                        None => {
                            let exp = dir.exp.as_deref().ok_or_else(|| {
                                CompileError::new("v-bind is missing expression", dir.span)
                            })?;
                            spreads.push((entries.len(), prefix_identifiers(exp, scope)));
                        }
                    },
                    "on" => {
                        let Some(arg) = &dir.arg else {
                            return Err(CompileError::new(
                                "v-on without an event name is not supported",
                                dir.span,
                            ));
                        };
                        let (key, handler) = self.listener(arg, dir, scope);
                        entries.push((key, handler));
                    }
                    "html" => {
                        let exp = dir.exp.as_deref().ok_or_else(|| {
                            CompileError::new("v-html is missing expression", dir.span)
                        })?;
                        entries.push(("innerHTML".to_string(), prefix_identifiers(exp, scope)));
                    }
                    "if" | "else-if" | "else" | "for" | "slot" | "text" | "cloak" => {}
                    other => {
                        return Err(CompileError::new(
                            format!("Directive v-{other} is not supported"),
                            dir.span,
                        ));
                    }
                },
            }
        }

        if entries.is_empty() && spreads.is_empty() {
            return Ok(None);
        }

        let render_entries = |entries: &[(String, String)]| -> Vec<String> {
            entries
                .iter()
                .map(|(key, value)| format!("{}: {value}", object_key(key)))
                .collect()
        };

        if spreads.is_empty() {
            return Ok(Some(inline_object(&render_entries(&entries), depth)));
        }

        // `v-bind="obj"` merges in source order with the surrounding props.
        let merge = self.helper(Helper::MergeProps);
        let mut args = Vec::new();
        let mut cursor = 0;
        for (at, spread) in spreads {
            if at > cursor {
                args.push(inline_object(&render_entries(&entries[cursor..at]), depth));
            }
            args.push(spread);
            cursor = at;
        }
        if cursor < entries.len() {
            args.push(inline_object(&render_entries(&entries[cursor..]), depth));
        }
        Ok(Some(format!("{merge}({})", args.join(", "))))
    }

    /// Add a prop, merging repeated `class` / `style` the way the runtime would.
    fn push_prop(&mut self, entries: &mut Vec<(String, String)>, key: String, value: String) {
        let Some(index) = entries.iter().position(|(k, _)| *k == key) else {
            entries.push((key, value));
            return;
        };
        let normalize = match key.as_str() {
            "class" => Some(self.helper(Helper::NormalizeClass)),
            "style" => Some(self.helper(Helper::NormalizeStyle)),
            _ => None,
        };
        let existing = &mut entries[index].1;
        *existing = match normalize {
            Some(normalize) => format!("{normalize}([{existing}, {value}])"),
            None => value,
        };
    }

    /// Build `onEvent: handler` for `v-on:event.modifiers="exp"`.
    fn listener(&mut self, event: &str, dir: &Directive, scope: &Scope) -> (String, String) {
        let mut key = to_handler_key(event);
        let mut guards = Vec::new();
        let mut keys = Vec::new();
        for modifier in &dir.modifiers {
            if OPTION_MODIFIERS.contains(&modifier.as_str()) {
                key.push_str(&capitalize(modifier));
            } else if GUARD_MODIFIERS.contains(&modifier.as_str()) {
                guards.push(js_string(modifier));
            } else {
                keys.push(js_string(modifier));
            }
        }

        let mut handler = match dir.exp.as_deref().map(str::trim) {
            None | Some("") => "() => {}".to_string(),
            Some(exp) if is_member_path(exp) || is_function_expression(exp) => {
                prefix_identifiers(exp, scope)
            }
            Some(exp) => {
                let mut inner = scope.clone();
                inner.insert("$event".to_string());
                format!("$event => ({})", prefix_identifiers(exp, &inner))
            }
        };

        if !guards.is_empty() {
            let with_modifiers = self.helper(Helper::WithModifiers);
            handler = format!("{with_modifiers}({handler}, [{}])", guards.join(", "));
        }
        if !keys.is_empty() {
            let with_keys = self.helper(Helper::WithKeys);
            handler = format!("{with_keys}({handler}, [{}])", keys.join(", "));
        }
        (key, handler)
    }
}

/// Split `alias in source` / `alias of source`.
/// `:[key]`, `@[event]` and `#[name]` take their name at render time.
fn reject_dynamic_arguments(el: &Element) -> Result<(), CompileError> {
    for prop in &el.props {
        if let Prop::Directive(dir) = prop {
            if dir.arg.as_deref().is_some_and(|arg| arg.starts_with('[')) {
                return Err(CompileError::new(
                    format!("Dynamic argument on v-{} is not supported", dir.name),
                    dir.span,
                ));
            }
        }
    }
    Ok(())
}

fn split_for_expression(exp: &str) -> Option<(&str, &str)> {
    let at = [" in ", " of "]
        .iter()
        .filter_map(|sep| exp.find(sep))
        .min()?;
    let alias = exp[..at].trim();
    let source = exp[at + 4..].trim();
    if alias.is_empty() || source.is_empty() {
        return None;
    }
    Some((alias, source))
}

/// `createVNode(type, props, children)` with trailing nulls dropped.
fn call(create: &str, tag: String, props: Option<String>, children: Option<String>) -> String {
    match (props, children) {
        (None, None) => format!("{create}({tag})"),
        (Some(props), None) => format!("{create}({tag}, {props})"),
        (props, Some(children)) => format!(
            "{create}({tag}, {}, {children})",
            props.unwrap_or_else(|| "null".to_string())
        ),
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// A multi-line array literal whose closing bracket sits at `depth`.
fn array(items: Vec<String>, depth: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let pad = indent(depth + 1);
    let body: Vec<String> = items.into_iter().map(|item| format!("{pad}{item}")).collect();
    format!("[\n{}\n{}]", body.join(",\n"), indent(depth))
}

/// A multi-line object literal whose closing brace sits at `depth`.
fn object(entries: Vec<String>, depth: usize) -> String {
    let pad = indent(depth + 1);
    let body: Vec<String> = entries.into_iter().map(|e| format!("{pad}{e}")).collect();
    format!("{{\n{}\n{}}}", body.join(",\n"), indent(depth))
}

/// A one-line object literal, falling back to multi-line when long.
fn inline_object(entries: &[String], depth: usize) -> String {
    let line = format!("{{ {} }}", entries.join(", "));
    if line.len() <= 80 && !line.contains('\n') {
        line
    } else {
        object(entries.to_vec(), depth)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        js_string(key)
    }
}

/// `_component_my_button` for `my-button`.
fn component_var(tag: &str) -> String {
    let sanitized: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '$' { c } else { '_' })
        .collect();
    format!("_component_{sanitized}")
}

/// Double-quoted JavaScript string literal.
#[must_use]
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `my-event` → `myEvent`.
fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `click` → `onClick`, `update:modelValue` → `onUpdate:modelValue`.
fn to_handler_key(event: &str) -> String {
    format!("on{}", capitalize(&camelize(event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parser::parse_template;

    fn compile(markup: &str) -> CodegenResult {
        let nodes = parse_template(markup).unwrap();
        generate(&nodes, CompileOptions::default()).unwrap()
    }

    fn compile_err(markup: &str) -> CompileError {
        let nodes = parse_template(markup).unwrap();
        generate(&nodes, CompileOptions::default()).unwrap_err()
    }

    #[test]
    fn test_single_element() {
        let result = compile("<div/>");
        assert_eq!(
            result.code,
            "import { createVNode as _createVNode } from \"vue\"\n\n\
             export function render(_ctx, _cache) {\n  return _createVNode(\"div\")\n}\n"
        );
        assert_eq!(result.helpers, vec!["createVNode"]);
    }

    #[test]
    fn test_empty_template_returns_null() {
        let result = compile("");
        assert!(result.code.contains("return null"));
        assert!(!result.code.contains("import"));
    }

    #[test]
    fn test_static_attrs_and_text() {
        let result = compile(r#"<p class="intro" data-id="7">Hello</p>"#);
        assert!(result
            .code
            .contains(r#"_createVNode("p", { class: "intro", "data-id": "7" }, "Hello")"#));
    }

    #[test]
    fn test_interpolation() {
        let result = compile("<h1>Hi {{ name }}!</h1>");
        assert!(result
            .code
            .contains(r#"_createVNode("h1", null, "Hi " + _toDisplayString(_ctx.name) + "!")"#));
        assert!(result.helpers.contains(&"toDisplayString"));
    }

    #[test]
    fn test_mixed_children() {
        let result = compile("<div>count: {{ n }}<span>x</span></div>");
        assert!(result
            .code
            .contains(r#"_createTextVNode("count: " + _toDisplayString(_ctx.n))"#));
        assert!(result.code.contains(r#"_createVNode("span", null, "x")"#));
    }

    #[test]
    fn test_multiple_roots_use_fragment() {
        let result = compile("<a/><b/>");
        assert!(result.code.contains("_createVNode(_Fragment, null, ["));
        assert!(result.helpers.contains(&"Fragment"));
    }

    #[test]
    fn test_dynamic_binding() {
        let result = compile(r#"<img :src="logo" :alt="title + '!'">"#);
        assert!(result
            .code
            .contains(r#"{ src: _ctx.logo, alt: _ctx.title + '!' }"#));
    }

    #[test]
    fn test_same_name_bind_shorthand() {
        let result = compile(r#"<input :value>"#);
        assert!(result.code.contains("{ value: _ctx.value }"));
    }

    #[test]
    fn test_class_merge() {
        let result = compile(r#"<div class="box" :class="{ active: on }"></div>"#);
        assert!(result
            .code
            .contains(r#"class: _normalizeClass(["box", { active: _ctx.on }])"#));
    }

    #[test]
    fn test_event_handlers() {
        let result = compile(
            r#"<button @click="inc" @keyup.enter="submit()" @submit.prevent="save">+</button>"#,
        );
        assert!(result.code.contains("onClick: _ctx.inc"));
        assert!(result
            .code
            .contains(r#"onKeyup: _withKeys($event => (_ctx.submit()), ["enter"])"#));
        assert!(result
            .code
            .contains(r#"onSubmit: _withModifiers(_ctx.save, ["prevent"])"#));
    }

    #[test]
    fn test_event_option_modifier_and_event_arg() {
        let result = compile(r#"<my-input @update:model-value.once="v => value = v"/>"#);
        assert!(result
            .code
            .contains("\"onUpdate:modelValueOnce\": v => _ctx.value = v"));
    }

    #[test]
    fn test_inline_handler_uses_event() {
        let result = compile(r#"<input @input="text = $event.target.value">"#);
        assert!(result
            .code
            .contains("onInput: $event => (_ctx.text = $event.target.value)"));
    }

    #[test]
    fn test_v_if_chain() {
        let result = compile(
            "<div>\n  <p v-if=\"a\">A</p>\n  <p v-else-if=\"b\">B</p>\n  <p v-else>C</p>\n</div>",
        );
        let code = &result.code;
        assert!(code.contains("(_ctx.a)"), "{code}");
        assert!(code.contains("? _createVNode(\"p\", null, \"A\")"), "{code}");
        assert!(code.contains("(_ctx.b)"), "{code}");
        assert!(code.contains(": _createVNode(\"p\", null, \"C\")"), "{code}");
        assert!(!code.contains("createCommentVNode"));
    }

    #[test]
    fn test_v_if_without_else_uses_comment() {
        let result = compile(r#"<p v-if="show">x</p>"#);
        assert!(result.code.contains(r#"_createCommentVNode("v-if", true)"#));
    }

    #[test]
    fn test_orphan_v_else_is_error() {
        let err = compile_err("<p v-else>x</p>");
        assert!(err.message.contains("no adjacent v-if"));
    }

    #[test]
    fn test_v_for() {
        let result = compile(r#"<ul><li v-for="(item, i) in items" :key="item.id">{{ i }}: {{ item.name }}</li></ul>"#);
        let code = &result.code;
        assert!(code.contains("_renderList(_ctx.items, (item, i) => {"), "{code}");
        assert!(code.contains("{ key: item.id }"), "{code}");
        assert!(
            code.contains(r#"_toDisplayString(i) + ": " + _toDisplayString(item.name)"#),
            "{code}"
        );
    }

    #[test]
    fn test_v_for_invalid() {
        let err = compile_err(r#"<li v-for="items"></li>"#);
        assert!(err.message.contains("v-for"));
    }

    #[test]
    fn test_components_resolved() {
        let result = compile("<my-button>Save</my-button><MyButton/>");
        let code = &result.code;
        assert!(code.contains(r#"const _component_my_button = _resolveComponent("my-button")"#));
        assert!(code.contains(r#"const _component_MyButton = _resolveComponent("MyButton")"#));
        assert!(code.contains("_createVNode(_component_my_button, null, {"));
        assert!(code.contains("default: _withCtx(() => ["));
        assert!(code.contains("_: 1 /* STABLE */"));
        assert_eq!(result.components, vec!["my-button", "MyButton"]);
    }

    #[test]
    fn test_named_slots() {
        let result = compile(
            r#"<Layout><template #header="{ title }">{{ title }}</template><p>body</p></Layout>"#,
        );
        let code = &result.code;
        assert!(code.contains("header: _withCtx(({ title }) => ["), "{code}");
        assert!(code.contains("_createTextVNode(_toDisplayString(title))"), "{code}");
        assert!(code.contains("default: _withCtx(() => ["), "{code}");
    }

    #[test]
    fn test_slot_outlet() {
        let result = compile(r#"<div><slot name="footer" :year="y">fallback</slot></div>"#);
        assert!(result.code.contains(
            r#"_renderSlot(_ctx.$slots, "footer", { year: _ctx.y }, () => ["#
        ));
    }

    #[test]
    fn test_dynamic_component() {
        let result = compile(r#"<component :is="view" :msg="m"/>"#);
        assert!(result
            .code
            .contains("_createVNode(_resolveDynamicComponent(_ctx.view), { msg: _ctx.m })"));
    }

    #[test]
    fn test_v_bind_object_merge() {
        let result = compile(r#"<div id="a" v-bind="attrs" title="t"></div>"#);
        assert!(result
            .code
            .contains(r#"_mergeProps({ id: "a" }, _ctx.attrs, { title: "t" })"#));
    }

    #[test]
    fn test_v_text_and_v_html() {
        let result = compile(r#"<span v-text="msg"></span><div v-html="raw"></div>"#);
        assert!(result
            .code
            .contains(r#"_createVNode("span", null, _toDisplayString(_ctx.msg))"#));
        assert!(result.code.contains(r#"_createVNode("div", { innerHTML: _ctx.raw })"#));
    }

    #[test]
    fn test_unsupported_directive() {
        let err = compile_err(r#"<input v-model="x">"#);
        assert!(err.message.contains("v-model is not supported"));
    }

    #[test]
    fn test_dynamic_argument_rejected() {
        let err = compile_err(r#"<p :[key]="v"></p>"#);
        assert!(err.message.contains("Dynamic argument on v-bind is not supported"));

        let err = compile_err(r#"<button @[event]="go">x</button>"#);
        assert!(err.message.contains("Dynamic argument on v-on"));

        let err = compile_err(r#"<Panel><template #[name]>x</template></Panel>"#);
        assert!(err.message.contains("Dynamic argument on v-slot"));
    }

    #[test]
    fn test_function_mode() {
        let nodes = parse_template("<p>{{ a }}</p>").unwrap();
        let result = generate(
            &nodes,
            CompileOptions {
                mode: TemplateMode::Function,
            },
        )
        .unwrap();
        assert!(result.code.starts_with(
            "const { toDisplayString: _toDisplayString, createVNode: _createVNode } = Vue"
        ));
        assert!(result.code.contains("return function render(_ctx, _cache) {"));
        assert!(!result.code.contains("import"));
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
    }

    #[test]
    fn test_handler_key() {
        assert_eq!(to_handler_key("click"), "onClick");
        assert_eq!(to_handler_key("my-event"), "onMyEvent");
        assert_eq!(to_handler_key("update:modelValue"), "onUpdate:modelValue");
    }
}
