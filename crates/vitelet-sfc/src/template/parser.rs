//! Template markup parser.
//!
//! Produces a [`Node`] tree from HTML-like template markup: elements,
//! attributes and directives, text, and `{{ }}` interpolations. Comments are
//! dropped and whitespace is condensed the way the browser would render it.

use super::ast::{Attribute, Directive, Element, ElementKind, Interpolation, Node, Prop, Text};
use crate::error::CompileError;
use crate::span::Span;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const HTML_TAGS: &[&str] = &[
    "html", "body", "base", "head", "link", "meta", "style", "title", "address", "article",
    "aside", "footer", "header", "hgroup", "h1", "h2", "h3", "h4", "h5", "h6", "nav", "section",
    "div", "dd", "dl", "dt", "figcaption", "figure", "picture", "hr", "img", "li", "main", "ol",
    "p", "pre", "ul", "a", "b", "abbr", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em",
    "i", "kbd", "mark", "q", "rp", "rt", "ruby", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr", "area", "audio", "map", "track", "video", "embed", "object",
    "param", "source", "canvas", "script", "noscript", "del", "ins", "caption", "col",
    "colgroup", "table", "thead", "tbody", "td", "th", "tr", "button", "datalist", "fieldset",
    "form", "input", "label", "legend", "meter", "optgroup", "option", "output", "progress",
    "select", "textarea", "details", "dialog", "menu", "summary", "template", "blockquote",
    "iframe", "tfoot", "search",
];

const SVG_TAGS: &[&str] = &[
    "svg", "animate", "animateMotion", "animateTransform", "circle", "clipPath", "defs", "desc",
    "ellipse", "feBlend", "feColorMatrix", "feFlood", "feGaussianBlur", "feOffset", "filter",
    "foreignObject", "g", "image", "line", "linearGradient", "marker", "mask", "metadata", "path",
    "pattern", "polygon", "polyline", "radialGradient", "rect", "stop", "switch", "symbol",
    "text", "textPath", "tspan", "use", "view",
];

fn native_tags() -> &'static FxHashSet<&'static str> {
    static TAGS: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    TAGS.get_or_init(|| HTML_TAGS.iter().chain(SVG_TAGS).copied().collect())
}

/// Whether `tag` names a native HTML or SVG element.
#[must_use]
pub fn is_native_tag(tag: &str) -> bool {
    native_tags().contains(tag)
}

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn element_kind(tag: &str) -> ElementKind {
    match tag {
        "template" => ElementKind::Template,
        "slot" => ElementKind::Slot,
        _ if is_native_tag(tag) => ElementKind::Element,
        _ => ElementKind::Component,
    }
}

/// Parse template markup into a list of root nodes.
pub fn parse_template(source: &str) -> Result<Vec<Node>, CompileError> {
    let mut parser = TemplateParser { source, pos: 0 };
    parser.parse_children(None, false)
}

struct TemplateParser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> TemplateParser<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn error(&self, message: impl Into<String>, start: usize) -> CompileError {
        CompileError::new(message, Span::from_range(start, self.pos.max(start)))
    }

    /// Parse nodes until the end tag of `parent` (or end of input at the root).
    fn parse_children(
        &mut self,
        parent: Option<(&str, usize)>,
        in_pre: bool,
    ) -> Result<Vec<Node>, CompileError> {
        let mut nodes = Vec::new();

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                if let Some((tag, start)) = parent {
                    return Err(self.error(format!("Element is missing end tag: <{tag}>"), start));
                }
                break;
            }

            if rest.starts_with("</") {
                let start = self.pos;
                let name_len = rest[2..]
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len() - 2);
                let name = &rest[2..2 + name_len];
                let Some(close) = rest.find('>') else {
                    self.pos = self.source.len();
                    return Err(self.error("Unterminated end tag", start));
                };
                self.pos += close + 1;
                match parent {
                    Some((tag, _)) if tag.eq_ignore_ascii_case(name) => break,
                    _ => return Err(self.error(format!("Invalid end tag: </{name}>"), start)),
                }
            }

            if rest.starts_with("<!--") {
                let start = self.pos;
                match rest.find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => {
                        self.pos = self.source.len();
                        return Err(self.error("Unterminated comment", start));
                    }
                }
                continue;
            }

            if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                nodes.push(Node::Element(self.parse_element()?));
                continue;
            }

            if rest.starts_with("{{") {
                let start = self.pos;
                let Some(end) = rest[2..].find("}}") else {
                    self.pos = self.source.len();
                    return Err(self.error("Interpolation end sign was not found", start));
                };
                let expression = decode_entities(rest[2..2 + end].trim());
                self.pos += end + 4;
                nodes.push(Node::Interpolation(Interpolation {
                    expression,
                    span: Span::from_range(start, self.pos),
                }));
                continue;
            }

            let start = self.pos;
            let len = text_len(rest);
            self.pos += len;
            nodes.push(Node::Text(Text {
                content: decode_entities(&rest[..len]),
                span: Span::from_range(start, self.pos),
            }));
        }

        Ok(condense_whitespace(nodes, in_pre))
    }

    fn parse_element(&mut self) -> Result<Element, CompileError> {
        let start = self.pos;
        self.pos += 1;

        let rest = self.rest();
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let tag = rest[..name_len].to_string();
        self.pos += name_len;

        let mut props = Vec::new();
        let self_closing = loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("Unterminated <{tag}> tag"), start));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                break true;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break false;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            props.push(self.parse_prop()?);
        };

        let kind = element_kind(&tag);
        let children = if self_closing || is_void_element(&tag) {
            Vec::new()
        } else {
            let in_pre = tag == "pre";
            self.parse_children(Some((&tag, start)), in_pre)?
        };

        Ok(Element {
            tag,
            kind,
            props,
            children,
            span: Span::from_range(start, self.pos),
        })
    }

    fn parse_prop(&mut self) -> Result<Prop, CompileError> {
        let start = self.pos;
        let rest = self.rest();
        // `=` can't start a name; skip past it so `<a =x>` still makes progress.
        let skip = usize::from(rest.starts_with('='));
        let name_len = rest[skip..]
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .map_or(rest.len(), |len| len + skip);
        let name = rest[..name_len].to_string();
        self.pos += name_len;

        self.skip_whitespace();
        let value = if self.rest().starts_with('=') {
            self.pos += 1;
            self.skip_whitespace();
            Some(self.parse_attr_value(start)?)
        } else {
            None
        };
        let span = Span::from_range(start, self.pos);

        Ok(match parse_directive_name(&name) {
            Some((dir_name, arg, modifiers)) => Prop::Directive(Directive {
                name: dir_name,
                arg,
                exp: value.filter(|v| !v.trim().is_empty()),
                modifiers,
                span,
            }),
            None => Prop::Attribute(Attribute { name, value, span }),
        })
    }

    fn parse_attr_value(&mut self, attr_start: usize) -> Result<String, CompileError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let Some(end) = rest[1..].find(quote) else {
                    self.pos = self.source.len();
                    return Err(self.error("Unterminated attribute value", attr_start));
                };
                self.pos += end + 2;
                Ok(decode_entities(&rest[1..=end]))
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += len;
                Ok(decode_entities(&rest[..len]))
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }
}

/// Length of the text run at the start of `rest`.
///
/// Text ends at an interpolation or at a `<` that opens a tag, end tag or
/// comment; any other `<` is literal text.
fn text_len(rest: &str) -> usize {
    let mut offset = 0;
    while offset < rest.len() {
        let tail = &rest[offset..];
        if tail.starts_with("{{") {
            break;
        }
        if let Some(after) = tail.strip_prefix('<') {
            if after.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!') {
                break;
            }
        }
        offset += tail.chars().next().map_or(1, char::len_utf8);
    }
    offset.max(1).min(rest.len())
}

/// Split `v-name:arg.mod`, `:arg`, `@arg` and `#arg` into their parts.
fn parse_directive_name(raw: &str) -> Option<(String, Option<String>, Vec<String>)> {
    let (name, rest) = if let Some(rest) = raw.strip_prefix("v-") {
        let end = rest.find([':', '.']).unwrap_or(rest.len());
        let name = &rest[..end];
        let tail = &rest[end..];
        (name, tail.strip_prefix(':').unwrap_or(tail))
    } else if let Some(rest) = raw.strip_prefix(':') {
        ("bind", rest)
    } else if let Some(rest) = raw.strip_prefix('@') {
        ("on", rest)
    } else if let Some(rest) = raw.strip_prefix('#') {
        ("slot", rest)
    } else {
        return None;
    };

    let mut parts = rest.split('.');
    let arg = parts
        .next()
        .filter(|arg| !arg.is_empty())
        .map(str::to_string);
    let modifiers = parts
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    Some((name.to_string(), arg, modifiers))
}

/// Merge adjacent text nodes and apply whitespace condensing.
fn condense_whitespace(nodes: Vec<Node>, in_pre: bool) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (Node::Text(next), Some(Node::Text(prev))) = (&node, merged.last_mut()) {
            prev.content.push_str(&next.content);
            prev.span.end = next.span.end;
            continue;
        }
        merged.push(node);
    }

    if in_pre {
        return merged;
    }

    let last = merged.len().saturating_sub(1);
    let mut result = Vec::with_capacity(merged.len());
    for (i, node) in merged.iter().enumerate() {
        let Node::Text(text) = node else {
            result.push(node.clone());
            continue;
        };

        if text.content.trim().is_empty() {
            let between_elements = i > 0
                && i < last
                && matches!(merged[i - 1], Node::Element(_))
                && matches!(merged[i + 1], Node::Element(_));
            if i == 0 || i == last || (between_elements && text.content.contains('\n')) {
                continue;
            }
            result.push(Node::Text(Text {
                content: " ".to_string(),
                span: text.span,
            }));
        } else {
            result.push(Node::Text(Text {
                content: collapse_spaces(&text.content),
                span: text.span,
            }));
        }
    }
    result
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Decode the handful of character references templates commonly use.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            c.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(el) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_self_closing_root() {
        let nodes = parse_template("<div/>").unwrap();
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.kind, ElementKind::Element);
        assert!(div.children.is_empty());
    }

    #[test]
    fn test_parse_nested_with_interpolation() {
        let nodes = parse_template(r#"<div class="a"><p>Hi {{ name }}!</p></div>"#).unwrap();
        let div = element(&nodes[0]);
        assert_eq!(div.attribute("class").unwrap().value.as_deref(), Some("a"));

        let p = element(&div.children[0]);
        assert_eq!(p.children.len(), 3);
        assert!(matches!(&p.children[0], Node::Text(t) if t.content == "Hi "));
        assert!(
            matches!(&p.children[1], Node::Interpolation(i) if i.expression == "name")
        );
        assert!(matches!(&p.children[2], Node::Text(t) if t.content == "!"));
    }

    #[test]
    fn test_parse_directives() {
        let nodes = parse_template(
            r#"<button :disabled="busy" @click.stop="save" v-if="ok" #default>Go</button>"#,
        )
        .unwrap();
        let button = element(&nodes[0]);

        let bind = button.directive("bind").unwrap();
        assert_eq!(bind.arg.as_deref(), Some("disabled"));
        assert_eq!(bind.exp.as_deref(), Some("busy"));

        let on = button.directive("on").unwrap();
        assert_eq!(on.arg.as_deref(), Some("click"));
        assert_eq!(on.modifiers, vec!["stop".to_string()]);

        assert_eq!(button.directive("if").unwrap().exp.as_deref(), Some("ok"));
        assert!(button.directive("slot").is_some());
    }

    #[test]
    fn test_parse_long_form_directives() {
        let nodes = parse_template(r#"<a v-bind:href="url" v-on:click="go"></a>"#).unwrap();
        let a = element(&nodes[0]);
        assert_eq!(a.directive("bind").unwrap().arg.as_deref(), Some("href"));
        assert_eq!(a.directive("on").unwrap().arg.as_deref(), Some("click"));
    }

    #[test]
    fn test_parse_component_kinds() {
        let nodes = parse_template("<MyButton/><my-list></my-list><slot/><template></template>")
            .unwrap();
        let kinds: Vec<_> = nodes.iter().map(|n| element(n).kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Component,
                ElementKind::Component,
                ElementKind::Slot,
                ElementKind::Template
            ]
        );
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let nodes = parse_template(r#"<p><img src="a.png"><br>text</p>"#).unwrap();
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3);
        assert_eq!(element(&p.children[0]).tag, "img");
    }

    #[test]
    fn test_whitespace_condensing() {
        let nodes = parse_template("<div>\n  <span>a</span>\n  <span>b</span>\n</div>").unwrap();
        let div = element(&nodes[0]);
        assert_eq!(div.children.len(), 2);

        let nodes = parse_template("<p>a   b\n c</p>").unwrap();
        let p = element(&nodes[0]);
        assert!(matches!(&p.children[0], Node::Text(t) if t.content == "a b c"));
    }

    #[test]
    fn test_whitespace_between_inline_content_kept() {
        let nodes = parse_template("<p><b>a</b> <i>b</i></p>").unwrap();
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3);
        assert!(matches!(&p.children[1], Node::Text(t) if t.content == " "));
    }

    #[test]
    fn test_pre_preserves_whitespace() {
        let nodes = parse_template("<pre>  a\n  b</pre>").unwrap();
        let pre = element(&nodes[0]);
        assert!(matches!(&pre.children[0], Node::Text(t) if t.content == "  a\n  b"));
    }

    #[test]
    fn test_comments_dropped() {
        let nodes = parse_template("<div><!-- note --><span/></div>").unwrap();
        let div = element(&nodes[0]);
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn test_entities_decoded() {
        let nodes = parse_template(r#"<p title="a &amp; b">&lt;ok&gt; &#65;&#x42;</p>"#).unwrap();
        let p = element(&nodes[0]);
        assert_eq!(p.attribute("title").unwrap().value.as_deref(), Some("a & b"));
        assert!(matches!(&p.children[0], Node::Text(t) if t.content == "<ok> AB"));
    }

    #[test]
    fn test_literal_less_than_in_text() {
        let nodes = parse_template("<p>a < b</p>").unwrap();
        let p = element(&nodes[0]);
        assert!(matches!(&p.children[0], Node::Text(t) if t.content == "a < b"));
    }

    #[test]
    fn test_missing_end_tag() {
        let err = parse_template("<div><span></div>").unwrap_err();
        assert!(err.message.contains("Invalid end tag"), "{}", err.message);

        let err = parse_template("<div>").unwrap_err();
        assert!(err.message.contains("missing end tag"), "{}", err.message);
    }

    #[test]
    fn test_unterminated_interpolation() {
        let err = parse_template("<p>{{ open</p>").unwrap_err();
        assert!(err.message.contains("Interpolation"));
    }

    #[test]
    fn test_stray_end_tag_at_root() {
        let err = parse_template("</div>").unwrap_err();
        assert!(err.message.contains("Invalid end tag"));
    }
}
