//! Top-level block splitting for single-file components.
//!
//! A component file is a sequence of top-level blocks:
//!
//! ```text
//! <template> ... </template>     markup, nested <template> tags allowed
//! <script> ... </script>         options object (export default {...})
//! <script setup> ... </script>   composition setup block
//! <style scoped> ... </style>    recognised and skipped
//! ```
//!
//! Block contents are taken verbatim; nothing inside a block is interpreted
//! here. Custom blocks (`<i18n>`, `<docs>`, ...) and text between blocks are
//! skipped.

use crate::error::ParseError;
use crate::span::Span;
use std::collections::BTreeMap;

/// A top-level block of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfcBlock {
    /// Raw text between the opening and closing tag.
    pub content: String,
    /// Attributes of the opening tag. Valueless attributes map to `""`.
    pub attrs: BTreeMap<String, String>,
    /// Location of `content` in the component source.
    pub span: Span,
}

impl SfcBlock {
    /// Value of an attribute on the opening tag.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The `lang` attribute, if any.
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.attr("lang")
    }
}

/// The sections of a parsed component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SfcDescriptor {
    pub script: Option<SfcBlock>,
    pub script_setup: Option<SfcBlock>,
    pub template: Option<SfcBlock>,
}

impl SfcDescriptor {
    /// True when neither a script (of either kind) nor a template was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.script_setup.is_none() && self.template.is_none()
    }
}

/// Split component source into its top-level blocks.
pub fn parse(source: &str) -> Result<SfcDescriptor, ParseError> {
    BlockScanner::new(source).scan()
}

struct OpenTag {
    name: String,
    attrs: BTreeMap<String, String>,
    self_closing: bool,
    start: usize,
}

struct BlockScanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> BlockScanner<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn scan(mut self) -> Result<SfcDescriptor, ParseError> {
        let mut descriptor = SfcDescriptor::default();

        loop {
            // Skip text up to the next tag.
            match self.rest().find('<') {
                Some(offset) => self.pos += offset,
                None => break,
            }

            if self.rest().starts_with("<!--") {
                self.skip_comment()?;
                continue;
            }

            let next = self.rest().chars().nth(1);
            if !next.is_some_and(|c| c.is_ascii_alphabetic()) {
                // Stray `<` or closing tag between blocks.
                self.pos += 1;
                continue;
            }

            let tag = self.read_open_tag()?;
            let block = if tag.self_closing {
                SfcBlock {
                    content: String::new(),
                    attrs: tag.attrs,
                    span: Span::from_range(self.pos, self.pos),
                }
            } else {
                let (content_start, content_end) = if tag.name == "template" {
                    self.read_template_body(tag.start)?
                } else {
                    self.read_raw_body(&tag.name, tag.start)?
                };
                SfcBlock {
                    content: self.source[content_start..content_end].to_string(),
                    attrs: tag.attrs,
                    span: Span::from_range(content_start, content_end),
                }
            };

            let here = Span::from_range(tag.start, self.pos);
            match tag.name.as_str() {
                "template" => {
                    if descriptor.template.is_some() {
                        return Err(ParseError::new(
                            "Single file component can contain only one <template> element",
                            here,
                        ));
                    }
                    descriptor.template = Some(block);
                }
                "script" if block.attrs.contains_key("setup") => {
                    if descriptor.script_setup.is_some() {
                        return Err(ParseError::new(
                            "Single file component can contain only one <script setup> element",
                            here,
                        ));
                    }
                    descriptor.script_setup = Some(block);
                }
                "script" => {
                    if descriptor.script.is_some() {
                        return Err(ParseError::new(
                            "Single file component can contain only one <script> element",
                            here,
                        ));
                    }
                    descriptor.script = Some(block);
                }
                // <style> and custom blocks
                _ => {}
            }
        }

        Ok(descriptor)
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        match self.rest().find("-->") {
            Some(end) => {
                self.pos += end + 3;
                Ok(())
            }
            None => Err(ParseError::new(
                "Unterminated comment",
                Span::from_range(start, self.source.len()),
            )),
        }
    }

    /// Read `<name attr="v" ...>` starting at `self.pos`, leaving `pos` after `>`.
    fn read_open_tag(&mut self) -> Result<OpenTag, ParseError> {
        let start = self.pos;
        self.pos += 1;

        let name_len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(self.rest().len());
        let name = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;

        let mut attrs = BTreeMap::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(ParseError::new(
                    format!("Unterminated <{name}> tag"),
                    Span::from_range(start, self.source.len()),
                ));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(OpenTag {
                    name,
                    attrs,
                    self_closing: true,
                    start,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(OpenTag {
                    name,
                    attrs,
                    self_closing: false,
                    start,
                });
            }

            let attr_len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            if attr_len == 0 {
                // Lone `/` or `=`: skip it.
                self.pos += 1;
                continue;
            }
            let attr_name = rest[..attr_len].to_string();
            self.pos += attr_len;

            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attr_value(start)?
            } else {
                String::new()
            };
            attrs.insert(attr_name, value);
        }
    }

    fn read_attr_value(&mut self, tag_start: usize) -> Result<String, ParseError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &rest[1..];
                let Some(end) = inner.find(quote) else {
                    return Err(ParseError::new(
                        "Unterminated attribute value",
                        Span::from_range(tag_start, self.source.len()),
                    ));
                };
                let value = inner[..end].to_string();
                self.pos += end + 2;
                Ok(value)
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                let value = rest[..len].to_string();
                self.pos += len;
                Ok(value)
            }
        }
    }

    /// Find the matching `</template>` while counting nested `<template>` tags.
    ///
    /// Returns the content range and leaves `pos` after the closing tag.
    fn read_template_body(&mut self, tag_start: usize) -> Result<(usize, usize), ParseError> {
        let content_start = self.pos;
        let mut depth = 1usize;
        let mut cursor = self.pos;

        while let Some(offset) = self.source[cursor..].find('<') {
            let at = cursor + offset;
            let tail = &self.source[at..];

            if tail.starts_with("<!--") {
                cursor = match tail.find("-->") {
                    Some(end) => at + end + 3,
                    None => break,
                };
                continue;
            }

            if let Some(after) = tail.strip_prefix("</template") {
                if after.starts_with(|c: char| c == '>' || c.is_whitespace()) {
                    depth -= 1;
                    if depth == 0 {
                        let close = after.find('>').map_or(self.source.len(), |g| {
                            at + "</template".len() + g + 1
                        });
                        self.pos = close;
                        return Ok((content_start, at));
                    }
                }
            } else if let Some(after) = tail.strip_prefix("<template") {
                if after.starts_with(|c: char| c == '>' || c == '/' || c.is_whitespace()) {
                    let tag_end = after.find('>').unwrap_or(after.len());
                    let self_closing = after[..tag_end].trim_end().ends_with('/');
                    if !self_closing {
                        depth += 1;
                    }
                }
            }
            cursor = at + 1;
        }

        Err(ParseError::new(
            "Element is missing end tag: <template>",
            Span::from_range(tag_start, self.source.len()),
        ))
    }

    /// Find `</name>` for a raw-text block (`script`, `style`, custom blocks).
    fn read_raw_body(&mut self, name: &str, tag_start: usize) -> Result<(usize, usize), ParseError> {
        let content_start = self.pos;
        let closing = format!("</{name}");
        let mut cursor = self.pos;

        while let Some(offset) = self.source[cursor..].find(&closing) {
            let at = cursor + offset;
            let after = &self.source[at + closing.len()..];
            if after.starts_with(|c: char| c == '>' || c.is_whitespace()) {
                let close = after
                    .find('>')
                    .map_or(self.source.len(), |g| at + closing.len() + g + 1);
                self.pos = close;
                return Ok((content_start, at));
            }
            cursor = at + closing.len();
        }

        Err(ParseError::new(
            format!("Element is missing end tag: <{name}>"),
            Span::from_range(tag_start, self.source.len()),
        ))
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = r#"<template>
  <div class="counter">{{ count }}</div>
</template>

<script>
export default {
  data() {
    return { count: 0 }
  }
}
</script>

<style scoped>
.counter { color: red; }
</style>
"#;

    #[test]
    fn test_parse_template_and_script() {
        let descriptor = parse(COUNTER).unwrap();

        let template = descriptor.template.unwrap();
        assert_eq!(
            template.content.trim(),
            r#"<div class="counter">{{ count }}</div>"#
        );

        let script = descriptor.script.unwrap();
        assert!(script.content.contains("export default"));
        assert!(script.content.contains("count: 0"));
        assert!(descriptor.script_setup.is_none());
    }

    #[test]
    fn test_block_span_points_at_content() {
        let source = "<script>let a = 1</script>";
        let descriptor = parse(source).unwrap();
        let script = descriptor.script.unwrap();
        let span = script.span;
        assert_eq!(
            &source[span.start as usize..span.end as usize],
            "let a = 1"
        );
    }

    #[test]
    fn test_parse_script_setup() {
        let source = r#"<script setup lang="js">
const msg = 'hi'
</script>
<template><p>{{ msg }}</p></template>"#;
        let descriptor = parse(source).unwrap();

        let setup = descriptor.script_setup.unwrap();
        assert!(setup.content.contains("const msg"));
        assert_eq!(setup.lang(), Some("js"));
        assert_eq!(setup.attr("setup"), Some(""));
        assert!(descriptor.script.is_none());
        assert!(descriptor.template.is_some());
    }

    #[test]
    fn test_parse_script_and_script_setup() {
        let source = "<script>export default { name: 'A' }</script>\n<script setup>const x = 1</script>";
        let descriptor = parse(source).unwrap();
        assert!(descriptor.script.is_some());
        assert!(descriptor.script_setup.is_some());
    }

    #[test]
    fn test_nested_template_tags() {
        let source = r#"<template>
  <ul>
    <template v-for="item in items"><li>{{ item }}</li></template>
  </ul>
</template>"#;
        let descriptor = parse(source).unwrap();
        let template = descriptor.template.unwrap();
        assert!(template.content.contains("<template v-for"));
        assert!(template.content.trim_end().ends_with("</ul>"));
    }

    #[test]
    fn test_script_containing_html_string() {
        let source = "<script>const s = '<template></template>'; export default {}</script>";
        let descriptor = parse(source).unwrap();
        assert!(descriptor.template.is_none());
        assert!(descriptor.script.unwrap().content.contains("<template>"));
    }

    #[test]
    fn test_comments_between_blocks() {
        let source = "<!-- <script>nope</script> -->\n<template><div/></template>";
        let descriptor = parse(source).unwrap();
        assert!(descriptor.script.is_none());
        assert_eq!(descriptor.template.unwrap().content, "<div/>");
    }

    #[test]
    fn test_custom_block_skipped() {
        let source = "<i18n>{ \"en\": {} }</i18n><template><b>x</b></template>";
        let descriptor = parse(source).unwrap();
        assert_eq!(descriptor.template.unwrap().content, "<b>x</b>");
    }

    #[test]
    fn test_empty_source() {
        let descriptor = parse("").unwrap();
        assert!(descriptor.is_empty());
    }

    #[test]
    fn test_duplicate_template_is_error() {
        let err = parse("<template><a/></template><template><b/></template>").unwrap_err();
        assert!(err.message.contains("only one <template>"));
    }

    #[test]
    fn test_duplicate_script_is_error() {
        let err = parse("<script></script><script></script>").unwrap_err();
        assert!(err.message.contains("only one <script>"));
    }

    #[test]
    fn test_unterminated_script_is_error() {
        let err = parse("<script>export default {}").unwrap_err();
        assert!(err.message.contains("missing end tag"));
        assert_eq!(err.span.start, 0);
    }

    #[test]
    fn test_unterminated_template_is_error() {
        let err = parse("<template><div></div>").unwrap_err();
        assert!(err.message.contains("<template>"));
    }

    #[test]
    fn test_self_closing_template_block() {
        let descriptor = parse("<template/>").unwrap();
        assert_eq!(descriptor.template.unwrap().content, "");
    }
}
