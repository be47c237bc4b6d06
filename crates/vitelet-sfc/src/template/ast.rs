//! Template syntax tree.

use crate::span::Span;

/// A node in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Interpolation(Interpolation),
}

impl Node {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Element(el) => el.span,
            Self::Text(text) => text.span,
            Self::Interpolation(interp) => interp.span,
        }
    }

    /// Whitespace-only text, which separates `v-if` / `v-else` siblings.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Text(text) if text.content.trim().is_empty())
    }
}

/// What an element tag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A native HTML/SVG element.
    Element,
    /// A user component, resolved at render time.
    Component,
    /// `<template>`: a grouping wrapper with no element of its own.
    Template,
    /// `<slot>`: a slot outlet.
    Slot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub kind: ElementKind,
    pub props: Vec<Prop>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Element {
    /// Find a directive by name (`if`, `for`, `bind`, ...).
    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.props.iter().find_map(|prop| match prop {
            Prop::Directive(dir) if dir.name == name => Some(dir),
            _ => None,
        })
    }

    /// Find a static attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.props.iter().find_map(|prop| match prop {
            Prop::Attribute(attr) if attr.name == name => Some(attr),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    Attribute(Attribute),
    Directive(Directive),
}

/// `name="value"` or a valueless `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub span: Span,
}

/// `v-name:arg.mod="exp"`, including the `:`, `@` and `#` shorthands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub arg: Option<String>,
    pub exp: Option<String>,
    pub modifiers: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    pub span: Span,
}

/// `{{ expression }}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation {
    pub expression: String,
    pub span: Span,
}
