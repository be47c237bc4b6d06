//! vitelet-sfc: single-file component toolkit.
//!
//! Two stages, usable separately:
//!
//! - [`parse`] splits a `.vue` file into its `<template>`, `<script>` and
//!   `<script setup>` blocks.
//! - [`compile_template`] turns template markup into a render function
//!   that calls the framework runtime.
//!
//! ```ignore
//! use vitelet_sfc::{compile_template, parse, CompileOptions};
//!
//! let descriptor = parse(source)?;
//! let template = descriptor.template.expect("component has a template");
//! let render = compile_template(&template.content, CompileOptions::default())?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod descriptor;
mod error;
mod span;
pub mod template;

pub use descriptor::{parse, SfcBlock, SfcDescriptor};
pub use error::{CompileError, ParseError};
pub use span::{line_col, Span};
pub use template::{compile_template, CodegenResult, CompileOptions, TemplateMode};
