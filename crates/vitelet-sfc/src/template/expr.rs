//! Template expression rewriting.
//!
//! Template expressions are evaluated against the component instance, so
//! free identifiers are rewritten to `_ctx.<name>`. Identifiers that are not
//! free are left alone: keywords and literals, allowed globals (`Math`,
//! `JSON`, ...), property names after `.`, object-literal keys, arrow
//! function parameters and scope locals such as `v-for` aliases.
//!
//! This is a token-level pass, not a full JavaScript parser.

use rustc_hash::FxHashSet;

const KEYWORDS: &[&str] = &[
    "true", "false", "null", "undefined", "this", "typeof", "instanceof", "in", "of", "new",
    "void", "delete", "function", "return", "if", "else", "let", "const", "var", "class",
    "await", "async", "yield", "arguments",
];

const ALLOWED_GLOBALS: &[&str] = &[
    "Infinity", "NaN", "isFinite", "isNaN", "parseFloat", "parseInt", "decodeURI",
    "decodeURIComponent", "encodeURI", "encodeURIComponent", "Math", "Number", "Date", "Array",
    "Object", "Boolean", "String", "RegExp", "Map", "Set", "JSON", "Intl", "BigInt", "console",
    "Error", "Symbol",
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `exp` is a plain member path like `save` or `form.submit`.
#[must_use]
pub fn is_member_path(exp: &str) -> bool {
    let exp = exp.trim();
    !exp.is_empty()
        && exp.split('.').all(|part| {
            let mut chars = part.chars();
            chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
        })
}

/// Whether `exp` is a function expression (`() => ...`, `function () {}`).
#[must_use]
pub fn is_function_expression(exp: &str) -> bool {
    let exp = exp.trim_start();
    if exp.starts_with("function") || exp.starts_with("async ") {
        return true;
    }
    // `x => ...` or `(a, b) => ...`
    let head = if exp.starts_with('(') {
        match matching_paren(exp, 0) {
            Some(close) => &exp[close + 1..],
            None => return false,
        }
    } else {
        let len = exp.find(|c: char| !is_ident_char(c)).unwrap_or(exp.len());
        if len == 0 {
            return false;
        }
        &exp[len..]
    };
    head.trim_start().starts_with("=>")
}

/// Collect the identifiers bound by a `v-for` alias or arrow parameter list.
///
/// `(item, index)` → `item`, `index`; `{ id, name: label }` → `id`, `label`.
#[must_use]
pub fn binding_names(params: &str) -> Vec<String> {
    let mut names = Vec::new();
    let chars: Vec<char> = params.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            let next = chars[i..].iter().find(|c| !c.is_whitespace());
            // `{ key: alias }`: the key is not a binding.
            if next != Some(&':') && !KEYWORDS.contains(&name.as_str()) {
                names.push(name);
            }
            continue;
        }
        if c == '=' {
            // Default value: skip to the next separator.
            while i < chars.len() && !matches!(chars[i], ',' | ')' | '}' | ']') {
                i += 1;
            }
            continue;
        }
        i += 1;
    }
    names
}

/// Rewrite free identifiers in `exp` to `_ctx.<name>`.
///
/// `locals` are names bound by an enclosing scope (`v-for` aliases,
/// `$event`) that must not be prefixed.
#[must_use]
pub fn prefix_identifiers(exp: &str, locals: &FxHashSet<String>) -> String {
    let mut scope = locals.clone();
    scope.extend(declared_params(exp));
    Prefixer::new(exp, &scope).run()
}

/// Names declared as arrow or `function` parameters anywhere in `exp`.
fn declared_params(exp: &str) -> Vec<String> {
    let mut names = Vec::new();

    let mut search = 0;
    while let Some(offset) = exp[search..].find("function") {
        let keyword_end = search + offset + "function".len();
        if let Some(open) = exp[keyword_end..].find('(').map(|i| keyword_end + i) {
            if let Some(close) = matching_paren(exp, open) {
                names.extend(binding_names(&exp[open + 1..close]));
            }
        }
        search = keyword_end;
    }

    let mut search = 0;
    while let Some(offset) = exp[search..].find("=>") {
        let arrow = search + offset;
        let before = exp[..arrow].trim_end();
        if before.ends_with(')') {
            if let Some(open) = matching_open_paren(before) {
                names.extend(binding_names(&before[open + 1..before.len() - 1]));
            }
        } else {
            let start = before
                .rfind(|c: char| !is_ident_char(c))
                .map_or(0, |i| i + 1);
            let name = &before[start..];
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        search = arrow + 2;
    }
    names
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the `(` matching the `)` that ends `s`.
fn matching_open_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

struct Prefixer<'a> {
    chars: Vec<char>,
    pos: usize,
    out: String,
    scope: &'a FxHashSet<String>,
    /// Open brackets, to tell object-literal keys from other identifiers.
    brackets: Vec<char>,
    /// Last significant (non-whitespace) character emitted.
    last_significant: Option<char>,
}

impl<'a> Prefixer<'a> {
    fn new(exp: &str, scope: &'a FxHashSet<String>) -> Self {
        Self {
            chars: exp.chars().collect(),
            pos: 0,
            out: String::with_capacity(exp.len() + 16),
            scope,
            brackets: Vec::new(),
            last_significant: None,
        }
    }

    fn run(mut self) -> String {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match c {
                '\'' | '"' => self.copy_string(c),
                '`' => self.copy_template_literal(),
                c if is_ident_start(c) => self.identifier(),
                c if c.is_ascii_digit() => self.copy_number(),
                '(' | '[' | '{' => {
                    self.brackets.push(c);
                    self.emit(c);
                }
                ')' | ']' | '}' => {
                    self.brackets.pop();
                    self.emit(c);
                }
                _ => self.emit(c),
            }
        }
        self.out
    }

    fn emit(&mut self, c: char) {
        self.out.push(c);
        if !c.is_whitespace() {
            self.last_significant = Some(c);
        }
        self.pos += 1;
    }

    fn copy_string(&mut self, quote: char) {
        self.emit(quote);
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            self.emit(c);
            if c == '\\' && self.pos < self.chars.len() {
                let escaped = self.chars[self.pos];
                self.emit(escaped);
                continue;
            }
            if c == quote {
                break;
            }
        }
    }

    /// Copy a template literal, rewriting the expressions inside `${ }`.
    fn copy_template_literal(&mut self) {
        self.emit('`');
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            if c == '\\' {
                self.emit(c);
                if self.pos < self.chars.len() {
                    let escaped = self.chars[self.pos];
                    self.emit(escaped);
                }
                continue;
            }
            if c == '`' {
                self.emit(c);
                return;
            }
            if c == '$' && self.chars.get(self.pos + 1) == Some(&'{') {
                self.emit('$');
                self.emit('{');
                let start = self.pos;
                let mut depth = 1usize;
                while self.pos < self.chars.len() {
                    match self.chars[self.pos] {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    self.pos += 1;
                }
                let inner: String = self.chars[start..self.pos].iter().collect();
                self.out.push_str(&Prefixer::new(&inner, self.scope).run());
                if self.pos < self.chars.len() {
                    self.emit('}');
                }
                continue;
            }
            self.emit(c);
        }
    }

    fn copy_number(&mut self) {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            if !(is_ident_char(c) || c == '.') {
                break;
            }
            self.emit(c);
        }
    }

    fn identifier(&mut self) {
        let start = self.pos;
        while self.pos < self.chars.len() && is_ident_char(self.chars[self.pos]) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        let next = self.chars[self.pos..]
            .iter()
            .copied()
            .find(|c| !c.is_whitespace());

        let after_dot = self.last_significant == Some('.') && !self.out.ends_with("...");
        let in_object = self.brackets.last() == Some(&'{');
        let key_position = in_object && matches!(self.last_significant, Some('{' | ','));

        let bound = after_dot
            || KEYWORDS.contains(&name.as_str())
            || ALLOWED_GLOBALS.contains(&name.as_str())
            || self.scope.contains(&name);

        let rewritten = if bound || (key_position && next == Some(':')) {
            name.clone()
        } else if key_position && matches!(next, Some(',' | '}')) {
            // Shorthand property `{ msg }` → `{ msg: _ctx.msg }`.
            format!("{name}: _ctx.{name}")
        } else {
            format!("_ctx.{name}")
        };

        self.out.push_str(&rewritten);
        if let Some(last) = name.chars().last() {
            self.last_significant = Some(last);
        }
    }
}
