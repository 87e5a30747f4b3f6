//! Nested-stylesheet compilation.
//!
//! Compiles the nested-rule dialect (`.scss`) down to flat CSS in a single
//! synchronous pass: nested rules are flattened against their parent
//! selectors (with comma-group expansion and `&` parent references), and
//! `$name: value;` variables are substituted into declaration values.
//! At-rules pass through, with their bodies compiled recursively. This is a
//! playground-grade subset: no mixins, no functions, no `#{}` interpolation.

use std::collections::HashMap;

use crate::error::TransformError;

pub(crate) fn compile(source: &str) -> Result<String, TransformError> {
    let mut compiler = Compiler { src: source, pos: 0 };
    let mut scopes: Vec<HashMap<String, String>> = Vec::new();
    let output = compiler.compile_block("", &mut scopes, 0)?;
    let trimmed = output.trim_end();
    if trimmed.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{trimmed}\n"))
    }
}

struct Compiler<'a> {
    src: &'a str,
    pos: usize,
}

enum RuleItem {
    Declaration(String),
    Comment(String),
}

impl Compiler<'_> {
    fn compile_block(
        &mut self,
        parent: &str,
        scopes: &mut Vec<HashMap<String, String>>,
        depth: usize,
    ) -> Result<String, TransformError> {
        scopes.push(HashMap::new());
        let mut items: Vec<RuleItem> = Vec::new();
        let mut nested = String::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                if depth > 0 {
                    return Err(TransformError::Stylesheet("unclosed block".to_string()));
                }
                break;
            }

            if self.peek() == '}' {
                if depth == 0 {
                    return Err(TransformError::Stylesheet("unmatched '}'".to_string()));
                }
                self.advance();
                break;
            }

            if self.starts_with("//") {
                self.skip_line();
            } else if self.starts_with("/*") {
                let comment = self.consume_comment()?;
                if parent.is_empty() {
                    nested.push_str(&comment);
                    nested.push_str("\n\n");
                } else {
                    items.push(RuleItem::Comment(comment));
                }
            } else if self.peek() == '$' {
                self.consume_variable(scopes)?;
            } else if self.peek() == '@' {
                self.consume_at_rule(parent, scopes, &mut nested)?;
            } else {
                let (chunk, delimiter) = self.consume_chunk();
                let chunk = chunk.trim();

                match delimiter {
                    Some('{') => {
                        self.advance();
                        let combined = combine_selectors(parent, chunk);
                        let inner = self.compile_block(&combined, scopes, depth + 1)?;
                        nested.push_str(&inner);
                    }
                    Some(';') => {
                        self.advance();
                        if !chunk.is_empty() {
                            items.push(RuleItem::Declaration(substitute(chunk, scopes)?));
                        }
                    }
                    // A final declaration may omit its semicolon.
                    _ => {
                        if !chunk.is_empty() {
                            items.push(RuleItem::Declaration(substitute(chunk, scopes)?));
                        }
                    }
                }
            }
        }

        scopes.pop();

        let mut out = String::new();
        if !items.is_empty() {
            if parent.is_empty() {
                return Err(TransformError::Stylesheet(
                    "declaration found outside a rule".to_string(),
                ));
            }
            out.push_str(parent);
            out.push_str(" {\n");
            for item in &items {
                match item {
                    RuleItem::Declaration(decl) => {
                        out.push_str("  ");
                        out.push_str(decl);
                        out.push_str(";\n");
                    }
                    RuleItem::Comment(comment) => {
                        out.push_str("  ");
                        out.push_str(comment);
                        out.push('\n');
                    }
                }
            }
            out.push_str("}\n\n");
        }
        out.push_str(&nested);
        Ok(out)
    }

    fn consume_variable(
        &mut self,
        scopes: &mut Vec<HashMap<String, String>>,
    ) -> Result<(), TransformError> {
        self.advance(); // $
        let name = self.consume_identifier();
        if name.is_empty() {
            return Err(TransformError::Stylesheet("expected variable name after '$'".to_string()));
        }
        self.skip_whitespace();
        if self.peek() != ':' {
            return Err(TransformError::Stylesheet(format!(
                "expected ':' after variable ${name}"
            )));
        }
        self.advance();
        let (raw, delimiter) = self.consume_chunk();
        if delimiter == Some(';') {
            self.advance();
        }
        // Substitute at definition time so variables can chain.
        let value = substitute(raw.trim(), scopes)?;
        if let Some(scope) = scopes.last_mut() {
            scope.insert(name, value);
        }
        Ok(())
    }

    fn consume_at_rule(
        &mut self,
        parent: &str,
        scopes: &mut Vec<HashMap<String, String>>,
        nested: &mut String,
    ) -> Result<(), TransformError> {
        let (header, delimiter) = self.consume_chunk();
        match delimiter {
            Some(';') => {
                self.advance();
                nested.push_str(header.trim());
                nested.push_str(";\n\n");
            }
            Some('{') => {
                self.advance();
                // The body keeps the surrounding parent selector so rules
                // nested under the at-rule still flatten against it.
                let inner = self.compile_block(parent, scopes, 1)?;
                nested.push_str(header.trim());
                nested.push_str(" {\n");
                nested.push_str(inner.trim_end());
                nested.push_str("\n}\n\n");
            }
            _ => {
                return Err(TransformError::Stylesheet(format!(
                    "unterminated at-rule: {}",
                    header.trim()
                )))
            }
        }
        Ok(())
    }

    /// Read raw text up to an unnested `;`, `{` or `}`, leaving the
    /// delimiter unconsumed. Parentheses, brackets and quoted strings are
    /// skipped over so `url(data:...;...)` stays intact.
    fn consume_chunk(&mut self) -> (String, Option<char>) {
        let start = self.pos;
        let mut paren_depth = 0usize;

        while !self.is_at_end() {
            let c = self.peek();
            match c {
                '"' | '\'' => self.skip_string(c),
                '(' | '[' => {
                    paren_depth += 1;
                    self.advance();
                }
                ')' | ']' => {
                    paren_depth = paren_depth.saturating_sub(1);
                    self.advance();
                }
                ';' | '{' | '}' if paren_depth == 0 => {
                    return (self.src[start..self.pos].to_string(), Some(c));
                }
                _ => self.advance(),
            }
        }

        (self.src[start..self.pos].to_string(), None)
    }

    fn consume_comment(&mut self) -> Result<String, TransformError> {
        let start = self.pos;
        self.advance();
        self.advance();
        while !self.is_at_end() {
            if self.starts_with("*/") {
                self.advance();
                self.advance();
                return Ok(self.src[start..self.pos].to_string());
            }
            self.advance();
        }
        Err(TransformError::Stylesheet("unterminated comment".to_string()))
    }

    fn consume_identifier(&mut self) -> String {
        let start = self.pos;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn skip_string(&mut self, quote: char) {
        self.advance();
        while !self.is_at_end() {
            let c = self.peek();
            self.advance();
            if c == '\\' {
                self.advance();
            } else if c == quote {
                break;
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    #[inline]
    fn peek(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    #[inline]
    fn advance(&mut self) {
        if let Some(c) = self.src[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
}

/// Join a nested selector onto its parent, expanding comma groups on both
/// sides. `&` in the child is replaced by the parent selector.
fn combine_selectors(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        return normalize_selector(child);
    }

    let parents = split_selector_list(parent);
    let children = split_selector_list(child);
    let mut combined = Vec::with_capacity(parents.len() * children.len());

    for p in &parents {
        for c in &children {
            if c.contains('&') {
                combined.push(c.replace('&', p));
            } else {
                combined.push(format!("{p} {c}"));
            }
        }
    }

    combined.join(", ")
}

fn normalize_selector(selector: &str) -> String {
    split_selector_list(selector).join(", ")
}

fn split_selector_list(selector: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in selector.chars() {
        match c {
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(collapse_whitespace(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(collapse_whitespace(&current));
    }
    parts
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace `$name` references in a declaration value from the innermost
/// matching scope. References inside quoted strings are left alone.
fn substitute(
    value: &str,
    scopes: &[HashMap<String, String>],
) -> Result<String, TransformError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.char_indices().peekable();
    let mut in_quote: Option<char> = None;

    while let Some((_, c)) = chars.next() {
        match in_quote {
            Some(quote) => {
                out.push(c);
                if c == quote {
                    in_quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    in_quote = Some(c);
                    out.push(c);
                }
                '$' => {
                    let mut name = String::new();
                    while let Some(&(_, next)) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '-' || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let resolved = scopes
                        .iter()
                        .rev()
                        .find_map(|scope| scope.get(&name))
                        .ok_or_else(|| {
                            TransformError::Stylesheet(format!("undefined variable ${name}"))
                        })?;
                    out.push_str(resolved);
                }
                _ => out.push(c),
            },
        }
    }

    Ok(out)
}
