//! JSX-to-call rewriting.
//!
//! Rewrites JSX elements and fragments into `React.createElement(...)`
//! calls in a single pass over the source text. The scanner is
//! string/template/comment/regex aware so angle brackets inside ordinary
//! expressions are left alone; a `<` only opens an element when it sits in
//! expression position.

use crate::error::TransformError;

/// Identifiers after which a `/` starts a regex and a `<` starts JSX.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "default", "do", "else", "void", "delete", "throw", "yield",
    "await", "in", "of", "new", "instanceof",
];

pub(crate) fn transform(source: &str) -> Result<String, TransformError> {
    let mut scanner = Scanner {
        chars: source.chars().collect(),
        pos: 0,
    };
    scanner.transform_js(false)
}

#[derive(Clone, Copy, PartialEq)]
enum LastSig {
    /// Start of input or of an embedded expression.
    Start,
    /// An identifier; JSX may follow only if it is an expression keyword.
    Ident,
    /// An expression keyword such as `return`.
    Keyword,
    /// A literal, closing paren/bracket, or emitted element: a value.
    Value,
    /// Any other punctuation.
    Punct,
}

enum Attr {
    Pair(String, String),
    Bare(String),
    Spread(String),
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    /// Copy JavaScript, rewriting JSX as it goes. With `stop_at_close`, the
    /// scan ends at the first unmatched `}` (which is consumed); this is how
    /// embedded `{...}` expressions and `${...}` template holes are handled,
    /// since both may contain nested JSX.
    fn transform_js(&mut self, stop_at_close: bool) -> Result<String, TransformError> {
        let mut out = String::new();
        let mut last = LastSig::Start;
        let mut brace_depth = 0usize;

        while !self.is_at_end() {
            let c = self.peek();
            match c {
                '/' if self.peek_at(1) == '/' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        out.push(self.bump());
                    }
                }
                '/' if self.peek_at(1) == '*' => {
                    out.push(self.bump());
                    out.push(self.bump());
                    while !self.is_at_end() && !(self.peek() == '*' && self.peek_at(1) == '/') {
                        out.push(self.bump());
                    }
                    if !self.is_at_end() {
                        out.push(self.bump());
                        out.push(self.bump());
                    }
                }
                '"' | '\'' => {
                    self.copy_string(c, &mut out);
                    last = LastSig::Value;
                }
                '`' => {
                    self.copy_template(&mut out)?;
                    last = LastSig::Value;
                }
                '/' if regex_may_start(last) => {
                    self.copy_regex(&mut out);
                    last = LastSig::Value;
                }
                '<' if jsx_may_start(last) && self.looks_like_element() => {
                    out.push_str(&self.parse_element()?);
                    last = LastSig::Value;
                }
                '{' => {
                    brace_depth += 1;
                    out.push(self.bump());
                    last = LastSig::Punct;
                }
                '}' => {
                    if brace_depth == 0 && stop_at_close {
                        self.bump();
                        return Ok(out);
                    }
                    brace_depth = brace_depth.saturating_sub(1);
                    out.push(self.bump());
                    last = LastSig::Punct;
                }
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    let word = self.copy_word(&mut out);
                    last = if EXPRESSION_KEYWORDS.contains(&word.as_str()) {
                        LastSig::Keyword
                    } else {
                        LastSig::Ident
                    };
                }
                c if c.is_ascii_digit() => {
                    while !self.is_at_end()
                        && (self.peek().is_ascii_alphanumeric()
                            || self.peek() == '.'
                            || self.peek() == '_')
                    {
                        out.push(self.bump());
                    }
                    last = LastSig::Value;
                }
                c if c.is_whitespace() => {
                    out.push(self.bump());
                }
                ')' | ']' => {
                    out.push(self.bump());
                    last = LastSig::Value;
                }
                _ => {
                    out.push(self.bump());
                    last = LastSig::Punct;
                }
            }
        }

        if stop_at_close {
            return Err(TransformError::Script("unclosed '{' expression".to_string()));
        }
        Ok(out)
    }

    /// After a `<` in expression position, only commit to JSX when the next
    /// character could begin a tag name or fragment.
    fn looks_like_element(&self) -> bool {
        let mut i = self.pos + 1;
        while self.chars.get(i).is_some_and(|c| c.is_whitespace()) {
            i += 1;
        }
        self.chars
            .get(i)
            .is_some_and(|&c| c.is_alphabetic() || c == '_' || c == '$' || c == '>')
    }

    fn parse_element(&mut self) -> Result<String, TransformError> {
        self.bump(); // <
        self.skip_whitespace();

        let name = self.consume_tag_name();
        let mut attrs: Vec<Attr> = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                '\0' => {
                    return Err(TransformError::Script(format!(
                        "unterminated element <{name}>"
                    )))
                }
                '/' => {
                    self.bump();
                    if self.peek() != '>' {
                        return Err(TransformError::Script(format!(
                            "expected '>' after '/' in <{name}>"
                        )));
                    }
                    self.bump();
                    return Ok(emit(&name, &attrs, &[]));
                }
                '>' => {
                    self.bump();
                    let children = self.parse_children(&name)?;
                    return Ok(emit(&name, &attrs, &children));
                }
                '{' => {
                    self.bump();
                    let expr = self.transform_js(true)?;
                    let trimmed = expr.trim().to_string();
                    let Some(spread) = trimmed.strip_prefix("...") else {
                        return Err(TransformError::Script(format!(
                            "expected '...' in attribute expression of <{name}>"
                        )));
                    };
                    attrs.push(Attr::Spread(spread.trim().to_string()));
                }
                _ => {
                    let attr = self.consume_attr_name();
                    if attr.is_empty() {
                        return Err(TransformError::Script(format!(
                            "unexpected character in <{name}>"
                        )));
                    }
                    self.skip_whitespace();
                    if self.peek() == '=' {
                        self.bump();
                        self.skip_whitespace();
                        match self.peek() {
                            '"' | '\'' => {
                                let mut value = String::new();
                                self.copy_string(self.peek(), &mut value);
                                attrs.push(Attr::Pair(attr, value));
                            }
                            '{' => {
                                self.bump();
                                let expr = self.transform_js(true)?;
                                attrs.push(Attr::Pair(attr, expr.trim().to_string()));
                            }
                            _ => {
                                return Err(TransformError::Script(format!(
                                    "expected attribute value for '{attr}' in <{name}>"
                                )))
                            }
                        }
                    } else {
                        attrs.push(Attr::Bare(attr));
                    }
                }
            }
        }
    }

    fn parse_children(&mut self, name: &str) -> Result<Vec<String>, TransformError> {
        let mut children = Vec::new();

        loop {
            if self.is_at_end() {
                return Err(TransformError::Script(format!("unclosed element <{name}>")));
            }

            if self.peek() == '<' && self.peek_at(1) == '/' {
                self.bump();
                self.bump();
                self.skip_whitespace();
                self.consume_tag_name();
                self.skip_whitespace();
                if self.peek() != '>' {
                    return Err(TransformError::Script(format!(
                        "malformed closing tag for <{name}>"
                    )));
                }
                self.bump();
                return Ok(children);
            }

            if self.peek() == '<' {
                children.push(self.parse_element()?);
                continue;
            }

            if self.peek() == '{' {
                self.bump();
                let expr = self.transform_js(true)?;
                let trimmed = expr.trim();
                let is_comment = trimmed.starts_with("/*") && trimmed.ends_with("*/");
                if !trimmed.is_empty() && !is_comment {
                    children.push(trimmed.to_string());
                }
                continue;
            }

            let run = self.consume_text_run();
            if let Some(text) = collapse_jsx_text(&run) {
                children.push(format!("\"{}\"", escape_js_string(&text)));
            }
        }
    }

    fn consume_text_run(&mut self) -> String {
        let mut run = String::new();
        while !self.is_at_end() && self.peek() != '<' && self.peek() != '{' {
            run.push(self.bump());
        }
        run
    }

    fn consume_tag_name(&mut self) -> String {
        let mut name = String::new();
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '$') {
                name.push(self.bump());
            } else {
                break;
            }
        }
        name
    }

    fn consume_attr_name(&mut self) -> String {
        let mut name = String::new();
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '$' | ':') {
                name.push(self.bump());
            } else {
                break;
            }
        }
        name
    }

    fn copy_string(&mut self, quote: char, out: &mut String) {
        out.push(self.bump());
        while !self.is_at_end() {
            let c = self.bump();
            out.push(c);
            if c == '\\' {
                if !self.is_at_end() {
                    out.push(self.bump());
                }
            } else if c == quote {
                break;
            }
        }
    }

    fn copy_template(&mut self, out: &mut String) -> Result<(), TransformError> {
        out.push(self.bump()); // `
        while !self.is_at_end() {
            let c = self.peek();
            if c == '\\' {
                out.push(self.bump());
                if !self.is_at_end() {
                    out.push(self.bump());
                }
            } else if c == '`' {
                out.push(self.bump());
                return Ok(());
            } else if c == '$' && self.peek_at(1) == '{' {
                out.push(self.bump());
                out.push(self.bump());
                out.push_str(&self.transform_js(true)?);
                out.push('}');
            } else {
                out.push(self.bump());
            }
        }
        Err(TransformError::Script("unterminated template literal".to_string()))
    }

    fn copy_regex(&mut self, out: &mut String) {
        out.push(self.bump()); // /
        let mut in_class = false;
        while !self.is_at_end() {
            let c = self.bump();
            out.push(c);
            match c {
                '\\' => {
                    if !self.is_at_end() {
                        out.push(self.bump());
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                '\n' => break,
                _ => {}
            }
        }
        while !self.is_at_end() && self.peek().is_ascii_alphabetic() {
            out.push(self.bump());
        }
    }

    fn copy_word(&mut self, out: &mut String) -> String {
        let start = out.len();
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_alphanumeric() || c == '_' || c == '$' {
                out.push(self.bump());
            } else {
                break;
            }
        }
        out[start..].to_string()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.bump();
        }
    }

    #[inline]
    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or('\0')
    }

    #[inline]
    fn bump(&mut self) -> char {
        let c = self.peek();
        self.pos += 1;
        c
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn jsx_may_start(last: LastSig) -> bool {
    matches!(last, LastSig::Start | LastSig::Punct | LastSig::Keyword)
}

fn regex_may_start(last: LastSig) -> bool {
    matches!(last, LastSig::Start | LastSig::Punct | LastSig::Keyword)
}

fn emit(name: &str, attrs: &[Attr], children: &[String]) -> String {
    let tag = if name.is_empty() {
        "React.Fragment".to_string()
    } else if name.contains('.') {
        name.to_string()
    } else if name.contains('-') || name.chars().next().is_some_and(char::is_lowercase) {
        format!("\"{name}\"")
    } else {
        name.to_string()
    };

    let attrs_expr = if attrs.is_empty() {
        "null".to_string()
    } else {
        let entries: Vec<String> = attrs
            .iter()
            .map(|attr| match attr {
                Attr::Pair(name, value) => format!("\"{name}\": {value}"),
                Attr::Bare(name) => format!("\"{name}\": true"),
                Attr::Spread(expr) => format!("...{expr}"),
            })
            .collect();
        format!("{{{}}}", entries.join(", "))
    };

    let mut call = format!("React.createElement({tag}, {attrs_expr}");
    for child in children {
        call.push_str(", ");
        call.push_str(child);
    }
    call.push(')');
    call
}

/// JSX text semantics, approximately: interior whitespace collapses to a
/// single space, whitespace-only runs disappear, and a run keeps a single
/// leading/trailing space when it had same-line spacing there.
fn collapse_jsx_text(run: &str) -> Option<String> {
    let collapsed = run.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    let keeps_leading = run.starts_with(' ') || run.starts_with('\t');
    let keeps_trailing = run.ends_with(' ') || run.ends_with('\t');

    let mut text = String::new();
    if keeps_leading {
        text.push(' ');
    }
    text.push_str(&collapsed);
    if keeps_trailing {
        text.push(' ');
    }
    Some(text)
}

fn escape_js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_element() {
        let js = transform("const el = <div className=\"app\">Hello</div>;").unwrap();
        assert_eq!(
            js,
            "const el = React.createElement(\"div\", {\"className\": \"app\"}, \"Hello\");"
        );
    }

    #[test]
    fn test_self_closing_component() {
        let js = transform("render(<App x={1} on/>);").unwrap();
        assert_eq!(
            js,
            "render(React.createElement(App, {\"x\": 1, \"on\": true}));"
        );
    }

    #[test]
    fn test_nested_elements_in_expression_children() {
        let js = transform("<ul>{items.map(i => <li key={i}>{i}</li>)}</ul>").unwrap();
        assert_eq!(
            js,
            "React.createElement(\"ul\", null, items.map(i => React.createElement(\"li\", {\"key\": i}, i)))"
        );
    }

    #[test]
    fn test_fragment() {
        let js = transform("<><br/><hr/></>").unwrap();
        assert_eq!(
            js,
            "React.createElement(React.Fragment, null, React.createElement(\"br\", null), React.createElement(\"hr\", null))"
        );
    }

    #[test]
    fn test_spread_attribute() {
        let js = transform("<App {...props} id=\"a\"/>").unwrap();
        assert_eq!(
            js,
            "React.createElement(App, {...props, \"id\": \"a\"})"
        );
    }

    #[test]
    fn test_member_component() {
        let js = transform("<UI.Button>Go</UI.Button>").unwrap();
        assert_eq!(js, "React.createElement(UI.Button, null, \"Go\")");
    }

    #[test]
    fn test_comparison_is_untouched() {
        let src = "const ok = a < b && c > d;";
        assert_eq!(transform(src).unwrap(), src);
    }

    #[test]
    fn test_generic_call_is_untouched() {
        let src = "const v = parse<number>(input);";
        assert_eq!(transform(src).unwrap(), src);
    }

    #[test]
    fn test_strings_and_templates_are_untouched() {
        let src = "const s = \"<div>\"; const t = `a ${x < y} <b>`;";
        assert_eq!(transform(src).unwrap(), src);
    }

    #[test]
    fn test_jsx_inside_template_hole() {
        let js = transform("const t = `${<b>hi</b>}`;").unwrap();
        assert_eq!(
            js,
            "const t = `${React.createElement(\"b\", null, \"hi\")}`;"
        );
    }

    #[test]
    fn test_comment_child_is_dropped() {
        let js = transform("<div>{/* note */}x</div>").unwrap();
        assert_eq!(js, "React.createElement(\"div\", null, \"x\")");
    }

    #[test]
    fn test_unclosed_element_errors() {
        let err = transform("const el = <div>oops;").unwrap_err();
        assert!(matches!(err, TransformError::Script(_)));
    }

    #[test]
    fn test_text_keeps_inline_spacing() {
        let js = transform("<p>one <b>two</b> three</p>").unwrap();
        assert_eq!(
            js,
            "React.createElement(\"p\", null, \"one \", React.createElement(\"b\", null, \"two\"), \" three\")"
        );
    }
}
