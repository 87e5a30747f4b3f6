//! Type-annotation stripping.
//!
//! Erases TypeScript's type-only syntax from a token stream and hands back
//! plain JavaScript: `interface`/`type`/`declare` declarations, parameter
//! and variable annotations, return annotations, `as` casts, generic
//! argument lists, class member modifiers and non-null assertions. Enums
//! lower to plain object literals. Anything the eraser does not recognize
//! (angle-bracket casts, namespaces, conditional types) passes through
//! untouched; nothing here panics on malformed input.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::TransformError;

const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "default", "do", "else", "void", "delete", "throw", "yield",
    "await", "in", "of", "new", "instanceof",
];

const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "abstract", "override", "declare",
];

const PARAM_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

const TYPE_PREFIXES: &[&str] = &["keyof", "typeof", "readonly", "infer", "new"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokKind {
    Ws,
    Comment,
    Ident,
    Num,
    Str,
    Template,
    Regex,
    Punct,
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokKind,
    text: String,
}

impl Token {
    fn is_sig(&self) -> bool {
        !matches!(self.kind, TokKind::Ws | TokKind::Comment)
    }
}

pub(crate) fn strip(source: &str) -> Result<String, TransformError> {
    let tokens = tokenize(source)?;
    let match_of = match_brackets(&tokens)?;
    Eraser::new(tokens, match_of).run()
}

// ---------------------------------------------------------------------------
// Lexing

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

const PUNCT4: &[&str] = &[">>>="];
const PUNCT3: &[&str] = &[
    "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "...",
];
const PUNCT2: &[&str] = &[
    "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "**", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "<<", ">>",
];

fn tokenize(source: &str) -> Result<Vec<Token>, TransformError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
    };
    let mut tokens: Vec<Token> = Vec::new();

    while !lexer.is_at_end() {
        let c = lexer.peek();
        let token = if c.is_whitespace() {
            lexer.lex_while(TokKind::Ws, char::is_whitespace)
        } else if c == '/' && lexer.peek_at(1) == '/' {
            lexer.lex_line_comment()
        } else if c == '/' && lexer.peek_at(1) == '*' {
            lexer.lex_block_comment()?
        } else if c == '/' && regex_allowed(&tokens) {
            lexer.lex_regex()
        } else if c == '"' || c == '\'' {
            lexer.lex_string(c)?
        } else if c == '`' {
            lexer.lex_template()?
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            lexer.lex_while(TokKind::Ident, |c| {
                c.is_alphanumeric() || c == '_' || c == '$'
            })
        } else if c.is_ascii_digit() {
            lexer.lex_while(TokKind::Num, |c| {
                c.is_ascii_alphanumeric() || c == '.' || c == '_'
            })
        } else {
            lexer.lex_punct()
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn regex_allowed(tokens: &[Token]) -> bool {
    for token in tokens.iter().rev() {
        if !token.is_sig() {
            continue;
        }
        return match token.kind {
            TokKind::Punct => !matches!(token.text.as_str(), ")" | "]"),
            TokKind::Ident => REGEX_KEYWORDS.contains(&token.text.as_str()),
            _ => false,
        };
    }
    true
}

impl Lexer {
    fn lex_while(&mut self, kind: TokKind, keep: impl Fn(char) -> bool) -> Token {
        let start = self.pos;
        while !self.is_at_end() && keep(self.peek()) {
            self.pos += 1;
        }
        self.token(kind, start)
    }

    fn lex_line_comment(&mut self) -> Token {
        let start = self.pos;
        while !self.is_at_end() && self.peek() != '\n' {
            self.pos += 1;
        }
        self.token(TokKind::Comment, start)
    }

    fn lex_block_comment(&mut self) -> Result<Token, TransformError> {
        let start = self.pos;
        self.pos += 2;
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_at(1) == '/' {
                self.pos += 2;
                return Ok(self.token(TokKind::Comment, start));
            }
            self.pos += 1;
        }
        Err(TransformError::Script("unterminated comment".to_string()))
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, TransformError> {
        let start = self.pos;
        self.pos += 1;
        while !self.is_at_end() {
            let c = self.peek();
            self.pos += 1;
            if c == '\\' {
                self.pos += 1;
            } else if c == quote {
                return Ok(self.token(TokKind::Str, start));
            } else if c == '\n' {
                break;
            }
        }
        Err(TransformError::Script("unterminated string literal".to_string()))
    }

    fn lex_template(&mut self) -> Result<Token, TransformError> {
        let start = self.pos;
        self.pos += 1;
        while !self.is_at_end() {
            let c = self.peek();
            if c == '\\' {
                self.pos += 2;
            } else if c == '`' {
                self.pos += 1;
                return Ok(self.token(TokKind::Template, start));
            } else if c == '$' && self.peek_at(1) == '{' {
                self.pos += 2;
                self.skip_hole()?;
            } else {
                self.pos += 1;
            }
        }
        Err(TransformError::Script("unterminated template literal".to_string()))
    }

    /// Skip a `${...}` hole, which may itself contain strings, comments and
    /// nested templates.
    fn skip_hole(&mut self) -> Result<(), TransformError> {
        let mut depth = 1usize;
        while !self.is_at_end() {
            let c = self.peek();
            if c == '\\' {
                self.pos += 2;
            } else if c == '"' || c == '\'' {
                self.lex_string(c)?;
            } else if c == '`' {
                self.lex_template()?;
            } else if c == '/' && self.peek_at(1) == '*' {
                self.lex_block_comment()?;
            } else if c == '{' {
                depth += 1;
                self.pos += 1;
            } else if c == '}' {
                depth -= 1;
                self.pos += 1;
                if depth == 0 {
                    return Ok(());
                }
            } else {
                self.pos += 1;
            }
        }
        Err(TransformError::Script("unterminated template hole".to_string()))
    }

    fn lex_regex(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while !self.is_at_end() {
            let c = self.peek();
            self.pos += 1;
            match c {
                '\\' => self.pos += 1,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                '\n' => break,
                _ => {}
            }
        }
        while !self.is_at_end() && self.peek().is_ascii_alphabetic() {
            self.pos += 1;
        }
        self.token(TokKind::Regex, start)
    }

    fn lex_punct(&mut self) -> Token {
        let start = self.pos;
        let rest: String = self.chars[self.pos..self.chars.len().min(self.pos + 4)]
            .iter()
            .collect();

        let width = PUNCT4
            .iter()
            .find(|op| rest.starts_with(**op))
            .map(|_| 4)
            .or_else(|| PUNCT3.iter().find(|op| rest.starts_with(**op)).map(|_| 3))
            .or_else(|| PUNCT2.iter().find(|op| rest.starts_with(**op)).map(|_| 2))
            .unwrap_or(1);

        self.pos += width;
        self.token(TokKind::Punct, start)
    }

    fn token(&self, kind: TokKind, start: usize) -> Token {
        Token {
            kind,
            text: self.chars[start..self.pos].iter().collect(),
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
    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn match_brackets(tokens: &[Token]) -> Result<HashMap<usize, usize>, TransformError> {
    let mut map = HashMap::new();
    let mut stack: Vec<(usize, char)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokKind::Punct {
            continue;
        }
        match token.text.as_str() {
            "(" | "[" | "{" => stack.push((i, token.text.chars().next().unwrap_or('('))),
            ")" | "]" | "}" => {
                let close = token.text.chars().next().unwrap_or(')');
                let expected = match close {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, c)) if c == expected => {
                        map.insert(open, i);
                        map.insert(i, open);
                    }
                    _ => {
                        return Err(TransformError::Script(format!(
                            "unbalanced '{close}'"
                        )))
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((_, c)) = stack.pop() {
        return Err(TransformError::Script(format!("unclosed '{c}'")));
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Erasing

struct Eraser {
    tokens: Vec<Token>,
    match_of: HashMap<usize, usize>,
    removed: Vec<bool>,
    inserts: Vec<(usize, String)>,
    class_bodies: HashSet<usize>,
}

impl Eraser {
    fn new(tokens: Vec<Token>, match_of: HashMap<usize, usize>) -> Self {
        let removed = vec![false; tokens.len()];
        Self {
            tokens,
            match_of,
            removed,
            inserts: Vec::new(),
            class_bodies: HashSet::new(),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn run(mut self) -> Result<String, TransformError> {
        let len = self.tokens.len();
        let mut brace_stack: Vec<usize> = Vec::new();
        let mut stmt_first: Option<String> = None;
        let mut suppress_member = false;
        let mut i = 0;

        while i < len {
            if self.removed[i] || !self.tokens[i].is_sig() {
                i += 1;
                continue;
            }

            let text = self.tokens[i].text.clone();
            let kind = self.tokens[i].kind;
            let member_level = brace_stack
                .last()
                .is_some_and(|open| self.class_bodies.contains(open));
            let decl_position = self.at_decl_position(i);

            if stmt_first.is_none() {
                stmt_first = Some(text.clone());
            }

            match (kind, text.as_str()) {
                (TokKind::Punct, "{") => {
                    brace_stack.push(i);
                    // Import/export braces are binding lists, not blocks; the
                    // statement (and its `as` aliases) continues past them.
                    if !matches!(stmt_first.as_deref(), Some("import" | "export")) {
                        stmt_first = None;
                    }
                    suppress_member = false;
                }
                (TokKind::Punct, "}") => {
                    brace_stack.pop();
                    if !matches!(stmt_first.as_deref(), Some("import" | "export")) {
                        stmt_first = None;
                    }
                    suppress_member = false;
                }
                (TokKind::Punct, ";") => {
                    stmt_first = None;
                    suppress_member = false;
                }
                (TokKind::Ident, "interface") if decl_position => {
                    self.erase_interface(i);
                    stmt_first = None;
                }
                (TokKind::Ident, "type") if decl_position && self.is_type_alias(i) => {
                    self.erase_until_semicolon(self.decl_start(i));
                    stmt_first = None;
                }
                (TokKind::Ident, "import") if self.is_type_only_import(i) => {
                    self.erase_until_semicolon(i);
                    stmt_first = None;
                }
                (TokKind::Ident, "export") if self.is_type_only_export(i) => {
                    self.erase_until_semicolon(i);
                    stmt_first = None;
                }
                (TokKind::Ident, "declare") if decl_position => {
                    self.erase_declare(i);
                    stmt_first = None;
                }
                (TokKind::Ident, "abstract")
                    if decl_position && self.next_sig_is(i, "class") =>
                {
                    self.mark_with_trailing_ws(i, i + 1);
                }
                (TokKind::Ident, "enum") if decl_position || self.prev_sig_is(i, "const") => {
                    self.erase_enum(i)?;
                    stmt_first = None;
                }
                (TokKind::Ident, "class") if !self.prev_sig_is(i, ".") => {
                    self.process_class_header(i);
                }
                (TokKind::Ident, "const" | "let" | "var") => {
                    self.process_declarators(i);
                }
                (TokKind::Ident, "as")
                    if stmt_first.as_deref() != Some("import")
                        && stmt_first.as_deref() != Some("export")
                        && self.prev_is_value(i) =>
                {
                    let end = self.consume_type(i + 1);
                    self.mark_with_leading_ws(i, end);
                }
                (TokKind::Ident, _)
                    if member_level
                        && !suppress_member
                        && MEMBER_MODIFIERS.contains(&text.as_str())
                        && self.next_starts_member(i) =>
                {
                    self.mark_with_trailing_ws(i, i + 1);
                }
                (TokKind::Punct, "=") if member_level => {
                    suppress_member = true;
                }
                (TokKind::Punct, "?")
                    if member_level
                        && !suppress_member
                        && self.next_sig_in(i, &[":", "("]) =>
                {
                    self.mark_with_leading_ws(i, i + 1);
                }
                (TokKind::Punct, "!")
                    if self.prev_is_value(i)
                        && self.next_sig_in(i, &[".", "(", ")", ",", ";", "]", "}", ":"]) =>
                {
                    self.mark_with_leading_ws(i, i + 1);
                }
                (TokKind::Punct, ":")
                    if member_level && !suppress_member && self.prev_sig_kind_is_ident(i) =>
                {
                    let end = self.consume_type(i + 1);
                    self.mark_with_leading_ws(i, end);
                }
                (TokKind::Punct, "(") => {
                    self.process_paren_group(i, member_level);
                }
                (TokKind::Punct, "<") => {
                    self.process_angle(i);
                }
                _ => {}
            }

            i += 1;
        }

        Ok(self.assemble())
    }

    fn assemble(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            for (at, text) in &self.inserts {
                if *at == i {
                    out.push_str(text);
                }
            }
            if !self.removed[i] {
                out.push_str(&token.text);
            }
        }
        for (at, text) in &self.inserts {
            if *at >= self.tokens.len() {
                out.push_str(text);
            }
        }
        out
    }

    // -- navigation ---------------------------------------------------------

    fn next_sig(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len())
            .find(|&i| !self.removed[i] && self.tokens[i].is_sig())
    }

    fn prev_sig(&self, from: usize) -> Option<usize> {
        (0..from)
            .rev()
            .find(|&i| !self.removed[i] && self.tokens[i].is_sig())
    }

    fn sig_text(&self, i: Option<usize>) -> Option<&str> {
        i.map(|i| self.tokens[i].text.as_str())
    }

    fn next_sig_is(&self, i: usize, text: &str) -> bool {
        self.sig_text(self.next_sig(i + 1)) == Some(text)
    }

    fn next_sig_in(&self, i: usize, set: &[&str]) -> bool {
        self.sig_text(self.next_sig(i + 1))
            .is_some_and(|t| set.contains(&t))
    }

    fn prev_sig_is(&self, i: usize, text: &str) -> bool {
        self.sig_text(self.prev_sig(i)) == Some(text)
    }

    fn prev_sig_kind_is_ident(&self, i: usize) -> bool {
        self.prev_sig(i)
            .is_some_and(|p| self.tokens[p].kind == TokKind::Ident)
    }

    fn prev_is_value(&self, i: usize) -> bool {
        self.prev_sig(i).is_some_and(|p| {
            matches!(
                self.tokens[p].kind,
                TokKind::Ident | TokKind::Num | TokKind::Str | TokKind::Template
            ) || matches!(self.tokens[p].text.as_str(), ")" | "]")
        })
    }

    fn at_decl_position(&self, i: usize) -> bool {
        match self.prev_sig(i) {
            None => true,
            Some(p) => matches!(self.tokens[p].text.as_str(), ";" | "{" | "}" | "export" | "default"),
        }
    }

    /// Start index for a declaration removal: pulls in a directly preceding
    /// `export` so it is not left dangling.
    fn decl_start(&self, i: usize) -> usize {
        match self.prev_sig(i) {
            Some(p) if self.tokens[p].text == "export" => p,
            _ => i,
        }
    }

    // -- marking ------------------------------------------------------------

    fn mark(&mut self, from: usize, to_exclusive: usize) {
        for i in from..to_exclusive.min(self.tokens.len()) {
            self.removed[i] = true;
        }
    }

    fn mark_with_leading_ws(&mut self, from: usize, to_exclusive: usize) {
        let mut start = from;
        while start > 0 && self.tokens[start - 1].kind == TokKind::Ws {
            start -= 1;
        }
        self.mark(start, to_exclusive);
    }

    fn mark_with_trailing_ws(&mut self, from: usize, to_exclusive: usize) {
        let mut end = to_exclusive;
        while end < self.tokens.len() && self.tokens[end].kind == TokKind::Ws {
            end += 1;
        }
        self.mark(from, end);
    }

    // -- declaration erasure ------------------------------------------------

    fn erase_interface(&mut self, i: usize) {
        let start = self.decl_start(i);
        let mut j = i + 1;
        while let Some(s) = self.next_sig(j) {
            match self.tokens[s].text.as_str() {
                "{" => {
                    let close = self.match_of.get(&s).copied().unwrap_or(s);
                    self.mark(start, close + 1);
                    return;
                }
                "<" => {
                    j = self.angle_close(s).map_or(s + 1, |c| c + 1);
                }
                _ => j = s + 1,
            }
        }
        self.mark(start, self.tokens.len());
    }

    fn is_type_alias(&self, i: usize) -> bool {
        let Some(name) = self.next_sig(i + 1) else {
            return false;
        };
        if self.tokens[name].kind != TokKind::Ident {
            return false;
        }
        matches!(self.sig_text(self.next_sig(name + 1)), Some("=" | "<"))
    }

    fn is_type_only_import(&self, i: usize) -> bool {
        let Some(t) = self.next_sig(i + 1) else {
            return false;
        };
        if self.tokens[t].text != "type" {
            return false;
        }
        !matches!(self.sig_text(self.next_sig(t + 1)), Some("from"))
    }

    fn is_type_only_export(&self, i: usize) -> bool {
        let Some(t) = self.next_sig(i + 1) else {
            return false;
        };
        self.tokens[t].text == "type"
            && matches!(self.sig_text(self.next_sig(t + 1)), Some("{" | "*"))
    }

    /// Remove from `start` through the terminating `;` (or to end of input),
    /// skipping over balanced groups and generic argument lists.
    fn erase_until_semicolon(&mut self, start: usize) {
        let mut j = start;
        while let Some(s) = self.next_sig(j) {
            match self.tokens[s].text.as_str() {
                ";" => {
                    self.mark(start, s + 1);
                    return;
                }
                "(" | "[" | "{" => {
                    j = self.match_of.get(&s).copied().unwrap_or(s) + 1;
                }
                "<" => {
                    j = self.angle_close(s).map_or(s + 1, |c| c + 1);
                }
                _ => j = s + 1,
            }
        }
        self.mark(start, self.tokens.len());
    }

    fn erase_declare(&mut self, i: usize) {
        let mut j = i + 1;
        while let Some(s) = self.next_sig(j) {
            match self.tokens[s].text.as_str() {
                ";" => {
                    self.mark(i, s + 1);
                    return;
                }
                "{" => {
                    let close = self.match_of.get(&s).copied().unwrap_or(s);
                    self.mark(i, close + 1);
                    return;
                }
                _ => j = s + 1,
            }
        }
        self.mark(i, self.tokens.len());
    }

    fn erase_enum(&mut self, i: usize) -> Result<(), TransformError> {
        let start = match self.prev_sig(i) {
            Some(p) if self.tokens[p].text == "const" => p,
            _ => i,
        };

        let Some(name_idx) = self.next_sig(i + 1) else {
            return Ok(());
        };
        let name = self.tokens[name_idx].text.clone();
        let Some(open) = self.next_sig(name_idx + 1) else {
            return Ok(());
        };
        if self.tokens[open].text != "{" {
            return Ok(());
        }
        let close = self.match_of.get(&open).copied().ok_or_else(|| {
            TransformError::Script(format!("unbalanced enum body for {name}"))
        })?;

        let mut entries: Vec<String> = Vec::new();
        let mut counter: i64 = 0;
        let mut j = open + 1;
        while let Some(s) = self.next_sig(j) {
            if s >= close {
                break;
            }
            let member = self.tokens[s].text.clone();
            let mut value: Option<String> = None;
            j = s + 1;

            if let Some(eq) = self.next_sig(j) {
                if eq < close && self.tokens[eq].text == "=" {
                    let mut text = String::new();
                    let mut k = eq + 1;
                    while k < close {
                        let tok = &self.tokens[k];
                        if tok.is_sig() && tok.text == "," {
                            break;
                        }
                        if let Some(&skip) = self.match_of.get(&k) {
                            for idx in k..=skip {
                                text.push_str(&self.tokens[idx].text);
                            }
                            k = skip + 1;
                            continue;
                        }
                        text.push_str(&tok.text);
                        k += 1;
                    }
                    value = Some(text.trim().to_string());
                    j = k;
                }
            }

            let rendered = match value {
                Some(v) => {
                    if let Ok(n) = v.parse::<i64>() {
                        counter = n + 1;
                    }
                    v
                }
                None => {
                    let v = counter.to_string();
                    counter += 1;
                    v
                }
            };
            entries.push(format!("{member}: {rendered}"));

            // Step past the separating comma, if any.
            if let Some(comma) = self.next_sig(j) {
                if comma < close && self.tokens[comma].text == "," {
                    j = comma + 1;
                }
            }
        }

        let replacement = format!("var {} = {{ {} }};", name, entries.join(", "));
        self.mark(start, close + 1);
        self.inserts.push((start, replacement));
        Ok(())
    }

    // -- class handling -----------------------------------------------------

    fn process_class_header(&mut self, i: usize) {
        let mut j = i + 1;

        // Optional class name.
        if let Some(s) = self.next_sig(j) {
            if self.tokens[s].kind == TokKind::Ident
                && !matches!(self.tokens[s].text.as_str(), "extends" | "implements")
            {
                j = s + 1;
            }
        }

        loop {
            let Some(s) = self.next_sig(j) else { return };
            match self.tokens[s].text.as_str() {
                "<" => {
                    if let Some(close) = self.angle_close(s) {
                        self.mark_with_leading_ws(s, close + 1);
                        j = close + 1;
                    } else {
                        j = s + 1;
                    }
                }
                "extends" => j = s + 1,
                "implements" => {
                    let mut last = s;
                    let mut k = s + 1;
                    while let Some(t) = self.next_sig(k) {
                        if self.tokens[t].text == "{" {
                            break;
                        }
                        last = t;
                        k = t + 1;
                    }
                    self.mark_with_leading_ws(s, last + 1);
                    j = last + 1;
                }
                "{" => {
                    self.class_bodies.insert(s);
                    return;
                }
                "(" | "[" => {
                    j = self.match_of.get(&s).copied().unwrap_or(s) + 1;
                }
                _ => j = s + 1,
            }
        }
    }

    fn next_starts_member(&self, i: usize) -> bool {
        self.next_sig(i + 1).is_some_and(|n| {
            matches!(self.tokens[n].kind, TokKind::Ident | TokKind::Str)
                || matches!(self.tokens[n].text.as_str(), "[" | "*")
        })
    }

    // -- parameter lists ----------------------------------------------------

    fn process_paren_group(&mut self, i: usize, member_level: bool) {
        let Some(&close) = self.match_of.get(&i) else {
            return;
        };
        if !self.is_param_list(i, close, member_level) {
            return;
        }

        let mut at_param_start = true;
        let mut in_default = false;
        let mut j = i + 1;

        while j < close {
            if self.removed[j] || !self.tokens[j].is_sig() {
                j += 1;
                continue;
            }
            let text = self.tokens[j].text.clone();
            match text.as_str() {
                "(" | "[" | "{" => {
                    j = self.match_of.get(&j).copied().unwrap_or(j) + 1;
                    at_param_start = false;
                    continue;
                }
                "," => {
                    at_param_start = true;
                    in_default = false;
                }
                "=" => in_default = true,
                "?" if !in_default && self.next_sig_in(j, &[":", ",", ")"]) => {
                    self.mark_with_leading_ws(j, j + 1);
                }
                ":" if !in_default => {
                    let end = self.consume_type(j + 1);
                    self.mark_with_leading_ws(j, end);
                    j = end;
                    continue;
                }
                "..." => {}
                _ => {
                    if at_param_start
                        && !in_default
                        && self.tokens[j].kind == TokKind::Ident
                        && PARAM_MODIFIERS.contains(&text.as_str())
                        && self.next_sig(j + 1).is_some_and(|n| {
                            n < close
                                && (self.tokens[n].kind == TokKind::Ident
                                    || matches!(self.tokens[n].text.as_str(), "{" | "["))
                        })
                    {
                        self.mark_with_trailing_ws(j, j + 1);
                    } else {
                        at_param_start = false;
                    }
                }
            }
            j += 1;
        }

        // Return annotation after the closing paren.
        if let Some(c) = self.next_sig(close + 1) {
            if self.tokens[c].text == ":" {
                let end = self.consume_type(c + 1);
                self.mark_with_leading_ws(c, end);
            }
        }
    }

    fn is_param_list(&self, i: usize, close: usize, member_level: bool) -> bool {
        let prev = self.prev_sig(i);
        let prev_text = self.sig_text(prev);

        if prev_text == Some("function") {
            return true;
        }
        let prev_is_name = prev.is_some_and(|p| self.tokens[p].kind == TokKind::Ident)
            && !matches!(
                prev_text,
                Some("if" | "for" | "while" | "switch" | "catch" | "return" | "typeof" | "new"
                    | "in" | "of" | "do" | "else" | "void" | "delete" | "await" | "yield")
            );
        if prev_is_name {
            let prev2 = prev.and_then(|p| self.prev_sig(p));
            if self.sig_text(prev2) == Some("function") {
                return true;
            }
        }

        let after = self.next_sig(close + 1);
        match self.sig_text(after) {
            Some("=>") => true,
            Some(":") => {
                let end = self.consume_type(after.unwrap_or(close) + 1);
                match self.sig_text(self.next_sig(end)) {
                    Some("=>") => true,
                    Some("{") => member_level && prev_is_name,
                    _ => false,
                }
            }
            Some("{") => member_level && prev_is_name,
            _ => false,
        }
    }

    // -- types --------------------------------------------------------------

    /// Index just past a type expression beginning at `start`. Consumes
    /// prefixed operators, dotted paths, generic arguments, grouped and
    /// object types, array suffixes, and `|`/`&`/`=>` continuations.
    fn consume_type(&self, start: usize) -> usize {
        let mut i = start;

        loop {
            // Prefix operators.
            loop {
                let Some(s) = self.next_sig(i) else { return i };
                if self.tokens[s].kind == TokKind::Ident
                    && TYPE_PREFIXES.contains(&self.tokens[s].text.as_str())
                {
                    i = s + 1;
                } else {
                    break;
                }
            }

            let Some(s) = self.next_sig(i) else { return i };
            let tok = &self.tokens[s];

            let mut end = match (tok.kind, tok.text.as_str()) {
                (TokKind::Punct, "(" | "[" | "{") => {
                    self.match_of.get(&s).copied().unwrap_or(s) + 1
                }
                (TokKind::Punct, "-") => {
                    // Negative literal type.
                    self.next_sig(s + 1).map_or(s + 1, |n| n + 1)
                }
                (TokKind::Ident | TokKind::Num | TokKind::Str | TokKind::Template, _) => s + 1,
                _ => return i,
            };

            // Dotted paths and generic arguments.
            loop {
                let Some(n) = self.next_sig(end) else { break };
                match self.tokens[n].text.as_str() {
                    "." => {
                        let Some(part) = self.next_sig(n + 1) else { break };
                        end = part + 1;
                    }
                    "<" => match self.angle_close(n) {
                        Some(close) => end = close + 1,
                        None => break,
                    },
                    _ => break,
                }
            }

            // Array suffixes.
            while let Some(n) = self.next_sig(end) {
                if self.tokens[n].text == "[" {
                    match self.match_of.get(&n) {
                        Some(&close) => end = close + 1,
                        None => break,
                    }
                } else {
                    break;
                }
            }

            // Unions, intersections and function-type results.
            match self.sig_text(self.next_sig(end)) {
                Some("|" | "&" | "=>") => {
                    i = self.next_sig(end).map_or(end, |n| n + 1);
                }
                _ => return end,
            }
        }
    }

    /// Find the `>` matching the `<` at `open`, treating the contents as a
    /// type argument list. Returns `None` when the brackets do not balance
    /// or the contents could not be a type list, in which case the caller
    /// leaves the source alone.
    fn angle_close(&self, open: usize) -> Option<usize> {
        let mut depth: i64 = 1;
        let mut i = open + 1;

        while let Some(s) = self.next_sig(i) {
            let tok = &self.tokens[s];
            match (tok.kind, tok.text.as_str()) {
                (TokKind::Punct, "<") => depth += 1,
                (TokKind::Punct, "<<") => depth += 2,
                (TokKind::Punct, ">") => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(s);
                    }
                }
                (TokKind::Punct, ">>") => {
                    depth -= 2;
                    if depth == 0 {
                        return Some(s);
                    }
                    if depth < 0 {
                        return None;
                    }
                }
                (TokKind::Punct, ">>>") => {
                    depth -= 3;
                    if depth == 0 {
                        return Some(s);
                    }
                    if depth < 0 {
                        return None;
                    }
                }
                (TokKind::Punct, "(" | "[" | "{") => {
                    i = self.match_of.get(&s).copied()? + 1;
                    continue;
                }
                (TokKind::Punct, "," | "." | "|" | "&" | "=>" | "?" | ":" | "-" | "...") => {}
                (TokKind::Ident | TokKind::Num | TokKind::Str, _) => {}
                _ => return None,
            }
            i = s + 1;
        }
        None
    }

    fn process_angle(&mut self, i: usize) {
        let Some(prev) = self.prev_sig(i) else { return };
        if self.tokens[prev].kind != TokKind::Ident
            || REGEX_KEYWORDS.contains(&self.tokens[prev].text.as_str())
        {
            return;
        }
        let Some(close) = self.angle_close(i) else { return };

        let prev2 = self.prev_sig(prev);
        let declares = matches!(self.sig_text(prev2), Some("function" | "class"));
        let called = self.sig_text(self.next_sig(close + 1)) == Some("(");

        if declares || called {
            self.mark_with_leading_ws(i, close + 1);
        }
    }

    fn process_declarators(&mut self, i: usize) {
        if self.prev_sig_is(i, ".") {
            return;
        }
        let mut j = i + 1;

        loop {
            // Binding: identifier or destructuring pattern.
            let Some(binding) = self.next_sig(j) else { return };
            let mut k = match self.tokens[binding].text.as_str() {
                "{" | "[" => self.match_of.get(&binding).copied().unwrap_or(binding) + 1,
                _ if self.tokens[binding].kind == TokKind::Ident => binding + 1,
                _ => return,
            };

            if let Some(bang) = self.next_sig(k) {
                if self.tokens[bang].text == "!" {
                    self.mark_with_leading_ws(bang, bang + 1);
                    k = bang + 1;
                }
            }

            if let Some(colon) = self.next_sig(k) {
                if self.tokens[colon].text == ":" {
                    let end = self.consume_type(colon + 1);
                    self.mark_with_leading_ws(colon, end);
                    k = end;
                }
            }

            // Scan past any initializer for a following declarator.
            loop {
                let Some(s) = self.next_sig(k) else { return };
                match self.tokens[s].text.as_str() {
                    "(" | "[" | "{" => {
                        k = self.match_of.get(&s).copied().unwrap_or(s) + 1;
                    }
                    "," => {
                        j = s + 1;
                        break;
                    }
                    ";" => return,
                    _ => k = s + 1,
                }
            }
        }
    }
}
