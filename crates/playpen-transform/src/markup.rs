//! Indentation-based markup rendering.
//!
//! Renders the indentation-based templating dialect (`.pug`) to literal
//! HTML. Supported forms: tag heads with `#id`, `.class` and `(attr="v")`
//! segments, implicit `div`, inline text, `|` text lines, `//` comments,
//! `//-` silent comments, trailing-`.` raw text blocks, `tag: child` block
//! expansion and `doctype`. Inline JavaScript (`- code`) and interpolation
//! are not rendered; hitting them is a reported error, not a panic.

use crate::error::TransformError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) fn render(source: &str) -> Result<String, TransformError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut out = String::new();
    // Open tags: (source indent, tag name, output indent).
    let mut stack: Vec<(usize, String, usize)> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        if raw.trim().is_empty() {
            i += 1;
            continue;
        }

        let indent = leading_whitespace(raw);
        let content = raw.trim_start();
        close_to(indent, &mut stack, &mut out);
        let depth = stack.len();

        if content.starts_with("//-") {
            i = skip_block(&lines, i, indent);
            continue;
        }

        if let Some(rest) = content.strip_prefix("//") {
            let (block, next) = collect_block(&lines, i, indent);
            push_indent(&mut out, depth);
            if block.is_empty() {
                out.push_str(&format!("<!--{rest} -->\n"));
            } else {
                out.push_str(&format!("<!--{rest}\n{}\n-->\n", block.join("\n")));
            }
            i = next;
            continue;
        }

        if content == "|" {
            i += 1;
            continue;
        }
        if let Some(text) = content.strip_prefix("| ") {
            push_indent(&mut out, depth);
            out.push_str(text);
            out.push('\n');
            i += 1;
            continue;
        }

        if content == "doctype" || content.starts_with("doctype ") {
            let kind = content.trim_start_matches("doctype").trim();
            if kind.is_empty() || kind.eq_ignore_ascii_case("html") {
                out.push_str("<!DOCTYPE html>\n");
            } else {
                out.push_str(&format!("<!DOCTYPE {kind}>\n"));
            }
            i += 1;
            continue;
        }

        if content.starts_with("- ") || content == "-" {
            return Err(TransformError::Markup(format!(
                "inline code is not supported: {content}"
            )));
        }

        let head = parse_tag_head(content)?;
        let tag = head.tag.clone();
        let is_void = VOID_ELEMENTS.contains(&tag.as_str());

        match head.trailer.clone() {
            Trailer::SelfClose => {
                push_indent(&mut out, depth);
                out.push_str(&render_open(&head, true));
                out.push('\n');
                i += 1;
            }
            Trailer::None if is_void => {
                push_indent(&mut out, depth);
                out.push_str(&render_open(&head, false));
                out.push('\n');
                i += 1;
            }
            Trailer::None => {
                push_indent(&mut out, depth);
                out.push_str(&render_open(&head, false));
                out.push('\n');
                stack.push((indent, tag, depth));
                i += 1;
            }
            Trailer::Inline(text) => {
                push_indent(&mut out, depth);
                if is_void {
                    out.push_str(&render_open(&head, false));
                } else {
                    out.push_str(&format!("{}{}</{}>", render_open(&head, false), text, tag));
                }
                out.push('\n');
                i += 1;
            }
            Trailer::TextBlock => {
                push_indent(&mut out, depth);
                out.push_str(&render_open(&head, false));
                out.push('\n');
                let (block, next) = collect_block(&lines, i, indent);
                for line in &block {
                    push_indent(&mut out, depth + 1);
                    out.push_str(line);
                    out.push('\n');
                }
                push_indent(&mut out, depth);
                out.push_str(&format!("</{tag}>\n"));
                i = next;
            }
            Trailer::Expansion(rest) => {
                push_indent(&mut out, depth);
                out.push_str(&format!(
                    "{}{}</{}>",
                    render_open(&head, false),
                    render_inline(&rest)?,
                    tag
                ));
                out.push('\n');
                i += 1;
            }
        }
    }

    close_to(0, &mut stack, &mut out);
    Ok(out)
}

#[derive(Clone)]
enum Trailer {
    None,
    SelfClose,
    TextBlock,
    Inline(String),
    Expansion(String),
}

struct TagHead {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    trailer: Trailer,
}

/// Render a `tag: child` expansion target as a one-line HTML fragment.
fn render_inline(content: &str) -> Result<String, TransformError> {
    if let Some(text) = content.strip_prefix("| ") {
        return Ok(text.to_string());
    }

    let head = parse_tag_head(content)?;
    let tag = head.tag.clone();
    if VOID_ELEMENTS.contains(&tag.as_str()) {
        return Ok(render_open(&head, false));
    }

    let inner = match head.trailer.clone() {
        Trailer::Inline(text) => text,
        Trailer::Expansion(rest) => render_inline(&rest)?,
        Trailer::SelfClose => return Ok(render_open(&head, true)),
        Trailer::None => String::new(),
        Trailer::TextBlock => {
            return Err(TransformError::Markup(
                "text block is not allowed after ':'".to_string(),
            ))
        }
    };

    Ok(format!("{}{}</{}>", render_open(&head, false), inner, tag))
}

fn parse_tag_head(content: &str) -> Result<TagHead, TransformError> {
    let chars: Vec<char> = content.chars().collect();
    let mut pos = 0;

    let tag = consume_name(&chars, &mut pos);
    if tag.is_empty() && !matches!(chars.first(), Some('.' | '#')) {
        return Err(TransformError::Markup(format!("unrecognized line: {content}")));
    }

    let mut head = TagHead {
        tag: if tag.is_empty() { "div".to_string() } else { tag },
        id: None,
        classes: Vec::new(),
        attrs: Vec::new(),
        trailer: Trailer::None,
    };

    loop {
        match chars.get(pos) {
            Some('.') if chars.get(pos + 1).is_some_and(|c| is_name_char(*c)) => {
                pos += 1;
                let class = consume_name(&chars, &mut pos);
                head.classes.push(class);
            }
            Some('#') => {
                pos += 1;
                let id = consume_name(&chars, &mut pos);
                if id.is_empty() {
                    return Err(TransformError::Markup("expected id after '#'".to_string()));
                }
                head.id = Some(id);
            }
            Some('(') => {
                pos += 1;
                parse_attributes(&chars, &mut pos, &mut head.attrs)?;
            }
            _ => break,
        }
    }

    head.trailer = match chars.get(pos) {
        None => Trailer::None,
        Some('.') if pos + 1 == chars.len() => Trailer::TextBlock,
        Some('/') if pos + 1 == chars.len() => Trailer::SelfClose,
        Some(':') => {
            let rest: String = chars[pos + 1..].iter().collect();
            Trailer::Expansion(rest.trim().to_string())
        }
        Some(' ') => {
            let rest: String = chars[pos + 1..].iter().collect();
            Trailer::Inline(rest)
        }
        Some(other) => {
            return Err(TransformError::Markup(format!(
                "unexpected '{other}' in tag line: {content}"
            )))
        }
    };

    Ok(head)
}

fn parse_attributes(
    chars: &[char],
    pos: &mut usize,
    attrs: &mut Vec<(String, Option<String>)>,
) -> Result<(), TransformError> {
    loop {
        while chars.get(*pos).is_some_and(|c| c.is_whitespace() || *c == ',') {
            *pos += 1;
        }
        match chars.get(*pos) {
            None => {
                return Err(TransformError::Markup(
                    "unterminated attribute list".to_string(),
                ))
            }
            Some(')') => {
                *pos += 1;
                return Ok(());
            }
            _ => {}
        }

        let name = consume_attr_name(chars, pos);
        if name.is_empty() {
            return Err(TransformError::Markup("expected attribute name".to_string()));
        }

        if chars.get(*pos) == Some(&'=') {
            *pos += 1;
            let value = consume_attr_value(chars, pos)?;
            attrs.push((name, Some(value)));
        } else {
            attrs.push((name, None));
        }
    }
}

fn consume_attr_value(chars: &[char], pos: &mut usize) -> Result<String, TransformError> {
    match chars.get(*pos) {
        Some(&quote @ ('"' | '\'')) => {
            *pos += 1;
            let mut value = String::new();
            loop {
                match chars.get(*pos) {
                    None => {
                        return Err(TransformError::Markup(
                            "unterminated attribute value".to_string(),
                        ))
                    }
                    Some(&c) if c == quote => {
                        *pos += 1;
                        return Ok(value);
                    }
                    Some(&c) => {
                        value.push(c);
                        *pos += 1;
                    }
                }
            }
        }
        _ => {
            // Unquoted value: copy up to the next separator verbatim.
            let mut value = String::new();
            while let Some(&c) = chars.get(*pos) {
                if c.is_whitespace() || c == ',' || c == ')' {
                    break;
                }
                value.push(c);
                *pos += 1;
            }
            Ok(value)
        }
    }
}

fn render_open(head: &TagHead, self_close: bool) -> String {
    let mut tag = format!("<{}", head.tag);

    if let Some(id) = &head.id {
        tag.push_str(&format!(" id=\"{id}\""));
    }

    let mut classes = head.classes.clone();
    let mut rendered_class = false;
    for (name, value) in &head.attrs {
        if name == "class" {
            if let Some(value) = value {
                classes.push(value.clone());
            }
            rendered_class = true;
        }
    }
    if !classes.is_empty() {
        tag.push_str(&format!(" class=\"{}\"", classes.join(" ")));
    }

    for (name, value) in &head.attrs {
        if name == "class" && (rendered_class || !classes.is_empty()) {
            continue;
        }
        match value {
            Some(value) => tag.push_str(&format!(" {name}=\"{value}\"")),
            None => tag.push_str(&format!(" {name}")),
        }
    }

    tag.push_str(if self_close { " />" } else { ">" });
    tag
}

/// Collect the raw lines of a block nested under line `start`, dedented to
/// the block's own base indentation. Returns the lines and the index of the
/// first line after the block.
fn collect_block(lines: &[&str], start: usize, indent: usize) -> (Vec<String>, usize) {
    let mut block = Vec::new();
    let mut i = start + 1;
    let mut base: Option<usize> = None;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            block.push(String::new());
            i += 1;
            continue;
        }
        let line_indent = leading_whitespace(line);
        if line_indent <= indent {
            break;
        }
        let base_indent = *base.get_or_insert(line_indent);
        let strip = base_indent.min(line_indent);
        block.push(chop_indent(line, strip));
        i += 1;
    }

    // Trailing blank lines belong to whatever follows, not the block.
    while block.last().is_some_and(String::is_empty) {
        block.pop();
    }

    (block, i)
}

fn skip_block(lines: &[&str], start: usize, indent: usize) -> usize {
    let (_, next) = collect_block(lines, start, indent);
    next
}

fn close_to(indent: usize, stack: &mut Vec<(usize, String, usize)>, out: &mut String) {
    while let Some((open_indent, tag, depth)) = stack.last().cloned() {
        if open_indent < indent {
            break;
        }
        stack.pop();
        push_indent(out, depth);
        out.push_str(&format!("</{tag}>\n"));
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn chop_indent(line: &str, count: usize) -> String {
    line.chars().skip(count).collect()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn consume_name(chars: &[char], pos: &mut usize) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.get(*pos) {
        if is_name_char(c) {
            name.push(c);
            *pos += 1;
        } else {
            break;
        }
    }
    name
}

fn consume_attr_name(chars: &[char], pos: &mut usize) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.get(*pos) {
        if is_name_char(c) || c == ':' || c == '@' {
            name.push(c);
            *pos += 1;
        } else {
            break;
        }
    }
    name
}
