//
// test_blocks.rs
//
// Detection of test/suite blocks (describe(), it(), test.only(), ...) using tree-sitter
// and lookup of the innermost block enclosing a source offset
//

use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::str::Chars;
use tree_sitter::{Node, Tree};

/// Call names treated as test/suite blocks when none are configured.
pub const DEFAULT_BLOCK_IDENTIFIERS: &[&str] = &[
    "suite",
    "describe",
    "xdescribe",
    "fdescribe",
    "context",
    "test",
    "it",
    "fit",
    "xit",
];

/// A matched test or suite call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestBlock {
    /// Literal name of the block, `None` when it is not a plain string
    pub name: Option<String>,
    /// Names of the enclosing blocks, outermost first
    pub parent_names: Vec<Option<String>>,
    /// Byte offset of the first character of the call expression
    pub start: usize,
    /// Byte offset just past the closing parenthesis
    pub end: usize,
}

impl TestBlock {
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// True when this block's span lies inside `other`'s span (equal spans included).
    pub fn is_within(&self, other: &TestBlock) -> bool {
        self.start >= other.start && self.end <= other.end
    }

    pub fn depth(&self) -> usize {
        self.parent_names.len()
    }
}

/// Shape of a call's callee, as far as block matching is concerned
enum Callee<'a> {
    Identifier(&'a str),
    /// `object.property`; carries the object expression
    PropertyAccess(Node<'a>),
    Other,
}

fn classify_callee<'a>(node: Node<'a>, content: &'a str) -> Callee<'a> {
    match node.kind() {
        "identifier" => Callee::Identifier(node_text(node, content)),
        "member_expression" => match node.child_by_field_name("object") {
            Some(object) => Callee::PropertyAccess(object),
            None => Callee::Other,
        },
        _ => Callee::Other,
    }
}

/// Extract all test/suite blocks whose callee resolves to one of `identifiers`.
///
/// Blocks are returned in document (pre-order) order. Every node of the tree is
/// visited, so blocks nested inside helper functions or other non-matching
/// expressions are found too. Calls whose name cannot be determined still
/// produce a block with `name: None`.
pub fn extract_test_blocks<S: AsRef<str>>(
    tree: &Tree,
    content: &str,
    identifiers: &[S],
) -> Vec<TestBlock> {
    log::trace!("Starting test block detection");
    let mut blocks = Vec::new();
    let root = tree.root_node();
    for child in root.children(&mut root.walk()) {
        visit_node(child, content, identifiers, &[], &mut blocks);
    }
    log::trace!("Completed test block detection, found {} blocks", blocks.len());
    for block in &blocks {
        log::trace!(
            "  Detected block {:?} at {}..{} (parents: {:?})",
            block.name,
            block.start,
            block.end,
            block.parent_names
        );
    }
    blocks
}

fn visit_node<S: AsRef<str>>(
    node: Node,
    content: &str,
    identifiers: &[S],
    parent_names: &[Option<String>],
    blocks: &mut Vec<TestBlock>,
) {
    let mut child_parent_names = None;

    if node.kind() == "call_expression" && is_matching_call(node, content, identifiers) {
        let name = first_literal_argument(node, content);
        blocks.push(TestBlock {
            name: name.clone(),
            parent_names: parent_names.to_vec(),
            start: node.start_byte(),
            end: node.end_byte(),
        });
        let mut names = parent_names.to_vec();
        names.push(name);
        child_parent_names = Some(names);
    }

    let parent_names = child_parent_names.as_deref().unwrap_or(parent_names);
    for child in node.children(&mut node.walk()) {
        visit_node(child, content, identifiers, parent_names, blocks);
    }
}

/// A call matches when its callee is a configured identifier, or a property
/// access chain (`it.only`, `test.cb.skip`) whose leftmost base is one.
/// Tagged templates (`` it`x` ``) parse as calls but are not matched.
fn is_matching_call<S: AsRef<str>>(node: Node, content: &str, identifiers: &[S]) -> bool {
    let Some(callee) = node.child_by_field_name("function") else {
        return false;
    };
    let has_argument_list = node
        .child_by_field_name("arguments")
        .is_some_and(|args| args.kind() == "arguments");
    if !has_argument_list {
        return false;
    }
    match leftmost_identifier(callee, content) {
        Some(name) => identifiers.iter().any(|id| id.as_ref() == name),
        None => false,
    }
}

fn leftmost_identifier<'a>(callee: Node<'a>, content: &'a str) -> Option<&'a str> {
    let mut current = callee;
    loop {
        match classify_callee(current, content) {
            Callee::Identifier(name) => return Some(name),
            Callee::PropertyAccess(object) => current = object,
            Callee::Other => return None,
        }
    }
}

/// Text of the first argument that is a string literal or a template literal
/// without substitutions.
fn first_literal_argument(node: Node, content: &str) -> Option<String> {
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    for arg in args.named_children(&mut cursor) {
        if arg.is_extra() {
            continue;
        }
        let is_literal = match arg.kind() {
            "string" => true,
            "template_string" => !has_substitution(arg),
            _ => false,
        };
        if is_literal {
            return Some(unescape_js(literal_inner(node_text(arg, content))));
        }
    }
    None
}

fn has_substitution(template: Node) -> bool {
    let mut cursor = template.walk();
    let found = template
        .named_children(&mut cursor)
        .any(|child| child.kind() == "template_substitution");
    found
}

/// Strip the opening and closing delimiter from a literal's source text.
fn literal_inner(text: &str) -> &str {
    let Some(open) = text.chars().next() else {
        return text;
    };
    let rest = &text[open.len_utf8()..];
    rest.strip_suffix(open).unwrap_or(rest)
}

/// Decode JavaScript escape sequences in a literal body.
fn unescape_js(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => match read_hex(&mut chars, 2).and_then(char::from_u32) {
                Some(c) => out.push(c),
                None => out.push('x'),
            },
            'u' => match read_unicode_escape(&mut chars) {
                Some(c) => out.push(c),
                None => out.push('u'),
            },
            // Line continuations
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    out
}

fn read_hex(chars: &mut Peekable<Chars>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars.peek()?.to_digit(16)?;
        chars.next();
        value = value * 16 + digit;
    }
    Some(value)
}

/// Read the part of a `\u` escape after the `u`: `XXXX` or `{X...}`.
/// Surrogate pairs written as two escapes are combined.
fn read_unicode_escape(chars: &mut Peekable<Chars>) -> Option<char> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut value = 0u32;
        loop {
            let c = chars.next()?;
            if c == '}' {
                break;
            }
            value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
        }
        return char::from_u32(value);
    }

    let unit = read_hex(chars, 4)?;
    if !(0xD800..=0xDBFF).contains(&unit) {
        return Some(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    let mut lookahead = chars.clone();
    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
        if let Some(low) = read_hex(&mut lookahead, 4) {
            if (0xDC00..=0xDFFF).contains(&low) {
                *chars = lookahead;
                let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined);
            }
        }
    }
    Some(char::REPLACEMENT_CHARACTER)
}

fn node_text<'a>(node: Node<'a>, content: &'a str) -> &'a str {
    &content[node.byte_range()]
}

/// Find the most specific block whose span contains `offset`.
///
/// A candidate replaces the current best when its span lies within (or equals)
/// the best span, so among blocks with identical spans the last one wins.
pub fn find_enclosing_block(blocks: &[TestBlock], offset: usize) -> Option<&TestBlock> {
    let mut found: Option<&TestBlock> = None;
    for block in blocks.iter().filter(|b| b.contains(offset)) {
        match found {
            Some(best) if !block.is_within(best) => {}
            _ => found = Some(block),
        }
    }
    found
}
