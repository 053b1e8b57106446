//! Syntax Highlighting for the Editor Panels
//!
//! Tokenizes markup, styles and script for display. The tokenizers are
//! forgiving: unterminated strings, comments or tags simply run to the end
//! of the input, and the returned spans always cover the whole source.

use playground::Language;
use std::ops::Range;

/// A token type for syntax highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Tag delimiters and names: `<div`, `</p`, `>`
    Tag,
    /// Attribute names inside a tag
    Attribute,
    /// Quoted strings and attribute values
    String,
    /// Comments in any of the languages
    Comment,
    /// CSS selectors and at-rule preludes
    Selector,
    /// CSS property names
    Property,
    /// CSS values
    Value,
    /// Script keywords and CSS at-rules
    Keyword,
    /// Numeric literals
    Number,
    /// Braces, operators, `=` and friends
    Punctuation,
    /// Script identifiers
    Identifier,
    /// Markup text and whitespace
    Text,
}

/// A highlighted token: its kind and byte range in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

const JS_KEYWORDS: &[&str] = &[
    "async",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "null",
    "of",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "yield",
];

/// Tokenize `source` as the given language
pub fn tokenize(language: Language, source: &str) -> Vec<Token> {
    match language {
        Language::Html => tokenize_html(source),
        Language::Css => tokenize_css(source),
        Language::Javascript => tokenize_js(source),
    }
}

/// Byte cursor over the source.
///
/// Only ever stops on ASCII bytes or the end of input, so every span it
/// produces lies on char boundaries.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.src.as_bytes()[self.pos.min(self.src.len())..].starts_with(pattern.as_bytes())
    }

    fn eat_while(&mut self, f: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&f) {
            self.pos += 1;
        }
    }

    /// Consume one whole char.
    fn eat_char(&mut self) {
        let len = self.src[self.pos..]
            .chars()
            .next()
            .map_or(1, |c| c.len_utf8());
        self.pos += len;
    }

    /// Consume through the next `pattern`, or to the end.
    fn eat_through(&mut self, pattern: &str) {
        match self.src[self.pos..].find(pattern) {
            Some(i) => self.pos += i + pattern.len(),
            None => self.pos = self.src.len(),
        }
    }

    /// Consume a quoted string starting at the current quote byte.
    fn eat_quoted(&mut self, escapes: bool) {
        let Some(quote) = self.peek() else {
            return;
        };
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == quote {
                return;
            }
            if escapes && b == b'\\' && !self.done() {
                self.eat_char();
            }
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        if self.pos > start {
            self.tokens.push(Token {
                kind,
                span: start..self.pos,
            });
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':' || b >= 0x80
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Tokenize HTML markup
pub fn tokenize_html(source: &str) -> Vec<Token> {
    let mut s = Scanner::new(source);

    while !s.done() {
        let start = s.pos;

        if s.starts_with("<!--") {
            s.eat_through("-->");
            s.push(TokenKind::Comment, start);
            continue;
        }

        let opens_tag = s.peek() == Some(b'<')
            && s.peek_at(1)
                .is_some_and(|b| b.is_ascii_alphabetic() || b == b'/' || b == b'!');
        if opens_tag {
            s.pos += 1;
            if matches!(s.peek(), Some(b'/' | b'!')) {
                s.pos += 1;
            }
            s.eat_while(is_name_byte);
            s.push(TokenKind::Tag, start);
            scan_tag_body(&mut s);
            continue;
        }

        // Text up to the next '<' (a stray '<' is text too)
        if s.peek() == Some(b'<') {
            s.pos += 1;
        }
        s.eat_while(|b| b != b'<');
        s.push(TokenKind::Text, start);
    }

    s.tokens
}

/// Attributes and values up to the closing `>` of a tag
fn scan_tag_body(s: &mut Scanner) {
    while !s.done() {
        let start = s.pos;
        match s.peek() {
            Some(b'>') => {
                s.pos += 1;
                s.push(TokenKind::Tag, start);
                return;
            }
            Some(b'/') if s.peek_at(1) == Some(b'>') => {
                s.pos += 2;
                s.push(TokenKind::Tag, start);
                return;
            }
            // Unterminated tag: let the caller resync on the new one
            Some(b'<') => return,
            Some(b'"' | b'\'') => {
                s.eat_quoted(false);
                s.push(TokenKind::String, start);
            }
            Some(b'=') => {
                s.pos += 1;
                s.push(TokenKind::Punctuation, start);
            }
            Some(b) if b.is_ascii_whitespace() => {
                s.eat_while(|b| b.is_ascii_whitespace());
                s.push(TokenKind::Text, start);
            }
            _ => {
                s.eat_while(|b| {
                    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'' | b'<')
                });
                if s.pos == start {
                    s.eat_char();
                }
                s.push(TokenKind::Attribute, start);
            }
        }
    }
}

/// Tokenize a CSS stylesheet
pub fn tokenize_css(source: &str) -> Vec<Token> {
    let mut s = Scanner::new(source);
    // One entry per open brace: whether that block holds declarations
    let mut blocks: Vec<bool> = Vec::new();
    let mut at_rule = false;
    let mut in_value = false;

    while !s.done() {
        let start = s.pos;
        let in_declarations = blocks.last().copied().unwrap_or(false);

        if s.starts_with("/*") {
            s.eat_through("*/");
            s.push(TokenKind::Comment, start);
            continue;
        }

        match s.peek() {
            Some(b) if b.is_ascii_whitespace() => {
                s.eat_while(|b| b.is_ascii_whitespace());
                s.push(TokenKind::Text, start);
            }
            Some(b'"' | b'\'') => {
                s.eat_quoted(true);
                s.push(TokenKind::String, start);
            }
            Some(b'{') => {
                s.pos += 1;
                blocks.push(!at_rule);
                at_rule = false;
                in_value = false;
                s.push(TokenKind::Punctuation, start);
            }
            Some(b'}') => {
                s.pos += 1;
                blocks.pop();
                in_value = false;
                s.push(TokenKind::Punctuation, start);
            }
            Some(b';') => {
                s.pos += 1;
                at_rule = false;
                in_value = false;
                s.push(TokenKind::Punctuation, start);
            }
            Some(b':') if in_declarations && !in_value => {
                s.pos += 1;
                in_value = true;
                s.push(TokenKind::Punctuation, start);
            }
            Some(b'@') if !in_declarations => {
                s.pos += 1;
                s.eat_while(is_name_byte);
                at_rule = true;
                s.push(TokenKind::Keyword, start);
            }
            Some(b) if in_value && b.is_ascii_digit() => {
                s.eat_while(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'%');
                s.push(TokenKind::Number, start);
            }
            _ => {
                let kind = if in_value {
                    TokenKind::Value
                } else if in_declarations {
                    TokenKind::Property
                } else {
                    TokenKind::Selector
                };
                let stops_at_colon = in_declarations && !in_value;
                s.eat_while(|b| {
                    !b.is_ascii_whitespace()
                        && !matches!(b, b'{' | b'}' | b';' | b'"' | b'\'' | b'/')
                        && !(b == b':' && stops_at_colon)
                });
                if s.pos == start {
                    s.eat_char();
                }
                s.push(kind, start);
            }
        }
    }

    s.tokens
}

/// Tokenize JavaScript
pub fn tokenize_js(source: &str) -> Vec<Token> {
    let mut s = Scanner::new(source);

    while !s.done() {
        let start = s.pos;

        if s.starts_with("//") {
            s.eat_while(|b| b != b'\n');
            s.push(TokenKind::Comment, start);
            continue;
        }
        if s.starts_with("/*") {
            s.eat_through("*/");
            s.push(TokenKind::Comment, start);
            continue;
        }

        match s.peek() {
            Some(b) if b.is_ascii_whitespace() => {
                s.eat_while(|b| b.is_ascii_whitespace());
                s.push(TokenKind::Text, start);
            }
            Some(b'"' | b'\'' | b'`') => {
                s.eat_quoted(true);
                s.push(TokenKind::String, start);
            }
            Some(b) if b.is_ascii_digit() => {
                s.eat_while(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_');
                s.push(TokenKind::Number, start);
            }
            Some(b) if is_ident_byte(b) => {
                s.eat_while(is_ident_byte);
                let kind = if JS_KEYWORDS.contains(&&source[start..s.pos]) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                s.push(kind, start);
            }
            _ => {
                s.eat_char();
                s.push(TokenKind::Punctuation, start);
            }
        }
    }

    s.tokens
}
