use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::ast::{FormatKind, Node, Options, PluralKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    EmptyArgument,
    UnclosedBrace,
    MissingType,
    EmptyOptions,
    DuplicateSelector,
    MissingOther,
    UnclosedTag,
    MismatchedTag,
    InvalidExact,
    TrailingContent,
}

impl SyntaxErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::EmptyArgument => "empty-argument",
            Self::UnclosedBrace => "unclosed-brace",
            Self::MissingType => "missing-type",
            Self::EmptyOptions => "empty-options",
            Self::DuplicateSelector => "duplicate-selector",
            Self::MissingOther => "missing-other",
            Self::UnclosedTag => "unclosed-tag",
            Self::MismatchedTag => "mismatched-tag",
            Self::InvalidExact => "invalid-exact",
            Self::TrailingContent => "trailing-content",
        }
    }
}

/// Parse failure with a character offset into the source message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Require an `other` option in every plural/select node.
    pub require_other: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            require_other: true,
        }
    }
}

pub fn parse(input: &str) -> Result<Vec<Node>, SyntaxError> {
    parse_with(input, &ParseOptions::default())
}

pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Vec<Node>, SyntaxError> {
    parse_toplevel(input, options, false)
}

/// Parses one Gettext plural form. Identical to [`parse`] except that
/// `#` is a plural placeholder even at the top level, since the whole
/// form is implicitly a plural branch.
pub fn parse_plural_form(input: &str) -> Result<Vec<Node>, SyntaxError> {
    parse_toplevel(input, &ParseOptions::default(), true)
}

fn parse_toplevel(
    input: &str,
    options: &ParseOptions,
    in_plural: bool,
) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser::new(input, options);
    let nodes = parser.parse_message(in_plural)?;
    if let Some(ch) = parser.peek() {
        let message = if ch == '}' {
            "unmatched closing brace"
        } else {
            "unmatched closing tag"
        };
        let kind = if ch == '}' {
            SyntaxErrorKind::TrailingContent
        } else {
            SyntaxErrorKind::MismatchedTag
        };
        return Err(parser.error(kind, message));
    }
    Ok(nodes)
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &str, options: &'a ParseOptions) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            options,
        }
    }

    /// Parses a run of nodes, stopping at end of input, an unconsumed
    /// `}`, or an unconsumed `</`. The caller decides whether the stop
    /// character is legal.
    fn parse_message(&mut self, in_plural: bool) -> Result<Vec<Node>, SyntaxError> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '}' => break,
                '{' => {
                    flush_text(&mut nodes, &mut text);
                    self.pos += 1;
                    nodes.push(self.parse_argument(in_plural)?);
                }
                '#' if in_plural => {
                    flush_text(&mut nodes, &mut text);
                    self.pos += 1;
                    nodes.push(Node::Pound);
                }
                '<' => {
                    if self.peek_at(1) == Some('/') {
                        break;
                    }
                    if self.peek_at(1).is_some_and(is_tag_name_char) {
                        flush_text(&mut nodes, &mut text);
                        match self.parse_tag(in_plural)? {
                            Some(node) => nodes.push(node),
                            // Whitespace before `/>`: the run stays text.
                            None => {
                                self.pos += 1;
                                text.push('<');
                            }
                        }
                    } else {
                        self.pos += 1;
                        text.push('<');
                    }
                }
                '\'' => self.parse_quoted(in_plural, &mut text),
                _ => {
                    self.pos += 1;
                    text.push(ch);
                }
            }
        }
        flush_text(&mut nodes, &mut text);
        Ok(nodes)
    }

    /// Apostrophe handling: `''` is a literal apostrophe; an apostrophe
    /// immediately before a syntax character opens a verbatim run closed
    /// by the next unescaped apostrophe or end of input; anything else
    /// is a plain apostrophe.
    fn parse_quoted(&mut self, in_plural: bool, text: &mut String) {
        match self.peek_at(1) {
            Some('\'') => {
                self.pos += 2;
                text.push('\'');
            }
            Some(ch) if is_quotable(ch, in_plural) => {
                self.pos += 1;
                while let Some(ch) = self.peek() {
                    if ch == '\'' {
                        if self.peek_at(1) == Some('\'') {
                            self.pos += 2;
                            text.push('\'');
                        } else {
                            self.pos += 1;
                            break;
                        }
                    } else {
                        self.pos += 1;
                        text.push(ch);
                    }
                }
            }
            _ => {
                self.pos += 1;
                text.push('\'');
            }
        }
    }

    fn parse_argument(&mut self, in_plural: bool) -> Result<Node, SyntaxError> {
        self.skip_ws();
        let name = self.read_name();
        if name.is_empty() {
            return Err(self.error(SyntaxErrorKind::EmptyArgument, "missing argument name"));
        }
        self.skip_ws();
        match self.peek() {
            Some('}') => {
                self.pos += 1;
                Ok(Node::Argument(name))
            }
            Some(',') => {
                self.pos += 1;
                self.skip_ws();
                let type_word = self.read_word();
                if type_word.is_empty() {
                    return Err(self.error(SyntaxErrorKind::MissingType, "missing argument type"));
                }
                match type_word.as_str() {
                    "plural" => self.parse_plural(name, PluralKind::Cardinal),
                    "selectordinal" => self.parse_plural(name, PluralKind::Ordinal),
                    "select" => self.parse_select(name, in_plural),
                    _ => match FormatKind::from_keyword(&type_word) {
                        Some(kind) => self.parse_format(name, kind),
                        None => Err(self.error(
                            SyntaxErrorKind::MissingType,
                            "unsupported argument type",
                        )),
                    },
                }
            }
            None => Err(self.error(SyntaxErrorKind::UnclosedBrace, "unclosed argument")),
            Some(_) => Err(self.error(
                SyntaxErrorKind::UnclosedBrace,
                "expected `,` or `}` after argument name",
            )),
        }
    }

    fn parse_format(&mut self, name: String, kind: FormatKind) -> Result<Node, SyntaxError> {
        self.skip_ws();
        match self.peek() {
            Some('}') => {
                self.pos += 1;
                Ok(Node::Format {
                    kind,
                    name,
                    style: None,
                })
            }
            Some(',') => {
                self.pos += 1;
                let style = self.read_style()?;
                match self.peek() {
                    Some('}') => {
                        self.pos += 1;
                        Ok(Node::Format {
                            kind,
                            name,
                            style: Some(style),
                        })
                    }
                    _ => Err(self.error(SyntaxErrorKind::UnclosedBrace, "unclosed argument")),
                }
            }
            None => Err(self.error(SyntaxErrorKind::UnclosedBrace, "unclosed argument")),
            Some(_) => Err(self.error(
                SyntaxErrorKind::UnclosedBrace,
                "expected `,` or `}` after argument type",
            )),
        }
    }

    /// Styles are opaque: everything up to the matching close brace,
    /// honoring nested balanced braces and quoted segments.
    fn read_style(&mut self) -> Result<String, SyntaxError> {
        let mut style = String::new();
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                '\'' => {
                    style.push(ch);
                    self.pos += 1;
                    while let Some(ch) = self.peek() {
                        style.push(ch);
                        self.pos += 1;
                        if ch == '\'' {
                            break;
                        }
                    }
                }
                '{' => {
                    depth += 1;
                    style.push(ch);
                    self.pos += 1;
                }
                '}' if depth == 0 => break,
                '}' => {
                    depth -= 1;
                    style.push(ch);
                    self.pos += 1;
                }
                _ => {
                    style.push(ch);
                    self.pos += 1;
                }
            }
        }
        let style = style.trim().to_string();
        if style.is_empty() {
            return Err(self.error(SyntaxErrorKind::MissingType, "missing style"));
        }
        Ok(style)
    }

    fn parse_plural(&mut self, name: String, kind: PluralKind) -> Result<Node, SyntaxError> {
        self.expect_comma()?;
        self.skip_ws();
        let offset = if self.lookahead_word("offset") {
            self.pos += "offset".len();
            self.skip_ws();
            if self.peek() != Some(':') {
                return Err(self.error(SyntaxErrorKind::InvalidExact, "expected `:` after offset"));
            }
            self.pos += 1;
            self.skip_ws();
            let token = self.read_selector_token();
            token.parse::<i64>().map_err(|_| {
                self.error(SyntaxErrorKind::InvalidExact, "offset must be an integer")
            })?
        } else {
            0
        };
        let options = self.parse_options(true, true)?;
        self.finish_options(&options)?;
        self.pos += 1;
        Ok(Node::Plural {
            name,
            offset,
            kind,
            options,
        })
    }

    fn parse_select(&mut self, name: String, in_plural: bool) -> Result<Node, SyntaxError> {
        self.expect_comma()?;
        let options = self.parse_options(in_plural, false)?;
        self.finish_options(&options)?;
        self.pos += 1;
        Ok(Node::Select { name, options })
    }

    fn expect_comma(&mut self) -> Result<(), SyntaxError> {
        self.skip_ws();
        if self.peek() != Some(',') {
            return Err(self.error(
                SyntaxErrorKind::UnclosedBrace,
                "expected `,` before options",
            ));
        }
        self.pos += 1;
        Ok(())
    }

    fn parse_options(
        &mut self,
        sub_in_plural: bool,
        allow_exact: bool,
    ) -> Result<Options, SyntaxError> {
        let mut options = Options::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some('}') => break,
                _ => {}
            }
            let selector_offset = self.pos;
            let selector = self.read_selector_token();
            if selector.is_empty() {
                return Err(self.error(SyntaxErrorKind::UnclosedBrace, "expected selector"));
            }
            if let Some(exact) = selector.strip_prefix('=') {
                if !allow_exact || exact.parse::<i64>().is_err() {
                    return Err(SyntaxError {
                        kind: SyntaxErrorKind::InvalidExact,
                        message: "exact selector requires an integer".to_string(),
                        offset: selector_offset,
                    });
                }
            }
            if options.contains(&selector) {
                return Err(SyntaxError {
                    kind: SyntaxErrorKind::DuplicateSelector,
                    message: "duplicate selector".to_string(),
                    offset: selector_offset,
                });
            }
            self.skip_ws();
            if self.peek() != Some('{') {
                return Err(self.error(
                    SyntaxErrorKind::UnclosedBrace,
                    "expected `{` after selector",
                ));
            }
            self.pos += 1;
            let body = self.parse_message(sub_in_plural)?;
            if self.peek() != Some('}') {
                return Err(self.error(SyntaxErrorKind::UnclosedBrace, "unclosed option"));
            }
            self.pos += 1;
            options.push(selector, body);
        }
        Ok(options)
    }

    fn finish_options(&mut self, options: &Options) -> Result<(), SyntaxError> {
        if options.is_empty() {
            return Err(self.error(SyntaxErrorKind::EmptyOptions, "expected at least one option"));
        }
        if self.options.require_other && !options.contains("other") {
            return Err(self.error(SyntaxErrorKind::MissingOther, "missing `other` option"));
        }
        if self.peek() != Some('}') {
            return Err(self.error(SyntaxErrorKind::UnclosedBrace, "unclosed argument"));
        }
        Ok(())
    }

    fn parse_tag(&mut self, in_plural: bool) -> Result<Option<Node>, SyntaxError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.read_tag_name();
        match self.peek() {
            Some('/') if self.peek_at(1) == Some('>') => {
                self.pos += 2;
                Ok(Some(Node::Tag {
                    name,
                    children: Vec::new(),
                }))
            }
            Some('>') => {
                self.pos += 1;
                let children = self.parse_message(in_plural)?;
                if self.peek() == Some('<') && self.peek_at(1) == Some('/') {
                    self.pos += 2;
                    let close = self.read_tag_name();
                    if self.peek() != Some('>') {
                        return Err(self.error(SyntaxErrorKind::UnclosedTag, "unclosed tag"));
                    }
                    self.pos += 1;
                    if close != name {
                        return Err(SyntaxError {
                            kind: SyntaxErrorKind::MismatchedTag,
                            message: "mismatched closing tag".to_string(),
                            offset: start,
                        });
                    }
                    Ok(Some(Node::Tag { name, children }))
                } else {
                    Err(SyntaxError {
                        kind: SyntaxErrorKind::UnclosedTag,
                        message: "unclosed tag".to_string(),
                        offset: start,
                    })
                }
            }
            // `<br />` and other malformed opens fall back to text.
            _ => {
                self.pos = start;
                Ok(None)
            }
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, '{' | '}' | ',' | '\'' | '<' | '#') {
                break;
            }
            name.push(ch);
            self.pos += 1;
        }
        name
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if !ch.is_alphanumeric() {
                break;
            }
            word.push(ch);
            self.pos += 1;
        }
        word
    }

    fn read_selector_token(&mut self) -> String {
        let mut token = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, '{' | '}') {
                break;
            }
            token.push(ch);
            self.pos += 1;
        }
        token
    }

    fn read_tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if !is_tag_name_char(ch) {
                break;
            }
            name.push(ch);
            self.pos += 1;
        }
        name
    }

    fn lookahead_word(&self, word: &str) -> bool {
        for (idx, expected) in word.chars().enumerate() {
            if self.peek_at(idx) != Some(expected) {
                return false;
            }
        }
        // `offset` must be followed by `:` or whitespace, not more word.
        match self.peek_at(word.chars().count()) {
            Some(ch) => ch == ':' || ch.is_whitespace(),
            None => false,
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn error(&self, kind: SyntaxErrorKind, message: &str) -> SyntaxError {
        SyntaxError {
            kind,
            message: message.to_string(),
            offset: self.pos,
        }
    }
}

fn flush_text(nodes: &mut Vec<Node>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(Node::Literal(core::mem::take(text)));
    }
}

fn is_tag_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '.' | ':' | '_')
}

fn is_quotable(ch: char, in_plural: bool) -> bool {
    matches!(ch, '{' | '}' | '<' | '>') || (in_plural && ch == '#')
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{ParseOptions, SyntaxErrorKind, parse, parse_plural_form, parse_with};
    use crate::ast::{FormatKind, Node, PluralKind};

    #[test]
    fn parses_literal_and_argument() {
        let nodes = parse("Hello {name}!").expect("parse");
        assert_eq!(
            nodes,
            vec![
                Node::Literal("Hello ".to_string()),
                Node::Argument("name".to_string()),
                Node::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn parses_format_with_opaque_style() {
        let nodes = parse("{price, number, ::currency/EUR}").expect("parse");
        assert_eq!(
            nodes,
            vec![Node::Format {
                kind: FormatKind::Number,
                name: "price".to_string(),
                style: Some("::currency/EUR".to_string()),
            }]
        );
    }

    #[test]
    fn style_keeps_balanced_braces_and_quotes() {
        let nodes = parse("{d, date, h 'o''clock' {x}}").expect("parse");
        match &nodes[0] {
            Node::Format { style, .. } => {
                assert_eq!(style.as_deref(), Some("h 'o''clock' {x}"));
            }
            node => panic!("expected format node, got {node:?}"),
        }
    }

    #[test]
    fn parses_plural_with_offset_and_exact() {
        let nodes =
            parse("{n, plural, offset:1 =0 {nobody} one {# friend} other {# friends}}")
                .expect("parse");
        match &nodes[0] {
            Node::Plural {
                name,
                offset,
                kind,
                options,
            } => {
                assert_eq!(name, "n");
                assert_eq!(*offset, 1);
                assert_eq!(*kind, PluralKind::Cardinal);
                let keys: Vec<&str> = options.iter().map(|(key, _)| key).collect();
                assert_eq!(keys, vec!["=0", "one", "other"]);
                assert_eq!(options.get("one"), Some(&[
                    Node::Pound,
                    Node::Literal(" friend".to_string())
                ][..]));
            }
            node => panic!("expected plural node, got {node:?}"),
        }
    }

    #[test]
    fn pound_is_literal_outside_plural() {
        let nodes = parse("#1 {hash}").expect("parse");
        assert_eq!(nodes[0], Node::Literal("#1 ".to_string()));
    }

    #[test]
    fn plural_form_promotes_pound() {
        let nodes = parse_plural_form("# pliki").expect("parse");
        assert_eq!(
            nodes,
            vec![Node::Pound, Node::Literal(" pliki".to_string())]
        );
        assert_eq!(
            parse("# pliki").expect("parse"),
            vec![Node::Literal("# pliki".to_string())]
        );
    }

    #[test]
    fn pound_survives_nested_select() {
        let nodes = parse("{n, plural, other {{g, select, other {#}}}}").expect("parse");
        match &nodes[0] {
            Node::Plural { options, .. } => match &options.get("other").expect("other")[0] {
                Node::Select { options, .. } => {
                    assert_eq!(options.get("other"), Some(&[Node::Pound][..]));
                }
                node => panic!("expected select node, got {node:?}"),
            },
            node => panic!("expected plural node, got {node:?}"),
        }
    }

    #[test]
    fn missing_other_is_configurable() {
        let err = parse("{n, plural, one {one}}").expect_err("strict");
        assert_eq!(err.kind, SyntaxErrorKind::MissingOther);
        let relaxed = ParseOptions {
            require_other: false,
        };
        parse_with("{n, plural, one {one}}", &relaxed).expect("relaxed parse");
    }

    #[test]
    fn rejects_duplicate_selector() {
        let err = parse("{n, plural, one {a} one {b} other {c}}").expect_err("dup");
        assert_eq!(err.kind, SyntaxErrorKind::DuplicateSelector);
    }

    #[test]
    fn rejects_non_integer_exact() {
        let err = parse("{n, plural, =1.5 {x} other {y}}").expect_err("exact");
        assert_eq!(err.kind, SyntaxErrorKind::InvalidExact);
    }

    #[test]
    fn rejects_empty_argument_name() {
        let err = parse("{}").expect_err("empty");
        assert_eq!(err.kind, SyntaxErrorKind::EmptyArgument);
    }

    #[test]
    fn rejects_empty_option_set() {
        let err = parse("{n, select,}").expect_err("empty options");
        assert_eq!(err.kind, SyntaxErrorKind::EmptyOptions);
    }

    #[test]
    fn reports_trailing_brace() {
        let err = parse("done}").expect_err("trailing");
        assert_eq!(err.kind, SyntaxErrorKind::TrailingContent);
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn parses_tags_and_numeric_tag_names() {
        let nodes = parse("<0>bold <i>inner</i></0>").expect("parse");
        match &nodes[0] {
            Node::Tag { name, children } => {
                assert_eq!(name, "0");
                assert_eq!(children.len(), 2);
            }
            node => panic!("expected tag node, got {node:?}"),
        }
    }

    #[test]
    fn self_closing_tag_and_whitespace_quirk() {
        let nodes = parse("a<br/>b").expect("parse");
        assert_eq!(
            nodes,
            vec![
                Node::Literal("a".to_string()),
                Node::Tag {
                    name: "br".to_string(),
                    children: vec![],
                },
                Node::Literal("b".to_string()),
            ]
        );
        // Whitespace before `/>` keeps the run literal.
        let nodes = parse("a<br />b").expect("parse");
        assert_eq!(nodes, vec![Node::Literal("a<br />b".to_string())]);
    }

    #[test]
    fn mismatched_tag_is_an_error() {
        let err = parse("<b>text</i>").expect_err("mismatch");
        assert_eq!(err.kind, SyntaxErrorKind::MismatchedTag);
        let err = parse("<b>text").expect_err("unclosed");
        assert_eq!(err.kind, SyntaxErrorKind::UnclosedTag);
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse("1 < 2 > 0").expect("parse");
        assert_eq!(nodes, vec![Node::Literal("1 < 2 > 0".to_string())]);
    }

    #[test]
    fn quoting_rules() {
        assert_eq!(
            parse("it''s").expect("parse"),
            vec![Node::Literal("it's".to_string())]
        );
        assert_eq!(
            parse("'{not an arg}'").expect("parse"),
            vec![Node::Literal("{not an arg}".to_string())]
        );
        // Unterminated quoted runs degrade to literal text.
        assert_eq!(
            parse("'{rest of line").expect("parse"),
            vec![Node::Literal("{rest of line".to_string())]
        );
        // A lone apostrophe before ordinary text stays an apostrophe.
        assert_eq!(
            parse("l'heure").expect("parse"),
            vec![Node::Literal("l'heure".to_string())]
        );
    }

    #[test]
    fn parser_terminates_on_special_character_soup() {
        // Deterministic fuzz loop over the ICU syntax alphabet; the
        // parser must return without panicking on every input.
        let alphabet: Vec<char> =
            "{}<>#',=abc 019".chars().collect();
        let mut state = 0x2545f491u64;
        for _ in 0..4000 {
            let mut input = alloc::string::String::new();
            let len = (state % 24) as usize;
            for _ in 0..len {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let pick = (state >> 33) as usize % alphabet.len();
                input.push(alphabet[pick]);
            }
            let _ = parse(&input);
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        }
    }
}
