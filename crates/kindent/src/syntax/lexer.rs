//! Tolerant Kotlin tokenizer.
//!
//! Every byte of the input lands in exactly one token, trivia included, so
//! token spans can be mapped straight back onto the document. Literals and
//! block comments that are still being typed are lexed as unterminated
//! tokens instead of failing; the only hard error is a character that has
//! no place in Kotlin outside a literal or comment.

use std::ops::Range;

use logos::{Lexer, Logos};

use crate::error::IndentError;

/// Whether a literal or block comment reached its closing delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Closed,
    Unclosed,
}

/// Token kinds produced by the logos lexer.
///
/// Soft keywords (`catch`, `import`, modifiers, ...) and most hard keywords
/// lex as [`TokenKind::Ident`]; see [`Keyword`] for their classification.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"[ \t\r\x0C\u{FEFF}]+")]
    Whitespace,

    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment(Termination),

    #[regex(r"#![^\n]*")]
    Shebang,

    #[token("\"", string_literal)]
    StringLit(Termination),

    #[regex(r"'([^'\\\n]|\\.)*'?")]
    CharLit,

    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9][0-9a-zA-Z_]*)?")]
    Number,

    #[regex(r"[_\p{L}][_\p{L}\p{N}]*")]
    #[regex(r"`[^`\n]*`")]
    Ident,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(".")]
    Dot,
    #[token("?.")]
    SafeDot,
    #[token("?:")]
    Elvis,
    #[token("..")]
    Range,
    #[token("..<")]
    RangeUntil,
    #[token("->")]
    Arrow,

    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,

    #[token("==")]
    EqEq,
    #[token("===")]
    EqEqEq,
    #[token("!=")]
    NotEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    #[token("!")]
    Bang,
    #[token("!!")]
    BangBang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("?")]
    Question,
    #[token("@")]
    At,
}

impl TokenKind {
    /// Whitespace, newlines and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment(_)
                | TokenKind::Shebang
        )
    }

    /// Tokens whose interior is opaque to indentation: a line break inside
    /// one of these must be left alone.
    pub fn is_literal_or_comment(self) -> bool {
        matches!(
            self,
            TokenKind::BlockComment(_) | TokenKind::StringLit(_) | TokenKind::CharLit
        )
    }

    pub fn is_opener(self) -> bool {
        matches!(self, TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace)
    }

    pub fn is_closer(self) -> bool {
        matches!(self, TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace)
    }

    /// The closing token matching an opening bracket.
    pub fn closer(self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            _ => None,
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
        )
    }

    /// Infix operators that leave an expression unfinished when they end a
    /// line. `>` and `*` are ambiguous and are refined by the caller.
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::AndAnd
                | TokenKind::OrOr
                | TokenKind::Elvis
                | TokenKind::EqEq
                | TokenKind::EqEqEq
                | TokenKind::NotEq
                | TokenKind::NotEqEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::Range
                | TokenKind::RangeUntil
        )
    }
}

/// A lexed token: its kind and byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Keyword classification for identifier tokens.
    pub fn keyword(&self, source: &str) -> Option<Keyword> {
        if self.kind == TokenKind::Ident {
            Keyword::from_text(self.text(source))
        } else {
            None
        }
    }
}

/// Tokenizes the whole document.
///
/// Fails with [`IndentError::MalformedContext`] at the first character that
/// cannot start any Kotlin token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, IndentError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                log::debug!("tokenize: no token matches at byte {}", span.start);
                return Err(IndentError::MalformedContext { offset: span.start });
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Literal scanning callbacks
// ============================================================================

fn block_comment(lex: &mut Lexer<'_, TokenKind>) -> Termination {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == b'/' && rest.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if rest[i] == b'*' && rest.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return Termination::Closed;
            }
        } else {
            i += 1;
        }
    }
    lex.bump(rest.len());
    Termination::Unclosed
}

fn string_literal(lex: &mut Lexer<'_, TokenKind>) -> Termination {
    let rest = lex.remainder();
    let (len, termination) = match rest.strip_prefix("\"\"") {
        Some(raw) => {
            let (len, termination) = scan_raw_string(raw);
            (len + 2, termination)
        }
        None => scan_line_string(rest),
    };
    lex.bump(len);
    termination
}

/// Scans a `"..."` body (opening quote already consumed). Stops before a
/// line break when the closing quote is missing.
fn scan_line_string(s: &str) -> (usize, Termination) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    return (i + 1, Termination::Unclosed);
                }
                i += 2;
            }
            b'"' => return (i + 1, Termination::Closed),
            b'\n' => return (i, Termination::Unclosed),
            b'$' if bytes.get(i + 1) == Some(&b'{') => match scan_template(&s[i + 2..]) {
                Some(len) => i += 2 + len,
                None => return (s.len(), Termination::Unclosed),
            },
            _ => i += 1,
        }
    }
    (s.len().min(i), Termination::Unclosed)
}

/// Scans a `"""..."""` body (opening quotes already consumed).
fn scan_raw_string(s: &str) -> (usize, Termination) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"\"\"\"") {
            i += 3;
            // Extra quotes before the delimiter belong to the content.
            while bytes.get(i) == Some(&b'"') {
                i += 1;
            }
            return (i, Termination::Closed);
        }
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            match scan_template(&s[i + 2..]) {
                Some(len) => i += 2 + len,
                None => return (s.len(), Termination::Unclosed),
            }
        } else {
            i += 1;
        }
    }
    (s.len(), Termination::Unclosed)
}

/// Scans a `${...}` template expression (the `${` already consumed) and
/// returns its length including the closing brace.
fn scan_template(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' => {
                let rest = &s[i + 1..];
                let (len, termination) = match rest.strip_prefix("\"\"") {
                    Some(raw) => {
                        let (len, termination) = scan_raw_string(raw);
                        (len + 2, termination)
                    }
                    None => scan_line_string(rest),
                };
                if termination == Termination::Unclosed {
                    return None;
                }
                i += 1 + len;
            }
            _ => i += 1,
        }
    }
    None
}

// ============================================================================
// Keywords
// ============================================================================

/// Hard and soft keywords that matter for indentation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Package,
    Import,
    Class,
    Interface,
    Object,
    Fun,
    Val,
    Var,
    Constructor,
    Init,
    Get,
    Set,
    If,
    Else,
    When,
    While,
    Do,
    For,
    Try,
    Catch,
    Finally,
    Return,
    Break,
    Continue,
    Throw,
    Is,
    As,
    In,
    By,
    Where,
    This,
    Super,
    Null,
    True,
    False,
    Typealias,
    /// Declaration modifier such as `private`, `override` or `enum`.
    Modifier(Modifier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Enum,
    Other,
}

impl Keyword {
    pub fn from_text(text: &str) -> Option<Keyword> {
        let keyword = match text {
            "package" => Keyword::Package,
            "import" => Keyword::Import,
            "class" => Keyword::Class,
            "interface" => Keyword::Interface,
            "object" => Keyword::Object,
            "fun" => Keyword::Fun,
            "val" => Keyword::Val,
            "var" => Keyword::Var,
            "constructor" => Keyword::Constructor,
            "init" => Keyword::Init,
            "get" => Keyword::Get,
            "set" => Keyword::Set,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "when" => Keyword::When,
            "while" => Keyword::While,
            "do" => Keyword::Do,
            "for" => Keyword::For,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "return" => Keyword::Return,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "throw" => Keyword::Throw,
            "is" => Keyword::Is,
            "as" => Keyword::As,
            "in" => Keyword::In,
            "by" => Keyword::By,
            "where" => Keyword::Where,
            "this" => Keyword::This,
            "super" => Keyword::Super,
            "null" => Keyword::Null,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "typealias" => Keyword::Typealias,
            "enum" => Keyword::Modifier(Modifier::Enum),
            "public" | "private" | "protected" | "internal" | "open" | "final" | "abstract"
            | "sealed" | "data" | "inner" | "override" | "lateinit" | "const" | "suspend"
            | "inline" | "noinline" | "crossinline" | "tailrec" | "operator" | "infix"
            | "external" | "annotation" | "companion" | "vararg" | "reified" | "expect"
            | "actual" | "value" => Keyword::Modifier(Modifier::Other),
            _ => return None,
        };
        Some(keyword)
    }

    /// Keywords that introduce a class-like declaration.
    pub fn is_class_like(self) -> bool {
        matches!(self, Keyword::Class | Keyword::Interface | Keyword::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("source should tokenize")
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokens_cover_every_byte() {
        let source = "val x = foo?.bar() ?: 1 // trailing\n/* block */ fun a() {}\n";
        let tokens = tokenize(source).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_byte_order_mark_is_trivia() {
        let source = "\u{FEFF}fun a() {\n}";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Whitespace);
        assert_eq!(tokens[0].span, 0..3);
        assert_eq!(tokens[1].keyword(source), Some(Keyword::Fun));
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("a?.b ?: c -> d .. e ..< f :: g"),
            vec![
                TokenKind::Ident,
                TokenKind::SafeDot,
                TokenKind::Ident,
                TokenKind::Elvis,
                TokenKind::Ident,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Range,
                TokenKind::Ident,
                TokenKind::RangeUntil,
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_range_between_numbers() {
        assert_eq!(
            kinds("1..10"),
            vec![TokenKind::Number, TokenKind::Range, TokenKind::Number]
        );
        assert_eq!(kinds("3.14"), vec![TokenKind::Number]);
    }

    #[test]
    fn test_nested_generics_do_not_merge_angle_brackets() {
        assert_eq!(
            kinds("List<List<Int>>"),
            vec![
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Gt,
            ]
        );
    }

    #[test]
    fn test_string_with_template_and_nested_string() {
        let source = r#"val s = "a ${foo("}")} b""#;
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::StringLit(Termination::Closed),
            ]
        );
    }

    #[test]
    fn test_unterminated_line_string_stops_at_newline() {
        let source = "val s = \"abc\nfoo";
        let tokens = tokenize(source).unwrap();
        let string = tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::StringLit(_)))
            .unwrap();
        assert_eq!(string.kind, TokenKind::StringLit(Termination::Unclosed));
        assert_eq!(string.text(source), "\"abc");
    }

    #[test]
    fn test_raw_string_spans_lines() {
        let source = "val s = \"\"\"\n  text\n\"\"\"\"";
        let tokens = tokenize(source).unwrap();
        let string = tokens.last().unwrap();
        assert_eq!(string.kind, TokenKind::StringLit(Termination::Closed));
        assert_eq!(string.span.end, source.len());
    }

    #[test]
    fn test_unterminated_raw_string_runs_to_end() {
        let source = "val s = \"\"\"\n  text\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(
            tokens.last().unwrap().kind,
            TokenKind::StringLit(Termination::Unclosed)
        );
    }

    #[test]
    fn test_nested_block_comments() {
        let source = "/* a /* b */ c */x";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::BlockComment(Termination::Closed));
        assert_eq!(tokens[0].text(source), "/* a /* b */ c */");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let source = "/* open\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::BlockComment(Termination::Unclosed));
    }

    #[test]
    fn test_backtick_identifier() {
        assert_eq!(kinds("fun `my test`()"), {
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
            ]
        });
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(kinds("val größe = 1"), {
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Number,
            ]
        });
    }

    #[test]
    fn test_invalid_character_is_malformed() {
        let err = tokenize("val x = 1 # 2").unwrap_err();
        assert_eq!(err, IndentError::MalformedContext { offset: 10 });
    }

    #[test]
    fn test_shebang_is_trivia() {
        let tokens = tokenize("#!/usr/bin/env kotlin\nprintln()").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Shebang);
    }

    #[test]
    fn test_keyword_classification() {
        assert_eq!(Keyword::from_text("catch"), Some(Keyword::Catch));
        assert_eq!(
            Keyword::from_text("enum"),
            Some(Keyword::Modifier(Modifier::Enum))
        );
        assert_eq!(
            Keyword::from_text("override"),
            Some(Keyword::Modifier(Modifier::Other))
        );
        assert_eq!(Keyword::from_text("foo"), None);
    }
}
