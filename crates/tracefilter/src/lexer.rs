//! Lexical analysis for filter expressions.
//!
//! Tokenizes a filter-expression string using logos.
//!
//! # Design
//!
//! - `Token` — all filter token types (identifiers, literals, operators)
//! - Whitespace is skipped; the language has no comments
//! - Escape sequences inside quoted literals are resolved here: only
//!   `\"`, `\\` and `\*` are accepted, anything else is a lex error
//! - A quoted literal containing at least one unescaped `*` lexes as a
//!   glob literal; otherwise it lexes as a plain string literal

use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Reason a character sequence failed to lex.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    /// A character that starts no token.
    #[default]
    InvalidCharacter,
    /// A quoted literal with no closing quote.
    UnterminatedString,
    /// An escape sequence other than `\"`, `\\` or `\*`.
    InvalidEscape(char),
    /// An integer literal outside the i64 range.
    IntegerOverflow,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::InvalidCharacter => write!(f, "invalid character"),
            LexErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexErrorKind::InvalidEscape(c) => write!(f, "invalid escape sequence '\\{}'", c),
            LexErrorKind::IntegerOverflow => write!(f, "integer literal out of range"),
        }
    }
}

/// Lex error with the byte offset of the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset into the source text.
    pub offset: usize,
    /// Reason for the failure.
    pub kind: LexErrorKind,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for LexError {}

/// A quoted literal, classified by wildcard content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotedLit {
    /// No unescaped `*`: exact string, escapes resolved.
    Str(String),
    /// At least one unescaped `*`: glob pattern. `\*` and `\\` escapes
    /// are kept verbatim for glob validation and normalization.
    Glob(String),
}

fn lex_decimal(lex: &mut logos::Lexer<Token>) -> Result<i64, LexErrorKind> {
    lex.slice()
        .parse::<i64>()
        .map_err(|_| LexErrorKind::IntegerOverflow)
}

fn lex_hex(lex: &mut logos::Lexer<Token>) -> Result<i64, LexErrorKind> {
    i64::from_str_radix(&lex.slice()[2..], 16).map_err(|_| LexErrorKind::IntegerOverflow)
}

fn lex_unterminated(_lex: &mut logos::Lexer<Token>) -> Result<QuotedLit, LexErrorKind> {
    Err(LexErrorKind::UnterminatedString)
}

/// Resolve escapes and classify a quoted literal.
///
/// Produces both renditions in one scan: the fully unescaped string and
/// the glob form (quote escapes resolved, `\*`/`\\` kept). The glob form
/// is used when an unescaped `*` is present.
fn lex_quoted(lex: &mut logos::Lexer<Token>) -> Result<QuotedLit, LexErrorKind> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];

    let mut plain = String::with_capacity(inner.len());
    let mut glob = String::with_capacity(inner.len());
    let mut wildcard = false;

    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            // The token regex guarantees a character follows.
            let esc = chars.next().unwrap_or('\\');
            match esc {
                '"' => {
                    plain.push('"');
                    glob.push('"');
                }
                '\\' | '*' => {
                    plain.push(esc);
                    glob.push('\\');
                    glob.push(esc);
                }
                other => return Err(LexErrorKind::InvalidEscape(other)),
            }
        } else {
            if c == '*' {
                wildcard = true;
            }
            plain.push(c);
            glob.push(c);
        }
    }

    if wildcard {
        Ok(QuotedLit::Glob(glob))
    } else {
        Ok(QuotedLit::Str(plain))
    }
}

/// Filter expression token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(error = LexErrorKind)]
pub enum Token {
    /// Field reference name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// Decimal (optionally negative) or hexadecimal integer literal.
    #[regex(r"-?[0-9]+", lex_decimal)]
    #[regex(r"0[xX][0-9a-fA-F]+", lex_hex)]
    Int(i64),

    /// Double-quoted string or glob literal.
    #[regex(r#""([^"\\]|\\.)*""#, lex_quoted)]
    #[regex(r#""([^"\\]|\\.)*"#, lex_unterminated)]
    Quoted(QuotedLit),

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token(">=")]
    GtEq,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    /// Bare `*`: the match-all placeholder, only valid as the entire input.
    #[token("*")]
    Star,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Int(v) => write!(f, "integer {}", v),
            Token::Quoted(QuotedLit::Str(s)) => write!(f, "string \"{}\"", s),
            Token::Quoted(QuotedLit::Glob(p)) => write!(f, "glob \"{}\"", p),
            Token::AndAnd => write!(f, "'&&'"),
            Token::OrOr => write!(f, "'||'"),
            Token::Bang => write!(f, "'!'"),
            Token::EqEq => write!(f, "'=='"),
            Token::BangEq => write!(f, "'!='"),
            Token::GtEq => write!(f, "'>='"),
            Token::LtEq => write!(f, "'<='"),
            Token::Gt => write!(f, "'>'"),
            Token::Lt => write!(f, "'<'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Star => write!(f, "'*'"),
        }
    }
}

/// Byte range of a token in the source text.
pub type Span = Range<usize>;

/// Tokenize a filter expression.
///
/// Single pass over the input; fails on the first invalid character,
/// bad escape or unterminated literal.
pub fn tokenize(text: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(text).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(kind) => {
                return Err(LexError {
                    offset: span.start,
                    kind,
                })
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<Token> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn tokenizes_comparison() {
        assert_eq!(
            toks("int_loglevel >= 5"),
            vec![
                Token::Ident("int_loglevel".into()),
                Token::GtEq,
                Token::Int(5),
            ]
        );
    }

    #[test]
    fn tokenizes_hex_integer() {
        assert_eq!(toks("0x1F"), vec![Token::Int(31)]);
    }

    #[test]
    fn tokenizes_negative_integer() {
        assert_eq!(
            toks("int_loglevel == -1"),
            vec![
                Token::Ident("int_loglevel".into()),
                Token::EqEq,
                Token::Int(-1),
            ]
        );
    }

    #[test]
    fn classifies_glob_literal() {
        assert_eq!(
            toks(r#""app.*""#),
            vec![Token::Quoted(QuotedLit::Glob("app.*".into()))]
        );
    }

    #[test]
    fn classifies_plain_string() {
        assert_eq!(
            toks(r#""literal""#),
            vec![Token::Quoted(QuotedLit::Str("literal".into()))]
        );
    }

    #[test]
    fn escaped_star_is_not_a_wildcard() {
        assert_eq!(
            toks(r#""a\*b""#),
            vec![Token::Quoted(QuotedLit::Str("a*b".into()))]
        );
    }

    #[test]
    fn glob_keeps_escapes_verbatim() {
        assert_eq!(
            toks(r#""a\*b*""#),
            vec![Token::Quoted(QuotedLit::Glob(r"a\*b*".into()))]
        );
    }

    #[test]
    fn unterminated_string_errors() {
        let err = tokenize(r#"name == "abc"#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn dangling_escape_is_unterminated() {
        // The trailing backslash escapes the closing quote.
        let err = tokenize(r#""a \""#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn invalid_escape_errors() {
        let err = tokenize(r#""a\qb""#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidEscape('q'));
    }

    #[test]
    fn invalid_character_errors() {
        let err = tokenize("a == 1 @").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidCharacter);
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn bare_star_is_a_token() {
        assert_eq!(toks("*"), vec![Token::Star]);
    }
}
