//! logos-based layout expression tokenizer.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `ifwidget` as [`Token::Ident`] beats `if` + `widget`)
//! 2. For equal length matches, literal tokens beat regexes
//!
//! Our ordering ensures:
//! - `if`, `then`, `else`, `and`, `or` are keywords only as whole tokens
//! - `20%` matches [`Token::Percent`], not `Number` + `Modulo`
//! - `.5` matches [`Token::Number`], not `Dot` + `Number`
//! - `&&` matches [`Token::AndAnd`], not two [`Token::Amp`]

use logos::Logos;

use crate::error::ParseError;

/// Layout token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Keywords ─────────────────────────────────────────────────────

    /// `if`
    #[token("if")]
    If,

    /// `then`
    #[token("then")]
    Then,

    /// `else`
    #[token("else")]
    Else,

    /// `and`
    #[token("and")]
    And,

    /// `or`
    #[token("or")]
    Or,

    // ── Literals and names ───────────────────────────────────────────

    /// Percentage of the parent size: `20%`, `12.5%`.
    #[regex(r"[0-9]+(\.[0-9]*)?%|\.[0-9]+%")]
    Percent,

    /// Number: `12`, `1.5`, `.2`, `3.`
    #[regex(r"[0-9]+(\.[0-9]*)?|\.[0-9]+")]
    Number,

    /// Identifier: widget names, property names, function names.
    /// Any Unicode letter or `_` starts one; letters, digits and `_` continue it.
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,

    // ── Multi-character operators ────────────────────────────────────

    /// `&&`
    #[token("&&")]
    AndAnd,

    /// `||`
    #[token("||")]
    OrOr,

    /// `==`
    #[token("==")]
    EqEq,

    /// `!=`
    #[token("!=")]
    NotEq,

    /// `<=`
    #[token("<=")]
    LessEq,

    /// `>=`
    #[token(">=")]
    GreaterEq,

    // ── Single-character punctuation ─────────────────────────────────

    /// `<`
    #[token("<")]
    Less,

    /// `>`
    #[token(">")]
    Greater,

    /// `&` (parent alias in binding paths)
    #[token("&")]
    Amp,

    /// `.`
    #[token(".")]
    Dot,

    /// `,`
    #[token(",")]
    Comma,

    /// `(`
    #[token("(")]
    ParenOpen,

    /// `)`
    #[token(")")]
    ParenClose,

    /// `{`
    #[token("{")]
    BraceOpen,

    /// `}`
    #[token("}")]
    BraceClose,

    /// `+`
    #[token("+")]
    Plus,

    /// `-`
    #[token("-")]
    Minus,

    /// `*`
    #[token("*")]
    Star,

    /// `/`
    #[token("/")]
    Slash,

    /// `%` (remainder operator)
    #[token("%")]
    Modulo,

    /// `?`
    #[token("?")]
    Question,

    /// `:`
    #[token(":")]
    Colon,
}

impl Token {
    /// Whether this token is a keyword that may also be used as a widget name.
    pub fn is_keyword(self) -> bool {
        matches!(self, Token::If | Token::Then | Token::Else | Token::And | Token::Or)
    }

    /// Whether this token can begin an operand (used to split `5%3`).
    fn starts_operand(self) -> bool {
        matches!(
            self,
            Token::Number
                | Token::Percent
                | Token::Ident
                | Token::Amp
                | Token::ParenOpen
                | Token::BraceOpen
        )
    }
}

/// A token with its source text and byte span, as consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,
    /// Byte offset where this token starts in the source.
    pub start: usize,
}

/// Tokenize a layout expression.
///
/// Unlike a lenient lexer, any unrecognized character (`@`, `#`, `[`) fails the
/// whole expression: a partially tokenized layout would evaluate to nonsense.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut lexemes: Vec<Lexeme> = Vec::new();

    for (result, span) in Token::lexer(input).spanned() {
        let text = &input[span.clone()];
        let token = result.map_err(|_| ParseError::Lex {
            position: span.start,
            text: text.to_string(),
        })?;
        lexemes.push(Lexeme {
            token,
            text: text.to_string(),
            start: span.start,
        });
    }

    split_glued_modulo(&mut lexemes);
    Ok(lexemes)
}

/// Turn `Percent` followed directly by an operand (`5%3`) into `Number Modulo`.
fn split_glued_modulo(lexemes: &mut Vec<Lexeme>) {
    let mut i = 0;
    while i + 1 < lexemes.len() {
        if lexemes[i].token == Token::Percent && lexemes[i + 1].token.starts_operand() {
            let number_text = lexemes[i].text.trim_end_matches('%').to_string();
            let modulo_start = lexemes[i].start + number_text.len();
            lexemes[i].token = Token::Number;
            lexemes[i].text = number_text;
            lexemes.insert(
                i + 1,
                Lexeme {
                    token: Token::Modulo,
                    text: "%".to_string(),
                    start: modulo_start,
                },
            );
            i += 1;
        }
        i += 1;
    }
}
