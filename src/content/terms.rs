//! logos-based search-term sanitiser.
//!
//! User-entered search text is split into plain terms before it reaches the
//! content engine. Query-language operators (`AND`, `OR`, `NOT`, `XOR`,
//! `NEAR`, `ADJ`, uppercase only) and syntax characters (`( ) + - ' "`) are
//! dropped; `-` and `;` also act as term delimiters.
//!
//! Token priority follows logos rules: the longest match wins, so `ANDROID`
//! lexes as a [`Token::Word`] while a standalone `AND` is an operator.

use logos::Logos;

/// Token produced by the search-term lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Operators ────────────────────────────────────────────────────

    #[token("AND")]
    #[token("OR")]
    #[token("NOT")]
    #[token("XOR")]
    #[token("NEAR")]
    #[token("ADJ")]
    Operator,

    // ── Syntax characters and delimiters ─────────────────────────────

    #[regex(r#"[()+'"]"#)]
    Syntax,

    #[regex(r"[-;]")]
    Delimiter,

    /// Any run of characters that is not whitespace, syntax, or delimiter.
    #[regex(r#"[^ \t\n\r\f()+'";\-]+"#)]
    Word,
}

/// Tokenize search text into `(Token, text)` pairs, skipping lex errors.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, input[span].to_string())))
        .collect()
}

/// The plain terms of `raw`, in order.
pub fn split(raw: &str) -> Vec<String> {
    tokenize(raw)
        .into_iter()
        .filter(|(token, _)| *token == Token::Word)
        .map(|(_, text)| text)
        .collect()
}

/// Sanitised search text: the plain terms of `raw` joined by single spaces.
///
/// Returns an empty string when nothing searchable remains.
pub fn sanitize(raw: &str) -> String {
    split(raw).join(" ")
}
