use crate::lexer::lex::TokenKind;

/// Longest lexeme kept for a token; extra characters are scanned but dropped.
pub const MAX_TOKEN_LEN: usize = 40;

const RESERVED_WORDS: [(&str, TokenKind); 8] = [
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("else", TokenKind::Else),
    ("end", TokenKind::End),
    ("repeat", TokenKind::Repeat),
    ("until", TokenKind::Until),
    ("read", TokenKind::Read),
    ("write", TokenKind::Write),
];

pub fn reserved_lookup(s: &str) -> TokenKind {
    RESERVED_WORDS
        .iter()
        .find(|(word, _)| *word == s)
        .map(|(_, kind)| *kind)
        .unwrap_or(TokenKind::Identifier)
}

pub fn single_char_token(ch: u8) -> TokenKind {
    match ch {
        b'=' => TokenKind::Equal,
        b'<' => TokenKind::Less,
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Hyphen,
        b'*' => TokenKind::Star,
        b'/' => TokenKind::Slash,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b';' => TokenKind::Semicolon,
        _ => TokenKind::Error,
    }
}
