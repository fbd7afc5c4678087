use crate::config::TraceOptions;
use crate::error::CompileResult;
use crate::lexer::util::{reserved_lookup, single_char_token, MAX_TOKEN_LEN};
use std::fmt;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    If,
    Then,
    Else,
    End,
    Repeat,
    Until,
    Read,
    Write,
    Assign,
    Equal,
    Less,
    Plus,
    Hyphen,
    Star,
    Slash,
    LParen,
    RParen,
    Semicolon,
    Identifier,
    Number,
    EndOfFile,
    Error,
}

impl TokenKind {
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::End
                | TokenKind::Repeat
                | TokenKind::Until
                | TokenKind::Read
                | TokenKind::Write
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::If
            | TokenKind::Then
            | TokenKind::Else
            | TokenKind::End
            | TokenKind::Repeat
            | TokenKind::Until
            | TokenKind::Read
            | TokenKind::Write => write!(f, "reserved word: {}", self.lexeme),
            TokenKind::Assign => write!(f, ":="),
            TokenKind::Equal => write!(f, "="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Hyphen => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::EndOfFile => write!(f, "EOF"),
            TokenKind::Number => write!(f, "NUM, val= {}", self.lexeme),
            TokenKind::Identifier => write!(f, "ID, name= {}", self.lexeme),
            TokenKind::Error => write!(f, "ERROR: {}", self.lexeme),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InNumber,
    InIdentifier,
    InAssignOp,
    InComment,
    Done,
}

/// Scanner over a line buffer that is refilled from `source` on demand.
pub struct Lexer<'a, R> {
    source: R,
    line_buf: Vec<u8>,
    line_pos: usize,
    lineno: usize,
    at_eof: bool,
    finished: bool,
    listing: Box<dyn Write + 'a>,
    options: TraceOptions,
}

impl<'a, R: BufRead> Lexer<'a, R> {
    pub fn new(source: R) -> Lexer<'a, R> {
        Lexer {
            source,
            line_buf: Vec::new(),
            line_pos: 0,
            lineno: 0,
            at_eof: false,
            finished: false,
            listing: Box::new(io::sink()),
            options: TraceOptions::default(),
        }
    }

    /// Routes echoed source lines and the token dump to `listing`.
    pub fn with_listing(mut self, listing: impl Write + 'a, options: TraceOptions) -> Lexer<'a, R> {
        self.listing = Box::new(listing);
        self.options = options;
        self
    }

    pub fn lineno(&self) -> usize {
        self.lineno
    }

    fn get_next_char(&mut self) -> CompileResult<Option<u8>> {
        if self.line_pos >= self.line_buf.len() {
            self.line_buf.clear();
            self.line_pos = 0;
            if self.source.read_until(b'\n', &mut self.line_buf)? == 0 {
                self.at_eof = true;
                return Ok(None);
            }
            self.lineno += 1;
            if self.options.echo_source {
                let text = String::from_utf8_lossy(&self.line_buf);
                write!(self.listing, "{:4}: {}", self.lineno, text)?;
                if !text.ends_with('\n') {
                    writeln!(self.listing)?;
                }
            }
        }

        let ch = self.line_buf[self.line_pos];
        self.line_pos += 1;
        Ok(Some(ch))
    }

    // Only valid directly after get_next_char returned a character.
    fn unget_next_char(&mut self) {
        if !self.at_eof {
            self.line_pos -= 1;
        }
    }

    pub fn next_token(&mut self) -> CompileResult<Token> {
        let mut lexeme = String::new();
        let mut kind = TokenKind::Error;
        let mut state = State::Start;
        let mut line = self.lineno;
        let mut overflowed = false;

        while state != State::Done {
            let c = self.get_next_char()?;
            let mut save = true;

            if state == State::Start {
                line = self.lineno;
            }

            match state {
                State::Start => match c {
                    Some(ch) if ch.is_ascii_digit() => state = State::InNumber,
                    Some(ch) if ch.is_ascii_alphabetic() => state = State::InIdentifier,
                    Some(b':') => state = State::InAssignOp,
                    Some(ch) if ch.is_ascii_whitespace() => save = false,
                    Some(b'{') => {
                        save = false;
                        state = State::InComment;
                    }
                    Some(ch) => {
                        state = State::Done;
                        kind = single_char_token(ch);
                    }
                    None => {
                        save = false;
                        state = State::Done;
                        kind = TokenKind::EndOfFile;
                    }
                },
                State::InComment => {
                    save = false;
                    match c {
                        None => {
                            state = State::Done;
                            kind = TokenKind::EndOfFile;
                        }
                        Some(b'}') => state = State::Start,
                        Some(_) => {}
                    }
                }
                State::InAssignOp => {
                    state = State::Done;
                    if c == Some(b'=') {
                        kind = TokenKind::Assign;
                    } else {
                        self.unget_next_char();
                        save = false;
                        kind = TokenKind::Error;
                    }
                }
                State::InNumber => {
                    if !c.is_some_and(|ch| ch.is_ascii_digit()) {
                        self.unget_next_char();
                        save = false;
                        state = State::Done;
                        kind = TokenKind::Number;
                    }
                }
                State::InIdentifier => {
                    if !c.is_some_and(|ch| ch.is_ascii_alphabetic()) {
                        self.unget_next_char();
                        save = false;
                        state = State::Done;
                        kind = TokenKind::Identifier;
                    }
                }
                State::Done => unreachable!(),
            }

            if save {
                if let Some(ch) = c {
                    if lexeme.len() < MAX_TOKEN_LEN {
                        lexeme.push(ch as char);
                    } else {
                        overflowed = true;
                    }
                }
            }
        }

        // An overlong name or constant keeps only its prefix, so it cannot
        // stand for the token that was written.
        if overflowed && matches!(kind, TokenKind::Identifier | TokenKind::Number) {
            kind = TokenKind::Error;
        }
        if kind == TokenKind::Identifier {
            kind = reserved_lookup(&lexeme);
        }

        let token = Token::new(kind, lexeme, line.max(1));

        if self.options.trace_scan {
            writeln!(self.listing, "\t{}: {}", token.line, token)?;
        }

        Ok(token)
    }
}

impl<'a, R: BufRead> Iterator for Lexer<'a, R> {
    type Item = CompileResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        match &token {
            Ok(t) if t.kind != TokenKind::EndOfFile => {}
            _ => self.finished = true,
        }
        Some(token)
    }
}
