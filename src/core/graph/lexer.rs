// src/core/graph/lexer.rs
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare identifier or numeral
    Ident(String),
    /// Double-quoted string, quotes removed
    Quoted(String),
    /// HTML string including its outer angle brackets
    Html(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Colon,
    Equals,
    Plus,
    /// `->` or `--`
    EdgeOp,
}

impl Token {
    /// True when this is a bare identifier matching `keyword` (DOT keywords are case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "`{}`", s),
            Token::Quoted(s) => write!(f, "\"{}\"", s),
            Token::Html(s) => write!(f, "{}", s),
            Token::LBrace => f.write_str("`{`"),
            Token::RBrace => f.write_str("`}`"),
            Token::LBracket => f.write_str("`[`"),
            Token::RBracket => f.write_str("`]`"),
            Token::Semi => f.write_str("`;`"),
            Token::Comma => f.write_str("`,`"),
            Token::Colon => f.write_str("`:`"),
            Token::Equals => f.write_str("`=`"),
            Token::Plus => f.write_str("`+`"),
            Token::EdgeOp => f.write_str("edge operator"),
        }
    }
}

/// Token with the 1-based line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// Syntax problem found while reading a graph document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Splits a DOT document into tokens, dropping comments and preprocessor lines
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            at_line_start: true,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, SyntaxError> {
        let mut tokens = Vec::new();
        while let Some(spanned) = self.next_token()? {
            tokens.push(spanned);
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.at_line_start = true;
        } else if !c.is_whitespace() {
            self.at_line_start = false;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('#'), _) if self.at_line_start => self.skip_line(),
                (Some('/'), Some('/')) => self.skip_line(),
                (Some('/'), Some('*')) => {
                    let start = self.line;
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(SyntaxError::new(start, "unterminated block comment"))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, SyntaxError> {
        self.skip_trivia()?;
        let line = self.line;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        let token = match c {
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            ';' => self.single(Token::Semi),
            ',' => self.single(Token::Comma),
            ':' => self.single(Token::Colon),
            '=' => self.single(Token::Equals),
            '+' => self.single(Token::Plus),
            '"' => self.quoted()?,
            '<' => self.html()?,
            '-' => match self.peek_at(1) {
                Some('>') | Some('-') => {
                    self.bump();
                    self.bump();
                    Token::EdgeOp
                }
                Some(d) if d.is_ascii_digit() || d == '.' => self.numeral(),
                _ => return Err(SyntaxError::new(line, "unexpected `-`")),
            },
            c if c.is_ascii_digit() || c == '.' => self.numeral(),
            c if is_ident_start(c) => self.ident(),
            other => {
                return Err(SyntaxError::new(
                    line,
                    format!("unexpected character `{}`", other),
                ))
            }
        };

        Ok(Some(Spanned { token, line }))
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn ident(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        Token::Ident(text)
    }

    fn numeral(&mut self) -> Token {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }
        Token::Ident(text)
    }

    /// Only `\"` and line continuations are interpreted; other escapes such as
    /// `\l` stay in the text untouched.
    fn quoted(&mut self) -> Result<Token, SyntaxError> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Quoted(text)),
                Some('\\') => match self.peek() {
                    Some('"') => {
                        self.bump();
                        text.push('"');
                    }
                    Some('\n') => {
                        self.bump();
                    }
                    Some('\r') if self.peek_at(1) == Some('\n') => {
                        self.bump();
                        self.bump();
                    }
                    Some(next) => {
                        self.bump();
                        text.push('\\');
                        text.push(next);
                    }
                    None => text.push('\\'),
                },
                Some(c) => text.push(c),
                None => return Err(SyntaxError::new(start, "unterminated string")),
            }
        }
    }

    fn html(&mut self) -> Result<Token, SyntaxError> {
        let start = self.line;
        let mut depth = 0usize;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('<') => {
                    depth += 1;
                    text.push('<');
                }
                Some('>') => {
                    depth -= 1;
                    text.push('>');
                    if depth == 0 {
                        return Ok(Token::Html(text));
                    }
                }
                Some(c) => text.push(c),
                None => return Err(SyntaxError::new(start, "unterminated HTML string")),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
