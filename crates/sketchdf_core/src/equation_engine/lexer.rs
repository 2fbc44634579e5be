use std::fmt;

use super::ast::UnaryOp;
use super::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Function(UnaryOp),
    Power,
    Plus,
    Minus,
    Multiply,
    Divide,
    E,
    Pi,
    /// A single letter, stored lowercase.
    Variable(char),
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(_) => write!(f, "NUMBER"),
            TokenKind::Function(op) => write!(f, "{}", op.name().to_ascii_uppercase()),
            TokenKind::Power => write!(f, "POWER"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Multiply => write!(f, "MULTIPLY"),
            TokenKind::Divide => write!(f, "DIVIDE"),
            TokenKind::E => write!(f, "E"),
            TokenKind::Pi => write!(f, "PI"),
            TokenKind::Variable(_) => write!(f, "VARIABLE"),
            TokenKind::LParen => write!(f, "LPAREN"),
            TokenKind::RParen => write!(f, "RPAREN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    /// Byte offset of the lexeme in the whole input.
    pub offset: usize,
}

/// Function names in match priority. A longer name must precede any name that
/// is a prefix of it, otherwise the shorter one would win.
const FUNCTIONS: &[(&str, UnaryOp)] = &[
    ("abs", UnaryOp::Abs),
    ("sinh", UnaryOp::Sinh),
    ("cosh", UnaryOp::Cosh),
    ("tanh", UnaryOp::Tanh),
    ("arcsinh", UnaryOp::Asinh),
    ("arccosh", UnaryOp::Acosh),
    ("arctanh", UnaryOp::Atanh),
    ("arctgh", UnaryOp::Atanh),
    ("sin", UnaryOp::Sin),
    ("cos", UnaryOp::Cos),
    ("tan", UnaryOp::Tan),
    ("tg", UnaryOp::Tan),
    ("arcsin", UnaryOp::Asin),
    ("arccos", UnaryOp::Acos),
    ("arctan", UnaryOp::Atan),
    ("arctg", UnaryOp::Atan),
    ("log", UnaryOp::Ln),
    ("ln", UnaryOp::Ln),
    ("exp", UnaryOp::Exp),
];

/// Operators and named constants tried after the function names.
const SYMBOLS: &[(&str, TokenKind)] = &[
    ("^", TokenKind::Power),
    ("**", TokenKind::Power),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Multiply),
    ("/", TokenKind::Divide),
    ("e", TokenKind::E),
    ("pi", TokenKind::Pi),
];

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Length of the numeric literal at the start of `rest`: `\d+(\.\d*)?`.
fn number_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut end = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if end > 0 && bytes.get(end) == Some(&b'.') {
        end += 1;
        end += bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    }
    end
}

/// Lazy scanner over a formula. Each call to `next` skips blanks and yields
/// the first pattern that matches at the cursor; `None` marks end of input.
/// After an error the lexer yields nothing more.
pub struct Lexer<'src> {
    whole: &'src str,
    rest: &'src str,
    byte: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Lexer {
            whole: input,
            rest: input,
            byte: 0,
        }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.byte
    }

    fn take(&mut self, len: usize, kind: TokenKind) -> Token<'src> {
        let token = Token {
            kind,
            lexeme: &self.rest[..len],
            offset: self.byte,
        };
        self.rest = &self.rest[len..];
        self.byte += len;
        token
    }

    fn fail(&mut self, found: char) -> ParseError {
        let offset = self.byte;
        self.byte = self.whole.len();
        self.rest = "";
        ParseError::Lexical { found, offset }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let trimmed = self.rest.trim_start();
        self.byte += self.rest.len() - trimmed.len();
        self.rest = trimmed;

        let c = self.rest.chars().next()?;

        let len = number_len(self.rest);
        if len > 0 {
            let literal = &self.rest[..len];
            return Some(match literal.parse::<f64>() {
                Ok(value) => Ok(self.take(len, TokenKind::Number(value))),
                Err(_) => Err(self.fail(c)),
            });
        }

        if let Some(&(name, op)) = FUNCTIONS
            .iter()
            .find(|(name, _)| starts_with_ignore_case(self.rest, name))
        {
            return Some(Ok(self.take(name.len(), TokenKind::Function(op))));
        }

        if let Some(&(symbol, kind)) = SYMBOLS
            .iter()
            .find(|(symbol, _)| starts_with_ignore_case(self.rest, symbol))
        {
            return Some(Ok(self.take(symbol.len(), kind)));
        }

        let token = match c {
            'a'..='z' | 'A'..='Z' => self.take(1, TokenKind::Variable(c.to_ascii_lowercase())),
            '(' => self.take(1, TokenKind::LParen),
            ')' => self.take(1, TokenKind::RParen),
            c => return Some(Err(self.fail(c))),
        };
        Some(Ok(token))
    }
}
