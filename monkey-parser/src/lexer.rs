use logos::Logos;
use std::fmt;

#[derive(Debug, Logos, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // literals
    #[regex("[0-9]+", |lex| lex.slice().parse().ok())]
    IntLit(i64),
    #[regex("true|false", |lex| lex.slice() == "true")]
    BoolLit(bool),
    /// String literals are delimited by `"` and interpret no escapes.
    #[regex(r#""[^"]*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    StringLit(String),

    // identifiers
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // unary operators
    #[token("!")]
    LogicalNot,

    // binary operators
    // - arithmetics
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    // - binding
    #[token("=")]
    Equals,
    // - equality
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    // - ordering
    #[token(">")]
    GreaterThan,
    #[token("<")]
    LessThan,

    // punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,

    // keywords
    #[token("fn")]
    Fn,
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("macro")]
    Macro,

    // misc
    /// Generated in the parse phase for input bytes the lexer rejects.
    Illegal,
    /// Generated in the parse phase when `lexer.next()` returns `None`.
    Eof,
}

impl Token {
    /// Returns the binary binding power or `None` if invalid binop token.
    /// Binding power `0` and `1` is reserved for accepting any expression.
    pub fn binop_bp(&self) -> Option<(u8, u8)> {
        match self {
            /* Equality */
            Token::EqualsEquals | Token::NotEquals => Some((4, 5)),
            /* Ordering */
            Token::LessThan | Token::GreaterThan => Some((6, 7)),
            /* Additive */
            Token::Plus | Token::Minus => Some((8, 9)),
            /* Multiplicative */
            Token::Asterisk | Token::Slash => Some((10, 11)),
            _ => None,
        }
    }

    /// Returns the postfix binding power for call and index expressions,
    /// the tightest-binding operators in the language.
    pub fn postfix_bp(&self) -> Option<u8> {
        match self {
            Token::OpenParen | Token::OpenBracket => Some(13),
            _ => None,
        }
    }
}

/// Binding power of the unary operators `!` and `-`.
/// Tighter than any binary operator, looser than call and index.
pub const PREFIX_BP: u8 = 12;

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLit(val) => write!(f, "{}", val),
            Token::BoolLit(val) => write!(f, "{}", val),
            Token::StringLit(val) => write!(f, "\"{}\"", val),
            Token::Identifier(ident) => write!(f, "{}", ident),
            Token::LogicalNot => write!(f, "!"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Equals => write!(f, "="),
            Token::EqualsEquals => write!(f, "=="),
            Token::NotEquals => write!(f, "!="),
            Token::GreaterThan => write!(f, ">"),
            Token::LessThan => write!(f, "<"),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::OpenBrace => write!(f, "{{"),
            Token::CloseBrace => write!(f, "}}"),
            Token::OpenBracket => write!(f, "["),
            Token::CloseBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Fn => write!(f, "fn"),
            Token::Let => write!(f, "let"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Return => write!(f, "return"),
            Token::Macro => write!(f, "macro"),
            Token::Illegal => write!(f, "ILLEGAL"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}
