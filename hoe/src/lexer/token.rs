//! Token definitions

use logos::Logos;

/// Hoe token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Keywords
    #[token("value")]
    Value,
    #[token("quote")]
    Quote,
    #[token("eval")]
    Eval,
    #[token("begin")]
    Begin,
    #[token("end")]
    End,
    #[token("cond")]
    Cond,
    #[token("iter")]
    Iter,
    #[token("def")]
    Def,
    #[token("proc")]
    Proc,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // A numeric literal containing `.` is a float, otherwise an integer
    #[regex(r"-?(0|[1-9][0-9]*)\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok(), priority = 3)]
    FloatLit(f64),

    #[regex(r"-?(0|[1-9][0-9]*)", |lex| lex.slice().parse::<i64>().ok(), priority = 2)]
    IntLit(i64),

    // Strings carry no escape sequences; backslash and inner quote are
    // rejected at the lexer level
    #[regex(r#""[^"\\]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    StringLit(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    // Punctuation
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("$")]
    Dollar,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Value => write!(f, "value"),
            Token::Quote => write!(f, "quote"),
            Token::Eval => write!(f, "eval"),
            Token::Begin => write!(f, "begin"),
            Token::End => write!(f, "end"),
            Token::Cond => write!(f, "cond"),
            Token::Iter => write!(f, "iter"),
            Token::Def => write!(f, "def"),
            Token::Proc => write!(f, "proc"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::FloatLit(n) => write!(f, "{n}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Dollar => write!(f, "$"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_display() {
        assert_eq!(format!("{}", Token::IntLit(42)), "42");
        assert_eq!(format!("{}", Token::StringLit("fib".to_string())), "\"fib\"");
        assert_eq!(format!("{}", Token::Ident("x".to_string())), "x");
        assert_eq!(format!("{}", Token::Dollar), "$");
        assert_eq!(format!("{}", Token::LBrace), "{");
        assert_eq!(format!("{}", Token::RBrace), "}");
    }

    #[test]
    fn test_token_equality() {
        assert_eq!(Token::IntLit(42), Token::IntLit(42));
        assert_ne!(Token::IntLit(42), Token::IntLit(43));
        assert_eq!(Token::Ident("a".to_string()), Token::Ident("a".to_string()));
        assert_ne!(Token::Eval, Token::Begin);
    }
}
