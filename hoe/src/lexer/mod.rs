//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(CompileError::lexer(
                    format!("unexpected character: {:?}", lexer.slice()),
                    span,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_empty() {
        let tokens = tokenize("").unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_tokenize_keywords() {
        let tokens = tokenize("value quote eval begin end cond iter def proc").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Value,
                Token::Quote,
                Token::Eval,
                Token::Begin,
                Token::End,
                Token::Cond,
                Token::Iter,
                Token::Def,
                Token::Proc,
            ]
        );
    }

    #[test]
    fn test_tokenize_singleton_literals() {
        let tokens = tokenize("true false null").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(kinds, vec![Token::True, Token::False, Token::Null]);
    }

    #[test]
    fn test_tokenize_integer_literal() {
        let tokens = tokenize("42").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(&tokens[0].0, Token::IntLit(42)));
    }

    #[test]
    fn test_tokenize_negative_integer_literal() {
        // The number token itself carries the sign; there is no unary minus
        let tokens = tokenize("-42").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(&tokens[0].0, Token::IntLit(-42)));
    }

    #[test]
    fn test_tokenize_float_literal() {
        let tokens = tokenize("1.5 -0.25").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0].0, Token::FloatLit(n) if (*n - 1.5).abs() < f64::EPSILON));
        assert!(matches!(&tokens[1].0, Token::FloatLit(n) if (*n + 0.25).abs() < f64::EPSILON));
    }

    #[test]
    fn test_tokenize_string_literal() {
        let tokens = tokenize(r#""hello world""#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(&tokens[0].0, Token::StringLit(s) if s == "hello world"));
    }

    #[test]
    fn test_tokenize_string_no_escapes() {
        // Backslash inside a string is a lexer error, not an escape
        assert!(tokenize(r#""a\nb""#).is_err());
    }

    #[test]
    fn test_tokenize_operator_name_as_string() {
        let tokens = tokenize(r#"eval "+" [1, 2]"#).unwrap();
        assert_eq!(tokens[0].0, Token::Eval);
        assert!(matches!(&tokens[1].0, Token::StringLit(s) if s == "+"));
    }

    #[test]
    fn test_tokenize_identifier() {
        let tokens = tokenize("foo bar_baz x123 iterate").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[0].0, Token::Ident(s) if s == "foo"));
        assert!(matches!(&tokens[3].0, Token::Ident(s) if s == "iterate"));
    }

    #[test]
    fn test_tokenize_punctuation() {
        let tokens = tokenize(": , [ ] { } $").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Colon,
                Token::Comma,
                Token::LBracket,
                Token::RBracket,
                Token::LBrace,
                Token::RBrace,
                Token::Dollar,
            ]
        );
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("value 42").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 5));
        assert_eq!(tokens[1].1, Span::new(6, 8));
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let tokens = tokenize("value # the answer\n42").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, Token::Value);
        assert!(matches!(&tokens[1].0, Token::IntLit(42)));
    }

    #[test]
    fn test_tokenize_skips_whitespace() {
        let tokens = tokenize("  value  \t\n  42  ").unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_tokenize_unexpected_character_error() {
        let result = tokenize("value @");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message().contains("unexpected character"));
    }

    #[test]
    fn test_tokenize_full_statement() {
        let tokens = tokenize(r#"x: eval "fib" [10, 2.5]"#).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Ident("x".to_string()),
                Token::Colon,
                Token::Eval,
                Token::StringLit("fib".to_string()),
                Token::LBracket,
                Token::IntLit(10),
                Token::Comma,
                Token::FloatLit(2.5),
                Token::RBracket,
            ]
        );
    }
}
