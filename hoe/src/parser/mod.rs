//! Recursive-descent parser over the token stream

use crate::ast::{Command, Expr, Program, Span, Spanned, Statement};
use crate::error::{CompileError, Result};
use crate::lexer::Token;

/// Parse tokens into AST
pub fn parse(_filename: &str, _source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    let mut parser = Parser::new(tokens);
    let program = parser.program()?;
    if let Some((tok, span)) = parser.peek_entry() {
        return Err(CompileError::parser(
            format!("unexpected token: {tok}"),
            span,
        ));
    }
    Ok(program)
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn peek_entry(&self) -> Option<(Token, Span)> {
        self.tokens.get(self.pos).cloned()
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    /// Span of the current token, or a zero-width span at the end of input
    fn here(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => {
                let end = self.tokens.last().map(|(_, s)| s.end).unwrap_or(0);
                Span::new(end, end)
            }
        }
    }

    fn expect(&mut self, expected: &Token, context: &str) -> Result<Span> {
        match self.advance() {
            Some((tok, span)) if tok == *expected => Ok(span),
            Some((tok, span)) => Err(CompileError::parser(
                format!("expected {expected} in {context}, found {tok}"),
                span,
            )),
            None => Err(CompileError::parser(
                format!("expected {expected} in {context}, found end of input"),
                self.here(),
            )),
        }
    }

    fn expect_string(&mut self, context: &str) -> Result<Spanned<String>> {
        match self.advance() {
            Some((Token::StringLit(s), span)) => Ok(Spanned::new(s, span)),
            Some((tok, span)) => Err(CompileError::parser(
                format!("expected string literal in {context}, found {tok}"),
                span,
            )),
            None => Err(CompileError::parser(
                format!("expected string literal in {context}, found end of input"),
                self.here(),
            )),
        }
    }

    fn program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.statement()?);
        }
        Ok(Program { statements })
    }

    /// True when the upcoming tokens begin a statement (a labelled or
    /// anonymous command)
    fn at_statement(&self) -> bool {
        match self.peek() {
            Some(Token::Ident(_)) => matches!(self.peek_at(1), Some(Token::Colon)),
            Some(tok) => Self::starts_command(tok),
            None => false,
        }
    }

    fn starts_command(tok: &Token) -> bool {
        matches!(
            tok,
            Token::Value
                | Token::Quote
                | Token::Eval
                | Token::Begin
                | Token::Cond
                | Token::Iter
                | Token::Def
                | Token::Proc
        )
    }

    fn statement(&mut self) -> Result<Statement> {
        let label = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Ident(_)), Some(Token::Colon)) => {
                let (tok, span) = self.advance().unwrap();
                self.advance(); // colon
                match tok {
                    Token::Ident(name) => Some(Spanned::new(name, span)),
                    _ => unreachable!(),
                }
            }
            _ => None,
        };
        let command = self.command()?;
        Ok(Statement { label, command })
    }

    fn command(&mut self) -> Result<Spanned<Command>> {
        let (tok, start) = match self.advance() {
            Some(entry) => entry,
            None => {
                return Err(CompileError::parser(
                    "expected command, found end of input",
                    self.here(),
                ));
            }
        };

        match tok {
            Token::Value | Token::Quote => {
                let expr = self.expr()?;
                let span = start.merge(expr.span);
                Ok(Spanned::new(Command::Value(expr), span))
            }
            Token::Eval => {
                let name = self.expect_string("eval")?;
                let payload = if self.payload_follows() {
                    Some(self.expr()?)
                } else {
                    None
                };
                let end = payload.as_ref().map(|p| p.span).unwrap_or(name.span);
                let span = start.merge(end);
                Ok(Spanned::new(Command::Eval { name, payload }, span))
            }
            Token::Begin => {
                let body = self.statements_until_end("begin")?;
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Command::Begin(body), span))
            }
            Token::Cond => {
                let mut branches = Vec::new();
                loop {
                    match self.peek() {
                        Some(Token::End) => {
                            self.advance();
                            break;
                        }
                        Some(_) => branches.push(self.command()?),
                        None => {
                            return Err(CompileError::parser(
                                "expected end to close cond, found end of input",
                                self.here(),
                            ));
                        }
                    }
                }
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Command::Cond(branches), span))
            }
            Token::Iter => {
                let head = self.expr()?;
                let body = self.statements_until_end("iter")?;
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Command::Iter { head, body }, span))
            }
            Token::Def | Token::Proc => {
                let name = self.expect_string("proc")?;
                let body = self.statements_until_end("proc")?;
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Command::Def { name, body }, span))
            }
            other => Err(CompileError::parser(
                format!("expected command, found {other}"),
                start,
            )),
        }
    }

    /// Decide whether a token sequence after `eval NAME` is a payload
    /// expression or the start of the next statement. A lone identifier
    /// followed by `:` is the next statement's label, not a variable.
    fn payload_follows(&self) -> bool {
        match self.peek() {
            Some(Token::Ident(_)) => !matches!(self.peek_at(1), Some(Token::Colon)),
            Some(
                Token::IntLit(_)
                | Token::FloatLit(_)
                | Token::StringLit(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::LBracket
                | Token::LBrace
                | Token::Dollar,
            ) => true,
            _ => false,
        }
    }

    fn statements_until_end(&mut self, context: &str) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::End) => {
                    self.advance();
                    return Ok(statements);
                }
                Some(_) if self.at_statement() => statements.push(self.statement()?),
                Some(tok) => {
                    let message = format!("expected statement or end in {context}, found {tok}");
                    return Err(CompileError::parser(message, self.here()));
                }
                None => {
                    return Err(CompileError::parser(
                        format!("expected end to close {context}, found end of input"),
                        self.here(),
                    ));
                }
            }
        }
    }

    fn prev_span(&self) -> Span {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, s)| *s)
            .unwrap_or(Span::new(0, 0))
    }

    fn expr(&mut self) -> Result<Spanned<Expr>> {
        let (tok, start) = match self.advance() {
            Some(entry) => entry,
            None => {
                return Err(CompileError::parser(
                    "expected expression, found end of input",
                    self.here(),
                ));
            }
        };

        match tok {
            Token::IntLit(n) => Ok(Spanned::new(Expr::Int(n), start)),
            Token::FloatLit(n) => Ok(Spanned::new(Expr::Float(n), start)),
            Token::StringLit(s) => Ok(Spanned::new(Expr::Str(s), start)),
            Token::True => Ok(Spanned::new(Expr::Bool(true), start)),
            Token::False => Ok(Spanned::new(Expr::Bool(false), start)),
            Token::Null => Ok(Spanned::new(Expr::Null, start)),
            Token::LBracket => self.array(start),
            Token::LBrace => self.object(start),
            Token::Dollar => {
                let indexes = self.index_chain()?;
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Expr::Payload { indexes }, span))
            }
            Token::Ident(name) => {
                let indexes = self.index_chain()?;
                let span = start.merge(self.prev_span());
                Ok(Spanned::new(Expr::Variable { name, indexes }, span))
            }
            other => Err(CompileError::parser(
                format!("expected expression, found {other}"),
                start,
            )),
        }
    }

    fn index_chain(&mut self) -> Result<Vec<Spanned<Expr>>> {
        let mut indexes = Vec::new();
        while matches!(self.peek(), Some(Token::LBracket)) {
            self.advance();
            let index = self.expr()?;
            self.expect(&Token::RBracket, "index")?;
            indexes.push(index);
        }
        Ok(indexes)
    }

    fn array(&mut self, start: Span) -> Result<Spanned<Expr>> {
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBracket) => {
                    let end = self.advance().unwrap().1;
                    return Ok(Spanned::new(Expr::Array(elements), start.merge(end)));
                }
                Some(_) => {
                    elements.push(self.expr()?);
                    if matches!(self.peek(), Some(Token::Comma)) {
                        self.advance();
                    }
                }
                None => {
                    return Err(CompileError::parser(
                        "expected ] to close array, found end of input",
                        self.here(),
                    ));
                }
            }
        }
    }

    fn object(&mut self, start: Span) -> Result<Spanned<Expr>> {
        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    let end = self.advance().unwrap().1;
                    return Ok(Spanned::new(Expr::Object(entries), start.merge(end)));
                }
                Some(_) => {
                    let key = self.expr()?;
                    self.expect(&Token::Colon, "object entry")?;
                    let value = self.expr()?;
                    entries.push((key, value));
                    if matches!(self.peek(), Some(Token::Comma)) {
                        self.advance();
                    }
                }
                None => {
                    return Err(CompileError::parser(
                        "expected } to close object, found end of input",
                        self.here(),
                    ));
                }
            }
        }
    }
}
